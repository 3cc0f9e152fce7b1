//! Skeletal neuron morphology
//!
//! A morphology is a soma plus a forest of sections. Each section is a
//! polyline of samples (position and radius), optionally attached to a parent
//! section. Morphologies are immutable once built and shared behind `Arc` by
//! whatever owns the neuron.

use serde::{Deserialize, Serialize};

/// Neurite classification of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Soma,
    Axon,
    Dendrite,
    ApicalDendrite,
}

/// A single point along a section (micrometers)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub position: [f32; 3],
    pub radius: f32,
}

impl Sample {
    pub fn new(x: f32, y: f32, z: f32, radius: f32) -> Self {
        Self {
            position: [x, y, z],
            radius,
        }
    }
}

/// An unbranched piece of neurite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Section identifier, unique within its morphology
    pub id: u32,
    /// Parent section, `None` when attached directly to the soma
    pub parent: Option<u32>,
    /// Neurite type
    pub kind: SectionType,
    /// Ordered samples from the proximal to the distal end
    pub samples: Vec<Sample>,
}

impl Section {
    /// Path length along the samples
    pub fn length(&self) -> f32 {
        self.samples
            .windows(2)
            .map(|pair| distance(pair[0].position, pair[1].position))
            .sum()
    }
}

/// Cell body approximated as a sphere
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Soma {
    pub center: [f32; 3],
    pub radius: f32,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Bounds {
    fn around(center: [f32; 3], radius: f32) -> Self {
        Self {
            min: [center[0] - radius, center[1] - radius, center[2] - radius],
            max: [center[0] + radius, center[1] + radius, center[2] + radius],
        }
    }

    fn expand(&mut self, point: [f32; 3], radius: f32) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(point[axis] - radius);
            self.max[axis] = self.max[axis].max(point[axis] + radius);
        }
    }
}

/// Immutable skeleton of one neuron
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Morphology {
    soma: Soma,
    sections: Vec<Section>,
}

impl Morphology {
    /// Create a morphology from its soma and sections
    pub fn new(soma: Soma, sections: Vec<Section>) -> Self {
        Self { soma, sections }
    }

    pub fn soma(&self) -> &Soma {
        &self.soma
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Look up a section by id
    pub fn section(&self, id: u32) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Sections of a given neurite type
    pub fn sections_of_type(&self, kind: SectionType) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(move |s| s.kind == kind)
    }

    /// Direct children of a section
    pub fn children(&self, id: u32) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(move |s| s.parent == Some(id))
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Total number of samples across all sections
    pub fn sample_count(&self) -> usize {
        self.sections.iter().map(|s| s.samples.len()).sum()
    }

    /// Summed path length of all sections
    pub fn total_length(&self) -> f32 {
        self.sections.iter().map(Section::length).sum()
    }

    /// Bounding box enclosing the soma and every sample, radii included
    pub fn bounding_box(&self) -> Bounds {
        let mut bounds = Bounds::around(self.soma.center, self.soma.radius);
        for sample in self.sections.iter().flat_map(|s| s.samples.iter()) {
            bounds.expand(sample.position, sample.radius);
        }
        bounds
    }
}

fn distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    let d = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
}
