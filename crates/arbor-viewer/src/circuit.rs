//! Synthetic circuit used when no circuit loader is wired in
//!
//! Neurons are laid out on a cubic grid with a seeded random-walk morphology
//! each, so runs are reproducible for a given configuration.

use arbor_core::{Gid, MeshCache, Morphology, Neuron, Sample, Section, SectionType, Soma};
use std::sync::Arc;
use tracing::debug;

use crate::config::CircuitConfig;

/// Grid spacing between somata (micrometers)
const SPACING: f32 = 150.0;

/// xorshift64* generator; good enough for shape jitter
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    fn next_u64(&mut self) -> u64 {
        self.0 ^= self.0 >> 12;
        self.0 ^= self.0 << 25;
        self.0 ^= self.0 >> 27;
        self.0.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Uniform in [0, 1)
    fn unit(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform in [-1, 1)
    fn signed(&mut self) -> f32 {
        self.unit() * 2.0 - 1.0
    }
}

/// Generate the neurons of a circuit sharing one mesh cache
pub fn generate(config: &CircuitConfig, meshes: &Arc<MeshCache>) -> Vec<Neuron> {
    let side = (config.neurons as f32).cbrt().ceil().max(1.0) as u32;

    (0..config.neurons)
        .map(|gid| {
            if config.missing_morphology.contains(&gid) {
                debug!(gid, "Generating neuron without morphology");
                return Neuron::without_morphology(Gid(gid), meshes.clone());
            }

            let position = [
                (gid % side) as f32 * SPACING,
                (gid / side % side) as f32 * SPACING,
                (gid / (side * side)) as f32 * SPACING,
            ];
            let mut rng = Rng::new(config.seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ gid as u64);
            let mut morphology = random_morphology(&mut rng, position, config);
            if config.degenerate.contains(&gid) {
                debug!(gid, "Generating neuron with a degenerate section");
                morphology = truncate_last_section(morphology);
            }
            Neuron::new(Gid(gid), Arc::new(morphology), meshes.clone())
        })
        .collect()
}

fn random_morphology(rng: &mut Rng, center: [f32; 3], config: &CircuitConfig) -> Morphology {
    let soma = Soma {
        center,
        radius: 4.0 + rng.unit() * 4.0,
    };

    let mut sections: Vec<Section> = Vec::with_capacity(config.sections_per_neuron as usize);
    for id in 0..config.sections_per_neuron {
        // The first three sections start at the soma: one axon, two dendrites
        let (parent, kind, start, radius) = if id < 3 {
            let dir = random_direction(rng);
            let start = [
                center[0] + dir[0] * soma.radius,
                center[1] + dir[1] * soma.radius,
                center[2] + dir[2] * soma.radius,
            ];
            let kind = if id == 0 {
                SectionType::Axon
            } else {
                SectionType::Dendrite
            };
            (None, kind, start, 1.5)
        } else {
            let parent = &sections[(rng.next_u64() % sections.len() as u64) as usize];
            let tip = parent.samples[parent.samples.len() - 1];
            (Some(parent.id), parent.kind, tip.position, tip.radius)
        };

        let mut samples = Vec::with_capacity(config.samples_per_section.max(2) as usize);
        let mut position = start;
        let mut r = radius;
        let dir = random_direction(rng);
        samples.push(Sample {
            position,
            radius: r,
        });
        for _ in 1..config.samples_per_section.max(2) {
            let step = 8.0 + rng.unit() * 12.0;
            let jitter = random_direction(rng);
            for axis in 0..3 {
                position[axis] += (dir[axis] + 0.3 * jitter[axis]) * step;
            }
            r = (r * 0.92).max(0.2);
            samples.push(Sample {
                position,
                radius: r,
            });
        }

        sections.push(Section {
            id,
            parent,
            kind,
            samples,
        });
    }

    Morphology::new(soma, sections)
}

fn random_direction(rng: &mut Rng) -> [f32; 3] {
    loop {
        let v = [rng.signed(), rng.signed(), rng.signed()];
        let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
        if len > 0.05 && len <= 1.0 {
            return [v[0] / len, v[1] / len, v[2] / len];
        }
    }
}

/// Leave the last section with a single sample so triangulation rejects it
fn truncate_last_section(morphology: Morphology) -> Morphology {
    let soma = *morphology.soma();
    let mut sections = morphology.sections().to_vec();
    if let Some(last) = sections.last_mut() {
        last.samples.truncate(1);
    }
    Morphology::new(soma, sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::NeuronData;

    fn config(neurons: u32) -> CircuitConfig {
        CircuitConfig {
            neurons,
            ..Default::default()
        }
    }

    #[test]
    fn test_generation_is_reproducible() {
        let meshes = Arc::new(MeshCache::with_tube_builder());
        let a = generate(&config(8), &meshes);
        let b = generate(&config(8), &meshes);

        assert_eq!(a.len(), 8);
        for (x, y) in a.iter().zip(&b) {
            let (mx, my) = (x.morphology().unwrap(), y.morphology().unwrap());
            assert_eq!(mx.section_count(), 12);
            assert_eq!(mx.sample_count(), 12 * 6);
            assert_eq!(mx.total_length(), my.total_length());
        }
    }

    #[test]
    fn test_special_gids() {
        let meshes = Arc::new(MeshCache::with_tube_builder());
        let mut cfg = config(10);
        cfg.missing_morphology = vec![2];
        cfg.degenerate = vec![4];
        let neurons = generate(&cfg, &meshes);

        assert!(neurons[2].morphology().is_none());
        let attrs = arbor_core::SceneAttributes {
            use_meshes: true,
            ..Default::default()
        };
        assert!(neurons[4].mesh(&attrs).is_err());
        assert!(neurons[5].mesh(&attrs).is_ok());
    }

    #[test]
    fn test_branches_attach_to_existing_sections() {
        let meshes = Arc::new(MeshCache::with_tube_builder());
        let neurons = generate(&config(1), &meshes);
        let morphology = neurons[0].morphology().unwrap();
        for section in morphology.sections() {
            if let Some(parent) = section.parent {
                assert!(parent < section.id);
                assert!(morphology.section(parent).is_some());
            }
        }
        assert_eq!(morphology.sections()[0].kind, SectionType::Axon);
    }
}
