//! Triangulated neuron surfaces and the builders that produce them

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::morphology::{Morphology, Sample};
use crate::neuron::Gid;
use crate::scene::SceneAttributes;

/// Mesh generation failures. Cloneable so a memoized failure can be handed
/// to every requester of the same neuron.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("Neuron {0} has no morphology to triangulate")]
    NoMorphology(Gid),
    #[error("Degenerate section {section} in neuron {gid}")]
    Degenerate { gid: Gid, section: u32 },
    #[error("Invalid mesh parameter: {0}")]
    InvalidParameter(String),
    #[error("Mesh builder failed: {0}")]
    Builder(String),
}

/// Indexed triangle mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// Triangle list, three indices per triangle
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn push_vertex(&mut self, position: [f32; 3], normal: [f32; 3]) -> u32 {
        self.positions.push(position);
        self.normals.push(normal);
        (self.positions.len() - 1) as u32
    }
}

/// Strategy that turns a morphology into a surface mesh.
///
/// Implementations may be expensive; callers go through
/// [`MeshCache`](crate::mesh_cache::MeshCache) so each neuron is triangulated
/// at most once.
pub trait MeshBuilder: Send + Sync {
    fn build(
        &self,
        gid: Gid,
        morphology: &Morphology,
        attributes: &SceneAttributes,
    ) -> Result<Mesh, MeshError>;
}

/// Reference builder: an octahedral soma plus a tube around every segment.
#[derive(Debug, Clone, Copy, Default)]
pub struct TubeMeshBuilder;

impl MeshBuilder for TubeMeshBuilder {
    fn build(
        &self,
        gid: Gid,
        morphology: &Morphology,
        attributes: &SceneAttributes,
    ) -> Result<Mesh, MeshError> {
        let sides = attributes.mesh_tube_sides;
        if sides < 3 {
            return Err(MeshError::InvalidParameter(format!(
                "mesh_tube_sides must be at least 3, got {}",
                sides
            )));
        }

        let mut mesh = Mesh::default();
        let soma = morphology.soma();
        add_soma(&mut mesh, soma.center, soma.radius);

        for section in morphology.sections() {
            let valid = section.samples.len() >= 2
                && section
                    .samples
                    .iter()
                    .all(|s| s.radius.is_finite() && s.radius > 0.0);
            if !valid {
                return Err(MeshError::Degenerate {
                    gid,
                    section: section.id,
                });
            }

            for pair in section.samples.windows(2) {
                add_segment(&mut mesh, &pair[0], &pair[1], sides);
            }
        }

        Ok(mesh)
    }
}

fn add_soma(mesh: &mut Mesh, center: [f32; 3], radius: f32) {
    const AXES: [[f32; 3]; 6] = [
        [1.0, 0.0, 0.0],
        [-1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
    ];
    // Faces wound counter-clockwise seen from outside
    const FACES: [[u32; 3]; 8] = [
        [0, 2, 4],
        [2, 1, 4],
        [1, 3, 4],
        [3, 0, 4],
        [2, 0, 5],
        [1, 2, 5],
        [3, 1, 5],
        [0, 3, 5],
    ];

    let base = mesh.positions.len() as u32;
    for axis in AXES {
        mesh.push_vertex(add(center, scale(axis, radius)), axis);
    }
    for face in FACES {
        mesh.indices.extend(face.iter().map(|i| base + i));
    }
}

fn add_segment(mesh: &mut Mesh, a: &Sample, b: &Sample, sides: u32) {
    let axis = sub(b.position, a.position);
    let len = norm(axis);
    // Coincident samples contribute nothing
    if len <= f32::EPSILON {
        return;
    }
    let dir = scale(axis, 1.0 / len);
    let helper = if dir[0].abs() < 0.9 {
        [1.0, 0.0, 0.0]
    } else {
        [0.0, 1.0, 0.0]
    };
    let u = normalize(cross(dir, helper));
    let v = cross(dir, u);

    let base = mesh.positions.len() as u32;
    for (center, radius) in [(a.position, a.radius), (b.position, b.radius)] {
        for i in 0..sides {
            let theta = i as f32 * std::f32::consts::TAU / sides as f32;
            let normal = add(scale(u, theta.cos()), scale(v, theta.sin()));
            mesh.push_vertex(add(center, scale(normal, radius)), normal);
        }
    }

    for i in 0..sides {
        let j = (i + 1) % sides;
        let (a_i, a_j) = (base + i, base + j);
        let (b_i, b_j) = (base + sides + i, base + sides + j);
        mesh.indices.extend_from_slice(&[a_i, a_j, b_j, a_i, b_j, b_i]);
    }
}

fn add(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn scale(a: [f32; 3], s: f32) -> [f32; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn norm(a: [f32; 3]) -> f32 {
    (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt()
}

fn normalize(a: [f32; 3]) -> [f32; 3] {
    scale(a, 1.0 / norm(a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morphology::{Section, SectionType, Soma};

    fn attributes(sides: u32) -> SceneAttributes {
        SceneAttributes {
            use_meshes: true,
            mesh_tube_sides: sides,
            ..Default::default()
        }
    }

    fn single_section(samples: Vec<Sample>) -> Morphology {
        Morphology::new(
            Soma {
                center: [0.0, 0.0, 0.0],
                radius: 4.0,
            },
            vec![Section {
                id: 7,
                parent: None,
                kind: SectionType::Dendrite,
                samples,
            }],
        )
    }

    #[test]
    fn test_tube_topology() {
        let morphology = single_section(vec![
            Sample::new(4.0, 0.0, 0.0, 1.0),
            Sample::new(10.0, 0.0, 0.0, 1.0),
            Sample::new(10.0, 6.0, 0.0, 0.5),
        ]);
        let mesh = TubeMeshBuilder
            .build(Gid(1), &morphology, &attributes(6))
            .unwrap();

        // Soma: 6 vertices, 8 triangles. Each segment: 2 rings and 2 triangles per side.
        assert_eq!(mesh.vertex_count(), 6 + 2 * 12);
        assert_eq!(mesh.triangle_count(), 8 + 2 * 12);
        assert_eq!(mesh.normals.len(), mesh.positions.len());
        assert!(mesh
            .indices
            .iter()
            .all(|&i| (i as usize) < mesh.vertex_count()));
    }

    #[test]
    fn test_ring_vertices_sit_on_radius() {
        let morphology = single_section(vec![
            Sample::new(0.0, 0.0, 0.0, 2.0),
            Sample::new(0.0, 0.0, 10.0, 2.0),
        ]);
        let mesh = TubeMeshBuilder
            .build(Gid(1), &morphology, &attributes(8))
            .unwrap();
        for p in &mesh.positions[6..14] {
            let r = (p[0] * p[0] + p[1] * p[1]).sqrt();
            assert!((r - 2.0).abs() < 1e-4);
            assert!(p[2].abs() < 1e-4);
        }
    }

    #[test]
    fn test_degenerate_section() {
        let morphology = single_section(vec![Sample::new(0.0, 0.0, 0.0, 1.0)]);
        let err = TubeMeshBuilder
            .build(Gid(9), &morphology, &attributes(6))
            .unwrap_err();
        assert_eq!(
            err,
            MeshError::Degenerate {
                gid: Gid(9),
                section: 7
            }
        );

        let morphology = single_section(vec![
            Sample::new(0.0, 0.0, 0.0, 1.0),
            Sample::new(0.0, 0.0, 1.0, 0.0),
        ]);
        assert!(TubeMeshBuilder
            .build(Gid(9), &morphology, &attributes(6))
            .is_err());
    }

    #[test]
    fn test_rejects_too_few_sides() {
        let morphology = single_section(vec![
            Sample::new(0.0, 0.0, 0.0, 1.0),
            Sample::new(0.0, 0.0, 1.0, 1.0),
        ]);
        let err = TubeMeshBuilder
            .build(Gid(1), &morphology, &attributes(2))
            .unwrap_err();
        assert!(matches!(err, MeshError::InvalidParameter(_)));
    }
}
