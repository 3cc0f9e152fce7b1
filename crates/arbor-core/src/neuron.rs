//! Neuron data provider interface

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::mesh::{Mesh, MeshError};
use crate::mesh_cache::MeshCache;
use crate::morphology::Morphology;
use crate::scene::SceneAttributes;

/// Global identifier of a neuron within its circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Gid(pub u32);

impl std::fmt::Display for Gid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "a{}", self.0)
    }
}

/// What scene construction needs from a neuron.
///
/// The circuit owns neurons; construction only borrows them.
pub trait NeuronData: Send + Sync {
    fn gid(&self) -> Gid;

    /// Skeleton of the neuron, `None` when the circuit could not provide one
    fn morphology(&self) -> Option<&Morphology>;

    /// Surface mesh for the given scene attributes.
    ///
    /// May triangulate on first call; implementations must memoize so that
    /// repeated requests are cheap and concurrent requests compute once.
    fn mesh(&self, attributes: &SceneAttributes) -> Result<Arc<Mesh>, MeshError>;
}

/// Circuit neuron whose meshes come from a shared [`MeshCache`]
#[derive(Debug, Clone)]
pub struct Neuron {
    gid: Gid,
    morphology: Option<Arc<Morphology>>,
    meshes: Arc<MeshCache>,
}

impl Neuron {
    /// Create a neuron with a morphology
    pub fn new(gid: Gid, morphology: Arc<Morphology>, meshes: Arc<MeshCache>) -> Self {
        Self {
            gid,
            morphology: Some(morphology),
            meshes,
        }
    }

    /// Create a neuron whose morphology is unavailable
    pub fn without_morphology(gid: Gid, meshes: Arc<MeshCache>) -> Self {
        Self {
            gid,
            morphology: None,
            meshes,
        }
    }
}

impl NeuronData for Neuron {
    fn gid(&self) -> Gid {
        self.gid
    }

    fn morphology(&self) -> Option<&Morphology> {
        self.morphology.as_deref()
    }

    fn mesh(&self, attributes: &SceneAttributes) -> Result<Arc<Mesh>, MeshError> {
        let morphology = self
            .morphology
            .as_deref()
            .ok_or(MeshError::NoMorphology(self.gid))?;
        self.meshes.get_or_build(self.gid, morphology, attributes)
    }
}
