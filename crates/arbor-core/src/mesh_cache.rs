//! Memoized, thread-safe mesh generation keyed by neuron
//!
//! Every neuron gets one slot. The first request for a neuron runs the
//! builder inside the slot's `OnceLock`; concurrent requests for the same
//! neuron block on that slot until the result is stored, and every later
//! request reads the stored result. Failures are stored as well, so a
//! malformed morphology is triangulated (and reported) once, not on every
//! scene rebuild. Call [`MeshCache::evict`] or [`MeshCache::clear`] to
//! force regeneration, e.g. after changing tessellation parameters.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{debug, warn};

use crate::mesh::{Mesh, MeshBuilder, MeshError, TubeMeshBuilder};
use crate::morphology::Morphology;
use crate::neuron::Gid;
use crate::scene::SceneAttributes;

type Slot = Arc<OnceLock<Result<Arc<Mesh>, MeshError>>>;

/// Counters describing cache effectiveness
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MeshCacheStats {
    pub entries: usize,
    pub hits: u64,
    pub builds: u64,
    pub failures: u64,
}

/// Per-neuron mesh cache shared by every neuron of a circuit
pub struct MeshCache {
    builder: Arc<dyn MeshBuilder>,
    slots: RwLock<HashMap<Gid, Slot>>,
    hits: AtomicU64,
    builds: AtomicU64,
    failures: AtomicU64,
}

impl MeshCache {
    /// Create a cache that generates meshes with the given builder
    pub fn new(builder: Arc<dyn MeshBuilder>) -> Self {
        Self {
            builder,
            slots: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            builds: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Create a cache backed by [`TubeMeshBuilder`]
    pub fn with_tube_builder() -> Self {
        Self::new(Arc::new(TubeMeshBuilder))
    }

    fn slot(&self, gid: Gid) -> Slot {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&gid)
        {
            return slot.clone();
        }

        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(gid)
            .or_default()
            .clone()
    }

    /// Return the mesh for a neuron, building it on first request
    pub fn get_or_build(
        &self,
        gid: Gid,
        morphology: &Morphology,
        attributes: &SceneAttributes,
    ) -> Result<Arc<Mesh>, MeshError> {
        let slot = self.slot(gid);
        let mut built = false;

        let result = slot.get_or_init(|| {
            built = true;
            self.builds.fetch_add(1, Ordering::Relaxed);
            let result = self.builder.build(gid, morphology, attributes);
            match &result {
                Ok(mesh) => debug!(
                    gid = %gid,
                    vertices = mesh.vertex_count(),
                    triangles = mesh.triangle_count(),
                    "Mesh built"
                ),
                Err(e) => {
                    self.failures.fetch_add(1, Ordering::Relaxed);
                    warn!(gid = %gid, error = %e, "Mesh generation failed");
                }
            }
            result.map(Arc::new)
        });

        if !built {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        result.clone()
    }

    /// Previously computed result for a neuron, without building
    pub fn get(&self, gid: Gid) -> Option<Result<Arc<Mesh>, MeshError>> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&gid)
            .and_then(|slot| slot.get().cloned())
    }

    /// Whether a result (mesh or failure) is stored for a neuron
    pub fn contains(&self, gid: Gid) -> bool {
        self.get(gid).is_some()
    }

    /// Drop the stored result for a neuron so the next request rebuilds it.
    /// Holders of the old mesh keep it alive until they release it.
    pub fn evict(&self, gid: Gid) -> bool {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&gid)
            .is_some()
    }

    /// Drop every stored result
    pub fn clear(&self) {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> MeshCacheStats {
        MeshCacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for MeshCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshCache")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
