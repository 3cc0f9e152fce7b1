//! Per-neuron construction data
//!
//! [`ConstructionData`] is the bundle handed to the scene-graph builders for
//! one neuron in one scene: the neuron, its morphology, its mesh when the
//! scene asks for meshes, the scene, and the attributes snapshot that was in
//! effect when the bundle was made. Every field is borrowed or shared; the
//! bundle never owns the circuit data it points at.
//!
//! [`build_scene`] runs construction for a whole circuit on the rayon pool,
//! isolating per-neuron failures.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::mesh::{Mesh, MeshError};
use crate::morphology::Morphology;
use crate::neuron::{Gid, NeuronData};
use crate::scene::{SceneAttributes, SceneContext, SceneId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstructionError {
    #[error("Neuron {gid} has no morphology")]
    MissingMorphology { gid: Gid },
}

/// Outcome of the mesh decision for one bundle
#[derive(Debug, Clone, PartialEq)]
pub enum MeshStatus {
    /// The scene does not use meshes; the mesh accessor was not called
    NotRequired,
    /// Mesh present
    Loaded,
    /// Meshes were required but generation failed; render the skeleton instead
    Failed(MeshError),
}

/// Read-only bundle describing one neuron for scene-graph construction
pub struct ConstructionData<'a> {
    neuron: &'a dyn NeuronData,
    morphology: &'a Morphology,
    mesh: Option<Arc<Mesh>>,
    mesh_status: MeshStatus,
    scene: &'a dyn SceneContext,
    scene_attr: Arc<SceneAttributes>,
}

impl<'a> ConstructionData<'a> {
    /// Assemble the bundle for `neuron` in `scene`.
    ///
    /// The attributes snapshot is read once. The mesh accessor is only called
    /// when that snapshot requires meshes; a mesh failure degrades the bundle
    /// to skeleton-only instead of failing construction.
    pub fn build(
        neuron: &'a dyn NeuronData,
        scene: &'a dyn SceneContext,
    ) -> Result<Self, ConstructionError> {
        let scene_attr = scene.attributes();
        let gid = neuron.gid();

        let morphology = neuron
            .morphology()
            .ok_or(ConstructionError::MissingMorphology { gid })?;

        let (mesh, mesh_status) = if scene_attr.are_meshes_required() {
            match neuron.mesh(&scene_attr) {
                Ok(mesh) => (Some(mesh), MeshStatus::Loaded),
                Err(e) => {
                    warn!(gid = %gid, error = %e, "Mesh unavailable, falling back to morphology");
                    (None, MeshStatus::Failed(e))
                }
            }
        } else {
            (None, MeshStatus::NotRequired)
        };

        Ok(Self {
            neuron,
            morphology,
            mesh,
            mesh_status,
            scene,
            scene_attr,
        })
    }

    pub fn neuron(&self) -> &'a dyn NeuronData {
        self.neuron
    }

    pub fn gid(&self) -> Gid {
        self.neuron.gid()
    }

    pub fn morphology(&self) -> &'a Morphology {
        self.morphology
    }

    /// Surface mesh, present only when the scene requires meshes
    pub fn mesh(&self) -> Option<&Arc<Mesh>> {
        self.mesh.as_ref()
    }

    pub fn mesh_status(&self) -> &MeshStatus {
        &self.mesh_status
    }

    pub fn scene(&self) -> &'a dyn SceneContext {
        self.scene
    }

    /// Attributes snapshot captured at construction time
    pub fn scene_attributes(&self) -> &Arc<SceneAttributes> {
        &self.scene_attr
    }
}

impl std::fmt::Debug for ConstructionData<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstructionData")
            .field("gid", &self.gid())
            .field("scene", &self.scene.id())
            .field("sections", &self.morphology.section_count())
            .field("mesh_status", &self.mesh_status)
            .field("scene_attr", &self.scene_attr)
            .finish()
    }
}

/// A neuron left out of a scene
#[derive(Debug, Clone, Serialize)]
pub struct BuildFailure {
    pub gid: Gid,
    pub reason: String,
}

/// Summary of one scene build pass
#[derive(Debug, Clone, Serialize)]
pub struct SceneBuildReport {
    pub scene_id: SceneId,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub requested: usize,
    pub built: usize,
    pub meshes_loaded: usize,
    pub meshes_failed: usize,
    pub failed: Vec<BuildFailure>,
}

impl SceneBuildReport {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Bundles produced by [`build_scene`], in the order the neurons were given
#[derive(Debug)]
pub struct SceneBuild<'a> {
    pub data: Vec<ConstructionData<'a>>,
    pub report: SceneBuildReport,
}

/// Build construction data for every neuron of a scene in parallel.
///
/// A neuron that fails construction is logged and recorded in the report;
/// its siblings are still built.
pub fn build_scene<'a, N: NeuronData>(
    neurons: &'a [N],
    scene: &'a dyn SceneContext,
) -> SceneBuild<'a> {
    let started_at = Utc::now();
    let timer = Instant::now();

    info!(scene = %scene.id(), neurons = neurons.len(), "Building scene");

    let results: Vec<(Gid, Result<ConstructionData<'a>, ConstructionError>)> = neurons
        .par_iter()
        .map(|neuron| {
            let neuron: &'a dyn NeuronData = neuron;
            (neuron.gid(), ConstructionData::build(neuron, scene))
        })
        .collect();

    let mut data = Vec::with_capacity(results.len());
    let mut failed = Vec::new();
    for (gid, result) in results {
        match result {
            Ok(bundle) => data.push(bundle),
            Err(e) => {
                warn!(gid = %gid, error = %e, "Neuron left out of scene");
                failed.push(BuildFailure {
                    gid,
                    reason: e.to_string(),
                });
            }
        }
    }

    let meshes_loaded = data
        .iter()
        .filter(|d| matches!(d.mesh_status(), MeshStatus::Loaded))
        .count();
    let meshes_failed = data
        .iter()
        .filter(|d| matches!(d.mesh_status(), MeshStatus::Failed(_)))
        .count();

    let report = SceneBuildReport {
        scene_id: scene.id(),
        started_at,
        elapsed_ms: timer.elapsed().as_millis() as u64,
        requested: neurons.len(),
        built: data.len(),
        meshes_loaded,
        meshes_failed,
        failed,
    };

    debug!(?report, "Scene build finished");
    info!(
        scene = %report.scene_id,
        built = report.built,
        failed = report.failed.len(),
        meshes = report.meshes_loaded,
        elapsed_ms = report.elapsed_ms,
        "Scene built"
    );

    SceneBuild { data, report }
}
