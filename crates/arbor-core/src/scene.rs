//! Scene-wide rendering attributes and the scene context they belong to

use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;
use uuid::Uuid;

/// Which parts of each neuron a scene displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    SomaOnly,
    NoAxon,
    WholeNeuron,
}

impl Default for DisplayMode {
    fn default() -> Self {
        Self::WholeNeuron
    }
}

/// Camera distances (micrometers) at which representations switch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodThresholds {
    /// Beyond this distance meshes are replaced by skeletons
    #[serde(default = "default_mesh_max_distance")]
    pub mesh_max_distance: f32,
    /// Beyond this distance skeletons are replaced by soma spheres
    #[serde(default = "default_skeleton_max_distance")]
    pub skeleton_max_distance: f32,
}

impl Default for LodThresholds {
    fn default() -> Self {
        Self {
            mesh_max_distance: default_mesh_max_distance(),
            skeleton_max_distance: default_skeleton_max_distance(),
        }
    }
}

fn default_mesh_max_distance() -> f32 {
    500.0
}

fn default_skeleton_max_distance() -> f32 {
    5000.0
}

/// Immutable configuration snapshot for one scene.
///
/// Only [`are_meshes_required`](Self::are_meshes_required) and the
/// tessellation parameter are consumed during construction; the remaining
/// flags are read by the scene-graph builders downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneAttributes {
    /// Build surface meshes for every neuron in the scene
    #[serde(default)]
    pub use_meshes: bool,
    /// Number of sides of the tube cross-section used by the mesh builder
    #[serde(default = "default_tube_sides")]
    pub mesh_tube_sides: u32,
    #[serde(default)]
    pub display_mode: DisplayMode,
    /// Frustum culling of neurite fragments
    #[serde(default = "default_true")]
    pub culling: bool,
    /// Order-independent transparency
    #[serde(default)]
    pub alpha_blending: bool,
    #[serde(default)]
    pub lod: LodThresholds,
}

impl Default for SceneAttributes {
    fn default() -> Self {
        Self {
            use_meshes: false,
            mesh_tube_sides: default_tube_sides(),
            display_mode: DisplayMode::default(),
            culling: true,
            alpha_blending: false,
            lod: LodThresholds::default(),
        }
    }
}

fn default_tube_sides() -> u32 {
    8
}

fn default_true() -> bool {
    true
}

impl SceneAttributes {
    /// Whether neurons in this scene must be rendered with surface meshes
    pub fn are_meshes_required(&self) -> bool {
        self.use_meshes
    }
}

/// Unique identifier of a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SceneId(pub Uuid);

impl SceneId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SceneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The scene a neuron is being built into.
pub trait SceneContext: Send + Sync {
    fn id(&self) -> SceneId;

    /// Current attributes snapshot. Callers keep the returned `Arc` for as
    /// long as they need a consistent view of the configuration.
    fn attributes(&self) -> Arc<SceneAttributes>;
}

/// Scene holding a swappable attributes snapshot
#[derive(Debug)]
pub struct CircuitScene {
    id: SceneId,
    attributes: RwLock<Arc<SceneAttributes>>,
}

impl CircuitScene {
    /// Create a new scene with the given attributes
    pub fn new(attributes: SceneAttributes) -> Self {
        Self {
            id: SceneId::new(),
            attributes: RwLock::new(Arc::new(attributes)),
        }
    }

    /// Replace the attributes snapshot. Bundles already built keep the
    /// snapshot they captured.
    pub fn set_attributes(&self, attributes: SceneAttributes) {
        let mut current = self
            .attributes
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(attributes);
        info!(scene = %self.id, meshes = current.use_meshes, "Scene attributes replaced");
    }
}

impl SceneContext for CircuitScene {
    fn id(&self) -> SceneId {
        self.id
    }

    fn attributes(&self) -> Arc<SceneAttributes> {
        self.attributes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_swap_keeps_old_snapshot() {
        let scene = CircuitScene::new(SceneAttributes::default());
        let before = scene.attributes();
        assert!(!before.are_meshes_required());

        scene.set_attributes(SceneAttributes {
            use_meshes: true,
            ..Default::default()
        });

        let after = scene.attributes();
        assert!(after.are_meshes_required());
        assert!(!before.are_meshes_required());
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_attributes_shared_between_reads() {
        let scene = CircuitScene::new(SceneAttributes::default());
        assert!(Arc::ptr_eq(&scene.attributes(), &scene.attributes()));
    }

    #[test]
    fn test_deserialize_partial_attributes() {
        let json = r#"{ "use_meshes": true, "display_mode": "no_axon", "lod": { "mesh_max_distance": 120.0 } }"#;
        let attrs: SceneAttributes = serde_json::from_str(json).unwrap();
        assert!(attrs.are_meshes_required());
        assert_eq!(attrs.display_mode, DisplayMode::NoAxon);
        assert_eq!(attrs.lod.mesh_max_distance, 120.0);
        assert_eq!(attrs.lod.skeleton_max_distance, 5000.0);
        assert_eq!(attrs.mesh_tube_sides, 8);
        assert!(attrs.culling);
    }
}
