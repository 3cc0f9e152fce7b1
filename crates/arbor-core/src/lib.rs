//! Arbor Core - Neuron data model and per-neuron scene construction
//!
//! This crate provides the pieces the renderer needs before any scene-graph
//! node exists:
//! - Morphology and mesh types for a single neuron
//! - A thread-safe, memoized mesh cache keyed by neuron
//! - Immutable scene attributes shared by every neuron of a scene
//! - Construction data: the per-neuron bundle handed to scene builders
//! - A parallel scene build pass with per-neuron failure isolation

pub mod construction;
pub mod mesh;
pub mod mesh_cache;
pub mod morphology;
pub mod neuron;
pub mod scene;

pub use construction::{
    build_scene, BuildFailure, ConstructionData, ConstructionError, MeshStatus, SceneBuild,
    SceneBuildReport,
};
pub use mesh::{Mesh, MeshBuilder, MeshError, TubeMeshBuilder};
pub use mesh_cache::{MeshCache, MeshCacheStats};
pub use morphology::{Bounds, Morphology, Sample, Section, SectionType, Soma};
pub use neuron::{Gid, Neuron, NeuronData};
pub use scene::{CircuitScene, DisplayMode, LodThresholds, SceneAttributes, SceneContext, SceneId};
