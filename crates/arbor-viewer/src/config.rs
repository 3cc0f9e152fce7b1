//! Configuration loading

use anyhow::Result;
use arbor_core::SceneAttributes;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Attributes of the scene every neuron is built into
    #[serde(default)]
    pub scene: SceneAttributes,
    #[serde(default)]
    pub circuit: CircuitConfig,
    #[serde(default)]
    pub build: BuildConfig,
}

/// Synthetic circuit generated in place of a loaded one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitConfig {
    /// Number of neurons
    #[serde(default = "default_neurons")]
    pub neurons: u32,
    #[serde(default = "default_sections")]
    pub sections_per_neuron: u32,
    #[serde(default = "default_samples")]
    pub samples_per_section: u32,
    /// Seed for the morphology generator
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// GIDs generated without a morphology
    #[serde(default)]
    pub missing_morphology: Vec<u32>,
    /// GIDs generated with a section that cannot be meshed
    #[serde(default)]
    pub degenerate: Vec<u32>,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            neurons: default_neurons(),
            sections_per_neuron: default_sections(),
            samples_per_section: default_samples(),
            seed: default_seed(),
            missing_morphology: Vec::new(),
            degenerate: Vec::new(),
        }
    }
}

fn default_neurons() -> u32 {
    1000
}

fn default_sections() -> u32 {
    12
}

fn default_samples() -> u32 {
    6
}

fn default_seed() -> u64 {
    1
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Scene build worker threads (0 = one per core)
    #[serde(default)]
    pub worker_threads: usize,
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let config = Config {
        circuit: CircuitConfig {
            missing_morphology: vec![13],
            degenerate: vec![42],
            ..Default::default()
        },
        ..Default::default()
    };

    let content = toml::to_string_pretty(&config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::DisplayMode;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.circuit.neurons, 1000);
        assert!(!config.scene.are_meshes_required());
        assert_eq!(config.build.worker_threads, 0);
    }

    #[test]
    fn test_parse_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("arbor.toml");
        std::fs::write(
            &path,
            r#"
[scene]
use_meshes = true
display_mode = "soma_only"

[scene.lod]
mesh_max_distance = 250.0

[circuit]
neurons = 64
missing_morphology = [3, 5]

[build]
worker_threads = 4
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert!(config.scene.are_meshes_required());
        assert_eq!(config.scene.display_mode, DisplayMode::SomaOnly);
        assert_eq!(config.scene.lod.mesh_max_distance, 250.0);
        assert_eq!(config.scene.mesh_tube_sides, 8);
        assert_eq!(config.circuit.neurons, 64);
        assert_eq!(config.circuit.sections_per_neuron, 12);
        assert_eq!(config.circuit.missing_morphology, vec![3, 5]);
        assert_eq!(config.build.worker_threads, 4);
    }

    #[test]
    fn test_default_config_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("arbor.toml");
        save_default_config(&path).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.circuit.missing_morphology, vec![13]);
        assert_eq!(config.circuit.degenerate, vec![42]);
    }
}
