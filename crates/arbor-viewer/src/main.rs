//! Arbor - Main entry point
//!
//! Builds the construction data of a circuit scene and optionally replays a
//! scripted interaction through the per-view event handler chains.

mod circuit;
mod config;
mod replay;

use anyhow::Result;
use arbor_core::{build_scene, CircuitScene, MeshCache, SceneBuildReport};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "arbor")]
#[command(about = "Neuron circuit scene construction and interaction replay")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "arbor.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Override whether the scene requires meshes
    #[arg(long)]
    meshes: Option<bool>,

    /// Override the number of neurons in the circuit
    #[arg(short, long)]
    neurons: Option<u32>,

    /// Replay a scripted interaction on two views, then rebuild the scene
    #[arg(long)]
    replay_events: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Write a default configuration file to the config path and exit
    #[arg(long)]
    write_default_config: bool,
}

#[derive(Debug, Serialize)]
struct Summary {
    builds: Vec<SceneBuildReport>,
    mesh_cache: arbor_core::MeshCacheStats,
    replay: Option<Vec<replay::ViewReplay>>,
}

fn build_pass(neurons: &[arbor_core::Neuron], scene: &CircuitScene) -> SceneBuildReport {
    // Scene building is CPU bound and runs on the rayon pool
    tokio::task::block_in_place(|| build_scene(neurons, scene).report)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Arbor v{}", env!("CARGO_PKG_VERSION"));

    if args.write_default_config {
        config::save_default_config(&args.config)?;
        info!(path = %args.config.display(), "Default configuration written");
        return Ok(());
    }

    // Load configuration
    let mut config = config::load_config(&args.config)?;

    if let Some(meshes) = args.meshes {
        config.scene.use_meshes = meshes;
    }
    if let Some(neurons) = args.neurons {
        config.circuit.neurons = neurons;
    }

    if config.build.worker_threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.build.worker_threads)
            .build_global()?;
    }

    info!(
        neurons = config.circuit.neurons,
        meshes = config.scene.use_meshes,
        workers = config.build.worker_threads,
        "Configuration loaded"
    );

    let meshes = Arc::new(MeshCache::with_tube_builder());
    let neurons = circuit::generate(&config.circuit, &meshes);
    let scene = Arc::new(CircuitScene::new(config.scene.clone()));

    let mut builds = vec![build_pass(&neurons, &scene)];

    let replay = if args.replay_events {
        let results = replay::replay(scene.clone()).await?;
        // The replay may have changed the scene attributes
        builds.push(build_pass(&neurons, &scene));
        Some(results)
    } else {
        None
    };

    let summary = Summary {
        builds,
        mesh_cache: meshes.stats(),
        replay,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for (pass, report) in summary.builds.iter().enumerate() {
            println!(
                "Build pass {}: {}/{} neurons in {} ms ({} meshes, {} mesh failures)",
                pass + 1,
                report.built,
                report.requested,
                report.elapsed_ms,
                report.meshes_loaded,
                report.meshes_failed
            );
            for failure in &report.failed {
                println!("  - {} left out: {}", failure.gid, failure.reason);
            }
        }
        println!(
            "Mesh cache: {} entries, {} builds, {} hits, {} failures",
            summary.mesh_cache.entries,
            summary.mesh_cache.builds,
            summary.mesh_cache.hits,
            summary.mesh_cache.failures
        );
        if let Some(views) = &summary.replay {
            for view in views {
                println!(
                    "  View {} ({:.2}): {} consumed, {} unhandled, camera azimuth {:.3} distance {:.1}",
                    view.view,
                    view.aspect_ratio,
                    view.consumed,
                    view.unhandled,
                    view.camera.azimuth,
                    view.camera.distance
                );
            }
        }
    }

    Ok(())
}
