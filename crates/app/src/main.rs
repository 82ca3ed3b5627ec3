//! Entry point for the sgl demo.
//! Loads the demo asset set and reports OBJ parse timings.

mod config;

use std::{path::Path, time::Duration};

use anyhow::{Context, Result, bail};
use asset::{
    LoadedMesh, ObjStrategy,
    obj::load_obj_with,
    shader::ProgramSources,
    texture::TextureData,
};

use crate::config::{AppConfig, StrategyChoice};

/// Load `path` `repeat` times with one strategy and keep the fastest run.
fn best_of(path: &Path, strategy: ObjStrategy, repeat: u32) -> Result<LoadedMesh> {
    let mut best: Option<LoadedMesh> = None;
    for _ in 0..repeat.max(1) {
        let loaded = load_obj_with(path, strategy)
            .with_context(|| format!("Failed to load mesh with {} strategy", strategy))?;
        let faster = best
            .as_ref()
            .is_none_or(|b| loaded.stats.parse_time < b.stats.parse_time);
        if faster {
            best = Some(loaded);
        }
    }
    best.context("no load was run")
}

/// Run every requested strategy; with more than one, outputs must match.
fn load_mesh(config: &AppConfig) -> Result<LoadedMesh> {
    let mut runs: Vec<LoadedMesh> = Vec::new();
    for strategy in config.strategy.strategies() {
        runs.push(best_of(&config.obj, strategy, config.repeat)?);
    }

    for run in &runs {
        log::info!(
            "{:>6}: parse {:.3?}, remap {:.3?} (best of {})",
            run.stats.strategy,
            run.stats.parse_time,
            run.stats.remap_time,
            config.repeat
        );
    }

    if let [first, rest @ ..] = runs.as_slice() {
        for other in rest {
            if other.mesh != first.mesh {
                bail!(
                    "{} and {} strategies produced different meshes for {}",
                    first.stats.strategy,
                    other.stats.strategy,
                    config.obj.display()
                );
            }
            log::info!(
                "{} / {} parse time ratio: {:.2}",
                other.stats.strategy,
                first.stats.strategy,
                ratio(other.stats.parse_time, first.stats.parse_time)
            );
        }
    }

    runs.into_iter().next().context("no strategy selected")
}

fn ratio(a: Duration, b: Duration) -> f64 {
    a.as_secs_f64() / b.as_secs_f64().max(f64::EPSILON)
}

fn run(config: &AppConfig) -> Result<()> {
    let loaded = load_mesh(config)?;
    let mesh = &loaded.mesh;
    let stats = &loaded.stats;
    log::info!(
        "Mesh {}: {} v / {} vt / {} vn, {} triangles -> {} vertices ({} + {} + {} bytes to upload)",
        config.obj.display(),
        stats.positions,
        stats.texcoords,
        stats.normals,
        mesh.triangle_count(),
        mesh.vertex_count(),
        mesh.position_bytes().len(),
        mesh.texcoord_bytes().len(),
        mesh.normal_bytes().len()
    );
    if config.strategy == StrategyChoice::Both {
        log::info!("Strategies agree on {} vertices", mesh.vertex_count());
    }

    if let Some(path) = &config.texture {
        let texture = TextureData::load(path).context("Failed to load texture")?;
        log::info!("Texture ready: {}x{}", texture.width, texture.height);
    }

    if let Some(paths) = &config.shaders {
        let program = ProgramSources::load(&paths.vertex, &paths.fragment)
            .context("Failed to load shader sources")?;
        log::info!(
            "Shader sources ready: {} ({} bytes), {} ({} bytes)",
            program.vertex.path.display(),
            program.vertex.code.len(),
            program.fragment.path.display(),
            program.fragment.code.len()
        );
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_args(std::env::args().skip(1))?;
    log::info!(
        "Starting sgl. mesh={}, strategy={:?}, repeat={}",
        config.obj.display(),
        config.strategy,
        config.repeat
    );

    run(&config)?;

    log::info!("Done.");
    Ok(())
}
