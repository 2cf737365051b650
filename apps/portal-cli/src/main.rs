use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use glam::Vec2;
use portal_assets::{AssetLoader, AssetPaths};
use portal_common::HexColor;
use portal_input::NavAction;
use portal_render::{FrameLoop, HeadlessRenderer, ManualClock, Stage, Viewport};
use portal_scene::{MaterialBank, MaterialId, Scene, scene_panel};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portal-cli", about = "CLI tool for portal scene operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// Load the model and texture, assemble the scene and report it
    Inspect {
        /// Directory the static assets are loaded from
        #[arg(long, default_value = "static")]
        assets: PathBuf,
        #[arg(long, default_value = "portal.glb")]
        model: PathBuf,
        #[arg(long, default_value = "baked.jpg")]
        texture: PathBuf,
        /// Reject Draco-compressed models instead of decoding them
        #[arg(long)]
        no_draco: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the frame loop headlessly with a manual clock
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "10")]
        frames: u32,
        /// Seconds advanced per frame
        #[arg(long, default_value = "0.016")]
        dt: f32,
        /// Seed for firefly placement
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Horizontal drag in pixels applied before the first frame
        #[arg(long, default_value = "0")]
        orbit: f32,
        /// Panel writes such as `firefliesSize=250` or `clearColor=#000000`
        #[arg(long = "set", value_name = "LABEL=VALUE")]
        assignments: Vec<String>,
        /// Attach the model from this assets directory
        #[arg(long)]
        assets: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct InspectReport {
    model: PathBuf,
    texture: PathBuf,
    texture_size: [u32; 2],
    meshes: Vec<MeshReport>,
}

#[derive(Serialize)]
struct MeshReport {
    name: String,
    vertices: usize,
    indices: usize,
    material: Option<&'static str>,
}

fn material_name(bank: &MaterialBank, id: MaterialId) -> &'static str {
    if id == bank.baked() {
        "baked"
    } else if id == bank.pole_light() {
        "poleLight"
    } else if id == bank.portal() {
        "portal"
    } else {
        "fireflies"
    }
}

fn inspect(paths: &AssetPaths) -> anyhow::Result<InspectReport> {
    let loader = AssetLoader::from(paths);
    let texture = loader
        .load_texture(&paths.texture)
        .context("loading baked texture")?;
    let model = loader.load_model(&paths.model).context("loading model")?;

    let mut scene = Scene::empty(1.0);
    scene.attach_model(model).context("assembling scene")?;
    scene.materials.set_baked_texture(texture);

    let Some((_, root)) = scene.model() else {
        bail!("assembled scene has no model");
    };
    let meshes = root
        .meshes
        .iter()
        .map(|mesh| MeshReport {
            name: mesh.name.clone(),
            vertices: mesh.geometry.as_ref().map_or(0, |g| g.vertex_count()),
            indices: mesh.geometry.as_ref().map_or(0, |g| g.index_count()),
            material: mesh.material.map(|id| material_name(&scene.materials, id)),
        })
        .collect();
    let texture_size = scene
        .materials
        .baked_texture()
        .map_or([0, 0], |t| [t.width, t.height]);

    Ok(InspectReport {
        model: loader.resolve(&paths.model),
        texture: loader.resolve(&paths.texture),
        texture_size,
        meshes,
    })
}

/// Split `label=value` at the last `=`, since labels may contain spaces but not `=`.
fn parse_assignment(raw: &str) -> anyhow::Result<(&str, &str)> {
    raw.rsplit_once('=')
        .map(|(label, value)| (label.trim(), value.trim()))
        .filter(|(label, value)| !label.is_empty() && !value.is_empty())
        .with_context(|| format!("expected LABEL=VALUE, got {raw:?}"))
}

fn simulate(
    frames: u32,
    dt: f32,
    seed: u64,
    orbit: f32,
    assignments: &[String],
    assets: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut stage = Stage::new(Viewport::new(800, 600, 1.0), &mut StdRng::seed_from_u64(seed));
    let mut renderer = HeadlessRenderer::new();
    stage.configure(&mut renderer);

    if let Some(root) = assets {
        let paths = AssetPaths {
            root,
            ..AssetPaths::default()
        };
        let loader = AssetLoader::from(&paths);
        stage
            .scene
            .attach_model(loader.load_model(&paths.model)?)
            .context("assembling scene")?;
    }

    let panel = scene_panel();
    for raw in assignments {
        let (label, value) = parse_assignment(raw)?;
        if value.starts_with('#') {
            let color: HexColor = value.parse()?;
            if let Some(effect) = panel.set_color(&mut stage.scene.params, label, color)? {
                stage.apply_effect(effect, &mut renderer);
            }
        } else {
            let number: f32 = value
                .parse()
                .with_context(|| format!("{label}: not a number: {value:?}"))?;
            let written = panel.set_number(&mut stage.scene.params, label, number)?;
            println!("{label} = {written}");
        }
    }

    if orbit != 0.0 {
        stage.navigate(NavAction::Rotate(Vec2::new(orbit, 0.0)));
    }

    let mut frame_loop = FrameLoop::new(ManualClock::new());
    for _ in 0..frames {
        frame_loop.clock_mut().advance(dt);
        let info = frame_loop.tick(&mut stage, &mut renderer, &());
        let p = stage.camera.position;
        println!(
            "frame {:>4}  t={:.3}  camera=({:.3}, {:.3}, {:.3})",
            info.index, info.elapsed, p.x, p.y, p.z
        );
    }

    print!("{}", renderer.describe(&stage.scene, &stage.camera));
    tracing::debug!("simulated {} draws", renderer.draws.len());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("portal-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("assets: {}", portal_assets::crate_info());
            println!("scene: {}", portal_scene::crate_info());
            println!("tools: {}", portal_tools::crate_info());
            println!("input: {}", portal_input::crate_info());
            println!("render: {}", portal_render::crate_info());
        }
        Commands::Inspect {
            assets,
            model,
            texture,
            no_draco,
            json,
        } => {
            let paths = AssetPaths {
                root: assets,
                model,
                texture,
                draco: !no_draco,
            };
            let report = inspect(&paths)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Model: {}", report.model.display());
                println!(
                    "Texture: {} ({}x{})",
                    report.texture.display(),
                    report.texture_size[0],
                    report.texture_size[1]
                );
                for mesh in &report.meshes {
                    println!(
                        "  {:<16} vertices={:<6} indices={:<6} material={}",
                        mesh.name,
                        mesh.vertices,
                        mesh.indices,
                        mesh.material.unwrap_or("-")
                    );
                }
            }
        }
        Commands::Simulate {
            frames,
            dt,
            seed,
            orbit,
            assignments,
            assets,
        } => simulate(frames, dt, seed, orbit, &assignments, assets)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_splits_on_last_equals() {
        assert_eq!(
            parse_assignment("Effect Speed=1.5").unwrap(),
            ("Effect Speed", "1.5")
        );
        assert_eq!(
            parse_assignment("clearColor = #000000").unwrap(),
            ("clearColor", "#000000")
        );
        assert!(parse_assignment("firefliesSize").is_err());
        assert!(parse_assignment("=3").is_err());
    }

    #[test]
    fn material_names_follow_the_bank() {
        let bank = MaterialBank::new();
        assert_eq!(material_name(&bank, bank.baked()), "baked");
        assert_eq!(material_name(&bank, bank.pole_light()), "poleLight");
        assert_eq!(material_name(&bank, bank.portal()), "portal");
        assert_eq!(material_name(&bank, bank.fireflies()), "fireflies");
    }
}
