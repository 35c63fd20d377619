use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use lensing_common::Extent;
use lensing_common::constants::{OUTPUT_EXTENT, WORKGROUP_SIZE};
use lensing_input::InputEvent;
use lensing_render::{
    DispatchGrid, FrameOutcome, FrameParameters, LAYOUT_VERSION, OrbitCamera, PatternKernel,
    Session, SoftwareBackend, build_frame_parameters, letterbox,
};
use lensing_scene::{GpuObject, Scene};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lensing-cli", about = "Headless tools for the lensing viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print constants, record layouts and the scene summary
    Info,
    /// Apply synthetic input to a fresh camera and print the frame parameters
    Params {
        /// Horizontal drag in pixels
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        drag_x: f32,
        /// Vertical drag in pixels
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        drag_y: f32,
        /// Wheel movement in lines
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        wheel: f32,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print where the output image lands inside a target of the given size
    Letterbox { width: u32, height: u32 },
    /// Render one software frame with the pattern kernel and save it as PNG
    Snapshot {
        #[arg(long, default_value_t = 1280)]
        width: u32,
        #[arg(long, default_value_t = 720)]
        height: u32,
        #[arg(short, long, default_value = "snapshot.png")]
        out: PathBuf,
    },
}

/// Events equivalent to one drag and one wheel movement; zero components
/// are left out.
fn synthetic_events(drag_x: f32, drag_y: f32, wheel: f32) -> Vec<InputEvent> {
    let mut events = Vec::new();
    if drag_x != 0.0 || drag_y != 0.0 {
        events.push(InputEvent::Drag {
            dx: drag_x,
            dy: drag_y,
        });
    }
    if wheel != 0.0 {
        events.push(InputEvent::Wheel { delta: wheel });
    }
    events
}

fn params_after(events: &[InputEvent], scene: &Scene) -> (OrbitCamera, FrameParameters) {
    let mut camera = OrbitCamera::default();
    for event in events {
        camera.apply(event);
    }
    let params = build_frame_parameters(&camera, scene);
    (camera, params)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let scene = Scene::initialize()?;

    match cli.command {
        Commands::Info => {
            println!("lensing-cli v{}", env!("CARGO_PKG_VERSION"));
            let grid = DispatchGrid::covering(OUTPUT_EXTENT, WORKGROUP_SIZE);
            println!(
                "output: {OUTPUT_EXTENT}, workgroup {WORKGROUP_SIZE}x{WORKGROUP_SIZE}, {}x{} groups",
                grid.groups_x, grid.groups_y
            );
            println!(
                "layout v{LAYOUT_VERSION}: FrameParameters {} bytes, GpuObject {} bytes",
                std::mem::size_of::<FrameParameters>(),
                std::mem::size_of::<GpuObject>()
            );
            println!("scene: {scene}");
            for (i, object) in scene.objects().iter().enumerate() {
                println!(
                    "  [{i}] position {:?} radius {:.3e} mass {:.3e}",
                    object.position().to_array(),
                    object.radius(),
                    object.mass()
                );
            }
        }
        Commands::Params {
            drag_x,
            drag_y,
            wheel,
            json,
        } => {
            let events = synthetic_events(drag_x, drag_y, wheel);
            let (camera, params) = params_after(&events, &scene);
            if json {
                println!("{}", serde_json::to_string_pretty(&params)?);
            } else {
                println!(
                    "camera: yaw {:.6} pitch {:.6} distance {:.6e}",
                    camera.yaw(),
                    camera.pitch(),
                    camera.distance()
                );
                println!("position: {:?}", params.camera_position);
                println!("forward:  {:?}", params.camera_forward);
                println!("right:    {:?}", params.camera_right);
                println!("up:       {:?}", params.camera_up);
                println!(
                    "tan_half_fov {:.6} aspect {:.6} objects {} disk {:.3e}..{:.3e}",
                    params.tan_half_fov,
                    params.aspect,
                    params.object_count,
                    params.disk_inner,
                    params.disk_outer
                );
            }
        }
        Commands::Letterbox { width, height } => {
            let target = Extent::new(width, height);
            match letterbox(target, OUTPUT_EXTENT) {
                Some(v) => println!(
                    "target {target}: image {OUTPUT_EXTENT} at ({}, {}) size {}",
                    v.x,
                    v.y,
                    v.extent()
                ),
                None => println!("target {target}: empty, nothing is drawn"),
            }
        }
        Commands::Snapshot { width, height, out } => {
            let window = Extent::new(width, height);
            if window.is_empty() {
                bail!("snapshot target {window} has no area");
            }
            let mut backend = SoftwareBackend::new(PatternKernel, &scene, window);
            let mut session = Session::new(&scene);
            session.iterate(std::iter::empty::<InputEvent>(), &mut backend);
            match session.last_outcome() {
                Some(FrameOutcome::Presented { .. }) => {}
                other => bail!("frame was not presented: {other:?}"),
            }

            let framebuffer = backend.framebuffer();
            let extent = framebuffer.extent();
            let png = image::RgbaImage::from_raw(
                extent.width,
                extent.height,
                framebuffer.as_bytes().to_vec(),
            )
            .context("framebuffer size mismatch")?;
            png.save(&out)
                .with_context(|| format!("failed to write {}", out.display()))?;
            tracing::debug!(path = %out.display(), "snapshot written");
            println!("wrote {} ({extent})", out.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_inputs_produce_no_events() {
        assert!(synthetic_events(0.0, 0.0, 0.0).is_empty());
        assert_eq!(
            synthetic_events(100.0, 0.0, 1.0),
            vec![
                InputEvent::Drag { dx: 100.0, dy: 0.0 },
                InputEvent::Wheel { delta: 1.0 }
            ]
        );
    }

    #[test]
    fn drag_of_one_hundred_pixels_turns_camera() {
        let scene = Scene::initialize().unwrap();
        let (camera, params) = params_after(&synthetic_events(100.0, 0.0, 0.0), &scene);
        assert!((camera.yaw() - 0.2).abs() < 1e-6);
        assert_eq!(camera.pitch(), 0.0);
        assert!(params.camera_forward[1].abs() < 1e-6);
    }

    #[test]
    fn params_serialize_without_padding() {
        let scene = Scene::initialize().unwrap();
        let (_, params) = params_after(&[], &scene);
        let json = serde_json::to_value(params).unwrap();
        assert_eq!(json["object_count"], 3);
        assert!(json.get("_pad").is_none());
    }
}
