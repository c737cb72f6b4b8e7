use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use skyisle_common::Viewport;
use skyisle_explore::{ExploreConfig, MapView, PageHost, launch_map_view, wire_explore_button};
use skyisle_input::{KeyBindings, MoveKey};
use skyisle_scene::{DebugTextRenderer, FirstPersonCamera, Renderer, SceneDescription};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skyisle-cli", about = "Headless tools for the skyisle explorer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML config file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Describe the explore scene
    Describe {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Walk the map view headlessly and report where the camera ends up
    Simulate {
        /// Physical key codes held for the whole run (e.g. KeyW,KeyD)
        #[arg(short, long, value_delimiter = ',', default_value = "KeyW")]
        keys: Vec<String>,
        /// Seconds of holding the keys
        #[arg(short, long, default_value = "1.0")]
        seconds: f64,
        /// Seconds of coasting after the keys are released
        #[arg(long, default_value = "0.0")]
        coast: f64,
        /// Simulated display refresh rate
        #[arg(long, default_value = "60")]
        fps: u32,
        /// Horizontal mouse movement in pixels applied before walking
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        look: f32,
        /// Print the debug frame for the last tick
        #[arg(long)]
        frame: bool,
    },
    /// Print the effective configuration as YAML
    Config,
}

/// A page with a fixed-size container and no window behind it.
struct HeadlessPage {
    viewport: Viewport,
}

impl PageHost for HeadlessPage {
    type Renderer = DebugTextRenderer;

    fn has_explore_button(&self) -> bool {
        true
    }

    fn hide_landing(&mut self) {}

    fn reveal_map_container(&mut self) -> Option<DebugTextRenderer> {
        Some(DebugTextRenderer::new(self.viewport))
    }
}

struct SimulateArgs {
    keys: Vec<String>,
    seconds: f64,
    coast: f64,
    fps: u32,
    look: f32,
}

struct SimulationReport {
    view: MapView<DebugTextRenderer>,
    last_frame: String,
    start: glam::Vec3,
}

/// Resolve key codes against the bindings, rejecting any that do not move.
fn movement_keys(bindings: &KeyBindings, keys: &[String]) -> anyhow::Result<Vec<MoveKey>> {
    keys.iter()
        .map(|code| match bindings.lookup(code) {
            Some(key) => Ok(key),
            None => bail!("{code} is not bound to a movement key"),
        })
        .collect()
}

fn simulate(config: &ExploreConfig, args: &SimulateArgs) -> anyhow::Result<SimulationReport> {
    let held = movement_keys(&config.bindings, &args.keys)?;
    tracing::debug!(?held, "simulating");
    if args.fps == 0 {
        bail!("fps must be positive");
    }
    if !(args.seconds >= 0.0 && args.coast >= 0.0) {
        bail!("durations must be non-negative");
    }

    let mut page = HeadlessPage {
        viewport: Viewport::default(),
    };
    wire_explore_button(&page)?;
    let t0 = Instant::now();
    let mut view = launch_map_view(&mut page, config, t0)?;
    let start = view.camera().position;

    if args.look != 0.0 {
        if view.click_overlay().is_some() {
            view.on_pointer_locked();
        }
        view.on_mouse_move(args.look, 0.0);
    }

    for key in &args.keys {
        view.on_key_down(key);
    }

    let held_frames = (args.seconds * f64::from(args.fps)).round() as u64;
    let coast_frames = (args.coast * f64::from(args.fps)).round() as u64;
    let frame_at = |n: u64| t0 + Duration::from_secs_f64(n as f64 / f64::from(args.fps));

    let mut last_frame = String::new();
    for n in 1..=held_frames {
        last_frame = view.animate_frame(frame_at(n));
    }
    for key in &args.keys {
        view.on_key_up(key);
    }
    for n in held_frames + 1..=held_frames + coast_frames {
        last_frame = view.animate_frame(frame_at(n));
    }

    Ok(SimulationReport {
        view,
        last_frame,
        start,
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = match &cli.config {
        Some(path) => ExploreConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ExploreConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("skyisle-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("scene: {}", skyisle_scene::crate_info());
            println!("explore: {}", skyisle_explore::crate_info());
            println!(
                "movement: damping={}/s acceleration={}/s^2 terminal speed={:.1}",
                config.movement.params.damping,
                config.movement.params.acceleration,
                config.movement.params.terminal_speed()
            );
        }
        Commands::Describe { json } => {
            let scene = SceneDescription::floating_island();
            if json {
                println!("{}", serde_json::to_string_pretty(&scene)?);
            } else {
                let camera = FirstPersonCamera::from_config(&config.camera, Viewport::default());
                let mut renderer = DebugTextRenderer::new(Viewport::default());
                print!("{}", renderer.render(&scene, &camera));
            }
        }
        Commands::Simulate {
            keys,
            seconds,
            coast,
            fps,
            look,
            frame,
        } => {
            let args = SimulateArgs {
                keys,
                seconds,
                coast,
                fps,
                look,
            };
            let report = simulate(&config, &args)?;
            let view = &report.view;
            let end = view.camera().position;
            let v = view.velocity();
            println!(
                "Simulated {} frames at {} fps, keys held: {}",
                view.frame_count(),
                args.fps,
                args.keys.join(",")
            );
            println!("Start:    ({:.3}, {:.3}, {:.3})", report.start.x, report.start.y, report.start.z);
            println!("End:      ({:.3}, {:.3}, {:.3})", end.x, end.y, end.z);
            println!("Distance: {:.3}", end.distance(report.start));
            println!("Velocity: ({:.3}, {:.3}, {:.3}) speed={:.3}", v.x, v.y, v.z, v.length());
            if frame {
                print!("{}", report.last_frame);
            }
        }
        Commands::Config => {
            print!("{}", config.to_yaml_string()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(keys: &[&str], seconds: f64) -> SimulateArgs {
        SimulateArgs {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            seconds,
            coast: 0.0,
            fps: 60,
            look: 0.0,
        }
    }

    #[test]
    fn simulate_forward_one_second() {
        let report = simulate(&ExploreConfig::default(), &args(&["KeyW"], 1.0)).unwrap();
        let end = report.view.camera().position;
        assert_eq!(report.view.frame_count(), 60);
        assert!((end.z + 36.67).abs() < 0.1, "z={}", end.z);
        assert!(report.last_frame.contains("Frame 60"));
    }

    #[test]
    fn simulate_coasts_to_rest() {
        let mut a = args(&["KeyD"], 0.5);
        a.coast = 2.0;
        let report = simulate(&ExploreConfig::default(), &a).unwrap();
        assert!(report.view.velocity().length() < 1e-3);
        assert!(report.view.camera().position.x > 0.0);
    }

    #[test]
    fn simulate_rejects_unbound_keys() {
        let err = simulate(&ExploreConfig::default(), &args(&["KeyW", "Space"], 1.0))
            .err()
            .unwrap();
        assert!(err.to_string().contains("Space"), "{err}");
    }

    #[test]
    fn movement_keys_resolve_through_bindings() {
        let bindings = KeyBindings::default();
        let keys = movement_keys(&bindings, &["ArrowUp".into(), "KeyD".into()]).unwrap();
        assert_eq!(keys, vec![MoveKey::Forward, MoveKey::Right]);
    }

    #[test]
    fn simulate_rejects_zero_fps() {
        let mut a = args(&["KeyW"], 1.0);
        a.fps = 0;
        assert!(simulate(&ExploreConfig::default(), &a).is_err());
    }

    #[test]
    fn simulate_with_look_turns_first() {
        let mut a = args(&["KeyW"], 0.5);
        // Quarter turn right at the default sensitivity.
        a.look = std::f32::consts::FRAC_PI_2 / 0.002;
        let report = simulate(&ExploreConfig::default(), &a).unwrap();
        let end = report.view.camera().position;
        assert!(end.x > 1.0);
        assert!(end.z.abs() < 0.01);
    }

    #[test]
    fn cli_parses_simulate() {
        let cli = Cli::parse_from([
            "skyisle-cli",
            "simulate",
            "--keys",
            "KeyW,KeyA",
            "--seconds",
            "2",
            "--look",
            "-50",
        ]);
        match cli.command {
            Commands::Simulate {
                keys, seconds, look, ..
            } => {
                assert_eq!(keys, vec!["KeyW".to_string(), "KeyA".to_string()]);
                assert_eq!(seconds, 2.0);
                assert_eq!(look, -50.0);
            }
            _ => panic!("expected simulate"),
        }
    }
}
