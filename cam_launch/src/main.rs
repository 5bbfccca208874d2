//! cam_launch — interactive entry point.

use std::path::PathBuf;
use std::time::Duration;

use cam_launch::app::{run, AppConfig};
use clap::Parser;
use gesture_map::GestureMap;

#[derive(Parser)]
#[command(
    name = "cam_launch",
    about = "Launch applications by holding up fingers at a webcam"
)]
struct Args {
    /// Gesture config file (JSON object of "0".."5" keys).
    #[arg(long, default_value = "gestures.json")]
    config: PathBuf,

    /// Seconds between launches (shared across all gestures).
    #[arg(long, default_value_t = 10.0)]
    cooldown: f64,

    /// Video device index (camera builds).
    #[arg(long, default_value_t = 0)]
    camera: i32,

    /// Print the resolved gesture table and exit.
    #[arg(long)]
    list: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Cam Launch — Finger Gesture Application Launcher      ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "camera")]
    println!("  Mode: webcam + hand-landmark sidecar");
    #[cfg(not(feature = "camera"))]
    println!("  Mode: keyboard simulation  (use --features camera for hardware)");
    println!();

    if args.list {
        let (map, source) = GestureMap::load_with_source(&args.config);
        println!("  Gesture table ({}):", source.label());
        for (count, command) in map.iter() {
            println!("    {} fingers  →  {}", count, command);
        }
        println!();
        return;
    }

    let cfg = AppConfig {
        config_path: args.config,
        cooldown: Duration::from_secs_f64(args.cooldown.max(0.0)),
        camera_device: args.camera,
    };

    println!("  Hold up 0-5 fingers to launch the mapped command.");
    println!("  Press ESC to exit.");
    println!();

    if let Err(e) = run(cfg) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
