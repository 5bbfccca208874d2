//! Resolve a gesture config file and print the resulting table.
//!
//! Handy for checking what `cam_launch` will actually do before pointing a
//! camera at yourself.

use std::path::PathBuf;

use clap::Parser;
use gesture_map::GestureMap;

#[derive(Parser)]
#[command(name = "gesture_map", about = "Print the resolved gesture table for a config file")]
struct Args {
    /// Path to the gesture config (JSON object of "0".."5" keys).
    #[arg(default_value = "gestures.json")]
    config: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let (map, source) = GestureMap::load_with_source(&args.config);

    println!();
    println!("  Gesture table ({}):", source.label());
    println!();
    for (count, command) in map.iter() {
        println!("    {} fingers  →  {}", count, command);
    }
    println!();
}
