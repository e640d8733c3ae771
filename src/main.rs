//! Validate and replay sensor scripts.
//!
//! Usage:
//!   sensor-script --script sensors.txt [--play] [--json]
//!
//! The script path falls back to `$UBUNTU_PLATFORM_API_SENSOR_TEST`.

use clap::Parser;
use log::{error, info};
use sensor_test_backend::config::load_dotenv;
use sensor_test_backend::sensors::{Accelerometer, Light, Proximity};
use sensor_test_backend::simulation::load_script;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "sensor-script", version, about = "Validate and replay sensor test scripts")]
struct Args {
    /// Sensor script to load.
    #[arg(short, long, env = "UBUNTU_PLATFORM_API_SENSOR_TEST")]
    script: PathBuf,

    /// Replay the script's events, logging each reading.
    #[arg(long)]
    play: bool,

    /// Print the final sensor state as JSON.
    #[arg(long)]
    json: bool,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn watch(registry: &sensor_test_backend::SensorRegistry) {
    if let Some(accel) = Accelerometer::new(registry) {
        accel.enable();
        accel.set_reading_cb(|event| {
            let (x, y, z) = event.acceleration();
            info!("accel: x={} y={} z={} @ {}", x, y, z, event.timestamp());
        });
    }
    if let Some(proximity) = Proximity::new(registry) {
        proximity.enable();
        proximity.set_reading_cb(|event| {
            info!("proximity: {} @ {}", event.distance(), event.timestamp());
        });
    }
    if let Some(light) = Light::new(registry) {
        light.enable();
        light.set_reading_cb(|event| {
            info!("light: {} lx @ {}", event.light(), event.timestamp());
        });
    }
}

#[tokio::main]
async fn main() {
    load_dotenv();
    let args = Args::parse();
    init_logger();

    let (registry, player) = match load_script(&args.script) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("{}: {}", args.script.display(), e);
            std::process::exit(1);
        }
    };

    for record in registry.sensors() {
        info!(
            "  {}: min {} max {} resolution {}",
            record.sensor_type(),
            record.min_value(),
            record.max_value(),
            record.resolution()
        );
    }
    info!("  {} event(s)", player.len());

    let registry = Arc::new(registry);
    if args.play {
        watch(&registry);
        if let Err(e) = player.spawn(registry.clone()).await {
            error!("Playback task failed: {}", e);
            std::process::exit(1);
        }
    }

    if args.json {
        match serde_json::to_string_pretty(&registry.snapshot()) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize sensor state: {}", e);
                std::process::exit(1);
            }
        }
    }
}
