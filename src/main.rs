use anyhow::Result;
use clap::{Parser, ValueEnum};
use cpal::traits::{DeviceTrait, HostTrait};
use glance::config::CREDENTIAL_ENV_VAR;
use glance::Config;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CaptureMode {
    Camera,
    Screen,
}

#[derive(Debug, Parser)]
#[command(name = "glance", about = "Desktop overlay assistant session core")]
struct Cli {
    /// Configuration file (TOML), without extension
    #[arg(long, default_value = "config/glance")]
    config: String,

    /// Video source the shell will capture from
    #[arg(long, value_enum, default_value = "camera")]
    mode: CaptureMode,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Glance v0.1.0");
    info!("Model: {} (voice: {})", cfg.live.model, cfg.live.voice);

    match cli.mode {
        CaptureMode::Camera => info!(
            "Capture mode: camera ({} ms interval)",
            cfg.capture.camera_interval_ms
        ),
        CaptureMode::Screen => info!(
            "Capture mode: screen ({} ms interval)",
            cfg.capture.screen_interval_ms
        ),
    }

    info!(
        "Audio: {} Hz up / {} Hz down, {} sample frames per chunk",
        cfg.audio.send_sample_rate, cfg.audio.receive_sample_rate, cfg.audio.chunk_frames
    );

    if cfg.credential().is_some() {
        info!("API credential configured");
    } else {
        warn!(
            "No API credential found; set {} or live.api_key in the config file",
            CREDENTIAL_ENV_VAR
        );
    }

    // Probe the default audio devices a session would use
    let host = cpal::default_host();
    match host.default_input_device() {
        Some(device) => info!(
            "Input device: {}",
            device.name().unwrap_or_else(|_| "unknown".to_string())
        ),
        None => warn!("No default input device found"),
    }
    match host.default_output_device() {
        Some(device) => info!(
            "Output device: {}",
            device.name().unwrap_or_else(|_| "unknown".to_string())
        ),
        None => warn!("No default output device found"),
    }

    Ok(())
}
