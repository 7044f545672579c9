use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;

use mic_capture_core::{BackendKind, CaptureConfig, CaptureEngine, DeviceCatalog};
use mic_capture_cpal::{CpalCapture, CpalDeviceCatalog};

const METER_WIDTH: usize = 50;

/// Capture microphone audio and show a live level meter.
#[derive(Debug, Parser)]
#[command(name = "mic-capture-demo", version)]
struct Args {
    /// List input devices and exit.
    #[arg(long)]
    list: bool,

    /// Print the device list as JSON (with --list).
    #[arg(long)]
    json: bool,

    /// Input device index (see --list). Defaults to the system input.
    #[arg(long)]
    device: Option<usize>,

    /// Fall back to simulated silence if the microphone cannot be opened.
    #[arg(long)]
    mock: bool,

    /// How long to capture, in seconds.
    #[arg(long, default_value_t = 10)]
    seconds: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list {
        let devices = CpalDeviceCatalog.list_input_devices();
        if args.json {
            println!("{}", serde_json::to_string_pretty(&devices)?);
        } else if devices.is_empty() {
            println!("No input devices found");
        } else {
            println!("Available input devices:");
            for dev in &devices {
                println!(
                    "  [{}] {} ({} ch, {} Hz)",
                    dev.index, dev.name, dev.max_input_channels, dev.default_sample_rate
                );
            }
        }
        return Ok(());
    }

    let config = CaptureConfig::default()
        .with_device(args.device)
        .with_mock_fallback(args.mock);
    let mut engine = CaptureEngine::new(CpalCapture::new(), config);

    let bytes_received = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&bytes_received);
    engine.on_audio(move |pcm: &[u8]| {
        counter.fetch_add(pcm.len() as u64, Ordering::Relaxed);
    });
    engine.on_level(|level: f32| {
        print!("\rLevel: {} {:.2}", meter_bar(level), level);
        let _ = std::io::stdout().flush();
    });

    let backend = match engine.start() {
        Ok(backend) => backend,
        Err(e) => bail!("failed to start capture: {}", e),
    };
    println!("Capturing from {} backend for {}s...", backend, args.seconds);
    if backend == BackendKind::Real {
        if let Some(name) = engine.real_provider().device_name() {
            println!("Input device: {}", name);
        }
    }

    thread::sleep(Duration::from_secs(args.seconds));
    engine.stop();

    let diag = engine.diagnostics();
    println!(
        "\n\nReceived {} bytes in {} blocks ({} stream warnings)",
        bytes_received.load(Ordering::Relaxed),
        diag.blocks_dispatched,
        diag.stream_warnings
    );
    log::debug!("Final diagnostics: {:?}", diag);
    Ok(())
}

fn meter_bar(level: f32) -> String {
    let filled = ((level.clamp(0.0, 1.0) * METER_WIDTH as f32) as usize).min(METER_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(METER_WIDTH - filled))
}
