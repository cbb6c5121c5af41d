//! PickShot - screen region selection overlay
//!
//! Loads an image file as the frozen "screen", shows the selection overlay
//! over it and writes each committed region next to the other screenshots.
//! Pressing Enter on stdin arms another capture in the same overlay window;
//! typing `history` lists the screenshots kept so far.

mod backend;
mod logging;

use crate::backend::LocalBackend;
use anyhow::{bail, Context};
use image::RgbaImage;
use overlay::{ActivationListener, ActivationSender};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

const USAGE: &str = "usage: pickshot <image.png> [output-dir]";

struct Args {
    image: PathBuf,
    output_dir: PathBuf,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let Some(image) = args.next() else {
            bail!(USAGE);
        };
        let output_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
        if args.next().is_some() {
            bail!(USAGE);
        }

        Ok(Self {
            image: PathBuf::from(image),
            output_dir,
        })
    }
}

fn main() -> anyhow::Result<()> {
    logging::init(logging::debug_from_env());

    let args = Args::parse(std::env::args().skip(1))?;
    let image = image::open(&args.image)
        .with_context(|| format!("failed to open {}", args.image.display()))?
        .to_rgba8();

    let backend = Arc::new(LocalBackend::new(args.output_dir));
    info!(output_dir = %backend.output_dir().display(), "pickshot started");

    let (sender, listener) = overlay::subscribe();

    let provider_backend = backend.clone();
    let _provider = thread::spawn(move || {
        frame_provider(provider_backend, image, sender);
    });

    run_overlay(backend, listener)
}

/// Arm one capture now and one more per line read from stdin.
///
/// Dropping `sender` when stdin closes shuts the overlay down once the open
/// session resolves.
fn frame_provider(backend: Arc<LocalBackend>, image: RgbaImage, sender: ActivationSender) {
    if !arm(&backend, &image, &sender) {
        return;
    }

    for line in io::stdin().lock().lines() {
        let Ok(line) = line else {
            break;
        };
        if line.trim() == "history" {
            print_history(&backend);
            continue;
        }
        if !arm(&backend, &image, &sender) {
            return;
        }
    }

    info!("stdin closed, no further captures");
}

fn print_history(backend: &LocalBackend) {
    let history = backend.history();
    if history.is_empty() {
        println!("no screenshots yet");
    }
    for (i, path) in history.iter().enumerate() {
        println!("{:>2}. {}", i + 1, path.display());
    }
}

/// Returns false once the overlay has gone away
fn arm(backend: &LocalBackend, image: &RgbaImage, sender: &ActivationSender) -> bool {
    if backend.is_capturing() {
        info!("previous capture still open");
        return true;
    }

    let event = match backend.begin_capture(image.clone()) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "capture not started");
            return true;
        }
    };

    if sender.send(event).is_err() {
        warn!("overlay is no longer listening");
        return false;
    }

    info!("capture armed, press Enter to capture again");
    true
}

#[cfg(windows)]
fn run_overlay(backend: Arc<LocalBackend>, listener: ActivationListener) -> anyhow::Result<()> {
    use overlay::{OverlayConfig, OverlayWindow};
    use windows::Win32::UI::HiDpi::{
        SetProcessDpiAwarenessContext, DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
    };

    // Surface pixels must map 1:1 onto snapshot pixels
    unsafe {
        let _ = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2);
    }

    OverlayWindow::run(Box::new(backend), OverlayConfig::default(), listener)?;
    info!("overlay closed");
    Ok(())
}

#[cfg(not(windows))]
fn run_overlay(_backend: Arc<LocalBackend>, _listener: ActivationListener) -> anyhow::Result<()> {
    bail!("the overlay window host is only implemented for Windows")
}
