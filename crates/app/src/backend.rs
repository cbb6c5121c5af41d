//! Local processing backend: one capture at a time, committed regions are
//! written as PNG files.

use anyhow::{anyhow, bail, Context};
use image::{ImageFormat, RgbaImage};
use overlay::Backend;
use parking_lot::Mutex;
use snapshot::{ActivationEvent, FrameBuffer, Rect};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Screenshots kept on disk; older ones are deleted
pub const HISTORY_LIMIT: usize = 20;

pub struct LocalBackend {
    output_dir: PathBuf,
    capturing: AtomicBool,
    snapshot: Mutex<Option<FrameBuffer>>,
    /// Saved screenshots, newest first
    history: Mutex<VecDeque<PathBuf>>,
}

impl LocalBackend {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            capturing: AtomicBool::new(false),
            snapshot: Mutex::new(None),
            history: Mutex::new(VecDeque::new()),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::Acquire)
    }

    /// Saved screenshots, newest first
    pub fn history(&self) -> Vec<PathBuf> {
        self.history.lock().iter().cloned().collect()
    }

    /// Take the capture lock and build the activation event for `image`.
    ///
    /// Fails while another capture is still unresolved.
    pub fn begin_capture(&self, image: RgbaImage) -> anyhow::Result<ActivationEvent> {
        if self
            .capturing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            bail!("a capture is already in progress");
        }

        match Self::prepare(image) {
            Ok((frame, event)) => {
                debug!(width = frame.width(), height = frame.height(), "capture armed");
                *self.snapshot.lock() = Some(frame);
                Ok(event)
            }
            Err(e) => {
                self.release();
                Err(e)
            }
        }
    }

    fn prepare(image: RgbaImage) -> anyhow::Result<(FrameBuffer, ActivationEvent)> {
        let frame = FrameBuffer::new(image)?;
        let event = ActivationEvent::from_image(frame.as_image())?;
        Ok((frame, event))
    }

    fn save_region(&self, rect: Rect) -> anyhow::Result<PathBuf> {
        let region = {
            let snapshot = self.snapshot.lock();
            let frame = snapshot
                .as_ref()
                .ok_or_else(|| anyhow!("no capture in progress"))?;
            frame
                .crop(&rect)
                .ok_or_else(|| anyhow!("selection {:?} lies outside the snapshot", rect))?
        };

        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("failed to create output directory {}", self.output_dir.display())
        })?;

        let path = self.next_path()?;
        region
            .save_with_format(&path, ImageFormat::Png)
            .with_context(|| format!("failed to write {}", path.display()))?;

        Ok(path)
    }

    /// `screenshot-<unix millis>.png`, suffixed when that name is taken
    fn next_path(&self) -> anyhow::Result<PathBuf> {
        let millis = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
        let mut path = self.output_dir.join(format!("screenshot-{}.png", millis));
        let mut n = 1;
        while path.exists() {
            path = self
                .output_dir
                .join(format!("screenshot-{}-{}.png", millis, n));
            n += 1;
        }
        Ok(path)
    }

    fn remember(&self, path: PathBuf) {
        let mut history = self.history.lock();
        history.push_front(path);

        while history.len() > HISTORY_LIMIT {
            if let Some(old) = history.pop_back() {
                if let Err(e) = fs::remove_file(&old) {
                    warn!(path = %old.display(), error = %e, "failed to prune old screenshot");
                }
            }
        }
    }

    fn release(&self) {
        self.snapshot.lock().take();
        self.capturing.store(false, Ordering::Release);
    }
}

impl Backend for LocalBackend {
    fn commit_selection(&self, rect: Rect) -> anyhow::Result<()> {
        let result = self.save_region(rect);
        self.release();

        let path = result?;
        info!(path = %path.display(), "screenshot saved");
        self.remember(path);
        Ok(())
    }

    fn cancel_selection(&self) -> anyhow::Result<()> {
        self.release();
        debug!("capture released");
        Ok(())
    }

    fn write_clipboard_text(&self, text: &str) -> anyhow::Result<()> {
        let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
        clipboard
            .set_text(text)
            .context("failed to write clipboard text")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::tempdir;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]))
    }

    #[test]
    fn second_capture_is_rejected_until_released() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::new(dir.path());

        backend.begin_capture(gradient(20, 20)).unwrap();
        assert!(backend.is_capturing());
        assert!(backend.begin_capture(gradient(20, 20)).is_err());

        backend.cancel_selection().unwrap();
        assert!(!backend.is_capturing());
        assert!(backend.begin_capture(gradient(20, 20)).is_ok());
    }

    #[test]
    fn commit_writes_cropped_png() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().join("shots"));

        let event = backend.begin_capture(gradient(64, 48)).unwrap();
        assert!(event.image_data_url.starts_with("data:image/png;base64,"));

        backend.commit_selection(Rect::new(10, 5, 20, 30)).unwrap();
        assert!(!backend.is_capturing());

        let path = backend.history().remove(0);
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("screenshot-") && name.ends_with(".png"));

        let saved = image::open(&path).unwrap().to_rgba8();
        assert_eq!(saved.dimensions(), (20, 30));
        assert_eq!(*saved.get_pixel(0, 0), Rgba([10, 5, 0, 255]));
    }

    #[test]
    fn failed_commit_still_releases_lock() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::new(dir.path());

        backend.begin_capture(gradient(16, 16)).unwrap();
        assert!(backend.commit_selection(Rect::new(100, 100, 20, 20)).is_err());
        assert!(!backend.is_capturing());
        assert!(backend.history().is_empty());
    }

    #[test]
    fn history_keeps_newest_screenshots_and_prunes_the_rest() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::new(dir.path());

        for _ in 0..HISTORY_LIMIT + 3 {
            backend.begin_capture(gradient(16, 16)).unwrap();
            backend.commit_selection(Rect::new(0, 0, 12, 12)).unwrap();
        }

        let history = backend.history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert!(history.iter().all(|path| path.exists()));

        let on_disk = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(on_disk, HISTORY_LIMIT);
    }

    #[test]
    fn commit_without_capture_fails() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::new(dir.path());

        assert!(backend.commit_selection(Rect::new(0, 0, 10, 10)).is_err());
    }

    #[test]
    fn empty_image_does_not_hold_lock() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::new(dir.path());

        assert!(backend.begin_capture(RgbaImage::new(0, 0)).is_err());
        assert!(!backend.is_capturing());
    }
}
