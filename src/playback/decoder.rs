use crate::media::{Camera, Locator};
use anyhow::Context;
use log::debug;
use std::{path::PathBuf, time::Instant};

/// One attachment point the engine can drive. Implementations wrap a real
/// video element or pipeline; the engine never assumes more than this.
pub trait Decoder {
    fn attach(&mut self, locator: &Locator) -> anyhow::Result<()>;
    fn detach(&mut self);
    fn play(&mut self);
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    fn position(&self) -> f64;
    fn set_position(&mut self, seconds: f64);
    fn set_rate(&mut self, rate: f64);
    fn set_muted(&mut self, muted: bool);
    /// Known once the attached media reported its metadata.
    fn duration(&self) -> Option<f64>;
}

/// Builds a fresh decoder whenever the engine (re)builds its attachment set.
pub trait DecoderFactory {
    fn create(&mut self, camera: Camera) -> Box<dyn Decoder>;
}

impl<F> DecoderFactory for F
where
    F: FnMut(Camera) -> Box<dyn Decoder>,
{
    fn create(&mut self, camera: Camera) -> Box<dyn Decoder> {
        self(camera)
    }
}

/// Decoder without any picture output: keeps a wall-clock playhead so the
/// transport can run in a terminal.
pub struct HeadlessDecoder {
    camera: Camera,
    fallback_duration: f64,
    source: Option<PathBuf>,
    duration: Option<f64>,
    base: f64,
    started: Option<Instant>,
    rate: f64,
}

impl HeadlessDecoder {
    pub fn new(camera: Camera, fallback_duration: f64) -> Self {
        Self {
            camera,
            fallback_duration,
            source: None,
            duration: None,
            base: 0.0,
            started: None,
            rate: 1.0,
        }
    }

    fn limit(&self, seconds: f64) -> f64 {
        let upper = self.duration.unwrap_or(f64::MAX);
        seconds.clamp(0.0, upper)
    }

    #[cfg(feature = "ffmpeg")]
    fn probe(&self, path: &std::path::Path) -> f64 {
        match super::probe::probe_duration(path) {
            Ok(duration) => duration,
            Err(err) => {
                log::warn!("{} probe failed, assuming fallback length: {err:#}", self.camera);
                self.fallback_duration
            }
        }
    }

    #[cfg(not(feature = "ffmpeg"))]
    fn probe(&self, _path: &std::path::Path) -> f64 {
        self.fallback_duration
    }
}

impl Decoder for HeadlessDecoder {
    fn attach(&mut self, locator: &Locator) -> anyhow::Result<()> {
        let path = locator
            .uri
            .strip_prefix("file://")
            .map(PathBuf::from)
            .with_context(|| format!("unsupported locator {}", locator.uri))?;
        anyhow::ensure!(path.is_file(), "\"{}\" is not readable", path.display());

        self.duration = Some(self.probe(&path));
        debug!("{} decoder attached \"{}\"", self.camera, path.display());
        self.source = Some(path);
        self.base = 0.0;
        self.started = None;
        Ok(())
    }

    fn detach(&mut self) {
        self.source = None;
        self.duration = None;
        self.started = None;
        self.base = 0.0;
    }

    fn play(&mut self) {
        if self.source.is_some() && self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        self.base = self.position();
        self.started = None;
    }

    fn is_paused(&self) -> bool {
        self.started.is_none()
    }

    fn position(&self) -> f64 {
        let elapsed = self
            .started
            .map(|started| started.elapsed().as_secs_f64() * self.rate)
            .unwrap_or_default();
        self.limit(self.base + elapsed)
    }

    fn set_position(&mut self, seconds: f64) {
        self.base = self.limit(seconds);
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }

    fn set_rate(&mut self, rate: f64) {
        self.base = self.position();
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
        self.rate = rate;
    }

    // no audio output
    fn set_muted(&mut self, _muted: bool) {}

    fn duration(&self) -> Option<f64> {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::LocatorKey;

    fn locator_for(path: &std::path::Path) -> Locator {
        Locator {
            key: LocatorKey::default(),
            uri: format!("file://{}", path.display()),
        }
    }

    #[test]
    fn headless_playhead_is_clamped_to_the_clip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("front.mp4");
        std::fs::write(&file, b"mp4").unwrap();

        let mut decoder = HeadlessDecoder::new(Camera::Front, 60.0);
        decoder.attach(&locator_for(&file)).unwrap();
        assert_eq!(decoder.duration(), Some(60.0));

        decoder.set_position(90.0);
        assert_eq!(decoder.position(), 60.0);
        decoder.set_position(-1.0);
        assert_eq!(decoder.position(), 0.0);

        decoder.play();
        assert!(!decoder.is_paused());
        decoder.pause();
        assert!(decoder.is_paused());
    }

    #[test]
    fn headless_attach_rejects_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut decoder = HeadlessDecoder::new(Camera::Back, 60.0);
        assert!(decoder.attach(&locator_for(&dir.path().join("gone.mp4"))).is_err());
        assert!(decoder.duration().is_none());
    }
}
