use super::{Decoder, DecoderFactory, PlaybackRate};
use crate::{
    config::PlayerConfig,
    error::MediaError,
    media::{Camera, CameraSet, Locator, ResolvedVideoEntry},
};
use log::{debug, info, warn};
use std::time::{Duration, Instant};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Layout {
    Single { active: Camera },
    Grid,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Ready,
    Playing,
    Ended,
}

struct Attachment {
    camera: Camera,
    decoder: Box<dyn Decoder>,
    fault: Option<MediaError>,
}

struct Loaded {
    time: i64,
    locators: CameraSet<Locator>,
}

/// Drives one (single layout) or four (grid layout) decoders as a single
/// transport. The engine is the only component allowed to touch decoder
/// position or source.
///
/// Playback in grid layout is front-authoritative: followers snap to the
/// front decoder on resync, never the other way around.
pub struct SyncPlaybackEngine {
    config: PlayerConfig,
    factory: Box<dyn DecoderFactory>,
    layout: Layout,
    last_single: Camera,
    loaded: Option<Loaded>,
    attached: Vec<Attachment>,
    playing: bool,
    position: f64,
    duration: Option<f64>,
    rate: PlaybackRate,
    fresh_source: bool,
    resume_at: Option<Instant>,
    next_resync: Option<Instant>,
    faults: Vec<MediaError>,
}

impl SyncPlaybackEngine {
    pub fn new(config: PlayerConfig, factory: impl DecoderFactory + 'static) -> Self {
        Self {
            config,
            factory: Box::new(factory),
            layout: Layout::Single {
                active: Camera::Front,
            },
            last_single: Camera::Front,
            loaded: None,
            attached: vec![],
            playing: false,
            position: 0.0,
            duration: None,
            rate: PlaybackRate::default(),
            fresh_source: false,
            resume_at: None,
            next_resync: None,
            faults: vec![],
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn active_camera(&self) -> Option<Camera> {
        match self.layout {
            Layout::Single { active } => Some(active),
            Layout::Grid => None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn rate(&self) -> PlaybackRate {
        self.rate
    }

    pub fn loaded_time(&self) -> Option<i64> {
        self.loaded.as_ref().map(|loaded| loaded.time)
    }

    pub fn state(&self) -> PlaybackState {
        if self.loaded.is_none() {
            PlaybackState::Idle
        } else if self.playing {
            PlaybackState::Playing
        } else if self.at_end() {
            PlaybackState::Ended
        } else {
            PlaybackState::Ready
        }
    }

    /// Cameras whose decoder refused its locator since the last load.
    pub fn unplayable(&self) -> impl Iterator<Item = Camera> {
        self.attached
            .iter()
            .filter(|attachment| attachment.fault.is_some())
            .map(|attachment| attachment.camera)
    }

    pub fn take_faults(&mut self) -> Vec<MediaError> {
        std::mem::take(&mut self.faults)
    }

    pub fn load(&mut self, entry: &ResolvedVideoEntry) {
        self.teardown();
        self.loaded = Some(Loaded {
            time: entry.time(),
            locators: entry.locators(),
        });
        self.playing = false;
        self.position = 0.0;
        self.duration = None;
        self.build();
        info!("loaded entry {} in {:?} layout", entry.time(), self.layout);
    }

    /// Detaches every decoder so the entry's locators can be released.
    pub fn unload(&mut self) {
        if self.loaded.take().is_some() {
            debug!("unloading decoders");
        }
        self.teardown();
        self.playing = false;
        self.position = 0.0;
        self.duration = None;
    }

    pub fn play(&mut self) {
        if self.loaded.is_none() {
            return;
        }
        if self.at_end() {
            self.seek(0.0);
        }

        self.playing = true;
        if self.fresh_source {
            self.fresh_source = false;
            self.schedule_resume(self.config.grace_interval());
        } else if self.resume_at.is_none() {
            self.for_each_attached(|decoder| decoder.play());
        }
        debug!("play at {:.2}s", self.position);
    }

    pub fn pause(&mut self) {
        if self.loaded.is_none() {
            return;
        }
        self.resume_at = None;
        self.for_each_attached(|decoder| decoder.pause());
        self.sample_position();
        self.playing = false;
        debug!("pause at {:.2}s", self.position);
    }

    pub fn toggle_play_pause(&mut self) {
        if self.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Moves every attached decoder to `seconds`, clamped to the clip. An
    /// unknown duration clamps to zero.
    pub fn seek(&mut self, seconds: f64) {
        if self.loaded.is_none() || !seconds.is_finite() {
            return;
        }
        let duration = self.duration.unwrap_or_default();
        let target = seconds.clamp(0.0, duration);
        let was_playing = self.playing;

        self.resume_at = None;
        self.for_each_attached(|decoder| {
            decoder.pause();
            decoder.set_position(target);
        });
        self.position = target;

        if target >= duration {
            self.playing = false;
        } else if was_playing {
            self.schedule_resume(self.config.grace_interval());
        }
        debug!("seek to {target:.2}s");
    }

    /// Relative seek that refuses to move forward once the end is reached.
    pub fn seek_relative(&mut self, delta: f64) {
        if self.loaded.is_none() || !delta.is_finite() {
            return;
        }
        self.sample_position();
        let duration = self.duration.unwrap_or_default();
        if delta > 0.0 && self.position >= duration {
            return;
        }

        let target = (self.position + delta).clamp(0.0, duration);
        if target >= duration {
            self.resume_at = None;
            self.for_each_attached(|decoder| {
                decoder.pause();
                decoder.set_position(duration);
            });
            self.position = duration;
            self.playing = false;
        } else {
            self.seek(target);
        }
    }

    /// Swaps the single decoder's source, keeping position and play state.
    pub fn select_camera(&mut self, camera: Camera) {
        let Layout::Single { active } = self.layout else {
            return;
        };
        if active == camera {
            return;
        }
        self.layout = Layout::Single { active: camera };
        self.last_single = camera;

        let Some(loaded) = &self.loaded else {
            return;
        };
        let Some(attachment) = self.attached.first_mut() else {
            return;
        };

        let position = attachment.decoder.position();
        let was_playing = self.playing;
        attachment.decoder.pause();
        attachment.decoder.detach();
        attachment.camera = camera;
        attachment.fault = match attachment.decoder.attach(&loaded.locators[camera]) {
            Ok(()) => {
                attachment.decoder.set_position(position);
                attachment.decoder.set_rate(self.rate.factor());
                None
            }
            Err(err) => {
                let fault = MediaError::new(camera, format!("{err:#}"));
                warn!("{fault}");
                self.faults.push(fault.clone());
                Some(fault)
            }
        };
        if attachment.fault.is_none() {
            // the new clip reports its own length on the next metadata
            self.duration = None;
        }
        self.position = position;
        info!("switched to {camera} camera at {position:.2}s");

        self.resume_at = None;
        if was_playing {
            self.schedule_resume(self.config.grace_interval());
        } else {
            self.fresh_source = true;
        }
    }

    pub fn set_rate(&mut self, rate: PlaybackRate) {
        self.rate = rate;
        self.for_each_attached(|decoder| decoder.set_rate(rate.factor()));
        debug!("rate set to {rate}");
    }

    /// Rebuilds the decoder set for `layout` and brings every new decoder
    /// to the position, play state and rate captured from the old set.
    pub fn switch_layout(&mut self, layout: Layout) {
        if layout == self.layout {
            return;
        }
        if let Layout::Single { active } = layout {
            self.last_single = active;
        }
        if self.loaded.is_none() {
            self.layout = layout;
            return;
        }

        self.sample_position();
        let (position, playing) = (self.position, self.playing);
        self.teardown();
        self.layout = layout;
        self.build();

        let rate = self.rate.factor();
        self.for_each_attached(|decoder| {
            decoder.pause();
            decoder.set_position(position);
            decoder.set_rate(rate);
        });
        self.position = position;
        self.playing = playing;
        if playing {
            self.fresh_source = false;
            self.schedule_resume(self.config.settle_delay());
        }
        info!("switched to {layout:?} layout at {position:.2}s");
    }

    pub fn toggle_layout(&mut self) {
        let next = match self.layout {
            Layout::Grid => Layout::Single {
                active: self.last_single,
            },
            Layout::Single { .. } => Layout::Grid,
        };
        self.switch_layout(next);
    }

    pub fn resync(&mut self) {
        if self.layout != Layout::Grid || self.loaded.is_none() {
            return;
        }
        let Some(leader) = self.authority_index() else {
            return;
        };
        let (position, paused) = {
            let decoder = &self.attached[leader].decoder;
            (decoder.position(), decoder.is_paused())
        };
        let tolerance = self.config.drift_tolerance_secs;

        for (index, follower) in self.attached.iter_mut().enumerate() {
            if index == leader || follower.fault.is_some() {
                continue;
            }
            let drift = (follower.decoder.position() - position).abs();
            if drift > tolerance {
                debug!("{} drifted {drift:.3}s, snapping to {position:.2}s", follower.camera);
                follower.decoder.set_position(position);
            }
            match (paused, follower.decoder.is_paused()) {
                (true, false) => follower.decoder.pause(),
                (false, true) => follower.decoder.play(),
                _ => {}
            }
        }
    }

    /// Metadata callback. Only the authoritative decoder defines duration.
    pub fn on_metadata(&mut self, camera: Camera, duration: f64) {
        if self.duration.is_some() || !duration.is_finite() || duration < 0.0 {
            return;
        }
        let is_authority = self
            .authority_index()
            .is_some_and(|index| self.attached[index].camera == camera);
        if !is_authority {
            return;
        }

        self.duration = Some(duration);
        self.position = self.position.min(duration);
        let rate = self.rate.factor();
        self.for_each_attached(|decoder| decoder.set_rate(rate));
        debug!("duration {duration:.2}s from {camera} camera");
    }

    /// Decoder-level failure reported after attach. The slot becomes
    /// unplayable; the others keep going.
    pub fn on_decoder_error(&mut self, camera: Camera, reason: impl Into<String>) -> MediaError {
        let fault = MediaError::new(camera, reason);
        warn!("{fault}");
        if let Some(attachment) = self
            .attached
            .iter_mut()
            .find(|attachment| attachment.camera == camera)
        {
            attachment.decoder.pause();
            attachment.fault = Some(fault.clone());
        }
        self.faults.push(fault.clone());
        fault
    }

    /// Advances deferred work: pending resumes, metadata, end of media and
    /// periodic grid resync.
    pub fn tick(&mut self, now: Instant) {
        if self.loaded.is_none() {
            return;
        }

        if self.duration.is_none() {
            let reported = self.authority_index().and_then(|index| {
                let attachment = &self.attached[index];
                attachment
                    .decoder
                    .duration()
                    .map(|duration| (attachment.camera, duration))
            });
            if let Some((camera, duration)) = reported {
                self.on_metadata(camera, duration);
            }
        }

        if self.resume_at.is_some_and(|due| now >= due) {
            self.resume_at = None;
            if self.playing {
                self.for_each_attached(|decoder| decoder.play());
            }
        }

        if self.playing && self.resume_at.is_none() {
            self.sample_position();
            if self.at_end() {
                self.for_each_attached(|decoder| decoder.pause());
                self.position = self.duration.unwrap_or_default();
                self.playing = false;
                info!("reached end of entry");
            }
        }

        if self.layout == Layout::Grid && self.next_resync.is_none_or(|due| now >= due) {
            self.resync();
            self.next_resync = Some(now + self.config.resync_interval());
        }
    }

    fn at_end(&self) -> bool {
        self.duration
            .is_some_and(|duration| self.position >= duration)
    }

    fn schedule_resume(&mut self, delay: Duration) {
        self.resume_at = Some(Instant::now() + delay);
    }

    /// Front in grid layout (or the first playable follower if the front
    /// slot failed), the single decoder otherwise.
    fn authority_index(&self) -> Option<usize> {
        self.attached
            .iter()
            .position(|attachment| attachment.fault.is_none())
    }

    fn sample_position(&mut self) {
        let Some(index) = self.authority_index() else {
            return;
        };
        let sampled = self.attached[index].decoder.position().max(0.0);
        self.position = match self.duration {
            Some(duration) => sampled.min(duration),
            None => sampled,
        };
    }

    fn for_each_attached(&mut self, mut f: impl FnMut(&mut dyn Decoder)) {
        for attachment in self
            .attached
            .iter_mut()
            .filter(|attachment| attachment.fault.is_none())
        {
            f(attachment.decoder.as_mut());
        }
    }

    fn teardown(&mut self) {
        for mut attachment in self.attached.drain(..) {
            attachment.decoder.pause();
            attachment.decoder.detach();
        }
        self.resume_at = None;
        self.next_resync = None;
        self.fresh_source = false;
    }

    fn build(&mut self) {
        let Some(loaded) = &self.loaded else {
            return;
        };
        let cameras = match self.layout {
            Layout::Single { active } => vec![active],
            Layout::Grid => Camera::ALL.to_vec(),
        };

        for camera in cameras {
            let mut decoder = self.factory.create(camera);
            decoder.set_muted(true);
            let fault = match decoder.attach(&loaded.locators[camera]) {
                Ok(()) => {
                    decoder.set_rate(self.rate.factor());
                    None
                }
                Err(err) => {
                    let fault = MediaError::new(camera, format!("{err:#}"));
                    warn!("{fault}");
                    self.faults.push(fault.clone());
                    Some(fault)
                }
            };
            self.attached.push(Attachment {
                camera,
                decoder,
                fault,
            });
        }
        self.fresh_source = true;
    }
}
