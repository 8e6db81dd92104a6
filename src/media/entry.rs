use super::{Camera, CameraSet, FolderRef, Locator, ResolvedSource, VideoSourceHandle};
use crate::error::ResolutionError;
use derive_more::Display;
use log::info;

/// Which recorder mode produced a capture. `All` only ever appears as a
/// filter value.
#[derive(Debug, Display, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Classification {
    #[default]
    #[display("all")]
    All,
    #[display("event")]
    Event,
    #[display("sentry")]
    Sentry,
    #[display("dashcam")]
    Dashcam,
}

impl Classification {
    pub const FILTERS: [Classification; 4] = [
        Classification::All,
        Classification::Event,
        Classification::Sentry,
        Classification::Dashcam,
    ];

    pub fn admits(self, other: Classification) -> bool {
        self == Classification::All || self == other
    }

    /// Maps the recorder's top-level clip directory names.
    pub fn from_clip_dir(name: &str) -> Option<Self> {
        match name {
            "SavedClips" => Some(Classification::Event),
            "SentryClips" => Some(Classification::Sentry),
            "RecentClips" => Some(Classification::Dashcam),
            _ => None,
        }
    }
}

/// One capture event: four camera files recorded at the same moment.
/// `time` (ms since the epoch) is the identity key inside a catalog.
#[derive(Debug, Clone)]
pub struct VideoEntry {
    pub time: i64,
    pub classification: Classification,
    pub title: String,
    pub event: bool,
    pub sources: CameraSet<VideoSourceHandle>,
    pub folder: Option<FolderRef>,
    pub parent_folder: Option<FolderRef>,
}

impl VideoEntry {
    pub fn in_folder(&self, folder: &FolderRef) -> bool {
        self.folder.as_ref() == Some(folder)
    }

    pub fn release_all(&self) {
        for (_, handle) in self.sources.iter() {
            handle.release();
        }
    }
}

/// Releases whatever was acquired so far unless disarmed.
struct Acquisition<'a> {
    held: Vec<&'a VideoSourceHandle>,
    armed: bool,
}

impl Drop for Acquisition<'_> {
    fn drop(&mut self) {
        if self.armed {
            for handle in self.held.drain(..) {
                handle.release();
            }
        }
    }
}

/// The single live, playable form of an entry. Owns the four locators and
/// gives them back when released or dropped.
#[derive(Debug)]
pub struct ResolvedVideoEntry {
    entry: VideoEntry,
    sources: CameraSet<ResolvedSource>,
}

impl ResolvedVideoEntry {
    /// Resolves all four handles or none: a failure releases the handles
    /// already resolved before the error is returned.
    pub async fn resolve(entry: VideoEntry) -> Result<Self, ResolutionError> {
        let mut resolved: CameraSet<Option<ResolvedSource>> = CameraSet::default();
        {
            let mut acquisition = Acquisition {
                held: Vec::with_capacity(Camera::ALL.len()),
                armed: true,
            };
            for camera in Camera::ALL {
                let handle = &entry.sources[camera];
                resolved[camera] = Some(handle.resolve().await?);
                acquisition.held.push(handle);
            }
            acquisition.armed = false;
        }

        let sources = resolved
            .transpose()
            .ok_or_else(|| ResolutionError::new(entry.sources.front.path(), "incomplete"))?;
        info!("resolved entry {} ({})", entry.time, entry.title);
        Ok(Self { entry, sources })
    }

    pub fn entry(&self) -> &VideoEntry {
        &self.entry
    }

    pub fn time(&self) -> i64 {
        self.entry.time
    }

    pub fn source(&self, camera: Camera) -> &ResolvedSource {
        &self.sources[camera]
    }

    pub fn locators(&self) -> CameraSet<Locator> {
        self.sources.each_ref().map(|_, source| source.locator.clone())
    }

    pub fn folder_display(&self) -> String {
        self.sources
            .front
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(|parent| parent.display().to_string())
            .unwrap_or_else(|| String::from("."))
    }

    pub fn file_names(&self) -> CameraSet<&str> {
        self.sources
            .each_ref()
            .map(|_, source| source.display_name.as_str())
    }

    /// Gives all four locators back. Dropping has the same effect.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for ResolvedVideoEntry {
    fn drop(&mut self) {
        self.entry.release_all();
    }
}
