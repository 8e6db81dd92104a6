#![allow(dead_code)]

use camwall::{
    config::PlayerConfig,
    error::{ResolutionError, StorageError},
    interaction::{Notice, Prompt, UserInteraction},
    media::{
        Camera, CameraSet, Classification, FolderRef, Locator, LocatorKey, StorageBackend,
        VideoEntry, VideoSourceHandle,
    },
    playback::{Decoder, SyncPlaybackEngine},
    session::Session,
};
use futures_lite::{
    FutureExt,
    future::{self, Boxed},
};
use parking_lot::Mutex;
use slotmap::SlotMap;
use std::{
    cell::RefCell,
    collections::{BTreeSet, HashSet, VecDeque},
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

pub const ROOT: &str = "/cam";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Resolve(PathBuf),
    Release(PathBuf),
    Remove(PathBuf),
    RemoveFolder(PathBuf),
    Attach(Camera, String),
    Detach(Camera),
}

pub type Log = Arc<Mutex<Vec<Event>>>;

/// In-memory storage that records every call into a shared log.
#[derive(Default)]
pub struct RecordingBackend {
    pub log: Log,
    files: Mutex<BTreeSet<PathBuf>>,
    live: Mutex<SlotMap<LocatorKey, PathBuf>>,
    failing: Mutex<HashSet<PathBuf>>,
}

impl RecordingBackend {
    pub fn add_file(&self, path: impl Into<PathBuf>) {
        self.files.lock().insert(path.into());
    }

    pub fn forget_file(&self, path: &Path) {
        self.files.lock().remove(path);
    }

    pub fn has_file(&self, path: &Path) -> bool {
        self.files.lock().contains(path)
    }

    pub fn fail_removal_of(&self, path: impl Into<PathBuf>) {
        self.failing.lock().insert(path.into());
    }

    pub fn live(&self) -> usize {
        self.live.lock().len()
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.lock().clone()
    }

    pub fn clear_events(&self) {
        self.log.lock().clear();
    }
}

impl StorageBackend for RecordingBackend {
    fn resolve(&self, path: PathBuf) -> Boxed<Result<Locator, ResolutionError>> {
        self.log.lock().push(Event::Resolve(path.clone()));
        let result = if self.files.lock().contains(&path) {
            let uri = format!("mem://{}", path.display());
            let key = self.live.lock().insert(path);
            Ok(Locator { key, uri })
        } else {
            Err(ResolutionError::new(path, "no such file"))
        };
        future::ready(result).boxed()
    }

    fn release(&self, locator: &Locator) {
        if let Some(path) = self.live.lock().remove(locator.key) {
            self.log.lock().push(Event::Release(path));
        }
    }

    fn remove(&self, path: PathBuf) -> Boxed<Result<(), StorageError>> {
        let result = if self.failing.lock().contains(&path) {
            Err(StorageError::new(
                path,
                io::Error::new(io::ErrorKind::PermissionDenied, "read-only volume"),
            ))
        } else {
            self.files.lock().remove(&path);
            self.log.lock().push(Event::Remove(path));
            Ok(())
        };
        future::ready(result).boxed()
    }

    fn enumerate(&self, folder: FolderRef) -> Boxed<Result<Vec<String>, StorageError>> {
        let names = self
            .files
            .lock()
            .iter()
            .filter(|path| path.parent() == Some(folder.path()))
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        future::ready(Ok(names)).boxed()
    }

    fn remove_folder(
        &self,
        parent: FolderRef,
        folder: FolderRef,
    ) -> Boxed<Result<(), StorageError>> {
        let target = parent.path().join(folder.name());
        self.files.lock().retain(|path| !path.starts_with(&target));
        self.log.lock().push(Event::RemoveFolder(target));
        future::ready(Ok(())).boxed()
    }
}

/// Decoder that logs attach/detach into the backend's log and otherwise
/// keeps a trivial playhead.
pub struct StubDecoder {
    camera: Camera,
    log: Log,
    attached: bool,
    playing: bool,
    position: f64,
}

impl StubDecoder {
    pub const DURATION: f64 = 60.0;
}

impl Decoder for StubDecoder {
    fn attach(&mut self, locator: &Locator) -> anyhow::Result<()> {
        self.log
            .lock()
            .push(Event::Attach(self.camera, locator.uri.clone()));
        self.attached = true;
        self.position = 0.0;
        Ok(())
    }

    fn detach(&mut self) {
        if self.attached {
            self.log.lock().push(Event::Detach(self.camera));
            self.attached = false;
        }
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn is_paused(&self) -> bool {
        !self.playing
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn set_position(&mut self, seconds: f64) {
        self.position = seconds;
    }

    fn set_rate(&mut self, _rate: f64) {}

    fn set_muted(&mut self, _muted: bool) {}

    fn duration(&self) -> Option<f64> {
        self.attached.then_some(Self::DURATION)
    }
}

/// Answers confirmations from a script, declining once it runs out.
#[derive(Default)]
pub struct ScriptedUi {
    answers: RefCell<VecDeque<bool>>,
    pub prompts: RefCell<Vec<Prompt>>,
    pub notices: RefCell<Vec<Notice>>,
}

impl ScriptedUi {
    pub fn answering(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: RefCell::new(answers.into_iter().collect()),
            ..Self::default()
        }
    }
}

impl UserInteraction for ScriptedUi {
    fn confirm(&self, prompt: &Prompt) -> bool {
        self.prompts.borrow_mut().push(prompt.clone());
        self.answers.borrow_mut().pop_front().unwrap_or(false)
    }

    fn notify(&self, notice: &Notice) {
        self.notices.borrow_mut().push(notice.clone());
    }
}

pub fn session(backend: &Arc<RecordingBackend>) -> Session {
    let log = backend.log.clone();
    let engine = SyncPlaybackEngine::new(
        PlayerConfig::default(),
        move |camera: Camera| -> Box<dyn Decoder> {
            Box::new(StubDecoder {
                camera,
                log: log.clone(),
                attached: false,
                playing: false,
                position: 0.0,
            })
        },
    );
    Session::new(engine)
}

pub fn folder_path(folder: &str) -> PathBuf {
    Path::new(ROOT).join(folder)
}

pub fn clip_path(folder: &str, time: i64, camera: Camera) -> PathBuf {
    folder_path(folder).join(format!("{time}-{camera}.mp4"))
}

/// Registers four camera files under `/cam/<folder>` and returns the entry.
pub fn capture(
    backend: &Arc<RecordingBackend>,
    time: i64,
    classification: Classification,
    folder: &str,
) -> VideoEntry {
    let storage: Arc<dyn StorageBackend> = backend.clone();
    VideoEntry {
        time,
        classification,
        title: format!("capture {time}"),
        event: classification == Classification::Event,
        sources: CameraSet::from_fn(|camera| {
            let path = clip_path(folder, time, camera);
            backend.add_file(path.clone());
            VideoSourceHandle::new(path, storage.clone())
        }),
        folder: Some(FolderRef::new(folder_path(folder))),
        parent_folder: Some(FolderRef::new(ROOT)),
    }
}

pub fn visible_times(session: &Session) -> Vec<i64> {
    session
        .catalog
        .visible_list()
        .map(|entry| entry.time)
        .collect()
}

pub fn index_of(events: &[Event], wanted: &Event) -> usize {
    events
        .iter()
        .position(|event| event == wanted)
        .unwrap_or_else(|| panic!("{wanted:?} not in {events:?}"))
}
