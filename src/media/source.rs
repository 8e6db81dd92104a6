use crate::error::{ResolutionError, StorageError};
use futures_lite::future::Boxed;
use log::{debug, warn};
use parking_lot::Mutex;
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

slotmap::new_key_type! { pub struct LocatorKey; }

/// Revocable reference a decoder can open directly. Only valid until the
/// handle that produced it is released.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    pub key: LocatorKey,
    pub uri: String,
}

/// A directory holding the files of one or more captures.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderRef {
    path: PathBuf,
}

impl FolderRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

/// The storage side of the source contract. Implemented once per platform
/// storage API; the rest of the crate only talks to this trait.
pub trait StorageBackend: Send + Sync {
    fn resolve(&self, path: PathBuf) -> Boxed<Result<Locator, ResolutionError>>;

    /// Must be a no-op for unknown or already released locators.
    fn release(&self, locator: &Locator);

    fn remove(&self, path: PathBuf) -> Boxed<Result<(), StorageError>>;

    fn enumerate(&self, folder: FolderRef) -> Boxed<Result<Vec<String>, StorageError>>;

    /// Recursively removes `folder`, addressed through its `parent`.
    fn remove_folder(&self, parent: FolderRef, folder: FolderRef) -> Boxed<Result<(), StorageError>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub locator: Locator,
    pub display_name: String,
    pub path: PathBuf,
}

/// Lazily resolvable reference to one camera file. Cloning shares the
/// resolution state, so every clone sees the same live locator.
#[derive(Clone)]
pub struct VideoSourceHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    path: PathBuf,
    backend: Arc<dyn StorageBackend>,
    live: Mutex<Option<Locator>>,
}

impl VideoSourceHandle {
    pub fn new(path: impl Into<PathBuf>, backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                path: path.into(),
                backend,
                live: Mutex::new(None),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn display_name(&self) -> String {
        self.inner
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.live.lock().is_some()
    }

    /// Maps the file to a locator. Resolving an already resolved handle
    /// hands back the live locator instead of allocating another one.
    pub async fn resolve(&self) -> Result<ResolvedSource, ResolutionError> {
        let cached = self.inner.live.lock().clone();
        if let Some(locator) = cached {
            return Ok(self.resolved(locator));
        }

        let locator = self.inner.backend.resolve(self.inner.path.clone()).await?;
        let mut live = self.inner.live.lock();
        match live.as_ref() {
            Some(existing) => {
                // another clone finished first; keep its generation
                self.inner.backend.release(&locator);
                Ok(self.resolved(existing.clone()))
            }
            None => {
                debug!("resolved \"{}\" as {}", self.inner.path.display(), locator.uri);
                *live = Some(locator.clone());
                Ok(self.resolved(locator))
            }
        }
    }

    /// Invalidates the live locator, if any. Safe to call any number of times.
    pub fn release(&self) {
        let taken = self.inner.live.lock().take();
        if let Some(locator) = taken {
            self.inner.backend.release(&locator);
        }
    }

    /// Deletes the file. Callers release the handle and detach decoders first.
    pub async fn remove(&self) -> Result<(), StorageError> {
        if self.is_resolved() {
            warn!(
                "removing \"{}\" while its locator is still live",
                self.inner.path.display()
            );
        }
        self.inner.backend.remove(self.inner.path.clone()).await
    }

    fn resolved(&self, locator: Locator) -> ResolvedSource {
        ResolvedSource {
            locator,
            display_name: self.display_name(),
            path: self.inner.path.clone(),
        }
    }
}

impl fmt::Debug for VideoSourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoSourceHandle")
            .field("path", &self.inner.path)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
