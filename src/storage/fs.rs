use crate::{
    error::{ResolutionError, StorageError},
    media::{FolderRef, Locator, LocatorKey, StorageBackend},
};
use futures_lite::{FutureExt, future::Boxed};
use log::{debug, info};
use parking_lot::Mutex;
use slotmap::SlotMap;
use std::{path::PathBuf, sync::Arc};

/// Native filesystem storage. Locators are `file://` URIs backed by a slot in
/// a table of live locators, so a double release is a harmless miss and
/// leaks stay countable.
#[derive(Default)]
pub struct FsBackend {
    live: Arc<Mutex<SlotMap<LocatorKey, PathBuf>>>,
}

impl FsBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_locators(&self) -> usize {
        self.live.lock().len()
    }
}

impl StorageBackend for FsBackend {
    fn resolve(&self, path: PathBuf) -> Boxed<Result<Locator, ResolutionError>> {
        let live = self.live.clone();
        async move {
            let metadata = tokio::fs::metadata(&path)
                .await
                .map_err(|err| ResolutionError::new(&path, err.to_string()))?;
            if !metadata.is_file() {
                return Err(ResolutionError::new(&path, "not a regular file"));
            }

            let uri = format!("file://{}", path.display());
            let key = live.lock().insert(path);
            Ok(Locator { key, uri })
        }
        .boxed()
    }

    fn release(&self, locator: &Locator) {
        if self.live.lock().remove(locator.key).is_some() {
            debug!("released {}", locator.uri);
        }
    }

    fn remove(&self, path: PathBuf) -> Boxed<Result<(), StorageError>> {
        async move {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|err| StorageError::new(&path, err))?;
            info!("removed \"{}\"", path.display());
            Ok(())
        }
        .boxed()
    }

    fn enumerate(&self, folder: FolderRef) -> Boxed<Result<Vec<String>, StorageError>> {
        async move {
            let path = folder.path();
            let mut dir = tokio::fs::read_dir(path)
                .await
                .map_err(|err| StorageError::new(path, err))?;
            let mut names = vec![];
            while let Some(child) = dir
                .next_entry()
                .await
                .map_err(|err| StorageError::new(path, err))?
            {
                names.push(child.file_name().to_string_lossy().into_owned());
            }
            names.sort();
            Ok(names)
        }
        .boxed()
    }

    fn remove_folder(&self, parent: FolderRef, folder: FolderRef) -> Boxed<Result<(), StorageError>> {
        async move {
            let path = parent.path().join(folder.name());
            tokio::fs::remove_dir_all(&path)
                .await
                .map_err(|err| StorageError::new(&path, err))?;
            info!("removed folder \"{}\"", path.display());
            Ok(())
        }
        .boxed()
    }
}
