use crate::{
    error::{Error, PreconditionError},
    interaction::{Notice, Prompt, UserInteraction},
    media::{Camera, FolderRef, StorageBackend, VideoEntry},
    session::Session,
};
use log::{info, warn};
use std::sync::Arc;

/// What happened to the entry's folder after its media set was deleted.
#[derive(Debug)]
pub enum FolderCleanup {
    /// The entry did not record its folder.
    Unknown,
    /// Other videos still live in the folder.
    StillHasMedia,
    Declined,
    Removed { purged: usize },
    Failed(Error),
}

#[derive(Debug)]
pub enum DeleteOutcome {
    NothingSelected,
    Declined,
    MediaSetDeleted { time: i64, folder: FolderCleanup },
    FolderDeleted { purged: usize },
}

/// Confirmation-gated removal of captures and their folders.
///
/// Every path unloads the engine and releases the affected locators before
/// any bytes are removed.
pub struct DeletionWorkflow {
    storage: Arc<dyn StorageBackend>,
    media_extension: String,
}

impl DeletionWorkflow {
    pub fn new(storage: Arc<dyn StorageBackend>, media_extension: impl Into<String>) -> Self {
        Self {
            storage,
            media_extension: media_extension.into(),
        }
    }

    /// Removes the four files of the current entry, advances the selection
    /// and offers to remove the folder once it holds no more videos.
    ///
    /// A storage failure aborts the remaining removals; files already gone
    /// stay gone.
    pub async fn delete_current(
        &self,
        session: &mut Session,
        ui: &dyn UserInteraction,
    ) -> Result<DeleteOutcome, Error> {
        let Some(current) = session.catalog.current() else {
            return Ok(DeleteOutcome::NothingSelected);
        };
        let entry = current.entry().clone();
        let prompt = Prompt::DeleteMediaSet {
            title: entry.title.clone(),
            files: Camera::ALL
                .iter()
                .map(|&camera| current.source(camera).display_name.clone())
                .collect(),
        };
        if !ui.confirm(&prompt) {
            info!("deletion of {} declined", entry.time);
            return Ok(DeleteOutcome::Declined);
        }

        let previous_index = session.catalog.selected_index();
        session.release_current();

        for (camera, handle) in entry.sources.iter() {
            if let Err(err) = handle.remove().await {
                warn!("removing {camera} file of {} failed: {err}", entry.time);
                return Err(err.into());
            }
        }
        info!("deleted media set {} ({})", entry.time, entry.title);

        session.remove_entry(entry.time);
        if let Err(err) = session.select_visible(previous_index).await {
            warn!("{err}");
            ui.notify(&Notice::Failed(err.to_string()));
        }
        ui.notify(&Notice::MediaSetDeleted {
            title: entry.title.clone(),
        });

        let folder = self.cleanup_folder(session, &entry, ui).await;
        Ok(DeleteOutcome::MediaSetDeleted {
            time: entry.time,
            folder,
        })
    }

    /// Recursively removes the folder holding the entry with capture `time`
    /// and drops every catalog entry that lived there.
    pub async fn delete_folder(
        &self,
        session: &mut Session,
        time: i64,
        ui: &dyn UserInteraction,
    ) -> Result<DeleteOutcome, Error> {
        let Some(entry) = session.catalog.entry(time).cloned() else {
            return Ok(DeleteOutcome::NothingSelected);
        };
        let (folder, parent) = folder_and_parent(&entry)?;

        if !ui.confirm(&Prompt::DeleteFolder {
            folder: folder.name(),
        }) {
            info!("deletion of folder \"{}\" declined", folder.path().display());
            return Ok(DeleteOutcome::Declined);
        }

        let purged = self.remove_folder(session, parent, folder).await?;
        ui.notify(&Notice::FolderDeleted {
            folder: folder.name(),
            purged,
        });
        if let Err(err) = session.auto_select_first().await {
            warn!("{err}");
            ui.notify(&Notice::Failed(err.to_string()));
        }
        Ok(DeleteOutcome::FolderDeleted { purged })
    }

    async fn cleanup_folder(
        &self,
        session: &mut Session,
        entry: &VideoEntry,
        ui: &dyn UserInteraction,
    ) -> FolderCleanup {
        let Some(folder) = &entry.folder else {
            return FolderCleanup::Unknown;
        };
        let remaining = match self.storage.enumerate(folder.clone()).await {
            Ok(names) => names,
            Err(err) => return self.cleanup_failed(err.into(), ui),
        };
        if remaining.iter().any(|name| self.is_media(name)) {
            return FolderCleanup::StillHasMedia;
        }

        if !ui.confirm(&Prompt::DeleteEmptyFolder {
            folder: folder.name(),
            remaining,
        }) {
            return FolderCleanup::Declined;
        }
        let Some(parent) = &entry.parent_folder else {
            let err = PreconditionError {
                entry_time: entry.time,
                missing: "parent folder",
            };
            return self.cleanup_failed(err.into(), ui);
        };

        match self.remove_folder(session, parent, folder).await {
            Ok(purged) => {
                ui.notify(&Notice::FolderDeleted {
                    folder: folder.name(),
                    purged,
                });
                FolderCleanup::Removed { purged }
            }
            Err(err) => self.cleanup_failed(err, ui),
        }
    }

    fn cleanup_failed(&self, err: Error, ui: &dyn UserInteraction) -> FolderCleanup {
        warn!("folder cleanup failed: {err}");
        ui.notify(&Notice::Failed(err.to_string()));
        FolderCleanup::Failed(err)
    }

    async fn remove_folder(
        &self,
        session: &mut Session,
        parent: &FolderRef,
        folder: &FolderRef,
    ) -> Result<usize, Error> {
        let current_inside = session
            .catalog
            .current()
            .is_some_and(|current| current.entry().in_folder(folder));
        if current_inside {
            session.release_current();
        }

        self.storage
            .remove_folder(parent.clone(), folder.clone())
            .await?;
        info!("deleted folder \"{}\"", folder.path().display());
        Ok(session.purge_folder(folder))
    }

    fn is_media(&self, name: &str) -> bool {
        name.rsplit_once('.')
            .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(&self.media_extension))
    }
}

fn folder_and_parent(entry: &VideoEntry) -> Result<(&FolderRef, &FolderRef), PreconditionError> {
    let missing = |missing| PreconditionError {
        entry_time: entry.time,
        missing,
    };
    let folder = entry.folder.as_ref().ok_or_else(|| missing("folder"))?;
    let parent = entry
        .parent_folder
        .as_ref()
        .ok_or_else(|| missing("parent folder"))?;
    Ok((folder, parent))
}
