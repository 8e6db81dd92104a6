use crate::{
    catalog::{CatalogStore, Selection},
    error::{MediaError, ResolutionError},
    media::{Classification, FolderRef, ResolvedVideoEntry, VideoEntry},
    playback::SyncPlaybackEngine,
};
use log::debug;

/// Catalog and engine owned together, so that the entry attached to the
/// decoders always is the catalog's current entry.
///
/// Every path that changes `current` goes through here: the engine is
/// unloaded before the old entry's locators are released and loaded with
/// the new entry afterwards.
pub struct Session {
    pub catalog: CatalogStore,
    pub engine: SyncPlaybackEngine,
}

impl Session {
    pub fn new(engine: SyncPlaybackEngine) -> Self {
        Self {
            catalog: CatalogStore::new(),
            engine,
        }
    }

    pub async fn populate(&mut self, entries: Vec<VideoEntry>) -> Result<Selection, ResolutionError> {
        let evicted = self.catalog.set_entries(entries);
        self.evict(evicted);
        self.auto_select_first().await
    }

    pub async fn set_filter(&mut self, filter: Classification) -> Result<Selection, ResolutionError> {
        let evicted = self.catalog.set_filter(filter);
        self.evict(evicted);
        self.auto_select_first().await
    }

    pub async fn select(&mut self, time: i64) -> Result<Selection, ResolutionError> {
        if !self.catalog.is_selectable(time) {
            return Ok(Selection::NotFound);
        }
        self.engine.unload();
        let result = self.catalog.select(time).await;
        self.sync_engine();
        result
    }

    /// Selects the visible entry at `index`, clamped to the list. An empty
    /// list clears the selection.
    pub async fn select_visible(&mut self, index: usize) -> Result<Selection, ResolutionError> {
        let len = self.catalog.visible_len();
        if len == 0 {
            self.release_current();
            return Ok(Selection::NotFound);
        }
        let time = self
            .catalog
            .visible_at(index.min(len - 1))
            .map(|entry| entry.time);
        match time {
            Some(time) => self.select(time).await,
            None => Ok(Selection::NotFound),
        }
    }

    pub async fn auto_select_first(&mut self) -> Result<Selection, ResolutionError> {
        if self.catalog.current().is_some() {
            return Ok(Selection::Kept);
        }
        let result = self.catalog.auto_select_first().await;
        self.sync_engine();
        result
    }

    pub fn release_current(&mut self) {
        let current = self.catalog.take_current();
        self.evict(current);
    }

    pub fn remove_entry(&mut self, time: i64) {
        let evicted = self.catalog.remove_entry(time);
        self.evict(evicted);
    }

    pub fn purge_folder(&mut self, folder: &FolderRef) -> usize {
        let (purged, evicted) = self.catalog.purge_folder(folder);
        self.evict(evicted);
        purged
    }

    pub fn take_faults(&mut self) -> Vec<MediaError> {
        self.engine.take_faults()
    }

    fn evict(&mut self, evicted: Option<ResolvedVideoEntry>) {
        if let Some(entry) = evicted {
            debug!("evicting entry {}", entry.time());
            self.engine.unload();
            entry.release();
        }
    }

    fn sync_engine(&mut self) {
        match self.catalog.current() {
            Some(current) if self.engine.loaded_time() != Some(current.time()) => {
                self.engine.load(current);
            }
            Some(_) => {}
            None => self.engine.unload(),
        }
    }
}
