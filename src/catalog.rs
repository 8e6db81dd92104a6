use crate::{
    error::ResolutionError,
    media::{Classification, FolderRef, ResolvedVideoEntry, VideoEntry},
};
use log::{debug, info, warn};
use std::collections::HashMap;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Selection {
    Selected(i64),
    /// Nothing matched (or the match is hidden by the filter); `current` is
    /// untouched.
    NotFound,
    Kept,
}

/// In-memory catalog of captures, kept sorted newest first.
///
/// The catalog exclusively owns the single [`ResolvedVideoEntry`]. Operations
/// that evict it hand it back to the caller so decoders can be detached
/// before the locators are released.
#[derive(Debug, Default)]
pub struct CatalogStore {
    entries: Vec<VideoEntry>,
    filter: Classification,
    current: Option<ResolvedVideoEntry>,
    selected_index: usize,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[VideoEntry] {
        &self.entries
    }

    pub fn entry(&self, time: i64) -> Option<&VideoEntry> {
        self.entries.iter().find(|entry| entry.time == time)
    }

    pub fn filter(&self) -> Classification {
        self.filter
    }

    pub fn current(&self) -> Option<&ResolvedVideoEntry> {
        self.current.as_ref()
    }

    pub fn current_time(&self) -> Option<i64> {
        self.current.as_ref().map(ResolvedVideoEntry::time)
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    /// Entries passing the filter, newest first. Cheap to restart: clone the
    /// iterator or call again.
    pub fn visible_list(&self) -> impl Iterator<Item = &VideoEntry> + Clone {
        let filter = self.filter;
        self.entries
            .iter()
            .filter(move |entry| filter.admits(entry.classification))
    }

    pub fn visible_len(&self) -> usize {
        self.visible_list().count()
    }

    pub fn visible_at(&self, index: usize) -> Option<&VideoEntry> {
        self.visible_list().nth(index)
    }

    pub fn visible_index_of(&self, time: i64) -> Option<usize> {
        self.visible_list().position(|entry| entry.time == time)
    }

    pub fn is_selectable(&self, time: i64) -> bool {
        self.visible_index_of(time).is_some()
    }

    /// Replaces the whole collection, e.g. after a rescan. A capture time seen
    /// twice keeps the last scanned entry. The current entry survives if it
    /// is still visible; otherwise it is evicted and returned.
    #[must_use = "the evicted entry releases its locators when dropped"]
    pub fn set_entries(&mut self, entries: Vec<VideoEntry>) -> Option<ResolvedVideoEntry> {
        let mut positions: HashMap<i64, usize> = HashMap::with_capacity(entries.len());
        let mut unique: Vec<VideoEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            match positions.get(&entry.time) {
                Some(&index) => {
                    warn!(
                        "duplicate capture time {} (\"{}\"), keeping the last scanned",
                        entry.time, entry.title
                    );
                    unique[index] = entry;
                }
                None => {
                    positions.insert(entry.time, unique.len());
                    unique.push(entry);
                }
            }
        }
        // stable, so equal times would keep scan order
        unique.sort_by(|a, b| b.time.cmp(&a.time));

        info!("catalog populated with {} entries", unique.len());
        self.entries = unique;
        self.reconcile()
    }

    #[must_use = "the evicted entry releases its locators when dropped"]
    pub fn set_filter(&mut self, filter: Classification) -> Option<ResolvedVideoEntry> {
        self.filter = filter;
        debug!("filter set to {filter}");
        self.reconcile()
    }

    /// Makes the visible entry with `time` current. The previous current entry
    /// is released before the new one is resolved. If resolution fails the
    /// entry is dropped from the catalog and nothing is current.
    pub async fn select(&mut self, time: i64) -> Result<Selection, ResolutionError> {
        let Some(index) = self.visible_index_of(time) else {
            debug!("select({time}): no such visible entry");
            return Ok(Selection::NotFound);
        };
        let Some(entry) = self.entry(time).cloned() else {
            return Ok(Selection::NotFound);
        };

        if let Some(previous) = self.current.take() {
            previous.release();
        }

        match ResolvedVideoEntry::resolve(entry).await {
            Ok(resolved) => {
                self.current = Some(resolved);
                self.selected_index = index;
                Ok(Selection::Selected(time))
            }
            Err(err) => {
                warn!("dropping entry {time}: {err}");
                self.entries.retain(|entry| entry.time != time);
                self.clamp_index();
                Err(err)
            }
        }
    }

    /// Selects the first visible entry when nothing is current. An entry that
    /// fails to resolve is dropped and the next one is tried; the last error
    /// is returned only when no entry could be selected.
    pub async fn auto_select_first(&mut self) -> Result<Selection, ResolutionError> {
        if self.current.is_some() {
            return Ok(Selection::Kept);
        }
        let mut failure = None;
        for _ in 0..self.entries.len() {
            let first = self.visible_list().next().map(|entry| entry.time);
            let Some(time) = first else {
                break;
            };
            match self.select(time).await {
                Ok(selection) => return Ok(selection),
                Err(err) => failure = Some(err),
            }
        }
        self.selected_index = 0;
        match failure {
            Some(err) => Err(err),
            None => Ok(Selection::NotFound),
        }
    }

    #[must_use = "the evicted entry releases its locators when dropped"]
    pub fn take_current(&mut self) -> Option<ResolvedVideoEntry> {
        self.current.take()
    }

    /// Drops one entry. Returns the resolved form if it was current.
    #[must_use = "the evicted entry releases its locators when dropped"]
    pub fn remove_entry(&mut self, time: i64) -> Option<ResolvedVideoEntry> {
        self.entries.retain(|entry| entry.time != time);
        self.reconcile()
    }

    /// Drops every entry stored in `folder`. Returns how many went, and the
    /// current entry if it lived there.
    #[must_use = "the evicted entry releases its locators when dropped"]
    pub fn purge_folder(&mut self, folder: &FolderRef) -> (usize, Option<ResolvedVideoEntry>) {
        let before = self.entries.len();
        self.entries.retain(|entry| !entry.in_folder(folder));
        let purged = before - self.entries.len();
        info!("purged {purged} entries of folder \"{}\"", folder.path().display());
        (purged, self.reconcile())
    }

    fn reconcile(&mut self) -> Option<ResolvedVideoEntry> {
        let visible = self
            .current
            .as_ref()
            .and_then(|current| self.visible_index_of(current.time()));
        match visible {
            Some(index) => {
                self.selected_index = index;
                None
            }
            None => {
                let evicted = self.current.take();
                self.clamp_index();
                evicted
            }
        }
    }

    fn clamp_index(&mut self) {
        self.selected_index = self
            .selected_index
            .min(self.visible_len().saturating_sub(1));
    }
}
