use crate::{
    error::StorageError,
    media::{Camera, CameraSet, Classification, FolderRef, StorageBackend, VideoEntry, VideoSourceHandle},
};
use chrono::{Local, NaiveDateTime, TimeZone};
use log::{info, warn};
use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};
use walkdir::WalkDir;

/// Recorder timestamp prefix of every clip file, e.g. `2023-05-01_12-00-00`.
const STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const STAMP_LEN: usize = 19;
const EVENT_MARKER: &str = "event.json";

/// One timestamp group found in one directory, before it is known to be
/// complete.
#[derive(Debug, Default)]
struct CaptureGroup {
    files: CameraSet<Option<PathBuf>>,
}

/// Walks a recorder tree (`SavedClips/<event>/...`, `SentryClips/<event>/...`,
/// `RecentClips/...`) and groups the per-camera files into entries.
pub struct DirectoryScanner {
    extension: String,
}

impl DirectoryScanner {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    pub async fn scan(
        &self,
        root: &Path,
        backend: Arc<dyn StorageBackend>,
    ) -> Result<Vec<VideoEntry>, StorageError> {
        let root = root.to_path_buf();
        let extension = self.extension.clone();
        let worker_root = root.clone();

        tokio::task::spawn_blocking(move || scan_blocking(&worker_root, &extension, backend))
            .await
            .map_err(|err| StorageError::new(&root, io::Error::other(err)))?
    }
}

fn scan_blocking(
    root: &Path,
    extension: &str,
    backend: Arc<dyn StorageBackend>,
) -> Result<Vec<VideoEntry>, StorageError> {
    if !root.is_dir() {
        return Err(StorageError::new(
            root,
            io::Error::new(io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    let mut groups: BTreeMap<(PathBuf, String), CaptureGroup> = BTreeMap::new();
    for item in WalkDir::new(root).sort_by_file_name() {
        let item = match item {
            Ok(item) => item,
            Err(err) => {
                warn!("skipping unreadable path during scan: {err}");
                continue;
            }
        };
        let path = item.path();
        let is_media = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if !item.file_type().is_file() || !is_media {
            continue;
        }
        let Some((stamp, camera)) = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(split_clip_stem)
        else {
            continue;
        };
        let Some(dir) = path.parent() else {
            continue;
        };

        let group = groups
            .entry((dir.to_path_buf(), stamp.to_owned()))
            .or_default();
        group.files[camera] = Some(path.to_path_buf());
    }

    let mut entries = Vec::with_capacity(groups.len());
    for ((dir, stamp), group) in groups {
        let Some(files) = group.files.transpose() else {
            warn!("incomplete capture {stamp} in \"{}\", skipping", dir.display());
            continue;
        };
        let Ok(naive) = NaiveDateTime::parse_from_str(&stamp, STAMP_FORMAT) else {
            warn!("unparseable timestamp {stamp} in \"{}\"", dir.display());
            continue;
        };

        let time = Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.timestamp_millis())
            .unwrap_or_else(|| naive.and_utc().timestamp_millis());
        let parent_folder = (dir != root)
            .then(|| dir.parent().map(|parent| FolderRef::new(parent)))
            .flatten();

        entries.push(VideoEntry {
            time,
            classification: classify(root, &dir),
            title: naive.format("%Y-%m-%d %H:%M:%S").to_string(),
            event: dir.join(EVENT_MARKER).is_file(),
            sources: files.map(|_, file| VideoSourceHandle::new(file, backend.clone())),
            folder: Some(FolderRef::new(&dir)),
            parent_folder,
        });
    }

    info!("scanned \"{}\": {} captures", root.display(), entries.len());
    Ok(entries)
}

/// `2023-05-01_12-00-00-left_repeater` -> (`2023-05-01_12-00-00`, Left)
fn split_clip_stem(stem: &str) -> Option<(&str, Camera)> {
    let stamp = stem.get(..STAMP_LEN)?;
    let suffix = stem.get(STAMP_LEN..)?.strip_prefix('-')?;
    Some((stamp, Camera::from_file_suffix(suffix)?))
}

fn classify(root: &Path, dir: &Path) -> Classification {
    dir.strip_prefix(root)
        .unwrap_or(dir)
        .components()
        .find_map(|part| Classification::from_clip_dir(&part.as_os_str().to_string_lossy()))
        .unwrap_or(Classification::Dashcam)
}
