use crate::media::Camera;
use derive_more::{Display, Error, From};
use std::{io, path::PathBuf};

/// A source path could not be mapped to a playable locator, usually because
/// the file vanished after the scan. The owning entry gets dropped.
#[derive(Debug, Display, Error)]
#[display("failed to resolve \"{}\": {reason}", path.display())]
pub struct ResolutionError {
    pub path: PathBuf,
    pub reason: String,
}

impl ResolutionError {
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// A decoder refused a resolved locator. Only the offending camera slot is
/// affected.
#[derive(Debug, Clone, Display, Error)]
#[display("{camera} camera cannot play: {reason}")]
pub struct MediaError {
    pub camera: Camera,
    pub reason: String,
}

impl MediaError {
    pub fn new(camera: Camera, reason: impl Into<String>) -> Self {
        Self {
            camera,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Display, Error)]
#[display("storage operation on \"{}\" failed: {source}", path.display())]
pub struct StorageError {
    pub path: PathBuf,
    pub source: io::Error,
}

impl StorageError {
    pub fn new(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// A destructive operation was requested without the references it needs.
/// Raised before any side effect.
#[derive(Debug, Clone, Display, Error)]
#[display("entry {entry_time} has no known {missing}")]
pub struct PreconditionError {
    pub entry_time: i64,
    pub missing: &'static str,
}

#[derive(Debug, Display, Error, From)]
pub enum Error {
    Resolution(ResolutionError),
    Storage(StorageError),
    Precondition(PreconditionError),
}
