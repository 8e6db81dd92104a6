pub mod catalog;
pub mod command;
pub mod config;
pub mod deletion;
pub mod error;
pub mod interaction;
pub mod media;
pub mod playback;
pub mod session;
pub mod storage;

pub const APP_TITLE_AND_VERSION: &str =
    concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));
