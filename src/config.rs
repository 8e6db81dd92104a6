use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Tunables of the viewer. Every field has a default, so a config file only
/// needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Delay before a play issued right after a source swap or seek.
    pub grace_interval_ms: u64,
    /// Delay before resuming after a layout switch rebuilt the decoders.
    pub settle_delay_ms: u64,
    /// How often grid followers are checked against the front camera.
    pub resync_interval_ms: u64,
    pub drift_tolerance_secs: f64,
    pub seek_step_secs: f64,
    pub media_extension: String,
    /// Clip length assumed by the headless decoder when it cannot probe.
    pub fallback_duration_secs: f64,
    pub tick_interval_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            grace_interval_ms: 100,
            settle_delay_ms: 100,
            resync_interval_ms: 1000,
            drift_tolerance_secs: 0.25,
            seek_step_secs: 3.0,
            media_extension: String::from("mp4"),
            fallback_duration_secs: 60.0,
            tick_interval_ms: 50,
        }
    }
}

impl PlayerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file \"{}\"", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse config file \"{}\"", path.display()))
    }

    pub fn grace_interval(&self) -> Duration {
        Duration::from_millis(self.grace_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn resync_interval(&self) -> Duration {
        Duration::from_millis(self.resync_interval_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_keep_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("camwall.toml");
        std::fs::write(&path, "seek_step_secs = 5.0\nmedia_extension = \"MP4\"\n").unwrap();

        let config = PlayerConfig::load(&path).unwrap();
        assert_eq!(config.seek_step_secs, 5.0);
        assert_eq!(config.media_extension, "MP4");
        assert_eq!(config.grace_interval(), Duration::from_millis(100));
    }

    #[test]
    fn unreadable_file_names_the_path() {
        let err = PlayerConfig::load(Path::new("/nonexistent/camwall.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/camwall.toml"));
    }
}
