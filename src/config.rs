// src/config.rs
//! Tracker configuration loaded from TOML, with command line overrides
//! applied on top by the binary.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::core::history::{FlagPredicate, HistoryConfig, DEFAULT_HISTORY_LIMIT};
use crate::core::launcher::{LaunchConfig, DEFAULT_COUNTDOWN_SECS};
use crate::core::poller::{PollerConfig, DEFAULT_POLL_INTERVAL};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "CLIPWATCH_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Literal substrings that flag an entry
    pub patterns: Vec<String>,
    /// Shortcut or program opened when a flagged entry shows up
    pub target: PathBuf,
    pub app_name: String,
    pub history_limit: usize,
    pub poll_interval_ms: u64,
    pub countdown_secs: u32,
    /// Launch automatically on flagged entries
    pub auto_launch: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            patterns: FlagPredicate::default().patterns().to_vec(),
            target: default_target(),
            app_name: "ComfyUI".to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            auto_launch: true,
        }
    }
}

impl TrackerConfig {
    /// Load from `explicit`, else `$CLIPWATCH_CONFIG`, else the per-user
    /// config dir. A missing file yields the defaults; only an explicit path
    /// is required to exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                bail!("config file {} does not exist", path.display());
            }
            return Self::from_file(path);
        }

        match resolve_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let parsed: TrackerConfig = toml::from_str(&raw)
            .with_context(|| format!("failed to parse TOML from {}", path.display()))?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<()> {
        if self.history_limit == 0 {
            bail!("history_limit must be at least 1");
        }
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be at least 1");
        }
        Ok(())
    }

    pub fn history_config(&self) -> HistoryConfig {
        HistoryConfig {
            history_limit: self.history_limit,
            predicate: FlagPredicate::new(self.patterns.iter().cloned()),
        }
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    pub fn launch_config(&self) -> LaunchConfig {
        LaunchConfig {
            app_name: self.app_name.clone(),
            countdown_secs: self.countdown_secs,
            ..LaunchConfig::new(self.target.clone())
        }
    }
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|base| base.join("clipwatch").join("config.toml"))
}

/// `~/Desktop/ComfyUI.lnk`
fn default_target() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Desktop")
        .join("ComfyUI.lnk")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults_match_tracker_constants() {
        let config = TrackerConfig::default();
        assert_eq!(config.patterns, vec!["score_9", "score_8", "score_7"]);
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.countdown_secs, 120);
        assert!(config.target.ends_with("Desktop/ComfyUI.lnk"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "patterns = [\"rating_5\"]\nhistory_limit = 10").unwrap();

        let config = TrackerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.patterns, vec!["rating_5"]);
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.countdown_secs, 120);
        assert!(config.auto_launch);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "history_limit = 0").unwrap();
        assert!(TrackerConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TrackerConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_converts_into_component_configs() {
        let config = TrackerConfig {
            patterns: vec!["a".into(), "".into()],
            poll_interval_ms: 250,
            ..TrackerConfig::default()
        };
        assert_eq!(config.history_config().predicate.patterns(), &["a".to_string()]);
        assert_eq!(config.poller_config().interval, Duration::from_millis(250));
        assert_eq!(config.launch_config().app_name, "ComfyUI");
    }
}
