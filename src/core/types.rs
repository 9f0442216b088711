// src/core/types.rs
//! Common types and traits shared by the history store, the poller and
//! the presentation layer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::Serialize;

/// Display width of a one-line preview, in characters.
pub const PREVIEW_WIDTH: usize = 50;

/// A single captured clipboard value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub captured_at: DateTime<Local>,
    pub content: String,
}

impl HistoryEntry {
    pub fn new(content: String) -> Self {
        Self::captured(content, Local::now())
    }

    pub fn captured(content: String, captured_at: DateTime<Local>) -> Self {
        Self {
            captured_at,
            content,
        }
    }

    /// Timestamp in the `YYYY-MM-DD HH:MM:SS` form used for display and export
    pub fn timestamp(&self) -> String {
        self.captured_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// One-line rendering of the content.
    ///
    /// Content shorter than [`PREVIEW_WIDTH`] characters is shown whole,
    /// anything longer is cut to `PREVIEW_WIDTH - 3` characters plus `...`.
    /// Line breaks are flattened to spaces.
    pub fn preview(&self) -> String {
        let flat: String = self
            .content
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();

        if flat.chars().count() < PREVIEW_WIDTH {
            flat
        } else {
            let mut cut: String = flat.chars().take(PREVIEW_WIDTH - 3).collect();
            cut.push_str("...");
            cut
        }
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp(), self.preview())
    }
}

/// Which of the two history lists an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Most recent clipboard values, bounded
    General,
    /// Values that matched the flag predicate, unbounded
    Flagged,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::General => write!(f, "general"),
            Collection::Flagged => write!(f, "flagged"),
        }
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" | "all" | "history" => Ok(Collection::General),
            "flagged" | "score" | "scores" => Ok(Collection::Flagged),
            other => Err(format!("unknown collection '{}'", other)),
        }
    }
}

/// An accepted clipboard change, as delivered to listeners
#[derive(Debug, Clone, Serialize)]
pub struct ClipboardEvent {
    /// Monotonic counter of accepted changes for this poller
    pub sequence: u64,
    pub entry: HistoryEntry,
    /// Whether the entry also went into the flagged list
    pub flagged: bool,
}

/// Trait for clipboard event listeners
pub trait ClipboardListener: Send {
    /// Called when the poller records a new clipboard value
    fn on_entry_recorded(&mut self, event: &ClipboardEvent);

    /// Called when monitoring starts
    fn on_monitoring_started(&mut self) {}

    /// Called when monitoring stops
    fn on_monitoring_stopped(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_content_is_not_truncated() {
        let entry = HistoryEntry::new("hello".to_string());
        assert_eq!(entry.preview(), "hello");
    }

    #[test]
    fn test_long_content_is_cut_to_width() {
        let entry = HistoryEntry::new("x".repeat(80));
        let preview = entry.preview();
        assert_eq!(preview.chars().count(), PREVIEW_WIDTH);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_exactly_width_is_truncated() {
        // 50 chars is not "shorter than 50"
        let entry = HistoryEntry::new("y".repeat(PREVIEW_WIDTH));
        assert_eq!(entry.preview(), format!("{}...", "y".repeat(47)));
    }

    #[test]
    fn test_preview_does_not_split_multibyte_chars() {
        let entry = HistoryEntry::new("é".repeat(60));
        assert_eq!(entry.preview(), format!("{}...", "é".repeat(47)));
    }

    #[test]
    fn test_preview_flattens_newlines() {
        let entry = HistoryEntry::new("a\nb\r\nc".to_string());
        assert_eq!(entry.preview(), "a b  c");
    }

    #[test]
    fn test_collection_parses_aliases() {
        assert_eq!("all".parse::<Collection>(), Ok(Collection::General));
        assert_eq!("Score".parse::<Collection>(), Ok(Collection::Flagged));
        assert!("elsewhere".parse::<Collection>().is_err());
    }
}
