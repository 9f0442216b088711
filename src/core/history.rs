// src/core/history.rs
//! Bounded clipboard history with a flagged side list.
//!
//! Two independent lists are kept rather than one filtered view: flagged
//! entries must outlive their eviction from the bounded general list.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Local;
use tracing::{debug, info};

use crate::core::error::HistoryError;
use crate::core::types::{Collection, HistoryEntry};

/// Default capacity of the general list
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Header line of the flagged export file
pub const EXPORT_HEADER: &str = "=== Score Items History ===";

/// Literal substrings that mark an entry as flagged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagPredicate {
    patterns: Vec<String>,
}

impl FlagPredicate {
    /// Build a predicate; empty patterns are dropped since they would match everything.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    /// Case-sensitive literal substring match against any pattern
    pub fn matches(&self, content: &str) -> bool {
        self.patterns.iter().any(|p| content.contains(p.as_str()))
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Default for FlagPredicate {
    fn default() -> Self {
        Self::new(["score_9", "score_8", "score_7"])
    }
}

/// Configuration for the history store
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Maximum number of entries in the general list (at least 1)
    pub history_limit: usize,

    /// Rule routing entries into the flagged list
    pub predicate: FlagPredicate,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            predicate: FlagPredicate::default(),
        }
    }
}

/// Result of [`HistoryStore::record`]
#[derive(Debug, Clone, Default)]
pub struct RecordOutcome {
    /// The entry that was created, if any
    pub entry: Option<HistoryEntry>,
    pub accepted_to_general: bool,
    pub accepted_to_flagged: bool,
    /// Oldest general entry pushed out by this record
    pub evicted: Option<HistoryEntry>,
}

impl RecordOutcome {
    fn rejected() -> Self {
        Self::default()
    }
}

#[derive(Debug, Default)]
struct Lists {
    general: VecDeque<HistoryEntry>,
    flagged: VecDeque<HistoryEntry>,
}

impl Lists {
    fn get(&self, collection: Collection) -> &VecDeque<HistoryEntry> {
        match collection {
            Collection::General => &self.general,
            Collection::Flagged => &self.flagged,
        }
    }

    fn get_mut(&mut self, collection: Collection) -> &mut VecDeque<HistoryEntry> {
        match collection {
            Collection::General => &mut self.general,
            Collection::Flagged => &mut self.flagged,
        }
    }
}

/// Thread-safe history of clipboard values.
///
/// Cloning yields another handle to the same lists. Every read and write
/// goes through one mutex, so the poller thread and the console never
/// observe a half-applied record.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    lists: Arc<Mutex<Lists>>,
    config: Arc<HistoryConfig>,
}

impl HistoryStore {
    /// Create a store with the default limit and patterns
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    pub fn with_config(mut config: HistoryConfig) -> Self {
        config.history_limit = config.history_limit.max(1);
        Self {
            lists: Arc::new(Mutex::new(Lists::default())),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Lists> {
        self.lists.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a clipboard value.
    ///
    /// Empty or whitespace-only content is rejected. Accepted content is
    /// prepended to the general list (evicting the oldest entry past the
    /// limit) and, if it matches the predicate, the same entry is
    /// prepended to the flagged list.
    pub fn record(&self, content: &str) -> RecordOutcome {
        if content.trim().is_empty() {
            return RecordOutcome::rejected();
        }

        let entry = HistoryEntry::new(content.to_string());
        let flagged = self.config.predicate.matches(content);

        let mut lists = self.lock();
        lists.general.push_front(entry.clone());
        let evicted = if lists.general.len() > self.config.history_limit {
            lists.general.pop_back()
        } else {
            None
        };
        if flagged {
            lists.flagged.push_front(entry.clone());
        }
        drop(lists);

        if let Some(old) = &evicted {
            debug!(captured_at = %old.timestamp(), "evicted oldest history entry");
        }

        RecordOutcome {
            entry: Some(entry),
            accepted_to_general: true,
            accepted_to_flagged: flagged,
            evicted,
        }
    }

    /// Remove the entry at `index` (0 = newest)
    pub fn remove(&self, collection: Collection, index: usize) -> Result<HistoryEntry, HistoryError> {
        let mut lists = self.lock();
        let list = lists.get_mut(collection);
        let len = list.len();
        list.remove(index).ok_or(HistoryError::IndexOutOfRange {
            collection,
            index,
            len,
        })
    }

    /// Remove `entry` from wherever it sits in the list now.
    ///
    /// Returns `None` when it is no longer present.
    pub fn remove_entry(&self, collection: Collection, entry: &HistoryEntry) -> Option<HistoryEntry> {
        let mut lists = self.lock();
        let list = lists.get_mut(collection);
        let index = list.iter().position(|e| e == entry)?;
        list.remove(index)
    }

    pub fn contains(&self, collection: Collection, entry: &HistoryEntry) -> bool {
        self.lock().get(collection).contains(entry)
    }

    /// Entry at `index` (0 = newest)
    pub fn get(&self, collection: Collection, index: usize) -> Option<HistoryEntry> {
        self.lock().get(collection).get(index).cloned()
    }

    /// Empty one list and return how many entries were dropped
    pub fn clear(&self, collection: Collection) -> usize {
        let mut lists = self.lock();
        let list = lists.get_mut(collection);
        let removed = list.len();
        list.clear();
        info!(%collection, removed, "🧹 cleared history");
        removed
    }

    /// Copy of one list, newest first, as of now
    pub fn snapshot(&self, collection: Collection) -> Vec<HistoryEntry> {
        self.lock().get(collection).iter().cloned().collect()
    }

    pub fn len(&self, collection: Collection) -> usize {
        self.lock().get(collection).len()
    }

    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }

    /// Render the flagged list in the plain-text export format
    pub fn export_flagged(&self) -> Result<String, HistoryError> {
        let flagged = self.snapshot(Collection::Flagged);
        if flagged.is_empty() {
            return Err(HistoryError::NothingToExport);
        }

        let mut out = String::new();
        out.push_str(EXPORT_HEADER);
        out.push_str("\n\n");
        for entry in &flagged {
            out.push('[');
            out.push_str(&entry.timestamp());
            out.push_str("]\n");
            out.push_str(&entry.content);
            out.push_str("\n\n");
        }
        Ok(out)
    }

    /// Write the flagged export to `dir/score_items_<YYYYMMDD_HHMMSS>.txt`
    pub fn save_flagged(&self, dir: &Path) -> Result<PathBuf, HistoryError> {
        let text = self.export_flagged()?;
        let path = dir.join(export_file_name());
        fs::write(&path, text).map_err(|source| HistoryError::WriteError {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "💾 saved flagged items");
        Ok(path)
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// File name for an export taken now
pub fn export_file_name() -> String {
    format!("score_items_{}.txt", Local::now().format("%Y%m%d_%H%M%S"))
}
