// src/core/error.rs
//! Error taxonomy for the tracker core.
//!
//! Background loops never propagate these out of their thread: they are
//! logged and published to the status sink, and the loop carries on.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::poller::PollerState;
use crate::core::types::Collection;

/// Clipboard read/write hiccup; retried on the next cycle
#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Transient(String),
}

/// Errors raised by [`crate::core::history::HistoryStore`]
#[derive(Error, Debug)]
pub enum HistoryError {
    /// A selection referred to a position that no longer exists
    #[error("no entry at index {index} in {collection} history (len {len})")]
    IndexOutOfRange {
        collection: Collection,
        index: usize,
        len: usize,
    },

    #[error("no flagged items to export")]
    NothingToExport,

    #[error("failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by [`crate::core::launcher::LaunchCoordinator::trigger`]
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("launch already in progress")]
    AlreadyRunning,

    #[error("launch target not found: {0}")]
    TargetNotFound(PathBuf),

    #[error("failed to start {target}: {source}")]
    Spawn {
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum PollerError {
    #[error("poller cannot go from {from:?} to {to:?}")]
    InvalidTransition { from: PollerState, to: PollerState },

    #[error("failed to spawn poller thread: {0}")]
    Thread(#[from] std::io::Error),
}
