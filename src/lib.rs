//! Clipboard history tracker library
//!
//! Watches the system clipboard, keeps a bounded history of copied text,
//! flags entries containing configured substrings and can launch a
//! companion application when a flagged entry appears.

pub mod config;
pub mod console;
pub mod core;
pub mod listeners;

pub use crate::core::types::{ClipboardEvent, ClipboardListener, Collection, HistoryEntry};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::TrackerConfig;
    pub use crate::core::clipboard::{ClipboardSource, MemoryClipboard, SystemClipboard};
    pub use crate::core::error::{ClipboardError, HistoryError, LaunchError, PollerError};
    pub use crate::core::history::{FlagPredicate, HistoryConfig, HistoryStore, RecordOutcome};
    pub use crate::core::launcher::{
        LaunchConfig, LaunchCoordinator, LaunchState, ProcessLauncher, Started, SystemLauncher,
    };
    pub use crate::core::poller::{ClipboardPoller, PollOutcome, PollerConfig, PollerState};
    pub use crate::core::status::{Shutdown, StatusBoard, StatusSink};
    pub use crate::core::types::{ClipboardEvent, ClipboardListener, Collection, HistoryEntry};
}
