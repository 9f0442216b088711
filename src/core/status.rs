// src/core/status.rs
//! Status line shared by the background loops and the console, plus the
//! cooperative shutdown flag both loops watch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

/// Receiver of user-facing status messages.
///
/// Writers may interleave from different threads; the last write wins.
pub trait StatusSink: Send + Sync {
    fn set_status(&self, message: &str);
}

/// In-memory status line
#[derive(Debug, Clone)]
pub struct StatusBoard {
    current: Arc<Mutex<String>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new("Ready".to_string())),
        }
    }

    pub fn current(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSink for StatusBoard {
    fn set_status(&self, message: &str) {
        debug!(status = message, "status updated");
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = message.to_string();
    }
}

/// Application-wide "still running" flag.
///
/// Cloned into every background loop; each loop checks it at its
/// iteration boundary.
#[derive(Debug, Clone)]
pub struct Shutdown {
    running: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask every loop holding a clone to wind down
    pub fn trigger(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
