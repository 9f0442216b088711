// src/listeners/launch_trigger.rs
//! Bridges flagged clipboard entries to the launch coordinator.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::error::LaunchError;
use crate::core::launcher::LaunchCoordinator;
use crate::core::types::{ClipboardEvent, ClipboardListener};

/// Triggers a launch for every flagged entry the poller records.
///
/// Repeat flags inside the countdown window are swallowed by the
/// coordinator; other failures are already on the status line.
pub struct LaunchOnFlagged {
    coordinator: Arc<LaunchCoordinator>,
}

impl LaunchOnFlagged {
    pub fn new(coordinator: Arc<LaunchCoordinator>) -> Self {
        Self { coordinator }
    }
}

impl ClipboardListener for LaunchOnFlagged {
    fn on_entry_recorded(&mut self, event: &ClipboardEvent) {
        if !event.flagged {
            return;
        }
        match self.coordinator.trigger() {
            Ok(started) => debug!(
                sequence = event.sequence,
                countdown_secs = started.countdown_secs,
                "launch triggered by flagged entry"
            ),
            Err(LaunchError::AlreadyRunning) => {
                debug!(sequence = event.sequence, "launch already counting down")
            }
            Err(e) => warn!(sequence = event.sequence, "auto-launch failed: {}", e),
        }
    }
}
