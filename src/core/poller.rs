// src/core/poller.rs
//! Background clipboard poller.
//!
//! Reads the clipboard at a fixed interval, drops empty and repeated
//! values, records the rest in the [`HistoryStore`] and fans accepted
//! changes out to the registered listeners.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::core::clipboard::ClipboardSource;
use crate::core::error::PollerError;
use crate::core::history::HistoryStore;
use crate::core::status::{Shutdown, StatusSink};
use crate::core::types::{ClipboardEvent, ClipboardListener};

/// Default delay between two clipboard reads
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Read failures are logged on the first one and then every Nth in a row
const ERROR_LOG_EVERY: u32 = 10;

/// Lifecycle of a poller; transitions only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Running,
    Stopped,
}

/// What a single poll cycle did
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// The clipboard could not be read; nothing changed
    ReadFailed,
    /// Clipboard empty or whitespace-only
    Empty,
    /// Same text as the previous accepted read
    Unchanged,
    Recorded(ClipboardEvent),
}

/// Configuration for the poller
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// State owned by the polling loop
struct PollWorker {
    clipboard: Box<dyn ClipboardSource>,
    store: HistoryStore,
    listeners: Vec<Box<dyn ClipboardListener>>,
    status: Arc<dyn StatusSink>,
    /// Last accepted clipboard text, for deduplication
    last_seen: Option<String>,
    sequence: u64,
    consecutive_errors: u32,
}

impl PollWorker {
    fn poll_once(&mut self) -> PollOutcome {
        let text = match self.clipboard.read_text() {
            Ok(text) => {
                if self.consecutive_errors > 0 {
                    debug!(errors = self.consecutive_errors, "clipboard readable again");
                }
                self.consecutive_errors = 0;
                text
            }
            Err(e) => {
                self.consecutive_errors += 1;
                if self.consecutive_errors == 1 || self.consecutive_errors % ERROR_LOG_EVERY == 0 {
                    warn!(
                        errors = self.consecutive_errors,
                        "Error monitoring clipboard: {}", e
                    );
                    self.status.set_status(&format!("Error monitoring clipboard: {}", e));
                }
                return PollOutcome::ReadFailed;
            }
        };

        if text.trim().is_empty() {
            return PollOutcome::Empty;
        }
        if self.last_seen.as_deref() == Some(text.as_str()) {
            return PollOutcome::Unchanged;
        }

        let outcome = self.store.record(&text);
        self.last_seen = Some(text);

        let Some(entry) = outcome.entry else {
            return PollOutcome::Empty;
        };

        self.sequence += 1;
        let event = ClipboardEvent {
            sequence: self.sequence,
            entry,
            flagged: outcome.accepted_to_flagged,
        };

        if event.flagged {
            info!(sequence = event.sequence, "⭐ flagged clipboard entry detected");
        } else {
            debug!(sequence = event.sequence, chars = event.entry.content.chars().count(), "clipboard changed");
        }

        for listener in self.listeners.iter_mut() {
            listener.on_entry_recorded(&event);
        }

        PollOutcome::Recorded(event)
    }

    fn notify_started(&mut self) {
        for listener in self.listeners.iter_mut() {
            listener.on_monitoring_started();
        }
    }

    fn notify_stopped(&mut self) {
        for listener in self.listeners.iter_mut() {
            listener.on_monitoring_stopped();
        }
    }
}

/// Clipboard poller running on its own thread.
///
/// `Idle -> Running -> Stopped`; a stopped poller cannot be restarted,
/// build a new one instead.
pub struct ClipboardPoller {
    worker: Arc<Mutex<PollWorker>>,
    state: Arc<Mutex<PollerState>>,
    shutdown: Shutdown,
    config: PollerConfig,
    handle: Option<JoinHandle<()>>,
}

impl ClipboardPoller {
    pub fn new(
        clipboard: Box<dyn ClipboardSource>,
        store: HistoryStore,
        status: Arc<dyn StatusSink>,
        shutdown: Shutdown,
        config: PollerConfig,
    ) -> Self {
        let worker = PollWorker {
            clipboard,
            store,
            listeners: Vec::new(),
            status,
            last_seen: None,
            sequence: 0,
            consecutive_errors: 0,
        };

        Self {
            worker: Arc::new(Mutex::new(worker)),
            state: Arc::new(Mutex::new(PollerState::Idle)),
            shutdown,
            config,
            handle: None,
        }
    }

    /// Add a listener for accepted clipboard changes
    pub fn add_listener<T: ClipboardListener + 'static>(&mut self, listener: T) {
        lock(&self.worker).listeners.push(Box::new(listener));
    }

    pub fn state(&self) -> PollerState {
        *lock(&self.state)
    }

    /// Run one poll cycle on the calling thread
    pub fn poll_once(&self) -> PollOutcome {
        lock(&self.worker).poll_once()
    }

    /// Start the background loop
    pub fn start(&mut self) -> Result<(), PollerError> {
        {
            let mut state = lock(&self.state);
            if *state != PollerState::Idle {
                return Err(PollerError::InvalidTransition {
                    from: *state,
                    to: PollerState::Running,
                });
            }
            *state = PollerState::Running;
        }

        let worker = Arc::clone(&self.worker);
        let state = Arc::clone(&self.state);
        let shutdown = self.shutdown.clone();
        let interval = self.config.interval;

        let spawned = thread::Builder::new()
            .name("clipboard-poller".to_string())
            .spawn(move || {
                info!(interval_ms = interval.as_millis() as u64, "👀 clipboard monitoring started");
                lock(&worker).notify_started();

                let is_active = || shutdown.is_running() && *lock(&state) == PollerState::Running;
                while is_active() {
                    lock(&worker).poll_once();
                    thread::sleep(interval);
                }

                lock(&worker).notify_stopped();
                info!("🛑 clipboard monitoring stopped");
            });

        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                Ok(())
            }
            Err(e) => {
                *lock(&self.state) = PollerState::Stopped;
                Err(PollerError::Thread(e))
            }
        }
    }

    /// Stop the loop and wait for it to exit (at most one interval)
    pub fn stop(&mut self) {
        *lock(&self.state) = PollerState::Stopped;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("clipboard poller thread panicked");
            }
        }
    }
}

impl Drop for ClipboardPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clipboard::MemoryClipboard;
    use crate::core::status::StatusBoard;
    use crate::core::types::Collection;
    use std::time::Instant;

    struct Counter(Arc<Mutex<Vec<ClipboardEvent>>>);

    impl ClipboardListener for Counter {
        fn on_entry_recorded(&mut self, event: &ClipboardEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn poller_with(clipboard: &MemoryClipboard, store: &HistoryStore) -> (ClipboardPoller, StatusBoard) {
        let status = StatusBoard::new();
        let poller = ClipboardPoller::new(
            Box::new(clipboard.clone()),
            store.clone(),
            Arc::new(status.clone()),
            Shutdown::new(),
            PollerConfig {
                interval: Duration::from_millis(10),
            },
        );
        (poller, status)
    }

    #[test]
    fn test_duplicate_reads_record_once() {
        let clipboard = MemoryClipboard::with_text("same");
        let store = HistoryStore::new();
        let (poller, _) = poller_with(&clipboard, &store);

        assert!(matches!(poller.poll_once(), PollOutcome::Recorded(_)));
        assert!(matches!(poller.poll_once(), PollOutcome::Unchanged));
        assert!(matches!(poller.poll_once(), PollOutcome::Unchanged));
        assert_eq!(store.len(Collection::General), 1);
    }

    #[test]
    fn test_blank_clipboard_skipped() {
        let clipboard = MemoryClipboard::with_text("  \n ");
        let store = HistoryStore::new();
        let (poller, _) = poller_with(&clipboard, &store);

        assert!(matches!(poller.poll_once(), PollOutcome::Empty));
        assert!(store.is_empty(Collection::General));
    }

    #[test]
    fn test_value_can_return_after_change() {
        let clipboard = MemoryClipboard::with_text("a");
        let store = HistoryStore::new();
        let (poller, _) = poller_with(&clipboard, &store);

        poller.poll_once();
        clipboard.set("b");
        poller.poll_once();
        clipboard.set("a");
        poller.poll_once();

        let contents: Vec<_> = store
            .snapshot(Collection::General)
            .into_iter()
            .map(|e| e.content)
            .collect();
        assert_eq!(contents, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_blank_does_not_reset_dedup() {
        let clipboard = MemoryClipboard::with_text("x");
        let store = HistoryStore::new();
        let (poller, _) = poller_with(&clipboard, &store);

        poller.poll_once();
        clipboard.set("");
        poller.poll_once();
        clipboard.set("x");
        assert!(matches!(poller.poll_once(), PollOutcome::Unchanged));
    }

    #[test]
    fn test_read_failure_is_transient() {
        let clipboard = MemoryClipboard::with_text("before");
        let store = HistoryStore::new();
        let (poller, status) = poller_with(&clipboard, &store);

        clipboard.set_failing(true);
        assert!(matches!(poller.poll_once(), PollOutcome::ReadFailed));
        assert!(status.current().starts_with("Error monitoring clipboard"));

        clipboard.set_failing(false);
        assert!(matches!(poller.poll_once(), PollOutcome::Recorded(_)));
    }

    #[test]
    fn test_listeners_see_flag() {
        let clipboard = MemoryClipboard::with_text("hello score_9 world");
        let store = HistoryStore::new();
        let (mut poller, _) = poller_with(&clipboard, &store);
        let seen = Arc::new(Mutex::new(Vec::new()));
        poller.add_listener(Counter(Arc::clone(&seen)));

        poller.poll_once();
        clipboard.set("plain text");
        poller.poll_once();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].flagged);
        assert!(!seen[1].flagged);
        assert_eq!(seen[1].sequence, 2);
    }

    #[test]
    fn test_state_machine_is_one_way() {
        let clipboard = MemoryClipboard::new();
        let store = HistoryStore::new();
        let (mut poller, _) = poller_with(&clipboard, &store);

        assert_eq!(poller.state(), PollerState::Idle);
        poller.start().expect("first start");
        assert_eq!(poller.state(), PollerState::Running);
        assert!(poller.start().is_err());

        poller.stop();
        assert_eq!(poller.state(), PollerState::Stopped);
        assert!(matches!(
            poller.start(),
            Err(PollerError::InvalidTransition {
                from: PollerState::Stopped,
                ..
            })
        ));
    }

    #[test]
    fn test_background_loop_records_and_stops() {
        let clipboard = MemoryClipboard::with_text("first");
        let store = HistoryStore::new();
        let (mut poller, _) = poller_with(&clipboard, &store);
        poller.start().unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while store.is_empty(Collection::General) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(store.len(Collection::General), 1);

        let started = Instant::now();
        poller.stop();
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_shutdown_signal_ends_loop() {
        let clipboard = MemoryClipboard::new();
        let store = HistoryStore::new();
        let shutdown = Shutdown::new();
        let mut poller = ClipboardPoller::new(
            Box::new(clipboard),
            store,
            Arc::new(StatusBoard::new()),
            shutdown.clone(),
            PollerConfig {
                interval: Duration::from_millis(10),
            },
        );
        poller.start().unwrap();
        shutdown.trigger();

        let handle = poller.handle.take().unwrap();
        handle.join().unwrap();
    }
}
