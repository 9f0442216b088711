// src/core/clipboard.rs
//! Clipboard access behind a small trait so the poller can run against
//! the OS clipboard or an in-process one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use arboard::Clipboard;

use crate::core::error::ClipboardError;

/// Source and sink of clipboard text
pub trait ClipboardSource: Send {
    /// Current clipboard text; an empty string means "no text content"
    fn read_text(&mut self) -> Result<String, ClipboardError>;

    /// Overwrite the clipboard with `text`
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The OS clipboard via arboard.
///
/// The handle is opened on first use and kept for the life of the value.
/// On X11 and Wayland arboard serves text we wrote only while its
/// `Clipboard` is alive, so dropping it after `set_text` would empty the
/// clipboard again unless a clipboard manager took over.
#[derive(Default)]
pub struct SystemClipboard {
    handle: Option<Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self) -> Result<&mut Clipboard, ClipboardError> {
        if self.handle.is_none() {
            let clipboard = Clipboard::new().map_err(|e| ClipboardError::Transient(e.to_string()))?;
            self.handle = Some(clipboard);
        }
        self.handle
            .as_mut()
            .ok_or_else(|| ClipboardError::Transient("clipboard handle unavailable".to_string()))
    }
}

impl ClipboardSource for SystemClipboard {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        match self.handle()?.get_text() {
            Ok(text) => Ok(text),
            // Images, files, or an empty clipboard
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(e) => Err(ClipboardError::Transient(e.to_string())),
        }
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.handle()?
            .set_text(text.to_owned())
            .map_err(|e| ClipboardError::Transient(e.to_string()))
    }
}

/// In-process clipboard shared between clones.
///
/// Used for headless runs and tests. `set_failing(true)` makes every read
/// and write fail with a transient error until switched back.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    text: Arc<Mutex<String>>,
    failing: Arc<AtomicBool>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: &str) -> Self {
        let clipboard = Self::new();
        clipboard.set(text);
        clipboard
    }

    /// Replace the content, as another application copying would
    pub fn set(&self, text: &str) {
        *self.text.lock().unwrap_or_else(PoisonError::into_inner) = text.to_string();
    }

    pub fn get(&self) -> String {
        self.text.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl ClipboardSource for MemoryClipboard {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClipboardError::Transient("clipboard locked".to_string()));
        }
        Ok(self.get())
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClipboardError::Transient("clipboard locked".to_string()));
        }
        self.set(text);
        Ok(())
    }
}
