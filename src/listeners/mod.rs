// src/listeners/mod.rs
//! Listeners that react to recorded clipboard entries: console printers,
//! a JSON-lines file log and the launch trigger.

pub mod launch_trigger;

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::error;

use crate::core::types::{ClipboardEvent, ClipboardListener};

pub use launch_trigger::LaunchOnFlagged;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Human,
    Json,
}

/// Prints every recorded entry to stdout.
///
/// Write failures (a closed pipe, say) are logged and otherwise ignored so
/// the poller keeps running.
pub struct EventLogger {
    format: LogFormat,
    out: Box<dyn Write + Send>,
    recorded: usize,
    flagged: usize,
}

impl EventLogger {
    pub fn new(format: LogFormat) -> Self {
        Self::with_writer(format, Box::new(io::stdout()))
    }

    pub fn with_writer(format: LogFormat, out: Box<dyn Write + Send>) -> Self {
        Self {
            format,
            out,
            recorded: 0,
            flagged: 0,
        }
    }

    fn emit(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{}", line).and_then(|()| self.out.flush()) {
            error!("Failed to write event to stdout: {}", e);
        }
    }

    /// One output line for `event`
    pub fn render(&self, event: &ClipboardEvent) -> String {
        match self.format {
            LogFormat::Human => {
                let marker = if event.flagged { "⭐" } else { "📋" };
                format!(
                    "{} #{} [{}] {}",
                    marker,
                    event.sequence,
                    event.entry.timestamp(),
                    event.entry.preview()
                )
            }
            LogFormat::Json => event_json(event).to_string(),
        }
    }
}

impl ClipboardListener for EventLogger {
    fn on_entry_recorded(&mut self, event: &ClipboardEvent) {
        self.recorded += 1;
        if event.flagged {
            self.flagged += 1;
        }
        let line = self.render(event);
        self.emit(&line);
    }

    fn on_monitoring_started(&mut self) {
        let line = match self.format {
            LogFormat::Human => "🚀 Watching the clipboard".to_string(),
            LogFormat::Json => json!({
                "event_type": "monitoring_started",
                "timestamp": chrono::Local::now().to_rfc3339(),
            })
            .to_string(),
        };
        self.emit(&line);
    }

    fn on_monitoring_stopped(&mut self) {
        let line = match self.format {
            LogFormat::Human => format!(
                "📊 Recorded {} entries ({} flagged)",
                self.recorded, self.flagged
            ),
            LogFormat::Json => json!({
                "event_type": "monitoring_stopped",
                "timestamp": chrono::Local::now().to_rfc3339(),
                "recorded": self.recorded,
                "flagged": self.flagged,
            })
            .to_string(),
        };
        self.emit(&line);
    }
}

/// Appends recorded entries to a file as JSON lines
pub struct FileEventLogger {
    file: File,
}

impl FileEventLogger {
    pub fn new(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open output file {}", path.display()))?;

        Ok(Self { file })
    }
}

impl ClipboardListener for FileEventLogger {
    fn on_entry_recorded(&mut self, event: &ClipboardEvent) {
        if let Err(e) = writeln!(self.file, "{}", event_json(event)) {
            error!("Failed to write to output file: {}", e);
        }
    }
}

fn event_json(event: &ClipboardEvent) -> serde_json::Value {
    json!({
        "sequence": event.sequence,
        "timestamp": event.entry.captured_at.to_rfc3339(),
        "content": event.entry.content,
        "flagged": event.flagged,
    })
}
