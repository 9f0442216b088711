// src/console.rs
//! Line-oriented console over the history store and launch coordinator.
//!
//! The binary feeds stdin lines into [`Console::handle_line`] and prints
//! the reply; everything here is synchronous so it can be driven directly
//! from tests.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::core::clipboard::ClipboardSource;
use crate::core::error::{HistoryError, LaunchError};
use crate::core::history::HistoryStore;
use crate::core::launcher::{LaunchCoordinator, Started};
use crate::core::status::StatusBoard;
use crate::core::types::{ClipboardEvent, ClipboardListener, Collection, HistoryEntry};

pub const HELP: &str = "\
Commands:
  list [general|flagged]   show a history view (default: active view)
  view general|flagged     switch the active view
  show <n>                 print entry n of the last listing in full
  copy <n>                 copy entry n of the last listing to the clipboard
  delete <n>               remove entry n of the last listing
  clear                    empty the active view (asks for confirmation)
  save                     write flagged items to score_items_<time>.txt
  launch                   launch the companion app now
  check                    record the current clipboard right away
  status                   show the status line and launch countdown
  help                     this text
  quit                     exit";

/// A parsed console command. Entry numbers are 1-based and refer to the
/// most recent `list` or `view` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    List(Option<Collection>),
    View(Collection),
    Show(usize),
    Copy(usize),
    Delete(usize),
    Clear,
    Save,
    Launch,
    Check,
    Status,
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Err("empty command".to_string());
        };
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(format!("too many arguments for '{}'", verb));
        }

        let number = |arg: Option<&str>| -> Result<usize, String> {
            let raw = arg.ok_or_else(|| format!("'{}' needs an entry number", verb))?;
            match raw.parse::<usize>() {
                Ok(0) => Err("entry numbers start at 1".to_string()),
                Ok(n) => Ok(n),
                Err(_) => Err(format!("'{}' is not an entry number", raw)),
            }
        };

        match verb.to_ascii_lowercase().as_str() {
            "list" | "ls" => Ok(ConsoleCommand::List(arg.map(str::parse::<Collection>).transpose()?)),
            "view" | "tab" => {
                let arg = arg.ok_or("'view' needs general or flagged")?;
                Ok(ConsoleCommand::View(arg.parse()?))
            }
            "show" => Ok(ConsoleCommand::Show(number(arg)?)),
            "copy" | "cp" => Ok(ConsoleCommand::Copy(number(arg)?)),
            "delete" | "del" | "rm" => Ok(ConsoleCommand::Delete(number(arg)?)),
            "clear" => Ok(ConsoleCommand::Clear),
            "save" | "export" => Ok(ConsoleCommand::Save),
            "launch" => Ok(ConsoleCommand::Launch),
            "check" => Ok(ConsoleCommand::Check),
            "status" => Ok(ConsoleCommand::Status),
            "help" | "?" => Ok(ConsoleCommand::Help),
            "quit" | "exit" | "q" => Ok(ConsoleCommand::Quit),
            other => Err(format!("unknown command '{}', try 'help'", other)),
        }
    }
}

/// The active history view, shared with the poller so a flagged entry can
/// pull focus to the flagged list.
#[derive(Debug, Clone)]
pub struct ViewFocus {
    active: Arc<Mutex<Collection>>,
}

impl ViewFocus {
    pub fn new() -> Self {
        Self {
            active: Arc::new(Mutex::new(Collection::General)),
        }
    }

    pub fn get(&self) -> Collection {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, collection: Collection) {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = collection;
    }
}

impl Default for ViewFocus {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardListener for ViewFocus {
    fn on_entry_recorded(&mut self, event: &ClipboardEvent) {
        if event.flagged {
            self.set(Collection::Flagged);
        }
    }
}

/// Result of handling one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleReply {
    pub text: String,
    pub quit: bool,
}

impl ConsoleReply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quit: false,
        }
    }
}

/// The entries as last rendered; entry numbers refer to this
#[derive(Debug, Clone)]
struct Listing {
    collection: Collection,
    entries: Vec<HistoryEntry>,
}

pub struct Console {
    store: HistoryStore,
    coordinator: Arc<LaunchCoordinator>,
    status: StatusBoard,
    clipboard: Box<dyn ClipboardSource>,
    view: ViewFocus,
    export_dir: PathBuf,
    auto_launch: bool,
    pending_clear: Option<Collection>,
    listing: Option<Listing>,
}

impl Console {
    pub fn new(
        store: HistoryStore,
        coordinator: Arc<LaunchCoordinator>,
        status: StatusBoard,
        clipboard: Box<dyn ClipboardSource>,
        view: ViewFocus,
        export_dir: PathBuf,
        auto_launch: bool,
    ) -> Self {
        Self {
            store,
            coordinator,
            status,
            clipboard,
            view,
            export_dir,
            auto_launch,
            pending_clear: None,
            listing: None,
        }
    }

    pub fn active_view(&self) -> Collection {
        self.view.get()
    }

    /// Handle one line of input
    pub fn handle_line(&mut self, line: &str) -> ConsoleReply {
        let line = line.trim();

        if let Some(collection) = self.pending_clear.take() {
            return if matches!(line.to_ascii_lowercase().as_str(), "y" | "yes") {
                let removed = self.store.clear(collection);
                ConsoleReply::text(format!("Cleared {} {} entries", removed, collection))
            } else {
                ConsoleReply::text("Clear cancelled")
            };
        }

        if line.is_empty() {
            return ConsoleReply::text("");
        }

        match line.parse::<ConsoleCommand>() {
            Ok(command) => self.execute(command),
            Err(e) => ConsoleReply::text(e),
        }
    }

    pub fn execute(&mut self, command: ConsoleCommand) -> ConsoleReply {
        debug!(?command, "console command");
        match command {
            ConsoleCommand::List(collection) => {
                let collection = collection.unwrap_or_else(|| self.view.get());
                ConsoleReply::text(self.render(collection))
            }
            ConsoleCommand::View(collection) => {
                self.view.set(collection);
                ConsoleReply::text(self.render(collection))
            }
            ConsoleCommand::Show(n) => match self.selected(n) {
                Ok((_, entry)) => ConsoleReply::text(format!("[{}]\n{}", entry.timestamp(), entry.content)),
                Err(reply) => ConsoleReply::text(reply),
            },
            ConsoleCommand::Copy(n) => self.copy(n),
            ConsoleCommand::Delete(n) => {
                let (collection, entry) = match self.selected(n) {
                    Ok(selected) => selected,
                    Err(reply) => return ConsoleReply::text(reply),
                };
                match self.store.remove_entry(collection, &entry) {
                    Some(entry) => ConsoleReply::text(format!("Deleted: {}", entry.preview())),
                    None => ConsoleReply::text(stale_selection(collection, n)),
                }
            }
            ConsoleCommand::Clear => {
                let collection = self.view.get();
                self.pending_clear = Some(collection);
                let prompt = match collection {
                    Collection::General => "Are you sure you want to clear the clipboard history? [y/N]",
                    Collection::Flagged => "Are you sure you want to clear the score history? [y/N]",
                };
                ConsoleReply::text(prompt)
            }
            ConsoleCommand::Save => match self.store.save_flagged(&self.export_dir) {
                Ok(path) => ConsoleReply::text(format!("Score items saved to {}", path.display())),
                Err(HistoryError::NothingToExport) => ConsoleReply::text("No score items to save!"),
                Err(e) => {
                    warn!("export failed: {}", e);
                    ConsoleReply::text(format!("Failed to save score items: {}", e))
                }
            },
            ConsoleCommand::Launch => ConsoleReply::text(self.launch()),
            ConsoleCommand::Check => self.check(),
            ConsoleCommand::Status => ConsoleReply::text(self.describe_status()),
            ConsoleCommand::Help => ConsoleReply::text(HELP),
            ConsoleCommand::Quit => ConsoleReply {
                text: "Bye".to_string(),
                quit: true,
            },
        }
    }

    /// Resolve entry `n` of the last listing, provided it is still stored
    fn selected(&self, n: usize) -> Result<(Collection, HistoryEntry), String> {
        let Some(listing) = &self.listing else {
            return Err("Nothing listed yet; run 'list' first".to_string());
        };
        let collection = listing.collection;
        match listing.entries.get(position(n)) {
            Some(entry) if self.store.contains(collection, entry) => Ok((collection, entry.clone())),
            _ => Err(stale_selection(collection, n)),
        }
    }

    fn copy(&mut self, n: usize) -> ConsoleReply {
        let (collection, entry) = match self.selected(n) {
            Ok(selected) => selected,
            Err(reply) => return ConsoleReply::text(reply),
        };
        if let Err(e) = self.clipboard.write_text(&entry.content) {
            return ConsoleReply::text(format!("Copy failed: {}", e));
        }

        match collection {
            Collection::General => ConsoleReply::text("Text copied to clipboard!"),
            Collection::Flagged => {
                let mut text = "Score item copied to clipboard!".to_string();
                if self.auto_launch {
                    let _ = write!(text, "\n{}", self.launch());
                }
                ConsoleReply::text(text)
            }
        }
    }

    /// Record whatever is on the clipboard now, bypassing the poller's dedup
    fn check(&mut self) -> ConsoleReply {
        let text = match self.clipboard.read_text() {
            Ok(text) => text,
            Err(e) => return ConsoleReply::text(format!("Clipboard unavailable: {}", e)),
        };
        let outcome = self.store.record(&text);
        let Some(entry) = outcome.entry else {
            return ConsoleReply::text("Clipboard is empty");
        };

        let mut reply = format!("Recorded: {}", entry.preview());
        if outcome.accepted_to_flagged {
            self.view.set(Collection::Flagged);
            reply.push_str(" ⭐");
            if self.auto_launch {
                let _ = write!(reply, "\n{}", self.launch());
            }
        }
        ConsoleReply::text(reply)
    }

    fn launch(&self) -> String {
        describe_launch(&self.coordinator.trigger(), &self.coordinator.config().app_name)
    }

    fn describe_status(&self) -> String {
        let state = self.coordinator.state();
        let launch = if state.running {
            format!(
                "counting down, {}s remaining ({})",
                state.remaining_seconds,
                state.target.display()
            )
        } else {
            format!("idle ({})", state.target.display())
        };
        format!(
            "Status: {}\nLaunch: {}\nView: {} | general {} | flagged {}",
            self.status.current(),
            launch,
            self.view.get(),
            self.store.len(Collection::General),
            self.store.len(Collection::Flagged)
        )
    }

    fn render(&mut self, collection: Collection) -> String {
        let entries = self.store.snapshot(collection);
        let title = match collection {
            Collection::General => "Clipboard History",
            Collection::Flagged => "Score Items",
        };
        let mut out = format!("{} ({} entries)", title, entries.len());
        if entries.is_empty() {
            out.push_str("\n  (empty)");
        }
        for (i, entry) in entries.iter().enumerate() {
            let _ = write!(out, "\n  {:>3}  [{}] {}", i + 1, entry.timestamp(), entry.preview());
        }
        self.listing = Some(Listing {
            collection,
            entries,
        });
        out
    }
}

/// Displayed entry number to list index; 0 wraps to an index that never exists
fn position(n: usize) -> usize {
    n.wrapping_sub(1)
}

fn stale_selection(collection: Collection, n: usize) -> String {
    format!("No entry {} in {} history; list again to refresh", n, collection)
}

fn describe_launch(result: &Result<Started, LaunchError>, app_name: &str) -> String {
    match result {
        Ok(started) => format!(
            "Launching {} ({}s countdown)",
            app_name, started.countdown_secs
        ),
        Err(LaunchError::AlreadyRunning) => format!("{} is already launching", app_name),
        Err(LaunchError::TargetNotFound(path)) => {
            format!("{} shortcut not found at {}", app_name, path.display())
        }
        Err(e) => format!("Failed to launch {}: {}", app_name, e),
    }
}
