// src/bin/clipboard_probe.rs
//! Reads the clipboard once and reports whether the content would be
//! recorded and flagged with the default patterns.

use anyhow::Result;
use clipwatch::core::clipboard::{ClipboardSource, SystemClipboard};
use clipwatch::core::history::FlagPredicate;
use clipwatch::HistoryEntry;

fn main() -> Result<()> {
    println!("📋 CLIPBOARD PROBE");
    println!("==================");

    let text = SystemClipboard::new().read_text()?;
    if text.trim().is_empty() {
        println!("Clipboard holds no text; nothing would be recorded.");
        return Ok(());
    }

    let predicate = FlagPredicate::default();
    let entry = HistoryEntry::new(text);
    println!("Content ({} chars): {}", entry.content.chars().count(), entry.preview());
    if predicate.matches(&entry.content) {
        println!("⭐ Would be flagged (patterns: {})", predicate.patterns().join(", "));
    } else {
        println!("Would be recorded in general history only");
    }

    Ok(())
}
