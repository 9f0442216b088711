// src/core/mod.rs
//! Clipboard tracking core: history, polling and launch coordination.

pub mod clipboard;
pub mod error;
pub mod history;
pub mod launcher;
pub mod poller;
pub mod status;
pub mod types;
