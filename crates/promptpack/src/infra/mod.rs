//! Infrastructure adapters for file IO, config, logging, and the clipboard.

pub mod clipboard;
pub mod config;
pub mod fs;
pub mod logging;
