//! keysync - translation-key extraction and locale reconciliation
//!
//! keysync scans a codebase for translation calls (`t("some.key")` and
//! friends), reconciles the extracted keys against per-language JSON locale
//! stores, and reports missing keys, unused keys, placeholder mismatches
//! and suspicious key names. Repeated runs are cheap thanks to a
//! fingerprint cache, and writes are strictly opt-in.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer (commands, reporting, exit codes)
//! - `config`: Configuration file loading and parsing
//! - `core`: The engine (extraction, cache, validation, reconciliation)
//! - `utils`: Shared utility functions

pub mod cli;
pub mod config;
pub mod core;
pub mod utils;
