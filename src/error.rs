//! Error types for discovery and loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a `load` call. Per-file "no class" and "declined
/// instantiation" outcomes are not errors; they drop the file silently.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid filter pattern: {0}")]
    Pattern(#[from] globset::Error),
    #[error("module not registered: {0}")]
    NotRegistered(String),
    #[error("failed to load library {path}: {reason}")]
    Library { path: PathBuf, reason: String },
    #[error("missing export: {0}")]
    MissingExport(String),
    #[error("ABI version mismatch: expected {expected}, actual {actual}")]
    AbiVersionMismatch { expected: u32, actual: u32 },
}
