//! # Regstore - dependency persistence for selective test execution
//!
//! For each test unit (a test class, or a method within one) regstore keeps
//! the set of resources the unit depended on during its last run, each with
//! a content fingerprint. A later run loads the set and re-executes the unit
//! only if some fingerprint changed.
//!
//! Regstore provides:
//! - Versioned file formats (`txt`, `prefix_txt`, `bin`, `time_txt`)
//! - Deterministic fallback names for keys too long for the filesystem
//! - Relational (SQLite) and document (JSON lines) external stores
//! - A [`Storer`] façade whose loads and saves never fail the caller

pub mod regdata;
pub mod hash;
pub mod mode;
pub mod format;
pub mod resolver;
pub mod storage;
pub mod storer;
pub mod config;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use regdata::{RegData, RegDataSet, UnitKey};
pub use mode::Mode;
pub use storage::{DependencyStore, LoadOutcome, SaveOutcome};
pub use storer::Storer;

/// Result type alias for Regstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Regstore operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed {mode} payload: {reason}")]
    Format { mode: Mode, reason: String },

    #[error("Unknown storage mode: {0}")]
    UnknownMode(String),
}
