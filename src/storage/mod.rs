//! Storage Layer - where dependency sets live between runs
//!
//! Three interchangeable backends implement [`DependencyStore`]:
//! - [`FileStore`]: one file per test unit, in a versioned [`Mode`](crate::Mode) format
//! - [`SqliteStore`]: relational table `regdata(fullname, url, hash)`
//! - [`DocumentStore`]: JSON lines collection, one document per test unit
//!
//! Persistence is best-effort. Backends never return errors to callers;
//! failures are logged and surface as [`LoadOutcome::Failed`] or
//! [`SaveOutcome::Failed`] so a broken store degrades to "no data".

pub mod document;
pub mod file;
pub mod schema;
pub mod sqlite;

pub use document::{DependencyDocument, DocumentStore};
pub use file::FileStore;
pub use sqlite::SqliteStore;

use crate::regdata::{RegData, RegDataSet, UnitKey};
use crate::Error;

/// A place dependency sets can be saved to and loaded from.
pub trait DependencyStore {
    /// Short backend name for logs and CLI output
    fn name(&self) -> &'static str;

    /// Load the set stored for `key`.
    fn load(&self, key: &UnitKey) -> LoadOutcome;

    /// Replace whatever is stored for `key` with `records`.
    fn save(&self, key: &UnitKey, records: &RegDataSet) -> SaveOutcome;
}

/// Result of a load.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Stored data was found (possibly an empty set)
    Loaded(RegDataSet),
    /// Nothing is stored for the key
    Absent,
    /// Stored data exists but could not be read; already logged
    Failed(Error),
}

impl LoadOutcome {
    /// Records to hand to test selection: anything but `Loaded` is empty.
    pub fn into_records(self) -> RegDataSet {
        match self {
            LoadOutcome::Loaded(records) => records,
            LoadOutcome::Absent | LoadOutcome::Failed(_) => RegDataSet::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, LoadOutcome::Absent)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LoadOutcome::Failed(_))
    }
}

/// Result of a save.
#[derive(Debug)]
pub enum SaveOutcome {
    /// `records` entries were written
    Saved { records: usize },
    /// Saves are switched off in configuration
    Disabled,
    /// No usable target (e.g. no file name could be opened); already logged
    Skipped,
    /// The backend rejected the write; already logged
    Failed(Error),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }
}

/// Records an external store keeps: local file resources only.
pub(crate) fn file_resources(records: &RegDataSet) -> Vec<&RegData> {
    crate::regdata::sorted(records)
        .into_iter()
        .filter(|r| r.is_file_resource())
        .collect()
}
