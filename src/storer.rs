//! Storer - the entry point test runners use to persist dependencies
//!
//! A storer fixes one [`Mode`] for the file store and optionally carries an
//! external backend chosen from configuration. Every method is infallible
//! from the caller's point of view: whatever goes wrong, a load yields "no
//! dependencies" and a save is dropped.

use std::path::Path;

use crate::config::{ExternalBackend, ExternalConfig, RegstoreConfig};
use crate::mode::Mode;
use crate::regdata::{RegDataSet, UnitKey};
use crate::storage::{
    DependencyStore, DocumentStore, FileStore, LoadOutcome, SaveOutcome, SqliteStore,
};
use crate::Result;

pub struct Storer {
    mode: Mode,
    save_enabled: bool,
    external: Option<Box<dyn DependencyStore>>,
}

impl Storer {
    /// File-only storer with saves enabled
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            save_enabled: true,
            external: None,
        }
    }

    /// Build a storer from configuration. An external backend that cannot
    /// be opened is logged and left unconfigured.
    pub fn from_config(config: &RegstoreConfig) -> Self {
        let mut storer = Storer::new(Mode::from_config(config.mode.as_deref()))
            .with_saves_enabled(config.dependencies_save);

        if let Some(external) = &config.external {
            match open_external(external) {
                Ok(store) => storer = storer.with_external(store),
                Err(e) => tracing::warn!("Could not open {:?} backend: {}", external.backend, e),
            }
        }
        storer
    }

    pub fn with_saves_enabled(mut self, enabled: bool) -> Self {
        self.save_enabled = enabled;
        self
    }

    pub fn with_external(mut self, store: Box<dyn DependencyStore>) -> Self {
        self.external = Some(store);
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn saves_enabled(&self) -> bool {
        self.save_enabled
    }

    /// Name of the configured external backend, if any
    pub fn external_backend(&self) -> Option<&'static str> {
        self.external.as_ref().map(|store| store.name())
    }

    /// File store for `dir` in this storer's mode
    pub fn file_store(&self, dir: &Path) -> FileStore {
        FileStore::new(dir, self.mode)
    }

    // ========== File Store ==========

    pub fn load(&self, dir: &Path, full_name: &str) -> RegDataSet {
        self.load_outcome(dir, &UnitKey::full(full_name)).into_records()
    }

    pub fn load_method(&self, dir: &Path, class_name: &str, method_name: &str) -> RegDataSet {
        self.load_outcome(dir, &UnitKey::method(class_name, method_name))
            .into_records()
    }

    pub fn load_outcome(&self, dir: &Path, key: &UnitKey) -> LoadOutcome {
        self.file_store(dir).load(key)
    }

    pub fn save(&self, dir: &Path, full_name: &str, records: &RegDataSet) {
        self.save_outcome(dir, &UnitKey::full(full_name), records);
    }

    pub fn save_method(&self, dir: &Path, class_name: &str, method_name: &str, records: &RegDataSet) {
        self.save_outcome(dir, &UnitKey::method(class_name, method_name), records);
    }

    pub fn save_outcome(&self, dir: &Path, key: &UnitKey, records: &RegDataSet) -> SaveOutcome {
        if !self.save_enabled {
            return SaveOutcome::Disabled;
        }
        self.file_store(dir).save(key, records)
    }

    // ========== External Store ==========

    pub fn external_load(&self, full_name: &str) -> RegDataSet {
        self.external_load_outcome(&UnitKey::full(full_name)).into_records()
    }

    pub fn external_load_method(&self, class_name: &str, method_name: &str) -> RegDataSet {
        self.external_load_outcome(&UnitKey::method(class_name, method_name))
            .into_records()
    }

    pub fn external_load_outcome(&self, key: &UnitKey) -> LoadOutcome {
        match &self.external {
            Some(store) => store.load(key),
            None => {
                tracing::warn!("No external store configured, cannot load {}", key);
                LoadOutcome::Absent
            }
        }
    }

    pub fn external_save(&self, full_name: &str, records: &RegDataSet) {
        self.external_save_outcome(&UnitKey::full(full_name), records);
    }

    pub fn external_save_method(&self, class_name: &str, method_name: &str, records: &RegDataSet) {
        self.external_save_outcome(&UnitKey::method(class_name, method_name), records);
    }

    pub fn external_save_outcome(&self, key: &UnitKey, records: &RegDataSet) -> SaveOutcome {
        if !self.save_enabled {
            return SaveOutcome::Disabled;
        }
        match &self.external {
            Some(store) => store.save(key, records),
            None => {
                tracing::warn!("No external store configured, not saving {}", key);
                SaveOutcome::Skipped
            }
        }
    }
}

/// Open the backend named in `config`.
pub fn open_external(config: &ExternalConfig) -> Result<Box<dyn DependencyStore>> {
    let store: Box<dyn DependencyStore> = match config.backend {
        ExternalBackend::Relational => Box::new(SqliteStore::open(&config.database)?),
        ExternalBackend::Document => Box::new(DocumentStore::open(&config.collection)?),
    };
    Ok(store)
}
