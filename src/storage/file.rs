//! File store - one file per test unit under a directory

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{DependencyStore, LoadOutcome, SaveOutcome};
use crate::format::time_txt;
use crate::mode::Mode;
use crate::regdata::{RegDataSet, UnitKey};
use crate::resolver::{self, Resolution};
use crate::Result;

/// Filesystem-backed store writing every set in a single [`Mode`].
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    mode: Mode,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>, mode: Mode) -> Self {
        Self {
            dir: dir.into(),
            mode,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// File currently holding the set for `key`, if any.
    pub fn locate(&self, key: &UnitKey) -> Option<PathBuf> {
        match resolver::open_read(&self.dir, key) {
            Resolution::Resolved { path, .. } => Some(path),
            Resolution::Unavailable => None,
        }
    }

    /// Save time recorded for `key`, in ms since the epoch. Only `time_txt`
    /// files carry one.
    pub fn saved_at(&self, key: &UnitKey) -> Option<u64> {
        if self.mode != Mode::TimeTxt {
            return None;
        }
        match resolver::open_read(&self.dir, key) {
            Resolution::Resolved { handle, path } => match time_txt::saved_at(handle) {
                Ok(millis) => Some(millis),
                Err(e) => {
                    tracing::warn!("Could not read save time from {}: {}", path.display(), e);
                    None
                }
            },
            Resolution::Unavailable => None,
        }
    }

    fn write_all<W: Write>(&self, writer: W, records: &RegDataSet) -> Result<()> {
        let mut writer = BufWriter::new(writer);
        self.mode.serialize(&mut writer, records)?;
        writer.flush()?;
        Ok(())
    }
}

impl DependencyStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    fn load(&self, key: &UnitKey) -> LoadOutcome {
        let (reader, path) = match resolver::open_read(&self.dir, key) {
            Resolution::Resolved { handle, path } => (handle, path),
            Resolution::Unavailable => return LoadOutcome::Absent,
        };

        match self.mode.deserialize(reader) {
            Ok(records) => {
                tracing::debug!("Loaded {} dependencies from {}", records.len(), path.display());
                LoadOutcome::Loaded(records)
            }
            Err(e) => {
                tracing::warn!("Could not load dependencies from {}: {}", path.display(), e);
                LoadOutcome::Failed(e)
            }
        }
    }

    fn save(&self, key: &UnitKey, records: &RegDataSet) -> SaveOutcome {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            tracing::warn!("Could not create directory {}: {}", self.dir.display(), e);
        }

        let (file, path) = match resolver::open_write(&self.dir, key) {
            Resolution::Resolved { handle, path } => (handle, path),
            Resolution::Unavailable => return SaveOutcome::Skipped,
        };

        match self.write_all(file, records) {
            Ok(()) => {
                tracing::debug!("Saved {} dependencies to {}", records.len(), path.display());
                SaveOutcome::Saved {
                    records: records.len(),
                }
            }
            Err(e) => {
                tracing::warn!("Could not save dependencies to {}: {}", path.display(), e);
                // A half-written file would read back as corrupt; drop it.
                fs::remove_file(&path).ok();
                SaveOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regdata::RegData;
    use crate::Error;
    use tempfile::tempdir;

    fn sample() -> RegDataSet {
        [
            RegData::new("file:/a/b.class", "123"),
            RegData::new("file:/a/c.class", "456"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_roundtrip_every_mode() {
        let dir = tempdir().unwrap();
        for mode in Mode::all() {
            let store = FileStore::new(dir.path().join(mode.as_str()), *mode);
            let key = UnitKey::method("com.example.Foo", "testBar");
            assert!(store.save(&key, &sample()).is_saved());
            match store.load(&key) {
                LoadOutcome::Loaded(records) => assert_eq!(records, sample()),
                other => panic!("{}: unexpected {:?}", mode, other),
            }
        }
    }

    #[test]
    fn test_written_file_starts_with_magic() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path(), Mode::Txt);
        store.save(&UnitKey::full("com.example.Foo.testBar"), &sample());

        let bytes = fs::read(dir.path().join("com.example.Foo.testBar")).unwrap();
        assert!(bytes.starts_with(b"# 1"));
    }

    #[test]
    fn test_overwrite_replaces_previous_set() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path(), Mode::PrefixTxt);
        let key = UnitKey::full("com.example.Foo");
        let second: RegDataSet = [RegData::new("file:/z/Z.class", "9")].into_iter().collect();

        store.save(&key, &sample());
        store.save(&key, &second);
        assert_eq!(store.load(&key).into_records(), second);
    }

    #[test]
    fn test_empty_versus_absent() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path(), Mode::Bin);
        let saved = UnitKey::full("com.example.Empty");
        let never = UnitKey::full("com.example.Never");

        assert!(store.save(&saved, &RegDataSet::new()).is_saved());

        let loaded = store.load(&saved);
        assert!(loaded.is_loaded());
        assert!(loaded.into_records().is_empty());
        assert!(store.load(&never).is_absent());

        assert!(dir.path().join("com.example.Empty").exists());
        assert!(!dir.path().join("com.example.Never").exists());
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileStore::new(&nested, Mode::Txt);
        assert!(store.save(&UnitKey::full("Foo"), &sample()).is_saved());
        assert!(nested.join("Foo").exists());
    }

    #[test]
    fn test_corrupt_file_is_failed_not_absent() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Foo"), b"# 1\nno-separator\n").unwrap();
        let store = FileStore::new(dir.path(), Mode::Txt);

        let outcome = store.load(&UnitKey::full("Foo"));
        assert!(matches!(outcome, LoadOutcome::Failed(Error::Format { .. })));
        assert!(outcome.into_records().is_empty());
    }

    #[test]
    fn test_separator_characters_survive_text_modes() {
        let dir = tempdir().unwrap();
        let records: RegDataSet = [
            RegData::new("file:/a/B.class", "12 34"),
            RegData::new("file:/a\nB.class", "5"),
        ]
        .into_iter()
        .collect();

        for mode in [Mode::Txt, Mode::PrefixTxt, Mode::TimeTxt] {
            let store = FileStore::new(dir.path().join(mode.as_str()), mode);
            let key = UnitKey::full("com.example.Foo");
            assert!(store.save(&key, &records).is_saved());
            match store.load(&key) {
                LoadOutcome::Loaded(loaded) => assert_eq!(loaded, records, "{}", mode),
                other => panic!("{}: unexpected {:?}", mode, other),
            }
        }
    }

    #[test]
    fn test_saved_at_only_for_time_txt() {
        let dir = tempdir().unwrap();
        let key = UnitKey::full("com.example.Foo");

        let timed = FileStore::new(dir.path().join("timed"), Mode::TimeTxt);
        assert_eq!(timed.saved_at(&key), None);
        timed.save(&key, &sample());
        assert!(timed.saved_at(&key).is_some_and(|millis| millis > 0));

        let plain = FileStore::new(dir.path().join("plain"), Mode::Txt);
        plain.save(&key, &sample());
        assert_eq!(plain.saved_at(&key), None);
    }

    #[test]
    fn test_long_method_name_roundtrip() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path(), Mode::TimeTxt);
        let key = UnitKey::method("com.example.Foo", "p".repeat(500).as_str());

        assert!(store.save(&key, &sample()).is_saved());
        assert_eq!(store.load(&key).into_records(), sample());

        let located = store.locate(&key).unwrap();
        let name = located.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("com.example.Foo."));
        assert!(name.len() < 255);
    }
}
