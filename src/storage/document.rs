//! Document storage implementation
//!
//! A collection is a JSON lines file; every line is one document:
//!
//! ```json
//! {"fullname":"com.example.Foo.testBar","url":["file:/a/b.class"],"hashvalue":["123"]}
//! ```
//!
//! `url` and `hashvalue` are parallel lists of the same length and order.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{DependencyStore, LoadOutcome, SaveOutcome};
use crate::regdata::{RegData, RegDataSet, UnitKey};
use crate::Result;

/// Dependencies of one test unit as stored in the collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDocument {
    pub fullname: String,
    pub url: Vec<String>,
    pub hashvalue: Vec<String>,
}

impl DependencyDocument {
    /// Build a document from the file resources of `records`.
    pub fn from_records(fullname: impl Into<String>, records: &RegDataSet) -> Self {
        let (url, hashvalue) = super::file_resources(records)
            .into_iter()
            .map(|r| (r.url().to_string(), r.hash().to_string()))
            .unzip();
        Self {
            fullname: fullname.into(),
            url,
            hashvalue,
        }
    }

    /// Zip the parallel lists back into records.
    pub fn records(&self) -> impl Iterator<Item = RegData> + '_ {
        if self.url.len() != self.hashvalue.len() {
            tracing::warn!(
                "Document for {} has {} urls but {} hashes; extra entries ignored",
                self.fullname,
                self.url.len(),
                self.hashvalue.len()
            );
        }
        self.url
            .iter()
            .zip(&self.hashvalue)
            .map(|(url, hash)| RegData::new(url.as_str(), hash.as_str()))
    }
}

/// File-backed document collection
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    /// Open a collection file (creates it and its directory if missing)
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<DependencyDocument>> {
        let contents = fs::read_to_string(&self.path)?;
        let mut docs = Vec::new();
        for line in contents.lines().filter(|l| !l.trim().is_empty()) {
            docs.push(serde_json::from_str(line)?);
        }
        Ok(docs)
    }

    /// Documents whose `fullname` equals `fullname`
    pub fn find(&self, fullname: &str) -> Result<Vec<DependencyDocument>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|doc| doc.fullname == fullname)
            .collect())
    }

    /// Remove every document of `fullname`; returns how many were removed.
    pub fn delete_many(&self, fullname: &str) -> Result<usize> {
        let docs = self.read_all()?;
        let before = docs.len();
        let kept: Vec<DependencyDocument> =
            docs.into_iter().filter(|doc| doc.fullname != fullname).collect();
        let removed = before - kept.len();
        if removed == 0 {
            return Ok(0);
        }

        let mut contents = String::new();
        for doc in &kept {
            contents.push_str(&serde_json::to_string(doc)?);
            contents.push('\n');
        }
        // Rewrite through a sibling file so readers never see half a collection.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        Ok(removed)
    }

    /// Append one document.
    pub fn insert_one(&self, doc: &DependencyDocument) -> Result<()> {
        let mut line = serde_json::to_string(doc)?;
        line.push('\n');
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Total documents in the collection
    pub fn count(&self) -> Result<usize> {
        Ok(self.read_all()?.len())
    }

    fn replace(&self, fullname: &str, records: &RegDataSet) -> Result<usize> {
        self.delete_many(fullname)?;
        let doc = DependencyDocument::from_records(fullname, records);
        let stored = doc.url.len();
        self.insert_one(&doc)?;
        Ok(stored)
    }
}

impl DependencyStore for DocumentStore {
    fn name(&self) -> &'static str {
        "document"
    }

    fn load(&self, key: &UnitKey) -> LoadOutcome {
        let fullname = key.full_name();
        match self.find(&fullname) {
            Ok(docs) if docs.is_empty() => LoadOutcome::Absent,
            Ok(docs) => LoadOutcome::Loaded(docs.iter().flat_map(|d| d.records()).collect()),
            Err(e) => {
                tracing::warn!("Could not read documents of {}: {}", fullname, e);
                LoadOutcome::Failed(e)
            }
        }
    }

    fn save(&self, key: &UnitKey, records: &RegDataSet) -> SaveOutcome {
        let fullname = key.full_name();
        match self.replace(&fullname, records) {
            Ok(stored) => SaveOutcome::Saved { records: stored },
            Err(e) => {
                tracing::warn!("Could not store document of {}: {}", fullname, e);
                SaveOutcome::Failed(e)
            }
        }
    }
}
