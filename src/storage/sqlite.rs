//! SQLite storage implementation

use std::path::Path;
use rusqlite::{Connection, params};
use crate::Result;
use crate::regdata::{RegData, RegDataSet, UnitKey};
use super::{schema, DependencyStore, LoadOutcome, SaveOutcome};

/// Relational store: rows of `(fullname, url, hash)` in one table
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// Delete all rows of `fullname`, then insert one row per file resource.
    ///
    /// Both steps run in a single transaction. Returns the number of rows
    /// inserted.
    pub fn replace(&self, fullname: &str, records: &RegDataSet) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM regdata WHERE fullname = ?1", [fullname])?;

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO regdata (fullname, url, hash) VALUES (?1, ?2, ?3)"
            )?;
            for record in super::file_resources(records) {
                stmt.execute(params![fullname, record.url(), record.hash()])?;
                inserted += 1;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    /// All records stored for `fullname`
    pub fn query(&self, fullname: &str) -> Result<RegDataSet> {
        let mut stmt = self.conn.prepare(
            "SELECT url, hash FROM regdata WHERE fullname = ?1"
        )?;

        let records = stmt
            .query_map([fullname], |row| {
                Ok(RegData::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<RegDataSet>>()?;

        Ok(records)
    }

    /// Number of rows stored for `fullname`
    pub fn count_rows(&self, fullname: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM regdata WHERE fullname = ?1",
            [fullname],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Number of distinct test units stored
    pub fn count_units(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT fullname) FROM regdata",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl DependencyStore for SqliteStore {
    fn name(&self) -> &'static str {
        "relational"
    }

    fn load(&self, key: &UnitKey) -> LoadOutcome {
        let fullname = key.full_name();
        match self.query(&fullname) {
            Ok(records) if records.is_empty() => LoadOutcome::Absent,
            Ok(records) => LoadOutcome::Loaded(records),
            Err(e) => {
                tracing::warn!("Could not query dependencies of {}: {}", fullname, e);
                LoadOutcome::Failed(e)
            }
        }
    }

    fn save(&self, key: &UnitKey, records: &RegDataSet) -> SaveOutcome {
        let fullname = key.full_name();
        match self.replace(&fullname, records) {
            Ok(inserted) => SaveOutcome::Saved { records: inserted },
            Err(e) => {
                tracing::warn!("Could not store dependencies of {}: {}", fullname, e);
                SaveOutcome::Failed(e)
            }
        }
    }
}
