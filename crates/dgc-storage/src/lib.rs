//! A small redb-backed keyed record store, shared by every service that owns
//! durable state (spec §5: "each service owns its local store; all mutations
//! go through prepared statements"). One `redb` table per logical collection,
//! values bincode-encoded, keys are plain strings.
//!
//! The spec excludes only "the embedded SQL engine" (§1) as an out-of-scope
//! collaborator, not persistence itself; redb gives every service the same
//! durable-by-default storage the teacher's own `ioi-storage` crate provides,
//! without pulling in a SQL dialect.

use redb::{Database, ReadableTable, TableDefinition};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("codec error: {0}")]
    Codec(String),
}

/// One write in a [`RecordStore::write_batch`] call: insert/overwrite `key`
/// in `table` with the bincode encoding of `value`.
pub struct Write<'a> {
    pub table: &'static str,
    pub key: String,
    pub bytes: Vec<u8>,
    _marker: std::marker::PhantomData<&'a ()>,
}

impl<'a> Write<'a> {
    pub fn new<T: Serialize>(table: &'static str, key: impl Into<String>, value: &T) -> Result<Self, StorageError> {
        let bytes = bincode::serialize(value).map_err(|e| StorageError::Codec(e.to_string()))?;
        Ok(Write {
            table,
            key: key.into(),
            bytes,
            _marker: std::marker::PhantomData,
        })
    }
}

#[derive(Clone)]
pub struct RecordStore {
    db: Arc<Database>,
}

impl RecordStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = Database::create(path).map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(RecordStore { db: Arc::new(db) })
    }

    fn table_def(name: &'static str) -> TableDefinition<'static, &'static str, &'static [u8]> {
        TableDefinition::new(name)
    }

    pub fn put<T: Serialize>(
        &self,
        table: &'static str,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        self.write_batch(vec![Write::new(table, key, value)?])
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        table: &'static str,
        key: &str,
    ) -> Result<Option<T>, StorageError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let def = Self::table_def(table);
        let tbl = match read_txn.open_table(def) {
            Ok(t) => t,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(StorageError::Backend(e.to_string())),
        };
        match tbl.get(key).map_err(|e| StorageError::Backend(e.to_string()))? {
            Some(guard) => {
                let value = bincode::deserialize(guard.value())
                    .map_err(|e| StorageError::Codec(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Returns every `(key, value)` pair in `table`, in key order. Callers
    /// re-sort by whatever secondary key the spec's persisted-state layout
    /// names (e.g. `occurredAt`); a full scan is acceptable at this scale.
    pub fn scan<T: DeserializeOwned>(
        &self,
        table: &'static str,
    ) -> Result<Vec<(String, T)>, StorageError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let def = Self::table_def(table);
        let tbl = match read_txn.open_table(def) {
            Ok(t) => t,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::Backend(e.to_string())),
        };
        let mut out = Vec::new();
        for entry in tbl.iter().map_err(|e| StorageError::Backend(e.to_string()))? {
            let (k, v) = entry.map_err(|e| StorageError::Backend(e.to_string()))?;
            let value = bincode::deserialize(v.value()).map_err(|e| StorageError::Codec(e.to_string()))?;
            out.push((k.value().to_string(), value));
        }
        Ok(out)
    }

    /// Writes every entry in `writes` inside a single transaction, so a
    /// caller updating both domain state and an idempotency/audit row never
    /// observes one without the other (spec §5).
    pub fn write_batch(&self, writes: Vec<Write<'_>>) -> Result<(), StorageError> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        {
            for w in &writes {
                let def = Self::table_def(w.table);
                let mut tbl = txn
                    .open_table(def)
                    .map_err(|e| StorageError::Backend(e.to_string()))?;
                tbl.insert(w.key.as_str(), w.bytes.as_slice())
                    .map_err(|e| StorageError::Backend(e.to_string()))?;
            }
        }
        txn.commit().map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(())
    }

    pub fn delete(&self, table: &'static str, key: &str) -> Result<(), StorageError> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        {
            let def = Self::table_def(table);
            let mut tbl = txn
                .open_table(def)
                .map_err(|e| StorageError::Backend(e.to_string()))?;
            tbl.remove(key).map_err(|e| StorageError::Backend(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
    struct Thing {
        n: u32,
    }

    fn temp_store() -> (RecordStore, tempfile::TempPath) {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.into_temp_path();
        let store = RecordStore::open(&path).unwrap();
        (store, path)
    }

    #[test]
    fn put_get_round_trip() {
        let (store, _path) = temp_store();
        store.put("things", "a", &Thing { n: 1 }).unwrap();
        let got: Option<Thing> = store.get("things", "a").unwrap();
        assert_eq!(got, Some(Thing { n: 1 }));
    }

    #[test]
    fn missing_key_is_none_not_error() {
        let (store, _path) = temp_store();
        let got: Option<Thing> = store.get("things", "missing").unwrap();
        assert_eq!(got, None);
    }

    #[test]
    fn scan_returns_all_entries() {
        let (store, _path) = temp_store();
        store.put("things", "a", &Thing { n: 1 }).unwrap();
        store.put("things", "b", &Thing { n: 2 }).unwrap();
        let all: Vec<(String, Thing)> = store.scan("things").unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn write_batch_is_atomic_across_tables() {
        let (store, _path) = temp_store();
        let writes = vec![
            Write::new("domain", "k1", &Thing { n: 1 }).unwrap(),
            Write::new("audit", "k1", &Thing { n: 1 }).unwrap(),
        ];
        store.write_batch(writes).unwrap();
        let domain: Option<Thing> = store.get("domain", "k1").unwrap();
        let audit: Option<Thing> = store.get("audit", "k1").unwrap();
        assert!(domain.is_some());
        assert!(audit.is_some());
    }
}
