//! Persistence for pet records
//!
//! One record per user. Last write wins; no multi-key transactions.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::components::PetRecord;
use crate::error::{PetError, Result};

/// Schema version written into every stored document.
pub const RECORD_VERSION: u8 = 1;

/// Keyed storage for pet records.
pub trait PetStore: Send + Sync {
    /// `Ok(None)` means the user has no pet yet.
    fn read(&self, user_id: &str) -> Result<Option<PetRecord>>;
    fn write(&self, user_id: &str, record: &PetRecord) -> Result<()>;
    /// Removing a record that does not exist is not an error.
    fn clear(&self, user_id: &str) -> Result<()>;
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, PetRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, PetRecord>>> {
        self.records
            .lock()
            .map_err(|_| PetError::Persistence("memory store lock poisoned".into()))
    }
}

impl PetStore for MemoryStore {
    fn read(&self, user_id: &str) -> Result<Option<PetRecord>> {
        Ok(self.records()?.get(user_id).cloned())
    }

    fn write(&self, user_id: &str, record: &PetRecord) -> Result<()> {
        let mut stored = record.clone();
        stored.stats = stored.stats.clamped();
        self.records()?.insert(user_id.to_string(), stored);
        Ok(())
    }

    fn clear(&self, user_id: &str) -> Result<()> {
        self.records()?.remove(user_id);
        Ok(())
    }
}

// ============================================================================
// JSON file store
// ============================================================================

/// On-disk envelope around a record
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    version: u8,
    user_id: String,
    record: PetRecord,
}

/// One JSON document per user inside `dir`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// User ids are opaque, so encode them before using them as filenames.
    fn path_for(&self, user_id: &str) -> PathBuf {
        let name = utf8_percent_encode(user_id, NON_ALPHANUMERIC).to_string();
        self.dir.join(format!("{}.json", name))
    }
}

impl PetStore for JsonFileStore {
    fn read(&self, user_id: &str) -> Result<Option<PetRecord>> {
        let path = self.path_for(user_id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let stored: StoredRecord = serde_json::from_str(&raw)?;
        if stored.version != RECORD_VERSION {
            return Err(PetError::Persistence(format!(
                "unsupported record version {} in {}",
                stored.version,
                path.display()
            )));
        }

        let mut record = stored.record;
        record.stats = record.stats.clamped();
        Ok(Some(record))
    }

    fn write(&self, user_id: &str, record: &PetRecord) -> Result<()> {
        let mut record = record.clone();
        record.stats = record.stats.clamped();
        let stored = StoredRecord {
            version: RECORD_VERSION,
            user_id: user_id.to_string(),
            record,
        };
        let json = serde_json::to_string_pretty(&stored)?;

        let path = self.path_for(user_id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        debug!("Wrote pet record for {} to {}", user_id, path.display());
        Ok(())
    }

    fn clear(&self, user_id: &str) -> Result<()> {
        match fs::remove_file(self.path_for(user_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{PetStats, Timestamp};

    fn record() -> PetRecord {
        PetRecord::new("sheep", "Dolly", Timestamp(1_000))
            .with_stats(PetStats::new(42.5, 10.0, 99.0), Timestamp(2_000))
            .with_critical(Timestamp(1_500))
    }

    #[test]
    fn test_memory_store_lifecycle() {
        let store = MemoryStore::new();
        assert_eq!(store.read("u1").unwrap(), None);

        store.write("u1", &record()).unwrap();
        assert_eq!(store.read("u1").unwrap(), Some(record()));
        assert_eq!(store.read("u2").unwrap(), None);

        store.clear("u1").unwrap();
        store.clear("u1").unwrap();
        assert_eq!(store.read("u1").unwrap(), None);
    }

    #[test]
    fn test_file_store_missing_user_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert_eq!(store.read("nobody").unwrap(), None);
        assert!(store.clear("nobody").is_ok());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        JsonFileStore::open(dir.path()).unwrap().write("u1", &record()).unwrap();

        let reopened = JsonFileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.read("u1").unwrap(), Some(record()));

        reopened.clear("u1").unwrap();
        assert_eq!(reopened.read("u1").unwrap(), None);
    }

    #[test]
    fn test_file_store_encodes_user_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        store.write("../escape/me", &record()).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(store.read("../escape/me").unwrap(), Some(record()));
    }

    #[test]
    fn test_file_store_rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        store.write("u1", &record()).unwrap();

        let path = store.path_for("u1");
        let raw = fs::read_to_string(&path).unwrap().replacen("\"version\": 1", "\"version\": 9", 1);
        fs::write(&path, raw).unwrap();

        assert!(matches!(store.read("u1"), Err(PetError::Persistence(_))));
    }

    #[test]
    fn test_file_store_clamps_stats_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        store.write("u1", &record()).unwrap();

        let path = store.path_for("u1");
        let raw = fs::read_to_string(&path).unwrap().replacen("42.5", "420.5", 1);
        fs::write(&path, raw).unwrap();

        let read = store.read("u1").unwrap().unwrap();
        assert_eq!(read.stats.hunger, 100.0);
    }
}
