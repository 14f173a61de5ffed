use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use rewardloop_domain::account::Account;
use rewardloop_domain::shared::DomainError;

/// Exported state document written to the local file store and mirrored by
/// cloud sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub accounts: Vec<Account>,
    /// Application config as an opaque document; the snapshot store does not
    /// interpret it.
    pub config: serde_json::Value,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

impl Snapshot {
    pub fn new(accounts: Vec<Account>, config: serde_json::Value) -> Self {
        Self {
            accounts,
            config,
            export_date: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String, DomainError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DomainError::Serialization(format!("Serialize snapshot: {e}")))
    }

    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        serde_json::from_str(json)
            .map_err(|e| DomainError::Deserialization(format!("Deserialize snapshot: {e}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub name: String,
    pub modified: DateTime<Utc>,
    pub size_bytes: u64,
}

/// Local file-store collaborator: named JSON snapshot files under one
/// configured folder.
pub struct SnapshotStore {
    folder: PathBuf,
}

impl SnapshotStore {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, DomainError> {
        let cleaned = name.trim();
        if cleaned.is_empty()
            || cleaned.contains('/')
            || cleaned.contains('\\')
            || cleaned.contains("..")
        {
            return Err(DomainError::InvalidInput(format!(
                "Invalid snapshot name: {name}"
            )));
        }
        let file_name = if cleaned.ends_with(".json") {
            cleaned.to_string()
        } else {
            format!("{cleaned}.json")
        };
        Ok(self.folder.join(file_name))
    }

    pub fn list(&self) -> Result<Vec<SnapshotMeta>, DomainError> {
        if !self.folder.exists() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        let entries = fs::read_dir(&self.folder)
            .map_err(|e| DomainError::Infrastructure(format!("List snapshots: {e}")))?;
        for entry in entries {
            let entry =
                entry.map_err(|e| DomainError::Infrastructure(format!("List snapshots: {e}")))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let metadata = entry
                .metadata()
                .map_err(|e| DomainError::Infrastructure(format!("Snapshot metadata: {e}")))?;
            let modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            out.push(SnapshotMeta {
                name: name.to_string(),
                modified,
                size_bytes: metadata.len(),
            });
        }

        out.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(out)
    }

    pub fn read(&self, name: &str) -> Result<Snapshot, DomainError> {
        let path = self.path_for(name)?;
        let content = fs::read_to_string(&path).map_err(|e| {
            DomainError::Infrastructure(format!("Read snapshot {}: {e}", path.display()))
        })?;
        Snapshot::from_json(&content)
    }

    pub fn write(&self, name: &str, snapshot: &Snapshot) -> Result<(), DomainError> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.folder).map_err(|e| {
            DomainError::Infrastructure(format!("Create snapshot folder: {e}"))
        })?;
        fs::write(&path, snapshot.to_json()?).map_err(|e| {
            DomainError::Infrastructure(format!("Write snapshot {}: {e}", path.display()))
        })?;
        Ok(())
    }

    pub fn delete(&self, name: &str) -> Result<(), DomainError> {
        let path = self.path_for(name)?;
        fs::remove_file(&path).map_err(|e| {
            DomainError::Infrastructure(format!("Delete snapshot {}: {e}", path.display()))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewardloop_domain::account::Account;
    use serde_json::json;

    fn sample_snapshot() -> Snapshot {
        let account = Account::new(
            "Backup Test".to_string(),
            "M.R3_backup_refresh_secret".to_string(),
        )
        .unwrap();
        Snapshot::new(vec![account], json!({"batch_delay_secs": 30}))
    }

    #[test]
    fn test_write_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        let snapshot = sample_snapshot();
        store.write("daily", &snapshot).unwrap();

        let loaded = store.read("daily").unwrap();
        assert_eq!(loaded.accounts.len(), 1);
        assert_eq!(loaded.accounts[0].name(), "Backup Test");
        assert_eq!(loaded.config["batch_delay_secs"], 30);
        assert_eq!(loaded.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_list_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        store.write("first", &sample_snapshot()).unwrap();
        store.write("second", &sample_snapshot()).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 2);

        store.delete("first").unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
        assert!(store.read("first").is_err());
    }

    #[test]
    fn test_rejects_path_traversal_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        assert!(store.read("../etc/passwd").is_err());
        assert!(store.read("a/b").is_err());
        assert!(store.read("").is_err());
    }

    #[test]
    fn test_list_on_missing_folder_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("never-created"));
        assert!(store.list().unwrap().is_empty());
    }
}
