use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::Result;

use super::store::{AddressStore, MaliciousAddressEntry};

/// Device-local store: a JSON array of entries in a single file.
///
/// A missing file reads as an empty list. Writes replace the whole file.
pub struct LocalAddressStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl LocalAddressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<MaliciousAddressEntry>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Write to a sibling file and rename it over the target, so readers never
    /// see a half-written list.
    async fn write_all(&self, entries: &[MaliciousAddressEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(entries)?;
        let staging = self.staging_path();
        tokio::fs::write(&staging, json).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl AddressStore for LocalAddressStore {
    async fn get(&self, address: &str) -> Result<Option<MaliciousAddressEntry>> {
        let key = address.to_lowercase();
        let _guard = self.lock.lock().await;
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .find(|e| e.address.to_lowercase() == key))
    }

    async fn list(&self) -> Result<Vec<MaliciousAddressEntry>> {
        let _guard = self.lock.lock().await;
        self.read_all().await
    }

    async fn insert(&self, entry: &MaliciousAddressEntry) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all().await?;

        let key = entry.address.to_lowercase();

        match entries.iter_mut().find(|e| e.address.to_lowercase() == key) {
            Some(existing) => existing.absorb(entry),
            None => {
                let mut entry = entry.clone();
                entry.address = key.clone();
                entries.push(entry);
            }
        }

        self.write_all(&entries).await?;
        tracing::debug!(
            address = %key,
            path = %self.path.display(),
            "Saved malicious address locally"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::store::RiskLevel;
    use chrono::Utc;

    fn entry(address: &str, reason: &str) -> MaliciousAddressEntry {
        MaliciousAddressEntry::new(address, reason, RiskLevel::default(), Utc::now())
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalAddressStore::new(dir.path().join("none.json"));
        assert!(store.list().await.unwrap().is_empty());
        assert!(store.get("x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("malicious.json");

        let store = LocalAddressStore::new(&path);
        store.insert(&entry("BadAddr", "drainer")).await.unwrap();
        store.insert(&entry("other", "airdrop scam")).await.unwrap();

        let reopened = LocalAddressStore::new(&path);
        let entries = reopened.list().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].address, "badaddr");
        assert!(reopened.get("BADADDR").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_insert_updates_existing() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalAddressStore::new(dir.path().join("m.json"));
        store.insert(&entry("addr", "first")).await.unwrap();
        store.insert(&entry("ADDR", "second")).await.unwrap();

        let entries = store.list().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].report_reason, "second");
    }

    #[tokio::test]
    async fn test_repeat_report_keeps_level_evidence_and_date() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalAddressStore::new(dir.path().join("m.json"));
        let first_seen = Utc::now() - chrono::Duration::days(3);

        store
            .insert(
                &MaliciousAddressEntry::new("addr", "drainer", RiskLevel::new(5).unwrap(), first_seen)
                    .with_evidence(Some("tx abc".to_string())),
            )
            .await
            .unwrap();
        store
            .insert(&MaliciousAddressEntry::new("addr", "old list", RiskLevel::new(2).unwrap(), Utc::now()))
            .await
            .unwrap();

        let saved = store.get("addr").await.unwrap().unwrap();
        assert_eq!(saved.risk_level.get(), 5);
        assert_eq!(saved.evidence.as_deref(), Some("tx abc"));
        assert_eq!(saved.created_at, first_seen);
    }

    #[tokio::test]
    async fn test_write_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        let store = LocalAddressStore::new(&path);
        // a stale staging file from an interrupted write must not break anything
        std::fs::write(dir.path().join("m.json.tmp"), "{half").unwrap();

        store.insert(&entry("addr", "drainer")).await.unwrap();

        assert!(!dir.path().join("m.json.tmp").exists());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = LocalAddressStore::new(&path);
        assert!(store.list().await.is_err());
    }
}
