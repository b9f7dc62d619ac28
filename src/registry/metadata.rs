//! JSON sidecar holding descriptive component metadata.
//!
//! The file is a pretty-printed JSON array of [`MetadataEntry`]. Every
//! read-modify-write cycle holds an advisory exclusive lock on a sibling
//! `.lock` file and replaces the data file through a temp-file rename, so
//! readers never observe a half-written file. Concurrent writers in other
//! processes still race at the granularity of whole cycles: the last writer
//! wins and nothing is merged.

use std::fs::{self as stdfs, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tempfile::NamedTempFile;
use tokio::fs;

use super::error::RegistryError;
use crate::domain::MetadataEntry;

/// File-backed metadata store
#[derive(Debug, Clone)]
pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all entries; a missing or blank file is an empty list
    pub async fn load(&self) -> Result<Vec<MetadataEntry>, RegistryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).await?;
        parse_entries(&content)
    }

    /// Look up one entry by id
    pub async fn get(&self, id: &str) -> Result<Option<MetadataEntry>, RegistryError> {
        Ok(self.load().await?.into_iter().find(|e| e.id == id))
    }

    /// Replace the whole file
    pub async fn save(&self, entries: Vec<MetadataEntry>) -> Result<(), RegistryError> {
        self.modify(move |current| {
            *current = entries;
            ((), true)
        })
        .await
    }

    /// Insert or replace the entry with the same id.
    ///
    /// Unmodelled keys of an existing entry survive the replacement.
    pub async fn upsert(&self, entry: MetadataEntry) -> Result<(), RegistryError> {
        self.modify(move |entries| {
            match entries.iter_mut().find(|e| e.id == entry.id) {
                Some(existing) => {
                    let mut merged = entry;
                    for (key, value) in std::mem::take(&mut existing.extra) {
                        merged.extra.entry(key).or_insert(value);
                    }
                    *existing = merged;
                }
                None => entries.push(entry),
            }
            ((), true)
        })
        .await
    }

    /// Remove the entry with the given id, returning whether one existed
    pub async fn remove(&self, id: &str) -> Result<bool, RegistryError> {
        let id = id.to_string();
        self.modify(move |entries| {
            let before = entries.len();
            entries.retain(|e| e.id != id);
            let removed = entries.len() != before;
            (removed, removed)
        })
        .await
    }

    /// Run a locked read-modify-write cycle. The closure returns its result
    /// and whether the entries changed.
    async fn modify<F, T>(&self, f: F) -> Result<T, RegistryError>
    where
        F: FnOnce(&mut Vec<MetadataEntry>) -> (T, bool) + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || modify_locked(&path, f)).await?
    }
}

fn parse_entries(content: &str) -> Result<Vec<MetadataEntry>, RegistryError> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(content)?)
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}

fn modify_locked<F, T>(path: &Path, f: F) -> Result<T, RegistryError>
where
    F: FnOnce(&mut Vec<MetadataEntry>) -> (T, bool),
{
    let parent = path.parent().unwrap_or(Path::new("."));
    stdfs::create_dir_all(parent)?;

    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path(path))?;

    // Lock is released when lock_file is dropped
    lock_file.lock_exclusive()?;

    let mut entries = match stdfs::read_to_string(path) {
        Ok(content) => parse_entries(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    let (result, dirty) = f(&mut entries);

    if dirty {
        let json = serde_json::to_string_pretty(&entries)?;
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| e.error)?;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (MetadataStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = MetadataStore::new(temp.path().join("docs").join("component-data.json"));
        (store, temp)
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let (store, _temp) = create_test_store();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_replaces() {
        let (store, _temp) = create_test_store();

        let mut entry = MetadataEntry::new("quiz");
        entry.title = Some("Quiz".to_string());
        store.upsert(entry.clone()).await.unwrap();

        entry.title = Some("Pop Quiz".to_string());
        store.upsert(entry).await.unwrap();

        let entries = store.load().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("Pop Quiz"));
    }

    #[tokio::test]
    async fn test_upsert_keeps_unmodelled_keys() {
        let (store, _temp) = create_test_store();
        tokio::fs::create_dir_all(store.path().parent().unwrap()).await.unwrap();
        tokio::fs::write(
            store.path(),
            r#"[{"id": "quiz", "sourceUrl": "https://example.com/quiz"}]"#,
        )
        .await
        .unwrap();

        store.upsert(MetadataEntry::new("quiz")).await.unwrap();

        let entry = store.get("quiz").await.unwrap().unwrap();
        assert_eq!(entry.extra["sourceUrl"], "https://example.com/quiz");
    }

    #[tokio::test]
    async fn test_remove() {
        let (store, _temp) = create_test_store();
        store.upsert(MetadataEntry::new("a")).await.unwrap();
        store.upsert(MetadataEntry::new("b")).await.unwrap();

        assert!(store.remove("a").await.unwrap());
        assert!(!store.remove("a").await.unwrap());

        let ids: Vec<_> = store.load().await.unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_written_file_is_pretty_json_array() {
        let (store, _temp) = create_test_store();
        store.upsert(MetadataEntry::new("a")).await.unwrap();

        let raw = tokio::fs::read_to_string(store.path()).await.unwrap();
        assert!(raw.starts_with("[\n"));
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.is_array());
    }

    #[tokio::test]
    async fn test_invalid_json_is_an_error() {
        let (store, _temp) = create_test_store();
        tokio::fs::create_dir_all(store.path().parent().unwrap()).await.unwrap();
        tokio::fs::write(store.path(), "{not json").await.unwrap();

        assert!(matches!(store.load().await, Err(RegistryError::Json(_))));
        assert!(store.upsert(MetadataEntry::new("a")).await.is_err());
    }
}
