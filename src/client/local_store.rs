//! Keyed string storage for client-side state.
//!
//! Keys used by the client:
//! - `component_<id>`: a full [`ComponentDraft`](crate::domain::ComponentDraft)
//! - `projectsList`: index of drafts, newest first
//! - `lastEditedComponent`: id of the most recently saved draft

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use super::ClientError;

pub const PROJECTS_LIST_KEY: &str = "projectsList";
pub const LAST_EDITED_KEY: &str = "lastEditedComponent";

/// Key holding the draft for `id`
pub fn component_key(id: &str) -> String {
    format!("component_{}", id)
}

/// String key-value store
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError>;

    async fn set(&self, key: &str, value: String) -> Result<(), ClientError>;

    async fn remove(&self, key: &str) -> Result<(), ClientError>;
}

/// In-memory store, lost on drop
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        let entries = self.entries.lock().map_err(|_| ClientError::Store("store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), ClientError> {
        let mut entries = self.entries.lock().map_err(|_| ClientError::Store("store lock poisoned".into()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), ClientError> {
        let mut entries = self.entries.lock().map_err(|_| ClientError::Store("store lock poisoned".into()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Store persisted as a single JSON object file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>, ClientError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    async fn write_all(&self, entries: Map<String, Value>) -> Result<(), ClientError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), ClientError> {
            let parent = path.parent().unwrap_or(Path::new("."));
            std::fs::create_dir_all(parent)?;

            let json = serde_json::to_string_pretty(&entries)?;
            let mut tmp = NamedTempFile::new_in(parent)?;
            tmp.write_all(json.as_bytes())?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| ClientError::Store(e.to_string()))?
    }
}

#[async_trait]
impl LocalStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        let entries = self.read_all().await?;
        Ok(entries.get(key).and_then(|v| v.as_str()).map(str::to_owned))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), ClientError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), Value::String(value));
        self.write_all(entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), ClientError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_some() {
            self.write_all(entries).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_component_key() {
        assert_eq!(component_key("quiz"), "component_quiz");
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(store.get("a").await.unwrap().is_none());

        store.set("a", "1".to_string()).await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));

        store.remove("a").await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_persists() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("store.json");

        let store = FileStore::new(&path);
        store.set(PROJECTS_LIST_KEY, "[]".to_string()).await.unwrap();
        store.set(LAST_EDITED_KEY, "quiz".to_string()).await.unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get(LAST_EDITED_KEY).await.unwrap().as_deref(), Some("quiz"));

        reopened.remove(LAST_EDITED_KEY).await.unwrap();
        assert!(store.get(LAST_EDITED_KEY).await.unwrap().is_none());
        assert_eq!(store.get(PROJECTS_LIST_KEY).await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_file_store_corrupt_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let store = FileStore::new(&path);
        assert!(store.get(PROJECTS_LIST_KEY).await.is_err());
    }
}
