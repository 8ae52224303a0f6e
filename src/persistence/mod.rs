use std::{
    collections::HashMap,
    fs,
    path::{
        Path,
        PathBuf,
    },
    sync::Mutex,
};

use async_trait::async_trait;
use serde::{
    de::DeserializeOwned,
    Deserialize,
    Serialize,
};
use tracing::{
    debug,
    warn,
};

use crate::core::LearnError;

const APP_NAME: &str = "learnstrat";

pub fn get_app_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        let app_dir = data_dir.join(APP_NAME);
        let _ = fs::create_dir_all(&app_dir);
        app_dir
    } else {
        PathBuf::from(".")
    }
}

pub fn get_data_file_path(filename: &str) -> PathBuf {
    get_app_data_dir().join(filename)
}

pub fn save_json<T: Serialize>(data: &T, filename: &str) -> Result<(), LearnError> {
    save_json_to(data, &get_data_file_path(filename))
}

pub fn save_json_to<T: Serialize>(data: &T, file_path: &Path) -> Result<(), LearnError> {
    let json = serde_json::to_string_pretty(data)?;
    fs::write(file_path, json)?;
    debug!(path = %file_path.display(), "data saved");
    Ok(())
}

pub fn load_json<T: for<'de> Deserialize<'de> + Default>(filename: &str) -> Result<T, LearnError> {
    load_json_from(&get_data_file_path(filename))
}

pub fn load_json_from<T: for<'de> Deserialize<'de> + Default>(
    file_path: &Path,
) -> Result<T, LearnError> {
    if !file_path.exists() {
        return Ok(T::default());
    }

    let json = fs::read_to_string(file_path)?;
    let data: T = serde_json::from_str(&json)?;
    debug!(path = %file_path.display(), "data loaded");
    Ok(data)
}

pub fn load_json_or_default<T: for<'de> Deserialize<'de> + Default>(filename: &str) -> T {
    load_json_or_default_from(&get_data_file_path(filename))
}

pub fn load_json_or_default_from<T: for<'de> Deserialize<'de> + Default>(file_path: &Path) -> T {
    match load_json_from::<T>(file_path) {
        Ok(data) => data,
        Err(e) => {
            warn!("Failed to load {}: {}. Using defaults.", file_path.display(), e);
            T::default()
        }
    }
}

/// Key-value store holding one JSON document per feature area.
///
/// A key that was never written reads back as `None`; callers treat that as
/// an empty collection rather than an error.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, LearnError>;
    async fn set(&self, key: &str, value: String) -> Result<(), LearnError>;
    async fn remove(&self, key: &str) -> Result<(), LearnError>;
}

/// Reads a JSON array stored under `key`. Missing keys yield an empty vec.
pub async fn load_collection<T, S>(store: &S, key: &str) -> Result<Vec<T>, LearnError>
where
    T: DeserializeOwned,
    S: LocalStore + ?Sized,
{
    match store.get(key).await? {
        Some(json) if !json.trim().is_empty() => Ok(serde_json::from_str(&json)?),
        _ => Ok(Vec::new()),
    }
}

pub async fn save_collection<T, S>(store: &S, key: &str, items: &[T]) -> Result<(), LearnError>
where
    T: Serialize + Sync,
    S: LocalStore + ?Sized,
{
    let json = serde_json::to_string(items)?;
    store.set(key, json).await
}

pub async fn load_document<T, S>(store: &S, key: &str) -> Result<Option<T>, LearnError>
where
    T: DeserializeOwned,
    S: LocalStore + ?Sized,
{
    match store.get(key).await? {
        Some(json) if !json.trim().is_empty() => Ok(Some(serde_json::from_str(&json)?)),
        _ => Ok(None),
    }
}

pub async fn save_document<T, S>(store: &S, key: &str, value: &T) -> Result<(), LearnError>
where
    T: Serialize + Sync,
    S: LocalStore + ?Sized,
{
    let json = serde_json::to_string(value)?;
    store.set(key, json).await
}

/// One `<key>.json` file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at the platform data directory.
    pub fn in_app_data_dir() -> Self {
        Self::new(get_app_data_dir())
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

#[async_trait]
impl LocalStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, LearnError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(json) => {
                debug!(key, path = %path.display(), "loaded");
                Ok(Some(json))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), LearnError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.path_for(key);
        tokio::fs::write(&path, value).await?;
        debug!(key, path = %path.display(), "saved");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), LearnError> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, LearnError> {
        self.entries.lock().map_err(|_| LearnError::Custom("memory store poisoned".to_string()))
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, LearnError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), LearnError> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), LearnError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        name: String,
    }

    #[tokio::test]
    async fn test_missing_key_is_empty_collection() {
        let store = MemoryStore::new();
        let items: Vec<Item> = load_collection(&store, "nothing_here").await.unwrap();
        assert!(items.is_empty());

        store.set("blank", "  ".to_string()).await.unwrap();
        let items: Vec<Item> = load_collection(&store, "blank").await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        let items = vec![Item { name: "first".into() }, Item { name: "second".into() }];
        save_collection(&store, "items", &items).await.unwrap();
        assert!(store.root().join("items.json").exists());

        let loaded: Vec<Item> = load_collection(&store, "items").await.unwrap();
        assert_eq!(loaded, items);

        store.remove("items").await.unwrap();
        store.remove("items").await.unwrap();
        assert!(store.get("items").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_an_error() {
        let store = MemoryStore::new();
        store.set("items", "{not json".to_string()).await.unwrap();
        let result: Result<Vec<Item>, _> = load_collection(&store, "items").await;
        assert!(matches!(result, Err(LearnError::Json(_))));
    }
}
