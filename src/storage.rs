use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

/// The named record sets, one JSON array file each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    News,
    Gallery,
    Users,
}

impl Collection {
    pub fn file_name(self) -> &'static str {
        match self {
            Collection::News => "news.json",
            Collection::Gallery => "gallery.json",
            Collection::Users => "users.json",
        }
    }
}

/// Whole-file JSON persistence for collections.
///
/// Every mutation rewrites the full file through a temp file and a rename.
/// `update` holds a per-collection lock across read, modify and write so two
/// requests touching the same collection cannot drop each other's changes.
pub struct RecordStore {
    data_dir: PathBuf,
    news: Mutex<()>,
    gallery: Mutex<()>,
    users: Mutex<()>,
}

impl RecordStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            news: Mutex::new(()),
            gallery: Mutex::new(()),
            users: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(collection.file_name())
    }

    fn lock(&self, collection: Collection) -> &Mutex<()> {
        match collection {
            Collection::News => &self.news,
            Collection::Gallery => &self.gallery,
            Collection::Users => &self.users,
        }
    }

    /// Reads a collection in insertion order. A missing or unparsable file
    /// reads as an empty collection.
    pub async fn read<T: DeserializeOwned>(&self, collection: Collection) -> Vec<T> {
        match self.load(collection).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    collection = collection.file_name(),
                    "Treating collection as empty: {:#}",
                    e
                );
                Vec::new()
            }
        }
    }

    /// Overwrites a collection with `records`.
    pub async fn write<T: Serialize>(&self, collection: Collection, records: &[T]) -> Result<()> {
        let _guard = self.lock(collection).lock().await;
        self.save(collection, records).await
    }

    /// Runs a read-modify-write cycle under the collection lock.
    ///
    /// Nothing is written when `f` fails. A collection file that exists but
    /// does not parse is reported as an error rather than replaced.
    pub async fn update<T, R, E, F>(&self, collection: Collection, f: F) -> Result<R, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<anyhow::Error>,
        F: FnOnce(&mut Vec<T>) -> Result<R, E>,
    {
        let _guard = self.lock(collection).lock().await;

        let mut records = self.load(collection).await?;
        let outcome = f(&mut records)?;
        self.save(collection, &records).await?;

        Ok(outcome)
    }

    async fn load<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        let path = self.path(collection);

        let data = match fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Collection file absent");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        serde_json::from_str(&data).with_context(|| format!("Failed to parse {}", path.display()))
    }

    async fn save<T: Serialize>(&self, collection: Collection, records: &[T]) -> Result<()> {
        let path = self.path(collection);
        let json = serde_json::to_string_pretty(records)
            .with_context(|| format!("Failed to serialize {}", collection.file_name()))?;

        fs::create_dir_all(&self.data_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.data_dir.display()))?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, json)
            .await
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, &path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        Ok(())
    }
}
