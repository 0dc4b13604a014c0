use crate::core::grading::{FormatStoreError, GradeFormat, GradeFormatStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Grade formats persisted as a single JSON map: { guild_id: GradeFormat }
pub struct JsonGradeFormatStore {
    path: PathBuf,
    cache: RwLock<HashMap<u64, GradeFormat>>,
}

impl JsonGradeFormatStore {
    /// Load the map at `path`, starting empty when the file is missing.
    ///
    /// A file that no longer parses is logged and ignored rather than
    /// preventing startup; it is overwritten on the next save.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, FormatStoreError> {
        let path = path.into();
        let map = if path.exists() {
            let file = std::fs::File::open(&path)?;
            serde_json::from_reader(file).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable grade format file {}: {}", path.display(), e);
                HashMap::new()
            })
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            cache: RwLock::new(map),
        })
    }

    async fn persist(&self) -> Result<(), FormatStoreError> {
        let cache = self.cache.read().await;
        let file = std::fs::File::create(&self.path)?;
        serde_json::to_writer_pretty(file, &*cache)?;
        Ok(())
    }
}

#[async_trait]
impl GradeFormatStore for JsonGradeFormatStore {
    async fn get_format(&self, guild_id: u64) -> Result<Option<GradeFormat>, FormatStoreError> {
        let cache = self.cache.read().await;
        Ok(cache.get(&guild_id).cloned())
    }

    async fn save_format(&self, guild_id: u64, format: GradeFormat) -> Result<(), FormatStoreError> {
        let mut cache = self.cache.write().await;
        cache.insert(guild_id, format);
        drop(cache); // Release lock before persisting
        self.persist().await
    }

    async fn delete_format(&self, guild_id: u64) -> Result<bool, FormatStoreError> {
        let mut cache = self.cache.write().await;
        let existed = cache.remove(&guild_id).is_some();
        drop(cache);
        if existed {
            self.persist().await?;
        }
        Ok(existed)
    }
}
