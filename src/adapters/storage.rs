use crate::domain::model::{Configuration, ConfigurationId, StoredConfiguration};
use crate::domain::ports::ConfigurationStore;
use crate::utils::error::Result;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// 行程內的設定儲存；重啟後資料即消失
#[derive(Debug, Default)]
pub struct MemoryConfigurationStore {
    entries: RwLock<HashMap<ConfigurationId, StoredConfiguration>>,
    counter: AtomicU64,
}

impl MemoryConfigurationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `<unix-millis>-<counter>`; the counter keeps ids unique within the same millisecond
    fn next_id(&self) -> ConfigurationId {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        ConfigurationId(format!("{}-{}", Utc::now().timestamp_millis(), n))
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl ConfigurationStore for MemoryConfigurationStore {
    async fn insert(&self, configuration: Configuration) -> Result<StoredConfiguration> {
        let stored = StoredConfiguration {
            id: self.next_id(),
            saved_at: Utc::now(),
            configuration,
        };

        self.entries
            .write()
            .await
            .insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: &ConfigurationId) -> Result<Option<StoredConfiguration>> {
        Ok(self.entries.read().await.get(id).cloned())
    }
}
