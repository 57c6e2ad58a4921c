use crate::domain::model::{Configuration, ConfigurationId, StoredConfiguration};
use crate::export::{ExportError, ExportOptions, ExportedModel};
use crate::scene::PreparedScene;
use crate::utils::error::Result;
use async_trait::async_trait;

/// 設定儲存區。目前只有記憶體實作，之後可換成資料庫而不影響場景轉換。
pub trait ConfigurationStore: Send + Sync {
    /// 儲存並配發新的 id；同一行程內 id 不重複
    fn insert(
        &self,
        configuration: Configuration,
    ) -> impl std::future::Future<Output = Result<StoredConfiguration>> + Send;

    fn get(
        &self,
        id: &ConfigurationId,
    ) -> impl std::future::Future<Output = Result<Option<StoredConfiguration>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn bind_address(&self) -> String;
    fn model_path(&self) -> Option<&str>;
    fn allowed_origins(&self) -> &[String];
    fn monitor_enabled(&self) -> bool;
}

/// Serializes a prepared scene. Takes the scene by value: a scene is never reused after an export attempt.
#[async_trait]
pub trait SceneExporter: Send + Sync {
    async fn export(
        &self,
        scene: PreparedScene,
        options: ExportOptions,
    ) -> std::result::Result<ExportedModel, ExportError>;
}
