use crate::domain::model::{Configuration, ConfigurationId, StoredConfiguration};
use crate::domain::ports::{ConfigurationStore, SceneExporter};
use crate::export::{ExportOptions, ExportedModel};
use crate::scene::{customize, MaterialResolver, PreparedScene, SceneGraph};
use crate::utils::error::{BouquetError, Result};
use crate::utils::monitor::ExportMonitor;
use crate::utils::validation::Validate;
use std::sync::Arc;
use std::time::Instant;

/// Customizes `base` for one configuration and serializes the result.
///
/// A fresh [`MaterialResolver`] is used per call, so concurrent requests never share mutable state.
pub async fn render_model<E: SceneExporter + ?Sized>(
    base: &SceneGraph,
    configuration: &Configuration,
    exporter: &E,
    options: ExportOptions,
) -> Result<ExportedModel> {
    let prepared = prepare_scene(base, configuration)?;
    let model = exporter.export(prepared, options).await?;
    Ok(model)
}

fn prepare_scene(base: &SceneGraph, configuration: &Configuration) -> Result<PreparedScene> {
    let mut resolver = MaterialResolver::new();
    let prepared = customize(base, configuration, &mut resolver)?;
    let materials = prepared.stats.materials;
    tracing::debug!(
        "🎨 Material cache: {} material(s), {} hit(s), {} miss(es)",
        materials.entries,
        materials.hits,
        materials.misses
    );
    if !prepared.stats.missing_materials.is_empty() {
        tracing::warn!(
            "⚠️ {} balloon node(s) exported with their original material: {}",
            prepared.stats.missing_materials.len(),
            prepared.stats.missing_materials.join(", ")
        );
    }
    Ok(prepared)
}

/// Save/fetch/export orchestration behind the HTTP surface
pub struct ModelService<S: ConfigurationStore, E: SceneExporter> {
    store: S,
    exporter: E,
    base_scene: Arc<SceneGraph>,
    monitor: ExportMonitor,
}

impl<S: ConfigurationStore, E: SceneExporter> ModelService<S, E> {
    pub fn new(store: S, exporter: E, base_scene: SceneGraph) -> Self {
        Self::with_monitoring(store, exporter, base_scene, false)
    }

    pub fn with_monitoring(store: S, exporter: E, base_scene: SceneGraph, monitor_enabled: bool) -> Self {
        Self {
            store,
            exporter,
            base_scene: Arc::new(base_scene),
            monitor: ExportMonitor::new(monitor_enabled),
        }
    }

    pub fn base_scene(&self) -> &SceneGraph {
        &self.base_scene
    }

    /// 驗證後存入 store，回傳新的 id
    pub async fn save(&self, configuration: Configuration) -> Result<StoredConfiguration> {
        configuration.validate()?;
        let stored = self.store.insert(configuration).await?;
        tracing::info!(
            "💾 Saved configuration {} ({} slot(s))",
            stored.id,
            stored.configuration.slots.len()
        );
        Ok(stored)
    }

    pub async fn save_json(&self, body: &[u8]) -> Result<StoredConfiguration> {
        let configuration = Configuration::from_json_slice(body)?;
        self.save(configuration).await
    }

    pub async fn configuration(&self, id: &ConfigurationId) -> Result<StoredConfiguration> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| BouquetError::NotFoundError { id: id.to_string() })
    }

    /// Customizes and exports the model for a stored configuration
    pub async fn model(&self, id: &ConfigurationId, options: ExportOptions) -> Result<ExportedModel> {
        let stored = self.configuration(id).await?;
        let started = Instant::now();

        let model = render_model(&self.base_scene, &stored.configuration, &self.exporter, options).await?;

        tracing::info!(
            "📦 Exported {} for {} ({} bytes in {:?})",
            model.file_extension,
            id,
            model.len(),
            started.elapsed()
        );
        self.monitor.log_stats("export");
        Ok(model)
    }

    /// Customize without exporting
    pub fn prepare(&self, configuration: &Configuration) -> Result<PreparedScene> {
        prepare_scene(&self.base_scene, configuration)
    }
}
