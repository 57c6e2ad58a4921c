pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod export;
pub mod scene;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{ServerSettings, TomlConfig};

pub use adapters::http::{router, serve};
pub use adapters::MemoryConfigurationStore;
pub use core::{render_model, ModelService};
pub use domain::model::{BalloonSpec, Configuration, ConfigurationId, Finish, Shape, SlotId};
pub use export::{ExportError, ExportOptions, ExportedModel, GlbExporter};
pub use scene::{customize, BouquetTemplate, MaterialResolver, PreparedScene, SceneGraph};
pub use utils::error::{BouquetError, Result};
