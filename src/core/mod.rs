pub mod service;

pub use crate::domain::ports::{ConfigProvider, ConfigurationStore, SceneExporter};
pub use crate::utils::error::Result;
pub use service::{render_model, ModelService};
