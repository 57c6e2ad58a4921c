use crate::core::ConfigProvider;
use crate::utils::error::{BouquetError, Result};
use crate::utils::validation::{
    validate_file_extension, validate_non_empty_string, validate_path, validate_positive_number, validate_url,
    Validate,
};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;

/// 合併預設值、TOML 與命令列參數後的最終設定
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Base glTF/GLB file; the procedural bouquet is used when unset
    pub model_path: Option<String>,
    /// Empty means any origin
    pub allowed_origins: Vec<String>,
    pub json_logs: bool,
    pub verbose: bool,
    pub monitor: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            model_path: None,
            allowed_origins: Vec::new(),
            json_logs: false,
            verbose: false,
            monitor: false,
        }
    }
}

impl ConfigProvider for ServerSettings {
    fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn model_path(&self) -> Option<&str> {
        self.model_path.as_deref()
    }

    fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    fn monitor_enabled(&self) -> bool {
        self.monitor
    }
}

impl Validate for ServerSettings {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("server.host", &self.host)?;
        validate_positive_number("server.port", self.port as usize, 1)?;

        if let Some(path) = &self.model_path {
            validate_path("model.path", path)?;
            validate_file_extension("model.path", path, &["glb", "gltf"])?;
        }

        for origin in &self.allowed_origins {
            validate_url("cors.allowed_origins", origin)?;
            if origin.ends_with('/') {
                return Err(BouquetError::InvalidConfigValueError {
                    field: "cors.allowed_origins".to_string(),
                    value: origin.clone(),
                    reason: "An origin has no path; drop the trailing '/'".to_string(),
                });
            }
        }

        Ok(())
    }
}
