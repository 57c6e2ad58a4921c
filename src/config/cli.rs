use super::settings::ServerSettings;
use super::toml_config::TomlConfig;
use crate::utils::error::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Parser)]
#[command(name = "bouquet-export")]
#[command(about = "Balloon bouquet configuration and glTF export server")]
pub struct CliConfig {
    #[arg(long, help = "TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, help = "Bind host (default 0.0.0.0)")]
    pub host: Option<String>,

    #[arg(long, help = "Bind port (default 3001)")]
    pub port: Option<u16>,

    #[arg(long, help = "Base model (.glb/.gltf); a procedural bouquet is used when omitted")]
    pub model: Option<String>,

    #[arg(long, value_delimiter = ',', help = "Comma-separated CORS origins; any origin when empty")]
    pub allowed_origins: Vec<String>,

    #[arg(long, help = "Log as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log process CPU/memory around exports")]
    pub monitor: bool,
}

impl CliConfig {
    /// defaults ← TOML 檔 ← 命令列
    pub fn resolve(&self) -> Result<ServerSettings> {
        let mut settings = match &self.config {
            Some(path) => TomlConfig::from_file(path)?.into_settings(),
            None => ServerSettings::default(),
        };

        if let Some(host) = &self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(model) = &self.model {
            settings.model_path = Some(model.clone());
        }
        if !self.allowed_origins.is_empty() {
            settings.allowed_origins = self.allowed_origins.clone();
        }
        settings.json_logs |= self.json_logs;
        settings.verbose |= self.verbose;
        settings.monitor |= self.monitor;

        Ok(settings)
    }
}
