use crate::export::ExportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BouquetError {
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Missing required field: {field}")]
    MissingFieldError { field: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration not found: {id}")]
    NotFoundError { id: String },

    #[error("Scene transform error: {message}")]
    TransformError { message: String },

    #[error(transparent)]
    ExportError(#[from] ExportError),

    #[error("Base model load error: {message}")]
    ModelLoadError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BouquetError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 呼叫端輸入錯誤
    Input,
    NotFound,
    /// 場景轉換或輸出失敗
    Processing,
    /// 檔案、設定等系統層問題
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BouquetError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn transform(message: impl Into<String>) -> Self {
        Self::TransformError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ValidationError { .. }
            | Self::MissingFieldError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Input,
            Self::NotFoundError { .. } => ErrorCategory::NotFound,
            Self::TransformError { .. } | Self::ExportError(_) => ErrorCategory::Processing,
            Self::ModelLoadError { .. }
            | Self::ConfigError { .. }
            | Self::IoError(_)
            | Self::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::NotFound => ErrorSeverity::Low,
            ErrorCategory::Processing => ErrorSeverity::Medium,
            ErrorCategory::System => match self {
                Self::ConfigError { .. } | Self::ModelLoadError { .. } => ErrorSeverity::Critical,
                _ => ErrorSeverity::High,
            },
        }
    }

    /// HTTP 狀態碼對應
    pub fn status_code(&self) -> u16 {
        match self.category() {
            ErrorCategory::Input => 400,
            ErrorCategory::NotFound => 404,
            ErrorCategory::Processing | ErrorCategory::System => 500,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ValidationError { .. } | Self::MissingFieldError { .. } => {
                "Check the request body: balloonShapes and balloonColors are required"
            }
            Self::InvalidConfigValueError { .. } => {
                "Fix the offending value and submit again"
            }
            Self::NotFoundError { .. } => {
                "Save the configuration first; ids do not survive a server restart"
            }
            Self::TransformError { .. } => "Retry with a corrected configuration or base model",
            Self::ExportError(_) => "Retry the download; a fresh scene is prepared on every request",
            Self::ModelLoadError { .. } => {
                "Verify the base model path points to a readable .glb or .gltf file"
            }
            Self::ConfigError { .. } => "Check the TOML configuration file and command-line flags",
            Self::IoError(_) => "Check file permissions and that the path exists",
            Self::SerializationError(_) => "Make sure the payload is valid JSON",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("The configuration is invalid: {}", self),
            ErrorCategory::NotFound => format!("Nothing saved under that id: {}", self),
            ErrorCategory::Processing => format!("Could not build the bouquet model: {}", self),
            ErrorCategory::System => format!("Server problem: {}", self),
        }
    }
}
