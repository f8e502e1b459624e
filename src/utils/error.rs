use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Camera permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Unsupported input: {reason}")]
    UnsupportedInput { reason: String },

    #[error("Enrichment failed: {reason}")]
    EnrichmentFailed { reason: String },

    #[error("Validation error on '{field}': {message}")]
    ValidationError { field: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Device,
    Input,
    Enrichment,
    Validation,
    System,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MarketError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn enrichment(reason: impl Into<String>) -> Self {
        Self::EnrichmentFailed {
            reason: reason.into(),
        }
    }

    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::UnsupportedInput {
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::PermissionDenied { .. } => ErrorCategory::Device,
            Self::UnsupportedInput { .. } => ErrorCategory::Input,
            Self::EnrichmentFailed { .. } => ErrorCategory::Enrichment,
            Self::ValidationError { .. } => ErrorCategory::Validation,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::System,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 這幾類都不會中斷 session，表單保持開啟
            ErrorCategory::Device | ErrorCategory::Enrichment => ErrorSeverity::Low,
            ErrorCategory::Input | ErrorCategory::Validation => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 使用者可以自行排除 (改用檔案、手動填寫、補上欄位) 的錯誤
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Device
                | ErrorCategory::Input
                | ErrorCategory::Enrichment
                | ErrorCategory::Validation
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::PermissionDenied { .. } => {
                "Could not access camera. Please check permissions.".to_string()
            }
            Self::UnsupportedInput { reason } => {
                format!("That file could not be used as a photo ({})", reason)
            }
            Self::EnrichmentFailed { .. } => {
                "AI analysis is unavailable right now; fill in the details manually.".to_string()
            }
            Self::ValidationError { field, message } => {
                format!("Please check the {} field: {}", field, message)
            }
            Self::IoError(e) => format!("A file operation failed: {}", e),
            Self::SerializationError(e) => format!("Stored data could not be read: {}", e),
            Self::ConfigError { message } => format!("Configuration problem: {}", message),
            Self::ConfigValidationError { field, message } => {
                format!("Configuration problem in {}: {}", field, message)
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration value for {} is invalid: {}", field, reason)
            }
            Self::MissingConfigError { field } => {
                format!("Configuration value {} is required", field)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Device => "Upload a photo from a file instead of using the camera",
            ErrorCategory::Input => "Choose a JPEG, PNG or WebP image under the size limit",
            ErrorCategory::Enrichment => {
                "Check the API key and network, or enter title, price and category by hand"
            }
            ErrorCategory::Validation => "Complete the highlighted field and submit again",
            ErrorCategory::System => "Check file permissions of the state directory",
            ErrorCategory::Configuration => "Review the command-line flags or the TOML config",
        }
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;
