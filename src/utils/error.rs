use thiserror::Error;

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid signature: {reason}")]
    InvalidSignature { reason: String },

    #[error("Webhook verification failed")]
    VerificationFailed,

    #[error("Invalid payload: {message}")]
    PayloadError { message: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Background task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Authentication,
    Input,
    Storage,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl WebhookError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn payload(message: impl Into<String>) -> Self {
        Self::PayloadError {
            message: message.into(),
        }
    }

    pub fn invalid_signature(reason: impl Into<String>) -> Self {
        Self::InvalidSignature {
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::InvalidSignature { .. } | Self::VerificationFailed => {
                ErrorCategory::Authentication
            }
            Self::PayloadError { .. } | Self::SerializationError(_) | Self::NotFound { .. } => {
                ErrorCategory::Input
            }
            Self::DatabaseError(_) | Self::CsvError(_) | Self::LockPoisoned => {
                ErrorCategory::Storage
            }
            Self::IoError(_) | Self::TaskError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidSignature { .. }
            | Self::VerificationFailed
            | Self::PayloadError { .. }
            | Self::SerializationError(_) => ErrorSeverity::Low,
            Self::NotFound { .. } | Self::CsvError(_) => ErrorSeverity::Medium,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::DatabaseError(_) => ErrorSeverity::High,
            Self::IoError(_) | Self::LockPoisoned | Self::TaskError(_) => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for a binary that stops on this error.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low | ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::MissingConfigError { field } => {
                format!("Required setting '{}' was not provided", field)
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            Self::ConfigError { message } => format!("Configuration problem: {}", message),
            Self::DatabaseError(e) => format!("The conversation database failed: {}", e),
            Self::NotFound { what } => format!("{} does not exist", what),
            Self::IoError(e) => format!("File system error: {}", e),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::MissingConfigError { .. } => {
                "Set the value via command-line flag, environment variable or the .env file"
            }
            Self::InvalidConfigValueError { .. } | Self::ConfigError { .. } => {
                "Check the configuration file and environment variables"
            }
            Self::InvalidSignature { .. } => {
                "Make sure WHATSAPP_APP_SECRET matches the app secret in the Meta dashboard"
            }
            Self::VerificationFailed => {
                "Make sure WHATSAPP_VERIFY_TOKEN matches the token configured for the webhook"
            }
            Self::PayloadError { .. } | Self::SerializationError(_) => {
                "Send a valid JSON webhook payload"
            }
            Self::NotFound { .. } => "Check the path, or start the server once to create the database",
            Self::DatabaseError(_) | Self::LockPoisoned => {
                "Check that the database directory is writable and not used by another process"
            }
            Self::CsvError(_) | Self::IoError(_) => {
                "Check file permissions and available disk space"
            }
            Self::TaskError(_) => "Restart the service; the container policy will do this on crash",
        }
    }
}

pub type Result<T> = std::result::Result<T, WebhookError>;
