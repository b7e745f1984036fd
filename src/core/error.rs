//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Minimum level outside the six known severities
    #[error("Invalid LOG_LEVEL: '{value}'. Must be one of: trace, debug, info, warn, error, fatal")]
    InvalidLevel { value: String },

    /// Output format other than pretty/json
    #[error("Invalid LOG_FORMAT: '{value}'. Must be one of: pretty, json")]
    InvalidFormat { value: String },

    /// Size ceiling outside 1..=1048576
    #[error("Invalid MAX_LOG_SIZE: {value}. Must be between 1 and {max} bytes")]
    InvalidMaxLogSize { value: i64, max: i64 },

    /// Blank service name
    #[error("LOG_SERVICE_NAME cannot be empty")]
    EmptyServiceName,

    /// A setting whose raw value could not be parsed
    #[error("Invalid value for {key}: '{value}'")]
    InvalidSetting { key: String, value: String },

    /// Formatter error with format type
    #[error("Formatter error ({format_type}): {message}")]
    FormatterError {
        format_type: String,
        message: String,
    },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    pub fn invalid_level(value: impl Into<String>) -> Self {
        LoggerError::InvalidLevel {
            value: value.into(),
        }
    }

    pub fn invalid_format(value: impl Into<String>) -> Self {
        LoggerError::InvalidFormat {
            value: value.into(),
        }
    }

    pub fn invalid_setting(key: impl Into<String>, value: impl Into<String>) -> Self {
        LoggerError::InvalidSetting {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a formatter error
    pub fn formatter(format_type: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FormatterError {
            format_type: format_type.into(),
            message: message.into(),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Whether this error was raised while validating configuration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LoggerError::InvalidLevel { .. }
                | LoggerError::InvalidFormat { .. }
                | LoggerError::InvalidMaxLogSize { .. }
                | LoggerError::EmptyServiceName
                | LoggerError::InvalidSetting { .. }
        )
    }
}
