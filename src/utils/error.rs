use thiserror::Error;

#[derive(Error, Debug)]
pub enum CepError {
    #[error("Request to {source_name} failed: {message}")]
    RequestError {
        source_name: String,
        message: String,
    },

    #[error("Failed to decode response from {source_name}: {message}")]
    DecodeError {
        source_name: String,
        message: String,
    },

    #[error("{source_name} has no address for CEP {cep}")]
    NotFoundError { source_name: String, cep: String },

    #[error("No source responded within {timeout_ms}ms")]
    TimeoutError { timeout_ms: u64 },

    #[error("All {} sources failed: {}", .failures.len(), summarize(.failures))]
    AllSourcesFailed {
        failures: Vec<crate::domain::model::SourceFailure>,
    },

    #[error("Invalid input: {message}")]
    InvalidInputError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CepError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Source,
    Race,
    Config,
    System,
}

fn summarize(failures: &[crate::domain::model::SourceFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("[{}] {}", f.source_name, f.cause))
        .collect::<Vec<_>>()
        .join("; ")
}

impl CepError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CepError::InvalidInputError { .. } => ErrorCategory::Input,
            CepError::RequestError { .. }
            | CepError::DecodeError { .. }
            | CepError::NotFoundError { .. } => ErrorCategory::Source,
            CepError::TimeoutError { .. } | CepError::AllSourcesFailed { .. } => {
                ErrorCategory::Race
            }
            CepError::ConfigError { .. } | CepError::InvalidConfigValueError { .. } => {
                ErrorCategory::Config
            }
            CepError::HttpClientError(_)
            | CepError::IoError(_)
            | CepError::SerializationError(_) => ErrorCategory::System,
        }
    }

    /// 來源層級的錯誤只代表該來源輸掉競賽，不會中止其他來源
    pub fn is_source_local(&self) -> bool {
        self.category() == ErrorCategory::Source
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CepError::InvalidInputError { .. } => 2,
            CepError::TimeoutError { .. } => 3,
            CepError::AllSourcesFailed { .. } => 4,
            _ => 1,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CepError::InvalidInputError { message } => format!("Invalid CEP: {}", message),
            CepError::TimeoutError { timeout_ms } => {
                format!("No CEP service answered within {}ms", timeout_ms)
            }
            CepError::AllSourcesFailed { failures } => format!(
                "None of the {} CEP services could answer: {}",
                failures.len(),
                summarize(failures)
            ),
            CepError::ConfigError { .. } | CepError::InvalidConfigValueError { .. } => {
                format!("Configuration problem: {}", self)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CepError::InvalidInputError { .. } => {
                "Pass a CEP with 8 digits, e.g. 01001000 or 01001-000"
            }
            CepError::TimeoutError { .. } => {
                "Check your network connection or raise --timeout-ms"
            }
            CepError::AllSourcesFailed { .. } => {
                "Verify the CEP exists and that the configured services are reachable"
            }
            CepError::RequestError { .. } | CepError::HttpClientError(_) => {
                "Check network connectivity and the source URL"
            }
            CepError::DecodeError { .. } => "Check the source kind matches its response format",
            CepError::NotFoundError { .. } => "Verify the CEP exists",
            CepError::ConfigError { .. } | CepError::InvalidConfigValueError { .. } => {
                "Review the configuration file and command line options"
            }
            CepError::IoError(_) => "Check file paths and permissions",
            CepError::SerializationError(_) => "Report this as a bug",
        }
    }
}
