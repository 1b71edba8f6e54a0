use thiserror::Error;

#[derive(Error, Debug)]
pub enum NutriError {
    #[error("Detector request failed: {0}")]
    DetectorRequestError(#[from] reqwest::Error),

    #[error("Detector returned {status}: {message}")]
    DetectorError { status: u16, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid input: {message}")]
    InputError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl NutriError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            NutriError::DetectorRequestError(_) | NutriError::DetectorError { .. } => {
                ErrorCategory::Network
            }
            NutriError::ConfigValidationError { .. }
            | NutriError::InvalidConfigValueError { .. }
            | NutriError::MissingConfigError { .. } => ErrorCategory::Configuration,
            NutriError::SerializationError(_) | NutriError::InputError { .. } => {
                ErrorCategory::Data
            }
            NutriError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 偵測服務可重試
            NutriError::DetectorRequestError(_) => ErrorSeverity::Medium,
            NutriError::DetectorError { status, .. } if *status >= 500 => ErrorSeverity::Medium,
            NutriError::DetectorError { .. } => ErrorSeverity::High,
            NutriError::SerializationError(_) | NutriError::InputError { .. } => {
                ErrorSeverity::High
            }
            NutriError::ConfigValidationError { .. }
            | NutriError::InvalidConfigValueError { .. }
            | NutriError::MissingConfigError { .. } => ErrorSeverity::High,
            NutriError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            NutriError::DetectorRequestError(_) => {
                "Could not reach the food detection service".to_string()
            }
            NutriError::DetectorError { status, .. } => {
                format!("Food detection service rejected the request (HTTP {})", status)
            }
            NutriError::IoError(e) => format!("File access failed: {}", e),
            NutriError::SerializationError(_) => "Received malformed JSON data".to_string(),
            NutriError::ConfigValidationError { field, .. }
            | NutriError::InvalidConfigValueError { field, .. }
            | NutriError::MissingConfigError { field } => {
                format!("Configuration problem with '{}'", field)
            }
            NutriError::InputError { message } => message.clone(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check the detection endpoint and retry the scan",
            ErrorCategory::Configuration => "Fix the configuration file and run again",
            ErrorCategory::Data => "Check the input format (nutrient maps must be JSON objects)",
            ErrorCategory::System => "Check file paths and permissions",
        }
    }
}

pub type Result<T> = std::result::Result<T, NutriError>;
