use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpdaterError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Cannot read input file '{path}': {source}")]
    InputFileError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed line {line}: {reason}")]
    MalformedLineError { line: u64, reason: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Could not connect to {server}: {reason}")]
    ConnectionFailed { server: String, reason: String },

    #[error("Not connected to the remote system")]
    NotConnected,

    #[error("Remote system returned {status}: {message}")]
    RemoteError { status: u16, message: String },

    #[error("Invalid value '{value}' for field {field}: {reason}")]
    InvalidFieldValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Network,
    Remote,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl UpdaterError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            UpdaterError::ConfigError { .. }
            | UpdaterError::InvalidConfigValueError { .. }
            | UpdaterError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            UpdaterError::CsvError(_)
            | UpdaterError::IoError(_)
            | UpdaterError::InputFileError { .. }
            | UpdaterError::MalformedLineError { .. } => ErrorCategory::Input,
            UpdaterError::ApiError(_)
            | UpdaterError::ConnectionFailed { .. }
            | UpdaterError::NotConnected => ErrorCategory::Network,
            UpdaterError::RemoteError { .. } => ErrorCategory::Remote,
            UpdaterError::InvalidFieldValue { .. }
            | UpdaterError::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            UpdaterError::InvalidFieldValue { .. } => ErrorSeverity::Low,
            UpdaterError::ApiError(_)
            | UpdaterError::ConnectionFailed { .. }
            | UpdaterError::NotConnected
            | UpdaterError::RemoteError { .. } => ErrorSeverity::Medium,
            UpdaterError::ConfigError { .. }
            | UpdaterError::InvalidConfigValueError { .. }
            | UpdaterError::ConfigValidationError { .. }
            | UpdaterError::CsvError(_)
            | UpdaterError::InputFileError { .. }
            | UpdaterError::MalformedLineError { .. }
            | UpdaterError::ProcessingError { .. } => ErrorSeverity::High,
            UpdaterError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the command line arguments and the configuration file"
            }
            ErrorCategory::Input => "Check that the CSV file exists and every line starts with an item code",
            ErrorCategory::Network => {
                "Check the server address, the credentials and that the Service Layer is reachable"
            }
            ErrorCategory::Remote => "Check the remote system's error message and the user's permissions",
            ErrorCategory::Processing => "Check the values in the CSV file",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            UpdaterError::InputFileError { path, .. } => {
                format!("The CSV file '{}' could not be opened", path)
            }
            UpdaterError::MalformedLineError { line, reason } => {
                format!("Line {} of the CSV file is malformed: {}", line, reason)
            }
            UpdaterError::ConnectionFailed { server, reason } => {
                format!("Connecting to {} failed: {}", server, reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, UpdaterError>;
