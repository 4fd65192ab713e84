use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatcherError {
    #[error("Source unavailable: {path}: {message}")]
    SourceUnavailable { path: String, message: String },

    #[error("Table schema mismatch: {message}")]
    SchemaMismatch { message: String },

    #[error("Malformed record at row {row}: {message}")]
    MalformedRecord { row: usize, message: String },

    #[error("Failed to persist {path}: {message}")]
    WriteFailure { path: String, message: String },

    #[error("Unsupported table format: {path}")]
    UnsupportedFormat { path: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Source,
    Data,
    Persistence,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MatcherError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MatcherError::SourceUnavailable { .. }
            | MatcherError::SchemaMismatch { .. }
            | MatcherError::IoError(_) => ErrorCategory::Source,
            MatcherError::MalformedRecord { .. }
            | MatcherError::CsvError(_)
            | MatcherError::SerializationError(_) => ErrorCategory::Data,
            MatcherError::WriteFailure { .. } => ErrorCategory::Persistence,
            MatcherError::UnsupportedFormat { .. }
            | MatcherError::ConfigError { .. }
            | MatcherError::ConfigValidationError { .. }
            | MatcherError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 單筆壞資料只會被略過
            ErrorCategory::Data => ErrorSeverity::Low,
            // 來源不可用時系統降級為空資料繼續服務
            ErrorCategory::Source => ErrorSeverity::Medium,
            ErrorCategory::Persistence => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MatcherError::SourceUnavailable { .. } | MatcherError::IoError(_) => {
                "Check that the data directory and input files exist and are readable"
            }
            MatcherError::SchemaMismatch { .. } => {
                "Check that the file has a header row naming the required columns"
            }
            MatcherError::MalformedRecord { .. }
            | MatcherError::CsvError(_)
            | MatcherError::SerializationError(_) => {
                "Check the header row and that every row has the required columns"
            }
            MatcherError::WriteFailure { .. } => {
                "Check write permissions and that the mapping table is not corrupted"
            }
            MatcherError::UnsupportedFormat { .. } => "Use a .csv, .tsv or .json file",
            MatcherError::ConfigError { .. }
            | MatcherError::ConfigValidationError { .. }
            | MatcherError::InvalidConfigValueError { .. } => {
                "Review the configuration file and command line flags"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MatcherError::WriteFailure { path, .. } => {
                format!("The decision could not be saved to {}", path)
            }
            MatcherError::SourceUnavailable { path, .. } => {
                format!("Input file {} could not be read", path)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MatcherError>;
