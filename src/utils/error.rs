use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Report rendering failed: {0}")]
    RenderError(#[from] std::fmt::Error),

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

    #[error("Column '{column}' not found in {provider} data (available: {available})")]
    MissingColumnError {
        provider: String,
        column: String,
        available: String,
    },

    #[error("No usable trips for {provider}: {reason}")]
    EmptyDatasetError { provider: String, reason: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::IoError(e) if e.kind() == std::io::ErrorKind::NotFound => {
                ErrorCategory::Input
            }
            EtlError::CsvError(_)
            | EtlError::MissingColumnError { .. }
            | EtlError::ValidationError { .. } => ErrorCategory::Input,
            EtlError::EmptyDatasetError { .. } => ErrorCategory::Data,
            EtlError::ZipError(_)
            | EtlError::IoError(_)
            | EtlError::SerializationError(_)
            | EtlError::RenderError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Data => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 退出碼：1 配置/輸入、2 資料、3 系統；錯誤永不回傳 0
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::IoError(e) if e.kind() == std::io::ErrorKind::NotFound => {
                format!("Input or output file not found: {}", e)
            }
            EtlError::IoError(e) => format!("File system error: {}", e),
            EtlError::CsvError(e) => format!("Could not read CSV data: {}", e),
            EtlError::ZipError(e) => format!("Could not build the output bundle: {}", e),
            EtlError::SerializationError(e) => format!("Could not serialize the report: {}", e),
            EtlError::RenderError(e) => format!("Could not render the report: {}", e),
            EtlError::MissingColumnError {
                provider, column, ..
            } => format!("{} data has no '{}' column", provider, column),
            EtlError::EmptyDatasetError { provider, reason } => {
                format!("{} has no trips left after cleaning ({})", provider, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::IoError(e) if e.kind() == std::io::ErrorKind::NotFound => {
                "Check the dataset paths in the config file or pass --ola/--uber/--cab"
            }
            EtlError::IoError(_) => "Check file permissions and free disk space",
            EtlError::CsvError(_) => "Make sure the input is a comma-separated file with a header row",
            EtlError::ZipError(_) => "Disable compression in [report] or check the output directory",
            EtlError::SerializationError(_) => "Remove 'json' from report.output_formats and retry",
            EtlError::RenderError(_) => "Remove 'svg' from report.output_formats and retry",
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => {
                "Fix the configuration file and run with --dry-run to check it"
            }
            EtlError::MissingColumnError { .. } => {
                "Set fare_column / distance columns for this provider to match the CSV header"
            }
            EtlError::EmptyDatasetError { .. } => {
                "Inspect the dataset; run with --verbose to see how many rows each stage dropped"
            }
            EtlError::ValidationError { .. } => "Check the values passed on the command line",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
