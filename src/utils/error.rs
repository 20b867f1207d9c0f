use crate::domain::model::RowIssue;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarksError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Failed to read spreadsheet: {0}")]
    XlsxReadError(#[from] calamine::XlsxError),

    #[error("Failed to write spreadsheet: {0}")]
    XlsxWriteError(#[from] rust_xlsxwriter::XlsxError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Template file '{path}' not found")]
    TemplateNotFound { path: String },

    #[error("Unsupported spreadsheet format: '{path}'")]
    UnsupportedFormat { path: String },

    #[error("Spreadsheet '{path}' has no worksheet or header row")]
    EmptyWorkbook { path: String },

    #[error("Spreadsheet must contain columns: {} (missing: {})", .required.join(", "), .missing.join(", "))]
    SchemaMismatch {
        required: Vec<String>,
        missing: Vec<String>,
    },

    #[error("{}", format_invalid_totals(.min, .max, .issues))]
    InvalidTotals {
        min: u32,
        max: u32,
        issues: Vec<RowIssue>,
    },

    #[error("Cannot generate marks for total: {total}")]
    DecompositionExhausted { row: usize, total: u32 },
}

fn format_invalid_totals(min: &u32, max: &u32, issues: &[RowIssue]) -> String {
    let mut message = format!(
        "The following rows have invalid totals (must be between {} and {}):\n",
        min, max
    );
    for issue in issues {
        message.push_str(&issue.to_string());
        message.push('\n');
    }
    message
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Processing,
    Configuration,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl MarksError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MarksError::SchemaMismatch { .. }
            | MarksError::InvalidTotals { .. }
            | MarksError::UnsupportedFormat { .. }
            | MarksError::EmptyWorkbook { .. }
            | MarksError::CsvError(_)
            | MarksError::XlsxReadError(_) => ErrorCategory::Input,
            MarksError::DecompositionExhausted { .. } => ErrorCategory::Processing,
            MarksError::ConfigError { .. }
            | MarksError::ConfigValidationError { .. }
            | MarksError::InvalidConfigValueError { .. }
            | MarksError::TemplateNotFound { .. } => ErrorCategory::Configuration,
            MarksError::IoError(_)
            | MarksError::XlsxWriteError(_)
            | MarksError::SerializationError(_) => ErrorCategory::Io,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Processing => ErrorSeverity::Medium,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MarksError::IoError(e) => format!("Could not access a file: {}", e),
            MarksError::XlsxReadError(_) | MarksError::CsvError(_) => {
                format!("The uploaded spreadsheet could not be read. {}", self)
            }
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            MarksError::SchemaMismatch { required, .. } => format!(
                "Start from the template and keep the header row: {}",
                required.join(", ")
            ),
            MarksError::InvalidTotals { min, max, .. } => format!(
                "Fill every Total with a whole number between {} and {}",
                min, max
            ),
            MarksError::DecompositionExhausted { .. } => {
                "Run again, raise --max-attempts, or use --strategy uniform".to_string()
            }
            MarksError::TemplateNotFound { .. } => {
                "Run `marks-generator template --init` to create the template".to_string()
            }
            MarksError::UnsupportedFormat { .. } => {
                "Use an .xlsx or .csv file".to_string()
            }
            MarksError::EmptyWorkbook { .. } => {
                "Make sure the first worksheet starts with the header row".to_string()
            }
            MarksError::ConfigError { .. }
            | MarksError::ConfigValidationError { .. }
            | MarksError::InvalidConfigValueError { .. } => {
                "Check the configuration file and command-line flags".to_string()
            }
            MarksError::XlsxReadError(_) | MarksError::CsvError(_) => {
                "Save the file again as .xlsx or .csv and retry".to_string()
            }
            MarksError::IoError(_)
            | MarksError::XlsxWriteError(_)
            | MarksError::SerializationError(_) => {
                "Check file permissions and free disk space".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, MarksError>;
