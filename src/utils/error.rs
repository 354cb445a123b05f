use thiserror::Error;

#[derive(Error, Debug)]
pub enum SantaError {
    #[error("Unsupported file format '{extension}' for file {file_name}")]
    UnsupportedFormat { file_name: String, extension: String },

    #[error("Failed to parse {encoding} file: {message}")]
    ParseError { encoding: String, message: String },

    #[error("Missing required columns: {}", missing.join(", "))]
    SchemaError {
        required: Vec<String>,
        missing: Vec<String>,
    },

    #[error("Found {found} employees with valid email addresses, at least {required} required")]
    CardinalityError { found: usize, required: usize },

    #[error("Remote assignment call failed{}: {message}", status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    RemoteCallError { status: Option<u16>, message: String },

    #[error("Failed to serialize {encoding} export: {message}")]
    SerializeError { encoding: String, message: String },

    #[error("A {action} is already in progress")]
    Busy { action: &'static str },

    #[error("No assignments available to export")]
    NoAssignments,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for {field}: {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

impl From<reqwest::Error> for SantaError {
    fn from(err: reqwest::Error) -> Self {
        SantaError::RemoteCallError {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Validation,
    Remote,
    Export,
    Session,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SantaError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SantaError::UnsupportedFormat { .. } | SantaError::ParseError { .. } => {
                ErrorCategory::Input
            }
            SantaError::SchemaError { .. } | SantaError::CardinalityError { .. } => {
                ErrorCategory::Validation
            }
            SantaError::RemoteCallError { .. } => ErrorCategory::Remote,
            SantaError::SerializeError { .. } => ErrorCategory::Export,
            SantaError::Busy { .. } | SantaError::NoAssignments => ErrorCategory::Session,
            SantaError::ConfigError { .. }
            | SantaError::InvalidConfigValueError { .. }
            | SantaError::MissingConfigError { .. } => ErrorCategory::Configuration,
            SantaError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Session => ErrorSeverity::Low,
            ErrorCategory::Remote => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Validation | ErrorCategory::Export => {
                ErrorSeverity::High
            }
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 給使用者看的訊息，經由 notify 通道送出
    pub fn user_friendly_message(&self) -> String {
        match self {
            SantaError::UnsupportedFormat { .. } => {
                "Please upload either a CSV or XLSX file".to_string()
            }
            SantaError::ParseError { encoding, .. } => {
                format!("Error reading {} file. Please check the format.", encoding)
            }
            SantaError::SchemaError { required, .. } => {
                let quoted: Vec<String> = required.iter().map(|c| format!("\"{}\"", c)).collect();
                format!(
                    "Please ensure the file contains the columns {}",
                    quoted.join(" and ")
                )
            }
            SantaError::CardinalityError { required, .. } => format!(
                "Please ensure there are at least {} employees with valid email addresses.",
                required
            ),
            SantaError::RemoteCallError { message, .. } => format!("Error: {}", message),
            SantaError::SerializeError { encoding, .. } => {
                format!("Failed to download {} file", encoding)
            }
            SantaError::Busy { action } => format!("Please wait, a {} is still running", action),
            SantaError::NoAssignments => {
                "Generate Secret Santa assignments before downloading".to_string()
            }
            SantaError::IoError(e) => format!("File system error: {}", e),
            SantaError::ConfigError { message } => format!("Configuration problem: {}", message),
            SantaError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid value for {}: {}", field, reason)
            }
            SantaError::MissingConfigError { field } => {
                format!("Missing required setting: {}", field)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SantaError::UnsupportedFormat { .. } => "Save the roster as .csv or .xlsx and retry",
            SantaError::ParseError { .. } => {
                "Re-export the roster from your spreadsheet tool as UTF-8 CSV or XLSX"
            }
            SantaError::SchemaError { .. } => {
                "Rename the header row to Employee_Name and Employee_EmailID"
            }
            SantaError::CardinalityError { .. } => {
                "Add more employees or fix their email addresses"
            }
            SantaError::RemoteCallError { .. } => {
                "Check that the assignment service is reachable and try again"
            }
            SantaError::SerializeError { .. } => "Try exporting in the other format",
            SantaError::Busy { .. } => "Wait for the running action to finish",
            SantaError::NoAssignments => "Run the generation step first",
            SantaError::IoError(_) => "Check file paths and permissions",
            SantaError::ConfigError { .. }
            | SantaError::InvalidConfigValueError { .. }
            | SantaError::MissingConfigError { .. } => {
                "Review the command line flags and configuration file"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SantaError>;
