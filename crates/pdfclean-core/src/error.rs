use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfCleanError {
    #[error("Failed to open PDF {path}: {reason}")]
    DocumentOpen { path: String, reason: String },

    #[error("Failed to save PDF {path}: {reason}")]
    DocumentSave { path: String, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid page range: {0}")]
    InvalidRange(String),

    #[error("Invalid clean plan: {0}")]
    Config(String),

    #[error("PDF operation failed: {0}")]
    Operation(String),
}
