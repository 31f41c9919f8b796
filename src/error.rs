use crate::validation::ValidationReport;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExpenseTrackerError {
    #[error("Expense text is empty")]
    EmptyText,

    #[error("Missing or invalid start month '{0}': expected YYYY-MM")]
    InvalidMonth(String),

    #[error("Could not understand the expense. Try describing the amount and what it was for.")]
    ExtractionFailed,

    #[error("Extraction service unavailable: {0}")]
    ExtractionUnavailable(String),

    #[error("Extracted expense failed validation: {0}")]
    Validation(ValidationReport),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "gemini")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ExpenseTrackerError>;
