use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImporterError>;

/// Failures that abort a whole import or export. Per-row problems never
/// surface here; they are collected into the import summary instead.
#[derive(Error, Debug)]
pub enum ImporterError {
    #[error("No file provided")]
    MissingFile,

    #[error("File must be a CSV")]
    NotCsv,

    #[error("Error processing CSV: {0}")]
    Decode(#[from] std::str::Utf8Error),

    #[error("Error processing CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
