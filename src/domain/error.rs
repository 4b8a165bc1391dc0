use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Please enter a link first.")]
    EmptyLink,

    #[error("Invalid link: {0}")]
    InvalidLink(String),

    #[error("Please fetch formats first.")]
    NoFormats,

    #[error("Please select a format.")]
    NoSelection,

    #[error("Format ID is missing.")]
    MissingFormatId,

    #[error("Error fetching formats: {0}")]
    Extraction(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("I/O error: {0}")]
    Io(String),
}
