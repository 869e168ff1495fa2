use thiserror::Error;

/// Top-level error type for the innkeep runtime.
#[derive(Debug, Error)]
pub enum InnkeepError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("PMS API error ({status}): {message}")]
    Pms { status: u16, message: String },

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("browser automation error: {0}")]
    Browser(String),

    #[error("channel error: {0}")]
    Channel(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
