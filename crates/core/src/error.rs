use thiserror::Error;

/// Top-level error type used across the entire application.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid sample: {0}")]
    Sample(String),

    #[error("feed error: {0}")]
    Feed(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type Result<T, E = ForecastError> = std::result::Result<T, E>;
