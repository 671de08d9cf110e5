use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid date range: {0}")]
    DateRangeParse(String),

    #[error("Invalid filter value for {field}: {value}")]
    InvalidFilter { field: String, value: String },

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
