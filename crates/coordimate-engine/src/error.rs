//! Error types for coordimate-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Malformed availability window: {0}")]
    MalformedWindow(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid match options: {0}")]
    InvalidOptions(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
