//! Error types for labelmesh

use thiserror::Error;

/// Main error type for labelmesh operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid partition config: {0}")]
    InvalidPartitionConfig(String),

    #[error("Invalid extraction config: {0}")]
    InvalidExtractionConfig(String),

    #[error("Extraction task for chunk {chunk} at stride {stride:?} failed: {message}")]
    ExtractionTaskFailure {
        chunk: usize,
        stride: [i64; 3],
        message: String,
    },

    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for labelmesh operations
pub type Result<T> = std::result::Result<T, Error>;
