//! Shared error types for the bench workspace

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Serialization failed: {message}")]
    SerializationError { message: String },

    #[error("Invalid label name: {input}")]
    InvalidLabel { input: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
