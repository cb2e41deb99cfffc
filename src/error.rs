//! Error types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// A key field was empty.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    /// Payload was not a well-formed JSON object.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

pub type KernelResult<T> = core::result::Result<T, KernelError>;
