//! Error taxonomy for the pet engine
//!
//! Critical stats, death and "no pet yet" are ordinary states, not errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PetError {
    /// Store unreachable or a write failed. Non-fatal while ticking.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Rejected at the boundary before touching the record.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The action needs a pet but the user has none.
    #[error("no pet record for user {0}")]
    NotFound(String),

    #[error("metrics error: {0}")]
    Metrics(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// A thread panicked while holding the session.
    #[error("pet session poisoned")]
    Poisoned,
}

impl From<std::io::Error> for PetError {
    fn from(err: std::io::Error) -> Self {
        PetError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for PetError {
    fn from(err: serde_json::Error) -> Self {
        PetError::Persistence(format!("JSON error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, PetError>;
