//! Error taxonomy shared by every engine operation

use crate::store::StoreError;

/// Why an operation was rejected; nothing is mutated for any variant
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GameError {
    /// Missing or malformed input, invalid self-target, fratricide attempt
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Wrong host, wrong role, dead caller, or Chieftain still alive
    #[error("Not allowed: {0}")]
    Authorization(String),

    /// Unknown match or player
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request does not fit the current sub-phase
    #[error("Conflict: {0}")]
    StateConflict(String),

    /// Storage failure; safe to retry from outside
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GameError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::StateConflict(msg.into())
    }
}

impl From<StoreError> for GameError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(code) => GameError::NotFound(format!("Match {} not found", code)),
            StoreError::Conflict => {
                GameError::StateConflict("Match changed before the write landed".to_string())
            }
            StoreError::Unavailable(msg) => GameError::Internal(msg),
        }
    }
}

pub type GameResult<T> = Result<T, GameError>;
