//! Error types for the collection and execution engine

use thiserror::Error;
use uuid::Uuid;

/// Structural misuse of the collection tree
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("item {0} is not a group")]
    NotAGroup(Uuid),

    #[error("item {child} is not a child of {parent}")]
    ChildNotFound { parent: Uuid, child: Uuid },

    #[error("item {0} does not exist in the collection")]
    ItemNotFound(Uuid),

    #[error("the collection root cannot be changed this way")]
    RootItem,
}

/// Failures while authenticating a request
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no token response was received")]
    MissingTokenResponse,

    #[error("token request failed: {0}")]
    TokenRequest(String),

    #[error("failed to acquire token: HTTP {0}")]
    TokenStatus(u16),

    #[error("malformed token response: {0}")]
    MalformedToken(String),

    #[error("invalid authorization header: {0}")]
    InvalidHeader(String),
}

/// Outcome errors of an exchange, delivered only through the completion callback
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("request cancelled")]
    Cancelled,
}

impl ExchangeError {
    /// Cancellations are not failures and should not be shown as such
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExchangeError::Cancelled)
    }

    pub(crate) fn transport(err: reqwest::Error) -> Self {
        let msg = if err.is_timeout() {
            format!("timed out: {}", err)
        } else if err.is_connect() {
            format!("connection failed: {}", err)
        } else {
            err.to_string()
        };
        ExchangeError::Transport(msg)
    }
}

/// Synchronous rejection of a send
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("a request is already in progress")]
    AlreadyInProgress,
}

/// Persisted state could not be read or written
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt state file: {0}")]
    Corrupt(String),
}

/// A body could not be formatted
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("error reading body: {0}")]
    Body(#[from] reqwest::Error),
}
