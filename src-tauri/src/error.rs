// Crate-wide error type.
// Navigation commands never produce these; they are for IO, configuration
// and module content failing inside its fault boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("module `{0}` is registered more than once")]
    DuplicateModule(String),

    #[error("no content registered for module `{0}`")]
    NoContent(String),

    /// Raised by module content while constructing or rendering.
    #[error("{0}")]
    Module(String),

    #[error("backend command `{command}` failed: {message}")]
    Command { command: String, message: String },
}

impl Error {
    pub fn module(message: impl Into<String>) -> Self {
        Self::Module(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
