use std::io;

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    /// Wrong password or corrupted ciphertext. The two are deliberately indistinguishable.
    #[error("Incorrect password.")]
    Authentication,
    #[error("Your unlock session has expired. Please unlock the note again.")]
    SessionExpired,
    #[error("{0}")]
    Validation(String),
    #[error("Note not found: {0}")]
    NotFound(Uuid),
    #[error("Encryption error: {0}")]
    Encryption(String),
    #[error("TUI error: {0}")]
    Tui(String),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("TOML deserialize error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl AppError {
    /// Errors the user can recover from by retrying, as opposed to I/O or config failures.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Authentication
                | AppError::SessionExpired
                | AppError::Validation(_)
                | AppError::NotFound(_)
        )
    }
}
