use thiserror::Error;

/// Errors surfaced by the record store and its configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineBookError {
    /// Phone number failed format validation. The message is user-facing.
    #[error("{message}")]
    InvalidPhoneNumber { input: String, message: String },

    /// The storage adapter rejected a write.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),
}
