use thiserror::Error;

/// Errors raised while decoding protocol-level values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown sort field: {0}")]
    UnknownSortField(String),

    #[error("unknown sort direction: {0}")]
    UnknownSortDirection(String),

    #[error("unknown flag filter: {0}")]
    UnknownFlagFilter(String),
}
