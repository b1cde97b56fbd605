//! Error types for branch construction, action creation and id generation

use thiserror::Error;

/// Errors that can occur while building a branch or creating actions
#[derive(Debug, Error)]
pub enum BranchError {
    /// A caller-supplied value does not have the required shape,
    /// e.g. an update item without an `id`
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The operating system could not provide secure random bytes
    #[error("Secure random source unavailable: {0}")]
    UnavailableRandomSource(getrandom::Error),

    /// Branch options are inconsistent (empty name, malformed default state)
    #[error("Invalid branch configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse branch configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to read branch configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Error raised by a caller-supplied action, passed through untouched
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}

impl BranchError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

pub type Result<T, E = BranchError> = std::result::Result<T, E>;
