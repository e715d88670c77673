//! Error types shared across the harness

use thiserror::Error;

/// Result type alias using the shared Error
pub type Result<T> = std::result::Result<T, Error>;

/// Shared error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config encode error: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnv(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Session state not found for role {role} at {path}")]
    SessionStateNotFound { role: String, path: String },

    #[error("Session state for role {role} is unreadable: {reason}")]
    SessionStateUnreadable { role: String, reason: String },

    #[error("Session state for role {role} is empty")]
    SessionStateEmpty { role: String },
}
