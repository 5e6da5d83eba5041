//! Error types for the statemux store.

use crate::types::ProviderId;
use thiserror::Error;

/// Failures raised by a single value codec.
///
/// Codecs know nothing about keys; `Schema` attaches the key when wrapping
/// these into a `SchemaError`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("expected a {expected} value, got {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("cannot decode {raw:?} as {kind}: {reason}")]
    Invalid {
        kind: &'static str,
        raw: String,
        reason: String,
    },
}

/// Schema-related errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("Unknown schema key: {0}")]
    UnknownKey(String),

    #[error("Duplicate schema key: {0}")]
    DuplicateKey(String),

    #[error("Failed to encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: CodecError,
    },

    /// Recoverable: reconciliation replaces the value with the key's default.
    #[error("Failed to decode '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: CodecError,
    },

    #[error("Default for '{key}' does not fit its codec: {source}")]
    TypeMismatch {
        key: String,
        #[source]
        source: CodecError,
    },

    #[error("Invalid schema configuration: {0}")]
    InvalidConfig(String),
}

/// Store-related errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Provider already registered using the same name: {key}")]
    RegistrationConflict { key: String },

    #[error("Unregistered provider attempting to update state")]
    UnregisteredProvider(ProviderId),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

/// Configuration and logging setup errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}
