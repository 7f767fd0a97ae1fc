//! Error types for ghvis.
//!
//! This module provides a unified error type with explicit variants for
//! input validation, decryption, storage, remote and transport failures.

use std::fmt;
use thiserror::Error;

/// The unified error type for ghvis operations.
///
/// Callers match on the variant to tell "no active credential" (an `Ok(None)`
/// elsewhere) apart from "the stored credential cannot be decrypted".
#[derive(Debug, Error)]
pub enum Error {
    /// Input validation errors (bad repository identifier, oversized batch).
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Stored ciphertext could not be decrypted with the current key.
    #[error("decryption failed: {0}")]
    Decryption(#[from] DecryptionError),

    /// Persistence collaborator failures.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Non-success responses from the remote service.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Missing or malformed configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Invalid repository identifier.
    #[error("invalid repository '{value}': {reason}")]
    Repository { value: String, reason: String },

    /// Invalid credential name.
    #[error("invalid credential name '{value}': {reason}")]
    CredentialName { value: String, reason: String },

    /// Invalid tenant identifier.
    #[error("invalid tenant id '{value}'")]
    Tenant { value: String },

    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// A batch names more distinct repositories than allowed.
    #[error("batch contains {count} repositories, maximum is {max}")]
    BatchTooLarge { count: usize, max: usize },

    /// A batch names no repositories at all.
    #[error("batch contains no repositories")]
    EmptyBatch,

    /// Token contains characters that cannot be sent in a header.
    #[error("token contains invalid characters")]
    TokenCharacters,

    /// Generic invalid input.
    #[error("{message}")]
    Other { message: String },
}

/// Failures turning a stored ciphertext back into a secret.
#[derive(Debug, Error)]
pub enum DecryptionError {
    /// The token is not valid base64.
    #[error("ciphertext is not valid base64")]
    Encoding,

    /// The token is too short to contain a nonce and tag.
    #[error("ciphertext is truncated ({len} bytes)")]
    Truncated { len: usize },

    /// Authentication failed: wrong key or tampered ciphertext.
    #[error("ciphertext failed authentication (wrong key or tampered data)")]
    Authentication,

    /// The decrypted bytes are not UTF-8.
    #[error("decrypted secret is not valid UTF-8")]
    Utf8,
}

/// Persistence collaborator failures.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem or device error.
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Stored data could not be encoded or decoded.
    #[error("corrupt data in {location}: {message}")]
    Corrupt { location: String, message: String },

    /// Encryption of a secret failed before it could be stored.
    #[error("encryption failed")]
    Encryption,

    /// A lock guarding shared state was poisoned.
    #[error("store lock poisoned")]
    Poisoned,
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io {
            message: err.to_string(),
        }
    }
}

/// Non-success response from the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    /// HTTP status code.
    pub status: u16,
    /// Human-readable message from the remote payload, verbatim.
    pub message: String,
}

impl RemoteError {
    /// Create a new remote error.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Create a remote error for a response without a readable payload.
    pub fn from_status(status: u16) -> Self {
        Self::new(status, format!("HTTP {}", status))
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        self.status == 401
    }

    /// Check if this response means the entity does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}: {}", self.status, self.message)
    }
}

impl std::error::Error for RemoteError {}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Response body could not be decoded.
    #[error("unreadable response: {message}")]
    Decode { message: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting is not present.
    #[error("missing required setting {name}")]
    Missing { name: &'static str },

    /// A setting is present but malformed.
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
