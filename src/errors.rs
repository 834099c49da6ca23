//! Unified error types for Agro Inventory.
//!
//! `Error` is the crate-wide error returned by the core, the configuration
//! loaders and the bot commands. Sync-code failures and insight gateway
//! failures have their own enums so callers can tell them apart and turn them
//! into notices without touching inventory state.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Any failure reported by the database layer
    #[error("Database error: {0}")]
    Database(String),

    /// A category id (or name) did not resolve to a live category
    #[error("Category not found: {id}")]
    CategoryNotFound {
        /// The id or name that was looked up
        id: String,
    },

    /// A sync code could not be imported
    #[error("Invalid sync code: {0}")]
    Decode(#[from] DecodeError),

    /// JSON serialization of a collection failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A photo or background upload could not be fetched or encoded
    #[error("Photo error: {message}")]
    Photo {
        /// Description of the problem
        message: String,
    },

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required environment variable is missing
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Serenity/poise failure while talking to Discord
    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),
}

/// Why a sync code was rejected. Import is all-or-nothing: any of these
/// leaves the current inventory untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The code is not valid base64
    #[error("code is not valid base64: {0}")]
    Encoding(String),

    /// The decoded bytes are not UTF-8 text
    #[error("decoded code is not UTF-8 text")]
    Utf8,

    /// The decoded text is not JSON
    #[error("decoded code is not valid JSON: {0}")]
    Json(String),

    /// The JSON document is not an object
    #[error("sync payload must be a JSON object")]
    NotAnObject,

    /// A required top-level field is absent
    #[error("sync payload is missing `{0}`")]
    MissingField(&'static str),

    /// A field is present but has the wrong shape
    #[error("sync payload has an unrecognized shape: {0}")]
    Shape(String),

    /// An item points at a category that is not part of the payload
    #[error("item {item_id} references unknown category {category_id}")]
    OrphanItem {
        /// The offending item
        item_id: String,
        /// The category it references
        category_id: String,
    },
}

/// Failures of the AI insight gateway.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The same request is already in flight
    #[error("a request of this kind is already in progress")]
    Busy,

    /// No API key was configured
    #[error("the insight service is not configured")]
    NotConfigured,

    /// The service wants a different key, more permissions or active billing
    #[error("the insight service requires additional authorization or billing: {message}")]
    AuthorizationRequired {
        /// Message reported by the service
        message: String,
    },

    /// Any other non-success HTTP status
    #[error("the insight service answered {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Message reported by the service
        message: String,
    },

    /// The request never got an answer
    #[error("could not reach the insight service: {0}")]
    Transport(String),

    /// The answer could not be understood
    #[error("unexpected answer from the insight service: {0}")]
    Malformed(String),
}

impl From<sea_orm::DbErr> for Error {
    fn from(value: sea_orm::DbErr) -> Self {
        Self::Database(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::FrameworkError(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
