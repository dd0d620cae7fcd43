//! Common error types for the CMMC services

use thiserror::Error;

/// Common result type for CMMC operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the CMMC services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error while fetching a catalog
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Catalog fetch or parse failed; initialization cannot continue
    #[error("Failed to load practice catalogs: {0}")]
    CatalogLoad(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
