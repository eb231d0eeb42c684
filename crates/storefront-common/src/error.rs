//! Common error types used throughout storefront.
//!
//! This module provides a unified error type that covers common failure cases
//! such as not found, unauthorized access, database errors, and I/O failures.

/// Common error type for storefront.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested record was not found.
    #[error("{0} not found")]
    NotFound(String),

    /// The caller is not authenticated.
    #[error("{0}")]
    Unauthorized(String),

    /// A database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input was provided.
    #[error("{0}")]
    InvalidInput(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(what: S) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a new Unauthorized error.
    pub fn unauthorized<S: Into<String>>(msg: S) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a new Database error.
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status code this error maps to.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Unauthorized(_) => 401,
            Self::InvalidInput(_) => 400,
            Self::Database(_) | Self::Io(_) | Self::Internal(_) => 500,
        }
    }

    /// Short machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::InvalidInput(_) => "invalid_input",
            Self::Database(_) => "database_error",
            Self::Io(_) => "io_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("Product");
        assert_eq!(err.to_string(), "Product not found");

        let err = Error::unauthorized("Invalid admin token");
        assert_eq!(err.to_string(), "Invalid admin token");

        let err = Error::database("connection failed");
        assert_eq!(err.to_string(), "Database error: connection failed");

        let err = Error::invalid_input("Price must be positive");
        assert_eq!(err.to_string(), "Price must be positive");

        let err = Error::internal("unexpected state");
        assert_eq!(err.to_string(), "Internal error: unexpected state");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(Error::not_found("x").http_status(), 404);
        assert_eq!(Error::unauthorized("x").http_status(), 401);
        assert_eq!(Error::invalid_input("x").http_status(), 400);
        assert_eq!(Error::database("x").http_status(), 500);
        assert_eq!(Error::internal("x").http_status(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::not_found("x").code(), "not_found");
        assert_eq!(Error::unauthorized("x").code(), "unauthorized");
        assert_eq!(Error::invalid_input("x").code(), "invalid_input");
        assert_eq!(Error::database("x").code(), "database_error");
    }
}
