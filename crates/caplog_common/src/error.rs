use std::fmt;
use thiserror::Error;

/// The base error type for the caplog data layer.
///
/// This enum provides a common set of error variants shared by all crates in
/// the workspace. Gateway implementations map their wire-level failures onto
/// these variants so callers can match on domain meaning rather than on
/// transport detail.
#[derive(Error, Debug)]
pub enum CaplogError {
    /// Error occurred during an HTTP request
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    Parse(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error occurred during authentication or authorization
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Error occurred during validation, before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Error occurred during an external service call
    #[error("External service error: {service_name} - {message}")]
    ExternalService {
        service_name: String,
        message: String,
    },

    /// A uniqueness constraint was violated (e.g. second record for one day).
    /// This is a domain error, never a transport error.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A required resource was not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CaplogError {
    /// Whether the create-record retry policy may attempt this error again.
    ///
    /// Only transport-level failures qualify; domain errors (conflict,
    /// validation, auth) are final on first occurrence.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CaplogError::Http(_) | CaplogError::ExternalService { .. }
        )
    }
}

/// A trait for adding context to errors.
pub trait Context<T, E> {
    /// Adds context to an error.
    fn context<C>(self, context: C) -> Result<T, CaplogError>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Adds context to an error with a lazy context provider.
    fn with_context<C, F>(self, f: F) -> Result<T, CaplogError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E: std::error::Error + Send + Sync + 'static> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, CaplogError>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|error| CaplogError::Internal(format!("{}: {}", context, error)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, CaplogError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|error| CaplogError::Internal(format!("{}: {}", f(), error)))
    }
}

// Common error conversions
impl From<reqwest::Error> for CaplogError {
    fn from(err: reqwest::Error) -> Self {
        CaplogError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for CaplogError {
    fn from(err: serde_json::Error) -> Self {
        CaplogError::Parse(err.to_string())
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> CaplogError {
    CaplogError::Config(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> CaplogError {
    CaplogError::Validation(message.to_string())
}

pub fn auth_error<T: fmt::Display>(message: T) -> CaplogError {
    CaplogError::Auth(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> CaplogError {
    CaplogError::NotFound(message.to_string())
}

pub fn conflict<T: fmt::Display>(message: T) -> CaplogError {
    CaplogError::Conflict(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> CaplogError {
    CaplogError::ExternalService {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}

pub fn internal_error<T: fmt::Display>(message: T) -> CaplogError {
    CaplogError::Internal(message.to_string())
}
