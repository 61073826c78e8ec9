use std::fmt;
use serde::Serialize;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error, Clone, Serialize)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {message}")]
    Io {
        path: String,
        message: String,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unknown compression level: {0}")]
    UnknownLevel(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(error: serde_json::Error) -> Self {
        ConfigError::Parse(error.to_string())
    }
}

/// Domain-level errors
#[derive(Debug, Error, Clone, Serialize)]
pub enum DomainError {
    #[error("Input file not found: {0}")]
    InputNotFound(String),

    #[error("Input file too large: {path} is {size} bytes, limit is {max} bytes")]
    InputTooLarge {
        path: String,
        size: u64,
        max: u64,
    },

    #[error("All compression methods failed after {attempts} attempt(s): {last_error}")]
    AllMethodsFailed {
        attempts: usize,
        last_error: String,
    },

    #[error("Compressed file failed integrity check: {0}")]
    Integrity(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for DomainError {
    fn from(error: std::io::Error) -> Self {
        DomainError::Io(error.to_string())
    }
}

impl DomainError {
    /// Input rejections are never retried by the caller
    pub fn is_input_rejected(&self) -> bool {
        matches!(self, DomainError::InputNotFound(_) | DomainError::InputTooLarge { .. })
    }
}

/// Validation errors
#[derive(Debug, Error, Clone, Serialize)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    Required {
        field: String,
    },

    #[error("Field '{field}' must be between {min} and {max}")]
    Range {
        field: String,
        min: String,
        max: String,
    },

    #[error("Field '{field}' must be greater than zero")]
    NotPositive {
        field: String,
    },

    #[error("Field '{field}' contains an invalid value: {reason}")]
    InvalidValue {
        field: String,
        reason: String,
    },
}

impl ValidationError {
    pub fn required(field: &str) -> Self {
        Self::Required {
            field: field.to_string(),
        }
    }

    pub fn range<T: fmt::Display>(field: &str, min: T, max: T) -> Self {
        Self::Range {
            field: field.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }

    pub fn not_positive(field: &str) -> Self {
        Self::NotPositive {
            field: field.to_string(),
        }
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}
