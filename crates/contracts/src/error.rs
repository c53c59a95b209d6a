//! Layered error definitions
//!
//! Categorized by source: config / transport / wire

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Transport Errors =====
    /// Port could not be bound
    #[error("failed to bind udp port {port}: {message}")]
    BindFailure { port: u16, message: String },

    // ===== Wire Errors =====
    /// Command packet has the wrong size
    #[error("command packet decode error: expected {expected} bytes, got {actual}")]
    CommandDecode { expected: usize, actual: usize },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create bind failure
    pub fn bind_failure(port: u16, message: impl Into<String>) -> Self {
        Self::BindFailure {
            port,
            message: message.into(),
        }
    }
}
