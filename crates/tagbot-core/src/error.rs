//! Error types for the tag bot
//!
//! Malformed index lines and refused requests are not errors: the former
//! degrade to raw text (see [`crate::index::ParsedLine`]) and the latter are
//! [`crate::gate::GateDecision`] outcomes.

use thiserror::Error;

/// Result type alias for tag bot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the tag bot
#[derive(Debug, Error)]
pub enum Error {
    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    #[error("Configuration page '{page}' unavailable: {reason}")]
    ConfigUnavailable { page: String, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ==========================================================================
    // Platform Errors
    // ==========================================================================
    #[error("Platform error: {0}")]
    Platform(String),

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error type string (for structured log fields)
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::ConfigUnavailable { .. } => "CONFIG_UNAVAILABLE",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::Platform(_) => "PLATFORM_ERROR",
            Self::Io(_) => "OS_ERROR",
            Self::Serialization(_) => "TYPE_ERROR",
        }
    }

    /// Shorthand for a [`Error::ConfigUnavailable`] on `page`.
    #[must_use]
    pub fn config_unavailable(page: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigUnavailable {
            page: page.into(),
            reason: reason.into(),
        }
    }
}
