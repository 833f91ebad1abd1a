//! Dispatcher errors.

use thiserror::Error;

/// Result type alias for dispatcher operations
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Anything that escapes a polling cycle.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The cycle body failed; the watermark was still persisted.
    #[error(transparent)]
    Core(#[from] tagbot_core::Error),

    /// The watermark could not be written back.
    #[error("Failed to persist watermark {watermark}: {source}")]
    WatermarkPersist {
        watermark: String,
        #[source]
        source: tagbot_core::Error,
    },
}

impl DispatchError {
    /// Returns the error type string (for structured log fields)
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Core(e) => e.error_type(),
            Self::WatermarkPersist { .. } => "WATERMARK_PERSIST",
        }
    }
}
