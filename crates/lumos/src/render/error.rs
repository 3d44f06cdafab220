//! Rendering error types
//!
//! These error types stay free of graphics-API specifics. Backend errors are
//! logged where they happen and surface here as plain strings.

use thiserror::Error;

/// Errors raised by the rendering core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A bounded resource has no capacity left
    ///
    /// Render list slots, shadow cascades and dynamic uniform slots. The
    /// caller degrades (fewer cascades, dropped draws) and keeps running.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// A handle or reference no longer points at a live object
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// The backend could not create a GPU object
    ///
    /// Fatal at startup: it means the backend was never wired up correctly.
    #[error("Backend creation failed: {0}")]
    BackendCreation(String),

    /// Any other backend failure
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
