//! Error taxonomy for the preview pipeline

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreviewError {
    /// Capture subsystem could not be initialised or queried
    #[error("display enumeration failed: {0}")]
    EnumerationFailed(String),

    /// Rejected before any worker thread is spawned
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Monitor went away (or capture broke) while running
    #[error("capture lost: {0}")]
    CaptureLost(String),

    #[error("cursor position unavailable")]
    CursorResolutionDegraded,

    #[error("overlay drawing failed: {0}")]
    OverlayDrawFailed(String),

    #[error("preview is already running")]
    AlreadyRunning,
}

pub type Result<T> = std::result::Result<T, PreviewError>;
