//! Error types for deck operations.

use thiserror::Error;

/// Result type for deck operations.
pub type DeckResult<T> = Result<T, DeckError>;

/// Errors that can occur in deck operations.
///
/// Referential problems (an action naming a slide or element that no longer
/// exists) are not errors: store actions treat them as no-ops. The variants
/// here cover resource failures only.
#[derive(Debug, Error)]
pub enum DeckError {
    /// Slide not found where one was strictly required.
    #[error("Slide not found: {0}")]
    SlideNotFound(String),

    /// Image bytes could not be decoded.
    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    /// The persistence backend failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Document serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Thumbnail generation failed.
    #[error("Thumbnail error: {0}")]
    Thumbnail(String),

    /// Export of one or more pages failed.
    #[error("Export error: {0}")]
    Export(String),
}
