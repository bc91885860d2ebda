//! Change notifications published by the document store.

use serde::Serialize;

use crate::canvas::CanvasConfig;
use crate::element::SlideId;

/// A committed change to the document.
///
/// Delivered over a `tokio::sync::broadcast` channel after the state
/// transition is visible through the store's snapshot accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentEvent {
    /// A slide was inserted at `index`.
    SlideAdded {
        /// New slide.
        slide_id: SlideId,
        /// Position in the slide list.
        index: usize,
        /// Content revision of the new slide.
        revision: u64,
    },
    /// A slide was removed.
    SlideRemoved {
        /// Removed slide.
        slide_id: SlideId,
    },
    /// A slide's visual content changed, or a refresh was requested.
    SlideChanged {
        /// Changed slide.
        slide_id: SlideId,
        /// Content revision after the change.
        revision: u64,
    },
    /// The active slide pointer moved.
    ActiveSlideChanged {
        /// Now active.
        slide_id: SlideId,
    },
    /// Canvas size or ratio changed; every thumbnail is stale.
    CanvasChanged {
        /// New configuration.
        canvas: CanvasConfig,
    },
    /// The document was replaced by a fresh default document.
    DocumentReset,
    /// A regenerated thumbnail was committed.
    ThumbnailUpdated {
        /// Slide whose thumbnail changed.
        slide_id: SlideId,
        /// Revision the thumbnail was rendered from.
        revision: u64,
    },
}

impl DocumentEvent {
    /// The slide whose appearance this event dirties, if it names one.
    #[must_use]
    pub fn dirtied_slide(&self) -> Option<SlideId> {
        match self {
            Self::SlideAdded { slide_id, .. } | Self::SlideChanged { slide_id, .. } => {
                Some(*slide_id)
            }
            _ => None,
        }
    }

    /// Whether every slide's appearance is dirtied.
    #[must_use]
    pub fn dirties_all(&self) -> bool {
        matches!(self, Self::CanvasChanged { .. } | Self::DocumentReset)
    }
}
