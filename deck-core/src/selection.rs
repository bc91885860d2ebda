//! Element selection on the active slide.
//!
//! The selection is UI state layered over the document: it is never
//! persisted and it never blocks a document action. A selection whose
//! element has disappeared (removed, slide switched, image replaced) reads
//! back as nothing.

use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::element::{ImageId, SlideId, TextElementId};
use crate::slide::Slide;
use crate::store::DocumentStore;

/// The element a selection points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SelectedElement {
    /// A text element.
    Text(TextElementId),
    /// The slide's image.
    Image(ImageId),
}

/// A selected element and the slide it lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Slide the element belongs to.
    pub slide_id: SlideId,
    /// Selected element.
    pub element: SelectedElement,
}

impl Selection {
    fn resolves_in(&self, slide: &Slide) -> bool {
        if slide.id != self.slide_id {
            return false;
        }
        match self.element {
            SelectedElement::Text(id) => slide.text_element(id).is_some(),
            SelectedElement::Image(id) => slide.image.as_ref().is_some_and(|img| img.id == id),
        }
    }
}

/// Tracks which element on the active slide is selected.
#[derive(Debug, Clone)]
pub struct SelectionController {
    store: DocumentStore,
    current: Arc<RwLock<Option<Selection>>>,
}

impl SelectionController {
    /// Create a controller with nothing selected.
    #[must_use]
    pub fn new(store: DocumentStore) -> Self {
        Self {
            store,
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Select a text element on the active slide.
    pub fn select_text(&self, id: TextElementId) -> bool {
        self.select(SelectedElement::Text(id))
    }

    /// Select the active slide's image.
    pub fn select_image(&self, id: ImageId) -> bool {
        self.select(SelectedElement::Image(id))
    }

    fn select(&self, element: SelectedElement) -> bool {
        let Some(slide) = self.store.active_slide() else {
            return false;
        };
        let selection = Selection {
            slide_id: slide.id,
            element,
        };
        if !selection.resolves_in(&slide) {
            return false;
        }
        *self
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(selection);
        true
    }

    /// Clear the selection.
    pub fn clear(&self) {
        *self
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }

    /// The current selection, if it still points at an element of the
    /// active slide. Stale selections are dropped.
    #[must_use]
    pub fn current(&self) -> Option<Selection> {
        let mut current = self
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let selection = (*current)?;
        let valid = self
            .store
            .active_slide()
            .is_some_and(|slide| selection.resolves_in(&slide));
        if valid {
            Some(selection)
        } else {
            tracing::debug!(?selection, "Dropping stale selection");
            *current = None;
            None
        }
    }

    /// Whether `element` is selected.
    #[must_use]
    pub fn is_selected(&self, element: SelectedElement) -> bool {
        self.current().is_some_and(|s| s.element == element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::element::TextKind;

    fn setup() -> (DocumentStore, SelectionController) {
        let store = DocumentStore::new(StoreConfig::default().with_rng_seed(3));
        let selection = SelectionController::new(store.clone());
        (store, selection)
    }

    #[test]
    fn test_select_text_on_active_slide() {
        let (store, selection) = setup();
        let slide = store.active_slide().expect("active");
        let id = slide.text_elements[0].id;
        assert!(selection.select_text(id));
        assert!(selection.is_selected(SelectedElement::Text(id)));
        assert_eq!(selection.current().map(|s| s.slide_id), Some(slide.id));
    }

    #[test]
    fn test_unknown_element_not_selected() {
        let (_store, selection) = setup();
        assert!(!selection.select_text(TextElementId::new()));
        assert!(!selection.select_image(ImageId::new()));
        assert!(selection.current().is_none());
    }

    #[test]
    fn test_removed_element_clears_selection() {
        let (store, selection) = setup();
        let slide = store.active_slide_id().expect("active");
        let id = store
            .add_text_element(slide, TextKind::Caption)
            .expect("added");
        assert!(selection.select_text(id));
        store.remove_text_element(slide, id);
        assert!(selection.current().is_none());
    }

    #[test]
    fn test_switching_slides_clears_selection() {
        let (store, selection) = setup();
        let first = store.active_slide().expect("active");
        assert!(selection.select_text(first.text_elements[0].id));
        store.add_slide(None);
        assert!(selection.current().is_none());
        store.select_slide(first.id);
        assert!(selection.current().is_none(), "stale selection stays dropped");
    }

    #[test]
    fn test_clear() {
        let (store, selection) = setup();
        let id = store.active_slide().expect("active").text_elements[0].id;
        selection.select_text(id);
        selection.clear();
        assert!(selection.current().is_none());
    }
}
