//! The slide document store.
//!
//! [`DocumentStore`] owns the ordered slide list, the active slide pointer and
//! the canvas configuration. Every action is a single atomic transition under
//! one write lock; the persisted record is captured inside that transition
//! and queued for a background writer once the lock is released, followed by
//! change notifications. Slow storage never delays an action.
//!
//! Actions that name a slide or element that does not exist are no-ops and
//! report so through their return value. They never return errors.
//!
//! # Example
//!
//! ```
//! use deck_core::store::DocumentStore;
//! use deck_core::config::StoreConfig;
//! use deck_core::element::TextKind;
//!
//! let store = DocumentStore::new(StoreConfig::default().with_rng_seed(1));
//! let first = store.active_slide_id().expect("a slide is always active");
//!
//! let second = store.add_slide(None);
//! assert_eq!(store.slide_count(), 2);
//! assert_eq!(store.active_slide_id(), Some(second));
//!
//! store.add_text_element(first, TextKind::Body).expect("slide exists");
//! assert_eq!(store.slide(first).expect("slide").text_elements.len(), 2);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::broadcast;

use crate::canvas::{AspectRatio, CanvasConfig, CanvasDimensions};
use crate::config::StoreConfig;
use crate::decoration::{Decoration, DecorationPatch, DecorationType};
use crate::element::{
    DecorationId, ImageId, ImagePatch, SlideId, SlideImage, TextElementId, TextElementPatch,
    TextKind, DEFAULT_IMAGE_Z_INDEX,
};
use crate::error::DeckResult;
use crate::event::DocumentEvent;
use crate::image::{ImageDecoder, RasterImageDecoder};
use crate::schema::{rehydrate, DocumentRecord, Rehydrated};
use crate::slide::{Slide, SlidePatch, ThumbnailImage, ThumbnailState};
use crate::storage::PersistenceAdapter;
use crate::theme::{default_text_layout, CatalogThemeMatcher, ColorStrategy, SlideTheme, TextTemplate};
use crate::writer::{PendingWrite, WriteBehind};

/// Alt text given to uploaded images.
pub const DEFAULT_IMAGE_ALT: &str = "Uploaded image";

/// Default placement of a new image: `(x, y, width, height)` in percent.
pub const DEFAULT_IMAGE_PLACEMENT: (f32, f32, f32, f32) = (5.0, 5.0, 90.0, 90.0);

/// A consistent copy of the whole document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    /// Slides in display order.
    pub slides: Vec<Slide>,
    /// Active slide.
    pub active_slide_id: Option<SlideId>,
    /// Canvas configuration.
    pub canvas: CanvasConfig,
}

impl DocumentSnapshot {
    /// The active slide.
    #[must_use]
    pub fn active_slide(&self) -> Option<&Slide> {
        let id = self.active_slide_id?;
        self.slides.iter().find(|s| s.id == id)
    }
}

/// Everything needed to render one slide, read under a single lock.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideRender {
    /// The slide as of `revision`.
    pub slide: Slide,
    /// Position in the deck.
    pub index: usize,
    /// Content revision.
    pub revision: u64,
    /// Canvas size to render at.
    pub dimensions: CanvasDimensions,
}

struct DocumentState {
    slides: Vec<Slide>,
    active_slide_id: Option<SlideId>,
    canvas: CanvasConfig,
    /// Content revision per slide. A thumbnail is only committed against
    /// the revision it was rendered from.
    revisions: HashMap<SlideId, u64>,
    next_revision: u64,
    /// Sequence number of the last transition, used to order storage writes.
    seq: u64,
    loaded: bool,
    rng: StdRng,
}

impl DocumentState {
    fn from_rehydrated(doc: Rehydrated, rng: StdRng) -> Self {
        let mut state = Self {
            slides: Vec::new(),
            active_slide_id: None,
            canvas: doc.canvas,
            revisions: HashMap::new(),
            next_revision: 0,
            seq: 0,
            loaded: false,
            rng,
        };
        state.install(doc.slides, doc.active_slide_id);
        state
    }

    fn install(&mut self, slides: Vec<Slide>, active: SlideId) {
        self.revisions.clear();
        for slide in &slides {
            self.next_revision += 1;
            self.revisions.insert(slide.id, self.next_revision);
        }
        self.slides = slides;
        self.active_slide_id = Some(active);
    }

    fn index_of(&self, id: SlideId) -> Option<usize> {
        self.slides.iter().position(|s| s.id == id)
    }

    fn slide_mut(&mut self, id: SlideId) -> Option<&mut Slide> {
        self.slides.iter_mut().find(|s| s.id == id)
    }

    fn bump(&mut self, id: SlideId) -> u64 {
        self.next_revision += 1;
        self.revisions.insert(id, self.next_revision);
        self.next_revision
    }

    /// Record a visual change to `id`.
    fn changed(&mut self, id: SlideId, events: &mut Vec<DocumentEvent>) {
        let revision = self.bump(id);
        events.push(DocumentEvent::SlideChanged {
            slide_id: id,
            revision,
        });
    }

    fn insert(&mut self, index: usize, slide: Slide, events: &mut Vec<DocumentEvent>) -> SlideId {
        let id = slide.id;
        let index = index.min(self.slides.len());
        self.slides.insert(index, slide);
        let revision = self.bump(id);
        events.push(DocumentEvent::SlideAdded {
            slide_id: id,
            index,
            revision,
        });
        self.activate(id, events);
        id
    }

    fn activate(&mut self, id: SlideId, events: &mut Vec<DocumentEvent>) {
        if self.active_slide_id != Some(id) {
            self.active_slide_id = Some(id);
            events.push(DocumentEvent::ActiveSlideChanged { slide_id: id });
        }
    }

    fn invalidate_thumbnails(&mut self) {
        let ids: Vec<SlideId> = self.slides.iter().map(|s| s.id).collect();
        for slide in &mut self.slides {
            slide.thumbnail = ThumbnailState::Pending;
        }
        for id in ids {
            self.bump(id);
        }
    }

    fn pending_write(&self) -> PendingWrite {
        PendingWrite {
            seq: self.seq,
            record: DocumentRecord::capture(&self.slides, self.active_slide_id, &self.canvas),
        }
    }
}

/// Thread-safe slide document store.
///
/// Cloning is cheap and every clone shares the same document.
#[derive(Clone)]
pub struct DocumentStore {
    state: Arc<RwLock<DocumentState>>,
    writer: Option<Arc<WriteBehind>>,
    events: broadcast::Sender<DocumentEvent>,
    colors: Arc<dyn ColorStrategy>,
    decoder: Arc<dyn ImageDecoder>,
    config: Arc<StoreConfig>,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("slides", &self.slide_count())
            .field("persistent", &self.writer.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DocumentStore {
    /// Create an in-memory store holding a fresh default document.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        let rng = Self::seeded_rng(&config);
        let mut state = DocumentState::from_rehydrated(Rehydrated::fresh(), rng);
        state.loaded = true;
        Self::assemble(config, state, None)
    }

    /// Open a store backed by `storage`, rehydrating the persisted document.
    ///
    /// Missing or invalid persisted data yields a fresh document; this never
    /// fails. The rehydrated document is queued for writing straight away so
    /// legacy records are normalized.
    #[must_use]
    pub fn open(config: StoreConfig, storage: Arc<dyn PersistenceAdapter>) -> Self {
        let mut rng = Self::seeded_rng(&config);
        let persisted = match storage.load(&config.storage_key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    "Could not load document {}: {e}; starting fresh",
                    config.storage_key
                );
                None
            }
        };
        let doc = rehydrate(persisted.as_ref(), &mut rng);
        tracing::info!(
            slides = doc.slides.len(),
            slides_restored = doc.slides_restored,
            canvas_restored = doc.canvas_restored,
            "Document loaded"
        );

        let mut state = DocumentState::from_rehydrated(doc, rng);
        state.loaded = true;
        state.seq = 1;
        let initial = state.pending_write();

        let writer = WriteBehind::spawn(storage, config.storage_key.clone());
        writer.submit(initial);
        Self::assemble(config, state, Some(writer))
    }

    fn seeded_rng(config: &StoreConfig) -> StdRng {
        config
            .rng_seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64)
    }

    fn assemble(
        config: StoreConfig,
        state: DocumentState,
        writer: Option<WriteBehind>,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            state: Arc::new(RwLock::new(state)),
            writer: writer.map(Arc::new),
            events,
            colors: Arc::new(CatalogThemeMatcher::builtin()),
            decoder: Arc::new(RasterImageDecoder),
            config: Arc::new(config),
        }
    }

    /// Replace the color strategy used for new content.
    #[must_use]
    pub fn with_color_strategy(mut self, colors: Arc<dyn ColorStrategy>) -> Self {
        self.colors = colors;
        self
    }

    /// Replace the image decoder.
    #[must_use]
    pub fn with_image_decoder(mut self, decoder: Arc<dyn ImageDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Store configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Subscribe to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DocumentEvent> {
        self.events.subscribe()
    }

    // -----------------------------------------------------------------------
    // Transition machinery
    // -----------------------------------------------------------------------

    fn read<T>(&self, f: impl FnOnce(&DocumentState) -> T) -> T {
        let state = self
            .state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&state)
    }

    /// Run one atomic transition. `f` returns `None` when nothing changed;
    /// otherwise the new state is persisted (when `persist` is set) and the
    /// collected events are published.
    fn transition<T>(
        &self,
        persist: bool,
        f: impl FnOnce(&mut DocumentState, &mut Vec<DocumentEvent>) -> Option<T>,
    ) -> Option<T> {
        let mut events = Vec::new();
        let (result, write) = {
            let mut state = self
                .state
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let Some(result) = f(&mut state, &mut events) else {
                return None;
            };
            state.seq += 1;
            let write = (persist && state.loaded && self.writer.is_some())
                .then(|| state.pending_write());
            (result, write)
        };

        if let (Some(writer), Some(write)) = (&self.writer, write) {
            writer.submit(write);
        }
        for event in events {
            tracing::debug!(?event, "Document changed");
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
        Some(result)
    }

    /// Write the current document to storage now, on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns the storage error, unlike the automatic writes which only log.
    pub fn persist_now(&self) -> DeckResult<()> {
        let Some(writer) = &self.writer else {
            return Ok(());
        };
        let write = self.read(DocumentState::pending_write);
        writer.write_now(write)
    }

    /// Block until every queued automatic write has reached storage.
    ///
    /// Blocks the calling thread; from async code call it through
    /// `tokio::task::spawn_blocking`.
    pub fn flush(&self) {
        if let Some(writer) = &self.writer {
            writer.flush();
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// A consistent copy of the whole document.
    #[must_use]
    pub fn snapshot(&self) -> DocumentSnapshot {
        self.read(|state| DocumentSnapshot {
            slides: state.slides.clone(),
            active_slide_id: state.active_slide_id,
            canvas: state.canvas,
        })
    }

    /// Whether the initial load has completed.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.read(|state| state.loaded)
    }

    /// Number of slides.
    #[must_use]
    pub fn slide_count(&self) -> usize {
        self.read(|state| state.slides.len())
    }

    /// Slide ids in display order.
    #[must_use]
    pub fn slide_ids(&self) -> Vec<SlideId> {
        self.read(|state| state.slides.iter().map(|s| s.id).collect())
    }

    /// Copy of one slide.
    #[must_use]
    pub fn slide(&self, id: SlideId) -> Option<Slide> {
        self.read(|state| state.slides.iter().find(|s| s.id == id).cloned())
    }

    /// Position of a slide.
    #[must_use]
    pub fn slide_index(&self, id: SlideId) -> Option<usize> {
        self.read(|state| state.index_of(id))
    }

    /// The active slide id.
    #[must_use]
    pub fn active_slide_id(&self) -> Option<SlideId> {
        self.read(|state| state.active_slide_id)
    }

    /// Copy of the active slide.
    #[must_use]
    pub fn active_slide(&self) -> Option<Slide> {
        self.read(|state| {
            let id = state.active_slide_id?;
            state.slides.iter().find(|s| s.id == id).cloned()
        })
    }

    /// Position of the active slide.
    #[must_use]
    pub fn active_slide_index(&self) -> Option<usize> {
        self.read(|state| state.active_slide_id.and_then(|id| state.index_of(id)))
    }

    /// Canvas configuration.
    #[must_use]
    pub fn canvas(&self) -> CanvasConfig {
        self.read(|state| state.canvas)
    }

    /// Current content revision of a slide.
    #[must_use]
    pub fn revision(&self, id: SlideId) -> Option<u64> {
        self.read(|state| state.revisions.get(&id).copied())
    }

    /// The slide, its position, revision and the canvas size, read together.
    #[must_use]
    pub fn render_job(&self, id: SlideId) -> Option<SlideRender> {
        self.read(|state| {
            let index = state.index_of(id)?;
            Some(SlideRender {
                slide: state.slides[index].clone(),
                index,
                revision: state.revisions.get(&id).copied().unwrap_or_default(),
                dimensions: state.canvas.dimensions,
            })
        })
    }

    // -----------------------------------------------------------------------
    // Slide actions
    // -----------------------------------------------------------------------

    /// Append a slide and make it active.
    ///
    /// With a `reference` that exists, the new slide is a deep copy of it
    /// with every nested entity re-identified; otherwise it gets default
    /// content.
    pub fn add_slide(&self, reference: Option<SlideId>) -> SlideId {
        self.transition(true, |state, events| {
            let slide = reference
                .and_then(|id| state.slides.iter().find(|s| s.id == id))
                .map_or_else(Slide::with_default_content, Slide::reidentified);
            let end = state.slides.len();
            Some(state.insert(end, slide, events))
        })
        .unwrap_or_default()
    }

    /// Remove a slide.
    ///
    /// If it was active, the slide now at the removed position becomes
    /// active (the previous one when the last slide was removed). Removing
    /// the only slide synthesizes a fresh default slide.
    pub fn remove_slide(&self, id: SlideId) -> bool {
        self.transition(true, |state, events| {
            let index = state.index_of(id)?;
            state.slides.remove(index);
            state.revisions.remove(&id);
            events.push(DocumentEvent::SlideRemoved { slide_id: id });

            if state.slides.is_empty() {
                tracing::debug!("Last slide removed; synthesizing default slide");
                state.insert(0, Slide::with_default_content(), events);
                return Some(());
            }
            let active_valid = state
                .active_slide_id
                .is_some_and(|active| state.index_of(active).is_some());
            if !active_valid {
                let next = state.slides[index.min(state.slides.len() - 1)].id;
                state.activate(next, events);
            }
            Some(())
        })
        .is_some()
    }

    /// Insert a deep copy of a slide right after it and make the copy active.
    pub fn duplicate_slide(&self, id: SlideId) -> Option<SlideId> {
        self.transition(true, |state, events| {
            let index = state.index_of(id)?;
            let copy = state.slides[index].reidentified();
            Some(state.insert(index + 1, copy, events))
        })
    }

    /// Shallow-merge fields into a slide.
    pub fn update_slide(&self, id: SlideId, patch: SlidePatch) -> bool {
        self.transition(true, |state, events| {
            let slide = state.slide_mut(id)?;
            patch.apply_to(slide);
            state.changed(id, events);
            Some(())
        })
        .is_some()
    }

    /// Make a slide active.
    pub fn select_slide(&self, id: SlideId) -> bool {
        self.transition(true, |state, events| {
            state.index_of(id)?;
            state.activate(id, events);
            Some(())
        })
        .is_some()
    }

    /// Re-render a slide's thumbnail without changing its content.
    pub fn force_thumbnail_update(&self, id: SlideId) -> bool {
        self.transition(false, |state, events| {
            state.index_of(id)?;
            state.changed(id, events);
            Some(())
        })
        .is_some()
    }

    // -----------------------------------------------------------------------
    // Text actions
    // -----------------------------------------------------------------------

    /// Add a text element with default layout, colored to match the slide.
    pub fn add_text_element(&self, slide_id: SlideId, kind: TextKind) -> Option<TextElementId> {
        self.transition(true, |state, events| {
            let index = state.index_of(slide_id)?;
            let color = self.colors.text_color(&state.slides[index]);
            let mut element = default_text_layout()
                .instantiate(format!("New {} text", kind.label().to_lowercase()), color);
            element.kind = kind;
            let id = element.id;
            state.slides[index].text_elements.push(element);
            state.changed(slide_id, events);
            Some(id)
        })
    }

    /// Update a text element. Cheap enough to call on every pointer move.
    pub fn update_text_element(
        &self,
        slide_id: SlideId,
        element_id: TextElementId,
        patch: &TextElementPatch,
    ) -> bool {
        self.transition(true, |state, events| {
            state
                .slide_mut(slide_id)?
                .text_element_mut(element_id)?
                .apply(patch);
            state.changed(slide_id, events);
            Some(())
        })
        .is_some()
    }

    /// Remove a text element.
    pub fn remove_text_element(&self, slide_id: SlideId, element_id: TextElementId) -> bool {
        self.transition(true, |state, events| {
            let slide = state.slide_mut(slide_id)?;
            let index = slide.text_elements.iter().position(|el| el.id == element_id)?;
            slide.text_elements.remove(index);
            state.changed(slide_id, events);
            Some(())
        })
        .is_some()
    }

    /// Replace a slide's text with a fresh instance of `template`.
    ///
    /// Destructive: existing text content is discarded.
    pub fn apply_text_template(&self, slide_id: SlideId, template: &TextTemplate) -> bool {
        self.transition(true, |state, events| {
            let index = state.index_of(slide_id)?;
            let color = self.colors.text_color(&state.slides[index]);
            state.slides[index].text_elements = template
                .elements
                .iter()
                .map(|layout| {
                    layout.instantiate(format!("{} Text", layout.kind.label()), color.clone())
                })
                .collect();
            state.changed(slide_id, events);
            Some(())
        })
        .is_some()
    }

    // -----------------------------------------------------------------------
    // Decoration actions
    // -----------------------------------------------------------------------

    /// Add a decoration with type-appropriate defaults and fresh geometry.
    ///
    /// [`DecorationType::None`] adds nothing.
    pub fn add_decoration(
        &self,
        slide_id: SlideId,
        decoration_type: DecorationType,
    ) -> Option<DecorationId> {
        if decoration_type == DecorationType::None {
            return None;
        }
        self.transition(true, |state, events| {
            let index = state.index_of(slide_id)?;
            let color = self.colors.decoration_color(&state.slides[index]);
            let decoration = Decoration::new(decoration_type, color, &mut state.rng);
            let id = decoration.id;
            state.slides[index].decorations.push(decoration);
            state.changed(slide_id, events);
            Some(id)
        })
    }

    /// Update a decoration. Geometry is regenerated only when a parameter
    /// that drives it changes.
    pub fn update_decoration(
        &self,
        slide_id: SlideId,
        decoration_id: DecorationId,
        patch: &DecorationPatch,
    ) -> bool {
        self.transition(true, |state, events| {
            let DocumentState { slides, rng, .. } = &mut *state;
            slides
                .iter_mut()
                .find(|s| s.id == slide_id)?
                .decoration_mut(decoration_id)?
                .apply(patch, rng);
            state.changed(slide_id, events);
            Some(())
        })
        .is_some()
    }

    /// Explicitly regenerate a decoration's blob outline or scatter field.
    pub fn refresh_decoration(&self, slide_id: SlideId, decoration_id: DecorationId) -> bool {
        self.transition(true, |state, events| {
            let DocumentState { slides, rng, .. } = &mut *state;
            slides
                .iter_mut()
                .find(|s| s.id == slide_id)?
                .decoration_mut(decoration_id)?
                .regenerate(rng);
            state.changed(slide_id, events);
            Some(())
        })
        .is_some()
    }

    /// Remove a decoration.
    pub fn remove_decoration(&self, slide_id: SlideId, decoration_id: DecorationId) -> bool {
        self.transition(true, |state, events| {
            let slide = state.slide_mut(slide_id)?;
            let index = slide.decorations.iter().position(|d| d.id == decoration_id)?;
            slide.decorations.remove(index);
            state.changed(slide_id, events);
            Some(())
        })
        .is_some()
    }

    // -----------------------------------------------------------------------
    // Image actions
    // -----------------------------------------------------------------------

    /// Decode `bytes` and put the image on a slide, replacing any existing
    /// one.
    ///
    /// The store is not locked while decoding. If the slide is gone by the
    /// time decoding finishes the result is dropped and `Ok(None)` returned.
    /// Concurrent calls for the same slide commit in completion order, so
    /// the last decode to finish wins.
    ///
    /// # Errors
    ///
    /// Returns the decoder's error; the document is left unchanged.
    pub async fn add_or_replace_image(
        &self,
        slide_id: SlideId,
        bytes: Vec<u8>,
        alt_text: Option<String>,
    ) -> DeckResult<Option<ImageId>> {
        if self.slide_index(slide_id).is_none() {
            return Ok(None);
        }
        let decoded = match self.decoder.decode(bytes).await {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!(%slide_id, "Image decode failed: {e}");
                return Err(e);
            }
        };

        let committed = self.transition(true, |state, events| {
            let slide = state.slide_mut(slide_id)?;
            let (x, y, width, height) = DEFAULT_IMAGE_PLACEMENT;
            let image = SlideImage {
                id: ImageId::new(),
                source_data: decoded.data_url,
                alt_text: alt_text.unwrap_or_else(|| DEFAULT_IMAGE_ALT.to_string()),
                original_width: decoded.width,
                original_height: decoded.height,
                x,
                y,
                width,
                height,
                z_index: DEFAULT_IMAGE_Z_INDEX,
            };
            let id = image.id;
            slide.image = Some(image);
            state.changed(slide_id, events);
            Some(id)
        });
        if committed.is_none() {
            tracing::debug!(%slide_id, "Slide removed before image decode finished; dropping image");
        }
        Ok(committed)
    }

    /// Move, resize or relabel a slide's image.
    pub fn update_image(&self, slide_id: SlideId, patch: &ImagePatch) -> bool {
        self.transition(true, |state, events| {
            state.slide_mut(slide_id)?.image.as_mut()?.apply(patch);
            state.changed(slide_id, events);
            Some(())
        })
        .is_some()
    }

    /// Clear a slide's image slot.
    pub fn remove_image(&self, slide_id: SlideId) -> bool {
        self.transition(true, |state, events| {
            state.slide_mut(slide_id)?.image.take()?;
            state.changed(slide_id, events);
            Some(())
        })
        .is_some()
    }

    // -----------------------------------------------------------------------
    // Theme and canvas actions
    // -----------------------------------------------------------------------

    /// Recolor a slide: background, every text element and every decoration.
    /// Scatter fields are regenerated in the new color.
    pub fn apply_theme(&self, slide_id: SlideId, theme: &SlideTheme) -> bool {
        self.transition(true, |state, events| {
            let DocumentState { slides, rng, .. } = &mut *state;
            let slide = slides.iter_mut().find(|s| s.id == slide_id)?;
            slide.background_color.clone_from(&theme.background_color);
            for element in &mut slide.text_elements {
                element.color.clone_from(&theme.text_color);
            }
            for decoration in &mut slide.decorations {
                decoration.recolor(&theme.decoration_color, rng);
            }
            state.changed(slide_id, events);
            Some(())
        })
        .is_some()
    }

    /// Change the canvas size. Zero dimensions are ignored.
    ///
    /// Slide geometry is percentage based and left alone; every thumbnail is
    /// invalidated.
    pub fn change_canvas_dimensions(&self, dimensions: CanvasDimensions) -> bool {
        if !dimensions.is_valid() {
            tracing::warn!(%dimensions, "Ignoring invalid canvas dimensions");
            return false;
        }
        self.transition(true, |state, events| {
            state.canvas.dimensions = dimensions;
            state.invalidate_thumbnails();
            events.push(DocumentEvent::CanvasChanged {
                canvas: state.canvas,
            });
            Some(())
        })
        .is_some()
    }

    /// Switch aspect ratio, adopting the ratio's first size option.
    /// Returns the new dimensions.
    pub fn change_aspect_ratio(&self, ratio: AspectRatio) -> CanvasDimensions {
        let dimensions = ratio.default_dimensions();
        self.transition(true, |state, events| {
            state.canvas = CanvasConfig {
                dimensions,
                aspect_ratio: ratio,
            };
            state.invalidate_thumbnails();
            events.push(DocumentEvent::CanvasChanged {
                canvas: state.canvas,
            });
            Some(())
        });
        dimensions
    }

    /// Discard everything and start over with a single default slide and
    /// the default canvas. Irreversible; returns once the fresh document has
    /// reached storage.
    pub fn reset_document(&self) -> SlideId {
        let fresh = Rehydrated::fresh();
        let active = fresh.active_slide_id;
        self.transition(true, |state, events| {
            state.canvas = fresh.canvas;
            state.install(fresh.slides, active);
            events.push(DocumentEvent::DocumentReset);
            events.push(DocumentEvent::ActiveSlideChanged { slide_id: active });
            Some(())
        });
        self.flush();
        tracing::info!("Document reset");
        active
    }

    // -----------------------------------------------------------------------
    // Thumbnails
    // -----------------------------------------------------------------------

    /// Commit a rendered thumbnail, or a failure when `image` is `None`.
    ///
    /// Only applied if the slide still exists and has not changed since
    /// `revision`; stale results are discarded. Thumbnails are not persisted.
    pub fn commit_thumbnail(
        &self,
        slide_id: SlideId,
        revision: u64,
        image: Option<ThumbnailImage>,
    ) -> bool {
        self.transition(false, |state, events| {
            if state.revisions.get(&slide_id) != Some(&revision) {
                return None;
            }
            let slide = state.slide_mut(slide_id)?;
            slide.thumbnail = image.map_or(ThumbnailState::Failed, ThumbnailState::Ready);
            events.push(DocumentEvent::ThumbnailUpdated { slide_id, revision });
            Some(())
        })
        .is_some()
    }
}
