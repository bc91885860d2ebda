//! The slide aggregate and its cached thumbnail.

use serde::{Deserialize, Serialize};

use crate::decoration::Decoration;
use crate::element::{DecorationId, SlideId, SlideImage, TextElement, TextElementId};
use crate::theme::{default_theme, find_template, TemplateKind};

/// Content of a freshly synthesized slide's title.
pub const DEFAULT_TITLE_CONTENT: &str = "Your title here";

/// A rendered slide preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailImage {
    /// Image as a `data:` URL.
    pub data_url: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Cached thumbnail of a slide.
///
/// Never authoritative: it can always be regenerated from the slide.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ThumbnailState {
    /// Not rendered yet, or invalidated.
    #[default]
    Pending,
    /// Rendered preview.
    Ready(ThumbnailImage),
    /// The last render attempt failed. Not retried until the slide changes.
    Failed,
}

impl ThumbnailState {
    /// The preview, if one is available.
    #[must_use]
    pub fn image(&self) -> Option<&ThumbnailImage> {
        match self {
            Self::Ready(image) => Some(image),
            Self::Pending | Self::Failed => None,
        }
    }
}

/// One slide of the deck.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    /// Unique identifier, fixed at creation.
    pub id: SlideId,
    /// Background color as hex.
    pub background_color: String,
    /// Decorations, drawn in order.
    pub decorations: Vec<Decoration>,
    /// Text blocks.
    pub text_elements: Vec<TextElement>,
    /// The single optional image.
    pub image: Option<SlideImage>,
    /// Cached preview.
    pub thumbnail: ThumbnailState,
}

impl Slide {
    /// An empty slide with the given background.
    #[must_use]
    pub fn blank(background_color: impl Into<String>) -> Self {
        Self {
            id: SlideId::new(),
            background_color: background_color.into(),
            decorations: Vec::new(),
            text_elements: Vec::new(),
            image: None,
            thumbnail: ThumbnailState::Pending,
        }
    }

    /// A slide with default content: the default theme background and a
    /// single placeholder title.
    #[must_use]
    pub fn with_default_content() -> Self {
        let theme = default_theme();
        let mut slide = Self::blank(theme.background_color.clone());
        if let Some(template) = find_template(TemplateKind::TitleOnly) {
            slide.text_elements = template
                .elements
                .iter()
                .map(|layout| layout.instantiate(DEFAULT_TITLE_CONTENT, theme.text_color.clone()))
                .collect();
        }
        slide
    }

    /// Deep copy with fresh identifiers for the slide and every nested
    /// entity. The cached thumbnail is carried over since the copy looks
    /// identical.
    #[must_use]
    pub fn reidentified(&self) -> Self {
        Self {
            id: SlideId::new(),
            background_color: self.background_color.clone(),
            decorations: self.decorations.iter().map(Decoration::reidentified).collect(),
            text_elements: self
                .text_elements
                .iter()
                .map(TextElement::reidentified)
                .collect(),
            image: self.image.as_ref().map(SlideImage::reidentified),
            thumbnail: self.thumbnail.clone(),
        }
    }

    /// Look up a text element.
    #[must_use]
    pub fn text_element(&self, id: TextElementId) -> Option<&TextElement> {
        self.text_elements.iter().find(|el| el.id == id)
    }

    /// Look up a decoration.
    #[must_use]
    pub fn decoration(&self, id: DecorationId) -> Option<&Decoration> {
        self.decorations.iter().find(|d| d.id == id)
    }

    pub(crate) fn decoration_mut(&mut self, id: DecorationId) -> Option<&mut Decoration> {
        self.decorations.iter_mut().find(|d| d.id == id)
    }

    pub(crate) fn text_element_mut(&mut self, id: TextElementId) -> Option<&mut TextElement> {
        self.text_elements.iter_mut().find(|el| el.id == id)
    }
}

impl Default for Slide {
    fn default() -> Self {
        Self::with_default_content()
    }
}

/// Shallow partial update for a [`Slide`]. Collections are replaced
/// wholesale; keeping them internally consistent is the caller's job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlidePatch {
    /// New background color.
    pub background_color: Option<String>,
    /// Replacement decoration list.
    pub decorations: Option<Vec<Decoration>>,
    /// Replacement text list.
    pub text_elements: Option<Vec<TextElement>>,
    /// `Some(None)` clears the image, `Some(Some(_))` replaces it.
    pub image: Option<Option<SlideImage>>,
}

impl SlidePatch {
    /// Patch that only changes the background.
    #[must_use]
    pub fn background(color: impl Into<String>) -> Self {
        Self {
            background_color: Some(color.into()),
            ..Self::default()
        }
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.background_color.is_none()
            && self.decorations.is_none()
            && self.text_elements.is_none()
            && self.image.is_none()
    }

    pub(crate) fn apply_to(self, slide: &mut Slide) {
        if let Some(color) = self.background_color {
            slide.background_color = color;
        }
        if let Some(decorations) = self.decorations {
            slide.decorations = decorations;
        }
        if let Some(text_elements) = self.text_elements {
            slide.text_elements = text_elements;
        }
        if let Some(image) = self.image {
            slide.image = image;
        }
    }
}
