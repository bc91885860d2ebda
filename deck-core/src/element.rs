//! Slide content elements - identifiers, text blocks and the image slot.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Namespace used to map non-UUID identifiers from older documents onto UUIDs.
///
/// The mapping is deterministic so that cross references (such as the active
/// slide pointer) still resolve after rehydration.
const LEGACY_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6a1f_3c2e_9b4d_4e5f_8a7b_1c2d_3e4f_5a6b);

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new unique ID.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create from an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Parse an identifier, accepting ids written by older versions.
            ///
            /// UUID strings are taken as-is; any other string is mapped onto a
            /// stable name-based UUID.
            #[must_use]
            pub fn parse_lenient(raw: &str) -> Self {
                Uuid::parse_str(raw).map_or_else(
                    |_| Self(Uuid::new_v5(&LEGACY_ID_NAMESPACE, raw.as_bytes())),
                    Self,
                )
            }

            /// The underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Ok(Self::parse_lenient(&raw))
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a slide.
    SlideId
);
entity_id!(
    /// Unique identifier for a text element.
    TextElementId
);
entity_id!(
    /// Unique identifier for a decoration.
    DecorationId
);
entity_id!(
    /// Unique identifier for a slide image.
    ImageId
);
entity_id!(
    /// Unique identifier for one shape of a scatter field.
    ShapeId
);

/// Default stacking order for text elements.
pub const DEFAULT_TEXT_Z_INDEX: i32 = 10;

/// Default stacking order for the slide image.
pub const DEFAULT_IMAGE_Z_INDEX: i32 = 1;

/// Role of a text block on the slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextKind {
    /// Main heading.
    Title,
    /// Secondary heading.
    Subtitle,
    /// Paragraph text.
    Body,
    /// Small annotation.
    Caption,
}

impl TextKind {
    /// Human readable label ("Title", "Subtitle", ...).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Subtitle => "Subtitle",
            Self::Body => "Body",
            Self::Caption => "Caption",
        }
    }
}

/// Font families available to text elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    /// Lato.
    Lato,
    /// Montserrat.
    Montserrat,
    /// Open Sans.
    #[serde(rename = "Open Sans")]
    OpenSans,
    /// Roboto.
    Roboto,
    /// Playfair Display.
    #[serde(rename = "Playfair Display")]
    PlayfairDisplay,
    /// Source Code Pro.
    #[serde(rename = "Source Code Pro")]
    SourceCodePro,
    /// Poppins.
    Poppins,
}

impl FontFamily {
    /// Every available family, in menu order.
    pub const ALL: [Self; 7] = [
        Self::Lato,
        Self::Montserrat,
        Self::OpenSans,
        Self::Poppins,
        Self::Roboto,
        Self::PlayfairDisplay,
        Self::SourceCodePro,
    ];

    /// CSS family name.
    #[must_use]
    pub const fn css_name(self) -> &'static str {
        match self {
            Self::Lato => "Lato",
            Self::Montserrat => "Montserrat",
            Self::OpenSans => "Open Sans",
            Self::Roboto => "Roboto",
            Self::PlayfairDisplay => "Playfair Display",
            Self::SourceCodePro => "Source Code Pro",
            Self::Poppins => "Poppins",
        }
    }
}

/// Horizontal alignment of a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Left aligned.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Right aligned.
    Right,
}

/// Font weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    /// Regular weight.
    #[default]
    Normal,
    /// Bold.
    Bold,
}

/// Font style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    /// Upright.
    #[default]
    Normal,
    /// Italic.
    Italic,
}

/// Text decoration line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDecoration {
    /// No decoration.
    #[default]
    None,
    /// Underlined.
    Underline,
}

const fn default_text_z_index() -> i32 {
    DEFAULT_TEXT_Z_INDEX
}

const fn default_image_z_index() -> i32 {
    DEFAULT_IMAGE_Z_INDEX
}

/// A positioned block of text.
///
/// `x`, `y` and `width` are percentages of the canvas so they stay valid when
/// the canvas dimensions change. Keeping `x + width <= 100` is left to the
/// drag interaction; programmatic updates may store any value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    /// Unique identifier.
    pub id: TextElementId,
    /// Role of the block.
    #[serde(rename = "type")]
    pub kind: TextKind,
    /// Text content.
    pub content: String,
    /// Font family.
    pub font_family: FontFamily,
    /// Font size in pixels.
    pub font_size: f32,
    /// Text color as hex.
    pub color: String,
    /// Left edge, percent of canvas width.
    pub x: f32,
    /// Top edge, percent of canvas height.
    pub y: f32,
    /// Width, percent of canvas width.
    pub width: f32,
    /// Horizontal alignment.
    #[serde(default)]
    pub text_align: TextAlign,
    /// Font weight.
    #[serde(default)]
    pub font_weight: FontWeight,
    /// Font style.
    #[serde(default)]
    pub font_style: FontStyle,
    /// Decoration line.
    #[serde(default)]
    pub text_decoration: TextDecoration,
    /// Stacking order.
    #[serde(default = "default_text_z_index")]
    pub z_index: i32,
}

impl TextElement {
    /// Copy of this element under a fresh identifier.
    #[must_use]
    pub fn reidentified(&self) -> Self {
        Self {
            id: TextElementId::new(),
            ..self.clone()
        }
    }

    /// Apply a partial update.
    pub fn apply(&mut self, patch: &TextElementPatch) {
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(content) = &patch.content {
            self.content.clone_from(content);
        }
        if let Some(font_family) = patch.font_family {
            self.font_family = font_family;
        }
        if let Some(font_size) = patch.font_size {
            self.font_size = font_size;
        }
        if let Some(color) = &patch.color {
            self.color.clone_from(color);
        }
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(width) = patch.width {
            self.width = width;
        }
        if let Some(text_align) = patch.text_align {
            self.text_align = text_align;
        }
        if let Some(font_weight) = patch.font_weight {
            self.font_weight = font_weight;
        }
        if let Some(font_style) = patch.font_style {
            self.font_style = font_style;
        }
        if let Some(text_decoration) = patch.text_decoration {
            self.text_decoration = text_decoration;
        }
        if let Some(z_index) = patch.z_index {
            self.z_index = z_index;
        }
    }
}

/// Partial update for a [`TextElement`]. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextElementPatch {
    /// New role.
    pub kind: Option<TextKind>,
    /// New content.
    pub content: Option<String>,
    /// New font family.
    pub font_family: Option<FontFamily>,
    /// New font size.
    pub font_size: Option<f32>,
    /// New color.
    pub color: Option<String>,
    /// New left edge.
    pub x: Option<f32>,
    /// New top edge.
    pub y: Option<f32>,
    /// New width.
    pub width: Option<f32>,
    /// New alignment.
    pub text_align: Option<TextAlign>,
    /// New weight.
    pub font_weight: Option<FontWeight>,
    /// New style.
    pub font_style: Option<FontStyle>,
    /// New decoration line.
    pub text_decoration: Option<TextDecoration>,
    /// New stacking order.
    pub z_index: Option<i32>,
}

impl TextElementPatch {
    /// Patch that only moves the element. Used by drag interactions.
    #[must_use]
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Patch that only replaces the content.
    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }
}

/// The single image a slide may hold.
///
/// Placement fields are percentages of the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideImage {
    /// Unique identifier. A replaced image always gets a new one.
    pub id: ImageId,
    /// Image data as a `data:` URL.
    #[serde(alias = "src")]
    pub source_data: String,
    /// Alternative text.
    #[serde(alias = "alt", default)]
    pub alt_text: String,
    /// Intrinsic width in pixels.
    pub original_width: u32,
    /// Intrinsic height in pixels.
    pub original_height: u32,
    /// Left edge, percent.
    pub x: f32,
    /// Top edge, percent.
    pub y: f32,
    /// Width, percent.
    pub width: f32,
    /// Height, percent.
    pub height: f32,
    /// Stacking order.
    #[serde(default = "default_image_z_index")]
    pub z_index: i32,
}

impl SlideImage {
    /// Copy of this image under a fresh identifier.
    #[must_use]
    pub fn reidentified(&self) -> Self {
        Self {
            id: ImageId::new(),
            ..self.clone()
        }
    }

    /// Apply a partial placement update.
    pub fn apply(&mut self, patch: &ImagePatch) {
        if let Some(alt_text) = &patch.alt_text {
            self.alt_text.clone_from(alt_text);
        }
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(width) = patch.width {
            self.width = width;
        }
        if let Some(height) = patch.height {
            self.height = height;
        }
        if let Some(z_index) = patch.z_index {
            self.z_index = z_index;
        }
    }
}

/// Partial update for a [`SlideImage`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImagePatch {
    /// New alternative text.
    pub alt_text: Option<String>,
    /// New left edge.
    pub x: Option<f32>,
    /// New top edge.
    pub y: Option<f32>,
    /// New width.
    pub width: Option<f32>,
    /// New height.
    pub height: Option<f32>,
    /// New stacking order.
    pub z_index: Option<i32>,
}

impl ImagePatch {
    /// Patch that only moves the image.
    #[must_use]
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }
}
