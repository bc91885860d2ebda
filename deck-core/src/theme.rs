//! Slide theme palettes, text layout templates and the theme-matching
//! heuristic used to pick colors for new content.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::color::same_color;
use crate::element::{
    FontFamily, FontStyle, FontWeight, TextAlign, TextDecoration, TextElement, TextElementId,
    TextKind, DEFAULT_TEXT_Z_INDEX,
};
use crate::slide::Slide;

/// Whether a palette is light or dark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Dark text on a light background.
    Light,
    /// Light text on a dark background.
    Dark,
}

/// A slide color palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideTheme {
    /// Stable identifier, e.g. `classic-light`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Light or dark.
    pub mode: ThemeMode,
    /// Slide background color.
    pub background_color: String,
    /// Text color.
    pub text_color: String,
    /// Decoration color.
    pub decoration_color: String,
}

impl SlideTheme {
    fn builtin(
        id: &str,
        name: &str,
        mode: ThemeMode,
        background_color: &str,
        text_color: &str,
        decoration_color: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            mode,
            background_color: background_color.to_string(),
            text_color: text_color.to_string(),
            decoration_color: decoration_color.to_string(),
        }
    }
}

static SLIDE_THEMES: LazyLock<Vec<SlideTheme>> = LazyLock::new(|| {
    use ThemeMode::{Dark, Light};
    vec![
        SlideTheme::builtin("classic-light", "Classic Light", Light, "#FFFFFF", "#212121", "#757575"),
        SlideTheme::builtin("soft-blue", "Soft Blue", Light, "#E3F2FD", "#0D47A1", "#64B5F6"),
        SlideTheme::builtin("warm-sand", "Warm Sand", Light, "#FFF8E1", "#D84315", "#FFAB40"),
        SlideTheme::builtin("minty-fresh", "Minty Fresh", Light, "#E0F2F1", "#00695C", "#4DB6AC"),
        SlideTheme::builtin("deep-space", "Deep Space", Dark, "#263238", "#ECEFF1", "#546E7A"),
        SlideTheme::builtin("cyber-purple", "Cyber Purple", Dark, "#311B92", "#EDE7F6", "#B39DDB"),
        SlideTheme::builtin("forest-night", "Forest Night", Dark, "#2E7D32", "#E8F5E9", "#A5D6A7"),
        SlideTheme::builtin("charcoal-rose", "Charcoal Rose", Dark, "#424242", "#FCE4EC", "#F48FB1"),
    ]
});

/// The built-in theme catalog.
#[must_use]
pub fn slide_themes() -> &'static [SlideTheme] {
    &SLIDE_THEMES
}

/// The theme new documents start with (Classic Light).
#[must_use]
pub fn default_theme() -> &'static SlideTheme {
    &SLIDE_THEMES[0]
}

/// Look up a built-in theme by id.
#[must_use]
pub fn find_theme(id: &str) -> Option<&'static SlideTheme> {
    SLIDE_THEMES.iter().find(|t| t.id == id)
}

/// Built-in text layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateKind {
    /// No text.
    Blank,
    /// A centered title.
    TitleOnly,
    /// Title with a subtitle below.
    TitleSubtitle,
    /// Left aligned title and body.
    TitleBody,
    /// Quote with a right aligned attribution.
    QuoteAuthor,
}

/// Layout of one text block in a template. Content and color are supplied
/// when the template is instantiated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateElement {
    /// Role of the block.
    pub kind: TextKind,
    /// Font family.
    pub font_family: FontFamily,
    /// Font size in pixels.
    pub font_size: f32,
    /// Left edge, percent.
    pub x: f32,
    /// Top edge, percent.
    pub y: f32,
    /// Width, percent.
    pub width: f32,
    /// Alignment.
    pub text_align: TextAlign,
}

impl TemplateElement {
    /// Build a text element with a fresh id from this layout.
    #[must_use]
    pub fn instantiate(&self, content: impl Into<String>, color: impl Into<String>) -> TextElement {
        TextElement {
            id: TextElementId::new(),
            kind: self.kind,
            content: content.into(),
            font_family: self.font_family,
            font_size: self.font_size,
            color: color.into(),
            x: self.x,
            y: self.y,
            width: self.width,
            text_align: self.text_align,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            text_decoration: TextDecoration::None,
            z_index: DEFAULT_TEXT_Z_INDEX,
        }
    }
}

/// A named text layout.
#[derive(Debug, Clone, PartialEq)]
pub struct TextTemplate {
    /// Template identifier.
    pub id: TemplateKind,
    /// Display name.
    pub name: String,
    /// Blocks in stacking order.
    pub elements: Vec<TemplateElement>,
}

const fn layout(
    kind: TextKind,
    font_family: FontFamily,
    font_size: f32,
    (x, y, width): (f32, f32, f32),
    text_align: TextAlign,
) -> TemplateElement {
    TemplateElement {
        kind,
        font_family,
        font_size,
        x,
        y,
        width,
        text_align,
    }
}

static TEXT_TEMPLATES: LazyLock<Vec<TextTemplate>> = LazyLock::new(|| {
    use FontFamily::{Lato, Montserrat, PlayfairDisplay, Roboto};
    use TextAlign::{Center, Left, Right};
    use TextKind::{Body, Caption, Subtitle, Title};
    vec![
        TextTemplate {
            id: TemplateKind::Blank,
            name: "Blank".to_string(),
            elements: Vec::new(),
        },
        TextTemplate {
            id: TemplateKind::TitleOnly,
            name: "Title Only".to_string(),
            elements: vec![layout(Title, Montserrat, 48.0, (10.0, 35.0, 80.0), Center)],
        },
        TextTemplate {
            id: TemplateKind::TitleSubtitle,
            name: "Title & Subtitle".to_string(),
            elements: vec![
                layout(Title, PlayfairDisplay, 40.0, (10.0, 30.0, 80.0), Center),
                layout(Subtitle, Lato, 24.0, (10.0, 50.0, 80.0), Center),
            ],
        },
        TextTemplate {
            id: TemplateKind::TitleBody,
            name: "Title & Body".to_string(),
            elements: vec![
                layout(Title, Montserrat, 36.0, (10.0, 15.0, 80.0), Left),
                layout(Body, Roboto, 18.0, (10.0, 35.0, 80.0), Left),
            ],
        },
        TextTemplate {
            id: TemplateKind::QuoteAuthor,
            name: "Quote & Author".to_string(),
            elements: vec![
                layout(Body, PlayfairDisplay, 28.0, (15.0, 30.0, 70.0), Center),
                layout(Caption, Lato, 18.0, (15.0, 65.0, 70.0), Right),
            ],
        },
    ]
});

/// The built-in template catalog.
#[must_use]
pub fn text_templates() -> &'static [TextTemplate] {
    &TEXT_TEMPLATES
}

/// Look up a built-in template.
#[must_use]
pub fn find_template(kind: TemplateKind) -> Option<&'static TextTemplate> {
    TEXT_TEMPLATES.iter().find(|t| t.id == kind)
}

/// Layout used for text added one element at a time.
#[must_use]
pub fn default_text_layout() -> TemplateElement {
    find_template(TemplateKind::TitleOnly)
        .and_then(|t| t.elements.first().copied())
        .unwrap_or_else(|| {
            layout(
                TextKind::Body,
                FontFamily::Roboto,
                18.0,
                (10.0, 50.0, 80.0),
                TextAlign::Left,
            )
        })
}

/// Strategy for guessing colors for content added to an existing slide.
///
/// Implementations are best-effort: a slide whose colors were edited by hand
/// has no correct answer.
pub trait ColorStrategy: Send + Sync + std::fmt::Debug {
    /// Color for new text on `slide`.
    fn text_color(&self, slide: &Slide) -> String;

    /// Color for a new decoration on `slide`.
    fn decoration_color(&self, slide: &Slide) -> String;
}

/// Default [`ColorStrategy`]: match the slide against a theme catalog by
/// comparing color strings.
///
/// Text: a theme whose background equals the slide's and whose text color
/// equals one of the slide's text colors (any theme with the right
/// background when the slide has no text); otherwise the slide's first text
/// color; otherwise the fallback theme.
///
/// Decorations: the same exact match against decoration colors, then a
/// background-only match, then the slide's first decoration color, then a
/// theme whose text color equals the slide's first text color, then the
/// fallback theme.
#[derive(Debug, Clone)]
pub struct CatalogThemeMatcher {
    themes: Vec<SlideTheme>,
    fallback: SlideTheme,
}

impl CatalogThemeMatcher {
    /// Matcher over the built-in catalog, falling back to Classic Light.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(slide_themes().to_vec(), default_theme().clone())
    }

    /// Matcher over a custom catalog.
    #[must_use]
    pub fn new(themes: Vec<SlideTheme>, fallback: SlideTheme) -> Self {
        Self { themes, fallback }
    }

    fn on_background<'a>(&'a self, slide: &'a Slide) -> impl Iterator<Item = &'a SlideTheme> + 'a {
        self.themes
            .iter()
            .filter(move |t| same_color(&t.background_color, &slide.background_color))
    }
}

impl Default for CatalogThemeMatcher {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ColorStrategy for CatalogThemeMatcher {
    fn text_color(&self, slide: &Slide) -> String {
        let exact = self.on_background(slide).find(|theme| {
            slide.text_elements.is_empty()
                || slide
                    .text_elements
                    .iter()
                    .any(|el| same_color(&el.color, &theme.text_color))
        });
        if let Some(theme) = exact {
            return theme.text_color.clone();
        }
        slide
            .text_elements
            .first()
            .map_or_else(|| self.fallback.text_color.clone(), |el| el.color.clone())
    }

    fn decoration_color(&self, slide: &Slide) -> String {
        let exact = self.on_background(slide).find(|theme| {
            slide
                .decorations
                .iter()
                .any(|dec| same_color(&dec.color, &theme.decoration_color))
        });
        if let Some(theme) = exact.or_else(|| self.on_background(slide).next()) {
            return theme.decoration_color.clone();
        }
        if let Some(dec) = slide.decorations.first() {
            return dec.color.clone();
        }
        slide
            .text_elements
            .first()
            .and_then(|el| {
                self.themes
                    .iter()
                    .find(|t| same_color(&t.text_color, &el.color))
            })
            .map_or_else(
                || self.fallback.decoration_color.clone(),
                |theme| theme.decoration_color.clone(),
            )
    }
}
