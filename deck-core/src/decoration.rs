//! Decorations - borders, corner shapes, blobs and scattered backgrounds.
//!
//! Generated geometry (blob outlines and scatter fields) is cached on the
//! decoration and only regenerated when explicitly requested: on creation,
//! on refresh, on recolor, or when the geometry parameters change.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::element::DecorationId;
use crate::geometry::{
    clamp_blob_edges, clamp_blob_growth, generate_blob_outline, generate_scatter_field, GeometricShapeItem, ShapeFilter,
    BLOB_GENERATION_SIZE, DEFAULT_BLOB_EDGES, DEFAULT_BLOB_GROWTH, SCATTER_VIEWPORT,
};

/// Default border width in pixels.
pub const DEFAULT_BORDER_WIDTH: u32 = 4;

/// Decoration type tag as stored in documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecorationType {
    /// Placeholder with no visual.
    None,
    /// Triangular corner in the top-left.
    CornerElementTopLeft,
    /// Triangular corner in the top-right.
    CornerElementTopRight,
    /// Triangular corner in the bottom-left.
    CornerElementBottomLeft,
    /// Triangular corner in the bottom-right.
    CornerElementBottomRight,
    /// Rectangular frame.
    BorderSimple,
    /// Organic blob in the top-left.
    CornerBlobTopLeft,
    /// Organic blob in the top-right.
    CornerBlobTopRight,
    /// Organic blob in the bottom-left.
    CornerBlobBottomLeft,
    /// Organic blob in the bottom-right.
    CornerBlobBottomRight,
    /// Scattered geometric shapes behind the content.
    GeometricBackground,
}

impl DecorationType {
    /// Corner this type is anchored to, if any.
    #[must_use]
    pub const fn corner(self) -> Option<Corner> {
        match self {
            Self::CornerElementTopLeft | Self::CornerBlobTopLeft => Some(Corner::TopLeft),
            Self::CornerElementTopRight | Self::CornerBlobTopRight => Some(Corner::TopRight),
            Self::CornerElementBottomLeft | Self::CornerBlobBottomLeft => Some(Corner::BottomLeft),
            Self::CornerElementBottomRight | Self::CornerBlobBottomRight => {
                Some(Corner::BottomRight)
            }
            Self::None | Self::BorderSimple | Self::GeometricBackground => None,
        }
    }

    /// Whether this is one of the blob corner types.
    #[must_use]
    pub const fn is_blob(self) -> bool {
        matches!(
            self,
            Self::CornerBlobTopLeft
                | Self::CornerBlobTopRight
                | Self::CornerBlobBottomLeft
                | Self::CornerBlobBottomRight
        )
    }
}

/// A slide corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    /// Top-left.
    TopLeft,
    /// Top-right.
    TopRight,
    /// Bottom-left.
    BottomLeft,
    /// Bottom-right.
    BottomRight,
}

impl Corner {
    const fn element_type(self) -> DecorationType {
        match self {
            Self::TopLeft => DecorationType::CornerElementTopLeft,
            Self::TopRight => DecorationType::CornerElementTopRight,
            Self::BottomLeft => DecorationType::CornerElementBottomLeft,
            Self::BottomRight => DecorationType::CornerElementBottomRight,
        }
    }

    const fn blob_type(self) -> DecorationType {
        match self {
            Self::TopLeft => DecorationType::CornerBlobTopLeft,
            Self::TopRight => DecorationType::CornerBlobTopRight,
            Self::BottomLeft => DecorationType::CornerBlobBottomLeft,
            Self::BottomRight => DecorationType::CornerBlobBottomRight,
        }
    }
}

/// Which edges a simple border draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorderSides {
    /// Top edge.
    pub top: bool,
    /// Right edge.
    pub right: bool,
    /// Bottom edge.
    pub bottom: bool,
    /// Left edge.
    pub left: bool,
}

impl Default for BorderSides {
    fn default() -> Self {
        Self {
            top: true,
            right: true,
            bottom: true,
            left: true,
        }
    }
}

/// Variant-specific decoration data.
#[derive(Debug, Clone, PartialEq)]
pub enum DecorationKind {
    /// No visual.
    None,
    /// Triangular corner shape.
    CornerElement {
        /// Anchor corner.
        corner: Corner,
    },
    /// Rectangular frame.
    BorderSimple {
        /// Edges drawn.
        border_sides: BorderSides,
        /// Line width in pixels.
        border_width: u32,
    },
    /// Organic blob anchored to a corner.
    CornerBlob {
        /// Anchor corner.
        corner: Corner,
        /// Number of lobes.
        blob_edges: u32,
        /// Roundness, 1..=10.
        blob_growth: u32,
        /// Cached outline as SVG path data.
        blob_path_data: String,
    },
    /// Scattered shapes.
    GeometricBackground {
        /// Pre-generated shapes.
        shapes: Vec<GeometricShapeItem>,
        /// Shape filter the field was generated with.
        selected_shape_type: ShapeFilter,
        /// How many of `shapes` are displayed; never above `shapes.len()`.
        visible_shape_count: usize,
    },
}

/// A decoration on a slide.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoration {
    /// Unique identifier.
    pub id: DecorationId,
    /// Primary color as hex.
    pub color: String,
    /// Whether the page number is drawn alongside the decoration.
    pub show_page_number: Option<bool>,
    /// Variant data.
    pub kind: DecorationKind,
}

/// Partial update for a [`Decoration`]. Fields that do not apply to the
/// decoration's variant are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecorationPatch {
    /// New color. Scatter fields are regenerated in the new color.
    pub color: Option<String>,
    /// New page number flag.
    pub show_page_number: Option<bool>,
    /// New border edges.
    pub border_sides: Option<BorderSides>,
    /// New border width.
    pub border_width: Option<u32>,
    /// New blob lobe count; regenerates the outline.
    pub blob_edges: Option<u32>,
    /// New blob roundness; regenerates the outline.
    pub blob_growth: Option<u32>,
    /// New shape filter; regenerates the scatter field.
    pub selected_shape_type: Option<ShapeFilter>,
    /// New visible shape count, clamped to the field size.
    pub visible_shape_count: Option<usize>,
}

fn blob_outline<R: Rng + ?Sized>(edges: u32, growth: u32, rng: &mut R) -> String {
    generate_blob_outline(edges, growth, BLOB_GENERATION_SIZE, rng)
}

impl Decoration {
    /// Create a decoration of `decoration_type` with freshly generated
    /// geometry and type-appropriate defaults.
    pub fn new<R: Rng + ?Sized>(
        decoration_type: DecorationType,
        color: impl Into<String>,
        rng: &mut R,
    ) -> Self {
        let color = color.into();
        let kind = match decoration_type {
            DecorationType::None => DecorationKind::None,
            DecorationType::BorderSimple => DecorationKind::BorderSimple {
                border_sides: BorderSides::default(),
                border_width: DEFAULT_BORDER_WIDTH,
            },
            DecorationType::GeometricBackground => {
                let shapes =
                    generate_scatter_field(&color, SCATTER_VIEWPORT, ShapeFilter::Mixed, rng);
                DecorationKind::GeometricBackground {
                    visible_shape_count: shapes.len(),
                    shapes,
                    selected_shape_type: ShapeFilter::Mixed,
                }
            }
            blob if blob.is_blob() => DecorationKind::CornerBlob {
                corner: blob.corner().unwrap_or(Corner::TopLeft),
                blob_edges: DEFAULT_BLOB_EDGES,
                blob_growth: DEFAULT_BLOB_GROWTH,
                blob_path_data: blob_outline(DEFAULT_BLOB_EDGES, DEFAULT_BLOB_GROWTH, rng),
            },
            corner => DecorationKind::CornerElement {
                corner: corner.corner().unwrap_or(Corner::TopLeft),
            },
        };
        let show_page_number = match kind {
            DecorationKind::GeometricBackground { .. } => None,
            _ => Some(false),
        };
        Self {
            id: DecorationId::new(),
            color,
            show_page_number,
            kind,
        }
    }

    /// The type tag of this decoration.
    #[must_use]
    pub fn decoration_type(&self) -> DecorationType {
        match &self.kind {
            DecorationKind::None => DecorationType::None,
            DecorationKind::CornerElement { corner } => corner.element_type(),
            DecorationKind::BorderSimple { .. } => DecorationType::BorderSimple,
            DecorationKind::CornerBlob { corner, .. } => corner.blob_type(),
            DecorationKind::GeometricBackground { .. } => DecorationType::GeometricBackground,
        }
    }

    /// Shapes currently displayed by a scatter field (empty for other kinds).
    #[must_use]
    pub fn visible_shapes(&self) -> &[GeometricShapeItem] {
        match &self.kind {
            DecorationKind::GeometricBackground {
                shapes,
                visible_shape_count,
                ..
            } => &shapes[..(*visible_shape_count).min(shapes.len())],
            _ => &[],
        }
    }

    /// Deep copy with fresh identifiers for the decoration and its shapes.
    /// Cached geometry is kept as-is.
    #[must_use]
    pub fn reidentified(&self) -> Self {
        let mut copy = self.clone();
        copy.id = DecorationId::new();
        if let DecorationKind::GeometricBackground { shapes, .. } = &mut copy.kind {
            for shape in shapes.iter_mut() {
                *shape = shape.reidentified();
            }
        }
        copy
    }

    /// Regenerate cached geometry with the current parameters.
    ///
    /// Blob outlines get a new path, scatter fields a new shape set with the
    /// visible count reset to the new length. Other kinds are untouched.
    pub fn regenerate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        match &mut self.kind {
            DecorationKind::CornerBlob {
                blob_edges,
                blob_growth,
                blob_path_data,
                ..
            } => {
                *blob_path_data = blob_outline(*blob_edges, *blob_growth, rng);
            }
            DecorationKind::GeometricBackground {
                shapes,
                selected_shape_type,
                visible_shape_count,
            } => {
                *shapes =
                    generate_scatter_field(&self.color, SCATTER_VIEWPORT, *selected_shape_type, rng);
                *visible_shape_count = shapes.len();
            }
            DecorationKind::None
            | DecorationKind::CornerElement { .. }
            | DecorationKind::BorderSimple { .. } => {}
        }
    }

    /// Change the color. Scatter fields bake color into each shape, so they
    /// are regenerated; a previously reduced visible count is kept when it
    /// still fits the new field.
    pub fn recolor<R: Rng + ?Sized>(&mut self, color: &str, rng: &mut R) {
        color.clone_into(&mut self.color);
        if let DecorationKind::GeometricBackground {
            shapes,
            selected_shape_type,
            visible_shape_count,
        } = &mut self.kind
        {
            let previous = *visible_shape_count;
            let previous_len = shapes.len();
            *shapes = generate_scatter_field(color, SCATTER_VIEWPORT, *selected_shape_type, rng);
            *visible_shape_count = if previous < previous_len {
                previous.min(shapes.len())
            } else {
                shapes.len()
            };
        }
    }

    /// Apply a partial update, regenerating geometry where a parameter that
    /// drives it changed.
    pub fn apply<R: Rng + ?Sized>(&mut self, patch: &DecorationPatch, rng: &mut R) {
        if let Some(show) = patch.show_page_number {
            self.show_page_number = Some(show);
        }
        if let Some(color) = &patch.color {
            if *color != self.color {
                self.recolor(color, rng);
            }
        }

        let mut regenerate = false;
        match &mut self.kind {
            DecorationKind::BorderSimple {
                border_sides,
                border_width,
            } => {
                if let Some(sides) = patch.border_sides {
                    *border_sides = sides;
                }
                if let Some(width) = patch.border_width {
                    *border_width = width;
                }
            }
            DecorationKind::CornerBlob {
                blob_edges,
                blob_growth,
                ..
            } => {
                if let Some(edges) = patch.blob_edges {
                    *blob_edges = clamp_blob_edges(edges);
                    regenerate = true;
                }
                if let Some(growth) = patch.blob_growth {
                    *blob_growth = clamp_blob_growth(growth);
                    regenerate = true;
                }
            }
            DecorationKind::GeometricBackground {
                shapes,
                selected_shape_type,
                visible_shape_count,
            } => {
                if let Some(filter) = patch.selected_shape_type {
                    *selected_shape_type = filter;
                    regenerate = true;
                } else if let Some(count) = patch.visible_shape_count {
                    *visible_shape_count = count.min(shapes.len());
                }
            }
            DecorationKind::None | DecorationKind::CornerElement { .. } => {}
        }

        if regenerate {
            self.regenerate(rng);
        }
    }
}
