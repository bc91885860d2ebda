//! Persisted document record and rehydration.
//!
//! The runtime model keeps decorations as a typed enum and thumbnails as a
//! cache. The record form is a flat camelCase JSON shape that older documents
//! can be read into, with every variant-specific field optional so that
//! legacy decorations can be backfilled on load.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::canvas::{AspectRatio, CanvasConfig, CanvasDimensions};
use crate::decoration::{
    BorderSides, Corner, Decoration, DecorationKind, DecorationType, DEFAULT_BORDER_WIDTH,
};
use crate::element::{
    DecorationId, ImageId, ShapeId, SlideId, SlideImage, TextElement, TextElementId,
};
use crate::geometry::{
    clamp_blob_edges, clamp_blob_growth, generate_blob_outline, generate_scatter_field, polygon_points, GeometricShapeItem,
    ShapeFilter, BLOB_GENERATION_SIZE, DEFAULT_BLOB_EDGES, DEFAULT_BLOB_GROWTH, SCATTER_VIEWPORT,
};
use crate::slide::{Slide, ThumbnailState};
use crate::theme::default_theme;

/// Record key holding the slide list.
pub const SLIDES_KEY: &str = "slides";
/// Record key holding the active slide id.
pub const ACTIVE_SLIDE_KEY: &str = "activeSlideId";
/// Record key holding the canvas dimensions.
pub const CANVAS_DIMENSIONS_KEY: &str = "canvasDimensions";
/// Record key holding the aspect ratio.
pub const ASPECT_RATIO_KEY: &str = "aspectRatio";

const LEGACY_CANVAS_DIMENSIONS_KEY: &str = "slideDimensions";
const LEGACY_ASPECT_RATIO_KEY: &str = "selectedAspectRatio";

fn default_background() -> String {
    default_theme().background_color.clone()
}

fn default_decoration_color() -> String {
    default_theme().decoration_color.clone()
}

/// Flat persisted form of a [`Decoration`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecorationRecord {
    /// Identifier.
    pub id: DecorationId,
    /// Type tag.
    #[serde(rename = "type")]
    pub decoration_type: DecorationType,
    /// Primary color.
    #[serde(default = "default_decoration_color")]
    pub color: String,
    /// Page number flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_page_number: Option<bool>,
    /// Border edges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_sides: Option<BorderSides>,
    /// Border width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<u32>,
    /// Blob lobe count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_edges: Option<u32>,
    /// Blob roundness.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_growth: Option<u32>,
    /// Cached blob outline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_path_data: Option<String>,
    /// Scatter field shapes.
    #[serde(
        default,
        alias = "geometricShapes",
        skip_serializing_if = "Option::is_none"
    )]
    pub shapes: Option<Vec<GeometricShapeItem>>,
    /// Scatter field filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_shape_type: Option<ShapeFilter>,
    /// Visible scatter shapes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_shape_count: Option<usize>,
}

impl From<&Decoration> for DecorationRecord {
    fn from(decoration: &Decoration) -> Self {
        let mut record = Self {
            id: decoration.id,
            decoration_type: decoration.decoration_type(),
            color: decoration.color.clone(),
            show_page_number: decoration.show_page_number,
            border_sides: None,
            border_width: None,
            blob_edges: None,
            blob_growth: None,
            blob_path_data: None,
            shapes: None,
            selected_shape_type: None,
            visible_shape_count: None,
        };
        match &decoration.kind {
            DecorationKind::BorderSimple {
                border_sides,
                border_width,
            } => {
                record.border_sides = Some(*border_sides);
                record.border_width = Some(*border_width);
            }
            DecorationKind::CornerBlob {
                blob_edges,
                blob_growth,
                blob_path_data,
                ..
            } => {
                record.blob_edges = Some(*blob_edges);
                record.blob_growth = Some(*blob_growth);
                record.blob_path_data = Some(blob_path_data.clone());
            }
            DecorationKind::GeometricBackground {
                shapes,
                selected_shape_type,
                visible_shape_count,
            } => {
                record.shapes = Some(shapes.clone());
                record.selected_shape_type = Some(*selected_shape_type);
                record.visible_shape_count = Some(*visible_shape_count);
            }
            DecorationKind::None | DecorationKind::CornerElement { .. } => {}
        }
        record
    }
}

impl DecorationRecord {
    /// Materialize the runtime decoration, backfilling missing fields with
    /// defaults and generating geometry that was never stored.
    pub fn into_decoration<R: Rng + ?Sized>(self, rng: &mut R) -> Decoration {
        let ty = self.decoration_type;
        let kind = match ty {
            DecorationType::None => DecorationKind::None,
            DecorationType::BorderSimple => DecorationKind::BorderSimple {
                border_sides: self.border_sides.unwrap_or_default(),
                border_width: self
                    .border_width
                    .filter(|w| *w > 0)
                    .unwrap_or(DEFAULT_BORDER_WIDTH),
            },
            DecorationType::GeometricBackground => {
                let filter = self.selected_shape_type.unwrap_or_default();
                let shapes = match self.shapes {
                    Some(shapes) if !shapes.is_empty() => {
                        shapes.into_iter().map(with_polygon_points).collect()
                    }
                    _ => generate_scatter_field(&self.color, SCATTER_VIEWPORT, filter, rng),
                };
                let visible_shape_count = self
                    .visible_shape_count
                    .map_or(shapes.len(), |count| count.min(shapes.len()));
                DecorationKind::GeometricBackground {
                    shapes,
                    selected_shape_type: filter,
                    visible_shape_count,
                }
            }
            blob if blob.is_blob() => {
                let blob_edges = clamp_blob_edges(self.blob_edges.unwrap_or(DEFAULT_BLOB_EDGES));
                let blob_growth = clamp_blob_growth(self.blob_growth.unwrap_or(DEFAULT_BLOB_GROWTH));
                let blob_path_data = self
                    .blob_path_data
                    .filter(|path| !path.is_empty())
                    .unwrap_or_else(|| {
                        generate_blob_outline(blob_edges, blob_growth, BLOB_GENERATION_SIZE, rng)
                    });
                DecorationKind::CornerBlob {
                    corner: blob.corner().unwrap_or(Corner::TopLeft),
                    blob_edges,
                    blob_growth,
                    blob_path_data,
                }
            }
            corner => DecorationKind::CornerElement {
                corner: corner.corner().unwrap_or(Corner::TopLeft),
            },
        };
        Decoration {
            id: self.id,
            color: self.color,
            show_page_number: self.show_page_number,
            kind,
        }
    }
}

/// Polygon vertices are derived data; recompute them when absent.
fn with_polygon_points(mut shape: GeometricShapeItem) -> GeometricShapeItem {
    if shape.polygon_points.is_none() {
        shape.polygon_points = polygon_points(shape.shape_type, shape.size);
    }
    shape
}

/// Persisted form of a [`Slide`]. Thumbnails are never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideRecord {
    /// Identifier.
    pub id: SlideId,
    /// Background color.
    #[serde(default = "default_background")]
    pub background_color: String,
    /// Decorations.
    #[serde(default)]
    pub decorations: Vec<DecorationRecord>,
    /// Text blocks.
    #[serde(default)]
    pub text_elements: Vec<TextElement>,
    /// Image slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<SlideImage>,
}

impl From<&Slide> for SlideRecord {
    fn from(slide: &Slide) -> Self {
        Self {
            id: slide.id,
            background_color: slide.background_color.clone(),
            decorations: slide.decorations.iter().map(DecorationRecord::from).collect(),
            text_elements: slide.text_elements.clone(),
            image: slide.image.clone(),
        }
    }
}

impl SlideRecord {
    /// Materialize the runtime slide with a pending thumbnail.
    pub fn into_slide<R: Rng + ?Sized>(self, rng: &mut R) -> Slide {
        Slide {
            id: self.id,
            background_color: self.background_color,
            decorations: self
                .decorations
                .into_iter()
                .map(|record| record.into_decoration(rng))
                .collect(),
            text_elements: self.text_elements,
            image: self.image,
            thumbnail: ThumbnailState::Pending,
        }
    }
}

/// The full persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    /// Slides in display order.
    pub slides: Vec<SlideRecord>,
    /// Active slide pointer.
    pub active_slide_id: Option<SlideId>,
    /// Canvas size.
    pub canvas_dimensions: CanvasDimensions,
    /// Canvas aspect ratio.
    pub aspect_ratio: AspectRatio,
}

impl DocumentRecord {
    /// Snapshot the runtime state.
    #[must_use]
    pub fn capture(slides: &[Slide], active_slide_id: Option<SlideId>, canvas: &CanvasConfig) -> Self {
        Self {
            slides: slides.iter().map(SlideRecord::from).collect(),
            active_slide_id,
            canvas_dimensions: canvas.dimensions,
            aspect_ratio: canvas.aspect_ratio,
        }
    }
}

/// Result of loading a persisted document.
#[derive(Debug, Clone)]
pub struct Rehydrated {
    /// Slides; never empty.
    pub slides: Vec<Slide>,
    /// Active slide; always one of `slides`.
    pub active_slide_id: SlideId,
    /// Canvas configuration.
    pub canvas: CanvasConfig,
    /// Whether the slide section was restored from the record.
    pub slides_restored: bool,
    /// Whether the canvas section was restored from the record.
    pub canvas_restored: bool,
}

impl Rehydrated {
    /// A fresh single-slide document.
    #[must_use]
    pub fn fresh() -> Self {
        let slide = Slide::with_default_content();
        Self {
            active_slide_id: slide.id,
            slides: vec![slide],
            canvas: CanvasConfig::default(),
            slides_restored: false,
            canvas_restored: false,
        }
    }
}

fn section<'a>(record: &'a Value, key: &str, legacy: Option<&str>) -> Option<&'a Value> {
    record
        .get(key)
        .or_else(|| legacy.and_then(|legacy| record.get(legacy)))
}

fn parse_canvas(record: &Value) -> Option<CanvasConfig> {
    let dimensions: CanvasDimensions = serde_json::from_value(
        section(record, CANVAS_DIMENSIONS_KEY, Some(LEGACY_CANVAS_DIMENSIONS_KEY))?.clone(),
    )
    .ok()
    .filter(|dims: &CanvasDimensions| dims.is_valid())?;
    let aspect_ratio: AspectRatio = serde_json::from_value(
        section(record, ASPECT_RATIO_KEY, Some(LEGACY_ASPECT_RATIO_KEY))?.clone(),
    )
    .ok()?;
    Some(CanvasConfig {
        dimensions,
        aspect_ratio,
    })
}

fn dedupe_ids(slides: &mut [Slide]) -> usize {
    let mut seen: HashSet<Uuid> = HashSet::new();
    let mut replaced = 0;
    let mut fresh = |uuid: Uuid| -> Option<Uuid> {
        if seen.insert(uuid) {
            None
        } else {
            replaced += 1;
            let new = Uuid::new_v4();
            seen.insert(new);
            Some(new)
        }
    };
    for slide in slides.iter_mut() {
        if let Some(id) = fresh(slide.id.as_uuid()) {
            slide.id = SlideId::from_uuid(id);
        }
        for el in &mut slide.text_elements {
            if let Some(id) = fresh(el.id.as_uuid()) {
                el.id = TextElementId::from_uuid(id);
            }
        }
        for dec in &mut slide.decorations {
            if let Some(id) = fresh(dec.id.as_uuid()) {
                dec.id = DecorationId::from_uuid(id);
            }
            if let DecorationKind::GeometricBackground { shapes, .. } = &mut dec.kind {
                for shape in shapes.iter_mut() {
                    if let Some(id) = fresh(shape.id.as_uuid()) {
                        shape.id = ShapeId::from_uuid(id);
                    }
                }
            }
        }
        if let Some(image) = &mut slide.image {
            if let Some(id) = fresh(image.id.as_uuid()) {
                image.id = ImageId::from_uuid(id);
            }
        }
    }
    replaced
}

/// Rebuild runtime state from a persisted record.
///
/// The slide section (`slides` plus `activeSlideId`) and the canvas section
/// (`canvasDimensions` plus `aspectRatio`) are validated independently; a
/// section that fails validation is replaced by its default as a whole.
/// Never fails: an absent or malformed record yields a fresh document.
pub fn rehydrate<R: Rng + ?Sized>(record: Option<&Value>, rng: &mut R) -> Rehydrated {
    let mut result = Rehydrated::fresh();
    let Some(record) = record.filter(|value| value.is_object()) else {
        if record.is_some() {
            tracing::warn!("Persisted document is not an object; starting fresh");
        }
        return result;
    };

    match parse_canvas(record) {
        Some(canvas) => {
            result.canvas = canvas;
            result.canvas_restored = true;
        }
        None => tracing::warn!("Persisted canvas configuration invalid; using defaults"),
    }

    let slides = record
        .get(SLIDES_KEY)
        .map(|value| serde_json::from_value::<Vec<SlideRecord>>(value.clone()));
    match slides {
        Some(Ok(records)) if !records.is_empty() => {
            let mut slides: Vec<Slide> = records
                .into_iter()
                .map(|record| record.into_slide(rng))
                .collect();
            let replaced = dedupe_ids(&mut slides);
            if replaced > 0 {
                tracing::warn!(replaced, "Re-identified duplicate ids in persisted document");
            }
            let active = record
                .get(ACTIVE_SLIDE_KEY)
                .and_then(Value::as_str)
                .map(SlideId::parse_lenient)
                .filter(|id| slides.iter().any(|s| s.id == *id));
            if let Some(first) = slides.first() {
                result.active_slide_id = active.unwrap_or(first.id);
                result.slides = slides;
                result.slides_restored = true;
            }
        }
        Some(Ok(_)) => tracing::debug!("Persisted slide list empty; synthesizing default slide"),
        Some(Err(e)) => tracing::warn!(error = %e, "Persisted slides invalid; using defaults"),
        None => tracing::debug!("No persisted slides"),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ShapeType, MAX_BLOB_EDGES};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    #[test]
    fn test_absent_record_is_fresh() {
        let doc = rehydrate(None, &mut rng());
        assert_eq!(doc.slides.len(), 1);
        assert_eq!(doc.active_slide_id, doc.slides[0].id);
        assert!(!doc.slides_restored);
        assert!(!doc.canvas_restored);
    }

    #[test]
    fn test_non_object_record_is_fresh() {
        let doc = rehydrate(Some(&json!([1, 2, 3])), &mut rng());
        assert_eq!(doc.slides.len(), 1);
        assert_eq!(doc.canvas, CanvasConfig::default());
    }

    #[test]
    fn test_slides_not_array_falls_back() {
        let record = json!({
            "slides": "oops",
            "canvasDimensions": {"width": 400, "height": 500},
            "aspectRatio": "4:5"
        });
        let doc = rehydrate(Some(&record), &mut rng());
        assert!(!doc.slides_restored);
        assert_eq!(doc.slides.len(), 1);
        assert!(doc.canvas_restored);
        assert_eq!(doc.canvas.dimensions, CanvasDimensions::new(400, 500));
    }

    #[test]
    fn test_canvas_with_non_numeric_width_falls_back() {
        let record = json!({
            "slides": [{"id": "a", "backgroundColor": "#000000"}],
            "canvasDimensions": {"width": "wide", "height": 500},
            "aspectRatio": "4:5"
        });
        let doc = rehydrate(Some(&record), &mut rng());
        assert!(doc.slides_restored);
        assert!(!doc.canvas_restored);
        assert_eq!(doc.canvas, CanvasConfig::default());
    }

    #[test]
    fn test_legacy_canvas_keys() {
        let record = json!({
            "slideDimensions": {"width": 1080, "height": 1080},
            "selectedAspectRatio": "1:1"
        });
        let doc = rehydrate(Some(&record), &mut rng());
        assert!(doc.canvas_restored);
        assert_eq!(doc.canvas.dimensions, CanvasDimensions::new(1080, 1080));
    }

    #[test]
    fn test_legacy_border_backfilled() {
        let record = json!({
            "slides": [{
                "id": "s1",
                "backgroundColor": "#FFFFFF",
                "decorations": [{"id": "d1", "type": "BORDER_SIMPLE", "color": "#757575"}],
                "textElements": []
            }],
            "activeSlideId": "s1"
        });
        let doc = rehydrate(Some(&record), &mut rng());
        let dec = &doc.slides[0].decorations[0];
        assert_eq!(
            dec.kind,
            DecorationKind::BorderSimple {
                border_sides: BorderSides::default(),
                border_width: DEFAULT_BORDER_WIDTH,
            }
        );
        assert_eq!(doc.active_slide_id, SlideId::parse_lenient("s1"));
    }

    #[test]
    fn test_legacy_blob_and_scatter_backfilled() {
        let record = json!({
            "slides": [{
                "id": "s1",
                "decorations": [
                    {"id": "b", "type": "CORNER_BLOB_TOP_RIGHT", "color": "#757575"},
                    {"id": "g", "type": "GEOMETRIC_BACKGROUND", "color": "#4DB6AC",
                     "selectedShapeType": "square", "visibleShapeCount": 3}
                ]
            }]
        });
        let doc = rehydrate(Some(&record), &mut rng());
        let slide = &doc.slides[0];
        match &slide.decorations[0].kind {
            DecorationKind::CornerBlob {
                corner,
                blob_edges,
                blob_growth,
                blob_path_data,
            } => {
                assert_eq!(*corner, Corner::TopRight);
                assert_eq!(*blob_edges, DEFAULT_BLOB_EDGES);
                assert_eq!(*blob_growth, DEFAULT_BLOB_GROWTH);
                assert!(!blob_path_data.is_empty());
            }
            other => panic!("unexpected kind {other:?}"),
        }
        match &slide.decorations[1].kind {
            DecorationKind::GeometricBackground {
                shapes,
                selected_shape_type,
                visible_shape_count,
            } => {
                assert!(!shapes.is_empty());
                assert!(shapes.iter().all(|s| s.shape_type == ShapeType::Square));
                assert_eq!(*selected_shape_type, ShapeFilter::Only(ShapeType::Square));
                assert_eq!(*visible_shape_count, 3);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_oversized_blob_edges_are_capped_on_load() {
        let record = json!({
            "slides": [{
                "id": "s1",
                "decorations": [{
                    "id": "b", "type": "CORNER_BLOB_BOTTOM_RIGHT", "color": "#757575",
                    "blobEdges": 2_000_000, "blobGrowth": 99
                }]
            }]
        });
        let doc = rehydrate(Some(&record), &mut rng());
        match &doc.slides[0].decorations[0].kind {
            DecorationKind::CornerBlob {
                blob_edges,
                blob_growth,
                blob_path_data,
                ..
            } => {
                assert_eq!(*blob_edges, MAX_BLOB_EDGES);
                assert_eq!(*blob_growth, 10);
                assert_eq!(blob_path_data.matches('Q').count(), MAX_BLOB_EDGES as usize);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_legacy_shapes_get_polygon_points() {
        let record = json!({
            "slides": [{
                "id": "s1",
                "decorations": [{
                    "id": "g", "type": "GEOMETRIC_BACKGROUND", "color": "#4DB6AC",
                    "geometricShapes": [
                        {"shapeType": "hexagon", "cx": 10, "cy": 10, "size": 8,
                         "fill": "#4db6ac", "opacity": 0.1, "rotation": 0},
                        {"shapeType": "circle", "cx": 50, "cy": 50, "size": 8,
                         "fill": "#4db6ac", "opacity": 0.1, "rotation": 0}
                    ],
                    "visibleShapeCount": 99
                }]
            }]
        });
        let doc = rehydrate(Some(&record), &mut rng());
        let DecorationKind::GeometricBackground {
            shapes,
            visible_shape_count,
            ..
        } = &doc.slides[0].decorations[0].kind
        else {
            panic!("expected scatter field");
        };
        assert_eq!(shapes.len(), 2);
        assert_eq!(*visible_shape_count, 2);
        assert_eq!(shapes[0].polygon_points.as_ref().map(Vec::len), Some(6));
        assert!(shapes[1].polygon_points.is_none());
        assert_ne!(shapes[0].id, shapes[1].id);
    }

    #[test]
    fn test_invalid_active_pointer_falls_back_to_first() {
        let record = json!({
            "slides": [{"id": "s1"}, {"id": "s2"}],
            "activeSlideId": "gone"
        });
        let doc = rehydrate(Some(&record), &mut rng());
        assert_eq!(doc.active_slide_id, doc.slides[0].id);
    }

    #[test]
    fn test_empty_slide_list_synthesizes_default() {
        let doc = rehydrate(Some(&json!({"slides": []})), &mut rng());
        assert_eq!(doc.slides.len(), 1);
        assert_eq!(doc.active_slide_id, doc.slides[0].id);
    }

    #[test]
    fn test_duplicate_ids_are_reidentified() {
        let record = json!({
            "slides": [{"id": "same"}, {"id": "same"}],
            "activeSlideId": "same"
        });
        let doc = rehydrate(Some(&record), &mut rng());
        assert_ne!(doc.slides[0].id, doc.slides[1].id);
        assert_eq!(doc.active_slide_id, doc.slides[0].id);
    }

    #[test]
    fn test_thumbnails_are_pending_after_load() {
        let record = json!({
            "slides": [{"id": "s1", "thumbnail": "data:image/png;base64,AAAA"}]
        });
        let doc = rehydrate(Some(&record), &mut rng());
        assert_eq!(doc.slides[0].thumbnail, ThumbnailState::Pending);
    }

    #[test]
    fn test_capture_then_rehydrate_preserves_document() {
        let mut r = rng();
        let mut slide = Slide::with_default_content();
        slide.decorations.push(Decoration::new(
            DecorationType::CornerBlobBottomLeft,
            "#757575",
            &mut r,
        ));
        slide.decorations.push(Decoration::new(
            DecorationType::GeometricBackground,
            "#757575",
            &mut r,
        ));
        let canvas = CanvasConfig {
            dimensions: CanvasDimensions::new(400, 500),
            aspect_ratio: AspectRatio::Portrait4x5,
        };
        let record = DocumentRecord::capture(std::slice::from_ref(&slide), Some(slide.id), &canvas);
        let value = serde_json::to_value(&record).expect("serialize");
        assert!(value.get("canvasDimensions").is_some());
        assert_eq!(value["aspectRatio"], "4:5");

        let doc = rehydrate(Some(&value), &mut r);
        assert_eq!(doc.slides, vec![slide.clone()]);
        assert_eq!(doc.active_slide_id, slide.id);
        assert_eq!(doc.canvas, canvas);
    }
}
