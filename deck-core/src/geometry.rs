//! Decorative geometry: organic blob outlines and scatter fields.
//!
//! All generators are pure apart from the random source they are handed.
//! Results are meant to be cached on the owning decoration; nothing here is
//! stable across calls.

use std::f64::consts::PI;
use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::color::vary_color;
use crate::element::ShapeId;
use rand::Rng;

/// Fewest shapes in a generated scatter field.
pub const MIN_SCATTER_SHAPES: usize = 5;
/// Most shapes in a generated scatter field.
pub const MAX_SCATTER_SHAPES: usize = 15;
/// Shape size band, in viewport units (circumradius).
pub const SCATTER_SIZE_RANGE: (f64, f64) = (5.0, 20.0);
/// Shape opacity band.
pub const SCATTER_OPACITY_RANGE: (f64, f64) = (0.05, 0.25);
/// Fraction of a shape's size it may overhang the viewport edge.
pub const SCATTER_EDGE_OVERHANG: f64 = 0.6;
/// Scatter fields are laid out in a square viewport of this size.
pub const SCATTER_VIEWPORT: f64 = 100.0;

/// Default number of blob lobes.
pub const DEFAULT_BLOB_EDGES: u32 = 6;
/// Default blob growth (1..=10, higher is rounder).
pub const DEFAULT_BLOB_GROWTH: u32 = 6;

/// Fewest lobes a blob outline can have.
pub const MIN_BLOB_EDGES: u32 = 3;

/// Most lobes a blob outline can have.
pub const MAX_BLOB_EDGES: u32 = 20;

/// Inclusive bounds of the blob growth factor.
pub const BLOB_GROWTH_RANGE: (u32, u32) = (1, 10);
/// Side of the square the blob outline is generated in.
pub const BLOB_GENERATION_SIZE: f64 = 200.0;

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

/// Shape drawn by one scatter-field item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    /// Circle.
    Circle,
    /// Equilateral triangle.
    Triangle,
    /// Square.
    Square,
    /// Regular pentagon.
    Pentagon,
    /// Regular hexagon.
    Hexagon,
}

impl ShapeType {
    /// All shape types, the pool a mixed field draws from.
    pub const ALL: [Self; 5] = [
        Self::Circle,
        Self::Triangle,
        Self::Square,
        Self::Pentagon,
        Self::Hexagon,
    ];

    /// Number of polygon sides, `None` for circles.
    #[must_use]
    pub const fn sides(self) -> Option<u32> {
        match self {
            Self::Circle => None,
            Self::Triangle => Some(3),
            Self::Square => Some(4),
            Self::Pentagon => Some(5),
            Self::Hexagon => Some(6),
        }
    }

    /// Angle of the first vertex so the polygon sits upright before rotation.
    #[must_use]
    pub fn angle_offset(self) -> f64 {
        match self {
            Self::Circle | Self::Hexagon => 0.0,
            Self::Triangle => -PI / 2.0,
            Self::Square => PI / 4.0,
            Self::Pentagon => -PI / 2.0 + PI / 5.0,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Triangle => "triangle",
            Self::Square => "square",
            Self::Pentagon => "pentagon",
            Self::Hexagon => "hexagon",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

/// Which shapes a scatter field may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ShapeFilter {
    /// Any shape type.
    #[default]
    Mixed,
    /// Only the given type.
    Only(ShapeType),
}

impl ShapeFilter {
    /// Whether `shape` is allowed by this filter.
    #[must_use]
    pub fn admits(self, shape: ShapeType) -> bool {
        match self {
            Self::Mixed => true,
            Self::Only(only) => only == shape,
        }
    }

    fn pick<R: Rng + ?Sized>(self, rng: &mut R) -> ShapeType {
        match self {
            Self::Mixed => ShapeType::ALL[rng.random_range(0..ShapeType::ALL.len())],
            Self::Only(shape) => shape,
        }
    }
}

impl TryFrom<String> for ShapeFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "mixed" {
            return Ok(Self::Mixed);
        }
        ShapeType::from_name(&value)
            .map(Self::Only)
            .ok_or_else(|| format!("unknown shape filter: {value}"))
    }
}

impl From<ShapeFilter> for String {
    fn from(filter: ShapeFilter) -> Self {
        match filter {
            ShapeFilter::Mixed => "mixed".to_string(),
            ShapeFilter::Only(shape) => shape.name().to_string(),
        }
    }
}

/// One shape of a scatter field.
///
/// Color, size and placement are baked in at generation time. Polygon vertices
/// are relative to the shape's own center; the renderer translates to
/// `(center_x, center_y)` and rotates by `rotation_degrees`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometricShapeItem {
    /// Unique identifier.
    #[serde(default)]
    pub id: ShapeId,
    /// Shape drawn.
    pub shape_type: ShapeType,
    /// Center, horizontal viewport units.
    #[serde(alias = "cx")]
    pub center_x: f64,
    /// Center, vertical viewport units.
    #[serde(alias = "cy")]
    pub center_y: f64,
    /// Circumradius.
    pub size: f64,
    /// Fill color as hex.
    #[serde(alias = "fill")]
    pub fill_color: String,
    /// Fill opacity.
    pub opacity: f64,
    /// Rotation applied at render time.
    #[serde(alias = "rotation")]
    pub rotation_degrees: f64,
    /// Local polygon vertices; absent for circles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon_points: Option<Vec<Point>>,
}

impl GeometricShapeItem {
    /// Copy of this shape under a fresh identifier.
    #[must_use]
    pub fn reidentified(&self) -> Self {
        Self {
            id: ShapeId::new(),
            ..self.clone()
        }
    }
}

/// Vertices of a regular polygon of circumradius `radius` around the origin.
///
/// Returns `None` for circles.
#[must_use]
pub fn polygon_points(shape: ShapeType, radius: f64) -> Option<Vec<Point>> {
    let sides = shape.sides()?;
    let step = 2.0 * PI / f64::from(sides);
    let offset = shape.angle_offset();
    Some(
        (0..sides)
            .map(|i| {
                let angle = f64::from(i) * step + offset;
                Point {
                    x: radius * angle.cos(),
                    y: radius * angle.sin(),
                }
            })
            .collect(),
    )
}

/// Generate a scatter field tinted from `base_color`.
///
/// The item count is uniform in
/// [`MIN_SCATTER_SHAPES`]..=[`MAX_SCATTER_SHAPES`]. Centers may overhang the
/// viewport by [`SCATTER_EDGE_OVERHANG`] of the shape size so that no edge is
/// left visibly empty.
pub fn generate_scatter_field<R: Rng + ?Sized>(
    base_color: &str,
    viewport_size: f64,
    filter: ShapeFilter,
    rng: &mut R,
) -> Vec<GeometricShapeItem> {
    let count = rng.random_range(MIN_SCATTER_SHAPES..=MAX_SCATTER_SHAPES);
    (0..count)
        .map(|_| {
            let shape_type = filter.pick(rng);
            let size = rng.random_range(SCATTER_SIZE_RANGE.0..=SCATTER_SIZE_RANGE.1);
            let overhang = size * SCATTER_EDGE_OVERHANG;
            let center_x = rng.random_range(-overhang..=viewport_size + overhang);
            let center_y = rng.random_range(-overhang..=viewport_size + overhang);
            let fill_color = vary_color(base_color, rng);
            let opacity = rng.random_range(SCATTER_OPACITY_RANGE.0..=SCATTER_OPACITY_RANGE.1);
            let rotation_degrees = rng.random_range(0.0..360.0);
            GeometricShapeItem {
                id: ShapeId::new(),
                shape_type,
                center_x,
                center_y,
                size,
                fill_color,
                opacity,
                rotation_degrees,
                polygon_points: polygon_points(shape_type, size),
            }
        })
        .collect()
}

/// Clamp a blob lobe count to [`MIN_BLOB_EDGES`]..=[`MAX_BLOB_EDGES`].
#[must_use]
pub const fn clamp_blob_edges(edges: u32) -> u32 {
    if edges < MIN_BLOB_EDGES {
        MIN_BLOB_EDGES
    } else if edges > MAX_BLOB_EDGES {
        MAX_BLOB_EDGES
    } else {
        edges
    }
}

/// Clamp a blob growth factor to [`BLOB_GROWTH_RANGE`].
#[must_use]
pub const fn clamp_blob_growth(growth: u32) -> u32 {
    if growth < BLOB_GROWTH_RANGE.0 {
        BLOB_GROWTH_RANGE.0
    } else if growth > BLOB_GROWTH_RANGE.1 {
        BLOB_GROWTH_RANGE.1
    } else {
        growth
    }
}

/// Random blob vertices: one per edge, evenly spaced in angle, each at a
/// random radius between the growth-controlled inner radius and `size / 2`.
pub fn blob_vertices<R: Rng + ?Sized>(
    edges: u32,
    growth: u32,
    size: f64,
    rng: &mut R,
) -> Vec<Point> {
    let edges = clamp_blob_edges(edges);
    let growth = clamp_blob_growth(growth);
    let outer = size / 2.0;
    let inner = f64::from(growth) * (outer / 10.0);
    let center = size / 2.0;
    let step = 2.0 * PI / f64::from(edges);

    (0..edges)
        .map(|i| {
            let angle = f64::from(i) * step;
            let radius = if inner < outer {
                rng.random_range(inner..=outer)
            } else {
                outer
            };
            Point {
                x: center + radius * angle.cos(),
                y: center + radius * angle.sin(),
            }
        })
        .collect()
}

fn midpoint(a: Point, b: Point) -> Point {
    Point {
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
    }
}

/// Smooth closed SVG path through `points` using quadratic segments between
/// edge midpoints.
#[must_use]
pub fn smooth_closed_path(points: &[Point]) -> String {
    let n = points.len();
    if n < 3 {
        return String::new();
    }
    let start = midpoint(points[0], points[1]);
    let mut path = format!("M{:.2},{:.2}", start.x, start.y);
    for i in 0..n {
        let control = points[(i + 1) % n];
        let end = midpoint(control, points[(i + 2) % n]);
        // Writing to a String cannot fail.
        let _ = write!(
            path,
            " Q{:.2},{:.2} {:.2},{:.2}",
            control.x, control.y, end.x, end.y
        );
    }
    path.push('Z');
    path
}

/// Generate a closed organic outline as SVG path data.
pub fn generate_blob_outline<R: Rng + ?Sized>(
    edges: u32,
    growth: u32,
    size: f64,
    rng: &mut R,
) -> String {
    smooth_closed_path(&blob_vertices(edges, growth, size, rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_polygon_points_vertex_counts() {
        assert!(polygon_points(ShapeType::Circle, 10.0).is_none());
        for (shape, n) in [
            (ShapeType::Triangle, 3),
            (ShapeType::Square, 4),
            (ShapeType::Pentagon, 5),
            (ShapeType::Hexagon, 6),
        ] {
            let points = polygon_points(shape, 10.0).expect("polygon");
            assert_eq!(points.len(), n);
            for p in points {
                assert!(((p.x * p.x + p.y * p.y).sqrt() - 10.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_triangle_points_up() {
        let points = polygon_points(ShapeType::Triangle, 10.0).expect("polygon");
        assert!(points[0].x.abs() < 1e-9);
        assert!((points[0].y + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_pentagon_has_level_top_edge() {
        let points = polygon_points(ShapeType::Pentagon, 10.0).expect("polygon");
        assert!((points[0].y - points[4].y).abs() < 1e-9);
        assert!(points[2].x.abs() < 1e-9);
        assert!((points[2].y - 10.0).abs() < 1e-9);
        let offset = ShapeType::Pentagon.angle_offset();
        assert!((offset - (-PI / 2.0 + PI / 5.0)).abs() < 1e-12);
    }

    #[test]
    fn test_scatter_field_respects_bands() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let shapes =
                generate_scatter_field("#4DB6AC", SCATTER_VIEWPORT, ShapeFilter::Mixed, &mut rng);
            assert!((MIN_SCATTER_SHAPES..=MAX_SCATTER_SHAPES).contains(&shapes.len()));
            for s in &shapes {
                assert!(s.size >= SCATTER_SIZE_RANGE.0 && s.size <= SCATTER_SIZE_RANGE.1);
                assert!(
                    s.opacity >= SCATTER_OPACITY_RANGE.0 && s.opacity <= SCATTER_OPACITY_RANGE.1
                );
                let overhang = s.size * SCATTER_EDGE_OVERHANG;
                assert!(s.center_x >= -overhang && s.center_x <= SCATTER_VIEWPORT + overhang);
                assert!(s.center_y >= -overhang && s.center_y <= SCATTER_VIEWPORT + overhang);
                assert!(s.rotation_degrees >= 0.0 && s.rotation_degrees < 360.0);
                assert_eq!(s.polygon_points.is_none(), s.shape_type == ShapeType::Circle);
                assert!(crate::color::is_valid_hex(&s.fill_color));
            }
        }
    }

    #[test]
    fn test_scatter_field_honors_filter() {
        let mut rng = StdRng::seed_from_u64(11);
        let shapes = generate_scatter_field(
            "#B39DDB",
            SCATTER_VIEWPORT,
            ShapeFilter::Only(ShapeType::Hexagon),
            &mut rng,
        );
        assert!(shapes.iter().all(|s| s.shape_type == ShapeType::Hexagon));
    }

    #[test]
    fn test_scatter_field_ids_unique() {
        let mut rng = StdRng::seed_from_u64(5);
        let shapes = generate_scatter_field("#757575", 100.0, ShapeFilter::Mixed, &mut rng);
        let ids: std::collections::HashSet<_> = shapes.iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), shapes.len());
    }

    #[test]
    fn test_blob_vertices_within_radii() {
        let mut rng = StdRng::seed_from_u64(9);
        let points = blob_vertices(8, 6, BLOB_GENERATION_SIZE, &mut rng);
        assert_eq!(points.len(), 8);
        let center = BLOB_GENERATION_SIZE / 2.0;
        let inner = 6.0 * (center / 10.0);
        for p in points {
            let r = ((p.x - center).powi(2) + (p.y - center).powi(2)).sqrt();
            assert!(r >= inner - 1e-9 && r <= center + 1e-9, "radius {r}");
        }
    }

    #[test]
    fn test_blob_outline_is_closed_path() {
        let mut rng = StdRng::seed_from_u64(1);
        let path = generate_blob_outline(DEFAULT_BLOB_EDGES, DEFAULT_BLOB_GROWTH, 200.0, &mut rng);
        assert!(path.starts_with('M'));
        assert!(path.ends_with('Z'));
        assert_eq!(path.matches('Q').count(), DEFAULT_BLOB_EDGES as usize);
    }

    #[test]
    fn test_blob_outline_clamps_degenerate_edges() {
        let mut rng = StdRng::seed_from_u64(1);
        let path = generate_blob_outline(1, 50, 200.0, &mut rng);
        assert_eq!(path.matches('Q').count(), 3);
    }

    #[test]
    fn test_blob_outline_caps_edge_count() {
        let mut rng = StdRng::seed_from_u64(1);
        let path = generate_blob_outline(u32::MAX, DEFAULT_BLOB_GROWTH, 200.0, &mut rng);
        assert_eq!(path.matches('Q').count(), MAX_BLOB_EDGES as usize);
        assert_eq!(clamp_blob_edges(2_000_000), MAX_BLOB_EDGES);
        assert_eq!(clamp_blob_edges(0), MIN_BLOB_EDGES);
        assert_eq!(clamp_blob_growth(50), 10);
    }

    #[test]
    fn test_shape_filter_serde() {
        let json = serde_json::to_string(&ShapeFilter::Only(ShapeType::Square)).expect("ser");
        assert_eq!(json, "\"square\"");
        let mixed: ShapeFilter = serde_json::from_str("\"mixed\"").expect("de");
        assert_eq!(mixed, ShapeFilter::Mixed);
        assert!(serde_json::from_str::<ShapeFilter>("\"star\"").is_err());
    }
}
