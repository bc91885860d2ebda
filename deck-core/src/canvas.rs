//! Canvas configuration shared by every slide.
//!
//! Slide geometry is stored in percentages, so the canvas only decides the
//! pixel size slides are rendered, thumbnailed and exported at.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Smallest supported canvas edge in pixels.
pub const MIN_SLIDE_SIZE: u32 = 400;

/// Largest supported short edge in pixels.
pub const MAX_SLIDE_SIZE: u32 = 1080;

/// Edge length of the default square canvas.
pub const DEFAULT_SLIDE_SIZE: u32 = 600;

/// Short-edge steps offered for every aspect ratio.
const SHORT_EDGE_STEPS: [u32; 8] = [400, 500, 600, 700, 800, 900, 1000, 1080];

/// Pixel dimensions of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl CanvasDimensions {
    /// Create dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both edges are non-zero.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Page orientation for export: landscape only when wider than tall.
    #[must_use]
    pub const fn orientation(self) -> Orientation {
        if self.width > self.height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

impl Default for CanvasDimensions {
    fn default() -> Self {
        Self::new(DEFAULT_SLIDE_SIZE, DEFAULT_SLIDE_SIZE)
    }
}

impl fmt::Display for CanvasDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Taller than wide, or square.
    Portrait,
    /// Wider than tall.
    Landscape,
}

/// Supported canvas aspect ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    /// Square.
    #[default]
    #[serde(rename = "1:1")]
    Square,
    /// Portrait 4:5.
    #[serde(rename = "4:5")]
    Portrait4x5,
    /// Portrait 3:4.
    #[serde(rename = "3:4")]
    Portrait3x4,
    /// Vertical story 9:16.
    #[serde(rename = "9:16")]
    Story9x16,
    /// Widescreen 16:9.
    #[serde(rename = "16:9")]
    Widescreen16x9,
}

impl AspectRatio {
    /// Every supported ratio.
    pub const ALL: [Self; 5] = [
        Self::Square,
        Self::Portrait4x5,
        Self::Portrait3x4,
        Self::Story9x16,
        Self::Widescreen16x9,
    ];

    /// `(width, height)` ratio terms.
    #[must_use]
    pub const fn terms(self) -> (u32, u32) {
        match self {
            Self::Square => (1, 1),
            Self::Portrait4x5 => (4, 5),
            Self::Portrait3x4 => (3, 4),
            Self::Story9x16 => (9, 16),
            Self::Widescreen16x9 => (16, 9),
        }
    }

    /// Label as stored in documents, e.g. `"4:5"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait4x5 => "4:5",
            Self::Portrait3x4 => "3:4",
            Self::Story9x16 => "9:16",
            Self::Widescreen16x9 => "16:9",
        }
    }

    /// Canvas sizes offered for this ratio, smallest first.
    ///
    /// The short edge steps from [`MIN_SLIDE_SIZE`] to [`MAX_SLIDE_SIZE`];
    /// the long edge follows the ratio, rounded to whole pixels.
    #[must_use]
    pub fn size_options(self) -> Vec<CanvasDimensions> {
        let (w, h) = self.terms();
        SHORT_EDGE_STEPS
            .iter()
            .map(|&short| {
                let long = |num: u32, den: u32| (short * num + den / 2) / den;
                if w <= h {
                    CanvasDimensions::new(short, long(h, w))
                } else {
                    CanvasDimensions::new(long(w, h), short)
                }
            })
            .collect()
    }

    /// First size option for this ratio.
    #[must_use]
    pub fn default_dimensions(self) -> CanvasDimensions {
        self.size_options()
            .first()
            .copied()
            .unwrap_or(CanvasDimensions::new(MIN_SLIDE_SIZE, MIN_SLIDE_SIZE))
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.label() == s.trim())
            .ok_or_else(|| format!("unsupported aspect ratio: {s}"))
    }
}

/// Process-wide canvas configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasConfig {
    /// Render size.
    pub dimensions: CanvasDimensions,
    /// Selected ratio.
    pub aspect_ratio: AspectRatio,
}
