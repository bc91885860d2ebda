//! Multi-page deck export.
//!
//! [`DeckExporter`] renders every slide at full canvas size through a
//! [`PageRasterizer`], in deck order, and assembles the pages into a PDF
//! whose page size follows the canvas. A slide that fails to rasterize is
//! recorded in the [`ExportReport`] and skipped; the rest of the deck is
//! still exported.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::canvas::{CanvasDimensions, Orientation};
use crate::element::SlideId;
use crate::error::{DeckError, DeckResult};
use crate::slide::Slide;
use crate::thumbnail::{encode_png, paint_flat, Placement};

/// Resolution used to convert canvas pixels to page millimetres.
pub const EXPORT_DPI: f32 = 96.0;

const MM_PER_INCH: f32 = 25.4;

/// Renders one slide to PNG bytes at full canvas size.
#[async_trait]
pub trait PageRasterizer: Send + Sync + std::fmt::Debug {
    /// Rasterize `slide`, the `index`th page, at `dimensions`.
    ///
    /// # Errors
    ///
    /// Returns an error if the slide cannot be rendered.
    async fn rasterize(
        &self,
        slide: &Slide,
        index: usize,
        dimensions: CanvasDimensions,
    ) -> DeckResult<Vec<u8>>;
}

/// Produces a multi-page document from a deck.
#[async_trait]
pub trait ExportService: Send + Sync + std::fmt::Debug {
    /// Export `slides`, in order, on pages sized to `dimensions`.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::Export`] when no page could be produced.
    async fn export(&self, slides: &[Slide], dimensions: CanvasDimensions) -> DeckResult<ExportReport>;
}

/// A slide that could not be exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFailure {
    /// Position in the deck.
    pub index: usize,
    /// Slide id.
    pub slide_id: SlideId,
    /// What went wrong.
    pub message: String,
}

/// Result of a best-effort export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    /// Number of pages written.
    pub pages: usize,
    /// Slides that were skipped.
    pub failures: Vec<ExportFailure>,
    /// Page size in canvas pixels.
    pub page_size: CanvasDimensions,
    /// Page orientation.
    pub orientation: Orientation,
    /// The encoded document.
    #[serde(skip)]
    pub document: Vec<u8>,
}

impl ExportReport {
    /// Whether every slide made it into the document.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// [`PageRasterizer`] built on the flat painter used for thumbnails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatPageRasterizer;

#[async_trait]
impl PageRasterizer for FlatPageRasterizer {
    async fn rasterize(
        &self,
        slide: &Slide,
        _index: usize,
        dimensions: CanvasDimensions,
    ) -> DeckResult<Vec<u8>> {
        if !dimensions.is_valid() {
            return Err(DeckError::Export(format!("invalid page size {dimensions}")));
        }
        let slide = slide.clone();
        tokio::task::spawn_blocking(move || {
            let place = Placement {
                x: 0,
                y: 0,
                width: dimensions.width,
                height: dimensions.height,
                scale: 1.0,
            };
            let page = paint_flat(&slide, place, (dimensions.width, dimensions.height))
                .map_err(DeckError::Export)?;
            encode_png(&page).map_err(DeckError::Export)
        })
        .await
        .map_err(|e| DeckError::Export(format!("rasterize task failed: {e}")))?
    }
}

/// PDF [`ExportService`].
#[derive(Debug, Clone)]
pub struct DeckExporter {
    rasterizer: Arc<dyn PageRasterizer>,
    title: String,
}

impl Default for DeckExporter {
    fn default() -> Self {
        Self::new(Arc::new(FlatPageRasterizer))
    }
}

impl DeckExporter {
    /// Exporter over `rasterizer`.
    #[must_use]
    pub fn new(rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Self {
            rasterizer,
            title: "Slide Deck".to_string(),
        }
    }

    /// Set the document title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

#[async_trait]
impl ExportService for DeckExporter {
    async fn export(&self, slides: &[Slide], dimensions: CanvasDimensions) -> DeckResult<ExportReport> {
        if !dimensions.is_valid() {
            return Err(DeckError::Export(format!("invalid page size {dimensions}")));
        }

        let mut pages = Vec::with_capacity(slides.len());
        let mut failures = Vec::new();
        for (index, slide) in slides.iter().enumerate() {
            match self.rasterizer.rasterize(slide, index, dimensions).await {
                Ok(png) => pages.push(png),
                Err(e) => {
                    tracing::warn!(index, slide_id = %slide.id, "Failed to export slide: {e}");
                    failures.push(ExportFailure {
                        index,
                        slide_id: slide.id,
                        message: e.to_string(),
                    });
                }
            }
        }
        if pages.is_empty() {
            return Err(DeckError::Export("no slide could be rendered".to_string()));
        }

        let page_count = pages.len();
        let title = self.title.clone();
        let document = tokio::task::spawn_blocking(move || assemble_pdf(&title, &pages, dimensions))
            .await
            .map_err(|e| DeckError::Export(format!("PDF task failed: {e}")))??;
        tracing::info!(pages = page_count, failed = failures.len(), "Deck exported");

        Ok(ExportReport {
            pages: page_count,
            failures,
            page_size: dimensions,
            orientation: dimensions.orientation(),
            document,
        })
    }
}

/// Lay out one PNG per page, each page sized to `dimensions`.
#[allow(clippy::cast_precision_loss)]
fn assemble_pdf(title: &str, pages: &[Vec<u8>], dimensions: CanvasDimensions) -> DeckResult<Vec<u8>> {
    let width = printpdf::Mm(dimensions.width as f32 / EXPORT_DPI * MM_PER_INCH);
    let height = printpdf::Mm(dimensions.height as f32 / EXPORT_DPI * MM_PER_INCH);

    let doc = printpdf::PdfDocument::empty(title);
    for (index, png) in pages.iter().enumerate() {
        let (page, layer) = doc.add_page(width, height, format!("Slide {}", index + 1));
        let current_layer = doc.get_page(page).get_layer(layer);

        // Decode with printpdf's bundled image crate for compatibility
        let dynamic_image = printpdf::image_crate::load_from_memory(png)
            .map_err(|e| DeckError::Export(format!("Failed to decode page {index}: {e}")))?;
        let pdf_image = printpdf::Image::from_dynamic_image(&dynamic_image);
        pdf_image.add_to_layer(
            current_layer,
            printpdf::ImageTransform {
                translate_x: Some(printpdf::Mm(0.0)),
                translate_y: Some(printpdf::Mm(0.0)),
                dpi: Some(EXPORT_DPI),
                ..Default::default()
            },
        );
    }

    doc.save_to_bytes()
        .map_err(|e| DeckError::Export(format!("PDF save failed: {e}")))
}
