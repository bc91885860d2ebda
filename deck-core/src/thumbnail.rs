//! Debounced thumbnail regeneration.
//!
//! [`spawn_thumbnail_worker`] watches the store's change notifications and
//! keeps one pending timer per slide. An edit to a slide aborts its pending
//! timer and starts a new one, so a burst of edits renders once. When the
//! timer fires the worker reads the slide as it is *now*, renders it through
//! a [`ThumbnailService`], and commits the result against the revision it
//! rendered. The store discards the result if the slide changed or vanished
//! in the meantime.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::canvas::CanvasDimensions;
use crate::color::hex_to_rgb;
use crate::decoration::DecorationKind;
use crate::element::SlideId;
use crate::error::{DeckError, DeckResult};
use crate::event::DocumentEvent;
use crate::image::{parse_data_url, to_data_url};
use crate::slide::{Slide, ThumbnailImage};
use crate::store::DocumentStore;

/// Color of the bars around a letterboxed slide.
pub const LETTERBOX_FILL: [u8; 4] = [255, 255, 255, 255];

/// Renders slide previews.
#[async_trait]
pub trait ThumbnailService: Send + Sync + std::fmt::Debug {
    /// Render `slide` (at position `index`) as laid out on a canvas of
    /// `dimensions`, fitted into a `target_size` square.
    ///
    /// Non-square canvases must be letterboxed (see [`letterbox`]), never
    /// stretched. Returns `None` on failure; the slide's thumbnail is then
    /// marked failed and not retried until the slide changes.
    async fn generate(
        &self,
        slide: &Slide,
        index: usize,
        dimensions: CanvasDimensions,
        target_size: u32,
    ) -> Option<ThumbnailImage>;
}

/// Where a canvas lands inside a raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Left offset in pixels.
    pub x: u32,
    /// Top offset in pixels.
    pub y: u32,
    /// Scaled canvas width.
    pub width: u32,
    /// Scaled canvas height.
    pub height: u32,
    /// Canvas pixels to raster pixels.
    pub scale: f64,
}

/// Fit `dimensions` into a `target` square, preserving aspect ratio and
/// centering the result.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn letterbox(dimensions: CanvasDimensions, target: u32) -> Placement {
    let width = f64::from(dimensions.width.max(1));
    let height = f64::from(dimensions.height.max(1));
    let scale = f64::from(target) / width.max(height);
    let fit = |len: f64| ((len * scale).round() as u32).clamp(1, target.max(1));
    let (scaled_width, scaled_height) = (fit(width), fit(height));
    Placement {
        x: target.saturating_sub(scaled_width) / 2,
        y: target.saturating_sub(scaled_height) / 2,
        width: scaled_width,
        height: scaled_height,
        scale,
    }
}

/// A [`ThumbnailService`] that paints what can be drawn without a text
/// layout engine: the background, simple borders and the slide image.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatThumbnailRenderer;

#[async_trait]
impl ThumbnailService for FlatThumbnailRenderer {
    async fn generate(
        &self,
        slide: &Slide,
        index: usize,
        dimensions: CanvasDimensions,
        target_size: u32,
    ) -> Option<ThumbnailImage> {
        let slide = slide.clone();
        let rendered =
            tokio::task::spawn_blocking(move || render_flat(&slide, dimensions, target_size))
                .await;
        match rendered {
            Ok(Ok(image)) => Some(image),
            Ok(Err(e)) => {
                tracing::warn!(index, "Thumbnail render failed: {e}");
                None
            }
            Err(e) => {
                tracing::warn!(index, "Thumbnail task failed: {e}");
                None
            }
        }
    }
}

fn rgba(hex: &str) -> image::Rgba<u8> {
    let [r, g, b] = hex_to_rgb(hex).unwrap_or([255, 255, 255]);
    image::Rgba([r, g, b, 255])
}

fn fill_rect(canvas: &mut image::RgbaImage, x: u32, y: u32, width: u32, height: u32, color: image::Rgba<u8>) {
    let x_end = x.saturating_add(width).min(canvas.width());
    let y_end = y.saturating_add(height).min(canvas.height());
    for py in y..y_end {
        for px in x..x_end {
            canvas.put_pixel(px, py, color);
        }
    }
}

/// Percent of the placement's extent, in thumbnail pixels.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent_of(extent: u32, percent: f32) -> u32 {
    (f64::from(extent) * f64::from(percent.clamp(0.0, 100.0)) / 100.0).round() as u32
}

/// Paint a flat preview of `slide` into a `target` square PNG.
///
/// # Errors
///
/// Returns [`DeckError::Thumbnail`] if the slide image cannot be decoded or
/// the preview cannot be encoded.
pub fn render_flat(slide: &Slide, dimensions: CanvasDimensions, target: u32) -> DeckResult<ThumbnailImage> {
    if target == 0 {
        return Err(DeckError::Thumbnail("thumbnail size must be non-zero".to_string()));
    }
    let canvas = paint_flat(slide, letterbox(dimensions, target), (target, target))
        .map_err(DeckError::Thumbnail)?;
    Ok(ThumbnailImage {
        data_url: to_data_url("image/png", &encode_png(&canvas).map_err(DeckError::Thumbnail)?),
        width: target,
        height: target,
    })
}

pub(crate) fn encode_png(canvas: &image::RgbaImage) -> Result<Vec<u8>, String> {
    let mut buf = Cursor::new(Vec::new());
    canvas
        .write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| format!("PNG encoding failed: {e}"))?;
    Ok(buf.into_inner())
}

/// Paint the background, borders and image of `slide` into the `place`
/// rectangle of a `size` raster filled with [`LETTERBOX_FILL`].
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn paint_flat(
    slide: &Slide,
    place: Placement,
    (canvas_width, canvas_height): (u32, u32),
) -> Result<image::RgbaImage, String> {
    let mut canvas =
        image::RgbaImage::from_pixel(canvas_width, canvas_height, image::Rgba(LETTERBOX_FILL));
    fill_rect(&mut canvas, place.x, place.y, place.width, place.height, rgba(&slide.background_color));

    if let Some(img) = &slide.image {
        let (_, bytes) = parse_data_url(&img.source_data).map_err(|e| format!("slide image: {e}"))?;
        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| format!("slide image: {e}"))?
            .to_rgba8();
        let width = percent_of(place.width, img.width).max(1);
        let height = percent_of(place.height, img.height).max(1);
        let resized = image::imageops::resize(&decoded, width, height, image::imageops::FilterType::Triangle);
        image::imageops::overlay(
            &mut canvas,
            &resized,
            i64::from(place.x + percent_of(place.width, img.x)),
            i64::from(place.y + percent_of(place.height, img.y)),
        );
    }

    for decoration in &slide.decorations {
        let DecorationKind::BorderSimple {
            border_sides,
            border_width,
        } = &decoration.kind
        else {
            continue;
        };
        let stroke = ((f64::from(*border_width) * place.scale).round() as u32).max(1);
        let color = rgba(&decoration.color);
        let (x, y, w, h) = (place.x, place.y, place.width, place.height);
        if border_sides.top {
            fill_rect(&mut canvas, x, y, w, stroke, color);
        }
        if border_sides.bottom {
            fill_rect(&mut canvas, x, (y + h).saturating_sub(stroke), w, stroke, color);
        }
        if border_sides.left {
            fill_rect(&mut canvas, x, y, stroke, h, color);
        }
        if border_sides.right {
            fill_rect(&mut canvas, (x + w).saturating_sub(stroke), y, stroke, h, color);
        }
    }

    Ok(canvas)
}

/// Handle to a running thumbnail worker.
#[derive(Debug)]
pub struct ThumbnailWorkerHandle {
    handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl ThumbnailWorkerHandle {
    /// Stop the worker and cancel every pending regeneration.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.handle).await {
            if !e.is_cancelled() {
                tracing::warn!("Thumbnail worker ended abnormally: {e}");
            }
        }
    }

    /// Abort the worker without waiting. Pending regenerations already
    /// running may still commit.
    pub fn abort(self) {
        self.handle.abort();
    }

    /// Whether the worker has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Per-slide debounce timers.
struct Scheduler {
    store: DocumentStore,
    service: Arc<dyn ThumbnailService>,
    pending: HashMap<SlideId, JoinHandle<()>>,
}

impl Scheduler {
    fn schedule(&mut self, slide_id: SlideId) {
        let store = self.store.clone();
        let service = Arc::clone(&self.service);
        let debounce = store.config().thumbnail_debounce;
        let size = store.config().thumbnail_size;

        let task = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let Some(job) = store.render_job(slide_id) else {
                return;
            };
            let image = service
                .generate(&job.slide, job.index, job.dimensions, size)
                .await;
            if image.is_none() {
                tracing::warn!(%slide_id, "Thumbnail generation failed");
            }
            if !store.commit_thumbnail(slide_id, job.revision, image) {
                tracing::debug!(%slide_id, revision = job.revision, "Discarding stale thumbnail");
            }
        });

        if let Some(previous) = self.pending.insert(slide_id, task) {
            previous.abort();
        }
    }

    fn schedule_all(&mut self) {
        for id in self.store.slide_ids() {
            self.schedule(id);
        }
    }

    fn cancel(&mut self, slide_id: SlideId) {
        if let Some(task) = self.pending.remove(&slide_id) {
            task.abort();
        }
    }

    fn handle(&mut self, event: &DocumentEvent) {
        self.pending.retain(|_, task| !task.is_finished());
        if let Some(id) = event.dirtied_slide() {
            self.schedule(id);
        } else if event.dirties_all() {
            self.pending.drain().for_each(|(_, task)| task.abort());
            self.schedule_all();
        } else if let DocumentEvent::SlideRemoved { slide_id } = event {
            self.cancel(*slide_id);
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        for (_, task) in self.pending.drain() {
            task.abort();
        }
    }
}

/// Spawn the debounce worker for `store`.
///
/// Every slide is scheduled once at startup so thumbnails left pending by
/// rehydration get rendered.
#[must_use]
pub fn spawn_thumbnail_worker(
    store: DocumentStore,
    service: Arc<dyn ThumbnailService>,
) -> ThumbnailWorkerHandle {
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();
    let mut rx = store.subscribe();
    let mut scheduler = Scheduler {
        store,
        service,
        pending: HashMap::new(),
    };

    let handle = tokio::spawn(async move {
        scheduler.schedule_all();
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    tracing::info!("Thumbnail worker received shutdown signal");
                    break;
                }

                event_result = rx.recv() => {
                    match event_result {
                        Ok(event) => scheduler.handle(&event),
                        Err(RecvError::Closed) => {
                            tracing::info!("Thumbnail worker: document channel closed");
                            break;
                        }
                        Err(RecvError::Lagged(n)) => {
                            tracing::warn!("Thumbnail worker lagged by {n} events; rescheduling all slides");
                            scheduler.schedule_all();
                        }
                    }
                }
            }
        }
    });

    ThumbnailWorkerHandle {
        handle,
        shutdown_tx: Some(shutdown_tx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoration::{BorderSides, Decoration, DecorationType};
    use crate::element::{ImageId, SlideImage};
    use crate::image::sample_png;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn decode(thumb: &ThumbnailImage) -> image::RgbaImage {
        let (mime, bytes) = parse_data_url(&thumb.data_url).expect("data url");
        assert_eq!(mime, "image/png");
        image::load_from_memory(&bytes).expect("png").to_rgba8()
    }

    #[test]
    fn test_letterbox_square() {
        let place = letterbox(CanvasDimensions::new(600, 600), 100);
        assert_eq!((place.x, place.y, place.width, place.height), (0, 0, 100, 100));
    }

    #[test]
    fn test_letterbox_wide_canvas_centered_vertically() {
        let place = letterbox(CanvasDimensions::new(711, 400), 100);
        assert_eq!(place.width, 100);
        assert_eq!(place.height, 56);
        assert_eq!((place.x, place.y), (0, 22));
    }

    #[test]
    fn test_pillarbox_tall_canvas() {
        let place = letterbox(CanvasDimensions::new(400, 711), 100);
        assert_eq!((place.width, place.height), (56, 100));
        assert_eq!((place.x, place.y), (22, 0));
    }

    #[test]
    fn test_render_flat_paints_background_inside_bars() {
        let slide = Slide::blank("#263238");
        let thumb = render_flat(&slide, CanvasDimensions::new(711, 400), 100).expect("render");
        assert_eq!((thumb.width, thumb.height), (100, 100));
        let img = decode(&thumb);
        assert_eq!(img.get_pixel(50, 50).0, [0x26, 0x32, 0x38, 255]);
        assert_eq!(img.get_pixel(50, 5).0, LETTERBOX_FILL);
    }

    #[test]
    fn test_render_flat_draws_border() {
        let mut slide = Slide::blank("#FFFFFF");
        let mut rng = StdRng::seed_from_u64(1);
        let mut border = Decoration::new(DecorationType::BorderSimple, "#000000", &mut rng);
        border.kind = DecorationKind::BorderSimple {
            border_sides: BorderSides {
                top: true,
                right: false,
                bottom: false,
                left: false,
            },
            border_width: 12,
        };
        slide.decorations.push(border);
        let img = decode(&render_flat(&slide, CanvasDimensions::new(600, 600), 100).expect("render"));
        assert_eq!(img.get_pixel(50, 0).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(50, 99).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_render_flat_composites_image() {
        let mut slide = Slide::blank("#FFFFFF");
        slide.image = Some(SlideImage {
            id: ImageId::new(),
            source_data: to_data_url("image/png", &sample_png(8, 8)),
            alt_text: String::new(),
            original_width: 8,
            original_height: 8,
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            z_index: 1,
        });
        let img = decode(&render_flat(&slide, CanvasDimensions::new(600, 600), 40).expect("render"));
        assert_eq!(img.get_pixel(20, 20).0, [200, 40, 40, 255]);
    }

    #[test]
    fn test_render_flat_rejects_broken_image() {
        let mut slide = Slide::blank("#FFFFFF");
        slide.image = Some(SlideImage {
            id: ImageId::new(),
            source_data: "data:image/png;base64,AAAA".to_string(),
            alt_text: String::new(),
            original_width: 1,
            original_height: 1,
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            z_index: 1,
        });
        assert!(matches!(
            render_flat(&slide, CanvasDimensions::new(600, 600), 40),
            Err(DeckError::Thumbnail(_))
        ));
    }

    #[test]
    fn test_render_flat_zero_target() {
        assert!(render_flat(&Slide::blank("#FFFFFF"), CanvasDimensions::default(), 0).is_err());
    }
}
