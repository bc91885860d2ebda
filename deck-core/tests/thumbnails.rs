//! Debounced thumbnail regeneration against a recording service.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use deck_core::canvas::{AspectRatio, CanvasDimensions};
use deck_core::config::StoreConfig;
use deck_core::element::{SlideId, TextElementPatch};
use deck_core::event::DocumentEvent;
use deck_core::slide::{Slide, SlidePatch, ThumbnailImage, ThumbnailState};
use deck_core::store::DocumentStore;
use deck_core::thumbnail::{spawn_thumbnail_worker, ThumbnailService};
use tokio::sync::broadcast;

const DEBOUNCE: Duration = Duration::from_millis(40);

#[derive(Debug, Default)]
struct RecordingService {
    calls: AtomicUsize,
    rendered: Mutex<Vec<(SlideId, String, CanvasDimensions)>>,
    fail: bool,
}

impl RecordingService {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ThumbnailService for RecordingService {
    async fn generate(
        &self,
        slide: &Slide,
        _index: usize,
        dimensions: CanvasDimensions,
        target_size: u32,
    ) -> Option<ThumbnailImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rendered.lock().expect("lock").push((
            slide.id,
            slide.background_color.clone(),
            dimensions,
        ));
        if self.fail {
            return None;
        }
        Some(ThumbnailImage {
            data_url: format!("data:image/png;base64,{}", slide.background_color),
            width: target_size,
            height: target_size,
        })
    }
}

fn store() -> DocumentStore {
    DocumentStore::new(
        StoreConfig::default()
            .with_rng_seed(2)
            .with_thumbnail_debounce(DEBOUNCE),
    )
}

/// Wait until every slide in `slides` has had a thumbnail committed.
async fn thumbnails_for(rx: &mut broadcast::Receiver<DocumentEvent>, slides: &[SlideId]) {
    let mut waiting: HashSet<SlideId> = slides.iter().copied().collect();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !waiting.is_empty() {
            match rx.recv().await {
                Ok(DocumentEvent::ThumbnailUpdated { slide_id, .. }) => {
                    waiting.remove(&slide_id);
                }
                Ok(_) => {}
                Err(e) => panic!("notification channel failed: {e}"),
            }
        }
    })
    .await
    .expect("thumbnails within timeout");
}

async fn thumbnail_for(rx: &mut broadcast::Receiver<DocumentEvent>, slide: SlideId) {
    thumbnails_for(rx, &[slide]).await;
}

#[tokio::test]
async fn test_pending_slides_rendered_at_startup() {
    let store = store();
    let second = store.add_slide(None);
    let first = store.snapshot().slides[0].id;
    let service = Arc::new(RecordingService::default());
    let mut rx = store.subscribe();
    let worker = spawn_thumbnail_worker(store.clone(), service.clone());

    thumbnails_for(&mut rx, &[first, second]).await;
    let thumb = store.slide(first).expect("slide").thumbnail;
    assert_eq!(thumb.image().map(|img| img.width), Some(100));
    worker.shutdown().await;
}

#[tokio::test]
async fn test_burst_of_edits_renders_once_with_latest_state() {
    let store = store();
    let slide = store.active_slide_id().expect("active");
    let service = Arc::new(RecordingService::default());
    let mut rx = store.subscribe();
    let worker = spawn_thumbnail_worker(store.clone(), service.clone());
    thumbnail_for(&mut rx, slide).await;
    let baseline = service.calls();

    let text = store.slide(slide).expect("slide").text_elements[0].id;
    for step in 0..20u8 {
        store.update_text_element(
            slide,
            text,
            &TextElementPatch::position(f32::from(step), f32::from(step)),
        );
    }
    store.update_slide(slide, SlidePatch::background("#311B92"));
    thumbnail_for(&mut rx, slide).await;

    assert_eq!(service.calls(), baseline + 1);
    let rendered = service.rendered.lock().expect("lock").clone();
    assert_eq!(rendered.last().map(|r| r.1.as_str()), Some("#311B92"));
    let thumb = store.slide(slide).expect("slide").thumbnail;
    assert!(thumb
        .image()
        .is_some_and(|img| img.data_url.ends_with("#311B92")));
    worker.shutdown().await;
}

#[tokio::test]
async fn test_removed_slide_is_never_rendered() {
    let store = store();
    let service = Arc::new(RecordingService::default());
    let keep = store.active_slide_id().expect("active");
    let mut rx = store.subscribe();
    let worker = spawn_thumbnail_worker(store.clone(), service.clone());
    thumbnail_for(&mut rx, keep).await;

    let doomed = store.add_slide(None);
    store.remove_slide(doomed);
    tokio::time::sleep(DEBOUNCE * 4).await;

    let rendered = service.rendered.lock().expect("lock").clone();
    assert!(rendered.iter().all(|(id, _, _)| *id != doomed));
    worker.shutdown().await;
}

#[tokio::test]
async fn test_canvas_change_rerenders_every_slide_at_new_size() {
    let store = store();
    let second = store.add_slide(None);
    let first = store.snapshot().slides[0].id;
    let service = Arc::new(RecordingService::default());
    let mut rx = store.subscribe();
    let worker = spawn_thumbnail_worker(store.clone(), service.clone());
    thumbnails_for(&mut rx, &[first, second]).await;

    let dims = store.change_aspect_ratio(AspectRatio::Widescreen16x9);
    assert_eq!(
        store.slide(first).expect("slide").thumbnail,
        ThumbnailState::Pending
    );
    thumbnails_for(&mut rx, &[first, second]).await;

    let rendered = service.rendered.lock().expect("lock").clone();
    let at_new_size = rendered.iter().filter(|(_, _, d)| *d == dims).count();
    assert_eq!(at_new_size, 2);
    worker.shutdown().await;
}

#[tokio::test]
async fn test_failed_render_marks_thumbnail_failed() {
    let store = store();
    let slide = store.active_slide_id().expect("active");
    let service = Arc::new(RecordingService {
        fail: true,
        ..RecordingService::default()
    });
    let mut rx = store.subscribe();
    let worker = spawn_thumbnail_worker(store.clone(), service.clone());
    thumbnail_for(&mut rx, slide).await;

    assert_eq!(
        store.slide(slide).expect("slide").thumbnail,
        ThumbnailState::Failed
    );
    tokio::time::sleep(DEBOUNCE * 3).await;
    assert_eq!(service.calls(), 1, "failures are not retried");
    worker.shutdown().await;
}

#[tokio::test]
async fn test_force_update_rerenders_unchanged_slide() {
    let store = store();
    let slide = store.active_slide_id().expect("active");
    let service = Arc::new(RecordingService::default());
    let mut rx = store.subscribe();
    let worker = spawn_thumbnail_worker(store.clone(), service.clone());
    thumbnail_for(&mut rx, slide).await;

    assert!(store.force_thumbnail_update(slide));
    thumbnail_for(&mut rx, slide).await;
    assert_eq!(service.calls(), 2);
    worker.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_stops_rendering() {
    let store = store();
    let slide = store.active_slide_id().expect("active");
    let service = Arc::new(RecordingService::default());
    let mut rx = store.subscribe();
    let worker = spawn_thumbnail_worker(store.clone(), service.clone());
    thumbnail_for(&mut rx, slide).await;
    worker.shutdown().await;

    store.update_slide(slide, SlidePatch::background("#000000"));
    tokio::time::sleep(DEBOUNCE * 3).await;
    assert_eq!(service.calls(), 1);
}
