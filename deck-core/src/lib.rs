//! # Deck Core
//!
//! Document model and state core for a slide deck editor: an ordered list of
//! slides carrying text, a single image and generated decorations, with
//! persistence, rehydration, debounced thumbnails and multi-page export.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                DocumentStore                │
//! │   slides · active pointer · canvas config   │
//! ├──────────────────────┬──────────────────────┤
//! │  Model               │  Generators          │
//! │  - Slide / elements  │  - Blob outlines     │
//! │  - Decorations       │  - Scatter fields    │
//! │  - Themes, templates │  - Color variation   │
//! ├──────────────────────┼──────────────────────┤
//! │  Persistence         │  Async collaborators │
//! │  - Record schema     │  - Image decoder     │
//! │  - Rehydration       │  - Thumbnail worker  │
//! │  - Storage adapters  │  - Export service    │
//! └──────────────────────┴──────────────────────┘
//! ```
//!
//! Every store action is one atomic transition. Actions that target a
//! missing slide or element do nothing and say so through their return
//! value; only resource failures (image decode, storage, export) are errors.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod canvas;
pub mod color;
pub mod config;
pub mod decoration;
pub mod element;
pub mod error;
pub mod event;
pub mod export;
pub mod geometry;
pub mod image;
pub mod schema;
pub mod selection;
pub mod slide;
pub mod storage;
pub mod store;
pub mod theme;
pub mod thumbnail;
mod writer;

pub use canvas::{AspectRatio, CanvasConfig, CanvasDimensions, Orientation};
pub use config::StoreConfig;
pub use decoration::{BorderSides, Corner, Decoration, DecorationKind, DecorationPatch, DecorationType};
pub use element::{
    DecorationId, FontFamily, ImageId, ImagePatch, ShapeId, SlideId, SlideImage, TextElement,
    TextElementId, TextElementPatch, TextKind,
};
pub use error::{DeckError, DeckResult};
pub use event::DocumentEvent;
pub use export::{DeckExporter, ExportReport, ExportService, FlatPageRasterizer, PageRasterizer};
pub use geometry::{GeometricShapeItem, ShapeFilter, ShapeType};
pub use crate::image::{ImageDecoder, RasterImageDecoder};
pub use selection::{SelectedElement, Selection, SelectionController};
pub use slide::{Slide, SlidePatch, ThumbnailImage, ThumbnailState};
pub use storage::{FileStorage, MemoryStorage, PersistenceAdapter};
pub use store::{DocumentSnapshot, DocumentStore};
pub use theme::{CatalogThemeMatcher, ColorStrategy, SlideTheme, TemplateKind, TextTemplate};
pub use thumbnail::{spawn_thumbnail_worker, FlatThumbnailRenderer, ThumbnailService, ThumbnailWorkerHandle};

/// Deck core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
