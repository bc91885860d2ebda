//! # Deck CLI
//!
//! Command-line front end for the slide deck store. Each invocation opens
//! the file-backed document in `--data-dir`, performs one action and prints
//! a summary of the resulting document.
//!
//! ## Usage
//!
//! ```bash
//! deck show
//! deck add-slide
//! deck theme deep-space --slide 2
//! deck decorate corner-blob-top-left
//! deck image photo.png --alt "Team photo"
//! deck ratio 4:5
//! deck export deck.pdf
//! ```
//!
//! Slides are addressed by 1-based position or by id; commands that take an
//! optional `--slide` act on the active slide by default.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;

use deck_core::decoration::DecorationType;
use deck_core::element::TextKind;
use deck_core::export::{DeckExporter, ExportService};
use deck_core::image::parse_data_url;
use deck_core::schema::DocumentRecord;
use deck_core::storage::FileStorage;
use deck_core::theme::{find_template, find_theme, slide_themes, TemplateKind};
use deck_core::thumbnail::{spawn_thumbnail_worker, FlatThumbnailRenderer};
use deck_core::{
    AspectRatio, CanvasDimensions, DeckError, DocumentEvent, DocumentStore, SlideId, StoreConfig,
    ThumbnailState,
};

/// How long `deck thumbnails` waits for the worker.
const THUMBNAIL_TIMEOUT: Duration = Duration::from_secs(30);

/// Command-line arguments for deck.
#[derive(Debug, Clone, Parser)]
#[command(name = "deck")]
#[command(about = "Edit a slide deck from the command line")]
#[command(version)]
pub struct CliArgs {
    /// Directory holding the persisted document
    #[arg(long, env = "DECK_DATA_DIR", default_value = "./deck-data")]
    pub data_dir: PathBuf,

    /// Storage key of the document record
    #[arg(long, env = "DECK_STORAGE_KEY", default_value = deck_core::config::DEFAULT_STORAGE_KEY)]
    pub storage_key: String,

    /// Seed for generated decoration geometry
    #[arg(long, env = "DECK_SEED")]
    pub seed: Option<u64>,

    /// Action to perform
    #[command(subcommand)]
    pub command: Command,
}

/// One store action.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the document summary
    Show,
    /// Append a slide, optionally copying an existing one
    AddSlide {
        /// Slide to copy
        #[arg(long)]
        from: Option<String>,
    },
    /// Insert a copy of a slide right after it
    Duplicate {
        /// Slide to copy
        slide: String,
    },
    /// Remove a slide
    Remove {
        /// Slide to remove
        slide: String,
    },
    /// Make a slide active
    Select {
        /// Slide to activate
        slide: String,
    },
    /// List the built-in themes
    Themes,
    /// Apply a built-in theme
    Theme {
        /// Theme id, e.g. `deep-space`
        theme: String,
        /// Target slide
        #[arg(long)]
        slide: Option<String>,
    },
    /// Replace a slide's text with a template
    Template {
        /// Template, e.g. `title-subtitle`
        #[arg(value_parser = parse_kebab::<TemplateKind>)]
        template: TemplateKind,
        /// Target slide
        #[arg(long)]
        slide: Option<String>,
    },
    /// Add a text element
    Text {
        /// Text role, e.g. `body`
        #[arg(value_parser = parse_kebab::<TextKind>)]
        kind: TextKind,
        /// Target slide
        #[arg(long)]
        slide: Option<String>,
    },
    /// Add a decoration
    Decorate {
        /// Decoration type, e.g. `corner-blob-top-left`
        #[arg(value_parser = parse_kebab::<DecorationType>)]
        kind: DecorationType,
        /// Target slide
        #[arg(long)]
        slide: Option<String>,
    },
    /// Put an image file on a slide, replacing any existing image
    Image {
        /// Image file
        path: PathBuf,
        /// Alternative text
        #[arg(long)]
        alt: Option<String>,
        /// Target slide
        #[arg(long)]
        slide: Option<String>,
    },
    /// Remove a slide's image
    RemoveImage {
        /// Target slide
        #[arg(long)]
        slide: Option<String>,
    },
    /// Set the canvas size in pixels
    Canvas {
        /// Width
        width: u32,
        /// Height
        height: u32,
    },
    /// Switch aspect ratio (1:1, 4:5, 3:4, 9:16, 16:9)
    Ratio {
        /// Ratio label
        #[arg(value_parser = parse_ratio)]
        ratio: AspectRatio,
    },
    /// Discard the document and start over
    Reset,
    /// Print the persisted record as JSON
    Dump,
    /// Render thumbnails and write them as PNG files
    Thumbnails {
        /// Output directory
        #[arg(long, default_value = "thumbnails")]
        out: PathBuf,
    },
    /// Export the deck as a PDF
    Export {
        /// Output file
        output: PathBuf,
    },
}

/// Parse a kebab-case name into a type serialized in `SCREAMING_SNAKE_CASE`.
///
/// # Errors
///
/// Returns a message listing the input when no variant matches.
pub fn parse_kebab<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let name = raw.trim().replace('-', "_").to_uppercase();
    serde_json::from_value(serde_json::Value::String(name)).map_err(|_| format!("unknown value: {raw}"))
}

fn parse_ratio(raw: &str) -> Result<AspectRatio, String> {
    raw.parse()
}

impl CliArgs {
    /// Store configuration for these arguments.
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        let config = StoreConfig::default().with_storage_key(self.storage_key.clone());
        match self.seed {
            Some(seed) => config.with_rng_seed(seed),
            None => config,
        }
    }
}

/// Resolve a slide reference: 1-based position or id. `None` is the active
/// slide.
///
/// # Errors
///
/// Returns an error if no slide matches.
pub fn resolve_slide(store: &DocumentStore, reference: Option<&str>) -> anyhow::Result<SlideId> {
    let Some(reference) = reference else {
        return store.active_slide_id().ok_or_else(|| anyhow!("no active slide"));
    };
    if let Ok(position) = reference.parse::<usize>() {
        return position
            .checked_sub(1)
            .and_then(|index| store.slide_ids().get(index).copied())
            .ok_or_else(|| anyhow!("no slide at position {position}"));
    }
    let id = SlideId::parse_lenient(reference);
    if store.slide(id).is_none() {
        return Err(DeckError::SlideNotFound(reference.to_string()).into());
    }
    Ok(id)
}

/// Human readable summary of the document.
#[must_use]
pub fn summarize(store: &DocumentStore) -> String {
    let snapshot = store.snapshot();
    let canvas = snapshot.canvas;
    let mut out = format!(
        "Canvas {} ({}), {} slide(s)\n",
        canvas.dimensions,
        canvas.aspect_ratio,
        snapshot.slides.len()
    );
    for (index, slide) in snapshot.slides.iter().enumerate() {
        let marker = if snapshot.active_slide_id == Some(slide.id) { '*' } else { ' ' };
        let thumbnail = match slide.thumbnail {
            ThumbnailState::Pending => "pending",
            ThumbnailState::Ready(_) => "ready",
            ThumbnailState::Failed => "failed",
        };
        let _ = writeln!(
            out,
            "{marker} {:>2}  {}  bg {}  text {}  decorations {}  image {}  thumbnail {thumbnail}",
            index + 1,
            slide.id,
            slide.background_color,
            slide.text_elements.len(),
            slide.decorations.len(),
            if slide.image.is_some() { "yes" } else { "no" },
        );
    }
    out
}

/// Run one command against the document in `args.data_dir`, returning the
/// text to print.
///
/// # Errors
///
/// Returns an error if the data directory is unusable, a slide reference
/// does not resolve, or an image, thumbnail or export step fails.
pub async fn run(args: CliArgs) -> anyhow::Result<String> {
    let storage = FileStorage::new(&args.data_dir)
        .with_context(|| format!("opening data directory {}", args.data_dir.display()))?;
    let store = DocumentStore::open(args.store_config(), Arc::new(storage));

    match args.command {
        Command::Show => {}
        Command::AddSlide { from } => {
            let reference = from.as_deref().map(|r| resolve_slide(&store, Some(r))).transpose()?;
            store.add_slide(reference);
        }
        Command::Duplicate { slide } => {
            let id = resolve_slide(&store, Some(slide.as_str()))?;
            store.duplicate_slide(id);
        }
        Command::Remove { slide } => {
            let id = resolve_slide(&store, Some(slide.as_str()))?;
            store.remove_slide(id);
        }
        Command::Select { slide } => {
            let id = resolve_slide(&store, Some(slide.as_str()))?;
            store.select_slide(id);
        }
        Command::Themes => {
            let mut out = String::new();
            for theme in slide_themes() {
                let _ = writeln!(
                    out,
                    "{:<14} {:<14} bg {}  text {}  decoration {}",
                    theme.id, theme.name, theme.background_color, theme.text_color, theme.decoration_color
                );
            }
            return Ok(out);
        }
        Command::Theme { theme, slide } => {
            let theme = find_theme(&theme).ok_or_else(|| anyhow!("unknown theme: {theme}"))?;
            let id = resolve_slide(&store, slide.as_deref())?;
            store.apply_theme(id, theme);
        }
        Command::Template { template, slide } => {
            let template =
                find_template(template).ok_or_else(|| anyhow!("unknown template: {template:?}"))?;
            let id = resolve_slide(&store, slide.as_deref())?;
            store.apply_text_template(id, template);
        }
        Command::Text { kind, slide } => {
            let id = resolve_slide(&store, slide.as_deref())?;
            store.add_text_element(id, kind);
        }
        Command::Decorate { kind, slide } => {
            let id = resolve_slide(&store, slide.as_deref())?;
            if store.add_decoration(id, kind).is_none() {
                tracing::info!("Nothing added for decoration type {kind:?}");
            }
        }
        Command::Image { path, alt, slide } => {
            let id = resolve_slide(&store, slide.as_deref())?;
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            store
                .add_or_replace_image(id, bytes, alt)
                .await
                .with_context(|| format!("decoding {}", path.display()))?;
        }
        Command::RemoveImage { slide } => {
            let id = resolve_slide(&store, slide.as_deref())?;
            store.remove_image(id);
        }
        Command::Canvas { width, height } => {
            let dimensions = CanvasDimensions::new(width, height);
            if !store.change_canvas_dimensions(dimensions) {
                bail!("invalid canvas size {dimensions}");
            }
        }
        Command::Ratio { ratio } => {
            store.change_aspect_ratio(ratio);
        }
        Command::Reset => {
            store.reset_document();
        }
        Command::Dump => {
            let snapshot = store.snapshot();
            let record =
                DocumentRecord::capture(&snapshot.slides, snapshot.active_slide_id, &snapshot.canvas);
            return Ok(serde_json::to_string_pretty(&record)? + "\n");
        }
        Command::Thumbnails { out } => {
            let written = write_thumbnails(&store, &out).await?;
            return Ok(format!("{written} thumbnail(s) written to {}\n", out.display()));
        }
        Command::Export { output } => {
            let snapshot = store.snapshot();
            let report = DeckExporter::default()
                .export(&snapshot.slides, snapshot.canvas.dimensions)
                .await?;
            tokio::fs::write(&output, &report.document)
                .await
                .with_context(|| format!("writing {}", output.display()))?;
            let mut out = format!(
                "{} page(s) exported to {} ({}, {:?})\n",
                report.pages,
                output.display(),
                report.page_size,
                report.orientation
            );
            for failure in &report.failures {
                let _ = writeln!(out, "slide {} skipped: {}", failure.index + 1, failure.message);
            }
            return Ok(out);
        }
    }

    store.persist_now().context("saving document")?;
    Ok(summarize(&store))
}

/// Run the thumbnail worker until every slide has a result, then write the
/// rendered previews.
async fn write_thumbnails(store: &DocumentStore, out: &std::path::Path) -> anyhow::Result<usize> {
    let mut rx = store.subscribe();
    let worker = spawn_thumbnail_worker(store.clone(), Arc::new(FlatThumbnailRenderer));

    let expected = store.slide_count();
    let mut done = std::collections::HashSet::new();
    let waited = tokio::time::timeout(THUMBNAIL_TIMEOUT, async {
        while done.len() < expected {
            match rx.recv().await {
                Ok(DocumentEvent::ThumbnailUpdated { slide_id, .. }) => {
                    done.insert(slide_id);
                }
                Ok(_) => {}
                Err(e) => return Err(anyhow!("thumbnail notifications lost: {e}")),
            }
        }
        Ok(())
    })
    .await;
    worker.shutdown().await;
    waited.map_err(|_| anyhow!("timed out waiting for thumbnails"))??;

    tokio::fs::create_dir_all(out)
        .await
        .with_context(|| format!("creating {}", out.display()))?;
    let mut written = 0;
    for (index, slide) in store.snapshot().slides.iter().enumerate() {
        let Some(image) = slide.thumbnail.image() else {
            tracing::warn!(slide_id = %slide.id, "No thumbnail for slide {}", index + 1);
            continue;
        };
        let (_, png) = parse_data_url(&image.data_url)?;
        let path = out.join(format!("slide-{:02}.png", index + 1));
        tokio::fs::write(&path, png)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kebab() {
        assert_eq!(parse_kebab::<TextKind>("body"), Ok(TextKind::Body));
        assert_eq!(
            parse_kebab::<DecorationType>("corner-blob-top-left"),
            Ok(DecorationType::CornerBlobTopLeft)
        );
        assert_eq!(
            parse_kebab::<TemplateKind>("title-subtitle"),
            Ok(TemplateKind::TitleSubtitle)
        );
        assert!(parse_kebab::<TextKind>("headline").is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let args = CliArgs::try_parse_from(["deck", "--seed", "7", "decorate", "border-simple", "--slide", "2"])
            .expect("parse");
        assert_eq!(args.seed, Some(7));
        assert!(matches!(
            args.command,
            Command::Decorate {
                kind: DecorationType::BorderSimple,
                slide: Some(ref s)
            } if s == "2"
        ));
        assert!(CliArgs::try_parse_from(["deck", "ratio", "2:1"]).is_err());
    }

    #[test]
    fn test_resolve_slide_by_position_and_id() {
        let store = DocumentStore::new(StoreConfig::default());
        let first = store.active_slide_id().expect("active");
        let second = store.add_slide(None);
        assert_eq!(resolve_slide(&store, None).expect("active"), second);
        assert_eq!(resolve_slide(&store, Some("1")).expect("position"), first);
        assert_eq!(
            resolve_slide(&store, Some(second.to_string().as_str())).expect("id"),
            second
        );
        assert!(resolve_slide(&store, Some("0")).is_err());
        assert!(resolve_slide(&store, Some("3")).is_err());
        assert!(resolve_slide(&store, Some("not-a-slide")).is_err());
    }

    #[test]
    fn test_summary_marks_active_slide() {
        let store = DocumentStore::new(StoreConfig::default());
        store.add_slide(None);
        let summary = summarize(&store);
        assert!(summary.starts_with("Canvas 600x600 (1:1), 2 slide(s)"));
        let lines: Vec<_> = summary.lines().collect();
        assert!(lines[1].starts_with("   1"));
        assert!(lines[2].starts_with("*  2"));
    }
}
