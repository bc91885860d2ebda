//! End-to-end tests of the deck commands against a temporary data directory.

use clap::Parser;
use deck_cli::{run, CliArgs};

async fn deck(dir: &tempfile::TempDir, args: &[&str]) -> anyhow::Result<String> {
    let data_dir = dir.path().join("data");
    let mut argv = vec![
        "deck".to_string(),
        "--data-dir".to_string(),
        data_dir.display().to_string(),
        "--seed".to_string(),
        "11".to_string(),
    ];
    argv.extend(args.iter().map(ToString::to_string));
    run(CliArgs::try_parse_from(argv)?).await
}

#[tokio::test]
async fn test_changes_survive_between_invocations() {
    let dir = tempfile::tempdir().expect("tempdir");
    let shown = deck(&dir, &["show"]).await.expect("show");
    assert!(shown.contains("1 slide(s)"));

    deck(&dir, &["add-slide"]).await.expect("add");
    deck(&dir, &["theme", "deep-space", "--slide", "1"]).await.expect("theme");
    let shown = deck(&dir, &["show"]).await.expect("show");
    assert!(shown.contains("2 slide(s)"));
    assert!(shown.contains("bg #263238"));

    let record: serde_json::Value =
        serde_json::from_str(&deck(&dir, &["dump"]).await.expect("dump")).expect("json");
    assert_eq!(record["slides"].as_array().map(Vec::len), Some(2));
    assert_eq!(record["aspectRatio"], "1:1");
}

#[tokio::test]
async fn test_ratio_and_canvas_commands() {
    let dir = tempfile::tempdir().expect("tempdir");
    let shown = deck(&dir, &["ratio", "4:5"]).await.expect("ratio");
    assert!(shown.starts_with("Canvas 400x500 (4:5)"));
    assert!(deck(&dir, &["canvas", "0", "500"]).await.is_err());
    let shown = deck(&dir, &["canvas", "800", "1000"]).await.expect("canvas");
    assert!(shown.starts_with("Canvas 800x1000"));
}

#[tokio::test]
async fn test_remove_last_slide_keeps_one() {
    let dir = tempfile::tempdir().expect("tempdir");
    let shown = deck(&dir, &["remove", "1"]).await.expect("remove");
    assert!(shown.contains("1 slide(s)"));
    assert!(deck(&dir, &["select", "5"]).await.is_err());
}

#[tokio::test]
async fn test_decorate_and_template() {
    let dir = tempfile::tempdir().expect("tempdir");
    deck(&dir, &["decorate", "geometric-background"]).await.expect("decorate");
    let shown = deck(&dir, &["template", "title-body"]).await.expect("template");
    assert!(shown.contains("text 2  decorations 1"));
}

#[tokio::test]
async fn test_bad_image_leaves_document_unchanged() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("not-an-image.png");
    std::fs::write(&path, b"plain text").expect("write");
    let before = deck(&dir, &["dump"]).await.expect("dump");
    assert!(deck(&dir, &["image", path.to_str().expect("utf8")]).await.is_err());
    assert_eq!(deck(&dir, &["dump"]).await.expect("dump"), before);
}

#[tokio::test]
async fn test_export_writes_pdf() {
    let dir = tempfile::tempdir().expect("tempdir");
    deck(&dir, &["add-slide"]).await.expect("add");
    let output = dir.path().join("deck.pdf");
    let message = deck(&dir, &["export", output.to_str().expect("utf8")])
        .await
        .expect("export");
    assert!(message.starts_with("2 page(s) exported"));
    let pdf = std::fs::read(&output).expect("read pdf");
    assert!(pdf.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_thumbnails_written_per_slide() {
    let dir = tempfile::tempdir().expect("tempdir");
    deck(&dir, &["add-slide"]).await.expect("add");
    let out = dir.path().join("thumbs");
    let message = deck(&dir, &["thumbnails", "--out", out.to_str().expect("utf8")])
        .await
        .expect("thumbnails");
    assert!(message.starts_with("2 thumbnail(s)"));
    assert!(out.join("slide-01.png").exists());
    assert!(out.join("slide-02.png").exists());
}
