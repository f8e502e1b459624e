use anyhow::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use campus_market::core::{Condition, ImagePayload};
use campus_market::{
    EnrichmentOutcome, GeminiAnalyzer, ImageAcquirer, ListingFeed, MarketError, SellFlow,
    Session, UnavailableCamera,
};
use httpmock::prelude::*;
use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const GENERATE_PATH: &str = "/v1beta/models/gemini-test:generateContent";

fn gemini_response(title: &str, price: f64, category: &str) -> serde_json::Value {
    let text = serde_json::json!({
        "title": title,
        "description": format!("{} in great shape", title),
        "suggestedPrice": price,
        "category": category,
    })
    .to_string();

    serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] }, "finishReason": "STOP" }]
    })
}

fn analyzer_for(server: &MockServer) -> Arc<GeminiAnalyzer> {
    Arc::new(
        GeminiAnalyzer::new(
            server.base_url(),
            "gemini-test",
            Some("test-key".to_string()),
            Duration::from_secs(5),
        )
        .unwrap(),
    )
}

fn write_png(dir: &TempDir, name: &str) -> std::path::PathBuf {
    let image = RgbImage::from_pixel(8, 8, image::Rgb([30, 30, 30]));
    let mut cursor = Cursor::new(Vec::new());
    image.write_to(&mut cursor, ImageFormat::Png).unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, cursor.into_inner()).unwrap();
    path
}

#[tokio::test]
async fn test_end_to_end_file_to_feed() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let photo = write_png(&temp_dir, "keyboard.png");

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(gemini_response("Keychron K2 Keyboard", 5499.5, "Peripherals"));
    });

    let mut session = Session::new();
    session.login("riley@campus.edu", "Riley Chen");
    let mut feed = ListingFeed::with_sample_listings()?;

    let mut flow = SellFlow::new(analyzer_for(&server));
    flow.draft_mut().condition = Condition::LikeNew;
    flow.attach_file(&ImageAcquirer::default(), &photo).await?;

    assert_eq!(flow.settle().await, Some(EnrichmentOutcome::Applied));
    api_mock.assert();

    assert_eq!(flow.draft().price, "5500");
    assert_eq!(flow.draft().condition, Condition::LikeNew);

    let id = flow.publish(&mut feed, &session)?;
    let newest = feed.iter().next().unwrap();
    assert_eq!(newest.id, id);
    assert_eq!(newest.title, "Keychron K2 Keyboard");
    assert_eq!(newest.seller_name, "Riley Chen");
    assert_eq!(newest.image.mime_type(), "image/png");
    assert_eq!(feed.len(), 4);
    Ok(())
}

#[tokio::test]
async fn test_superseded_response_never_overwrites_newer_image() {
    let server = MockServer::start();
    let image_a = ImagePayload::from_bytes("image/jpeg", b"photo-a");
    let image_b = ImagePayload::from_bytes("image/jpeg", b"photo-b");
    let encoded_a = STANDARD.encode(b"photo-a");
    let encoded_b = STANDARD.encode(b"photo-b");

    let mock_a = server.mock(|when, then| {
        when.method(POST)
            .path(GENERATE_PATH)
            .body_contains(encoded_a.as_str());
        then.status(200)
            .delay(Duration::from_millis(400))
            .json_body(gemini_response("iPad Air", 38000.0, "Tablets"));
    });
    let mock_b = server.mock(|when, then| {
        when.method(POST)
            .path(GENERATE_PATH)
            .body_contains(encoded_b.as_str());
        then.status(200)
            .json_body(gemini_response("Kindle Paperwhite", 7000.0, "E-Readers"));
    });

    let mut flow = SellFlow::new(analyzer_for(&server));
    let token_a = flow.submit_image(image_a);
    // A 的請求已經送出後再換照片
    tokio::time::sleep(Duration::from_millis(100)).await;
    let token_b = flow.submit_image(image_b);
    assert!(token_b > token_a);

    flow.settle().await;
    assert_eq!(flow.draft().title, "Kindle Paperwhite");

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(flow.next_completion().await, None);
    assert_eq!(flow.draft().title, "Kindle Paperwhite");
    assert_eq!(flow.draft().category, "E-Readers");
    assert_eq!(flow.draft().image().unwrap().base64_data(), encoded_b);

    mock_b.assert();
    assert!(mock_a.hits() <= 1);
}

#[tokio::test]
async fn test_enrichment_failure_keeps_form_usable() {
    let temp_dir = TempDir::new().unwrap();
    let photo = write_png(&temp_dir, "calculator.png");

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(503);
    });

    let mut flow = SellFlow::new(analyzer_for(&server));
    flow.attach_file(&ImageAcquirer::default(), &photo)
        .await
        .unwrap();

    let outcome = flow.settle().await;
    api_mock.assert();
    assert!(matches!(outcome, Some(EnrichmentOutcome::Failed(_))));
    assert!(flow.is_submittable());

    let mut feed = ListingFeed::new();
    let err = flow.publish(&mut feed, &Session::new()).unwrap_err();
    assert!(matches!(err, MarketError::ValidationError { ref field, .. } if field == "title"));

    let draft = flow.draft_mut();
    draft.title = "Casio fx-991EX".to_string();
    draft.category = "Calculators".to_string();
    draft.price = "900".to_string();
    flow.publish(&mut feed, &Session::new()).unwrap();

    let listing = feed.iter().next().unwrap();
    assert_eq!(listing.seller_id, "anonymous");
    assert_eq!(listing.price, 900.0);
}

#[tokio::test]
async fn test_camera_denied_falls_back_to_file() {
    let temp_dir = TempDir::new().unwrap();
    let photo = write_png(&temp_dir, "mouse.png");

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(200)
            .json_body(gemini_response("Logitech MX Master 3", 4200.0, "Peripherals"));
    });

    let mut flow = SellFlow::new(analyzer_for(&server));
    let err = flow.open_camera(&UnavailableCamera).await.unwrap_err();
    assert!(matches!(err, MarketError::PermissionDenied { .. }));
    assert!(!flow.camera_is_open());

    flow.attach_file(&ImageAcquirer::default(), &photo)
        .await
        .unwrap();
    flow.settle().await;
    assert_eq!(flow.draft().title, "Logitech MX Master 3");
}

#[tokio::test]
async fn test_unsupported_file_never_reaches_service() {
    let temp_dir = TempDir::new().unwrap();
    let notes = temp_dir.path().join("notes.txt");
    std::fs::write(&notes, "definitely not a photo").unwrap();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(200);
    });

    let mut flow = SellFlow::new(analyzer_for(&server));
    let err = flow
        .attach_file(&ImageAcquirer::default(), &notes)
        .await
        .unwrap_err();

    assert!(matches!(err, MarketError::UnsupportedInput { .. }));
    assert!(flow.draft().image().is_none());
    assert!(!flow.draft().is_pending());
    assert_eq!(api_mock.hits(), 0);
}
