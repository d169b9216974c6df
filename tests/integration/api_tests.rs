//! API integration tests for thumbnail retrieval and error handling.
//!
//! Tests verify:
//! - Thumbnail retrieval on miss and hit, with headers
//! - Resize policy (default width, bounding box, no upscaling)
//! - Error cases (missing path, invalid dimensions, missing file, bad image)
//! - HTTP response codes and JSON bodies

use std::sync::Arc;

use axum::http::StatusCode;
use image::ImageFormat;

use thumbnail_streamer::source::FsSource;
use thumbnail_streamer::store::MemoryStore;
use thumbnail_streamer::thumbnail::ThumbnailService;
use thumbnail_streamer::{create_router, RouterConfig};

use super::test_utils::{
    body_bytes, body_json, create_test_image, create_test_jpeg, create_test_png, get, header,
    inspect_image, router_with, wait_for_key, MockSource, TrackingStore,
};

// =============================================================================
// Basic Thumbnail Retrieval
// =============================================================================

#[tokio::test]
async fn test_thumbnail_miss_returns_resized_image() {
    let source = MockSource::new().with_file("photos/cat.jpg", create_test_jpeg(400, 300));
    let store = Arc::new(TrackingStore::new());
    let router = router_with(source, store);

    let response = get(&router, "/thumbnail?path=photos%2Fcat.jpg&width=100").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "content-type"), Some("image/jpeg"));
    assert_eq!(
        header(&response, "cache-control"),
        Some("public, max-age=3600")
    );
    assert_eq!(header(&response, "x-cache-status"), Some("miss"));

    let content_length: usize = header(&response, "content-length")
        .unwrap()
        .parse()
        .unwrap();

    let body = body_bytes(response).await;
    assert_eq!(body.len(), content_length);

    let (format, width, height) = inspect_image(&body);
    assert_eq!(format, ImageFormat::Jpeg);
    assert_eq!((width, height), (100, 75));
}

#[tokio::test]
async fn test_thumbnail_hit_returns_identical_bytes() {
    let source = MockSource::new().with_file("photos/cat.jpg", create_test_jpeg(400, 300));
    let store = Arc::new(TrackingStore::new());
    let router = router_with(source.clone(), Arc::clone(&store));

    let uri = "/thumbnail?path=photos%2Fcat.jpg&width=100";

    let first = get(&router, uri).await;
    assert_eq!(header(&first, "x-cache-status"), Some("miss"));
    let first_body = body_bytes(first).await;

    wait_for_key(&store, "thumbnail:photos/cat.jpg:w100:hauto").await;

    let second = get(&router, uri).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(header(&second, "x-cache-status"), Some("hit"));
    assert_eq!(header(&second, "content-type"), Some("image/jpeg"));
    let second_body = body_bytes(second).await;

    assert_eq!(first_body, second_body);
    assert_eq!(source.read_count(), 1);
}

#[tokio::test]
async fn test_default_width_is_200() {
    let source = MockSource::new().with_file("wide.jpg", create_test_jpeg(800, 400));
    let router = router_with(source, Arc::new(TrackingStore::new()));

    let response = get(&router, "/thumbnail?path=wide.jpg").await;
    assert_eq!(response.status(), StatusCode::OK);

    let (_, width, height) = inspect_image(&body_bytes(response).await);
    assert_eq!((width, height), (200, 100));
}

#[tokio::test]
async fn test_empty_width_uses_default() {
    let source = MockSource::new().with_file("wide.jpg", create_test_jpeg(800, 400));
    let router = router_with(source, Arc::new(TrackingStore::new()));

    let response = get(&router, "/thumbnail?path=wide.jpg&width=").await;
    assert_eq!(response.status(), StatusCode::OK);

    let (_, width, _) = inspect_image(&body_bytes(response).await);
    assert_eq!(width, 200);
}

#[tokio::test]
async fn test_width_and_height_fit_inside_box() {
    let source = MockSource::new().with_file("photos/cat.jpg", create_test_jpeg(400, 300));
    let router = router_with(source, Arc::new(TrackingStore::new()));

    let response = get(&router, "/thumbnail?path=photos%2Fcat.jpg&width=100&height=50").await;
    assert_eq!(response.status(), StatusCode::OK);

    let (_, width, height) = inspect_image(&body_bytes(response).await);
    assert!(width <= 100);
    assert!(height <= 50);
    assert_eq!((width, height), (67, 50));
}

#[tokio::test]
async fn test_small_source_is_not_upscaled() {
    let source = MockSource::new().with_file("icon.jpg", create_test_jpeg(50, 50));
    let router = router_with(source, Arc::new(TrackingStore::new()));

    let response = get(&router, "/thumbnail?path=icon.jpg&width=200").await;
    assert_eq!(response.status(), StatusCode::OK);

    let (_, width, height) = inspect_image(&body_bytes(response).await);
    assert_eq!((width, height), (50, 50));
}

#[tokio::test]
async fn test_png_source_keeps_png() {
    let source = MockSource::new().with_file("diagram.png", create_test_png(300, 300));
    let router = router_with(source, Arc::new(TrackingStore::new()));

    let response = get(&router, "/thumbnail?path=diagram.png&width=60").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "content-type"), Some("image/png"));

    let (format, width, height) = inspect_image(&body_bytes(response).await);
    assert_eq!(format, ImageFormat::Png);
    assert_eq!((width, height), (60, 60));
}

#[tokio::test]
async fn test_bmp_and_tiff_sources() {
    let source = MockSource::new()
        .with_file("scans/page.tiff", create_test_image(400, 200, ImageFormat::Tiff))
        .with_file("icons/logo.bmp", create_test_image(300, 300, ImageFormat::Bmp));
    let router = router_with(source, Arc::new(TrackingStore::new()));

    let response = get(&router, "/thumbnail?path=scans%2Fpage.tiff&width=100").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "content-type"), Some("image/tiff"));
    let (format, width, height) = inspect_image(&body_bytes(response).await);
    assert_eq!(format, ImageFormat::Tiff);
    assert_eq!((width, height), (100, 50));

    let response = get(&router, "/thumbnail?path=icons%2Flogo.bmp&width=30").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "content-type"), Some("image/bmp"));
    let (format, width, height) = inspect_image(&body_bytes(response).await);
    assert_eq!(format, ImageFormat::Bmp);
    assert_eq!((width, height), (30, 30));
}

#[tokio::test]
async fn test_repeated_params_use_first_value() {
    let source = MockSource::new().with_file("photos/cat.jpg", create_test_jpeg(400, 300));
    let router = router_with(source, Arc::new(TrackingStore::new()));

    let response = get(
        &router,
        "/thumbnail?path=photos%2Fcat.jpg&width=100&width=20&path=other.jpg",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let (_, width, height) = inspect_image(&body_bytes(response).await);
    assert_eq!((width, height), (100, 75));
}

#[tokio::test]
async fn test_repeated_invalid_param_is_json_error() {
    let router = router_with(MockSource::new(), Arc::new(TrackingStore::new()));

    let response = get(&router, "/thumbnail?path=a.jpg&width=abc&width=20").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(header(&response, "content-type"), Some("application/json"));

    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid width or height parameter.");
}

#[tokio::test]
async fn test_api_image_alias() {
    let source = MockSource::new().with_file("photos/cat.jpg", create_test_jpeg(400, 300));
    let router = router_with(source, Arc::new(TrackingStore::new()));

    let response = get(&router, "/api/image?path=photos%2Fcat.jpg&width=100").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "x-cache-status"), Some("miss"));
}

#[tokio::test]
async fn test_double_encoded_path_is_decoded() {
    let source = MockSource::new().with_file("my photos/cat.jpg", create_test_jpeg(400, 300));
    let router = router_with(source, Arc::new(TrackingStore::new()));

    // "my%20photos%2Fcat.jpg" encoded once more
    let response = get(&router, "/thumbnail?path=my%2520photos%252Fcat.jpg&width=100").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_filesystem_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("beach.jpg");
    std::fs::write(&path, create_test_jpeg(640, 480)).unwrap();

    let service = ThumbnailService::new(Arc::new(MemoryStore::new()), FsSource::new());
    let router = create_router(service, RouterConfig::new().with_tracing(false));

    let encoded = urlencoding::encode(path.to_str().unwrap()).into_owned();
    let response = get(&router, &format!("/thumbnail?path={}&width=160", encoded)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let (_, width, height) = inspect_image(&body_bytes(response).await);
    assert_eq!((width, height), (160, 120));
}

// =============================================================================
// Error Handling
// =============================================================================

#[tokio::test]
async fn test_missing_path() {
    let router = router_with(MockSource::new(), Arc::new(TrackingStore::new()));

    let response = get(&router, "/thumbnail?width=100").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "File path is required.");
}

#[tokio::test]
async fn test_empty_path() {
    let router = router_with(MockSource::new(), Arc::new(TrackingStore::new()));

    let response = get(&router, "/thumbnail?path=&width=100").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "File path is required.");
}

#[tokio::test]
async fn test_invalid_width() {
    let source = MockSource::new().with_file("photos/cat.jpg", create_test_jpeg(400, 300));
    let router = router_with(source.clone(), Arc::new(TrackingStore::new()));

    for uri in [
        "/thumbnail?path=photos%2Fcat.jpg&width=abc",
        "/thumbnail?path=photos%2Fcat.jpg&width=0",
        "/thumbnail?path=photos%2Fcat.jpg&width=-5",
        "/thumbnail?path=photos%2Fcat.jpg&width=100&height=tall",
        "/thumbnail?path=photos%2Fcat.jpg&width=100&height=0",
    ] {
        let response = get(&router, uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Invalid width or height parameter.");
    }

    assert_eq!(source.read_count(), 0);
}

#[tokio::test]
async fn test_file_not_found() {
    let router = router_with(MockSource::new(), Arc::new(TrackingStore::new()));

    let response = get(&router, "/thumbnail?path=nonexistent.jpg&width=100").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["error"], "File not found.");
}

#[tokio::test]
async fn test_filesystem_file_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let service = ThumbnailService::new(
        Arc::new(MemoryStore::new()),
        FsSource::with_root(dir.path()),
    );
    let router = create_router(service, RouterConfig::new().with_tracing(false));

    let response = get(&router, "/thumbnail?path=missing.jpg").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_corrupt_image_is_internal_error() {
    let source = MockSource::new().with_file("broken.jpg", b"definitely not an image".to_vec());
    let router = router_with(source, Arc::new(TrackingStore::new()));

    let response = get(&router, "/thumbnail?path=broken.jpg&width=100").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Internal server error processing image.");
}

#[tokio::test]
async fn test_source_read_failure_is_internal_error() {
    let source = MockSource::new().with_failing("locked.jpg");
    let router = router_with(source, Arc::new(TrackingStore::new()));

    let response = get(&router, "/thumbnail?path=locked.jpg&width=100").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Internal server error processing image.");
}

// =============================================================================
// Health Endpoint
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let service = ThumbnailService::new(Arc::new(MemoryStore::new()), MockSource::new());
    let router = create_router(service, RouterConfig::new().with_tracing(false));

    let response = get(&router, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["cache_backend"], "memory");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_custom_cache_max_age() {
    let source = MockSource::new().with_file("photos/cat.jpg", create_test_jpeg(400, 300));
    let service = ThumbnailService::new(Arc::new(MemoryStore::new()), source);
    let router = create_router(
        service,
        RouterConfig::new()
            .with_cache_max_age(60)
            .with_tracing(false),
    );

    let response = get(&router, "/thumbnail?path=photos%2Fcat.jpg&width=100").await;
    assert_eq!(header(&response, "cache-control"), Some("public, max-age=60"));
}
