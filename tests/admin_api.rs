//! Admin API tests
//!
//! Drive the full router (auth guard, handlers, services, in-memory SQLite)
//! one request at a time.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt; // for oneshot

use weblog::api::{build_router, AppState};
use weblog::config::Config;
use weblog::db::{create_test_pool, migrations};

const TOKEN: &str = "test-admin-token";
const BOUNDARY: &str = "weblog-test-boundary";

async fn setup_app(token: Option<&str>) -> (TempDir, Router) {
    let pool = create_test_pool()
        .await
        .expect("Failed to create test pool");
    migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let media = TempDir::new().expect("Failed to create media dir");
    let mut config = Config::default();
    config.admin.token = token.map(str::to_string);
    config.media.path = media.path().to_path_buf();

    let state = AppState::new(pool, &config);
    let app = build_router(state, &config.server, &config.media).expect("Failed to build router");
    (media, app)
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&body).expect("Failed to parse JSON")
}

async fn create(app: &Router, uri: &str, body: Value) -> Value {
    let response = send(app, request(Method::POST, uri, Some(body))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await
}

fn multipart_body(parts: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in parts {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((content_type, data)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"pelican.png\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn png_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    image::RgbImage::new(4, 3)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/admin/photos")
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let (_media, app) = setup_app(None).await;

    let response = send(
        &app,
        Request::builder()
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["database"], "up");
}

#[tokio::test]
async fn test_admin_requires_token() {
    let (_media, app) = setup_app(Some(TOKEN)).await;

    let missing = Request::builder()
        .uri("/api/v1/admin/models")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, missing).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"]["code"], "UNAUTHORIZED");

    let wrong = Request::builder()
        .uri("/api/v1/admin/models")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, wrong).await.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, request(Method::GET, "/api/v1/admin/models", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let models = json_body(response).await;
    assert_eq!(models["models"][0]["name"], "entries");
}

#[tokio::test]
async fn test_admin_disabled_without_configured_token() {
    let (_media, app) = setup_app(None).await;

    let response = send(&app, request(Method::GET, "/api/v1/admin/tags", None)).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_tag_search_ranks_shorter_matches_first() {
    let (_media, app) = setup_app(Some(TOKEN)).await;
    for tag in ["pytest-asyncio", "python", "py", "numpy", "rust"] {
        create(&app, "/api/v1/admin/tags", json!({ "tag": tag })).await;
    }

    let response = send(&app, request(Method::GET, "/api/v1/admin/tags?q=PY", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let tags: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["tag"].as_str().unwrap())
        .collect();
    assert_eq!(tags, vec!["py", "numpy", "python", "pytest-asyncio"]);

    let response = send(
        &app,
        request(Method::GET, "/api/v1/admin/tags?q=py&page=2&per_page=3", None),
    )
    .await;
    let body = json_body(response).await;
    assert_eq!(body["total"], 4);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["page"], 2);
    assert_eq!(body["items"][0]["tag"], "pytest-asyncio");

    let response = send(&app, request(Method::GET, "/api/v1/admin/tags?q=", None)).await;
    assert_eq!(json_body(response).await["total"], 0);
}

#[tokio::test]
async fn test_duplicate_tag_conflicts() {
    let (_media, app) = setup_app(Some(TOKEN)).await;
    create(&app, "/api/v1/admin/tags", json!({ "tag": "rust" })).await;

    let response = send(
        &app,
        request(Method::POST, "/api/v1/admin/tags", Some(json!({ "tag": "rust" }))),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_entry_with_malformed_body_is_rejected() {
    let (_media, app) = setup_app(Some(TOKEN)).await;

    let response = send(
        &app,
        request(
            Method::POST,
            "/api/v1/admin/entries",
            Some(json!({ "title": "Broken", "body": "<p>unclosed", "tags": ["draft"] })),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = json_body(response).await;
    assert_eq!(error["error"]["code"], "VALIDATION_ERROR");

    let response = send(&app, request(Method::GET, "/api/v1/admin/entries", None)).await;
    assert_eq!(json_body(response).await["total"], 0);
    let response = send(&app, request(Method::GET, "/api/v1/admin/tags", None)).await;
    assert_eq!(json_body(response).await["total"], 0);
}

#[tokio::test]
async fn test_entry_lifecycle() {
    let (_media, app) = setup_app(Some(TOKEN)).await;

    let entry = create(
        &app,
        "/api/v1/admin/entries",
        json!({
            "title": "Hello World",
            "body": "<p>First <em>post</em></p>",
            "created": "2024-03-07T12:00:00Z",
            "tags": ["meta"]
        }),
    )
    .await;
    assert_eq!(entry["slug"], "hello-world");
    assert_eq!(entry["tags"][0]["tag"], "meta");
    let id = entry["id"].as_i64().unwrap();

    let response = send(&app, request(Method::GET, "/api/v1/admin/entries?q=meta+first", None)).await;
    let list = json_body(response).await;
    assert_eq!(list["total"], 1);
    assert_eq!(list["items"][0]["display"], "Hello World");

    let response = send(&app, request(Method::GET, "/api/v1/admin/entries/dates?year=2024", None)).await;
    let dates = json_body(response).await;
    assert_eq!(dates["values"], json!([3]));

    let response = send(
        &app,
        request(
            Method::PUT,
            &format!("/api/v1/admin/entries/{}", id),
            Some(json!({ "body": "<p>Edited</p>", "tags": [] })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["body"], "<p>Edited</p>");
    assert_eq!(updated["tags"], json!([]));

    let uri = format!("/api/v1/admin/entries/{}", id);
    let response = send(&app, request(Method::DELETE, &uri, None)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = send(&app, request(Method::GET, &uri, None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_series_keeps_entries() {
    let (_media, app) = setup_app(Some(TOKEN)).await;
    let series = create(&app, "/api/v1/admin/series", json!({ "title": "Weeknotes" })).await;
    assert_eq!(series["slug"], "weeknotes");
    let entry = create(
        &app,
        "/api/v1/admin/entries",
        json!({ "title": "Week 1", "body": "Notes", "series_id": series["id"] }),
    )
    .await;

    let response = send(
        &app,
        request(
            Method::DELETE,
            &format!("/api/v1/admin/series/{}", series["id"]),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(
        &app,
        request(Method::GET, &format!("/api/v1/admin/entries/{}", entry["id"]), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["series_id"], Value::Null);
}

#[tokio::test]
async fn test_blogmark_requires_http_url() {
    let (_media, app) = setup_app(Some(TOKEN)).await;

    let response = send(
        &app,
        request(
            Method::POST,
            "/api/v1/admin/blogmarks",
            Some(json!({
                "link_url": "javascript:alert(1)",
                "link_title": "Bad",
                "commentary": "Nope"
            })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let blogmark = create(
        &app,
        "/api/v1/admin/blogmarks",
        json!({
            "link_url": "https://example.com/",
            "link_title": "Example Domain",
            "commentary": "The canonical example"
        }),
    )
    .await;
    assert_eq!(blogmark["slug"], "example-domain");
}

#[tokio::test]
async fn test_quotation_slug_from_source() {
    let (_media, app) = setup_app(Some(TOKEN)).await;

    let quotation = create(
        &app,
        "/api/v1/admin/quotations",
        json!({ "quotation": "Simple is better than complex.", "source": "Tim Peters" }),
    )
    .await;

    assert_eq!(quotation["slug"], "tim-peters");
    assert_eq!(quotation["source_url"], Value::Null);
}

#[tokio::test]
async fn test_photo_upload_and_serving() {
    let (media, app) = setup_app(Some(TOKEN)).await;
    let image = png_bytes();

    let body = multipart_body(
        &[("title", "Pelican"), ("slug", "pelican"), ("tags", "birds, water")],
        Some(("image/png", &image[..])),
    );
    let response = send(&app, upload_request(body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let photo = json_body(response).await;

    let path = photo["photo"].as_str().unwrap().to_string();
    assert!(path.starts_with("photos/"));
    assert!(path.ends_with(".png"));
    assert!(media.path().join(&path).exists());
    assert_eq!(photo["url"], format!("/media/{}", path));
    assert_eq!(photo["tags"].as_array().unwrap().len(), 2);

    let served = send(
        &app,
        Request::builder()
            .uri(format!("/media/{}", path))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(served.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(served.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], &image[..]);

    let response = send(
        &app,
        request(Method::DELETE, &format!("/api/v1/admin/photos/{}", photo["id"]), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!media.path().join(&path).exists());
}

#[tokio::test]
async fn test_photo_upload_validation() {
    let (_media, app) = setup_app(Some(TOKEN)).await;

    let no_file = multipart_body(&[("slug", "pelican")], None);
    let response = send(&app, upload_request(no_file)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["details"]["field"], "file");

    let wrong_type = multipart_body(&[("slug", "notes")], Some(("text/plain", &b"hello"[..])));
    let response = send(&app, upload_request(wrong_type)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let png = png_bytes();
    let no_slug = multipart_body(&[("title", "Untitled")], Some(("image/png", &png[..])));
    let response = send(&app, upload_request(no_slug)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let fake = multipart_body(
        &[("slug", "fake")],
        Some(("image/png", &b"\x89PNG\r\n\x1a\nnot really a png"[..])),
    );
    let response = send(&app, upload_request(fake)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = json_body(response).await;
    assert!(error["error"]["message"]
        .as_str()
        .unwrap()
        .contains("not a valid image"));

    let response = send(&app, request(Method::GET, "/api/v1/admin/photos", None)).await;
    assert_eq!(json_body(response).await["total"], 0);
}
