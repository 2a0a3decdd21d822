use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use stackit_server::{
    config::Config,
    create_app,
    database::MemoryRepository,
    handlers::AppState,
    ledger::{bytes_to_gb, BYTES_PER_GB},
    storage::LocalBlobStore,
};
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

const BOUNDARY: &str = "stackit-test-boundary";

struct TestApp {
    router: Router,
    _uploads: TempDir,
}

fn test_app_with_limit(storage_limit_gb: f64) -> TestApp {
    let uploads = tempfile::tempdir().unwrap();
    let config = Config {
        upload_dir: uploads.path().to_string_lossy().into_owned(),
        default_storage_limit_gb: storage_limit_gb,
        ..Config::default()
    };

    let blobs = Arc::new(LocalBlobStore::from_config(&config).unwrap());
    let state = AppState::new(Arc::new(MemoryRepository::new()), blobs, config);

    TestApp {
        router: create_app(state),
        _uploads: uploads,
    }
}

fn test_app() -> TestApp {
    test_app_with_limit(15.0)
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn register(&self) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "email": format!("user_{}@example.com", Uuid::new_v4()),
                    "name": "Test User",
                    "password": "password123"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn used_storage(&self, token: &str) -> f64 {
        let (status, body) = self.call("GET", "/api/v1/auth/profile", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["usedStorage"].as_f64().unwrap()
    }

    async fn upload(
        &self,
        uri: &str,
        token: &str,
        field: &str,
        file_name: &str,
        content_type: &str,
        data: &[u8],
        folder_id: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut body = Vec::new();
        if let Some(folder_id) = folder_id {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"folderId\"\r\n\r\n{}\r\n",
                    BOUNDARY, folder_id
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, field, file_name, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img: RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x ^ y) % 256) as u8])
    });
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buffer), ImageOutputFormat::Png)
        .unwrap();
    buffer
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app();

    let (status, body) = app.call("GET", "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");

    let (status, body) = app.call("GET", "/api/v1/health/detailed", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["database"]["status"], "healthy");
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let app = test_app();

    let (status, body) = app.call("GET", "/api/v1/notes", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "ERROR");

    let (status, _) = app.call("GET", "/api/v1/notes", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_fields_get_error_envelope() {
    let app = test_app();
    let token = app.register().await;

    let (status, body) = app.call("POST", "/api/v1/folders", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "ERROR");
    assert_eq!(body["message"], "Name is required");

    let (status, body) = app.call("POST", "/api/v1/auth/register", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "ERROR");

    let (status, body) = app.call("POST", "/api/v1/auth/login", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "ERROR");

    // A body of the wrong JSON shape is rejected before reaching the handler.
    let (status, body) = app
        .call("POST", "/api/v1/notes", Some(&token), Some(json!("just a string")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "ERROR");

    let (status, body) = app
        .call(
            "POST",
            "/api/v1/folders",
            Some(&token),
            Some(json!({ "name": "f".repeat(101) })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Name cannot exceed 100 characters");
}

#[tokio::test]
async fn test_malformed_ids_get_error_envelope() {
    let app = test_app();
    let token = app.register().await;

    for (method, uri) in [
        ("GET", "/api/v1/notes/not-a-uuid"),
        ("DELETE", "/api/v1/folders/123"),
        ("PATCH", "/api/v1/favorites/xyz/toggle"),
    ] {
        let (status, body) = app.call(method, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", method, uri);
        assert_eq!(body["status"], "ERROR", "{} {}", method, uri);
    }

    let (status, body) = app
        .call("GET", "/api/v1/dashboard/recent?limit=many", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "ERROR");
}

#[tokio::test]
async fn test_quota_scenario() {
    // Room for a five byte note but not for any real image.
    let app = test_app_with_limit(bytes_to_gb(64));
    let token = app.register().await;

    let (status, note) = app
        .call(
            "POST",
            "/api/v1/notes",
            Some(&token),
            Some(json!({ "name": "n1", "content": "hello" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(note["data"]["size"], 5);
    assert_eq!(app.used_storage(&token).await, 5.0 / BYTES_PER_GB);

    let image = png(32, 32);
    assert!(image.len() > 64);
    let (status, body) = app
        .upload("/api/v1/images/upload", &token, "image", "big.png", "image/png", &image, None)
        .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["message"], "Storage limit exceeded");
    assert_eq!(app.used_storage(&token).await, 5.0 / BYTES_PER_GB);

    let (_, images) = app.call("GET", "/api/v1/images", Some(&token), None).await;
    assert_eq!(images["data"], json!([]));

    let note_id = note["data"]["id"].as_str().unwrap();
    let (status, _) = app
        .call("DELETE", &format!("/api/v1/notes/{}", note_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.used_storage(&token).await, 0.0);
}

#[tokio::test]
async fn test_note_resize_accounting() {
    let app = test_app();
    let token = app.register().await;

    let (_, note) = app
        .call(
            "POST",
            "/api/v1/notes",
            Some(&token),
            Some(json!({ "name": "n1", "content": "abc" })),
        )
        .await;
    let note_id = note["data"]["id"].as_str().unwrap();
    let before = app.used_storage(&token).await;

    let (status, updated) = app
        .call(
            "PUT",
            &format!("/api/v1/notes/{}", note_id),
            Some(&token),
            Some(json!({ "content": "abcdef" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["size"], 6);
    assert_eq!(updated["data"]["name"], "n1");

    let after = app.used_storage(&token).await;
    assert!((after - before - bytes_to_gb(3)).abs() < 1e-18);
}

#[tokio::test]
async fn test_folder_delete_guard() {
    let app = test_app();
    let token = app.register().await;

    let (status, a) = app
        .call("POST", "/api/v1/folders", Some(&token), Some(json!({ "name": "A" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let a_id = a["data"]["id"].as_str().unwrap().to_string();

    let (status, b) = app
        .call(
            "POST",
            "/api/v1/folders",
            Some(&token),
            Some(json!({ "name": "B", "parentId": a_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let b_id = b["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .call("DELETE", &format!("/api/v1/folders/{}", a_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "Cannot delete folder with contents. Please delete all files and subfolders first."
    );

    let (status, _) = app
        .call("DELETE", &format!("/api/v1/folders/{}", b_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    // A folder holding only an item is just as non-empty.
    let (_, link) = app
        .call(
            "POST",
            "/api/v1/links",
            Some(&token),
            Some(json!({ "url": "https://example.com", "folderId": a_id })),
        )
        .await;
    let (status, _) = app
        .call("DELETE", &format!("/api/v1/folders/{}", a_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let link_id = link["data"]["id"].as_str().unwrap();
    app.call("DELETE", &format!("/api/v1/links/{}", link_id), Some(&token), None)
        .await;
    let (status, _) = app
        .call("DELETE", &format!("/api/v1/folders/{}", a_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_ownership_isolation() {
    let app = test_app();
    let owner = app.register().await;
    let stranger = app.register().await;

    let (_, folder) = app
        .call("POST", "/api/v1/folders", Some(&owner), Some(json!({ "name": "Private" })))
        .await;
    let folder_id = folder["data"]["id"].as_str().unwrap().to_string();
    let (_, note) = app
        .call(
            "POST",
            "/api/v1/notes",
            Some(&owner),
            Some(json!({ "name": "secret", "content": "s3cr3t", "folderId": folder_id })),
        )
        .await;
    let note_id = note["data"]["id"].as_str().unwrap().to_string();

    for (method, uri) in [
        ("GET", format!("/api/v1/notes/{}", note_id)),
        ("DELETE", format!("/api/v1/notes/{}", note_id)),
        ("GET", format!("/api/v1/files/{}", note_id)),
        ("PATCH", format!("/api/v1/favorites/{}/toggle", note_id)),
        ("GET", format!("/api/v1/folders/{}", folder_id)),
        ("GET", format!("/api/v1/folders/{}/files", folder_id)),
        ("DELETE", format!("/api/v1/folders/{}", folder_id)),
    ] {
        let (status, _) = app.call(method, &uri, Some(&stranger), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
    }

    // Nor can the stranger file things into the owner's folder.
    let (status, body) = app
        .call(
            "POST",
            "/api/v1/notes",
            Some(&stranger),
            Some(json!({ "name": "intruder", "content": "x", "folderId": folder_id })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Folder not found");

    let (status, _) = app
        .call("GET", &format!("/api/v1/notes/{}", note_id), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_root_sentinel_listing() {
    let app = test_app();
    let token = app.register().await;

    let (_, folder) = app
        .call("POST", "/api/v1/folders", Some(&token), Some(json!({ "name": "A" })))
        .await;
    let folder_id = folder["data"]["id"].as_str().unwrap().to_string();
    app.call(
        "POST",
        "/api/v1/folders",
        Some(&token),
        Some(json!({ "name": "Nested", "parentId": folder_id })),
    )
    .await;

    for (name, folder) in [("inside", Some(folder_id.as_str())), ("outside", None)] {
        app.call(
            "POST",
            "/api/v1/notes",
            Some(&token),
            Some(json!({ "name": name, "content": "x", "folderId": folder })),
        )
        .await;
    }

    let (_, all) = app.call("GET", "/api/v1/notes", Some(&token), None).await;
    assert_eq!(all["data"].as_array().unwrap().len(), 2);

    let (_, root) = app.call("GET", "/api/v1/notes?folderId=root", Some(&token), None).await;
    let root = root["data"].as_array().unwrap();
    assert_eq!(root.len(), 1);
    assert_eq!(root[0]["name"], "outside");
    assert_eq!(root[0]["folderId"], Value::Null);

    let (_, inside) = app
        .call("GET", &format!("/api/v1/notes?folderId={}", folder_id), Some(&token), None)
        .await;
    assert_eq!(inside["data"][0]["name"], "inside");

    let (_, root_folders) = app
        .call("GET", "/api/v1/folders?parentId=root", Some(&token), None)
        .await;
    let root_folders = root_folders["data"].as_array().unwrap();
    assert_eq!(root_folders.len(), 1);
    assert_eq!(root_folders[0]["name"], "A");

    let (status, _) = app
        .call("GET", "/api/v1/notes?folderId=not-a-folder", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_image_upload_roundtrip() {
    let app = test_app();
    let token = app.register().await;
    let data = png(2400, 300);

    let (status, body) = app
        .upload(
            "/api/v1/images/upload",
            &token,
            "image",
            "wide.png",
            "image/png",
            &data,
            Some("root"),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let image = &body["data"];
    assert_eq!(image["type"], "image");
    assert_eq!(image["name"], "wide.png");
    assert_eq!(image["size"], data.len());
    let file_path = image["filePath"].as_str().unwrap().to_string();
    assert!(file_path.starts_with("/uploads/images/"));
    assert_eq!(app.used_storage(&token).await, bytes_to_gb(data.len() as i64));

    let served = app
        .router
        .clone()
        .oneshot(Request::builder().uri(&file_path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(served.status(), StatusCode::OK);
    let stored = axum::body::to_bytes(served.into_body(), usize::MAX).await.unwrap();
    let decoded = image::load_from_memory(&stored).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1920, 240));

    let image_id = image["id"].as_str().unwrap();
    let (status, _) = app
        .call("DELETE", &format!("/api/v1/images/{}", image_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.used_storage(&token).await, 0.0);

    let gone = app
        .router
        .clone()
        .oneshot(Request::builder().uri(&file_path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_rejects_wrong_content_types() {
    let app = test_app();
    let token = app.register().await;

    let (status, body) = app
        .upload("/api/v1/images/upload", &token, "image", "a.gif", "image/gif", b"GIF89a", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Invalid file type. Only JPEG, PNG, and WebP images are allowed."
    );

    let (status, _) = app
        .upload("/api/v1/pdfs/upload", &token, "pdf", "a.pdf", "application/pdf", b"not a pdf", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .upload(
            "/api/v1/pdfs/upload",
            &token,
            "pdf",
            "real.pdf",
            "application/pdf",
            b"%PDF-1.4\n%%EOF\n",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["type"], "pdf");
    assert_eq!(app.used_storage(&token).await, bytes_to_gb(15));

    let small = png(16, 16);
    let (status, body) = app
        .upload("/api/v1/images/upload", &token, "image", "small.jpg", "image/jpg", &small, None)
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["type"], "image");
}

#[tokio::test]
async fn test_dashboard_and_favorites() {
    let app = test_app();
    let token = app.register().await;

    app.call("POST", "/api/v1/folders", Some(&token), Some(json!({ "name": "A" })))
        .await;
    let (_, first) = app
        .call(
            "POST",
            "/api/v1/notes",
            Some(&token),
            Some(json!({ "name": "Groceries", "content": "milk and EGGS" })),
        )
        .await;
    app.call(
        "POST",
        "/api/v1/links",
        Some(&token),
        Some(json!({ "name": "Docs", "url": "https://docs.rs/eggs" })),
    )
    .await;

    let (status, summary) = app.call("GET", "/api/v1/dashboard/summary", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let summary = &summary["data"];
    assert_eq!(summary["notes"]["total"], 1);
    assert_eq!(summary["links"]["total"], 1);
    assert_eq!(summary["links"]["storage"], 0.0);
    assert_eq!(summary["images"]["total"], 0);
    assert_eq!(summary["folders"]["total"], 1);
    assert_eq!(summary["storage"]["total"], 15.0);
    assert_eq!(summary["storage"]["usedPercentage"], 0.0);

    let (_, recent) = app
        .call("GET", "/api/v1/dashboard/recent?limit=1", Some(&token), None)
        .await;
    assert_eq!(recent["data"].as_array().unwrap().len(), 1);
    assert_eq!(recent["data"][0]["type"], "link");

    let (_, hits) = app
        .call("GET", "/api/v1/dashboard/search?q=eggs", Some(&token), None)
        .await;
    assert_eq!(hits["data"].as_array().unwrap().len(), 2);

    let (status, _) = app
        .call("GET", "/api/v1/dashboard/search?q=%20%20", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let note_id = first["data"]["id"].as_str().unwrap();
    let (status, fav) = app
        .call("POST", &format!("/api/v1/favorites/{}", note_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fav["data"]["isFavorite"], true);

    let (_, favorites) = app.call("GET", "/api/v1/favorites", Some(&token), None).await;
    assert_eq!(favorites["data"][0]["id"], note_id);

    let (_, files) = app
        .call("GET", "/api/v1/files?isFavorite=true", Some(&token), None)
        .await;
    assert_eq!(files["data"].as_array().unwrap().len(), 1);

    let (_, toggled) = app
        .call("PATCH", &format!("/api/v1/favorites/{}/toggle", note_id), Some(&token), None)
        .await;
    assert_eq!(toggled["data"]["isFavorite"], false);
}

#[tokio::test]
async fn test_generic_file_delete_refunds_quota() {
    let app = test_app();
    let token = app.register().await;

    let (_, note) = app
        .call(
            "POST",
            "/api/v1/notes",
            Some(&token),
            Some(json!({ "name": "n1", "content": "hello world" })),
        )
        .await;
    assert_eq!(app.used_storage(&token).await, bytes_to_gb(11));

    let note_id = note["data"]["id"].as_str().unwrap();
    let (status, _) = app
        .call("DELETE", &format!("/api/v1/files/{}", note_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.used_storage(&token).await, 0.0);
}

#[tokio::test]
async fn test_account_lifecycle() {
    let app = test_app();

    let (status, _) = app
        .call(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({ "email": "bad-email", "name": "X", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({ "email": "ada@example.com", "name": "Ada", "password": "pass1234" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, login) = app
        .call(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "ADA@example.com", "password": "pass1234" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = login["data"]["token"].as_str().unwrap().to_string();
    assert!(login["data"]["user"].get("passwordHash").is_none());

    let (status, profile) = app
        .call("PUT", "/api/v1/auth/profile", Some(&token), Some(json!({ "name": "Ada L." })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["data"]["name"], "Ada L.");

    let (status, _) = app.call("DELETE", "/api/v1/auth/account", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.call("GET", "/api/v1/auth/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "pass1234" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_metrics_endpoint_without_recorder() {
    let app = test_app();

    let (status, _) = app.call("GET", "/metrics", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
