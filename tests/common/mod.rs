//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which builds a config rooted in a temporary
//! directory, the catalog for it, and the full [`AppContext`]. Requests are
//! driven through the router with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;
use tower::ServiceExt;

use storefront::config::{Config, StorageBackend};
use storefront::server::{build_catalog, create_router, AppContext};

pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Test harness wrapping a fully-constructed [`AppContext`].
pub struct TestHarness {
    pub ctx: AppContext,
    pub dir: TempDir,
}

impl TestHarness {
    /// In-memory product storage.
    pub fn new() -> Self {
        Self::with_backend(StorageBackend::Memory)
    }

    /// SQLite database inside the temporary directory.
    pub fn with_sqlite() -> Self {
        Self::with_backend(StorageBackend::Sqlite)
    }

    pub fn with_backend(backend: StorageBackend) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.server.auth.admin_token = Some(ADMIN_TOKEN.to_string());
        config.storage.backend = backend;
        config.storage.db_path = dir.path().join("storefront.db");
        config.storage.images_dir = dir.path().join("images");
        Self::with_config(config, dir)
    }

    pub fn with_config(config: Config, dir: TempDir) -> Self {
        let catalog = build_catalog(&config).unwrap();
        Self {
            ctx: AppContext::new(config, catalog),
            dir,
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.ctx.clone())
    }

    pub fn images_dir(&self) -> PathBuf {
        self.dir.path().join("images")
    }

    /// Send a request and decode the JSON body (`Null` when empty).
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Create a product through the API and return its JSON.
    pub async fn add_product(
        &self,
        title: &str,
        category: &str,
        price: &str,
        quantity: &str,
    ) -> serde_json::Value {
        let form = MultipartForm::new()
            .text("title", title)
            .text("price", price)
            .text("description", &format!("{} description", title))
            .text("quantity", quantity)
            .text("category", category)
            .file("image", "photo.jpg", "image/jpeg", &jpeg(400, 300));
        let (status, json) = self
            .send(form.request(Method::POST, "/add-product", Some(ADMIN_TOKEN)))
            .await;
        assert_eq!(status, StatusCode::OK, "add-product failed: {}", json);
        json
    }

    /// Files currently stored in the three buckets.
    pub fn bucket_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for bucket in ["thumbnails", "main", "original"] {
            let dir = self.images_dir().join(bucket);
            if let Ok(entries) = std::fs::read_dir(&dir) {
                files.extend(entries.map(|e| e.unwrap().path()));
            }
        }
        files
    }

    /// Filesystem path behind an image location such as `/images/main/x.jpg`.
    pub fn image_path(&self, location: &str) -> PathBuf {
        let relative = location
            .strip_prefix("/images/")
            .expect("location under /images");
        self.images_dir().join(relative)
    }
}

/// Encode a solid-colour RGB JPEG.
pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([180, 90, 40]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Jpeg)
        .unwrap();
    buf.into_inner()
}

pub fn image_dimensions(path: &Path) -> (u32, u32) {
    let img = image::open(path).unwrap();
    (img.width(), img.height())
}

/// Builder for `multipart/form-data` request bodies.
pub struct MultipartForm {
    body: Vec<u8>,
}

const BOUNDARY: &str = "storefront-test-boundary";

impl MultipartForm {
    pub fn new() -> Self {
        Self { body: Vec::new() }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn request(mut self, method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let mut builder = Request::builder().method(method).uri(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(self.body)).unwrap()
    }
}
