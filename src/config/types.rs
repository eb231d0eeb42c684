use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body for product uploads, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Bearer token required by the product write endpoints
    /// (generate with `storefront generate-token`). Without one, every
    /// write request is rejected.
    #[serde(default)]
    pub admin_token: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
            auth: AuthConfig::default(),
        }
    }
}

/// Where product records are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SQLite database at `db_path`.
    #[default]
    Sqlite,
    /// Process-local list; lost on restart.
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Root of the `thumbnails/`, `main/` and `original/` buckets
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,

    /// URL path the images directory is served under
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("storefront.db")
}
fn default_images_dir() -> PathBuf {
    PathBuf::from("images")
}
fn default_url_prefix() -> String {
    "/images".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            db_path: default_db_path(),
            images_dir: default_images_dir(),
            url_prefix: default_url_prefix(),
        }
    }
}
