//! Configuration loading and validation.

use std::io::Write;
use std::path::PathBuf;

use storefront::config::{
    load_config, load_config_or_default, validate_config, Config, StorageBackend,
};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.server.max_upload_bytes, 10 * 1024 * 1024);
    assert!(config.server.auth.admin_token.is_none());
    assert_eq!(config.storage.backend, StorageBackend::Sqlite);
    assert_eq!(config.storage.url_prefix, "/images");
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_load_partial_file() {
    let file = write_config(
        r#"
[server]
port = 9000

[server.auth]
admin_token = "secret"

[storage]
backend = "memory"
images_dir = "/srv/shop/images"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.auth.admin_token.as_deref(), Some("secret"));
    assert_eq!(config.storage.backend, StorageBackend::Memory);
    assert_eq!(config.storage.images_dir, PathBuf::from("/srv/shop/images"));
    assert_eq!(config.storage.db_path, PathBuf::from("storefront.db"));
}

#[test]
fn test_load_rejects_invalid_values() {
    let cases = [
        "[server]\nport = 0\n",
        "[server.auth]\nadmin_token = \"   \"\n",
        "[storage]\nurl_prefix = \"images\"\n",
        "[storage]\nurl_prefix = \"/\"\n",
        "[storage]\nbackend = \"postgres\"\n",
    ];
    for contents in cases {
        let file = write_config(contents);
        assert!(load_config(file.path()).is_err(), "accepted: {contents}");
    }
}

#[test]
fn test_explicit_path_must_exist() {
    let missing = std::env::temp_dir().join("storefront-missing-config.toml");
    assert!(load_config_or_default(Some(&missing)).is_err());
}
