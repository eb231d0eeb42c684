mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;
    expand_paths(&mut config);

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./storefront.toml",
        "~/.config/storefront/config.toml",
        "/etc/storefront/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

/// Expand `~` in storage paths.
fn expand_paths(config: &mut Config) {
    for path in [&mut config.storage.db_path, &mut config.storage.images_dir] {
        let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
        *path = expanded.into();
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.server.max_upload_bytes == 0 {
        anyhow::bail!("server.max_upload_bytes cannot be 0");
    }

    if let Some(token) = &config.server.auth.admin_token {
        if token.trim().is_empty() {
            anyhow::bail!("server.auth.admin_token is set but empty");
        }
    }

    let prefix = &config.storage.url_prefix;
    if !prefix.starts_with('/') || prefix.trim_end_matches('/').is_empty() {
        anyhow::bail!(
            "storage.url_prefix must be an absolute path below '/', got '{}'",
            prefix
        );
    }

    if config.storage.images_dir.as_os_str().is_empty() {
        anyhow::bail!("storage.images_dir cannot be empty");
    }

    if config.storage.backend == StorageBackend::Sqlite
        && config.storage.db_path.as_os_str().is_empty()
    {
        anyhow::bail!("storage.db_path cannot be empty with the sqlite backend");
    }

    Ok(())
}
