mod cli;

use storefront::{
    config,
    server::{self, auth},
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    // Load config
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting Storefront server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "storefront=trace,storefront_db=debug,storefront_common=debug,tower_http=debug"
                .to_string()
        } else {
            "storefront=info,storefront_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            // Create tokio runtime
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::ProcessImage { file } => process_image(&file, cli.config.as_deref()),
        Commands::Export { output } => export_products(&output, cli.config.as_deref()),
        Commands::Import { input } => import_products(&input, cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::GenerateToken => {
            println!("{}", auth::generate_token());
            Ok(())
        }
        Commands::Version => {
            println!("storefront {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn process_image(file: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !file.exists() {
        anyhow::bail!("Input file does not exist: {:?}", file);
    }

    let catalog = server::build_catalog(&config)?;
    tracing::info!("Processing image: {:?}", file);
    let images = catalog
        .images()
        .process_file(file)
        .with_context(|| format!("Failed to process {:?}", file))?;

    println!("Thumbnail: {}", images.thumbnail);
    println!("Main:      {}", images.main);
    println!("Original:  {}", images.original);
    Ok(())
}

fn export_products(output: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let catalog = server::build_catalog(&config)?;

    let json = catalog.export_json()?;
    std::fs::write(output, json)
        .with_context(|| format!("Failed to write backup file: {:?}", output))?;

    println!(
        "Exported {} product(s) to {}",
        catalog.list_products()?.len(),
        output.display()
    );
    Ok(())
}

fn import_products(input: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    if config.storage.backend == config::StorageBackend::Memory {
        anyhow::bail!("Importing into the in-memory backend has no lasting effect");
    }
    let catalog = server::build_catalog(&config)?;

    let json = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read backup file: {:?}", input))?;
    let summary = catalog.import_json(&json)?;

    println!(
        "Imported {} product(s), skipped {} existing",
        summary.imported, summary.skipped
    );
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!(
                "  Admin token: {}",
                if config.server.auth.admin_token.is_some() {
                    "configured"
                } else {
                    "not configured (writes disabled)"
                }
            );
            println!("  Storage backend: {:?}", config.storage.backend);
            println!("  Database: {:?}", config.storage.db_path);
            println!(
                "  Images: {:?} served at {}",
                config.storage.images_dir, config.storage.url_prefix
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Storage backend: {:?}", config.storage.backend);
        }
    }

    Ok(())
}
