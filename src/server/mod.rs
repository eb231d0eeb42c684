use crate::catalog::{Catalog, MemoryRepository, ProductRepository, SqliteRepository};
use crate::config::{Config, StorageBackend};
use crate::images::{ImagePipeline, ImageStore};
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, MethodRouter},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use storefront_db::pool::init_pool;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub mod auth;
pub mod error;
pub mod openapi;
pub mod routes_catalog;
pub mod routes_products;

pub use error::AppError;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub catalog: Catalog,
}

impl AppContext {
    pub fn new(config: Config, catalog: Catalog) -> Self {
        Self {
            config: Arc::new(config),
            catalog,
        }
    }
}

/// Build the catalog for a configuration: repository backend plus image pipeline.
///
/// Creates the image bucket directories and, for SQLite, opens the database
/// and runs migrations.
pub fn build_catalog(config: &Config) -> Result<Catalog> {
    let store = ImageStore::new(&config.storage.images_dir, &config.storage.url_prefix);
    store.ensure_layout().with_context(|| {
        format!(
            "Failed to create image directories under {:?}",
            config.storage.images_dir
        )
    })?;

    let repo: Arc<dyn ProductRepository> = match config.storage.backend {
        StorageBackend::Sqlite => {
            let db_path = config.storage.db_path.to_string_lossy();
            tracing::info!("Initializing database at {}", db_path);
            Arc::new(SqliteRepository::new(init_pool(&db_path)?))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory product storage; products are lost on restart");
            Arc::new(MemoryRepository::new())
        }
    };

    Ok(Catalog::new(repo, Arc::new(ImagePipeline::new(store))))
}

/// Register `handler` at `path` and at `path/`.
pub(crate) fn with_trailing_slash(
    router: Router<AppContext>,
    path: &str,
    handler: MethodRouter<AppContext>,
) -> Router<AppContext> {
    router
        .route(path, handler.clone())
        .route(&format!("{}/", path), handler)
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let admin_routes = routes_products::admin_routes()
        .layer(DefaultBodyLimit::max(ctx.config.server.max_upload_bytes))
        .layer(middleware::from_fn_with_state(
            ctx.clone(),
            auth::admin_auth_middleware,
        ));

    // Derivative files, e.g. /images/main/<uuid>.jpg
    let images = ServeDir::new(ctx.catalog.images().store().root());
    let images_path = ctx.catalog.images().store().url_prefix().to_string();

    Router::new()
        .route("/health", get(health_check))
        .merge(routes_catalog::catalog_routes())
        .merge(routes_products::product_routes())
        .merge(admin_routes)
        .merge(openapi::openapi_routes())
        .nest_service(&images_path, images)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Health check.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is up")
    )
)]
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    if config.server.auth.admin_token.is_none() {
        tracing::warn!(
            "No server.auth.admin_token configured; product write endpoints will reject every request"
        );
    }

    let catalog = build_catalog(&config)?;
    tracing::info!(
        "Serving images from {:?} at {}",
        catalog.images().store().root(),
        catalog.images().store().url_prefix()
    );

    let app = create_router(AppContext::new(config, catalog));

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
