//! OpenAPI documentation and Swagger UI integration.
//!
//! This module provides OpenAPI 3.0 documentation for the Storefront API.

use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use super::AppContext;

/// OpenAPI documentation for Storefront.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "0.1.0",
        description = "Product catalog with categories, filtering, search and multi-size product images",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
    ),
    servers(
        (url = "/", description = "Default server")
    ),
    paths(
        super::health_check,
        super::routes_catalog::root_info,
        super::routes_catalog::get_categories,
        super::routes_catalog::filter_products,
        super::routes_catalog::search_products,
        super::routes_products::list_products,
        super::routes_products::get_product,
        super::routes_products::get_products_by_category,
        super::routes_products::add_product,
        super::routes_products::update_product,
        super::routes_products::delete_product,
    ),
    components(
        schemas(
            super::routes_catalog::ApiInfo,
            super::routes_catalog::ApiEndpoints,
            super::routes_catalog::FilterResponse,
            super::routes_catalog::FiltersApplied,
            super::routes_products::ProductResponse,
            super::routes_products::ProductImages,
            super::routes_products::ProductForm,
            super::routes_products::DeleteResponse,
            crate::catalog::CategoryReport,
            crate::catalog::CategorySummary,
        )
    ),
    modifiers(&AdminTokenScheme),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "products", description = "Public product endpoints"),
        (name = "catalog", description = "Categories, filtering and search"),
        (name = "admin", description = "Product management, requires the admin token"),
    )
)]
pub struct ApiDoc;

/// Registers the bearer scheme referenced by the admin endpoints.
struct AdminTokenScheme;

impl Modify for AdminTokenScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "admin_token",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Swagger UI at `/api-docs`, document at `/openapi.json`.
pub fn openapi_routes() -> Router<AppContext> {
    Router::new().merge(SwaggerUi::new("/api-docs").url("/openapi.json", ApiDoc::openapi()))
}
