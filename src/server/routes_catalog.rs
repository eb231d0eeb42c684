//! Catalog browsing routes: categories, filtering and search.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use storefront_common::{SortField, SortOrder};
use storefront_db::models::ProductFilter;
use utoipa::{IntoParams, ToSchema};

use super::error::AppError;
use super::routes_products::{to_responses, ProductResponse};
use super::{with_trailing_slash, AppContext};
use crate::catalog::CategoryReport;

/// Create catalog routes.
pub fn catalog_routes() -> Router<AppContext> {
    let router = Router::new().route("/", get(root_info));
    let router = with_trailing_slash(router, "/categories", get(get_categories));
    let router = with_trailing_slash(router, "/filter", get(filter_products));
    with_trailing_slash(router, "/search", get(search_products))
}

// ============================================================================
// Request/Response types
// ============================================================================

/// API name, version and main endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiInfo {
    pub message: String,
    pub version: String,
    pub endpoints: ApiEndpoints,
}

/// Main endpoint paths.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiEndpoints {
    pub products: String,
    pub categories: String,
    pub filter: String,
    pub search: String,
    pub add_product: String,
    pub update_product: String,
    pub delete_product: String,
    pub docs: String,
}

/// Query parameters for filtering products.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FilterParams {
    /// Category, case-insensitive (`all` disables the filter)
    pub category: Option<String>,
    /// Lowest price, inclusive
    pub min_price: Option<f64>,
    /// Highest price, inclusive
    pub max_price: Option<f64>,
    /// `true` for products with stock, `false` for sold out
    pub in_stock: Option<bool>,
    /// created_at (default), price, title or quantity
    pub sort_by: Option<String>,
    /// desc (default) or asc
    pub sort_order: Option<String>,
}

impl FilterParams {
    fn sort_by(&self) -> &str {
        self.sort_by.as_deref().unwrap_or("created_at")
    }

    fn sort_order(&self) -> &str {
        self.sort_order.as_deref().unwrap_or("desc")
    }

    fn to_filter(&self) -> ProductFilter {
        ProductFilter {
            category: self.category.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            in_stock: self.in_stock,
            search: None,
            sort_by: SortField::parse_lenient(self.sort_by()),
            sort_order: SortOrder::parse_lenient(self.sort_order()),
        }
    }
}

/// Echo of the filter parameters a listing was produced with.
#[derive(Debug, Serialize, ToSchema)]
pub struct FiltersApplied {
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub in_stock: Option<bool>,
    pub sort_by: String,
    pub sort_order: String,
}

/// Filtered product listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct FilterResponse {
    pub products: Vec<ProductResponse>,
    pub total_found: usize,
    pub filters_applied: FiltersApplied,
}

/// Search query.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Text to find in titles and descriptions; empty lists everything
    #[serde(default)]
    pub q: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// API information.
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses(
        (status = 200, description = "API information", body = ApiInfo)
    )
)]
pub async fn root_info() -> Json<ApiInfo> {
    let path = |p: &str| p.to_string();
    Json(ApiInfo {
        message: "Storefront API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: ApiEndpoints {
            products: path("/products"),
            categories: path("/categories"),
            filter: path("/filter"),
            search: path("/search?q="),
            add_product: path("/add-product (POST, admin only)"),
            update_product: path("/update-product/{product_id} (PUT, admin only)"),
            delete_product: path("/delete-product/{product_id} (DELETE, admin only)"),
            docs: path("/api-docs"),
        },
    })
}

/// Category summaries, most populated first.
#[utoipa::path(
    get,
    path = "/categories",
    tag = "catalog",
    responses(
        (status = 200, description = "Category summaries", body = CategoryReport)
    )
)]
pub async fn get_categories(
    State(ctx): State<AppContext>,
) -> Result<Json<CategoryReport>, AppError> {
    Ok(Json(ctx.catalog.categories()?))
}

/// Filter and sort products.
#[utoipa::path(
    get,
    path = "/filter",
    tag = "catalog",
    params(FilterParams),
    responses(
        (status = 200, description = "Matching products", body = FilterResponse)
    )
)]
pub async fn filter_products(
    State(ctx): State<AppContext>,
    Query(params): Query<FilterParams>,
) -> Result<Json<FilterResponse>, AppError> {
    let products = ctx.catalog.filter_products(&params.to_filter())?;

    Ok(Json(FilterResponse {
        total_found: products.len(),
        products: to_responses(products),
        filters_applied: FiltersApplied {
            sort_by: params.sort_by().to_string(),
            sort_order: params.sort_order().to_string(),
            category: params.category,
            min_price: params.min_price,
            max_price: params.max_price,
            in_stock: params.in_stock,
        },
    }))
}

/// Search titles and descriptions.
#[utoipa::path(
    get,
    path = "/search",
    tag = "catalog",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching products", body = Vec<ProductResponse>)
    )
)]
pub async fn search_products(
    State(ctx): State<AppContext>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let products = ctx.catalog.search(&params.q)?;
    Ok(Json(to_responses(products)))
}
