//! Product routes: public reads and admin multipart writes.

use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::SecondsFormat;
use serde::Serialize;
use storefront_common::{Error, ProductId};
use storefront_db::models::Product;
use utoipa::ToSchema;

use super::error::AppError;
use super::{with_trailing_slash, AppContext};
use crate::catalog::{ProductChanges, ProductDraft, Upload};

/// Public product routes.
pub fn product_routes() -> Router<AppContext> {
    with_trailing_slash(Router::new(), "/products", get(list_products))
        .route("/products/:product_id", get(get_product))
        .route(
            "/products/category/:category",
            get(get_products_by_category),
        )
}

/// Product write routes; the caller adds the admin middleware.
pub fn admin_routes() -> Router<AppContext> {
    with_trailing_slash(Router::new(), "/add-product", post(add_product))
        .route("/update-product/:product_id", put(update_product))
        .route("/delete-product/:product_id", delete(delete_product))
}

// ============================================================================
// Request/Response types
// ============================================================================

/// Locations of a product's three image sizes.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductImages {
    /// 200x200 thumbnail
    pub thumbnail: String,
    /// Main image, at most 600x400
    pub main: String,
    /// Zoom image, at most 800x600
    pub original: String,
}

/// Product information.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    /// Unique product identifier
    pub id: String,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub quantity: i64,
    pub category: String,
    /// Main image location (same as `images.main`)
    pub image_url: String,
    pub images: ProductImages,
    /// When the product was created (RFC 3339)
    pub created_at: String,
    /// When the product was last changed (RFC 3339)
    pub updated_at: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id.to_string(),
            title: p.title,
            price: p.price,
            description: p.description,
            quantity: p.quantity,
            category: p.category,
            image_url: p.images.main.clone(),
            images: ProductImages {
                thumbnail: p.images.thumbnail,
                main: p.images.main,
                original: p.images.original,
            },
            created_at: p.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            updated_at: p.updated_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

/// Convert a list of products into responses.
pub(crate) fn to_responses(products: Vec<Product>) -> Vec<ProductResponse> {
    products.into_iter().map(ProductResponse::from).collect()
}

/// Multipart form for creating or updating a product.
///
/// Every part is required when creating; all are optional when updating.
#[derive(ToSchema)]
pub struct ProductForm {
    pub title: String,
    /// Positive price
    pub price: f64,
    pub description: String,
    /// Units in stock, zero or more
    pub quantity: i64,
    pub category: String,
    /// Image file: jpg, jpeg, png, gif or webp
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

/// Confirmation of a deletion.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub message: String,
}

/// Parsed multipart body.
#[derive(Default)]
struct FormParts {
    fields: HashMap<String, String>,
    image: Option<Upload>,
}

impl FormParts {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut parts = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(invalid_multipart)? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "image" {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(invalid_multipart)?;
                // Browsers send an empty part for an untouched file input
                if filename.is_empty() && data.is_empty() {
                    continue;
                }
                parts.image = Some(Upload { filename, data });
            } else {
                let value = field.text().await.map_err(invalid_multipart)?;
                parts.fields.insert(name, value);
            }
        }
        Ok(parts)
    }

    fn optional(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    fn required(&mut self, name: &str) -> Result<String, AppError> {
        self.optional(name)
            .ok_or_else(|| Error::invalid_input(format!("Missing form field: {}", name)).into())
    }
}

fn invalid_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    Error::invalid_input(format!("Invalid multipart body: {}", e)).into()
}

fn parse_price(raw: &str) -> Result<f64, AppError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| Error::invalid_input(format!("Invalid price: {}", raw)).into())
}

fn parse_quantity(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| Error::invalid_input(format!("Invalid quantity: {}", raw)).into())
}

/// Unknown and malformed IDs are both "not found".
fn parse_product_id(raw: &str) -> Result<ProductId, AppError> {
    raw.parse::<ProductId>()
        .map_err(|_| Error::not_found("Product").into())
}

// ============================================================================
// Handlers
// ============================================================================

/// List all products, oldest first.
#[utoipa::path(
    get,
    path = "/products",
    tag = "products",
    responses(
        (status = 200, description = "All products", body = Vec<ProductResponse>)
    )
)]
pub async fn list_products(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let products = ctx.catalog.list_products()?;
    Ok(Json(to_responses(products)))
}

/// Get a product by ID.
#[utoipa::path(
    get,
    path = "/products/{product_id}",
    tag = "products",
    params(
        ("product_id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product details", body = ProductResponse),
        (status = 404, description = "Product not found")
    )
)]
pub async fn get_product(
    State(ctx): State<AppContext>,
    Path(product_id): Path<String>,
) -> Result<Json<ProductResponse>, AppError> {
    let id = parse_product_id(&product_id)?;
    let product = ctx.catalog.get_product(id)?;
    Ok(Json(product.into()))
}

/// List products in a category (`all` lists every product).
#[utoipa::path(
    get,
    path = "/products/category/{category}",
    tag = "products",
    params(
        ("category" = String, Path, description = "Category name, case-insensitive")
    ),
    responses(
        (status = 200, description = "Products in the category", body = Vec<ProductResponse>)
    )
)]
pub async fn get_products_by_category(
    State(ctx): State<AppContext>,
    Path(category): Path<String>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let products = ctx.catalog.products_by_category(&category)?;
    Ok(Json(to_responses(products)))
}

/// Create a product from a multipart form.
#[utoipa::path(
    post,
    path = "/add-product",
    tag = "admin",
    request_body(content = ProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid field or image"),
        (status = 401, description = "Invalid admin token")
    ),
    security(("admin_token" = []))
)]
pub async fn add_product(
    State(ctx): State<AppContext>,
    multipart: Multipart,
) -> Result<Json<ProductResponse>, AppError> {
    let mut form = FormParts::read(multipart).await?;

    let draft = ProductDraft {
        title: form.required("title")?,
        price: parse_price(&form.required("price")?)?,
        description: form.required("description")?,
        quantity: parse_quantity(&form.required("quantity")?)?,
        category: form.required("category")?,
    };
    let upload = form
        .image
        .take()
        .ok_or_else(|| Error::invalid_input("Missing form field: image"))?;

    let product = ctx.catalog.add_product(draft, upload).await?;
    Ok(Json(product.into()))
}

/// Update some fields of a product, optionally replacing its image.
#[utoipa::path(
    put,
    path = "/update-product/{product_id}",
    tag = "admin",
    params(
        ("product_id" = String, Path, description = "Product ID")
    ),
    request_body(content = ProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Invalid field or image"),
        (status = 401, description = "Invalid admin token"),
        (status = 404, description = "Product not found")
    ),
    security(("admin_token" = []))
)]
pub async fn update_product(
    State(ctx): State<AppContext>,
    Path(product_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<ProductResponse>, AppError> {
    let id = parse_product_id(&product_id)?;
    let mut form = FormParts::read(multipart).await?;

    let changes = ProductChanges {
        title: form.optional("title"),
        price: form.optional("price").as_deref().map(parse_price).transpose()?,
        description: form.optional("description"),
        quantity: form
            .optional("quantity")
            .as_deref()
            .map(parse_quantity)
            .transpose()?,
        category: form.optional("category"),
    };

    let product = ctx
        .catalog
        .update_product(id, changes, form.image.take())
        .await?;
    Ok(Json(product.into()))
}

/// Delete a product and its image files.
#[utoipa::path(
    delete,
    path = "/delete-product/{product_id}",
    tag = "admin",
    params(
        ("product_id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product deleted", body = DeleteResponse),
        (status = 401, description = "Invalid admin token"),
        (status = 404, description = "Product not found")
    ),
    security(("admin_token" = []))
)]
pub async fn delete_product(
    State(ctx): State<AppContext>,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_product_id(&product_id)?;
    let product = ctx.catalog.delete_product(id)?;
    Ok(Json(DeleteResponse {
        message: format!("Product '{}' deleted successfully", product.title),
    }))
}
