//! Catalog service: product lifecycle, listings and category summaries.
//!
//! [`Catalog`] ties a [`ProductRepository`] to the [`ImagePipeline`]. Image
//! files and product records are kept consistent: fresh derivatives are
//! removed when the record write fails, and replaced derivatives are removed
//! only after the record points at the new ones.

pub mod backup;
pub mod repository;

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use storefront_common::{Error, ImageReferenceSet, ProductId, Result, SortField, SortOrder};
use storefront_db::models::{NewProduct, Product, ProductFilter, ProductPatch};
use utoipa::ToSchema;

use crate::images::ImagePipeline;

pub use backup::ImportSummary;
pub use repository::{MemoryRepository, ProductRepository, ProductUpdate, SqliteRepository};

/// An uploaded image file.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-declared filename; its extension selects the format.
    pub filename: String,
    pub data: Bytes,
}

/// Fields of a new product, before its image is processed.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub quantity: i64,
    pub category: String,
}

/// Requested changes to a product's text and stock fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    pub category: Option<String>,
}

/// Stock statistics for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CategorySummary {
    /// Spelling of the first product seen in this category.
    pub name: String,
    pub count: usize,
    pub total_products: usize,
    pub in_stock: usize,
    pub out_of_stock: usize,
}

/// All categories, most populated first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CategoryReport {
    pub categories: Vec<CategorySummary>,
    pub total_categories: usize,
    pub all_products_count: usize,
}

/// Product catalog backed by a repository and the image pipeline.
#[derive(Clone)]
pub struct Catalog {
    repo: Arc<dyn ProductRepository>,
    images: Arc<ImagePipeline>,
}

impl Catalog {
    pub fn new(repo: Arc<dyn ProductRepository>, images: Arc<ImagePipeline>) -> Self {
        Self { repo, images }
    }

    pub fn images(&self) -> &ImagePipeline {
        &self.images
    }

    pub fn repository(&self) -> &dyn ProductRepository {
        self.repo.as_ref()
    }

    /// Create a product from a draft and its uploaded image.
    pub async fn add_product(&self, draft: ProductDraft, upload: Upload) -> Result<Product> {
        validate_price(draft.price)?;
        validate_quantity(draft.quantity)?;

        let images = self.process_upload(upload).await?;
        let new = NewProduct {
            title: draft.title,
            description: draft.description,
            price: draft.price,
            quantity: draft.quantity,
            category: draft.category,
            images: images.clone(),
        };

        match self.repo.create(new) {
            Ok(product) => {
                tracing::info!("Added product {} ({})", product.id, product.title);
                Ok(product)
            }
            Err(e) => {
                self.images.delete(&images);
                Err(e)
            }
        }
    }

    /// Apply changes and, with an upload, replace the product's images.
    pub async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
        upload: Option<Upload>,
    ) -> Result<Product> {
        // Unknown IDs fail before any image work
        self.get_product(id)?;
        if let Some(price) = changes.price {
            validate_price(price)?;
        }
        if let Some(quantity) = changes.quantity {
            validate_quantity(quantity)?;
        }

        let new_images = match upload {
            Some(upload) => Some(self.process_upload(upload).await?),
            None => None,
        };
        let patch = ProductPatch {
            title: changes.title,
            description: changes.description,
            price: changes.price,
            quantity: changes.quantity,
            category: changes.category,
            images: new_images.clone(),
        };

        let result = self
            .repo
            .update(id, patch)
            .and_then(|update| update.ok_or_else(|| Error::not_found("Product")));

        match (&result, new_images) {
            // Images of the record as it was replaced
            (Ok(update), Some(_)) => self.images.delete(&update.previous.images),
            (Err(_), Some(fresh)) => self.images.delete(&fresh),
            (_, None) => {}
        }

        let updated = result?.current;
        tracing::info!("Updated product {} ({})", updated.id, updated.title);
        Ok(updated)
    }

    /// Remove a product and its image files.
    pub fn delete_product(&self, id: ProductId) -> Result<Product> {
        let product = self
            .repo
            .delete(id)?
            .ok_or_else(|| Error::not_found("Product"))?;
        self.images.delete(&product.images);
        tracing::info!("Deleted product {} ({})", product.id, product.title);
        Ok(product)
    }

    pub fn get_product(&self, id: ProductId) -> Result<Product> {
        self.repo
            .get(id)?
            .ok_or_else(|| Error::not_found("Product"))
    }

    /// Every product, oldest first.
    pub fn list_products(&self) -> Result<Vec<Product>> {
        self.repo.list(&insertion_order(ProductFilter::default()))
    }

    /// Products in one category (case-insensitive); `all` lists everything.
    pub fn products_by_category(&self, category: &str) -> Result<Vec<Product>> {
        self.repo
            .list(&insertion_order(ProductFilter::category(category)))
    }

    /// Products matching `filter`, in the filter's order.
    pub fn filter_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        self.repo.list(filter)
    }

    /// Case-insensitive title/description search; an empty query lists everything.
    pub fn search(&self, query: &str) -> Result<Vec<Product>> {
        self.repo.list(&insertion_order(ProductFilter::search(query)))
    }

    /// Per-category stock statistics.
    pub fn categories(&self) -> Result<CategoryReport> {
        let products = self.list_products()?;
        Ok(summarize_categories(&products))
    }

    async fn process_upload(&self, upload: Upload) -> Result<ImageReferenceSet> {
        let pipeline = Arc::clone(&self.images);
        let images = tokio::task::spawn_blocking(move || {
            pipeline.process(&upload.data, &upload.filename)
        })
        .await
        .map_err(|e| Error::internal(format!("Image task failed: {}", e)))??;
        Ok(images)
    }
}

fn insertion_order(filter: ProductFilter) -> ProductFilter {
    ProductFilter {
        sort_by: SortField::CreatedAt,
        sort_order: SortOrder::Asc,
        ..filter
    }
}

fn validate_price(price: f64) -> Result<()> {
    if !(price.is_finite() && price > 0.0) {
        return Err(Error::invalid_input("Price must be positive"));
    }
    Ok(())
}

fn validate_quantity(quantity: i64) -> Result<()> {
    if quantity < 0 {
        return Err(Error::invalid_input("Quantity cannot be negative"));
    }
    Ok(())
}

/// Group products by lowercase category and sort by size, largest first.
///
/// Equal-sized categories keep the order in which they were first seen.
pub fn summarize_categories(products: &[Product]) -> CategoryReport {
    let mut categories: Vec<CategorySummary> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for product in products {
        let idx = *index
            .entry(product.category.to_lowercase())
            .or_insert_with(|| {
                categories.push(CategorySummary {
                    name: product.category.clone(),
                    count: 0,
                    total_products: 0,
                    in_stock: 0,
                    out_of_stock: 0,
                });
                categories.len() - 1
            });
        let summary = &mut categories[idx];
        summary.count += 1;
        summary.total_products += 1;
        if product.in_stock() {
            summary.in_stock += 1;
        } else {
            summary.out_of_stock += 1;
        }
    }

    categories.sort_by(|a, b| b.count.cmp(&a.count));
    CategoryReport {
        total_categories: categories.len(),
        all_products_count: products.len(),
        categories,
    }
}
