//! Internal Rust models matching the database schema.
//!
//! [`Product`] maps to the `products` table. [`NewProduct`], [`ProductPatch`]
//! and [`ProductFilter`] are the inputs of the insert, partial update and
//! listing queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_common::{ImageReferenceSet, ProductId, SortField, SortOrder};

/// Catalog product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub quantity: i64,
    pub category: String,
    pub images: ImageReferenceSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Build a product from creation input, assigning a fresh ID and timestamps.
    pub fn from_new(new: NewProduct) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::new(),
            title: new.title,
            description: new.description,
            price: new.price,
            quantity: new.quantity,
            category: new.category,
            images: new.images,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether at least one unit is available.
    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }

    /// Apply the present fields of a patch and bump `updated_at`.
    pub fn apply(&mut self, patch: ProductPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(images) = patch.images {
            self.images = images;
        }
        self.updated_at = Utc::now();
    }

    /// Whether the product passes every criterion of a filter.
    ///
    /// Sorting is not considered.
    pub fn matches(&self, filter: &ProductFilter) -> bool {
        if let Some(category) = filter.category_criterion() {
            if self.category.to_lowercase() != category.to_lowercase() {
                return false;
            }
        }
        if filter.min_price.is_some_and(|min| self.price < min) {
            return false;
        }
        if filter.max_price.is_some_and(|max| self.price > max) {
            return false;
        }
        if let Some(in_stock) = filter.in_stock {
            if in_stock != self.in_stock() {
                return false;
            }
        }
        if let Some(term) = filter.search_criterion() {
            let term = term.to_lowercase();
            if !self.title.to_lowercase().contains(&term)
                && !self.description.to_lowercase().contains(&term)
            {
                return false;
            }
        }
        true
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub quantity: i64,
    pub category: String,
    pub images: ImageReferenceSet,
}

/// Partial update: only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    pub category: Option<String>,
    pub images: Option<ImageReferenceSet>,
}

/// Listing criteria and ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive category; `all` disables the criterion.
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// `true`: quantity > 0, `false`: quantity == 0.
    pub in_stock: Option<bool>,
    /// Case-insensitive substring of title or description.
    pub search: Option<String>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl ProductFilter {
    /// Filter on one category (`all` matches everything).
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    /// Filter on a search term (empty matches everything).
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }

    /// Effective category criterion, if any.
    pub fn category_criterion(&self) -> Option<&str> {
        self.category
            .as_deref()
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
    }

    /// Effective search criterion, if any.
    pub fn search_criterion(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }
}
