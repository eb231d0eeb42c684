//! Storefront-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across storefront:
//!
//! - **Typed IDs**: Type-safe UUID wrapper for products
//! - **Catalog Types**: Sort fields, sort order, and image reference sets
//! - **Path Utilities**: Upload extension validation and normalization
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use storefront_common::{ProductId, SortField, Error, Result};
//! use storefront_common::paths::normalized_image_extension;
//!
//! let product_id = ProductId::new();
//! assert_eq!(SortField::default(), SortField::CreatedAt);
//! assert_eq!(normalized_image_extension("photo.JPEG"), Some("jpg"));
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("product"))
//! }
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
