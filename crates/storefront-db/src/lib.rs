//! Storefront-DB: Database schema, migrations, and query operations
//!
//! This crate provides database functionality for storefront using SQLite
//! with rusqlite and r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use storefront_db::pool::{init_pool, get_conn};
//! use storefront_db::models::ProductFilter;
//! use storefront_db::queries::products;
//!
//! let pool = init_pool("/var/lib/storefront/storefront.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let all = products::list_products(&conn, &ProductFilter::default()).unwrap();
//! println!("{} products", all.len());
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
