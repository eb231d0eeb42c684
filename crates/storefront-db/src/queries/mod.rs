//! Database query modules.
//!
//! - products: Product CRUD, partial updates, filtering and search

pub mod products;
