//! Storefront - Product catalog backend
//!
//! This library crate exposes the core functionality for integration testing.

pub mod catalog;
pub mod config;
pub mod images;
pub mod server;
