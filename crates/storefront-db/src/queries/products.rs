//! Product database queries.
//!
//! This module provides CRUD operations for catalog products. Updates and
//! listings build their SQL from whichever criteria are present; every value
//! is bound as a named parameter.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, ToSql};
use storefront_common::{Error, ImageReferenceSet, ProductId, Result, SortField, SortOrder};

use crate::models::{NewProduct, Product, ProductFilter, ProductPatch};

const PRODUCT_COLUMNS: &str = "id, title, description, price, quantity, category, \
     image_thumb_url, image_main_url, image_full_url, created_at, updated_at";

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn conversion_error<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn parse_timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

/// Parse a product from a database row.
///
/// Expects columns in the order of `PRODUCT_COLUMNS`.
fn parse_product_row(row: &rusqlite::Row) -> rusqlite::Result<Product> {
    let id: String = row.get(0)?;
    let id = id.parse::<ProductId>().map_err(|e| conversion_error(0, e))?;

    Ok(Product {
        id,
        title: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        quantity: row.get(4)?,
        category: row.get(5)?,
        images: ImageReferenceSet {
            thumbnail: row.get(6)?,
            main: row.get(7)?,
            original: row.get(8)?,
        },
        created_at: parse_timestamp(row, 9)?,
        updated_at: parse_timestamp(row, 10)?,
    })
}

/// Insert a fully-formed product (ID and timestamps included).
///
/// Used directly by backup import; regular creation goes through
/// [`create_product`].
pub fn insert_product(conn: &Connection, product: &Product) -> Result<()> {
    conn.execute(
        "INSERT INTO products (id, title, description, price, quantity, category,
                               image_thumb_url, image_main_url, image_full_url,
                               created_at, updated_at)
         VALUES (:id, :title, :description, :price, :quantity, :category,
                 :thumb, :main, :full, :created_at, :updated_at)",
        rusqlite::named_params! {
            ":id": product.id.to_string(),
            ":title": &product.title,
            ":description": &product.description,
            ":price": product.price,
            ":quantity": product.quantity,
            ":category": &product.category,
            ":thumb": &product.images.thumbnail,
            ":main": &product.images.main,
            ":full": &product.images.original,
            ":created_at": format_timestamp(&product.created_at),
            ":updated_at": format_timestamp(&product.updated_at),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

/// Create a new product with a fresh ID.
///
/// # Returns
///
/// * `Ok(Product)` - The created product
/// * `Err(Error)` - If a database error occurs
pub fn create_product(conn: &Connection, new: NewProduct) -> Result<Product> {
    let product = Product::from_new(new);
    insert_product(conn, &product)?;
    Ok(product)
}

/// Get a product by ID.
///
/// # Returns
///
/// * `Ok(Some(Product))` - The product if found
/// * `Ok(None)` - If the product does not exist
/// * `Err(Error)` - If a database error occurs
pub fn get_product(conn: &Connection, id: ProductId) -> Result<Option<Product>> {
    conn.query_row(
        &format!("SELECT {} FROM products WHERE id = :id", PRODUCT_COLUMNS),
        rusqlite::named_params! { ":id": id.to_string() },
        parse_product_row,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Apply a partial update.
///
/// Only the fields present in `patch` appear in the `SET` clause;
/// `updated_at` is always refreshed.
///
/// # Returns
///
/// * `Ok(Some(Product))` - The product after the update
/// * `Ok(None)` - If the product does not exist
/// * `Err(Error)` - If a database error occurs
pub fn update_product(
    conn: &Connection,
    id: ProductId,
    patch: &ProductPatch,
) -> Result<Option<Product>> {
    let id_str = id.to_string();
    let updated_at = format_timestamp(&Utc::now());

    let mut assignments: Vec<&str> = Vec::new();
    let mut params: Vec<(&str, &dyn ToSql)> = Vec::new();

    if let Some(ref title) = patch.title {
        assignments.push("title = :title");
        params.push((":title", title));
    }
    if let Some(ref description) = patch.description {
        assignments.push("description = :description");
        params.push((":description", description));
    }
    if let Some(ref price) = patch.price {
        assignments.push("price = :price");
        params.push((":price", price));
    }
    if let Some(ref quantity) = patch.quantity {
        assignments.push("quantity = :quantity");
        params.push((":quantity", quantity));
    }
    if let Some(ref category) = patch.category {
        assignments.push("category = :category");
        params.push((":category", category));
    }
    if let Some(ref images) = patch.images {
        assignments.push("image_thumb_url = :thumb");
        assignments.push("image_main_url = :main");
        assignments.push("image_full_url = :full");
        params.push((":thumb", &images.thumbnail));
        params.push((":main", &images.main));
        params.push((":full", &images.original));
    }

    assignments.push("updated_at = :updated_at");
    params.push((":updated_at", &updated_at));
    params.push((":id", &id_str));

    let query = format!(
        "UPDATE products SET {} WHERE id = :id",
        assignments.join(", ")
    );

    let changed = conn
        .execute(&query, &*params)
        .map_err(|e| Error::database(e.to_string()))?;

    if changed == 0 {
        return Ok(None);
    }

    get_product(conn, id)
}

/// Delete a product by ID.
///
/// # Returns
///
/// * `Ok(true)` - If the product was deleted
/// * `Ok(false)` - If the product did not exist
/// * `Err(Error)` - If a database error occurs
pub fn delete_product(conn: &Connection, id: ProductId) -> Result<bool> {
    let deleted = conn
        .execute(
            "DELETE FROM products WHERE id = :id",
            rusqlite::named_params! { ":id": id.to_string() },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(deleted > 0)
}

/// List products matching filter criteria, in the filter's order.
///
/// Ties keep insertion order.
pub fn list_products(conn: &Connection, filter: &ProductFilter) -> Result<Vec<Product>> {
    let mut query = format!("SELECT {} FROM products WHERE 1=1", PRODUCT_COLUMNS);
    let mut params: Vec<(&str, &dyn ToSql)> = Vec::new();

    let category = filter.category_criterion();
    if let Some(ref category) = category {
        query.push_str(" AND casefold(category) = casefold(:category)");
        params.push((":category", category));
    }

    if let Some(ref min_price) = filter.min_price {
        query.push_str(" AND price >= :min_price");
        params.push((":min_price", min_price));
    }

    if let Some(ref max_price) = filter.max_price {
        query.push_str(" AND price <= :max_price");
        params.push((":max_price", max_price));
    }

    match filter.in_stock {
        Some(true) => query.push_str(" AND quantity > 0"),
        Some(false) => query.push_str(" AND quantity = 0"),
        None => {}
    }

    // instr() rather than LIKE: literal matching, no wildcard escaping
    let search = filter.search_criterion();
    if let Some(ref term) = search {
        query.push_str(
            " AND (instr(casefold(title), casefold(:search)) > 0 \
             OR instr(casefold(description), casefold(:search)) > 0)",
        );
        params.push((":search", term));
    }

    query.push_str(" ORDER BY ");
    match filter.sort_by {
        SortField::CreatedAt => query.push_str("created_at"),
        SortField::Price => query.push_str("price"),
        SortField::Title => query.push_str("casefold(title)"),
        SortField::Quantity => query.push_str("quantity"),
    }
    match filter.sort_order {
        SortOrder::Asc => query.push_str(" ASC"),
        SortOrder::Desc => query.push_str(" DESC"),
    }
    query.push_str(", rowid ASC");

    let mut stmt = conn
        .prepare(&query)
        .map_err(|e| Error::database(e.to_string()))?;

    let products = stmt
        .query_map(&*params, parse_product_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(products)
}
