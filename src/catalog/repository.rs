//! Product storage backends.
//!
//! [`ProductRepository`] is the seam between the catalog service and
//! persistence. [`SqliteRepository`] is the production backend;
//! [`MemoryRepository`] keeps products in a process-local list.

use std::cmp::Ordering;

use parking_lot::RwLock;
use rusqlite::TransactionBehavior;
use storefront_common::{Error, ProductId, Result, SortField, SortOrder};
use storefront_db::models::{NewProduct, Product, ProductFilter, ProductPatch};
use storefront_db::pool::{get_conn, DbPool};
use storefront_db::queries::products;

/// A product before and after an update.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductUpdate {
    pub previous: Product,
    pub current: Product,
}

/// Product persistence.
pub trait ProductRepository: Send + Sync {
    /// Store a new product and return it with its assigned ID.
    fn create(&self, new: NewProduct) -> Result<Product>;

    /// Store a complete product record as-is (used by imports).
    fn insert(&self, product: Product) -> Result<()>;

    fn get(&self, id: ProductId) -> Result<Option<Product>>;

    /// Apply a partial update atomically. `None` if the product does not exist.
    ///
    /// `previous` is the record as it was replaced, not an earlier read.
    fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Option<ProductUpdate>>;

    /// Remove a product and return it. `None` if it did not exist.
    fn delete(&self, id: ProductId) -> Result<Option<Product>>;

    /// Products matching `filter`, in the filter's order.
    fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>>;
}

/// SQLite-backed repository.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ProductRepository for SqliteRepository {
    fn create(&self, new: NewProduct) -> Result<Product> {
        let conn = get_conn(&self.pool)?;
        products::create_product(&conn, new)
    }

    fn insert(&self, product: Product) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        products::insert_product(&conn, &product)
    }

    fn get(&self, id: ProductId) -> Result<Option<Product>> {
        let conn = get_conn(&self.pool)?;
        products::get_product(&conn, id)
    }

    fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Option<ProductUpdate>> {
        let mut conn = get_conn(&self.pool)?;
        // Write lock up front so concurrent updates cannot read the same record
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| Error::database(e.to_string()))?;
        let Some(previous) = products::get_product(&tx, id)? else {
            return Ok(None);
        };
        let Some(current) = products::update_product(&tx, id, &patch)? else {
            return Ok(None);
        };
        tx.commit().map_err(|e| Error::database(e.to_string()))?;
        Ok(Some(ProductUpdate { previous, current }))
    }

    fn delete(&self, id: ProductId) -> Result<Option<Product>> {
        let mut conn = get_conn(&self.pool)?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::database(e.to_string()))?;
        let Some(product) = products::get_product(&tx, id)? else {
            return Ok(None);
        };
        products::delete_product(&tx, id)?;
        tx.commit().map_err(|e| Error::database(e.to_string()))?;
        Ok(Some(product))
    }

    fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let conn = get_conn(&self.pool)?;
        products::list_products(&conn, filter)
    }
}

/// In-memory repository; contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryRepository {
    products: RwLock<Vec<Product>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProductRepository for MemoryRepository {
    fn create(&self, new: NewProduct) -> Result<Product> {
        let product = Product::from_new(new);
        self.products.write().push(product.clone());
        Ok(product)
    }

    fn insert(&self, product: Product) -> Result<()> {
        let mut products = self.products.write();
        if products.iter().any(|p| p.id == product.id) {
            return Err(Error::invalid_input(format!(
                "Product {} already exists",
                product.id
            )));
        }
        products.push(product);
        Ok(())
    }

    fn get(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().iter().find(|p| p.id == id).cloned())
    }

    fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Option<ProductUpdate>> {
        let mut products = self.products.write();
        let Some(product) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        let previous = product.clone();
        product.apply(patch);
        Ok(Some(ProductUpdate {
            previous,
            current: product.clone(),
        }))
    }

    fn delete(&self, id: ProductId) -> Result<Option<Product>> {
        let mut products = self.products.write();
        Ok(products
            .iter()
            .position(|p| p.id == id)
            .map(|idx| products.remove(idx)))
    }

    fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let mut matched: Vec<Product> = self
            .products
            .read()
            .iter()
            .filter(|p| p.matches(filter))
            .cloned()
            .collect();

        // Stable: ties keep insertion order, like the rowid tiebreak in SQL
        matched.sort_by(|a, b| {
            let ord = compare(a, b, filter.sort_by);
            match filter.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        Ok(matched)
    }
}

fn compare(a: &Product, b: &Product, field: SortField) -> Ordering {
    match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::Price => a.price.total_cmp(&b.price),
        SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortField::Quantity => a.quantity.cmp(&b.quantity),
    }
}
