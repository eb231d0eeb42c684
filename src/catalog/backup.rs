//! JSON backups of the product catalog.
//!
//! The format is a JSON array of product objects as returned by the API
//! (`id`, `title`, `price`, `description`, `quantity`, `category`,
//! `image_url`, `images`, `created_at`). Older backups without `images` are
//! accepted; their `image_url` becomes a legacy reference set. Timestamps
//! without an offset are taken as UTC.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use storefront_common::{Error, ImageReferenceSet, ProductId, Result, SortField, SortOrder};
use storefront_db::models::{Product, ProductFilter};

use super::Catalog;

#[derive(Debug, Serialize, Deserialize)]
struct BackupRecord {
    #[serde(default)]
    id: Option<String>,
    title: String,
    price: f64,
    #[serde(default)]
    description: String,
    #[serde(default)]
    quantity: i64,
    category: String,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    images: Option<ImageReferenceSet>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl From<&Product> for BackupRecord {
    fn from(p: &Product) -> Self {
        Self {
            id: Some(p.id.to_string()),
            title: p.title.clone(),
            price: p.price,
            description: p.description.clone(),
            quantity: p.quantity,
            category: p.category.clone(),
            image_url: Some(p.images.main.clone()),
            images: Some(p.images.clone()),
            created_at: Some(p.created_at.to_rfc3339_opts(SecondsFormat::Micros, true)),
            updated_at: Some(p.updated_at.to_rfc3339_opts(SecondsFormat::Micros, true)),
        }
    }
}

/// Outcome of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    /// Records whose ID already exists in the catalog.
    pub skipped: usize,
}

impl Catalog {
    /// Serialize every product, oldest first.
    pub fn export_json(&self) -> Result<String> {
        let filter = ProductFilter {
            sort_by: SortField::CreatedAt,
            sort_order: SortOrder::Asc,
            ..ProductFilter::default()
        };
        let records: Vec<BackupRecord> = self
            .repository()
            .list(&filter)?
            .iter()
            .map(BackupRecord::from)
            .collect();
        serde_json::to_string_pretty(&records)
            .map_err(|e| Error::internal(format!("Failed to serialize backup: {}", e)))
    }

    /// Load products from a backup, skipping IDs that already exist.
    ///
    /// Every record is validated before anything is written.
    pub fn import_json(&self, json: &str) -> Result<ImportSummary> {
        let records: Vec<BackupRecord> = serde_json::from_str(json)
            .map_err(|e| Error::invalid_input(format!("Invalid backup file: {}", e)))?;

        let products = records
            .into_iter()
            .enumerate()
            .map(|(idx, record)| {
                into_product(record)
                    .map_err(|e| Error::invalid_input(format!("Record {}: {}", idx + 1, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut summary = ImportSummary::default();
        for product in products {
            if self.repository().get(product.id)?.is_some() {
                tracing::debug!("Skipping existing product {}", product.id);
                summary.skipped += 1;
                continue;
            }
            self.repository().insert(product)?;
            summary.imported += 1;
        }

        tracing::info!(
            "Imported {} product(s), skipped {}",
            summary.imported,
            summary.skipped
        );
        Ok(summary)
    }
}

fn into_product(record: BackupRecord) -> std::result::Result<Product, String> {
    if !(record.price.is_finite() && record.price > 0.0) {
        return Err("Price must be positive".to_string());
    }
    if record.quantity < 0 {
        return Err("Quantity cannot be negative".to_string());
    }

    let id = match record.id.as_deref() {
        Some(raw) => raw
            .parse::<ProductId>()
            .map_err(|e| format!("invalid id '{}': {}", raw, e))?,
        None => ProductId::new(),
    };
    let images = match (record.images, record.image_url) {
        (Some(images), _) => images,
        (None, Some(url)) => ImageReferenceSet::legacy(url),
        (None, None) => return Err("missing images".to_string()),
    };
    let created_at = match record.created_at.as_deref() {
        Some(raw) => parse_timestamp(raw)?,
        None => Utc::now(),
    };
    let updated_at = match record.updated_at.as_deref() {
        Some(raw) => parse_timestamp(raw)?,
        None => created_at,
    };

    Ok(Product {
        id,
        title: record.title,
        description: record.description,
        price: record.price,
        quantity: record.quantity,
        category: record.category,
        images,
        created_at,
        updated_at,
    })
}

fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryRepository;
    use crate::images::{ImagePipeline, ImageStore};
    use std::sync::Arc;
    use storefront_db::models::NewProduct;

    fn catalog() -> Catalog {
        Catalog::new(
            Arc::new(MemoryRepository::new()),
            Arc::new(ImagePipeline::new(ImageStore::new("/nonexistent", "/images"))),
        )
    }

    #[test]
    fn test_export_import_roundtrip() {
        let source = catalog();
        let created = source
            .repository()
            .create(NewProduct {
                title: "Coral Tee".to_string(),
                description: "Soft cotton".to_string(),
                price: 19.99,
                quantity: 4,
                category: "t-shirts".to_string(),
                images: ImageReferenceSet {
                    thumbnail: "/images/thumbnails/a.jpg".to_string(),
                    main: "/images/main/a.jpg".to_string(),
                    original: "/images/original/a.jpg".to_string(),
                },
            })
            .unwrap();

        let json = source.export_json().unwrap();
        assert!(json.contains("\"image_url\": \"/images/main/a.jpg\""));

        let target = catalog();
        let summary = target.import_json(&json).unwrap();
        assert_eq!(summary, ImportSummary { imported: 1, skipped: 0 });

        let restored = target.get_product(created.id).unwrap();
        assert_eq!(restored.title, created.title);
        assert_eq!(restored.images, created.images);
        assert_eq!(
            restored.created_at.timestamp_micros(),
            created.created_at.timestamp_micros()
        );

        // Importing again skips everything
        let summary = target.import_json(&json).unwrap();
        assert_eq!(summary, ImportSummary { imported: 0, skipped: 1 });
    }

    #[test]
    fn test_import_legacy_record() {
        let json = r#"[{
            "id": "1b4e28ba-2fa1-4d2e-9a6e-8c1c3e2f5a10",
            "title": "Striped Adventure Tee",
            "price": 19.99,
            "description": "Perfect for outdoor adventures",
            "quantity": 15,
            "category": "t-shirts",
            "image_url": "/images/striped.jpg",
            "created_at": "2024-05-01T12:34:56.123456"
        }]"#;

        let catalog = catalog();
        catalog.import_json(json).unwrap();
        let products = catalog.list_products().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(
            products[0].images,
            ImageReferenceSet::legacy("/images/striped.jpg")
        );
        assert_eq!(
            products[0].created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            "2024-05-01T12:34:56Z"
        );
    }

    #[test]
    fn test_import_rejects_invalid_records_atomically() {
        let json = r#"[
            {"title": "Good", "price": 5.0, "category": "mugs", "image_url": "/images/a.jpg"},
            {"title": "Bad", "price": -1.0, "category": "mugs", "image_url": "/images/b.jpg"}
        ]"#;

        let catalog = catalog();
        let err = catalog.import_json(json).unwrap_err();
        assert!(err.to_string().contains("Record 2"));
        assert!(catalog.list_products().unwrap().is_empty());
    }

    #[test]
    fn test_import_rejects_malformed_json() {
        let err = catalog().import_json("{not json").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
