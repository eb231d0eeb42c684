//! Core type definitions for the product catalog.
//!
//! Sort options are parsed leniently from query strings: unknown sort fields
//! fall back to creation time, and any order other than `desc` sorts
//! ascending.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Field used to order product listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Creation timestamp.
    #[default]
    CreatedAt,
    /// Unit price.
    Price,
    /// Title, compared case-insensitively.
    Title,
    /// Stock quantity.
    Quantity,
}

impl SortField {
    /// Parse a sort field, falling back to `CreatedAt` for unknown values.
    pub fn parse_lenient(s: &str) -> Self {
        match s {
            "price" => Self::Price,
            "title" => Self::Title,
            "quantity" => Self::Quantity,
            _ => Self::CreatedAt,
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreatedAt => write!(f, "created_at"),
            Self::Price => write!(f, "price"),
            Self::Title => write!(f, "title"),
            Self::Quantity => write!(f, "quantity"),
        }
    }
}

/// Direction of a product listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first.
    Asc,
    /// Largest first.
    #[default]
    Desc,
}

impl SortOrder {
    /// Parse a sort order; only `desc` (any case) sorts descending.
    pub fn parse_lenient(s: &str) -> Self {
        if s.eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

/// Locations of the three derivative images of one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReferenceSet {
    /// 200x200 square thumbnail.
    pub thumbnail: String,
    /// Main product image, fit within 600x400.
    pub main: String,
    /// Zoom image, fit within 800x600.
    pub original: String,
}

impl ImageReferenceSet {
    /// Reference set for a product stored before multi-size images existed.
    ///
    /// All three sizes point at the same flat file.
    pub fn legacy(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            thumbnail: url.clone(),
            main: url.clone(),
            original: url,
        }
    }

    /// Iterate over the three locations (thumbnail, main, original).
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        [
            self.thumbnail.as_str(),
            self.main.as_str(),
            self.original.as_str(),
        ]
        .into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_field_lenient_parse() {
        assert_eq!(SortField::parse_lenient("price"), SortField::Price);
        assert_eq!(SortField::parse_lenient("title"), SortField::Title);
        assert_eq!(SortField::parse_lenient("quantity"), SortField::Quantity);
        assert_eq!(SortField::parse_lenient("created_at"), SortField::CreatedAt);
        assert_eq!(SortField::parse_lenient("bogus"), SortField::CreatedAt);
    }

    #[test]
    fn test_sort_order_lenient_parse() {
        assert_eq!(SortOrder::parse_lenient("desc"), SortOrder::Desc);
        assert_eq!(SortOrder::parse_lenient("DESC"), SortOrder::Desc);
        assert_eq!(SortOrder::parse_lenient("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::parse_lenient("sideways"), SortOrder::Asc);
    }

    #[test]
    fn test_sort_display_matches_serde() {
        let json = serde_json::to_string(&SortField::CreatedAt).unwrap();
        assert_eq!(json, format!("\"{}\"", SortField::CreatedAt));
        let json = serde_json::to_string(&SortOrder::Desc).unwrap();
        assert_eq!(json, format!("\"{}\"", SortOrder::Desc));
    }

    #[test]
    fn test_legacy_reference_set() {
        let set = ImageReferenceSet::legacy("/images/old.jpg");
        assert!(set.iter().all(|url| url == "/images/old.jpg"));
        assert_eq!(set.iter().count(), 3);
    }
}
