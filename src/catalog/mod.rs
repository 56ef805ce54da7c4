//! Parts catalog - the internal source of truth for component costs and origin
//!
//! The catalog stores one row per part, keyed by SKU, plus the mapping table
//! that ties vendor pricing line items to catalog SKUs. Engines only read it
//! through the [`PartCatalog`] trait; writes happen via ingestion and the
//! mapping commands.

pub mod ingest;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use ingest::{ImportOptions, ImportOutcome, ImportStats, Importer};
pub use store::SqliteCatalog;

/// Country-of-origin flag carried on every part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OriginCountry {
    Us,
    Nonus,
    #[default]
    Unknown,
}

impl fmt::Display for OriginCountry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginCountry::Us => write!(f, "US"),
            OriginCountry::Nonus => write!(f, "NONUS"),
            OriginCountry::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl FromStr for OriginCountry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "US" => Ok(OriginCountry::Us),
            "NONUS" | "NON-US" => Ok(OriginCountry::Nonus),
            "UNKNOWN" => Ok(OriginCountry::Unknown),
            _ => Err(format!("unknown origin country: {}", s)),
        }
    }
}

/// A catalog part. `sku` is the only stable join key; `name` is informational.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    /// Unique part identity
    pub sku: String,

    /// Display name
    pub name: String,

    /// Manufacturer / brand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    /// Part category (module, inverter, racking, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Internal unit price; None when unknown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,

    /// Country of origin
    #[serde(default)]
    pub origin_country: OriginCountry,

    /// Tri-state domesticity: `Some(true)` domestic, `Some(false)`
    /// non-domestic, `None` when the source data never said
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_domestic: Option<bool>,

    /// Unit weight, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,

    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Part {
    /// Minimal constructor used by tests and ingestion defaults
    pub fn new(sku: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            name: name.into(),
            manufacturer: None,
            category: None,
            unit_price: None,
            origin_country: OriginCountry::Unknown,
            is_domestic: None,
            weight: None,
            notes: None,
        }
    }
}

/// One row of the mapping table: ties a vendor line item's free-text identity
/// to a catalog SKU. The lookup key is unique; several keys may point at the
/// same SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentMapping {
    /// Generated row id (ULID)
    pub id: String,

    /// Vendor-side component name, as quoted
    pub external_name: String,

    /// Vendor-side manufacturer name
    pub manufacturer: String,

    /// Catalog SKU this identity resolves to
    pub part_sku: String,

    /// Row creation time
    pub created_at: DateTime<Utc>,
}

impl ComponentMapping {
    /// The normalized lookup key for this mapping
    pub fn lookup_key(&self) -> String {
        mapping_key(&self.external_name, &self.manufacturer)
    }
}

/// Normalized mapping lookup key: both halves trimmed and lowercased,
/// joined with `|`. Matcher and store must agree on this exact form.
pub fn mapping_key(external_name: &str, manufacturer: &str) -> String {
    format!(
        "{}|{}",
        external_name.trim().to_lowercase(),
        manufacturer.trim().to_lowercase()
    )
}

/// One page of catalog search results
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub items: Vec<Part>,
}

/// Row counts for status output
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CatalogCounts {
    pub parts: u64,
    pub domestic: u64,
    pub non_domestic: u64,
    pub unknown: u64,
    pub mappings: u64,
}

/// Read interface the engines consume. Implemented by [`SqliteCatalog`];
/// tests substitute in-memory fakes.
pub trait PartCatalog {
    /// Point lookup by SKU
    fn find_by_sku(&self, sku: &str) -> Result<Option<Part>, CatalogError>;

    /// First part whose sku or name contains `needle`, case-insensitive,
    /// in ascending-sku order. Used by the matcher's fuzzy fallback.
    fn find_by_name_or_sku_contains(&self, needle: &str) -> Result<Option<Part>, CatalogError>;

    /// The full mapping table
    fn all_mappings(&self) -> Result<Vec<ComponentMapping>, CatalogError>;
}

/// Errors from catalog storage
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("catalog IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog schema version {found} is newer than this build supports ({supported}); upgrade sst")]
    SchemaTooNew { found: i32, supported: i32 },

    #[error("a mapping for '{external_name}' / '{manufacturer}' already exists")]
    DuplicateMapping {
        external_name: String,
        manufacturer: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_key_normalizes() {
        assert_eq!(mapping_key("  Q.PEAK DUO ", "Qcells"), "q.peak duo|qcells");
        assert_eq!(mapping_key("A", "B"), mapping_key("a ", " b"));
    }

    #[test]
    fn test_origin_country_round_trip() {
        for origin in [
            OriginCountry::Us,
            OriginCountry::Nonus,
            OriginCountry::Unknown,
        ] {
            let s = origin.to_string();
            assert_eq!(s.parse::<OriginCountry>().unwrap(), origin);
        }
        assert!("MARS".parse::<OriginCountry>().is_err());
    }

    #[test]
    fn test_origin_country_serde_matches_display() {
        let json = serde_json::to_string(&OriginCountry::Nonus).unwrap();
        assert_eq!(json, "\"NONUS\"");
        let parsed: OriginCountry = serde_json::from_str("\"UNKNOWN\"").unwrap();
        assert_eq!(parsed, OriginCountry::Unknown);
    }

    #[test]
    fn test_part_serializes_skipping_unknowns() {
        let part = Part::new("SKU-1", "Test Part");
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["sku"], "SKU-1");
        assert!(json.get("unit_price").is_none());
        assert!(json.get("manufacturer").is_none());
    }
}
