//! Design pricing source - vendor-quoted component line items
//!
//! The vendor's pricing API responses vary in shape across versions. This
//! module owns the one normalization boundary: whatever arrives, the rest of
//! the system only ever sees [`DesignPricing`] with fixed-field
//! [`PricedComponentLine`]s. The file-backed source reads payloads saved
//! under the workspace `pricing/` directory; the engines never know where a
//! payload came from.

pub mod normalize;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use normalize::normalize_payload;

/// One vendor-quoted component line, post-normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedComponentLine {
    /// Vendor-side component name ("" when absent)
    #[serde(default)]
    pub name: String,

    /// Vendor-side manufacturer name ("" when absent)
    #[serde(default)]
    pub manufacturer_name: String,

    /// Vendor-side component type ("" when absent)
    #[serde(default)]
    pub component_type: String,

    /// Quoted quantity; None when the payload omitted it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

/// A design's normalized pricing payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignPricing {
    /// Vendor design identifier, when the payload carried one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_id: Option<String>,

    /// System size in watts, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_size_watts: Option<f64>,

    /// Price per watt, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_watt: Option<f64>,

    /// Component line items, in payload order
    #[serde(default)]
    pub items: Vec<PricedComponentLine>,
}

/// Where pricing payloads come from. The comparison command works against
/// this seam; tests substitute literal payloads.
pub trait PricingSource {
    fn pricing(&self, design: &str) -> Result<DesignPricing, PricingError>;
}

/// Errors from pricing retrieval
#[derive(Debug, Error)]
pub enum PricingError {
    #[error("no pricing payload found for '{design}' (looked for {looked_for})")]
    NotFound { design: String, looked_for: String },

    #[error("cannot read pricing payload {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("pricing payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reads pricing payloads saved as JSON files.
///
/// `design` resolves as a literal path first, then as
/// `<pricing_dir>/<design>.json`.
pub struct FilePricingSource {
    pricing_dir: PathBuf,
}

impl FilePricingSource {
    pub fn new(pricing_dir: impl Into<PathBuf>) -> Self {
        Self {
            pricing_dir: pricing_dir.into(),
        }
    }

    fn resolve(&self, design: &str) -> Result<PathBuf, PricingError> {
        let literal = Path::new(design);
        if literal.is_file() {
            return Ok(literal.to_path_buf());
        }
        let named = self.pricing_dir.join(format!("{}.json", design));
        if named.is_file() {
            return Ok(named);
        }
        Err(PricingError::NotFound {
            design: design.to_string(),
            looked_for: format!("{} or {}", literal.display(), named.display()),
        })
    }
}

impl PricingSource for FilePricingSource {
    fn pricing(&self, design: &str) -> Result<DesignPricing, PricingError> {
        let path = self.resolve(design)?;
        let raw = std::fs::read_to_string(&path).map_err(|e| PricingError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        Ok(normalize_payload(&value))
    }
}
