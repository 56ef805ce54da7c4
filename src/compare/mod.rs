//! Pricing comparison - vendor quote against the internal catalog
//!
//! The aggregator walks normalized vendor lines in input order, resolves
//! each against the catalog, prices what it can, and rolls up domestic,
//! non-domestic, and unknown subtotals. A line missing its price or
//! quantity stays visible in the output but adds nothing to any bucket;
//! the summary's unpriced count makes that gap explicit instead of letting
//! it hide inside a low total.

pub mod matcher;

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogError, OriginCountry, Part, PartCatalog};
use crate::pricing::{DesignPricing, PricedComponentLine};

pub use matcher::ComponentMatcher;

/// One comparison row: the vendor's quote joined with our catalog data.
/// Catalog-side fields are None for unmatched lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonLineItem {
    pub name: String,
    pub manufacturer: String,
    #[serde(rename = "type")]
    pub component_type: String,
    pub quantity: Option<u32>,
    pub matched_sku: Option<String>,
    pub unit_price: Option<f64>,
    pub is_domestic: Option<bool>,
    pub origin_country: Option<OriginCountry>,
    /// `unit_price * quantity` when both are known, else None
    pub line_total: Option<f64>,
}

/// Bucket subtotals over priced lines. Lines with a None line total are
/// counted, not summed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub domestic_total: f64,
    pub non_domestic_total: f64,
    pub unknown_total: f64,
    pub unpriced_count: u32,
}

/// Full comparison output for one design
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_size_watts: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_watt: Option<f64>,
    pub items: Vec<ComparisonLineItem>,
    pub summary: ComparisonSummary,
}

impl ComparisonReport {
    /// Matched line count, for status output
    pub fn matched_count(&self) -> usize {
        self.items.iter().filter(|i| i.matched_sku.is_some()).count()
    }
}

/// Run the full comparison for one design's pricing payload.
///
/// Output items mirror input row order. A failed catalog read for one row
/// leaves that row unmatched rather than aborting the run; only the initial
/// bulk mapping read can fail the whole comparison.
pub fn run_comparison<C: PartCatalog>(
    catalog: &C,
    pricing: &DesignPricing,
) -> Result<ComparisonReport, CatalogError> {
    let matcher = ComponentMatcher::new(catalog)?;

    let items: Vec<ComparisonLineItem> = pricing
        .items
        .iter()
        .map(|line| {
            let part = matcher
                .match_component(&line.name, &line.manufacturer_name)
                .ok()
                .flatten();
            line_item(line, part)
        })
        .collect();

    let summary = summarize(&items);

    Ok(ComparisonReport {
        design_id: pricing.design_id.clone(),
        system_size_watts: pricing.system_size_watts,
        price_per_watt: pricing.price_per_watt,
        items,
        summary,
    })
}

fn line_item(line: &PricedComponentLine, part: Option<Part>) -> ComparisonLineItem {
    let (matched_sku, unit_price, is_domestic, origin_country) = match part {
        Some(p) => (
            Some(p.sku),
            p.unit_price,
            p.is_domestic,
            Some(p.origin_country),
        ),
        None => (None, None, None, None),
    };

    let line_total = match (unit_price, line.quantity) {
        (Some(price), Some(qty)) => Some(price * qty as f64),
        _ => None,
    };

    ComparisonLineItem {
        name: line.name.clone(),
        manufacturer: line.manufacturer_name.clone(),
        component_type: line.component_type.clone(),
        quantity: line.quantity,
        matched_sku,
        unit_price,
        is_domestic,
        origin_country,
        line_total,
    }
}

fn summarize(items: &[ComparisonLineItem]) -> ComparisonSummary {
    let mut summary = ComparisonSummary::default();
    for item in items {
        match (item.is_domestic, item.line_total) {
            (Some(true), Some(total)) => summary.domestic_total += total,
            (Some(false), Some(total)) => summary.non_domestic_total += total,
            (None, Some(total)) => summary.unknown_total += total,
            (_, None) => summary.unpriced_count += 1,
        }
    }
    summary
}
