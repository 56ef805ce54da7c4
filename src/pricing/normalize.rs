//! Payload normalization for vendor pricing JSON.
//!
//! Observed payload shapes:
//!   - line items at the root or nested one level under `pricing`
//!   - line-item arrays keyed `pricing_by_component`, `items`, or `modules`
//!   - quantities as JSON numbers or as numeric strings ("12")
//!
//! Anything unrecognized degrades to empty strings / None rather than
//! erroring; the comparison layer treats those as unmatched or unpriced.

use serde_json::Value;

use super::{DesignPricing, PricedComponentLine};

/// Keys tried, in order, for the line-item array.
const ITEM_KEYS: [&str; 3] = ["pricing_by_component", "items", "modules"];

/// Normalize a raw pricing payload into [`DesignPricing`].
pub fn normalize_payload(value: &Value) -> DesignPricing {
    // Some payload versions nest everything under a `pricing` object.
    let pricing = match value.get("pricing") {
        Some(inner) if inner.is_object() => inner,
        _ => value,
    };

    let items = ITEM_KEYS
        .iter()
        .find_map(|key| pricing.get(*key).and_then(Value::as_array))
        .map(|rows| rows.iter().map(normalize_line).collect())
        .unwrap_or_default();

    DesignPricing {
        design_id: string_at(pricing, "design_id").or_else(|| string_at(value, "design_id")),
        system_size_watts: number_at(pricing, "system_size_watts"),
        price_per_watt: number_at(pricing, "price_per_watt"),
        items,
    }
}

fn normalize_line(row: &Value) -> PricedComponentLine {
    PricedComponentLine {
        name: string_at(row, "name")
            .or_else(|| string_at(row, "component_name"))
            .unwrap_or_default(),
        manufacturer_name: string_at(row, "manufacturer_name")
            .or_else(|| string_at(row, "manufacturer"))
            .unwrap_or_default(),
        component_type: string_at(row, "component_type")
            .or_else(|| string_at(row, "type"))
            .unwrap_or_default(),
        quantity: quantity_at(row, "quantity"),
    }
}

fn string_at(value: &Value, key: &str) -> Option<String> {
    value.get(key)?.as_str().map(str::to_string)
}

/// Numbers arrive as JSON numbers or numeric strings depending on the
/// payload version.
fn number_at(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn quantity_at(value: &Value, key: &str) -> Option<u32> {
    match value.get(key)? {
        Value::Number(n) => {
            if let Some(i) = n.as_u64() {
                u32::try_from(i).ok()
            } else {
                // Tolerate 12.0-style floats but not fractional counts.
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64)
                    .map(|f| f as u32)
            }
        }
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}
