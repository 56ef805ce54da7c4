//! Vendor line identity resolution.
//!
//! Resolution runs in strict priority order; the first hit wins:
//!   1. exact mapping lookup on the normalized `name|manufacturer` key
//!   2. substring search over catalog sku and name, case-insensitive
//!   3. no match (legitimate for new or unlisted components)
//!
//! A mapping whose SKU no longer exists in the parts table is treated as
//! absent and the line falls through to the substring search, so a stale
//! mapping table degrades results instead of blocking them.

use std::collections::HashMap;

use crate::catalog::{mapping_key, CatalogError, Part, PartCatalog};

pub struct ComponentMatcher<'a, C: PartCatalog> {
    catalog: &'a C,
    mappings: HashMap<String, String>,
}

impl<'a, C: PartCatalog> ComponentMatcher<'a, C> {
    /// Loads the mapping table once; individual matches never rescan it.
    pub fn new(catalog: &'a C) -> Result<Self, CatalogError> {
        let mappings = catalog
            .all_mappings()?
            .into_iter()
            .map(|m| (m.lookup_key(), m.part_sku))
            .collect();
        Ok(Self { catalog, mappings })
    }

    /// Resolve one vendor line identity to a catalog part, or None.
    pub fn match_component(
        &self,
        name: &str,
        manufacturer: &str,
    ) -> Result<Option<Part>, CatalogError> {
        if let Some(sku) = self.mappings.get(&mapping_key(name, manufacturer)) {
            if let Some(part) = self.catalog.find_by_sku(sku)? {
                return Ok(Some(part));
            }
            // Dangling mapping: fall through to the substring search.
        }

        if !name.trim().is_empty() {
            return self.catalog.find_by_name_or_sku_contains(name);
        }

        Ok(None)
    }
}
