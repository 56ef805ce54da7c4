//! CSV ingestion into the parts catalog
//!
//! One row per part. Rows are upserted by SKU, last write wins, which is
//! also how a duplicated SKU inside a single file resolves. Unusable rows
//! are skipped and reported, never fatal. The source file's SHA-256 is
//! recorded so re-ingesting identical bytes is a no-op unless forced.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::Utc;
use csv::{ReaderBuilder, StringRecord};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::{CatalogError, OriginCountry, Part, PartCatalog, SqliteCatalog};

/// Meta keys recording ingestion provenance
pub const META_LAST_IMPORT_HASH: &str = "last_import_hash";
pub const META_LAST_IMPORT_AT: &str = "last_import_at";
pub const META_LAST_IMPORT_FILE: &str = "last_import_file";

/// Options for a single import run
#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    /// Validate and report without writing
    pub dry_run: bool,
    /// Field delimiter
    pub delimiter: u8,
    /// Re-import even when the file hash matches the last import
    pub force: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            delimiter: b',',
            force: false,
        }
    }
}

/// A row that could not be imported, and why
#[derive(Debug, Clone)]
pub struct SkippedRow {
    /// 1-based row number counting the header (data starts at 2)
    pub row: usize,
    pub reason: String,
}

/// Import statistics
#[derive(Debug, Default)]
pub struct ImportStats {
    pub rows_processed: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: Vec<SkippedRow>,
}

impl ImportStats {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Result of an import run
#[derive(Debug)]
pub enum ImportOutcome {
    Imported(ImportStats),
    /// File content matches the last import; nothing was done
    SourceUnchanged { hash: String },
}

/// Errors from ingestion
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV header error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV file has no '{0}' column (aliases: {1})")]
    MissingColumn(&'static str, String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Column aliases, checked in order. Header names are normalized to
/// lowercase with spaces and dashes folded to underscores first.
const SKU_ALIASES: &[&str] = &["sku", "part_sku", "part_number"];
const NAME_ALIASES: &[&str] = &["name", "part_name", "description"];
const BRAND_ALIASES: &[&str] = &["brand", "manufacturer", "mfg"];
const CATEGORY_ALIASES: &[&str] = &["type", "part_type", "category"];
const PRICE_ALIASES: &[&str] = &["price", "unit_price", "cost", "curtis_price"];
const DOMESTIC_ALIASES: &[&str] = &["domestic", "domestic_status", "origin"];
const WEIGHT_ALIASES: &[&str] = &["weight", "weight_lbs"];
const NOTES_ALIASES: &[&str] = &["notes", "note", "source"];

/// Canonical template headers for `sst ingest --template`
pub const CSV_HEADERS: &[&str] = &[
    "sku", "name", "brand", "type", "price", "domestic", "weight", "notes",
];

/// A starter CSV with example rows for ingestion
pub fn template_csv() -> String {
    let mut out = String::new();
    out.push_str(&CSV_HEADERS.join(","));
    out.push('\n');
    out.push_str("PVL-450,Q.PEAK DUO XL 450W,Qcells,module,210.00,D,52.9,dalton warehouse\n");
    out.push_str("INV-7600,IQ8 Microinverter,Enphase,inverter,179.00,ND,2.4,\n");
    out.push_str("RAIL-168,XR100 Rail 168in,IronRidge,racking,48.50,yes,14.1,\n");
    out
}

/// Imports parts CSVs into a catalog
pub struct Importer<'a> {
    catalog: &'a SqliteCatalog,
}

impl<'a> Importer<'a> {
    pub fn new(catalog: &'a SqliteCatalog) -> Self {
        Self { catalog }
    }

    /// Import one CSV file
    pub fn import_file(
        &self,
        path: &Path,
        opts: &ImportOptions,
    ) -> Result<ImportOutcome, IngestError> {
        let bytes = fs::read(path).map_err(|e| IngestError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        self.import_bytes(&path.display().to_string(), &bytes, opts)
    }

    /// Import CSV bytes. `label` is recorded as the source file name.
    pub fn import_bytes(
        &self,
        label: &str,
        bytes: &[u8],
        opts: &ImportOptions,
    ) -> Result<ImportOutcome, IngestError> {
        let hash = format!("{:x}", Sha256::digest(bytes));
        if !opts.force {
            if let Some(last) = self.catalog.get_meta(META_LAST_IMPORT_HASH)? {
                if last == hash {
                    return Ok(ImportOutcome::SourceUnchanged { hash });
                }
            }
        }

        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .delimiter(opts.delimiter)
            .from_reader(bytes);

        let headers = rdr.headers()?.clone();
        let header_map = build_header_map(&headers);
        if resolve_column(&header_map, SKU_ALIASES).is_none() {
            return Err(IngestError::MissingColumn("sku", SKU_ALIASES.join(", ")));
        }

        let mut stats = ImportStats::default();

        for (row_idx, result) in rdr.records().enumerate() {
            let row_num = row_idx + 2;
            stats.rows_processed += 1;

            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    stats.skipped.push(SkippedRow {
                        row: row_num,
                        reason: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            let part = match row_to_part(&record, &header_map) {
                Ok(p) => p,
                Err(reason) => {
                    stats.skipped.push(SkippedRow {
                        row: row_num,
                        reason,
                    });
                    continue;
                }
            };

            if opts.dry_run {
                if self.catalog.find_by_sku(&part.sku)?.is_some() {
                    stats.updated += 1;
                } else {
                    stats.created += 1;
                }
            } else if self.catalog.upsert_part(&part)? {
                stats.created += 1;
            } else {
                stats.updated += 1;
            }
        }

        if !opts.dry_run {
            self.catalog.set_meta(META_LAST_IMPORT_HASH, &hash)?;
            self.catalog
                .set_meta(META_LAST_IMPORT_AT, &Utc::now().to_rfc3339())?;
            self.catalog.set_meta(META_LAST_IMPORT_FILE, label)?;
        }

        Ok(ImportOutcome::Imported(stats))
    }
}

/// Derive a catalog part from one CSV row
fn row_to_part(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
) -> Result<Part, String> {
    let sku = get_field(record, header_map, SKU_ALIASES)
        .ok_or_else(|| "missing required field 'sku'".to_string())?;

    let brand = get_field(record, header_map, BRAND_ALIASES);
    let category = get_field(record, header_map, CATEGORY_ALIASES);

    // Name falls back to "brand category", then to the sku itself
    let name = get_field(record, header_map, NAME_ALIASES).unwrap_or_else(|| {
        let joined = [brand.as_deref(), category.as_deref()]
            .iter()
            .flatten()
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        if joined.is_empty() {
            sku.clone()
        } else {
            joined
        }
    });

    let unit_price = get_field(record, header_map, PRICE_ALIASES)
        .as_deref()
        .and_then(parse_price);
    let domestic = get_field(record, header_map, DOMESTIC_ALIASES)
        .as_deref()
        .and_then(parse_domestic);
    let weight = get_field(record, header_map, WEIGHT_ALIASES).and_then(|s| s.parse().ok());
    let notes = get_field(record, header_map, NOTES_ALIASES);

    let origin_country = match domestic {
        Some(true) => OriginCountry::Us,
        Some(false) => OriginCountry::Nonus,
        None => OriginCountry::Unknown,
    };

    Ok(Part {
        sku,
        name,
        manufacturer: brand,
        category,
        unit_price,
        origin_country,
        is_domestic: domestic,
        weight,
        notes,
    })
}

/// Normalize a header name: lowercase, spaces and dashes to underscores
fn normalize_header(h: &str) -> String {
    h.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Build a map from normalized header name to column index
fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (normalize_header(h), i))
        .collect()
}

fn resolve_column(header_map: &HashMap<String, usize>, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|a| header_map.get(*a).copied())
}

/// Get a non-empty field value by alias list
fn get_field(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    aliases: &[&str],
) -> Option<String> {
    resolve_column(header_map, aliases)
        .and_then(|idx| record.get(idx))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse a price, tolerating currency symbols and thousands separators:
/// every character outside [0-9.-] is dropped before parsing.
fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a domestic flag into a tri-state
fn parse_domestic(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "d" | "domestic" | "yes" | "y" | "us" | "usa" | "true" | "t" => Some(true),
        "nd" | "non-domestic" | "non domestic" | "no" | "n" | "false" | "f" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, SqliteCatalog) {
        let tmp = tempdir().unwrap();
        let catalog = SqliteCatalog::open(&tmp.path().join("catalog.db")).unwrap();
        (tmp, catalog)
    }

    fn write_csv(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_parse_price_tolerates_symbols() {
        assert_eq!(parse_price("$1,234.50"), Some(1234.5));
        assert_eq!(parse_price("210"), Some(210.0));
        assert_eq!(parse_price("-3.5"), Some(-3.5));
        assert_eq!(parse_price("TBD"), None);
        assert_eq!(parse_price(""), None);
    }

    #[test]
    fn test_parse_domestic_token_sets() {
        for token in ["D", "domestic", "YES", "y", "US", "usa", "true", "T"] {
            assert_eq!(parse_domestic(token), Some(true), "token {}", token);
        }
        for token in ["ND", "non-domestic", "Non Domestic", "no", "N", "false", "f"] {
            assert_eq!(parse_domestic(token), Some(false), "token {}", token);
        }
        assert_eq!(parse_domestic("maybe"), None);
        assert_eq!(parse_domestic(""), None);
    }

    #[test]
    fn test_import_derives_fields() {
        let (tmp, catalog) = setup();
        let csv = "sku,name,brand,type,price,domestic,weight,notes\n\
                   PVL-450,Q.PEAK DUO,Qcells,module,$210.00,D,52.9,dalton\n\
                   INV-7600,,Enphase,inverter,179,ND,,\n\
                   MYSTERY,,,,,,,\n";
        let path = write_csv(tmp.path(), "parts.csv", csv);

        let outcome = Importer::new(&catalog)
            .import_file(&path, &ImportOptions::default())
            .unwrap();
        let stats = match outcome {
            ImportOutcome::Imported(s) => s,
            _ => panic!("expected import"),
        };
        assert_eq!(stats.created, 3);
        assert_eq!(stats.updated, 0);
        assert_eq!(stats.skipped_count(), 0);

        let pvl = catalog.find_by_sku("PVL-450").unwrap().unwrap();
        assert_eq!(pvl.unit_price, Some(210.0));
        assert_eq!(pvl.origin_country, OriginCountry::Us);
        assert_eq!(pvl.is_domestic, Some(true));
        assert_eq!(pvl.weight, Some(52.9));

        // No name column value: falls back to "brand type"
        let inv = catalog.find_by_sku("INV-7600").unwrap().unwrap();
        assert_eq!(inv.name, "Enphase inverter");
        assert_eq!(inv.origin_country, OriginCountry::Nonus);
        assert_eq!(inv.is_domestic, Some(false));

        // Nothing but a sku: name falls back to the sku, origin unknown
        let myst = catalog.find_by_sku("MYSTERY").unwrap().unwrap();
        assert_eq!(myst.name, "MYSTERY");
        assert_eq!(myst.origin_country, OriginCountry::Unknown);
        assert_eq!(myst.is_domestic, None);
        assert_eq!(myst.unit_price, None);
    }

    #[test]
    fn test_import_header_aliases() {
        let (tmp, catalog) = setup();
        let csv = "Part Number,Part Type,Manufacturer,Curtis Price,Domestic Status\n\
                   CC-200,clamp,Unirac,2.50,yes\n";
        let path = write_csv(tmp.path(), "alias.csv", csv);

        Importer::new(&catalog)
            .import_file(&path, &ImportOptions::default())
            .unwrap();

        let part = catalog.find_by_sku("CC-200").unwrap().unwrap();
        assert_eq!(part.unit_price, Some(2.5));
        assert_eq!(part.manufacturer.as_deref(), Some("Unirac"));
        assert_eq!(part.name, "Unirac clamp");
        assert_eq!(part.is_domestic, Some(true));
    }

    #[test]
    fn test_import_skips_rows_without_sku() {
        let (tmp, catalog) = setup();
        let csv = "sku,name\n,No Sku Here\nOK-1,Fine\n";
        let path = write_csv(tmp.path(), "parts.csv", csv);

        let outcome = Importer::new(&catalog)
            .import_file(&path, &ImportOptions::default())
            .unwrap();
        let stats = match outcome {
            ImportOutcome::Imported(s) => s,
            _ => panic!("expected import"),
        };
        assert_eq!(stats.created, 1);
        assert_eq!(stats.skipped_count(), 1);
        assert_eq!(stats.skipped[0].row, 2);
        assert!(stats.skipped[0].reason.contains("sku"));
    }

    #[test]
    fn test_import_missing_sku_column_is_an_error() {
        let (tmp, catalog) = setup();
        let path = write_csv(tmp.path(), "parts.csv", "name,price\nWidget,1.00\n");

        let err = Importer::new(&catalog)
            .import_file(&path, &ImportOptions::default())
            .unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn("sku", _)));
    }

    #[test]
    fn test_duplicate_sku_in_file_last_write_wins() {
        let (tmp, catalog) = setup();
        let csv = "sku,name,price\n\
                   CCLAMPD1-US,Unirac Domestic - Mids,2.10\n\
                   CCLAMPD1-US,Unirac Domestic - Ends,2.35\n";
        let path = write_csv(tmp.path(), "parts.csv", csv);

        let outcome = Importer::new(&catalog)
            .import_file(&path, &ImportOptions::default())
            .unwrap();
        let stats = match outcome {
            ImportOutcome::Imported(s) => s,
            _ => panic!("expected import"),
        };
        assert_eq!(stats.created, 1);
        assert_eq!(stats.updated, 1);

        let part = catalog.find_by_sku("CCLAMPD1-US").unwrap().unwrap();
        assert_eq!(part.name, "Unirac Domestic - Ends");
        assert_eq!(part.unit_price, Some(2.35));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let (tmp, catalog) = setup();
        let path = write_csv(tmp.path(), "parts.csv", "sku,name\nDRY-1,Dry Part\n");

        let opts = ImportOptions {
            dry_run: true,
            ..ImportOptions::default()
        };
        let outcome = Importer::new(&catalog).import_file(&path, &opts).unwrap();
        let stats = match outcome {
            ImportOutcome::Imported(s) => s,
            _ => panic!("expected import"),
        };
        assert_eq!(stats.created, 1);
        assert!(catalog.find_by_sku("DRY-1").unwrap().is_none());
        assert!(catalog.get_meta(META_LAST_IMPORT_HASH).unwrap().is_none());
    }

    #[test]
    fn test_reimport_of_identical_bytes_is_skipped() {
        let (tmp, catalog) = setup();
        let path = write_csv(tmp.path(), "parts.csv", "sku,name\nAAA,Part\n");
        let importer = Importer::new(&catalog);

        let first = importer.import_file(&path, &ImportOptions::default()).unwrap();
        assert!(matches!(first, ImportOutcome::Imported(_)));

        let second = importer.import_file(&path, &ImportOptions::default()).unwrap();
        assert!(matches!(second, ImportOutcome::SourceUnchanged { .. }));

        let forced = importer
            .import_file(
                &path,
                &ImportOptions {
                    force: true,
                    ..ImportOptions::default()
                },
            )
            .unwrap();
        match forced {
            ImportOutcome::Imported(stats) => assert_eq!(stats.updated, 1),
            _ => panic!("expected forced import"),
        }
    }

    #[test]
    fn test_semicolon_delimiter() {
        let (tmp, catalog) = setup();
        let path = write_csv(tmp.path(), "parts.csv", "sku;name;price\nSEMI-1;Part;9.99\n");

        let opts = ImportOptions {
            delimiter: b';',
            ..ImportOptions::default()
        };
        Importer::new(&catalog).import_file(&path, &opts).unwrap();
        let part = catalog.find_by_sku("SEMI-1").unwrap().unwrap();
        assert_eq!(part.unit_price, Some(9.99));
    }

    #[test]
    fn test_template_has_canonical_headers() {
        let template = template_csv();
        let first_line = template.lines().next().unwrap();
        assert_eq!(first_line, CSV_HEADERS.join(","));
        assert!(template.lines().count() > 1);
    }
}
