//! SQLite-backed catalog store
//!
//! The catalog database lives at `.sst/catalog.db`. It is fully re-derivable
//! from source CSVs, so schema changes never migrate: an older on-disk
//! version is dropped and recreated, a newer one is refused.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use ulid::Ulid;

use super::{
    mapping_key, CatalogCounts, CatalogError, ComponentMapping, OriginCountry, Part, PartCatalog,
    SearchPage,
};

/// Current schema version - catalog tables are rebuilt on older versions
const SCHEMA_VERSION: i32 = 2;

/// Largest page size the search API will serve
const MAX_PAGE_SIZE: u32 = 100;

/// The parts catalog backed by SQLite
pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    /// Open or create the catalog database at the given path
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let needs_init = !path.exists();
        let conn = Connection::open(path)?;

        // WAL for better concurrent read behavior
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let catalog = Self { conn };

        if needs_init {
            catalog.init_schema()?;
        } else {
            let found: i32 = catalog
                .conn
                .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                    row.get(0)
                })
                .unwrap_or(0);

            if found > SCHEMA_VERSION {
                return Err(CatalogError::SchemaTooNew {
                    found,
                    supported: SCHEMA_VERSION,
                });
            }
            if found < SCHEMA_VERSION {
                catalog.reinitialize_schema()?;
            }
        }

        Ok(catalog)
    }

    fn init_schema(&self) -> Result<(), CatalogError> {
        self.conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Parts, keyed by SKU (the only stable join key)
            CREATE TABLE IF NOT EXISTS parts (
                sku TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                manufacturer TEXT,
                category TEXT,
                unit_price REAL,
                origin_country TEXT NOT NULL,
                is_domestic INTEGER,
                weight REAL,
                notes TEXT,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_parts_name ON parts(name);
            CREATE INDEX IF NOT EXISTS idx_parts_category ON parts(category);

            -- Vendor identity -> SKU mappings
            CREATE TABLE IF NOT EXISTS mappings (
                id TEXT PRIMARY KEY,
                lookup_key TEXT NOT NULL UNIQUE,
                external_name TEXT NOT NULL,
                manufacturer TEXT NOT NULL,
                part_sku TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_mappings_sku ON mappings(part_sku);

            -- Ingestion provenance and other key/value state
            CREATE TABLE IF NOT EXISTS catalog_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;

        self.conn.execute(
            "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;

        Ok(())
    }

    /// Drop all tables and reinitialize (catalog content is re-derivable)
    fn reinitialize_schema(&self) -> Result<(), CatalogError> {
        self.conn.execute_batch(
            r#"
            DROP TABLE IF EXISTS schema_version;
            DROP TABLE IF EXISTS parts;
            DROP TABLE IF EXISTS mappings;
            DROP TABLE IF EXISTS catalog_meta;
            "#,
        )?;
        self.init_schema()
    }

    /// Insert or update a part by SKU, last write wins.
    /// Returns true when a new row was created.
    pub fn upsert_part(&self, part: &Part) -> Result<bool, CatalogError> {
        let existed: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM parts WHERE sku = ?1)",
            params![part.sku],
            |row| row.get(0),
        )?;

        self.conn.execute(
            r#"
            INSERT INTO parts (sku, name, manufacturer, category, unit_price,
                               origin_country, is_domestic, weight, notes, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(sku) DO UPDATE SET
                name = excluded.name,
                manufacturer = excluded.manufacturer,
                category = excluded.category,
                unit_price = excluded.unit_price,
                origin_country = excluded.origin_country,
                is_domestic = excluded.is_domestic,
                weight = excluded.weight,
                notes = excluded.notes,
                updated_at = excluded.updated_at
            "#,
            params![
                part.sku,
                part.name,
                part.manufacturer,
                part.category,
                part.unit_price,
                part.origin_country.to_string(),
                part.is_domestic,
                part.weight,
                part.notes,
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(!existed)
    }

    /// List parts in ascending-sku order, optionally capped
    pub fn list_parts(&self, limit: Option<u32>) -> Result<Vec<Part>, CatalogError> {
        let sql = match limit {
            Some(_) => format!("{} ORDER BY sku ASC LIMIT ?1", SELECT_PART),
            None => format!("{} ORDER BY sku ASC", SELECT_PART),
        };
        let mut stmt = self.conn.prepare(&sql)?;

        let rows = match limit {
            Some(n) => stmt.query_map(params![n], part_from_row)?,
            None => stmt.query_map([], part_from_row)?,
        };

        let mut parts = Vec::new();
        for row in rows {
            parts.push(row?);
        }
        Ok(parts)
    }

    /// Paginated substring search over sku and name.
    ///
    /// An empty query matches everything. `page` is 1-based; `page_size` is
    /// clamped to 1..=100. Results come back in ascending-sku order so
    /// repeated queries paginate stably.
    pub fn search(&self, query: &str, page: u32, page_size: u32) -> Result<SearchPage, CatalogError> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let offset = (page as i64 - 1) * page_size as i64;

        let query = query.trim();
        let (total, items) = if query.is_empty() {
            let total: i64 = self
                .conn
                .query_row("SELECT COUNT(*) FROM parts", [], |row| row.get(0))?;
            let mut stmt = self
                .conn
                .prepare(&format!("{} ORDER BY sku ASC LIMIT ?1 OFFSET ?2", SELECT_PART))?;
            let items = stmt
                .query_map(params![page_size, offset], part_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            (total, items)
        } else {
            let pattern = format!("%{}%", escape_like(query));
            let total: i64 = self.conn.query_row(
                r"SELECT COUNT(*) FROM parts
                  WHERE sku LIKE ?1 ESCAPE '\' OR name LIKE ?1 ESCAPE '\'",
                params![pattern],
                |row| row.get(0),
            )?;
            let mut stmt = self.conn.prepare(&format!(
                r"{} WHERE sku LIKE ?1 ESCAPE '\' OR name LIKE ?1 ESCAPE '\'
                   ORDER BY sku ASC LIMIT ?2 OFFSET ?3",
                SELECT_PART
            ))?;
            let items = stmt
                .query_map(params![pattern, page_size, offset], part_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            (total, items)
        };

        Ok(SearchPage {
            total: total as u64,
            page,
            page_size,
            items,
        })
    }

    /// Insert a mapping row; the normalized lookup key must be unique
    pub fn add_mapping(
        &self,
        external_name: &str,
        manufacturer: &str,
        part_sku: &str,
    ) -> Result<ComponentMapping, CatalogError> {
        let mapping = ComponentMapping {
            id: Ulid::new().to_string(),
            external_name: external_name.to_string(),
            manufacturer: manufacturer.to_string(),
            part_sku: part_sku.to_string(),
            created_at: Utc::now(),
        };

        let result = self.conn.execute(
            r#"
            INSERT INTO mappings (id, lookup_key, external_name, manufacturer, part_sku, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                mapping.id,
                mapping.lookup_key(),
                mapping.external_name,
                mapping.manufacturer,
                mapping.part_sku,
                mapping.created_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(mapping),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(CatalogError::DuplicateMapping {
                    external_name: external_name.to_string(),
                    manufacturer: manufacturer.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the mapping with the given identity; returns true when a row was removed
    pub fn remove_mapping(
        &self,
        external_name: &str,
        manufacturer: &str,
    ) -> Result<bool, CatalogError> {
        let removed = self.conn.execute(
            "DELETE FROM mappings WHERE lookup_key = ?1",
            params![mapping_key(external_name, manufacturer)],
        )?;
        Ok(removed > 0)
    }

    /// Row counts for status output
    pub fn counts(&self) -> Result<CatalogCounts, CatalogError> {
        let (parts, domestic, non_domestic, unknown): (i64, i64, i64, i64) =
            self.conn.query_row(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(CASE WHEN origin_country = 'US' THEN 1 ELSE 0 END), 0),
                       COALESCE(SUM(CASE WHEN origin_country = 'NONUS' THEN 1 ELSE 0 END), 0),
                       COALESCE(SUM(CASE WHEN origin_country = 'UNKNOWN' THEN 1 ELSE 0 END), 0)
                FROM parts
                "#,
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;
        let mappings: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM mappings", [], |row| row.get(0))?;

        Ok(CatalogCounts {
            parts: parts as u64,
            domestic: domestic as u64,
            non_domestic: non_domestic as u64,
            unknown: unknown as u64,
            mappings: mappings as u64,
        })
    }

    /// Read a provenance/state value
    pub fn get_meta(&self, key: &str) -> Result<Option<String>, CatalogError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM catalog_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Write a provenance/state value
    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), CatalogError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO catalog_meta (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl PartCatalog for SqliteCatalog {
    fn find_by_sku(&self, sku: &str) -> Result<Option<Part>, CatalogError> {
        let part = self
            .conn
            .query_row(
                &format!("{} WHERE sku = ?1", SELECT_PART),
                params![sku],
                part_from_row,
            )
            .optional()?;
        Ok(part)
    }

    fn find_by_name_or_sku_contains(&self, needle: &str) -> Result<Option<Part>, CatalogError> {
        // SQLite LIKE is ASCII case-insensitive, which is the matching
        // policy here; ascending-sku order keeps the pick deterministic.
        let pattern = format!("%{}%", escape_like(needle));
        let part = self
            .conn
            .query_row(
                &format!(
                    r"{} WHERE sku LIKE ?1 ESCAPE '\' OR name LIKE ?1 ESCAPE '\'
                       ORDER BY sku ASC LIMIT 1",
                    SELECT_PART
                ),
                params![pattern],
                part_from_row,
            )
            .optional()?;
        Ok(part)
    }

    fn all_mappings(&self) -> Result<Vec<ComponentMapping>, CatalogError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, external_name, manufacturer, part_sku, created_at
            FROM mappings ORDER BY lookup_key ASC
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let created: String = row.get(4)?;
            Ok(ComponentMapping {
                id: row.get(0)?,
                external_name: row.get(1)?,
                manufacturer: row.get(2)?,
                part_sku: row.get(3)?,
                created_at: created
                    .parse::<DateTime<Utc>>()
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;

        let mut mappings = Vec::new();
        for row in rows {
            mappings.push(row?);
        }
        Ok(mappings)
    }
}

const SELECT_PART: &str = r#"
    SELECT sku, name, manufacturer, category, unit_price,
           origin_country, is_domestic, weight, notes
    FROM parts
"#;

fn part_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Part> {
    let origin: String = row.get(5)?;
    Ok(Part {
        sku: row.get(0)?,
        name: row.get(1)?,
        manufacturer: row.get(2)?,
        category: row.get(3)?,
        unit_price: row.get(4)?,
        origin_country: origin.parse().unwrap_or_default(),
        is_domestic: row.get(6)?,
        weight: row.get(7)?,
        notes: row.get(8)?,
    })
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
