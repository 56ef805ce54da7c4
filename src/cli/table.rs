//! Table formatting utilities for CLI list commands
//!
//! Search, part list, and map list share one table pipeline so the
//! `--format` flag behaves identically across them. JSON and YAML are
//! handled by the commands themselves via serde; this module covers the
//! columnar formats (tsv, csv, md, id).

use console::style;

use crate::catalog::OriginCountry;
use crate::cli::helpers::{escape_csv, truncate_str};
use crate::cli::OutputFormat;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Part SKU (cyan colored)
    Sku(String),
    /// Plain text, truncated to fit
    Text(String),
    /// Dollar amount, right-aligned ("-" when unknown)
    Money(Option<f64>),
    /// Origin country with color coding (US=green, NONUS=yellow, UNKNOWN=dim)
    Origin(OriginCountry),
    /// Tri-state flag (yes=green, no=yellow, "-"=dim)
    TriState(Option<bool>),
    /// Numeric count
    Number(i64),
    /// Empty/placeholder
    Empty,
}

impl CellValue {
    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Sku(sku) => {
                format!("{:<width$}", style(sku).cyan(), width = width)
            }
            CellValue::Text(s) => {
                let truncated = truncate_str(s, width.saturating_sub(2));
                format!("{:<width$}", truncated, width = width)
            }
            CellValue::Money(amount) => match amount {
                Some(a) => format!("{:>width$}", format!("${:.2}", a), width = width),
                None => format!("{:>width$}", "-", width = width),
            },
            CellValue::Origin(origin) => {
                let s = origin.to_string();
                let styled = match origin {
                    OriginCountry::Us => style(&s).green(),
                    OriginCountry::Nonus => style(&s).yellow(),
                    OriginCountry::Unknown => style(&s).dim(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::TriState(flag) => {
                let styled = match flag {
                    Some(true) => style("yes").green(),
                    Some(false) => style("no").yellow(),
                    None => style("-").dim(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Number(n) => {
                format!("{:>width$}", n, width = width)
            }
            CellValue::Empty => format!("{:<width$}", "-", width = width),
        }
    }

    /// Format for CSV output (RFC 4180, no colors)
    pub fn format_csv(&self) -> String {
        match self {
            CellValue::Sku(sku) => escape_csv(sku),
            CellValue::Text(s) => escape_csv(s),
            CellValue::Money(amount) => amount.map(|a| format!("{:.2}", a)).unwrap_or_default(),
            CellValue::Origin(origin) => origin.to_string(),
            CellValue::TriState(flag) => match flag {
                Some(true) => "yes".to_string(),
                Some(false) => "no".to_string(),
                None => String::new(),
            },
            CellValue::Number(n) => n.to_string(),
            CellValue::Empty => String::new(),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Sku(sku) => sku.clone(),
            CellValue::Text(s) => s.clone(),
            CellValue::Money(amount) => amount
                .map(|a| format!("${:.2}", a))
                .unwrap_or_else(|| "-".to_string()),
            CellValue::Origin(origin) => origin.to_string(),
            CellValue::TriState(flag) => match flag {
                Some(true) => "yes".to_string(),
                Some(false) => "no".to_string(),
                None => "-".to_string(),
            },
            CellValue::Number(n) => n.to_string(),
            CellValue::Empty => "-".to_string(),
        };
        raw.replace('|', "\\|")
    }

    /// Get the display width of this cell's content (for dynamic column sizing)
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Sku(sku) => sku.len(),
            CellValue::Text(s) => s.len(),
            CellValue::Money(amount) => amount.map_or(1, |a| format!("${:.2}", a).len()),
            CellValue::Origin(origin) => origin.to_string().len(),
            CellValue::TriState(flag) => flag.map_or(1, |f| if f { 3 } else { 2 }),
            CellValue::Number(n) => n.to_string().len(),
            CellValue::Empty => 1,
        }
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
pub struct TableRow {
    /// Value printed by the `id` format (the SKU for parts, the
    /// mapping id for mappings)
    pub key: String,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef]) -> Self {
        Self { columns }
    }

    /// Output rows in the specified format (Auto resolves to Tsv)
    pub fn output(&self, rows: &[TableRow], format: OutputFormat) {
        match format {
            OutputFormat::Csv => self.output_csv(rows),
            OutputFormat::Md => self.output_md(rows),
            OutputFormat::Id => self.output_keys(rows),
            _ => self.output_tsv(rows),
        }
    }

    /// Calculate dynamic column widths based on actual content
    fn calculate_widths(&self, rows: &[TableRow]) -> Vec<usize> {
        self.columns
            .iter()
            .map(|col| {
                let max_content = rows
                    .iter()
                    .filter_map(|r| r.get(col.key))
                    .map(|v| v.display_width())
                    .max()
                    .unwrap_or(0);
                // +2 truncation buffer matches truncate_str's width-2
                let natural = col.header.len().max(max_content.saturating_add(2));
                natural.min(col.width)
            })
            .collect()
    }

    fn output_tsv(&self, rows: &[TableRow]) {
        let widths = self.calculate_widths(rows);

        let header_parts: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<width$}", style(col.header).bold(), width = w))
            .collect();
        println!("{}", header_parts.join(" "));

        let total_width: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        println!("{}", "-".repeat(total_width));

        for row in rows {
            let row_parts: Vec<String> = self
                .columns
                .iter()
                .zip(&widths)
                .map(|(col, w)| match row.get(col.key) {
                    Some(value) => value.format_tsv(*w),
                    None => format!("{:<width$}", "-", width = w),
                })
                .collect();
            println!("{}", row_parts.join(" "));
        }
    }

    fn output_csv(&self, rows: &[TableRow]) {
        let headers: Vec<&str> = self.columns.iter().map(|c| c.key).collect();
        println!("{}", headers.join(","));

        for row in rows {
            let values: Vec<String> = self
                .columns
                .iter()
                .map(|col| row.get(col.key).map(|v| v.format_csv()).unwrap_or_default())
                .collect();
            println!("{}", values.join(","));
        }
    }

    fn output_md(&self, rows: &[TableRow]) {
        let headers: Vec<&str> = self.columns.iter().map(|c| c.header).collect();
        println!("| {} |", headers.join(" | "));

        let separators: Vec<&str> = self.columns.iter().map(|_| "---").collect();
        println!("|{}|", separators.join("|"));

        for row in rows {
            let values: Vec<String> = self
                .columns
                .iter()
                .map(|col| {
                    row.get(col.key)
                        .map(|v| v.format_md())
                        .unwrap_or_else(|| "-".to_string())
                })
                .collect();
            println!("| {} |", values.join(" | "));
        }
    }

    fn output_keys(&self, rows: &[TableRow]) {
        for row in rows {
            println!("{}", row.key);
        }
    }
}
