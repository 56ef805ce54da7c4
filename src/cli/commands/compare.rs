//! `sst compare` command - Design pricing vs. catalog domesticity
//!
//! Reads a saved pricing payload, matches each vendor line against the
//! catalog, and prints the priced breakdown with domestic, non-domestic,
//! and unknown subtotals. Unmatched and unpriced lines stay visible.

use std::path::Path;

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::utils::{open_catalog, open_workspace};
use crate::cli::helpers::fmt_money;
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::compare::{run_comparison, ComparisonReport};
use crate::core::Config;
use crate::pricing::{FilePricingSource, PricingSource};
use crate::report::ReportWriter;

#[derive(clap::Args, Debug)]
pub struct CompareArgs {
    /// Design name (resolved as pricing/<design>.json) or a path to a
    /// pricing JSON payload
    pub design: String,

    /// Write the report pair (JSON + Markdown) under reports/
    #[arg(long)]
    pub save: bool,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("component", "COMPONENT", 30),
    ColumnDef::new("manufacturer", "MANUFACTURER", 18),
    ColumnDef::new("type", "TYPE", 12),
    ColumnDef::new("qty", "QTY", 5),
    ColumnDef::new("sku", "SKU", 16),
    ColumnDef::new("price", "UNIT PRICE", 12),
    ColumnDef::new("origin", "ORIGIN", 8),
    ColumnDef::new("total", "LINE TOTAL", 12),
];

pub fn run(args: CompareArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let catalog = open_catalog(&workspace)?;

    let source = FilePricingSource::new(workspace.pricing_dir());
    let pricing = source.pricing(&args.design).map_err(|e| {
        miette::miette!(
            help = "save the payload as pricing/<design>.json, or pass a file path",
            "{}",
            e
        )
    })?;

    let report = run_comparison(&catalog, &pricing).into_diagnostic()?;

    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&report).into_diagnostic()?;
            print!("{}", yaml);
        }
        _ => print_report(&report, format, global),
    }

    if args.save {
        let writer = ReportWriter::new(workspace.reports_dir(), Config::load().author());
        let saved = writer
            .save_comparison(&report_name(&args.design, &report), &report)
            .into_diagnostic()?;
        if !global.quiet {
            println!();
            println!(
                "{} Saved {}",
                style("✓").green(),
                style(saved.json_path.display()).cyan()
            );
            println!(
                "{} Saved {}",
                style("✓").green(),
                style(saved.markdown_path.display()).cyan()
            );
        }
    }

    Ok(())
}

fn print_report(report: &ComparisonReport, format: OutputFormat, global: &GlobalOpts) {
    if format == OutputFormat::Tsv && !global.quiet {
        let mut segments = Vec::new();
        if let Some(id) = &report.design_id {
            segments.push(format!("Design {}", id));
        }
        if let Some(watts) = report.system_size_watts {
            segments.push(format!("{} W", watts));
        }
        if let Some(ppw) = report.price_per_watt {
            segments.push(format!("${:.2}/W", ppw));
        }
        if !segments.is_empty() {
            println!("{}", style(segments.join(" | ")).dim());
            println!();
        }
    }

    let rows: Vec<TableRow> = report.items.iter().map(item_row).collect();
    TableFormatter::new(COLUMNS).output(&rows, format);

    if format == OutputFormat::Tsv && !global.quiet {
        let summary = &report.summary;
        println!();
        println!(
            "{} of {} line(s) matched to catalog parts",
            style(report.matched_count()).cyan(),
            style(report.items.len()).cyan()
        );
        println!(
            "Domestic {} | Non-domestic {} | Unknown {}",
            style(fmt_money(Some(summary.domestic_total))).green(),
            style(fmt_money(Some(summary.non_domestic_total))).yellow(),
            style(fmt_money(Some(summary.unknown_total))).dim()
        );
        if summary.unpriced_count > 0 {
            println!(
                "{} {} line(s) had no computable total (missing price or quantity)",
                style("!").yellow(),
                style(summary.unpriced_count).cyan()
            );
        }
    }
}

fn item_row(item: &crate::compare::ComparisonLineItem) -> TableRow {
    // `id` format pipes the matched sku; unmatched lines pipe the
    // vendor-side name so every input row stays visible.
    let key = item
        .matched_sku
        .clone()
        .unwrap_or_else(|| item.name.clone());

    TableRow::new(key)
        .cell("component", CellValue::Text(item.name.clone()))
        .cell("manufacturer", CellValue::Text(item.manufacturer.clone()))
        .cell("type", CellValue::Text(item.component_type.clone()))
        .cell(
            "qty",
            item.quantity
                .map(|q| CellValue::Number(q as i64))
                .unwrap_or(CellValue::Empty),
        )
        .cell(
            "sku",
            item.matched_sku
                .clone()
                .map(CellValue::Sku)
                .unwrap_or(CellValue::Empty),
        )
        .cell("price", CellValue::Money(item.unit_price))
        .cell(
            "origin",
            item.origin_country
                .map(CellValue::Origin)
                .unwrap_or(CellValue::Empty),
        )
        .cell("total", CellValue::Money(item.line_total))
}

/// Report stem: the payload's design id when present, else the argument
/// with any path and extension stripped.
fn report_name(design_arg: &str, report: &ComparisonReport) -> String {
    if let Some(id) = &report.design_id {
        return id.clone();
    }
    Path::new(design_arg)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| design_arg.to_string())
}
