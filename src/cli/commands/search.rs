//! `sst search` command - Search the parts catalog

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::catalog::Part;
use crate::cli::commands::utils::{open_catalog, open_workspace};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    /// Search term, matched case-insensitively against sku and name
    /// (empty matches everything)
    #[arg(default_value = "")]
    pub query: String,

    /// Result page, starting at 1
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Results per page (1-100)
    #[arg(long, default_value = "20")]
    pub page_size: u32,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("sku", "SKU", 16),
    ColumnDef::new("name", "NAME", 34),
    ColumnDef::new("brand", "BRAND", 16),
    ColumnDef::new("type", "TYPE", 12),
    ColumnDef::new("price", "PRICE", 12),
    ColumnDef::new("origin", "ORIGIN", 8),
];

pub fn run(args: SearchArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let catalog = open_catalog(&workspace)?;

    let page = catalog
        .search(&args.query, args.page, args.page_size)
        .into_diagnostic()?;

    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&page).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&page).into_diagnostic()?;
            print!("{}", yaml);
        }
        _ => {
            let rows: Vec<TableRow> = page.items.iter().map(part_row).collect();
            TableFormatter::new(COLUMNS).output(&rows, format);

            if format == OutputFormat::Tsv && !global.quiet {
                println!();
                let pages = page.total.div_ceil(page.page_size as u64).max(1);
                println!(
                    "{} part(s) matched; page {} of {}",
                    style(page.total).cyan(),
                    style(page.page).cyan(),
                    style(pages).cyan()
                );
            }
        }
    }

    Ok(())
}

pub(crate) fn part_row(part: &Part) -> TableRow {
    TableRow::new(part.sku.clone())
        .cell("sku", CellValue::Sku(part.sku.clone()))
        .cell("name", CellValue::Text(part.name.clone()))
        .cell(
            "brand",
            part.manufacturer
                .clone()
                .map(CellValue::Text)
                .unwrap_or(CellValue::Empty),
        )
        .cell(
            "type",
            part.category
                .clone()
                .map(CellValue::Text)
                .unwrap_or(CellValue::Empty),
        )
        .cell("price", CellValue::Money(part.unit_price))
        .cell("origin", CellValue::Origin(part.origin_country))
}
