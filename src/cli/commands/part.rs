//! `sst part` command - Inspect catalog parts

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::catalog::PartCatalog;
use crate::cli::commands::search::part_row;
use crate::cli::commands::utils::{open_catalog, open_workspace};
use crate::cli::table::{ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum PartCommands {
    /// Show one part's full record
    Show(ShowArgs),

    /// List catalog parts
    List(ListArgs),
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Catalog sku
    pub sku: String,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Limit number of rows
    #[arg(long, short = 'n')]
    pub limit: Option<u32>,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("sku", "SKU", 16),
    ColumnDef::new("name", "NAME", 34),
    ColumnDef::new("brand", "BRAND", 16),
    ColumnDef::new("type", "TYPE", 12),
    ColumnDef::new("price", "PRICE", 12),
    ColumnDef::new("origin", "ORIGIN", 8),
];

pub fn run(cmd: PartCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        PartCommands::Show(args) => run_show(args, global),
        PartCommands::List(args) => run_list(args, global),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let catalog = open_catalog(&workspace)?;

    let part = catalog
        .find_by_sku(&args.sku)
        .into_diagnostic()?
        .ok_or_else(|| {
            miette::miette!(
                help = format!("run `sst search {}` to look for similar parts", args.sku),
                "no part with sku '{}' in the catalog",
                args.sku
            )
        })?;

    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Yaml,
        f => f,
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&part).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Id => println!("{}", part.sku),
        _ => {
            let yaml = serde_yml::to_string(&part).into_diagnostic()?;
            print!("{}", yaml);
        }
    }

    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let catalog = open_catalog(&workspace)?;

    let parts = catalog.list_parts(args.limit).into_diagnostic()?;

    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&parts).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&parts).into_diagnostic()?;
            print!("{}", yaml);
        }
        _ => {
            let rows: Vec<TableRow> = parts.iter().map(part_row).collect();
            TableFormatter::new(COLUMNS).output(&rows, format);

            if format == OutputFormat::Tsv && !global.quiet {
                let counts = catalog.counts().into_diagnostic()?;
                println!();
                println!(
                    "{} part(s) in catalog ({} domestic / {} non-domestic / {} unknown), {} mapping(s)",
                    style(counts.parts).cyan(),
                    style(counts.domestic).green(),
                    style(counts.non_domestic).yellow(),
                    style(counts.unknown).dim(),
                    style(counts.mappings).cyan()
                );
            }
        }
    }

    Ok(())
}
