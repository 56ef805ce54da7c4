//! `sst map` command - Component-name-to-SKU mappings
//!
//! Mappings pin a vendor's component naming to a catalog sku so the
//! comparison matcher stops guessing. The lookup key is case- and
//! whitespace-insensitive on (external name, manufacturer).

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::catalog::PartCatalog;
use crate::cli::commands::utils::{open_catalog, open_workspace};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum MapCommands {
    /// List all mappings
    List,

    /// Add a mapping
    Add(AddArgs),

    /// Remove a mapping
    Remove(RemoveArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Vendor-side component name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Vendor-side manufacturer name
    #[arg(long, short = 'm')]
    pub manufacturer: String,

    /// Catalog sku the component resolves to
    #[arg(long, short = 's')]
    pub sku: String,
}

#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Vendor-side component name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Vendor-side manufacturer name
    #[arg(long, short = 'm')]
    pub manufacturer: String,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "EXTERNAL NAME", 32),
    ColumnDef::new("manufacturer", "MANUFACTURER", 20),
    ColumnDef::new("sku", "SKU", 16),
];

pub fn run(cmd: MapCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        MapCommands::List => run_list(global),
        MapCommands::Add(args) => run_add(args, global),
        MapCommands::Remove(args) => run_remove(args, global),
    }
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let catalog = open_catalog(&workspace)?;

    let mappings = catalog.all_mappings().into_diagnostic()?;

    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&mappings).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&mappings).into_diagnostic()?;
            print!("{}", yaml);
        }
        _ => {
            let rows: Vec<TableRow> = mappings
                .iter()
                .map(|m| {
                    TableRow::new(m.id.clone())
                        .cell("name", CellValue::Text(m.external_name.clone()))
                        .cell("manufacturer", CellValue::Text(m.manufacturer.clone()))
                        .cell("sku", CellValue::Sku(m.part_sku.clone()))
                })
                .collect();
            TableFormatter::new(COLUMNS).output(&rows, format);

            if format == OutputFormat::Tsv && !global.quiet {
                println!();
                println!("{} mapping(s)", style(mappings.len()).cyan());
            }
        }
    }

    Ok(())
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let catalog = open_catalog(&workspace)?;

    let known_sku = catalog
        .find_by_sku(&args.sku)
        .into_diagnostic()?
        .is_some();

    catalog
        .add_mapping(&args.name, &args.manufacturer, &args.sku)
        .into_diagnostic()?;

    if !global.quiet {
        println!(
            "{} Mapped '{}' ({}) {} {}",
            style("✓").green(),
            style(&args.name).cyan(),
            args.manufacturer,
            style("→").dim(),
            style(&args.sku).cyan()
        );
    }

    // Dangling mappings are legal; the matcher falls through to the
    // fuzzy search when the sku disappears. Still worth a heads-up.
    if !known_sku {
        println!(
            "{} sku '{}' is not in the catalog yet",
            style("!").yellow(),
            style(&args.sku).cyan()
        );
    }

    Ok(())
}

fn run_remove(args: RemoveArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let catalog = open_catalog(&workspace)?;

    let removed = catalog
        .remove_mapping(&args.name, &args.manufacturer)
        .into_diagnostic()?;

    if !removed {
        return Err(miette::miette!(
            help = "run `sst map list` to see the current mappings",
            "no mapping for '{}' ({})",
            args.name,
            args.manufacturer
        ));
    }

    if !global.quiet {
        println!(
            "{} Removed mapping '{}' ({})",
            style("✓").green(),
            style(&args.name).cyan(),
            args.manufacturer
        );
    }

    Ok(())
}
