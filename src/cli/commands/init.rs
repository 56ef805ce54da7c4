//! `sst init` command - Initialize a new workspace

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::catalog::ingest::{ImportOptions, ImportOutcome, Importer};
use crate::catalog::{CatalogError, SqliteCatalog};
use crate::cli::GlobalOpts;
use crate::core::workspace::{Workspace, WorkspaceError};

/// Demo vendor export, ingested through the normal path by `--demo`
const DEMO_CSV: &str = include_str!("../../../assets/material-list.csv");

/// Demo mappings: (external name, manufacturer, sku)
const DEMO_MAPPINGS: &[(&str, &str, &str)] = &[
    ("Q.PEAK DUO XL 450", "Hanwha Qcells", "PVL-450"),
    ("IQ8+ Microinverter", "Enphase Energy", "INV-7600"),
    ("XR100 168\" Rail", "IronRidge", "RAIL-168"),
];

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Seed the catalog with a demo parts list and mappings
    #[arg(long)]
    pub demo: bool,

    /// Force initialization even if .sst/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        if !global.quiet {
            println!(
                "{} Created directory {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
    }

    let workspace = if args.force {
        Workspace::init_force(&path)
    } else {
        Workspace::init(&path)
    };

    let workspace = match workspace {
        Ok(ws) => ws,
        Err(WorkspaceError::AlreadyExists(root)) => {
            println!(
                "{} SST workspace already exists at {}",
                style("!").yellow(),
                style(root.display()).cyan()
            );
            println!();
            println!("Use {} to reinitialize", style("sst init --force").yellow());
            return Ok(());
        }
        Err(e) => return Err(miette::miette!("{}", e)),
    };

    // Opening creates the catalog schema
    let catalog = SqliteCatalog::open(&workspace.catalog_path()).into_diagnostic()?;

    if !global.quiet {
        println!(
            "{} Initialized SST workspace at {}",
            style("✓").green(),
            style(workspace.root().display()).cyan()
        );
        println!();
        println!("Created workspace structure:");
        print_structure(workspace.root());
    }

    if args.demo {
        seed_demo(&catalog, &workspace, global)?;
    }

    if !global.quiet {
        println!();
        println!("Next steps:");
        println!(
            "  {} Import a vendor parts CSV",
            style("sst ingest <file.csv>").yellow()
        );
        println!(
            "  {} Search the catalog",
            style("sst search <query>").yellow()
        );
        println!(
            "  {} Scaffold a part selection",
            style("sst selection new <name>").yellow()
        );
    }

    Ok(())
}

fn seed_demo(catalog: &SqliteCatalog, workspace: &Workspace, global: &GlobalOpts) -> Result<()> {
    let demo_path = workspace.sst_dir().join("demo-material-list.csv");
    std::fs::write(&demo_path, DEMO_CSV).into_diagnostic()?;

    let importer = Importer::new(catalog);
    let outcome = importer
        .import_bytes(
            &demo_path.display().to_string(),
            DEMO_CSV.as_bytes(),
            &ImportOptions::default(),
        )
        .into_diagnostic()?;

    let mut mapped = 0;
    for (external_name, manufacturer, sku) in DEMO_MAPPINGS {
        match catalog.add_mapping(external_name, manufacturer, sku) {
            Ok(_) => mapped += 1,
            // Re-running --demo over an existing catalog is fine
            Err(CatalogError::DuplicateMapping { .. }) => {}
            Err(e) => return Err(miette::miette!("{}", e)),
        }
    }

    if global.quiet {
        return Ok(());
    }

    if let ImportOutcome::Imported(stats) = outcome {
        println!();
        println!(
            "{} Seeded demo catalog: {} part(s), {} mapping(s)",
            style("✓").green(),
            style(stats.created + stats.updated).cyan(),
            style(mapped).cyan()
        );
    }
    Ok(())
}

fn print_structure(root: &Path) {
    let entries = [
        ".sst/",
        ".sst/config.yaml",
        ".sst/catalog.db",
        "pricing/",
        "selections/",
        "reports/",
    ];

    for entry in entries {
        let full_path = root.join(entry.trim_end_matches('/'));
        if full_path.exists() {
            let prefix = if entry.ends_with('/') { "📁" } else { "📄" };
            println!("  {} {}", prefix, style(entry).dim());
        }
    }
}
