//! `sst ingest` command - Import a vendor parts CSV into the catalog

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::catalog::ingest::{template_csv, ImportOptions, ImportOutcome, Importer, SkippedRow};
use crate::cli::commands::utils::{open_catalog, open_workspace};
use crate::cli::GlobalOpts;
use crate::core::Config;

/// Skip reasons shown before eliding the rest (unless --verbose)
const MAX_SKIPS_SHOWN: usize = 5;

#[derive(clap::Args, Debug)]
pub struct IngestArgs {
    /// Parts CSV to import
    #[arg(required_unless_present = "template")]
    pub file: Option<PathBuf>,

    /// Validate and report without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Field delimiter (default: config csv_delimiter, then ',')
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Re-import even when the file matches the last import
    #[arg(long)]
    pub force: bool,

    /// Print a starter CSV template and exit
    #[arg(long, conflicts_with_all = ["file", "dry_run", "delimiter", "force"])]
    pub template: bool,
}

pub fn run(args: IngestArgs, global: &GlobalOpts) -> Result<()> {
    if args.template {
        print!("{}", template_csv());
        return Ok(());
    }

    let file = args
        .file
        .as_ref()
        .ok_or_else(|| miette::miette!("no CSV file given"))?;

    let workspace = open_workspace(global)?;
    let catalog = open_catalog(&workspace)?;
    let config = Config::load();

    let delimiter = match args.delimiter {
        Some(c) if c.is_ascii() => c as u8,
        Some(c) => return Err(miette::miette!("delimiter must be an ASCII character, got {:?}", c)),
        None => config.csv_delimiter(),
    };

    let opts = ImportOptions {
        dry_run: args.dry_run,
        delimiter,
        force: args.force,
    };

    let importer = Importer::new(&catalog);
    let outcome = importer.import_file(file, &opts).into_diagnostic()?;

    let stats = match outcome {
        ImportOutcome::SourceUnchanged { hash } => {
            println!(
                "{} {} is unchanged since the last import (sha256 {})",
                style("!").yellow(),
                style(file.display()).cyan(),
                style(&hash[..12.min(hash.len())]).dim()
            );
            println!("Use {} to re-import anyway", style("--force").yellow());
            return Ok(());
        }
        ImportOutcome::Imported(stats) => stats,
    };

    if args.dry_run {
        println!(
            "{} Dry run: validated {} row(s), nothing written",
            style("!").yellow(),
            style(stats.rows_processed).cyan()
        );
    } else if !global.quiet {
        println!(
            "{} Imported {}",
            style("✓").green(),
            style(file.display()).cyan()
        );
    }

    if !global.quiet || stats.skipped_count() > 0 {
        println!(
            "  {} created, {} updated, {} skipped",
            style(stats.created).green(),
            style(stats.updated).cyan(),
            if stats.skipped_count() > 0 {
                style(stats.skipped_count()).yellow()
            } else {
                style(0usize).dim()
            }
        );
    }

    if stats.skipped_count() > 0 {
        print_skips(&stats.skipped, global.verbose);
    }

    Ok(())
}

fn print_skips(skipped: &[SkippedRow], verbose: bool) {
    let shown = if verbose {
        skipped.len()
    } else {
        skipped.len().min(MAX_SKIPS_SHOWN)
    };

    for skip in &skipped[..shown] {
        println!(
            "  {} row {}: {}",
            style("✗").red(),
            style(skip.row).cyan(),
            skip.reason
        );
    }

    if shown < skipped.len() {
        println!(
            "  {} and {} more (use {} to see all)",
            style("…").dim(),
            skipped.len() - shown,
            style("--verbose").yellow()
        );
    }
}
