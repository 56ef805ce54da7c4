//! `sst selection` command - Manage part selection files
//!
//! `new` scaffolds a selection YAML under `selections/`, optionally
//! pre-filled from a design's matched comparison lines. `list` walks the
//! directory; `validate` checks files against the embedded schema and
//! prints span-labeled diagnostics for every violation.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Utc};
use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::commands::utils::{open_catalog, open_workspace};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::compare::run_comparison;
use crate::core::{Config, Workspace};
use crate::pricing::{FilePricingSource, PricingSource};
use crate::selection::{self, ScaffoldPart, SelectionFile};

#[derive(Subcommand, Debug)]
pub enum SelectionCommands {
    /// Scaffold a new selection file under selections/
    New(NewArgs),

    /// List selection files in the workspace
    List,

    /// Validate selection files against the schema
    Validate(ValidateArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Selection name; the file lands at selections/<name>.yaml
    pub name: String,

    /// Pre-fill parts from a design's matched comparison lines
    #[arg(long)]
    pub from_design: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Selection files to check
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("file", "FILE", 40),
    ColumnDef::new("project", "PROJECT", 24),
    ColumnDef::new("parts", "PARTS", 7),
];

pub fn run(cmd: SelectionCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        SelectionCommands::New(args) => run_new(args, global),
        SelectionCommands::List => run_list(global),
        SelectionCommands::Validate(args) => run_validate(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;

    let path = workspace
        .selections_dir()
        .join(format!("{}.yaml", args.name));
    if path.exists() {
        return Err(miette::miette!(
            help = "pick another name or remove the existing file",
            "selection file already exists: {}",
            path.display()
        ));
    }

    let parts = match &args.from_design {
        Some(design) => design_parts(&workspace, design)?,
        None => Vec::new(),
    };

    let year = Config::load()
        .default_year
        .unwrap_or_else(|| Utc::now().year());
    let body = selection::scaffold(&args.name, year, &parts)?;

    std::fs::create_dir_all(workspace.selections_dir()).into_diagnostic()?;
    std::fs::write(&path, body).into_diagnostic()?;

    if !global.quiet {
        println!(
            "{} Created selection {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
        if !parts.is_empty() {
            println!(
                "  {} part(s) pre-filled from the design's matched lines",
                style(parts.len()).cyan()
            );
        }
        println!();
        println!("Next steps:");
        println!(
            "  {} Check the file after editing",
            style(format!("sst selection validate {}", path.display())).yellow()
        );
        println!(
            "  {} Compute the credit",
            style(format!("sst credit {}", args.name)).yellow()
        );
    }

    Ok(())
}

/// Matched comparison lines for a design, as scaffold rows. Unmatched
/// lines are dropped; a selection can only reference catalog skus.
fn design_parts(workspace: &Workspace, design: &str) -> Result<Vec<ScaffoldPart>> {
    let catalog = open_catalog(workspace)?;
    let source = FilePricingSource::new(workspace.pricing_dir());
    let pricing = source.pricing(design).map_err(|e| {
        miette::miette!(
            help = "save the payload as pricing/<design>.json, or pass a file path",
            "{}",
            e
        )
    })?;
    let report = run_comparison(&catalog, &pricing).into_diagnostic()?;

    Ok(report
        .items
        .iter()
        .filter_map(|item| {
            item.matched_sku.as_ref().map(|sku| ScaffoldPart {
                sku: sku.clone(),
                quantity: item.quantity.unwrap_or(1).max(1),
            })
        })
        .collect())
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let files = selection::list_files(&workspace.selections_dir());

    let overviews: Vec<SelectionOverview> = files
        .iter()
        .map(|path| overview(path, workspace.root()))
        .collect();

    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&overviews).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&overviews).into_diagnostic()?;
            print!("{}", yaml);
        }
        _ => {
            let rows: Vec<TableRow> = overviews
                .iter()
                .map(|o| {
                    TableRow::new(o.file.clone())
                        .cell("file", CellValue::Text(o.file.clone()))
                        .cell(
                            "project",
                            o.project
                                .clone()
                                .map(CellValue::Text)
                                .unwrap_or(CellValue::Empty),
                        )
                        .cell(
                            "parts",
                            o.parts
                                .map(|n| CellValue::Number(n as i64))
                                .unwrap_or(CellValue::Empty),
                        )
                })
                .collect();
            TableFormatter::new(COLUMNS).output(&rows, format);

            if format == OutputFormat::Tsv && !global.quiet {
                println!();
                println!("{} selection file(s)", style(overviews.len()).cyan());
            }
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct SelectionOverview {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parts: Option<usize>,
}

/// Lenient per-file summary for listing; a file that does not parse still
/// lists, with its gaps shown as "-".
fn overview(path: &Path, root: &Path) -> SelectionOverview {
    let file = path
        .strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string();

    let parsed: Option<SelectionFile> = std::fs::read_to_string(path)
        .ok()
        .and_then(|content| serde_yml::from_str(&content).ok());

    match parsed {
        Some(selection) => SelectionOverview {
            file,
            project: selection.project.and_then(|p| p.name),
            parts: Some(selection.parts.len()),
        },
        None => SelectionOverview {
            file,
            project: None,
            parts: None,
        },
    }
}

fn run_validate(args: ValidateArgs, global: &GlobalOpts) -> Result<()> {
    let mut failures = 0usize;

    for file in &args.files {
        match selection::load(file) {
            Ok(_) => {
                if !global.quiet {
                    println!("{} {}", style("✓").green(), style(file.display()).cyan());
                }
            }
            Err(e) => {
                failures += 1;
                println!("{} {}", style("✗").red(), style(file.display()).cyan());
                eprintln!("{:?}", miette::Report::new(e));
            }
        }
    }

    if failures > 0 {
        return Err(miette::miette!(
            "{} of {} file(s) failed validation",
            failures,
            args.files.len()
        ));
    }

    if !global.quiet {
        println!();
        println!("{} file(s) passed", style(args.files.len()).cyan());
    }

    Ok(())
}
