//! `sst credit` command - Federal tax credit eligibility assessment
//!
//! Loads a selection file, resolves its parts against the catalog, applies
//! any flag overrides to the project facts, and runs the eligibility
//! engine. Flags beat file values field by field; `--interactive` prompts
//! for whatever the flags left unsaid.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, Utc};
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::utils::{open_catalog, open_workspace};
use crate::cli::helpers::{fmt_money, fmt_pct};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Config, Workspace};
use crate::credit::{assess, EligibilityReport, ProjectContext, ProjectType};
use crate::report::ReportWriter;
use crate::selection;

#[derive(clap::Args, Debug)]
pub struct CreditArgs {
    /// Selection name (resolved as selections/<name>.yaml) or a path to a
    /// selection YAML file
    pub selection: String,

    /// Installation year (overrides the selection file)
    #[arg(long)]
    pub year: Option<i32>,

    /// Maximum net output in MW (overrides the selection file)
    #[arg(long)]
    pub max_output: Option<f64>,

    /// Construction start date, YYYY-MM-DD (overrides the selection file)
    #[arg(long)]
    pub construction_start: Option<String>,

    /// Attest prevailing wage and apprenticeship compliance
    #[arg(long)]
    pub prevailing_wage: bool,

    /// Project type: residential or commercial (overrides the selection file)
    #[arg(long)]
    pub project_type: Option<String>,

    /// Prompt for project facts not given as flags
    #[arg(long, short = 'i')]
    pub interactive: bool,

    /// Write the report pair (JSON + Markdown) under reports/
    #[arg(long)]
    pub save: bool,
}

const PART_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("sku", "SKU", 16),
    ColumnDef::new("name", "NAME", 26),
    ColumnDef::new("qty", "QTY", 5),
    ColumnDef::new("class", "CLASS", 14),
    ColumnDef::new("category", "CATEGORY", 22),
    ColumnDef::new("value", "VALUE", 12),
    ColumnDef::new("dom_pct", "DOM %", 7),
    ColumnDef::new("dom_value", "DOM VALUE", 12),
];

pub fn run(args: CreditArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let catalog = open_catalog(&workspace)?;
    let config = Config::load();

    let path = resolve_selection_path(&workspace, &args.selection)?;
    let file = selection::load(&path)?;
    let parts = selection::resolve(&file, &catalog)?;

    let default_year = config.default_year.unwrap_or_else(|| Utc::now().year());
    let section = file.project.clone().unwrap_or_default();
    let mut context = section.to_context(default_year);
    apply_overrides(&mut context, &args)?;
    if args.interactive {
        context = prompt_missing(context, &args)?;
    }

    let report = assess(&parts, &context).map_err(|e| {
        miette::miette!(
            help = "add parts to the selection file, or scaffold entries with `sst selection new`",
            "{}",
            e
        )
    })?;

    match global.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&report).into_diagnostic()?;
            print!("{}", yaml);
        }
        _ => print_report(&report, global),
    }

    if args.save {
        let name = section
            .name
            .clone()
            .unwrap_or_else(|| file_stem(&path, &args.selection));
        let writer = ReportWriter::new(workspace.reports_dir(), config.author());
        let saved = writer.save_credit(&name, &report).into_diagnostic()?;
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

/// `selection` resolves as a literal path first, then as
/// `selections/<name>.yaml` or `.yml`.
fn resolve_selection_path(workspace: &Workspace, selection: &str) -> Result<PathBuf> {
    let literal = Path::new(selection);
    if literal.is_file() {
        return Ok(literal.to_path_buf());
    }
    for ext in ["yaml", "yml"] {
        let named = workspace
            .selections_dir()
            .join(format!("{}.{}", selection, ext));
        if named.is_file() {
            return Ok(named);
        }
    }
    Err(miette::miette!(
        help = "run `sst selection list` to see saved selections, or pass a file path",
        "no selection found for '{}'",
        selection
    ))
}

fn file_stem(path: &Path, fallback: &str) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| fallback.to_string())
}

/// Flags beat file values field by field. The wage flag can only attest
/// compliance; it never unsets a file-provided attestation.
fn apply_overrides(context: &mut ProjectContext, args: &CreditArgs) -> Result<()> {
    if let Some(year) = args.year {
        context.installation_year = year;
    }
    if let Some(mw) = args.max_output {
        context.max_net_output_mw = mw;
    }
    if let Some(raw) = &args.construction_start {
        let date = raw.trim().parse::<NaiveDate>().map_err(|_| {
            miette::miette!(
                help = "dates are written YYYY-MM-DD",
                "invalid construction start date '{}'",
                raw
            )
        })?;
        context.construction_start = Some(date);
    }
    if args.prevailing_wage {
        context.prevailing_wage_compliant = true;
    }
    if let Some(raw) = &args.project_type {
        context.project_type = raw
            .parse::<ProjectType>()
            .map_err(|e| miette::miette!("{}", e))?;
    }
    Ok(())
}

fn prompt_missing(mut context: ProjectContext, args: &CreditArgs) -> Result<ProjectContext> {
    use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
    let theme = ColorfulTheme::default();

    if args.year.is_none() {
        context.installation_year = Input::with_theme(&theme)
            .with_prompt("Installation year")
            .default(context.installation_year)
            .interact_text()
            .into_diagnostic()?;
    }

    if args.max_output.is_none() {
        context.max_net_output_mw = Input::with_theme(&theme)
            .with_prompt("Maximum net output (MW)")
            .default(context.max_net_output_mw)
            .interact_text()
            .into_diagnostic()?;
    }

    if args.construction_start.is_none() {
        let current = context
            .construction_start
            .map(|d| d.to_string())
            .unwrap_or_default();
        let raw: String = Input::with_theme(&theme)
            .with_prompt("Construction start (YYYY-MM-DD, blank if unknown)")
            .default(current)
            .allow_empty(true)
            .interact_text()
            .into_diagnostic()?;
        context.construction_start = if raw.trim().is_empty() {
            None
        } else {
            Some(raw.trim().parse::<NaiveDate>().map_err(|_| {
                miette::miette!("invalid date '{}' (expected YYYY-MM-DD)", raw.trim())
            })?)
        };
    }

    if !args.prevailing_wage {
        context.prevailing_wage_compliant = Confirm::with_theme(&theme)
            .with_prompt("Prevailing wage and apprenticeship compliant?")
            .default(context.prevailing_wage_compliant)
            .interact()
            .into_diagnostic()?;
    }

    if args.project_type.is_none() {
        let options = ["residential", "commercial"];
        let current = match context.project_type {
            ProjectType::Residential => 0,
            ProjectType::Commercial => 1,
        };
        let picked = Select::with_theme(&theme)
            .with_prompt("Project type")
            .items(&options)
            .default(current)
            .interact()
            .into_diagnostic()?;
        context.project_type = options[picked]
            .parse::<ProjectType>()
            .map_err(|e| miette::miette!("{}", e))?;
    }

    Ok(context)
}

fn print_report(report: &EligibilityReport, global: &GlobalOpts) {
    let project = &report.project;

    println!("{}", style("Project").bold());
    println!(
        "  {:<20} {}",
        "Installation year",
        style(project.installation_year).cyan()
    );
    println!(
        "  {:<20} {} MW",
        "Max net output",
        style(project.max_net_output_mw).cyan()
    );
    println!(
        "  {:<20} {}",
        "Construction start",
        project
            .construction_start
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!(
        "  {:<20} {}",
        "Prevailing wage",
        if project.prevailing_wage_compliant {
            "yes"
        } else {
            "no"
        }
    );
    println!("  {:<20} {}", "Project type", project.project_type);

    println!();
    println!("{}", style("Parts").bold());
    let rows: Vec<TableRow> = report.parts.iter().map(part_row).collect();
    TableFormatter::new(PART_COLUMNS).output(&rows, OutputFormat::Tsv);

    println!();
    println!("{}", style("Domestic content").bold());
    println!("  {}", style(&report.requirements_description).dim());
    rollup_line("Steel/Iron", &report.steel_iron);
    rollup_line("Manufactured Products", &report.manufactured_products);

    println!();
    println!("{}", style("Bonus eligibility").bold());
    path_line(report.bonus.small_project, "under 1 MW net output");
    path_line(
        report.bonus.early_construction,
        "construction began before 2023-01-29",
    );
    path_line(report.bonus.prevailing_wage, "prevailing wage compliant");
    if report.domestic_content_compliant && report.bonus.eligible {
        println!(
            "  {} 10% domestic content bonus applies",
            style("✓").green()
        );
    } else {
        println!(
            "  {} 10% domestic content bonus does not apply",
            style("✗").red()
        );
    }

    println!();
    println!("{}", style("Credits").bold());
    credit_line("Equipment value", report.equipment_value);
    credit_line("Labor (20%)", report.labor_cost);
    credit_line("Total project cost", report.total_project_cost);
    credit_line("Base credit (30%)", report.base_credit);
    credit_line("Domestic content bonus (10%)", report.domestic_content_bonus);
    println!(
        "  {:<30} {}",
        "Total credit",
        style(format!("{:>12}", fmt_money(Some(report.total_credit))))
            .green()
            .bold()
    );
    if let Some(residential) = report.residential_credit {
        credit_line("Residential credit (separate)", residential);
    }

    if !report.recommendations.is_empty() && !global.quiet {
        println!();
        println!("{}", style("Recommendations").bold());
        for rec in &report.recommendations {
            println!("  - {}", rec);
        }
    }
}

fn part_row(part: &crate::credit::PartAssessment) -> TableRow {
    TableRow::new(part.sku.clone())
        .cell("sku", CellValue::Sku(part.sku.clone()))
        .cell("name", CellValue::Text(part.name.clone()))
        .cell("qty", CellValue::Number(part.quantity as i64))
        .cell("class", CellValue::Text(part.classification.to_string()))
        .cell("category", CellValue::Text(part.category.to_string()))
        .cell("value", CellValue::Money(Some(part.total_value)))
        .cell("dom_pct", CellValue::Text(fmt_pct(part.domestic_content_pct)))
        .cell("dom_value", CellValue::Money(Some(part.domestic_value)))
}

fn rollup_line(label: &str, rollup: &crate::credit::CategoryRollup) {
    let glyph = if rollup.compliant {
        style("✓").green()
    } else {
        style("✗").red()
    };
    println!(
        "  {} {:<22} {} of {} domestic ({}, requires {})",
        glyph,
        label,
        fmt_money(Some(rollup.domestic_value)),
        fmt_money(Some(rollup.value)),
        fmt_pct(rollup.actual_pct),
        fmt_pct(rollup.required_pct)
    );
}

fn path_line(satisfied: bool, label: &str) {
    let glyph = if satisfied {
        style("✓").green()
    } else {
        style("✗").red()
    };
    println!("  {} {}", glyph, label);
}

fn credit_line(label: &str, amount: f64) {
    println!("  {:<30} {:>12}", label, fmt_money(Some(amount)));
}
