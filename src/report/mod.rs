//! Report export - paired JSON and Markdown artifacts under `reports/`
//!
//! Each saved report is written twice: machine-readable JSON for downstream
//! tooling and a Markdown rendering for humans. Filenames carry a slug of
//! the report name plus the generation timestamp, so repeated runs never
//! clobber earlier artifacts.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};
use thiserror::Error;

use crate::compare::ComparisonReport;
use crate::core::templates::{TemplateEngine, TemplateError};
use crate::credit::EligibilityReport;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot write report {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("cannot serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Paths of the artifact pair one save produced
#[derive(Debug, Clone)]
pub struct SavedReport {
    pub json_path: PathBuf,
    pub markdown_path: PathBuf,
}

#[derive(Serialize)]
struct ComparisonDocument<'a> {
    generated_at: String,
    author: &'a str,
    comparison: &'a ComparisonReport,
}

#[derive(Serialize)]
struct CreditDocument<'a> {
    generated_at: String,
    author: &'a str,
    assessment: &'a EligibilityReport,
}

/// Writes report pairs into one reports directory. The timestamp is fixed
/// at construction so the JSON and Markdown of a pair always agree.
pub struct ReportWriter {
    reports_dir: PathBuf,
    author: String,
    generated_at: DateTime<Utc>,
}

impl ReportWriter {
    pub fn new(reports_dir: impl Into<PathBuf>, author: impl Into<String>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
            author: author.into(),
            generated_at: Utc::now(),
        }
    }

    #[cfg(test)]
    fn with_timestamp(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    pub fn save_comparison(
        &self,
        name: &str,
        report: &ComparisonReport,
    ) -> Result<SavedReport, ReportError> {
        let stem = format!("{}-compare-{}", slug(name), self.timestamp());
        let json = serde_json::to_string_pretty(&ComparisonDocument {
            generated_at: self.generated_at.to_rfc3339(),
            author: &self.author,
            comparison: report,
        })?;
        let markdown = self.comparison_markdown(name, report)?;
        self.write_pair(&stem, &json, &markdown)
    }

    pub fn save_credit(
        &self,
        name: &str,
        report: &EligibilityReport,
    ) -> Result<SavedReport, ReportError> {
        let stem = format!("{}-credit-{}", slug(name), self.timestamp());
        let json = serde_json::to_string_pretty(&CreditDocument {
            generated_at: self.generated_at.to_rfc3339(),
            author: &self.author,
            assessment: report,
        })?;
        let markdown = self.credit_markdown(name, report)?;
        self.write_pair(&stem, &json, &markdown)
    }

    fn timestamp(&self) -> String {
        self.generated_at.format("%Y%m%d-%H%M%S").to_string()
    }

    fn write_pair(
        &self,
        stem: &str,
        json: &str,
        markdown: &str,
    ) -> Result<SavedReport, ReportError> {
        std::fs::create_dir_all(&self.reports_dir).map_err(|e| ReportError::Io {
            path: self.reports_dir.display().to_string(),
            source: e,
        })?;

        let json_path = self.reports_dir.join(format!("{}.json", stem));
        let markdown_path = self.reports_dir.join(format!("{}.md", stem));

        write_file(&json_path, json)?;
        write_file(&markdown_path, markdown)?;

        Ok(SavedReport {
            json_path,
            markdown_path,
        })
    }

    fn comparison_markdown(
        &self,
        name: &str,
        report: &ComparisonReport,
    ) -> Result<String, ReportError> {
        let items_table = md_table(
            &[
                "Component",
                "Manufacturer",
                "Type",
                "Qty",
                "SKU",
                "Unit Price",
                "Origin",
                "Line Total",
            ],
            report
                .items
                .iter()
                .map(|item| {
                    vec![
                        dash_if_empty(&item.name),
                        dash_if_empty(&item.manufacturer),
                        dash_if_empty(&item.component_type),
                        item.quantity.map(|q| q.to_string()).unwrap_or_else(dash),
                        item.matched_sku.clone().unwrap_or_else(dash),
                        fmt_money(item.unit_price),
                        item.origin_country
                            .map(|o| o.to_string())
                            .unwrap_or_else(dash),
                        fmt_money(item.line_total),
                    ]
                })
                .collect(),
        );

        let summary_table = md_table(
            &["Bucket", "Total"],
            vec![
                vec!["Domestic".to_string(), fmt_money(Some(report.summary.domestic_total))],
                vec![
                    "Non-domestic".to_string(),
                    fmt_money(Some(report.summary.non_domestic_total)),
                ],
                vec!["Unknown".to_string(), fmt_money(Some(report.summary.unknown_total))],
            ],
        );

        let mut design_segments = Vec::new();
        if let Some(id) = &report.design_id {
            design_segments.push(format!("Design {}", id));
        }
        if let Some(watts) = report.system_size_watts {
            design_segments.push(format!("{} W", watts));
        }
        if let Some(ppw) = report.price_per_watt {
            design_segments.push(format!("${:.2}/W", ppw));
        }
        let design_line = design_segments.join(" | ");

        let matched_line = format!(
            "{} of {} lines matched to catalog parts.",
            report.matched_count(),
            report.items.len()
        );
        let unpriced_line = if report.summary.unpriced_count > 0 {
            format!(
                "{} line(s) had no computable total (missing price or quantity).",
                report.summary.unpriced_count
            )
        } else {
            String::new()
        };

        let engine = TemplateEngine::new()?;
        let mut context = tera::Context::new();
        context.insert("title", name);
        context.insert("generated_at", &self.generated_at.to_rfc3339());
        context.insert("author", &self.author);
        context.insert("design_line", &design_line);
        context.insert("items_table", &items_table);
        context.insert("summary_table", &summary_table);
        context.insert("matched_line", &matched_line);
        context.insert("unpriced_line", &unpriced_line);
        Ok(engine.render("compare_report.md.tera", &context)?)
    }

    fn credit_markdown(
        &self,
        name: &str,
        report: &EligibilityReport,
    ) -> Result<String, ReportError> {
        let project_table = md_table(
            &["Field", "Value"],
            vec![
                vec![
                    "Installation year".to_string(),
                    report.project.installation_year.to_string(),
                ],
                vec![
                    "Max net output (MW)".to_string(),
                    format!("{}", report.project.max_net_output_mw),
                ],
                vec![
                    "Construction start".to_string(),
                    report
                        .project
                        .construction_start
                        .map(|d| d.to_string())
                        .unwrap_or_else(dash),
                ],
                vec![
                    "Prevailing wage".to_string(),
                    yes_no(report.project.prevailing_wage_compliant),
                ],
                vec![
                    "Project type".to_string(),
                    report.project.project_type.to_string(),
                ],
            ],
        );

        let parts_table = md_table(
            &[
                "SKU",
                "Name",
                "Qty",
                "Unit Price",
                "Classification",
                "Category",
                "Total Value",
                "Domestic %",
                "Domestic Value",
            ],
            report
                .parts
                .iter()
                .map(|p| {
                    vec![
                        p.sku.clone(),
                        dash_if_empty(&p.name),
                        p.quantity.to_string(),
                        fmt_money(p.unit_price),
                        p.classification.to_string(),
                        p.category.to_string(),
                        fmt_money(Some(p.total_value)),
                        fmt_pct(p.domestic_content_pct),
                        fmt_money(Some(p.domestic_value)),
                    ]
                })
                .collect(),
        );

        let content_table = md_table(
            &[
                "Category",
                "Value",
                "Domestic Value",
                "Actual %",
                "Required %",
                "Compliant",
            ],
            vec![
                vec![
                    "Steel/Iron".to_string(),
                    fmt_money(Some(report.steel_iron.value)),
                    fmt_money(Some(report.steel_iron.domestic_value)),
                    fmt_pct(report.steel_iron.actual_pct),
                    fmt_pct(report.steel_iron.required_pct),
                    yes_no(report.steel_iron.compliant),
                ],
                vec![
                    "Manufactured Products".to_string(),
                    fmt_money(Some(report.manufactured_products.value)),
                    fmt_money(Some(report.manufactured_products.domestic_value)),
                    fmt_pct(report.manufactured_products.actual_pct),
                    fmt_pct(report.manufactured_products.required_pct),
                    yes_no(report.manufactured_products.compliant),
                ],
            ],
        );

        let eligibility_line = if report.bonus.eligible {
            format!(
                "Bonus eligibility: eligible ({}).",
                report.bonus.satisfied_paths().join("; ")
            )
        } else {
            "Bonus eligibility: no qualifying path.".to_string()
        };

        let mut credit_rows = vec![
            vec![
                "Equipment value".to_string(),
                fmt_money(Some(report.equipment_value)),
            ],
            vec!["Labor (20%)".to_string(), fmt_money(Some(report.labor_cost))],
            vec![
                "Total project cost".to_string(),
                fmt_money(Some(report.total_project_cost)),
            ],
            vec![
                "Base credit (30%)".to_string(),
                fmt_money(Some(report.base_credit)),
            ],
            vec![
                "Domestic content bonus (10%)".to_string(),
                fmt_money(Some(report.domestic_content_bonus)),
            ],
            vec![
                "Total credit".to_string(),
                fmt_money(Some(report.total_credit)),
            ],
        ];
        if let Some(residential) = report.residential_credit {
            credit_rows.push(vec![
                "Residential credit (separate)".to_string(),
                fmt_money(Some(residential)),
            ]);
        }
        let credits_table = md_table(&["Item", "Amount"], credit_rows);

        let recommendations = report
            .recommendations
            .iter()
            .map(|r| format!("- {}", r))
            .collect::<Vec<_>>()
            .join("\n");

        let engine = TemplateEngine::new()?;
        let mut context = tera::Context::new();
        context.insert("title", name);
        context.insert("generated_at", &self.generated_at.to_rfc3339());
        context.insert("author", &self.author);
        context.insert("requirements", &report.requirements_description);
        context.insert("project_table", &project_table);
        context.insert("parts_table", &parts_table);
        context.insert("content_table", &content_table);
        context.insert("eligibility_line", &eligibility_line);
        context.insert("credits_table", &credits_table);
        context.insert("recommendations", &recommendations);
        Ok(engine.render("credit_report.md.tera", &context)?)
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), ReportError> {
    std::fs::write(path, content).map_err(|e| ReportError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

/// Markdown pipe table with escaped cell text
fn md_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut builder = Builder::default();
    builder.push_record(headers.iter().copied());
    for row in rows {
        builder.push_record(row.iter().map(|c| c.replace('|', "\\|")));
    }
    builder.build().with(Style::markdown()).to_string()
}

fn fmt_money(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("${:.2}", v),
        None => dash(),
    }
}

fn fmt_pct(value: f64) -> String {
    format!("{:.1}%", value)
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}

fn dash() -> String {
    "-".to_string()
}

fn dash_if_empty(s: &str) -> String {
    if s.trim().is_empty() {
        dash()
    } else {
        s.to_string()
    }
}

/// Filename slug: lowercase alphanumerics with single dashes
fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    let out = out.trim_end_matches('-').to_string();
    if out.is_empty() {
        "project".to_string()
    } else {
        out
    }
}
