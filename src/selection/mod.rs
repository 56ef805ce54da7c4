//! Selection files - saved part picks plus project facts
//!
//! A selection is a small YAML file the sales workflow edits by hand or
//! scaffolds with `selection new`. Files are schema-validated before they
//! are trusted, then resolved against the catalog into the engine's input
//! types. Validation failures come back as miette diagnostics pointing at
//! the offending keys.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{NaiveDate, Utc};
use jsonschema::{validator_for, ValidationError as JsonSchemaError, Validator as JsonValidator};
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use walkdir::WalkDir;

use crate::catalog::{CatalogError, PartCatalog};
use crate::core::templates::{TemplateEngine, TemplateError};
use crate::credit::{FeocClassification, ProjectContext, ProjectType, SelectedPart};

static SELECTION_SCHEMA: &str = include_str!("../../schemas/selection.schema.json");
static COMPILED_SCHEMA: OnceLock<JsonValidator> = OnceLock::new();

fn schema() -> &'static JsonValidator {
    COMPILED_SCHEMA.get_or_init(|| {
        let value: serde_json::Value =
            serde_json::from_str(SELECTION_SCHEMA).expect("embedded selection schema is valid JSON");
        validator_for(&value).expect("embedded selection schema compiles")
    })
}

/// On-disk selection file shape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSection>,
    #[serde(default)]
    pub parts: Vec<SelectionPart>,
}

/// Project facts as written in the file; every field optional, defaults
/// applied when converting to a [`ProjectContext`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_net_output_mw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construction_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prevailing_wage_compliant: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<ProjectType>,
}

impl ProjectSection {
    /// Fill gaps with defaults: the given year, zero output, no wage
    /// attestation, commercial schedule.
    pub fn to_context(&self, default_year: i32) -> ProjectContext {
        ProjectContext {
            installation_year: self.installation_year.unwrap_or(default_year),
            max_net_output_mw: self.max_net_output_mw.unwrap_or(0.0),
            construction_start: self.construction_start,
            prevailing_wage_compliant: self.prevailing_wage_compliant.unwrap_or(false),
            project_type: self.project_type.unwrap_or(ProjectType::Commercial),
        }
    }
}

/// One part pick in the file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionPart {
    pub sku: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Classification override; catalog origin decides when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<FeocClassification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domestic_content_pct: Option<f64>,
}

fn default_quantity() -> u32 {
    1
}

/// Errors from loading, validating, or resolving a selection
#[derive(Debug, Error, Diagnostic)]
pub enum SelectionError {
    #[error("cannot read selection file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("selection file failed validation: {summary}")]
    #[diagnostic(code(sst::selection::invalid))]
    Invalid {
        summary: String,
        #[source_code]
        src: NamedSource<String>,
        #[related]
        violations: Vec<SelectionViolation>,
    },

    #[error("selection file is not valid YAML: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("unknown sku(s) in selection: {}", skus.join(", "))]
    #[diagnostic(help("run `sst search <term>` to find the catalog sku, or ingest the part first"))]
    UnknownSkus { skus: Vec<String> },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// A single schema violation with a source location
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct SelectionViolation {
    #[label("{}", self.hint)]
    span: SourceSpan,

    message: String,
    hint: String,

    #[help]
    help: Option<String>,
}

/// Read and validate a selection file, then deserialize it.
pub fn load(path: &Path) -> Result<SelectionFile, SelectionError> {
    let content = std::fs::read_to_string(path).map_err(|e| SelectionError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let filename = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    validate(&content, &filename)?;
    Ok(serde_yml::from_str(&content)?)
}

/// Validate selection YAML against the embedded schema, reporting every
/// violation with a best-effort source span.
pub fn validate(content: &str, filename: &str) -> Result<(), SelectionError> {
    let yaml_value: serde_yml::Value = match serde_yml::from_str(content) {
        Ok(v) => v,
        Err(e) => {
            let span = location_span(content, e.location());
            let violation = SelectionViolation {
                span,
                message: format!("YAML parse error: {}", e),
                hint: "invalid YAML".to_string(),
                help: Some("check indentation, colons, and quoting".to_string()),
            };
            return Err(invalid(filename, content, vec![violation]));
        }
    };

    let json_value: serde_json::Value = match serde_json::to_value(&yaml_value) {
        Ok(v) => v,
        Err(e) => {
            let violation = SelectionViolation {
                span: (0, content.len().max(1)).into(),
                message: format!("cannot convert YAML for validation: {}", e),
                hint: "conversion error".to_string(),
                help: None,
            };
            return Err(invalid(filename, content, vec![violation]));
        }
    };

    let violations: Vec<SelectionViolation> = schema()
        .iter_errors(&json_value)
        .map(|e| to_violation(content, &e))
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(invalid(filename, content, violations))
    }
}

/// Resolve file entries against the catalog into engine inputs. Unknown
/// skus are collected and reported together rather than one at a time.
pub fn resolve<C: PartCatalog>(
    file: &SelectionFile,
    catalog: &C,
) -> Result<Vec<SelectedPart>, SelectionError> {
    let mut parts = Vec::with_capacity(file.parts.len());
    let mut unknown = Vec::new();

    for entry in &file.parts {
        match catalog.find_by_sku(&entry.sku)? {
            Some(part) => {
                let classification = entry
                    .classification
                    .unwrap_or_else(|| FeocClassification::from_origin(part.origin_country));
                parts.push(SelectedPart {
                    sku: part.sku,
                    name: part.name,
                    quantity: entry.quantity,
                    unit_price: part.unit_price,
                    classification,
                    domestic_content_pct: entry.domestic_content_pct,
                });
            }
            None => unknown.push(entry.sku.clone()),
        }
    }

    if !unknown.is_empty() {
        return Err(SelectionError::UnknownSkus { skus: unknown });
    }
    Ok(parts)
}

/// A pre-filled part row for scaffolded selections
#[derive(Debug, Clone, Serialize)]
pub struct ScaffoldPart {
    pub sku: String,
    pub quantity: u32,
}

/// Render a fresh selection file body for `selection new`. With an empty
/// `parts` slice the template emits commented example rows instead.
pub fn scaffold(name: &str, year: i32, parts: &[ScaffoldPart]) -> Result<String, SelectionError> {
    let engine = TemplateEngine::new()?;
    let mut context = tera::Context::new();
    context.insert("name", name);
    context.insert("year", &year);
    context.insert("parts", parts);
    context.insert("created_date", &Utc::now().format("%Y-%m-%d").to_string());
    Ok(engine.render("selection.yaml.tera", &context)?)
}

/// Selection files under a directory, sorted by path
pub fn list_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            )
        })
        .collect();
    files.sort();
    files
}

fn invalid(filename: &str, content: &str, violations: Vec<SelectionViolation>) -> SelectionError {
    let summary = if violations.len() == 1 {
        "1 error".to_string()
    } else {
        format!("{} errors", violations.len())
    };
    SelectionError::Invalid {
        summary,
        src: NamedSource::new(filename, content.to_string()),
        violations,
    }
}

fn to_violation(content: &str, error: &JsonSchemaError) -> SelectionViolation {
    let path = error.instance_path.to_string();
    let (message, hint, help) = describe_error(error);
    SelectionViolation {
        span: path_span(content, &path),
        message,
        hint,
        help,
    }
}

fn describe_error(error: &JsonSchemaError) -> (String, String, Option<String>) {
    use jsonschema::error::ValidationErrorKind;

    let at = if error.instance_path.as_str().is_empty() {
        "document root".to_string()
    } else {
        format!("'{}'", error.instance_path)
    };

    match &error.kind {
        ValidationErrorKind::Required { property } => {
            let name = property
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| property.to_string());
            (
                format!("missing required field {} at {}", name, at),
                "required field missing".to_string(),
                Some(format!("add the '{}' field", name)),
            )
        }
        ValidationErrorKind::Type { kind } => (
            format!("wrong type at {}: expected {:?}", at, kind),
            "wrong type".to_string(),
            None,
        ),
        ValidationErrorKind::Enum { options } => {
            let opts = options
                .as_array()
                .map(|arr| {
                    arr.iter()
                        .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_else(|| options.to_string());
            (
                format!("invalid value at {}", at),
                "invalid value".to_string(),
                Some(format!("valid values: {}", opts)),
            )
        }
        ValidationErrorKind::Minimum { limit } => (
            format!("value at {} is below the minimum {}", at, limit),
            "too small".to_string(),
            None,
        ),
        ValidationErrorKind::Maximum { limit } => (
            format!("value at {} exceeds the maximum {}", at, limit),
            "too large".to_string(),
            None,
        ),
        ValidationErrorKind::MinLength { limit } => (
            format!("value at {} is too short: minimum {} characters", at, limit),
            "too short".to_string(),
            None,
        ),
        ValidationErrorKind::Pattern { pattern } => (
            format!("value at {} does not match pattern {}", at, pattern),
            "pattern mismatch".to_string(),
            if pattern.contains("\\d{4}") {
                Some("dates are written YYYY-MM-DD".to_string())
            } else {
                None
            },
        ),
        ValidationErrorKind::AdditionalProperties { unexpected } => (
            format!("unknown field(s) at {}: {}", at, unexpected.join(", ")),
            "unknown field".to_string(),
            Some("remove the field or check its spelling".to_string()),
        ),
        _ => (
            format!("validation error at {}: {}", at, error),
            "validation error".to_string(),
            None,
        ),
    }
}

/// Byte span for a YAML parse error location
fn location_span(content: &str, location: Option<serde_yml::Location>) -> SourceSpan {
    if let Some(loc) = location {
        let line = loc.line().saturating_sub(1);
        let column = loc.column().saturating_sub(1);

        let mut offset = 0;
        for (i, line_content) in content.lines().enumerate() {
            if i == line {
                offset += column;
                break;
            }
            offset += line_content.len() + 1;
        }

        let rest = &content[offset.min(content.len())..];
        let len = rest.find('\n').unwrap_or(rest.len()).max(1);
        (offset, len).into()
    } else {
        let len = content.find('\n').unwrap_or(content.len()).max(1);
        (0, len).into()
    }
}

/// Best-effort span for a JSON instance path, by searching for the last
/// path component as a YAML key.
fn path_span(content: &str, json_path: &str) -> SourceSpan {
    let parts: Vec<&str> = json_path.split('/').filter(|s| !s.is_empty()).collect();

    // Array indices point back at their parent key.
    let search_key = parts
        .iter()
        .rev()
        .find(|part| part.parse::<usize>().is_err());

    if let Some(key) = search_key {
        if let Some(span) = key_span(content, key) {
            return span;
        }
    }

    let len = content.find('\n').unwrap_or(content.len()).max(1);
    (0, len).into()
}

fn key_span(content: &str, key: &str) -> Option<SourceSpan> {
    let pattern = format!("{}:", key);

    let mut offset = 0;
    for line in content.lines() {
        let trimmed = line.trim_start();
        let stripped = trimmed.strip_prefix("- ").unwrap_or(trimmed);
        if stripped.starts_with(&pattern) {
            let key_start = offset + (line.len() - trimmed.len());
            return Some((key_start, trimmed.len()).into());
        }
        offset += line.len() + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{OriginCountry, Part, SqliteCatalog};
    use tempfile::tempdir;

    fn seeded_catalog() -> (tempfile::TempDir, SqliteCatalog) {
        let tmp = tempdir().unwrap();
        let catalog = SqliteCatalog::open(&tmp.path().join("catalog.db")).unwrap();

        let mut module = Part::new("PVL-450", "450W Module");
        module.unit_price = Some(210.0);
        module.origin_country = OriginCountry::Us;
        module.is_domestic = Some(true);
        catalog.upsert_part(&module).unwrap();

        let mut inverter = Part::new("INV-7600", "7.6kW Inverter");
        inverter.unit_price = Some(1950.0);
        inverter.origin_country = OriginCountry::Nonus;
        inverter.is_domestic = Some(false);
        catalog.upsert_part(&inverter).unwrap();

        (tmp, catalog)
    }

    const VALID_SELECTION: &str = r#"
project:
  name: "Smith Residence"
  installation_year: 2025
  max_net_output_mw: 0.012
  prevailing_wage_compliant: false
  project_type: residential

parts:
  - sku: PVL-450
    quantity: 24
  - sku: INV-7600
"#;

    #[test]
    fn test_valid_file_passes_and_parses() {
        validate(VALID_SELECTION, "smith.yaml").unwrap();
        let file: SelectionFile = serde_yml::from_str(VALID_SELECTION).unwrap();

        assert_eq!(file.parts.len(), 2);
        assert_eq!(file.parts[0].quantity, 24);
        // Quantity defaults to 1 when omitted.
        assert_eq!(file.parts[1].quantity, 1);

        let project = file.project.unwrap();
        assert_eq!(project.installation_year, Some(2025));
        assert_eq!(project.project_type, Some(ProjectType::Residential));
    }

    #[test]
    fn test_resolve_derives_classification_from_origin() {
        let (_tmp, catalog) = seeded_catalog();
        let file: SelectionFile = serde_yml::from_str(VALID_SELECTION).unwrap();

        let parts = resolve(&file, &catalog).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].classification, FeocClassification::Domestic);
        assert_eq!(parts[0].unit_price, Some(210.0));
        assert_eq!(parts[1].classification, FeocClassification::OtherForeign);
    }

    #[test]
    fn test_resolve_honors_classification_override() {
        let (_tmp, catalog) = seeded_catalog();
        let yaml = r#"
parts:
  - sku: INV-7600
    classification: china
    domestic_content_pct: 15
"#;
        validate(yaml, "override.yaml").unwrap();
        let file: SelectionFile = serde_yml::from_str(yaml).unwrap();

        let parts = resolve(&file, &catalog).unwrap();
        assert_eq!(parts[0].classification, FeocClassification::China);
        assert_eq!(parts[0].domestic_content_pct, Some(15.0));
    }

    #[test]
    fn test_resolve_reports_all_unknown_skus() {
        let (_tmp, catalog) = seeded_catalog();
        let yaml = r#"
parts:
  - sku: GHOST-1
  - sku: PVL-450
  - sku: GHOST-2
"#;
        let file: SelectionFile = serde_yml::from_str(yaml).unwrap();
        let err = resolve(&file, &catalog).unwrap_err();
        match err {
            SelectionError::UnknownSkus { skus } => {
                assert_eq!(skus, vec!["GHOST-1".to_string(), "GHOST-2".to_string()]);
            }
            other => panic!("expected UnknownSkus, got {:?}", other),
        }
    }

    #[test]
    fn test_schema_rejects_part_without_sku() {
        let yaml = "parts:\n  - quantity: 3\n";
        let err = validate(yaml, "bad.yaml").unwrap_err();
        assert!(matches!(err, SelectionError::Invalid { .. }));
    }

    #[test]
    fn test_schema_rejects_zero_quantity() {
        let yaml = "parts:\n  - sku: PVL-450\n    quantity: 0\n";
        let err = validate(yaml, "bad.yaml").unwrap_err();
        assert!(err.to_string().contains("1 error"));
    }

    #[test]
    fn test_schema_rejects_unknown_fields() {
        let yaml = "parts: []\nextras: true\n";
        let err = validate(yaml, "bad.yaml").unwrap_err();
        assert!(matches!(err, SelectionError::Invalid { .. }));
    }

    #[test]
    fn test_schema_rejects_bad_classification() {
        let yaml = "parts:\n  - sku: X\n    classification: martian\n";
        let err = validate(yaml, "bad.yaml").unwrap_err();
        assert!(matches!(err, SelectionError::Invalid { .. }));
    }

    #[test]
    fn test_unparseable_yaml_reports_location() {
        let yaml = "parts:\n  - sku: [unclosed\n";
        let err = validate(yaml, "broken.yaml").unwrap_err();
        assert!(matches!(err, SelectionError::Invalid { .. }));
    }

    #[test]
    fn test_scaffold_round_trips_through_validation() {
        let body = scaffold("Jones Farm", 2026, &[]).unwrap();
        validate(&body, "jones-farm.yaml").unwrap();

        let file: SelectionFile = serde_yml::from_str(&body).unwrap();
        assert!(file.parts.is_empty());
        let project = file.project.unwrap();
        assert_eq!(project.name.as_deref(), Some("Jones Farm"));
        assert_eq!(project.installation_year, Some(2026));
    }

    #[test]
    fn test_scaffold_with_prefilled_parts() {
        let picks = vec![
            ScaffoldPart {
                sku: "PVL-450".to_string(),
                quantity: 24,
            },
            ScaffoldPart {
                sku: "INV-7600".to_string(),
                quantity: 1,
            },
        ];
        let body = scaffold("Jones Farm", 2026, &picks).unwrap();
        validate(&body, "jones-farm.yaml").unwrap();

        let file: SelectionFile = serde_yml::from_str(&body).unwrap();
        assert_eq!(file.parts.len(), 2);
        assert_eq!(file.parts[0].sku, "PVL-450");
        assert_eq!(file.parts[0].quantity, 24);
        assert_eq!(file.parts[1].quantity, 1);
    }

    #[test]
    fn test_project_context_defaults() {
        let section = ProjectSection::default();
        let ctx = section.to_context(2027);
        assert_eq!(ctx.installation_year, 2027);
        assert_eq!(ctx.max_net_output_mw, 0.0);
        assert!(ctx.construction_start.is_none());
        assert!(!ctx.prevailing_wage_compliant);
        assert_eq!(ctx.project_type, ProjectType::Commercial);
    }

    #[test]
    fn test_list_files_filters_and_sorts() {
        let tmp = tempdir().unwrap();
        std::fs::write(tmp.path().join("b.yaml"), "parts: []").unwrap();
        std::fs::write(tmp.path().join("a.yml"), "parts: []").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "not a selection").unwrap();

        let files = list_files(tmp.path());
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.yml", "b.yaml"]);
    }
}
