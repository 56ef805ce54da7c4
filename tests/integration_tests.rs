//! Integration tests for the SST CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to get an sst command
fn sst() -> Command {
    Command::cargo_bin("sst").unwrap()
}

/// Helper to create an empty workspace in a temp directory
fn setup_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    sst().current_dir(tmp.path()).arg("init").assert().success();
    tmp
}

/// Helper to create a workspace seeded with the demo catalog and mappings
fn setup_demo_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    sst()
        .current_dir(tmp.path())
        .args(["init", "--demo"])
        .assert()
        .success();
    tmp
}

/// Vendor pricing payload whose first three lines hit the demo mappings
const SMITH_PRICING: &str = r#"{
  "design_id": "dsn_smith_01",
  "system_size_watts": 10800.0,
  "price_per_watt": 2.61,
  "pricing_by_component": [
    {"name": "Q.PEAK DUO XL 450", "manufacturer_name": "Hanwha Qcells", "component_type": "modules", "quantity": 24},
    {"name": "IQ8+ Microinverter", "manufacturer_name": "Enphase Energy", "component_type": "inverters", "quantity": 24},
    {"name": "XR100 168\" Rail", "manufacturer_name": "IronRidge", "component_type": "racking", "quantity": 12},
    {"name": "Mystery Widget", "manufacturer_name": "Nobody", "component_type": "bos", "quantity": 2}
  ]
}"#;

/// Selection over demo catalog parts, project facts filled in
const SMITH_SELECTION: &str = "\
project:
  name: Smith Residence
  installation_year: 2025
  max_net_output_mw: 0.0108
  prevailing_wage_compliant: false
  project_type: residential
parts:
  - sku: PVL-450
    quantity: 24
  - sku: INV-7600
    quantity: 24
  - sku: RAIL-168
    quantity: 12
";

fn write_pricing(tmp: &TempDir, design: &str, payload: &str) {
    fs::write(
        tmp.path().join("pricing").join(format!("{}.json", design)),
        payload,
    )
    .unwrap();
}

fn write_selection(tmp: &TempDir, name: &str, content: &str) {
    fs::write(
        tmp.path().join("selections").join(format!("{}.yaml", name)),
        content,
    )
    .unwrap();
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    sst()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Solar Sales Toolkit"));
}

#[test]
fn test_version_displays() {
    sst()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sst"));
}

#[test]
fn test_unknown_command_fails() {
    sst()
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

// ============================================================================
// Init Command Tests
// ============================================================================

#[test]
fn test_init_creates_workspace_structure() {
    let tmp = TempDir::new().unwrap();

    sst()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized SST workspace"));

    // Verify structure
    assert!(tmp.path().join(".sst").is_dir());
    assert!(tmp.path().join(".sst/config.yaml").exists());
    assert!(tmp.path().join(".sst/catalog.db").exists());
    assert!(tmp.path().join("pricing").is_dir());
    assert!(tmp.path().join("selections").is_dir());
    assert!(tmp.path().join("reports").is_dir());
}

#[test]
fn test_init_twice_warns_without_failing() {
    let tmp = setup_workspace();

    sst()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_init_force_reinitializes() {
    let tmp = setup_workspace();

    sst()
        .current_dir(tmp.path())
        .args(["init", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized SST workspace"));
}

#[test]
fn test_init_demo_seeds_catalog() {
    let tmp = TempDir::new().unwrap();

    sst()
        .current_dir(tmp.path())
        .args(["init", "--demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Seeded demo catalog"));

    sst()
        .current_dir(tmp.path())
        .args(["part", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PVL-450"));
}

// ============================================================================
// Ingest Command Tests
// ============================================================================

const SMALL_CSV: &str = "\
sku,name,brand,type,price,domestic,weight,notes
TST-100,Test Panel 400W,Acme Solar,module,150.00,D,50.0,
TST-200,Test Inverter,Acme Power,inverter,89.00,ND,3.2,
";

#[test]
fn test_ingest_imports_csv() {
    let tmp = setup_workspace();
    let csv = tmp.path().join("vendor.csv");
    fs::write(&csv, SMALL_CSV).unwrap();

    sst()
        .current_dir(tmp.path())
        .args(["ingest", "vendor.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported"))
        .stdout(predicate::str::contains("2 created, 0 updated, 0 skipped"));

    sst()
        .current_dir(tmp.path())
        .args(["search", "acme"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TST-100"))
        .stdout(predicate::str::contains("TST-200"));
}

#[test]
fn test_ingest_dry_run_writes_nothing() {
    let tmp = setup_workspace();
    let csv = tmp.path().join("vendor.csv");
    fs::write(&csv, SMALL_CSV).unwrap();

    sst()
        .current_dir(tmp.path())
        .args(["ingest", "vendor.csv", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Dry run: validated 2 row(s), nothing written",
        ));

    sst()
        .current_dir(tmp.path())
        .args(["part", "list", "--format", "id"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TST-100").not());
}

#[test]
fn test_ingest_same_file_twice_is_skipped() {
    let tmp = setup_workspace();
    let csv = tmp.path().join("vendor.csv");
    fs::write(&csv, SMALL_CSV).unwrap();

    sst()
        .current_dir(tmp.path())
        .args(["ingest", "vendor.csv"])
        .assert()
        .success();

    sst()
        .current_dir(tmp.path())
        .args(["ingest", "vendor.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is unchanged since the last import"))
        .stdout(predicate::str::contains("--force"));
}

#[test]
fn test_ingest_force_reimports() {
    let tmp = setup_workspace();
    let csv = tmp.path().join("vendor.csv");
    fs::write(&csv, SMALL_CSV).unwrap();

    sst()
        .current_dir(tmp.path())
        .args(["ingest", "vendor.csv"])
        .assert()
        .success();

    sst()
        .current_dir(tmp.path())
        .args(["ingest", "vendor.csv", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 created, 2 updated, 0 skipped"));
}

#[test]
fn test_ingest_reports_skipped_rows() {
    let tmp = setup_workspace();
    let csv = tmp.path().join("vendor.csv");
    fs::write(
        &csv,
        "sku,name,brand,type,price,domestic,weight,notes\n\
         TST-100,Test Panel,Acme,module,150.00,D,,\n\
         ,Orphan Row,Acme,module,9.00,D,,\n",
    )
    .unwrap();

    sst()
        .current_dir(tmp.path())
        .args(["ingest", "vendor.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 created, 0 updated, 1 skipped"))
        .stdout(predicate::str::contains("row 3"))
        .stdout(predicate::str::contains("missing required field 'sku'"));
}

#[test]
fn test_ingest_template_prints_starter_csv() {
    sst()
        .args(["ingest", "--template"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "sku,name,brand,type,price,domestic,weight,notes",
        ));
}

#[test]
fn test_ingest_missing_file_fails() {
    let tmp = setup_workspace();

    sst()
        .current_dir(tmp.path())
        .args(["ingest", "ghost.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost.csv"));
}

// ============================================================================
// Search Command Tests
// ============================================================================

#[test]
fn test_search_finds_demo_parts() {
    let tmp = setup_demo_workspace();

    sst()
        .current_dir(tmp.path())
        .args(["search", "qcells"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PVL-450"));
}

#[test]
fn test_search_empty_query_lists_everything() {
    let tmp = setup_demo_workspace();

    sst()
        .current_dir(tmp.path())
        .arg("search")
        .assert()
        .success()
        .stdout(predicate::str::contains("11 part(s) matched"));
}

#[test]
fn test_search_id_format_prints_skus_only() {
    let tmp = setup_demo_workspace();

    sst()
        .current_dir(tmp.path())
        .args(["search", "qcells", "--format", "id"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PVL-450"))
        .stdout(predicate::str::contains("SKU").not());
}

#[test]
fn test_search_paginates() {
    let tmp = setup_demo_workspace();

    sst()
        .current_dir(tmp.path())
        .args(["search", "--page-size", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("page 1 of 4"));

    sst()
        .current_dir(tmp.path())
        .args(["search", "--page-size", "3", "--page", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("page 4 of 4"));
}

// ============================================================================
// Part Command Tests
// ============================================================================

#[test]
fn test_part_show_defaults_to_yaml() {
    let tmp = setup_demo_workspace();

    sst()
        .current_dir(tmp.path())
        .args(["part", "show", "PVL-450"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sku: PVL-450"))
        .stdout(predicate::str::contains("Q.PEAK"));
}

#[test]
fn test_part_show_unknown_sku_fails() {
    let tmp = setup_demo_workspace();

    sst()
        .current_dir(tmp.path())
        .args(["part", "show", "GHOST-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no part with sku"));
}

#[test]
fn test_part_list_reports_catalog_counts() {
    let tmp = setup_demo_workspace();

    sst()
        .current_dir(tmp.path())
        .args(["part", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("11 part(s) in catalog"))
        .stdout(predicate::str::contains("3 mapping(s)"));
}

// ============================================================================
// Map Command Tests
// ============================================================================

#[test]
fn test_map_add_and_list() {
    let tmp = setup_demo_workspace();

    sst()
        .current_dir(tmp.path())
        .args([
            "map", "add", "-n", "Powerwall 3", "-m", "Tesla", "-s", "BATT-10K",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mapped"));

    sst()
        .current_dir(tmp.path())
        .args(["map", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Powerwall 3"))
        .stdout(predicate::str::contains("BATT-10K"));
}

#[test]
fn test_map_add_unknown_sku_warns() {
    let tmp = setup_demo_workspace();

    sst()
        .current_dir(tmp.path())
        .args([
            "map", "add", "-n", "Future Part", "-m", "Someone", "-s", "NEW-999",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("not in the catalog yet"));
}

#[test]
fn test_map_remove_deletes_mapping() {
    let tmp = setup_demo_workspace();

    sst()
        .current_dir(tmp.path())
        .args(["map", "remove", "-n", "IQ8+ Microinverter", "-m", "Enphase Energy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed mapping"));

    sst()
        .current_dir(tmp.path())
        .args(["map", "remove", "-n", "IQ8+ Microinverter", "-m", "Enphase Energy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no mapping for"));
}

// ============================================================================
// Compare Command Tests
// ============================================================================

#[test]
fn test_compare_joins_catalog_and_pricing() {
    let tmp = setup_demo_workspace();
    write_pricing(&tmp, "smith-roof", SMITH_PRICING);

    sst()
        .current_dir(tmp.path())
        .args(["compare", "smith-roof"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Design dsn_smith_01"))
        .stdout(predicate::str::contains("PVL-450"))
        .stdout(predicate::str::contains("3 of 4 line(s) matched to catalog parts"))
        .stdout(predicate::str::contains("Domestic $5622.00"))
        .stdout(predicate::str::contains("Non-domestic $4296.00"))
        .stdout(predicate::str::contains(
            "1 line(s) had no computable total",
        ));
}

#[test]
fn test_compare_unknown_design_fails() {
    let tmp = setup_demo_workspace();

    sst()
        .current_dir(tmp.path())
        .args(["compare", "ghost-design"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no pricing payload found"));
}

#[test]
fn test_compare_json_is_machine_readable() {
    let tmp = setup_demo_workspace();
    write_pricing(&tmp, "smith-roof", SMITH_PRICING);

    sst()
        .current_dir(tmp.path())
        .args(["compare", "smith-roof", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"matched_sku\": \"PVL-450\""))
        .stdout(predicate::str::contains("\"design_id\": \"dsn_smith_01\""));
}

#[test]
fn test_compare_save_writes_report_pair() {
    let tmp = setup_demo_workspace();
    write_pricing(&tmp, "smith-roof", SMITH_PRICING);

    sst()
        .current_dir(tmp.path())
        .args(["compare", "smith-roof", "--save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved"));

    let saved: Vec<_> = fs::read_dir(tmp.path().join("reports"))
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(saved.len(), 2);
    assert!(saved.iter().all(|name| name.contains("-compare-")));
    assert!(saved.iter().any(|name| name.ends_with(".json")));
    assert!(saved.iter().any(|name| name.ends_with(".md")));
}

// ============================================================================
// Credit Command Tests
// ============================================================================

#[test]
fn test_credit_assesses_selection() {
    let tmp = setup_demo_workspace();
    write_selection(&tmp, "smith", SMITH_SELECTION);

    sst()
        .current_dir(tmp.path())
        .args(["credit", "smith"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Installation year"))
        .stdout(predicate::str::contains("Base credit (30%)"))
        .stdout(predicate::str::contains("Total credit"));
}

#[test]
fn test_credit_accepts_file_path() {
    let tmp = setup_demo_workspace();
    write_selection(&tmp, "smith", SMITH_SELECTION);

    sst()
        .current_dir(tmp.path())
        .args(["credit", "selections/smith.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total credit"));
}

#[test]
fn test_credit_unknown_selection_fails() {
    let tmp = setup_demo_workspace();

    sst()
        .current_dir(tmp.path())
        .args(["credit", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no selection found for"));
}

#[test]
fn test_credit_unknown_sku_fails() {
    let tmp = setup_demo_workspace();
    write_selection(&tmp, "bad", "parts:\n  - sku: GHOST-1\n    quantity: 2\n");

    sst()
        .current_dir(tmp.path())
        .args(["credit", "bad"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown sku(s) in selection"));
}

#[test]
fn test_credit_year_flag_overrides_file() {
    let tmp = setup_demo_workspace();
    write_selection(&tmp, "smith", SMITH_SELECTION);

    sst()
        .current_dir(tmp.path())
        .args(["credit", "smith", "--year", "2031", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"installation_year\": 2031"));
}

#[test]
fn test_credit_rejects_bad_date_flag() {
    let tmp = setup_demo_workspace();
    write_selection(&tmp, "smith", SMITH_SELECTION);

    sst()
        .current_dir(tmp.path())
        .args(["credit", "smith", "--construction-start", "not-a-date"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("YYYY-MM-DD"));
}

#[test]
fn test_credit_save_writes_report_pair() {
    let tmp = setup_demo_workspace();
    write_selection(&tmp, "smith", SMITH_SELECTION);

    sst()
        .current_dir(tmp.path())
        .args(["credit", "smith", "--save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved"));

    let saved: Vec<_> = fs::read_dir(tmp.path().join("reports"))
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(saved.len(), 2);
    assert!(saved.iter().all(|name| name.contains("-credit-")));
}

// ============================================================================
// Selection Command Tests
// ============================================================================

#[test]
fn test_selection_new_scaffolds_file() {
    let tmp = setup_workspace();

    sst()
        .current_dir(tmp.path())
        .args(["selection", "new", "jones"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created selection"));

    let content = fs::read_to_string(tmp.path().join("selections/jones.yaml")).unwrap();
    assert!(content.contains("parts:"));
    assert!(content.contains("project:"));
}

#[test]
fn test_selection_new_refuses_existing_name() {
    let tmp = setup_workspace();

    sst()
        .current_dir(tmp.path())
        .args(["selection", "new", "jones"])
        .assert()
        .success();

    sst()
        .current_dir(tmp.path())
        .args(["selection", "new", "jones"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_selection_new_from_design_prefills_parts() {
    let tmp = setup_demo_workspace();
    write_pricing(&tmp, "smith-roof", SMITH_PRICING);

    sst()
        .current_dir(tmp.path())
        .args(["selection", "new", "smith", "--from-design", "smith-roof"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 part(s) pre-filled"));

    let content = fs::read_to_string(tmp.path().join("selections/smith.yaml")).unwrap();
    assert!(content.contains("PVL-450"));
    assert!(content.contains("INV-7600"));
    assert!(content.contains("RAIL-168"));
}

#[test]
fn test_selection_list_shows_overview() {
    let tmp = setup_demo_workspace();
    write_selection(&tmp, "smith", SMITH_SELECTION);

    sst()
        .current_dir(tmp.path())
        .args(["selection", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("smith.yaml"))
        .stdout(predicate::str::contains("Smith Residence"))
        .stdout(predicate::str::contains("selection file(s)"));
}

#[test]
fn test_selection_validate_accepts_valid_file() {
    let tmp = setup_demo_workspace();
    write_selection(&tmp, "smith", SMITH_SELECTION);

    sst()
        .current_dir(tmp.path())
        .args(["selection", "validate", "selections/smith.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 file(s) passed"));
}

#[test]
fn test_selection_validate_rejects_invalid_file() {
    let tmp = setup_demo_workspace();
    // quantity must be an integer >= 1
    write_selection(&tmp, "bad", "parts:\n  - sku: PVL-450\n    quantity: 0\n");

    sst()
        .current_dir(tmp.path())
        .args(["selection", "validate", "selections/bad.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 of 1 file(s) failed validation"));
}

// ============================================================================
// Config Command Tests
// ============================================================================

#[test]
fn test_config_set_and_show_roundtrip() {
    let tmp = setup_workspace();

    sst()
        .current_dir(tmp.path())
        .args(["config", "set", "default_year", "2026"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set"));

    sst()
        .current_dir(tmp.path())
        .args(["config", "show", "default_year"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2026"));
}

#[test]
fn test_config_keys_lists_known_keys() {
    sst()
        .args(["config", "keys"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default_year"))
        .stdout(predicate::str::contains("csv_delimiter"));
}

#[test]
fn test_config_rejects_unknown_key() {
    let tmp = setup_workspace();

    sst()
        .current_dir(tmp.path())
        .args(["config", "set", "not_a_key", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown configuration key"));
}

// ============================================================================
// Workspace Discovery Tests
// ============================================================================

#[test]
fn test_commands_require_workspace() {
    let tmp = TempDir::new().unwrap();

    sst()
        .current_dir(tmp.path())
        .arg("search")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not an SST workspace"));
}

#[test]
fn test_project_flag_selects_workspace() {
    let ws = setup_demo_workspace();
    let elsewhere = TempDir::new().unwrap();

    sst()
        .current_dir(elsewhere.path())
        .args(["search", "qcells", "--project"])
        .arg(ws.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("PVL-450"));
}

// ============================================================================
// Completions Command Tests
// ============================================================================

#[test]
fn test_completions_generate_bash_script() {
    sst()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sst"));
}
