//! `sst config` command - Configuration management
//!
//! Provides commands to view and modify SST configuration.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::commands::utils::open_workspace;
use crate::cli::GlobalOpts;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show paths to configuration files
    Path(PathArgs),

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,

    /// Show only workspace-level config
    #[arg(long = "project-only")]
    pub project_only: bool,

    /// Show only global (user) config
    #[arg(long = "global-only")]
    pub global_only: bool,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g., author, default_year)
    pub key: String,

    /// Value to set
    pub value: String,

    /// Set in global (user) config instead of workspace config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,

    /// Remove from global (user) config instead of workspace config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct PathArgs {
    /// Show only workspace config path
    #[arg(long = "project-only")]
    pub project_only: bool,

    /// Show only global config path
    #[arg(long = "global-only")]
    pub global_only: bool,
}

/// Valid configuration keys
const VALID_KEYS: &[(&str, &str)] = &[
    ("author", "Author recorded in saved reports"),
    (
        "default_format",
        "Default output format (yaml, json, tsv, csv, md)",
    ),
    (
        "default_year",
        "Installation year assumed when --year is omitted",
    ),
    ("csv_delimiter", "Field delimiter for catalog CSV ingestion"),
];

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Set(args) => run_set(args, global),
        ConfigCommands::Unset(args) => run_unset(args, global),
        ConfigCommands::Path(args) => run_path(args, global),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();

    // If a specific key is requested, show just that value
    if let Some(key) = &args.key {
        if !is_valid_key(key) {
            return Err(miette::miette!(
                help = "run `sst config keys` to list valid keys",
                "unknown configuration key '{}'",
                key
            ));
        }
        match get_config_value(&config, key) {
            Some(v) => println!("{}", v),
            None => return Err(miette::miette!("Key '{}' is not set", key)),
        }
        return Ok(());
    }

    if args.project_only && args.global_only {
        return Err(miette::miette!(
            "Cannot specify both --project-only and --global-only"
        ));
    }

    if args.project_only {
        show_workspace_config(global)?;
    } else if args.global_only {
        show_global_config()?;
    } else {
        // Show merged/effective config
        println!("{}", style("Effective Configuration").bold().underlined());
        println!();

        print_config_value("author", config.author.as_deref());
        print_config_value("default_format", config.default_format.as_deref());
        print_config_value(
            "default_year",
            config.default_year.map(|y| y.to_string()).as_deref(),
        );
        print_config_value("csv_delimiter", config.csv_delimiter.as_deref());

        println!();
        println!("{}", style("Config Sources (in priority order):").dim());
        println!("  1. Environment variables (SST_AUTHOR, SST_FORMAT)");
        println!("  2. Workspace config (.sst/config.yaml)");
        println!("  3. Global config (~/.config/sst/config.yaml)");
    }

    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    if !is_valid_key(&args.key) {
        return Err(miette::miette!(
            help = "run `sst config keys` to list valid keys",
            "unknown configuration key '{}'",
            args.key
        ));
    }

    let config_path = if args.global {
        get_global_config_path()?
    } else {
        get_workspace_config_path(global)?
    };

    let mut config_map = read_config_map(&config_path)?;

    if let serde_yml::Value::Mapping(map) = &mut config_map {
        map.insert(
            serde_yml::Value::String(args.key.clone()),
            yaml_scalar(&args.value),
        );
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }

    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    let scope = if args.global { "global" } else { "workspace" };
    println!(
        "{} Set {} {} {} in {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        style("→").dim(),
        style(&args.value).yellow(),
        scope
    );

    Ok(())
}

fn run_unset(args: UnsetArgs, global: &GlobalOpts) -> Result<()> {
    let config_path = if args.global {
        get_global_config_path()?
    } else {
        get_workspace_config_path(global)?
    };

    if !config_path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            config_path.display()
        ));
    }

    let mut config_map = read_config_map(&config_path)?;

    let removed = if let serde_yml::Value::Mapping(map) = &mut config_map {
        let key = serde_yml::Value::String(args.key.clone());
        map.remove(&key).is_some()
    } else {
        false
    };

    if !removed {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }

    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    let scope = if args.global { "global" } else { "workspace" };
    println!(
        "{} Removed {} from {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        scope
    );

    Ok(())
}

fn run_path(args: PathArgs, global: &GlobalOpts) -> Result<()> {
    if args.project_only && args.global_only {
        return Err(miette::miette!(
            "Cannot specify both --project-only and --global-only"
        ));
    }

    if args.project_only {
        let path = get_workspace_config_path(global)?;
        println!("{}", path.display());
    } else if args.global_only {
        let path = get_global_config_path()?;
        println!("{}", path.display());
    } else {
        let global_path = get_global_config_path()?;
        let workspace_path = get_workspace_config_path(global);

        println!("{}", style("Configuration file paths:").bold());
        println!();
        println!("  {} {}", style("Global:").cyan(), global_path.display());
        if global_path.exists() {
            println!("          {}", style("(exists)").green());
        } else {
            println!("          {}", style("(not created)").dim());
        }

        println!();
        if let Ok(path) = workspace_path {
            println!("  {} {}", style("Workspace:").cyan(), path.display());
            if path.exists() {
                println!("             {}", style("(exists)").green());
            } else {
                println!("             {}", style("(not created)").dim());
            }
        } else {
            println!(
                "  {} {}",
                style("Workspace:").cyan(),
                style("(not in an SST workspace)").dim()
            );
        }
    }

    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();

    for (key, description) in VALID_KEYS {
        println!("  {:<20} {}", style(key).cyan(), style(description).dim());
    }

    println!();
    println!(
        "{}",
        style("Use 'sst config set <key> <value>' to set a value.").dim()
    );

    Ok(())
}

// Helper functions

fn is_valid_key(key: &str) -> bool {
    VALID_KEYS.iter().any(|(k, _)| *k == key)
}

fn get_global_config_path() -> Result<PathBuf> {
    Config::global_config_path()
        .ok_or_else(|| miette::miette!("Could not determine global config directory"))
}

fn get_workspace_config_path(global: &GlobalOpts) -> Result<PathBuf> {
    let workspace = open_workspace(global)?;
    Ok(workspace.sst_dir().join("config.yaml"))
}

fn read_config_map(path: &PathBuf) -> Result<serde_yml::Value> {
    let parsed: serde_yml::Value = if path.exists() {
        let content = fs::read_to_string(path).into_diagnostic()?;
        serde_yml::from_str(&content).unwrap_or(serde_yml::Value::Mapping(Default::default()))
    } else {
        serde_yml::Value::Mapping(Default::default())
    };

    // An empty or null file still has to come back as a mapping
    if parsed.is_null() {
        Ok(serde_yml::Value::Mapping(Default::default()))
    } else {
        Ok(parsed)
    }
}

/// Coerce a raw CLI value to a typed YAML scalar.
///
/// `default_year` has to land as a YAML number; the config loader
/// drops the whole file when a field fails to deserialize.
fn yaml_scalar(raw: &str) -> serde_yml::Value {
    if let Ok(n) = raw.parse::<i64>() {
        return serde_yml::Value::Number(n.into());
    }
    if let Ok(b) = raw.parse::<bool>() {
        return serde_yml::Value::Bool(b);
    }
    serde_yml::Value::String(raw.to_string())
}

fn get_config_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "author" => config.author.clone(),
        "default_format" => config.default_format.clone(),
        "default_year" => config.default_year.map(|y| y.to_string()),
        "csv_delimiter" => config.csv_delimiter.clone(),
        _ => None,
    }
}

fn print_config_value(key: &str, value: Option<&str>) {
    if let Some(v) = value {
        println!("  {}: {}", style(key).cyan(), style(v).yellow());
    } else {
        println!("  {}: {}", style(key).cyan(), style("(not set)").dim());
    }
}

fn show_workspace_config(global: &GlobalOpts) -> Result<()> {
    let path = get_workspace_config_path(global)?;

    println!(
        "{} {}",
        style("Workspace config:").bold(),
        style(path.display()).dim()
    );
    println!();

    if path.exists() {
        let content = fs::read_to_string(&path).into_diagnostic()?;
        print!("{}", content);
    } else {
        println!("{}", style("(not created)").dim());
    }

    Ok(())
}

fn show_global_config() -> Result<()> {
    let path = get_global_config_path()?;

    println!(
        "{} {}",
        style("Global config:").bold(),
        style(path.display()).dim()
    );
    println!();

    if path.exists() {
        let content = fs::read_to_string(&path).into_diagnostic()?;
        print!("{}", content);
    } else {
        println!("{}", style("(not created)").dim());
    }

    Ok(())
}
