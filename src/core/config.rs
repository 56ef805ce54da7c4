//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::PathBuf;

use crate::core::Workspace;

/// SST configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Author recorded in exported reports
    pub author: Option<String>,

    /// Default output format
    pub default_format: Option<String>,

    /// Default installation year for credit estimates
    pub default_year: Option<i32>,

    /// Delimiter for catalog CSV ingestion
    pub csv_delimiter: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/sst/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                if let Ok(contents) = std::fs::read_to_string(&global_path) {
                    if let Ok(global) = serde_yml::from_str::<Config>(&contents) {
                        config.merge(global);
                    }
                }
            }
        }

        // 3. Workspace config (.sst/config.yaml)
        if let Ok(ws) = Workspace::discover() {
            let ws_config_path = ws.sst_dir().join("config.yaml");
            if ws_config_path.exists() {
                if let Ok(contents) = std::fs::read_to_string(&ws_config_path) {
                    if let Ok(ws_config) = serde_yml::from_str::<Config>(&contents) {
                        config.merge(ws_config);
                    }
                }
            }
        }

        // 4. Environment variables
        if let Ok(author) = std::env::var("SST_AUTHOR") {
            config.author = Some(author);
        }
        if let Ok(format) = std::env::var("SST_FORMAT") {
            config.default_format = Some(format);
        }

        config
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "sst")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.default_year.is_some() {
            self.default_year = other.default_year;
        }
        if other.csv_delimiter.is_some() {
            self.csv_delimiter = other.csv_delimiter;
        }
    }

    /// Get the author name, falling back to git config or username
    pub fn author(&self) -> String {
        if let Some(ref author) = self.author {
            return author.clone();
        }

        // Try git config
        if let Ok(output) = std::process::Command::new("git")
            .args(["config", "user.name"])
            .output()
        {
            if output.status.success() {
                let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !name.is_empty() {
                    return name;
                }
            }
        }

        // Fall back to username
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    /// Delimiter byte for CSV ingestion (first byte of csv_delimiter, default ',')
    pub fn csv_delimiter(&self) -> u8 {
        self.csv_delimiter
            .as_deref()
            .and_then(|s| s.bytes().next())
            .unwrap_or(b',')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_other() {
        let mut base = Config {
            author: Some("base".to_string()),
            default_format: None,
            default_year: Some(2024),
            csv_delimiter: None,
        };
        base.merge(Config {
            author: Some("other".to_string()),
            default_format: Some("json".to_string()),
            default_year: None,
            csv_delimiter: None,
        });

        assert_eq!(base.author.as_deref(), Some("other"));
        assert_eq!(base.default_format.as_deref(), Some("json"));
        assert_eq!(base.default_year, Some(2024));
    }

    #[test]
    fn test_csv_delimiter_default() {
        let config = Config::default();
        assert_eq!(config.csv_delimiter(), b',');

        let semi = Config {
            csv_delimiter: Some(";".to_string()),
            ..Config::default()
        };
        assert_eq!(semi.csv_delimiter(), b';');
    }
}
