//! Workspace discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Represents an SST workspace
#[derive(Debug)]
pub struct Workspace {
    /// Root directory of the workspace (parent of .sst/)
    root: PathBuf,
}

impl Workspace {
    /// Find the workspace root by walking up from the current directory
    pub fn discover() -> Result<Self, WorkspaceError> {
        let current = std::env::current_dir().map_err(|e| WorkspaceError::Io(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find the workspace root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, WorkspaceError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| WorkspaceError::Io(e.to_string()))?;

        loop {
            let sst_dir = current.join(".sst");
            if sst_dir.is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(WorkspaceError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Open the workspace rooted at the given directory (no upward search)
    pub fn open(root: &Path) -> Result<Self, WorkspaceError> {
        let root = root
            .canonicalize()
            .map_err(|e| WorkspaceError::Io(e.to_string()))?;
        if !root.join(".sst").is_dir() {
            return Err(WorkspaceError::NotFound {
                searched_from: root,
            });
        }
        Ok(Self { root })
    }

    /// Create a new workspace structure at the given path
    pub fn init(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let sst_dir = root.join(".sst");
        if sst_dir.exists() {
            return Err(WorkspaceError::AlreadyExists(root.clone()));
        }

        Self::create_structure(&root)?;
        Ok(Self { root })
    }

    /// Force initialization even if .sst/ exists
    pub fn init_force(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::create_structure(&root)?;
        Ok(Self { root })
    }

    fn create_structure(root: &Path) -> Result<(), WorkspaceError> {
        let sst_dir = root.join(".sst");
        std::fs::create_dir_all(&sst_dir).map_err(|e| WorkspaceError::Io(e.to_string()))?;

        let config_path = sst_dir.join("config.yaml");
        std::fs::write(&config_path, Self::default_config())
            .map_err(|e| WorkspaceError::Io(e.to_string()))?;

        for dir in Self::DATA_DIRS {
            std::fs::create_dir_all(root.join(dir))
                .map_err(|e| WorkspaceError::Io(e.to_string()))?;
        }

        Ok(())
    }

    /// Data directories created under the workspace root
    pub const DATA_DIRS: &'static [&'static str] = &["pricing", "selections", "reports"];

    fn default_config() -> &'static str {
        r#"# SST Workspace Configuration

# Author recorded in exported reports (can be overridden by global config)
# author: ""

# Default output format (auto, yaml, tsv, json, csv, md)
# default_format: auto

# Default installation year for credit estimates when --year is omitted
# default_year: 2025

# Delimiter for catalog CSV ingestion
# csv_delimiter: ","
"#
    }

    /// Get the workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .sst configuration directory
    pub fn sst_dir(&self) -> PathBuf {
        self.root.join(".sst")
    }

    /// Path of the catalog database
    pub fn catalog_path(&self) -> PathBuf {
        self.sst_dir().join("catalog.db")
    }

    /// Directory holding vendor pricing payloads
    pub fn pricing_dir(&self) -> PathBuf {
        self.root.join("pricing")
    }

    /// Directory holding selection files
    pub fn selections_dir(&self) -> PathBuf {
        self.root.join("selections")
    }

    /// Directory holding exported reports
    pub fn reports_dir(&self) -> PathBuf {
        self.root.join("reports")
    }
}

/// Errors that can occur during workspace operations
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("not an SST workspace (searched from {searched_from:?}). Run 'sst init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("SST workspace already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    Io(String),
}
