//! Shared utilities for CLI commands

use miette::{IntoDiagnostic, Result};

use crate::catalog::SqliteCatalog;
use crate::cli::GlobalOpts;
use crate::core::Workspace;

/// Open the workspace, honoring the global `--project` override
pub fn open_workspace(global: &GlobalOpts) -> Result<Workspace> {
    let workspace = match &global.project {
        Some(root) => Workspace::open(root),
        None => Workspace::discover(),
    };
    workspace.map_err(|e| miette::miette!("{}", e))
}

/// Open the workspace catalog database
pub fn open_catalog(workspace: &Workspace) -> Result<SqliteCatalog> {
    SqliteCatalog::open(&workspace.catalog_path()).into_diagnostic()
}
