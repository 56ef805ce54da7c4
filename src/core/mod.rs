//! Core module - workspace discovery and configuration

pub mod config;
pub mod templates;
pub mod workspace;

pub use config::Config;
pub use templates::{TemplateEngine, TemplateError};
pub use workspace::{Workspace, WorkspaceError};
