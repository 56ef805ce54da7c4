//! CLI command implementations

pub mod utils;

pub mod compare;
pub mod completions;
pub mod config;
pub mod credit;
pub mod ingest;
pub mod init;
pub mod map;
pub mod part;
pub mod search;
pub mod selection;
