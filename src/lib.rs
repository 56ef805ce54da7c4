//! SST: Solar Sales Toolkit
//!
//! A Unix-style CLI for solar sales support: a local parts catalog,
//! vendor pricing comparison against internal costs, and domestic-content
//! tax credit estimation under the tiered IRS rules.

pub mod catalog;
pub mod cli;
pub mod compare;
pub mod core;
pub mod credit;
pub mod pricing;
pub mod report;
pub mod selection;
