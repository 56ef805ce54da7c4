//! Domestic-content tax credit assessment
//!
//! Given a set of selected parts and project facts, the engine classifies
//! parts into steel/iron vs. manufactured products, measures domestic
//! content value against year-indexed thresholds, and computes the base
//! investment credit plus the 10% domestic content bonus. Residential
//! projects get a separately tracked credit that is never folded into the
//! commercial figure.
//!
//! Everything here is a pure function over caller-supplied data; the CLI
//! layer owns catalog reads and file IO.

pub mod engine;
pub mod rules;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::OriginCountry;

pub use engine::{
    assess, BonusEligibility, CategoryRollup, EligibilityReport, PartAssessment, PartCategory,
};

/// Sourcing classification used by the credit rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeocClassification {
    Domestic,
    China,
    OtherForeign,
}

impl FeocClassification {
    /// Default classification for a catalog origin. `China` is never
    /// inferred from origin data; it only enters via an explicit per-part
    /// override in a selection file.
    pub fn from_origin(origin: OriginCountry) -> Self {
        match origin {
            OriginCountry::Us => FeocClassification::Domestic,
            OriginCountry::Nonus | OriginCountry::Unknown => FeocClassification::OtherForeign,
        }
    }
}

impl fmt::Display for FeocClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeocClassification::Domestic => write!(f, "Domestic"),
            FeocClassification::China => write!(f, "China"),
            FeocClassification::OtherForeign => write!(f, "Other Foreign"),
        }
    }
}

impl FromStr for FeocClassification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "domestic" => Ok(FeocClassification::Domestic),
            "china" => Ok(FeocClassification::China),
            "other-foreign" | "other foreign" | "foreign" => Ok(FeocClassification::OtherForeign),
            _ => Err(format!(
                "unknown classification '{}' (expected domestic, china, or other-foreign)",
                s
            )),
        }
    }
}

/// One part as selected for a project, with the fields the engine needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedPart {
    pub sku: String,
    pub name: String,
    /// User-chosen count, at least 1
    pub quantity: u32,
    /// Internal unit price; a missing price values the part at zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    pub classification: FeocClassification,
    /// Domestic content percentage override (0..=100). Only consulted for
    /// parts not classified Domestic; those always count at 100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domestic_content_pct: Option<f64>,
}

/// Residential vs. commercial determines which credit schedule applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectType {
    Residential,
    Commercial,
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectType::Residential => write!(f, "residential"),
            ProjectType::Commercial => write!(f, "commercial"),
        }
    }
}

impl FromStr for ProjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "residential" => Ok(ProjectType::Residential),
            "commercial" => Ok(ProjectType::Commercial),
            _ => Err(format!(
                "unknown project type '{}' (expected residential or commercial)",
                s
            )),
        }
    }
}

/// Project facts feeding eligibility and the credit schedules. Request
/// scoped; never persisted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectContext {
    /// Year the system goes into service
    pub installation_year: i32,
    /// Maximum net output in megawatts
    pub max_net_output_mw: f64,
    /// When construction began, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construction_start: Option<NaiveDate>,
    pub prevailing_wage_compliant: bool,
    pub project_type: ProjectType,
}

/// Errors from the credit engine
#[derive(Debug, Error)]
pub enum EligibilityError {
    #[error("no parts selected; add at least one part before running the credit calculation")]
    EmptySelection,
}
