//! Three-phase credit computation.
//!
//! Phase A classifies and values each selected part. Phase B measures
//! domestic content against the installation year's thresholds. Phase C
//! resolves bonus eligibility, computes the credit figures, and emits
//! ordered advisory text. The whole pass is pure and single-threaded;
//! rerunning it on the same inputs reproduces the same report.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::rules;
use super::{EligibilityError, FeocClassification, ProjectContext, ProjectType, SelectedPart};

/// Steel/iron vs. manufactured products, per the content rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartCategory {
    SteelIron,
    ManufacturedProducts,
}

impl fmt::Display for PartCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartCategory::SteelIron => write!(f, "Steel/Iron"),
            PartCategory::ManufacturedProducts => write!(f, "Manufactured Products"),
        }
    }
}

/// Per-part line of the assessment breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartAssessment {
    pub sku: String,
    pub name: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    pub classification: FeocClassification,
    pub category: PartCategory,
    /// `unit_price * quantity`, missing price valued at zero
    pub total_value: f64,
    /// Effective percentage: 100 for Domestic, else the override or 0
    pub domestic_content_pct: f64,
    pub domestic_value: f64,
}

/// Value rollup for one content category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryRollup {
    pub value: f64,
    pub domestic_value: f64,
    /// `domestic_value / value * 100`; 100 when the category is empty
    pub actual_pct: f64,
    pub required_pct: f64,
    pub compliant: bool,
}

/// The three independent paths to bonus eligibility. Any one suffices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusEligibility {
    pub eligible: bool,
    pub small_project: bool,
    pub early_construction: bool,
    pub prevailing_wage: bool,
}

impl BonusEligibility {
    /// Labels for each satisfied path, for display
    pub fn satisfied_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::new();
        if self.small_project {
            paths.push("under 1 MW net output");
        }
        if self.early_construction {
            paths.push("construction began before 2023-01-29");
        }
        if self.prevailing_wage {
            paths.push("prevailing wage compliant");
        }
        paths
    }
}

/// Full assessment output: breakdown, rollups, credits, and advisories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub project: ProjectContext,
    pub parts: Vec<PartAssessment>,

    pub equipment_value: f64,
    pub labor_cost: f64,
    pub total_project_cost: f64,

    pub steel_iron: CategoryRollup,
    pub manufactured_products: CategoryRollup,
    pub requirements_description: String,

    pub bonus: BonusEligibility,
    pub domestic_content_compliant: bool,

    pub base_credit: f64,
    pub domestic_content_bonus: f64,
    pub total_credit: f64,
    /// Residential schedule, tracked apart from `total_credit`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residential_credit: Option<f64>,

    pub recommendations: Vec<String>,
}

/// Run the assessment over the selected parts.
///
/// An empty selection is refused outright; every other input shortfall
/// degrades to a permissive default (missing price values the part at
/// zero, missing construction date fails only that eligibility path).
pub fn assess(
    parts: &[SelectedPart],
    project: &ProjectContext,
) -> Result<EligibilityReport, EligibilityError> {
    if parts.is_empty() {
        return Err(EligibilityError::EmptySelection);
    }

    // Phase A: classify each part and accumulate category values.
    let mut equipment_value = 0.0;
    let mut steel_value = 0.0;
    let mut steel_domestic = 0.0;
    let mut mfg_value = 0.0;
    let mut mfg_domestic = 0.0;

    let mut assessments = Vec::with_capacity(parts.len());
    for part in parts {
        let total_value = part.unit_price.unwrap_or(0.0) * part.quantity as f64;
        let category = if rules::is_steel_iron(&part.name, &part.sku) {
            PartCategory::SteelIron
        } else {
            PartCategory::ManufacturedProducts
        };
        let domestic_content_pct = if part.classification == FeocClassification::Domestic {
            100.0
        } else {
            part.domestic_content_pct.unwrap_or(0.0)
        };
        let domestic_value = total_value * domestic_content_pct / 100.0;

        match category {
            PartCategory::SteelIron => {
                steel_value += total_value;
                steel_domestic += domestic_value;
            }
            PartCategory::ManufacturedProducts => {
                mfg_value += total_value;
                mfg_domestic += domestic_value;
            }
        }
        equipment_value += total_value;

        assessments.push(PartAssessment {
            sku: part.sku.clone(),
            name: part.name.clone(),
            quantity: part.quantity,
            unit_price: part.unit_price,
            classification: part.classification,
            category,
            total_value,
            domestic_content_pct,
            domestic_value,
        });
    }

    // Phase B: thresholds for the installation year. An empty category is
    // vacuously compliant at 100%.
    let required_mfg_pct = rules::required_manufactured_pct(project.installation_year);
    let steel_pct = actual_pct(steel_domestic, steel_value);
    let mfg_pct = actual_pct(mfg_domestic, mfg_value);

    let steel_iron = CategoryRollup {
        value: steel_value,
        domestic_value: steel_domestic,
        actual_pct: steel_pct,
        required_pct: rules::STEEL_IRON_REQUIRED_PCT,
        compliant: steel_pct >= rules::STEEL_IRON_REQUIRED_PCT,
    };
    let manufactured_products = CategoryRollup {
        value: mfg_value,
        domestic_value: mfg_domestic,
        actual_pct: mfg_pct,
        required_pct: required_mfg_pct,
        compliant: mfg_pct >= required_mfg_pct,
    };
    let domestic_content_compliant = steel_iron.compliant && manufactured_products.compliant;

    // Phase C: eligibility paths and the credit schedule.
    let bonus = bonus_eligibility(project);

    let labor_cost = equipment_value * rules::LABOR_COST_PCT;
    let total_project_cost = equipment_value + labor_cost;
    let base_credit = total_project_cost * rules::BASE_CREDIT_RATE;
    let domestic_content_bonus = if domestic_content_compliant && bonus.eligible {
        total_project_cost * rules::DOMESTIC_BONUS_RATE
    } else {
        0.0
    };
    let total_credit = base_credit + domestic_content_bonus;

    let residential_credit = match project.project_type {
        ProjectType::Residential => {
            Some(total_project_cost * rules::residential_rate(project.installation_year))
        }
        ProjectType::Commercial => None,
    };

    let recommendations = recommendations(&steel_iron, &manufactured_products, &bonus);

    Ok(EligibilityReport {
        project: project.clone(),
        parts: assessments,
        equipment_value,
        labor_cost,
        total_project_cost,
        steel_iron,
        manufactured_products,
        requirements_description: format!(
            "Steel/Iron: 100% US | Manufactured Products: {}% domestic ({})",
            required_mfg_pct, project.installation_year
        ),
        bonus,
        domestic_content_compliant,
        base_credit,
        domestic_content_bonus,
        total_credit,
        residential_credit,
        recommendations,
    })
}

fn actual_pct(domestic_value: f64, total_value: f64) -> f64 {
    if total_value > 0.0 {
        domestic_value / total_value * 100.0
    } else {
        100.0
    }
}

fn bonus_eligibility(project: &ProjectContext) -> BonusEligibility {
    let small_project = project.max_net_output_mw < rules::SMALL_PROJECT_MW_CEILING;
    let early_construction = project
        .construction_start
        .map(|date| date < rules::early_construction_cutoff())
        .unwrap_or(false);
    let prevailing_wage = project.prevailing_wage_compliant;

    BonusEligibility {
        eligible: small_project || early_construction || prevailing_wage,
        small_project,
        early_construction,
        prevailing_wage,
    }
}

/// Advisory lines in a fixed order: eligibility gap first, then each
/// failing category, then the overall verdict.
fn recommendations(
    steel: &CategoryRollup,
    manufactured: &CategoryRollup,
    bonus: &BonusEligibility,
) -> Vec<String> {
    let mut recs = Vec::new();

    if !bonus.eligible {
        recs.push(
            "PROJECT ELIGIBILITY: the 10% domestic content bonus requires net output under \
             1 MW, construction started before 2023-01-29, or prevailing wage compliance"
                .to_string(),
        );
    }

    if !steel.compliant {
        recs.push(format!(
            "STEEL/IRON: replace foreign steel and iron components with US manufactured \
             alternatives (currently {:.1}%, need 100%)",
            steel.actual_pct
        ));
    }

    if !manufactured.compliant {
        recs.push(format!(
            "MANUFACTURED PRODUCTS: raise domestic content to {}% for modules, inverters, \
             and batteries (currently {:.1}%)",
            manufactured.required_pct, manufactured.actual_pct
        ));
        recs.push(
            "SAFE HARBOR: consider DOE default cost percentages instead of supplier direct \
             cost data for compliance verification"
                .to_string(),
        );
    }

    if steel.compliant && manufactured.compliant {
        if bonus.eligible {
            recs.push(
                "FULLY QUALIFIED: project meets all requirements for the 10% domestic \
                 content bonus (40% total credit)"
                    .to_string(),
            );
        } else {
            recs.push(
                "CONTENT COMPLIANT: domestic content requirements met; confirm an \
                 eligibility path to unlock the full bonus"
                    .to_string(),
            );
        }
    }

    recs
}
