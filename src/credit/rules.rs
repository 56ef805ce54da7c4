//! Fixed rates, dates, and year-indexed thresholds behind the credit math.
//!
//! Figures follow the IRS domestic content bonus guidance for the
//! investment tax credit and the residential clean energy credit phase-out
//! schedule.

use chrono::NaiveDate;

/// A part whose name (or sku, when the name is blank) contains one of these
/// is treated as steel/iron; everything else is a manufactured product.
pub const STEEL_IRON_KEYWORDS: [&str; 4] = ["racking", "mounting", "foundation", "structural"];

/// Labor priced at a flat share of equipment value
pub const LABOR_COST_PCT: f64 = 0.20;

/// Base investment tax credit rate, always granted
pub const BASE_CREDIT_RATE: f64 = 0.30;

/// Additional rate when domestic-content compliant and bonus-eligible
pub const DOMESTIC_BONUS_RATE: f64 = 0.10;

/// Steel/iron domestic content requirement never steps down
pub const STEEL_IRON_REQUIRED_PCT: f64 = 100.0;

/// Projects strictly under this net output qualify without the wage test
pub const SMALL_PROJECT_MW_CEILING: f64 = 1.0;

/// Construction begun strictly before this date qualifies for the bonus
/// regardless of wage compliance.
pub fn early_construction_cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 29).expect("fixed calendar date")
}

/// Required domestic-content percentage for manufactured products, stepping
/// up by installation year.
pub fn required_manufactured_pct(installation_year: i32) -> f64 {
    match installation_year {
        ..=2024 => 40.0,
        2025..=2026 => 45.0,
        2027..=2028 => 50.0,
        _ => 55.0,
    }
}

/// Residential clean energy credit rate by installation year. Reported
/// separately from the commercial figures, never summed with them.
pub fn residential_rate(installation_year: i32) -> f64 {
    match installation_year {
        ..=2032 => 0.30,
        2033 => 0.26,
        2034 => 0.22,
        _ => 0.10,
    }
}

/// Steel/iron test. The name wins when present; the sku is only consulted
/// for nameless parts.
pub fn is_steel_iron(name: &str, sku: &str) -> bool {
    let haystack = if name.is_empty() { sku } else { name }.to_lowercase();
    STEEL_IRON_KEYWORDS.iter().any(|k| haystack.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manufactured_threshold_steps() {
        assert_eq!(required_manufactured_pct(1990), 40.0);
        assert_eq!(required_manufactured_pct(2024), 40.0);
        assert_eq!(required_manufactured_pct(2025), 45.0);
        assert_eq!(required_manufactured_pct(2026), 45.0);
        assert_eq!(required_manufactured_pct(2027), 50.0);
        assert_eq!(required_manufactured_pct(2028), 50.0);
        assert_eq!(required_manufactured_pct(2029), 55.0);
        assert_eq!(required_manufactured_pct(2100), 55.0);
    }

    #[test]
    fn test_manufactured_threshold_never_decreases() {
        let mut last = 0.0;
        for year in 2000..2100 {
            let pct = required_manufactured_pct(year);
            assert!(pct >= last, "threshold dropped at {}", year);
            last = pct;
        }
    }

    #[test]
    fn test_residential_rate_schedule() {
        assert_eq!(residential_rate(2020), 0.30);
        assert_eq!(residential_rate(2032), 0.30);
        assert_eq!(residential_rate(2033), 0.26);
        assert_eq!(residential_rate(2034), 0.22);
        assert_eq!(residential_rate(2035), 0.10);
        assert_eq!(residential_rate(2050), 0.10);
    }

    #[test]
    fn test_steel_iron_keyword_match() {
        assert!(is_steel_iron("XR100 Racking Kit", "XR-100"));
        assert!(is_steel_iron("Roof MOUNTING bracket", "RB-1"));
        assert!(is_steel_iron("Ground foundation screw", "GS-9"));
        assert!(is_steel_iron("Structural beam 10ft", "SB-10"));
        assert!(!is_steel_iron("IQ8 Microinverter", "IQ8-72"));
        assert!(!is_steel_iron("400W Module", "MOD-400"));
    }

    #[test]
    fn test_steel_iron_sku_only_when_nameless() {
        // Blank name: the sku is tested instead.
        assert!(is_steel_iron("", "SOLAR-MOUNTING-KIT"));
        // Non-blank name: the sku never rescues a miss.
        assert!(!is_steel_iron("Solar Panel", "RACKING-1"));
    }

    #[test]
    fn test_early_construction_cutoff_date() {
        let cutoff = early_construction_cutoff();
        assert_eq!(cutoff, NaiveDate::from_ymd_opt(2023, 1, 29).unwrap());
    }
}
