//! Versioned overhead rate tables consumed by the system cost generator.
//!
//! Injected configuration, owned by configuration tooling: the engine only
//! reads these. Defaults carry the production rate card per currency.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::Currency;

/// Rates applied per kilometer travelled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PerKmRates {
    pub repair_maintenance: f64,
    pub tyre_cost: f64,
}

/// Fixed overhead rates applied per trip day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PerDayRates {
    pub git_insurance: f64,
    pub short_term_insurance: f64,
    pub tracking_cost: f64,
    pub fleet_management_system: f64,
    pub licensing: f64,
    pub vid_roadworthy: f64,
    pub wages: f64,
    pub depreciation: f64,
}

/// One currency's rate card, versioned by effective date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemCostRates {
    pub currency: Currency,
    pub per_km: PerKmRates,
    pub per_day: PerDayRates,
    pub last_updated: String,
    pub updated_by: String,
    pub effective_date: String,
}

impl SystemCostRates {
    /// Per-km rates paired with their taxonomy sub-category labels.
    pub fn per_km_items(&self) -> [(&'static str, f64); 2] {
        [
            ("Repair & Maintenance per KM", self.per_km.repair_maintenance),
            ("Tyre Cost per KM", self.per_km.tyre_cost),
        ]
    }

    /// Per-day rates paired with their taxonomy sub-category labels.
    pub fn per_day_items(&self) -> [(&'static str, f64); 8] {
        [
            ("GIT Insurance", self.per_day.git_insurance),
            ("Short-Term Insurance", self.per_day.short_term_insurance),
            ("Tracking Cost", self.per_day.tracking_cost),
            ("Fleet Management System", self.per_day.fleet_management_system),
            ("Licensing", self.per_day.licensing),
            ("VID / Roadworthy", self.per_day.vid_roadworthy),
            ("Wages", self.per_day.wages),
            ("Depreciation", self.per_day.depreciation),
        ]
    }

    pub fn per_km_total(&self) -> f64 {
        self.per_km_items().iter().map(|(_, r)| r).sum()
    }

    pub fn per_day_total(&self) -> f64 {
        self.per_day_items().iter().map(|(_, r)| r).sum()
    }

    /// Production default rate card for the given currency.
    pub fn default_for(currency: Currency) -> Self {
        let now = Utc::now().to_rfc3339();
        match currency {
            Currency::Usd => Self {
                currency,
                per_km: PerKmRates {
                    repair_maintenance: 0.11,
                    tyre_cost: 0.03,
                },
                per_day: PerDayRates {
                    git_insurance: 10.21,
                    short_term_insurance: 7.58,
                    tracking_cost: 2.47,
                    fleet_management_system: 1.34,
                    licensing: 1.32,
                    vid_roadworthy: 0.41,
                    wages: 16.88,
                    depreciation: 321.17,
                },
                last_updated: now.clone(),
                updated_by: "System Default".to_string(),
                effective_date: now,
            },
            Currency::Zar => Self {
                currency,
                per_km: PerKmRates {
                    repair_maintenance: 2.05,
                    tyre_cost: 0.64,
                },
                per_day: PerDayRates {
                    git_insurance: 134.82,
                    short_term_insurance: 181.52,
                    tracking_cost: 49.91,
                    fleet_management_system: 23.02,
                    licensing: 23.52,
                    vid_roadworthy: 11.89,
                    wages: 300.15,
                    depreciation: 634.45,
                },
                last_updated: now.clone(),
                updated_by: "System Default".to_string(),
                effective_date: now,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rate_cards_cover_all_lines() {
        for currency in [Currency::Usd, Currency::Zar] {
            let rates = SystemCostRates::default_for(currency);
            assert_eq!(rates.per_km_items().len(), 2);
            assert_eq!(rates.per_day_items().len(), 8);
            assert!(rates.per_km_total() > 0.0);
            assert!(rates.per_day_total() > 0.0);
        }
    }

    #[test]
    fn zar_totals_match_rate_card() {
        let rates = SystemCostRates::default_for(Currency::Zar);
        assert!((rates.per_km_total() - 2.69).abs() < 1e-9);
        assert!((rates.per_day_total() - 1359.28).abs() < 1e-9);
    }
}
