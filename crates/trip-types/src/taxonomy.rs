//! Closed category / sub-category taxonomy for cost entries.
//!
//! Injected configuration: tests substitute their own tables. The default
//! carries the full production taxonomy.

use serde::{Deserialize, Serialize};

/// Reserved category reachable only through the system cost generator.
pub const SYSTEM_COST_CATEGORY: &str = "System Costs";

/// One category and its closed set of sub-categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostCategory {
    pub name: String,
    pub sub_categories: Vec<String>,
}

/// Ordered category table plus the set of categories whose entries are
/// automatically flagged for investigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostTaxonomy {
    pub categories: Vec<CostCategory>,
    pub high_risk: Vec<String>,
}

impl CostTaxonomy {
    pub fn category(&self, name: &str) -> Option<&CostCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn sub_categories(&self, category: &str) -> Option<&[String]> {
        self.category(category).map(|c| c.sub_categories.as_slice())
    }

    /// Whether the (category, sub-category) pair exists in the table.
    pub fn contains(&self, category: &str, sub_category: &str) -> bool {
        self.sub_categories(category)
            .map(|subs| subs.iter().any(|s| s == sub_category))
            .unwrap_or(false)
    }

    pub fn is_high_risk(&self, category: &str) -> bool {
        self.high_risk.iter().any(|c| c == category)
    }

    pub fn is_system(category: &str) -> bool {
        category == SYSTEM_COST_CATEGORY
    }
}

fn category(name: &str, subs: &[&str]) -> CostCategory {
    CostCategory {
        name: name.to_string(),
        sub_categories: subs.iter().map(|s| s.to_string()).collect(),
    }
}

impl Default for CostTaxonomy {
    fn default() -> Self {
        Self {
            categories: vec![
                category(
                    "Border Costs",
                    &[
                        "Beitbridge Border Fee",
                        "Gate Pass",
                        "Coupon",
                        "Carbon Tax Horse",
                        "CVG Horse",
                        "CVG Trailer",
                        "Insurance (1 Month Horse)",
                        "Insurance (3 Months Trailer)",
                        "Insurance (2 Months Trailer)",
                        "Insurance (1 Month Trailer)",
                        "Carbon Tax (3 Months Horse)",
                        "Carbon Tax (2 Months Horse)",
                        "Carbon Tax (1 Month Horse)",
                        "Carbon Tax (3 Months Trailer)",
                        "Carbon Tax (2 Months Trailer)",
                        "Carbon Tax (1 Month Trailer)",
                        "Road Access",
                        "Bridge Fee",
                        "Road Toll Fee",
                        "Counseling Leavy",
                        "Transit Permit Horse",
                        "Transit Permit Trailer",
                        "National Road Safety Fund Horse",
                        "National Road Safety Fund Trailer",
                        "Electronic Seal",
                        "EME Permit",
                        "Zim Clearing",
                        "Zim Supervision",
                        "SA Clearing",
                        "Runner Fee Beitbridge",
                        "Runner Fee Zambia Kazungula",
                        "Runner Fee Chirundu",
                    ],
                ),
                category(
                    "Parking",
                    &[
                        "Bubi",
                        "Lunde",
                        "Mvuma",
                        "Gweru",
                        "Kadoma",
                        "Chegutu",
                        "Norton",
                        "Harare",
                        "Ruwa",
                        "Marondera",
                        "Rusape",
                        "Mutare",
                        "Nyanga",
                        "Bindura",
                        "Shamva",
                        "Centenary",
                        "Guruve",
                        "Karoi",
                        "Chinhoyi",
                        "Kariba",
                        "Hwange",
                        "Victoria Falls",
                        "Bulawayo",
                        "Gwanda",
                        "Beitbridge",
                        "Masvingo",
                        "Zvishavane",
                        "Shurugwi",
                        "Kwekwe",
                    ],
                ),
                category(
                    "Diesel",
                    &[
                        "ACM Petroleum Chirundu - Reefer",
                        "ACM Petroleum Chirundu - Horse",
                        "RAM Petroleum Harare - Reefer",
                        "RAM Petroleum Harare - Horse",
                        "Engen Beitbridge - Reefer",
                        "Engen Beitbridge - Horse",
                        "Shell Mutare - Reefer",
                        "Shell Mutare - Horse",
                        "BP Bulawayo - Reefer",
                        "BP Bulawayo - Horse",
                        "Total Gweru - Reefer",
                        "Total Gweru - Horse",
                        "Puma Masvingo - Reefer",
                        "Puma Masvingo - Horse",
                        "Zuva Petroleum Kadoma - Reefer",
                        "Zuva Petroleum Kadoma - Horse",
                        "Mobil Chinhoyi - Reefer",
                        "Mobil Chinhoyi - Horse",
                        "Caltex Kwekwe - Reefer",
                        "Caltex Kwekwe - Horse",
                    ],
                ),
                category(
                    "Non-Value-Added Costs",
                    &[
                        "Fines",
                        "Penalties",
                        "Passport Stamping",
                        "Push Documents",
                        "Jump Queue",
                        "Dismiss Inspection",
                        "Parcels",
                        "Labour",
                    ],
                ),
                category("Trip Allowances", &["Food", "Airtime", "Taxi"]),
                category(
                    "Tolls",
                    &[
                        "Tolls BB to JHB",
                        "Tolls Cape Town to JHB",
                        "Tolls JHB to CPT",
                        "Tolls Mutare to BB",
                        "Tolls JHB to Martinsdrift",
                        "Tolls BB to Harare",
                        "Tolls Zambia",
                    ],
                ),
                category(
                    SYSTEM_COST_CATEGORY,
                    &[
                        "Repair & Maintenance per KM",
                        "Tyre Cost per KM",
                        "GIT Insurance",
                        "Short-Term Insurance",
                        "Tracking Cost",
                        "Fleet Management System",
                        "Licensing",
                        "VID / Roadworthy",
                        "Wages",
                        "Depreciation",
                    ],
                ),
            ],
            high_risk: vec![
                "Non-Value-Added Costs".to_string(),
                "Border Costs".to_string(),
            ],
        }
    }
}

/// Reminder configuration for keeping rate tables current. Data only:
/// delivery belongs to an external scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemCostReminder {
    pub id: String,
    pub next_reminder_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reminder_date: Option<String>,
    pub reminder_frequency_days: u32,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Canned edit reasons offered by the boundary layer.
pub const TRIP_EDIT_REASONS: &[&str] = &[
    "Correction of data entry error",
    "Client requested change",
    "Route modification due to operational requirements",
    "Revenue adjustment per contract amendment",
    "Distance correction based on actual route",
    "Driver change due to operational needs",
    "Date adjustment for accurate reporting",
    "Client type classification update",
    "Other (specify in comments)",
];

/// Canned deletion reasons offered by the boundary layer.
pub const TRIP_DELETION_REASONS: &[&str] = &[
    "Duplicate entry",
    "Trip cancelled before execution",
    "Data entry error - trip never occurred",
    "Merged with another trip record",
    "Client contract cancellation",
    "Regulatory compliance requirement",
    "Other (specify in comments)",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_taxonomy_pairs() {
        let tax = CostTaxonomy::default();
        assert!(tax.contains("Border Costs", "Gate Pass"));
        assert!(tax.contains("Trip Allowances", "Food"));
        assert!(!tax.contains("Border Costs", "Food"));
        assert!(!tax.contains("Unknown", "Gate Pass"));
    }

    #[test]
    fn high_risk_categories() {
        let tax = CostTaxonomy::default();
        assert!(tax.is_high_risk("Border Costs"));
        assert!(tax.is_high_risk("Non-Value-Added Costs"));
        assert!(!tax.is_high_risk("Diesel"));
    }

    #[test]
    fn system_category_is_reserved() {
        assert!(CostTaxonomy::is_system("System Costs"));
        assert!(!CostTaxonomy::is_system("Tolls"));
    }
}
