//! Trip aggregate and its satellite records.

use serde::{Deserialize, Serialize};

use crate::{AdditionalCost, CostEntry, DelayReason, FollowUpRecord, TripEditRecord};

/// Currency tag carried on monetary values. Opaque: the engine never converts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Zar,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Zar => "ZAR",
        }
    }

    /// Display symbol for formatting ("$" / "R").
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Zar => "R",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a trip. The declaration order is the legal ordering:
/// a trip's status only ever advances, never regresses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    #[default]
    Active,
    Completed,
    Invoiced,
    Paid,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Active => "active",
            TripStatus::Completed => "completed",
            TripStatus::Invoiced => "invoiced",
            TripStatus::Paid => "paid",
        }
    }

    /// Parse one of the four canonical statuses. External vocabulary
    /// ("shipped", "delivered", ...) is handled by import normalization,
    /// never here.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(TripStatus::Active),
            "completed" => Some(TripStatus::Completed),
            "invoiced" => Some(TripStatus::Invoiced),
            "paid" => Some(TripStatus::Paid),
            _ => None,
        }
    }
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment reconciliation state, tracked from invoicing onward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Partial,
    Paid,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    Internal,
    External,
}

/// How the trip record entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingSource {
    #[default]
    Manual,
    Web,
    Api,
    Import,
}

/// Stored file reference. Upload and storage belong to an external
/// collaborator; the engine only tracks presence and identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    pub file_url: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

/// Arrival / offload / departure stamps for one phase of the timeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelineStamps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure: Option<String>,
}

/// Planned vs. actual vs. final (invoicing-confirmed) timestamps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripTimeline {
    #[serde(default)]
    pub planned: TimelineStamps,
    #[serde(default)]
    pub actual: TimelineStamps,
    /// Confirmed at invoice submission; authoritative for billing.
    #[serde(rename = "final", default)]
    pub final_confirmed: TimelineStamps,
    #[serde(default)]
    pub validated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_at: Option<String>,
}

/// Invoice metadata recorded by the submission gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceDetails {
    pub number: String,
    pub date: String,
    pub due_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_notes: Option<String>,
}

/// Payment tracking fields, initialized to unpaid at invoice submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentTracking {
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_date: Option<String>,
}

/// One scheduled transport job: the aggregate root for costs, timeline,
/// invoicing, and audit history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub fleet_number: String,
    pub driver_name: String,
    pub client_name: String,
    pub client_type: ClientType,
    pub route: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_date: String,
    pub end_date: String,
    pub base_revenue: f64,
    pub revenue_currency: Currency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub status: TripStatus,
    #[serde(default)]
    pub costs: Vec<CostEntry>,
    /// Only appendable once the trip is completed or later.
    #[serde(default)]
    pub additional_costs: Vec<AdditionalCost>,
    /// Append-only; reconstructing status history from it must show a
    /// monotonically non-decreasing status.
    #[serde(default)]
    pub edit_history: Vec<TripEditRecord>,
    #[serde(default)]
    pub delay_reasons: Vec<DelayReason>,
    #[serde(default)]
    pub follow_up_history: Vec<FollowUpRecord>,
    #[serde(default)]
    pub timeline: TripTimeline,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_completed_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice: Option<InvoiceDetails>,
    #[serde(default)]
    pub payment: PaymentTracking,
    #[serde(default)]
    pub proof_of_delivery: Vec<Attachment>,
    #[serde(default)]
    pub signed_invoice: Vec<Attachment>,
    #[serde(default)]
    pub booking_source: BookingSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imported_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    /// Optimistic-locking counter; bumped by the store on every write.
    #[serde(default)]
    pub version: u32,
}

impl Trip {
    /// Sum of all cost entry amounts (system and manual alike).
    pub fn total_costs(&self) -> f64 {
        self.costs.iter().map(|c| c.amount).sum()
    }

    /// Sum of post-completion additional costs.
    pub fn total_additional_costs(&self) -> f64 {
        self.additional_costs.iter().map(|c| c.amount).sum()
    }

    pub fn flagged_cost_count(&self) -> usize {
        self.costs.iter().filter(|c| c.is_flagged).count()
    }

    /// Flagged entries whose investigation has not reached resolved. These
    /// block the completed transition.
    pub fn unresolved_flag_count(&self) -> usize {
        self.costs.iter().filter(|c| c.is_unresolved()).count()
    }

    /// Case-insensitive reference collision check against existing
    /// non-system entries.
    pub fn reference_in_use(&self, reference: &str) -> bool {
        let needle = reference.trim().to_lowercase();
        self.costs
            .iter()
            .filter(|c| !c.is_system_generated)
            .any(|c| c.reference_number.to_lowercase() == needle)
    }

    pub fn find_cost(&self, cost_id: &str) -> Option<&CostEntry> {
        self.costs.iter().find(|c| c.id == cost_id)
    }

    /// Cost entries are mutable only while the trip is active.
    pub fn is_cost_editable(&self) -> bool {
        self.status == TripStatus::Active
    }
}
