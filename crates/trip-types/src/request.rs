//! Request DTOs delivered by the boundary layer.
//!
//! Plain structured values: no framework wrapper types. Every mutating
//! engine call additionally carries an actor identity string.

use serde::{Deserialize, Serialize};

use crate::{
    AdditionalCostType, Attachment, BookingSource, ClientType, ContactMethod, Currency,
    DelaySeverity, DelayType, FollowUpOutcome, FollowUpPriority, FollowUpStatus, PaymentStatus,
    TimelineStamps, Trip, TripStatus, TripTimeline,
};

/// Booking request for a new trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrip {
    pub fleet_number: String,
    pub driver_name: String,
    pub client_name: String,
    pub client_type: ClientType,
    pub route: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: String,
    pub end_date: String,
    pub base_revenue: f64,
    pub revenue_currency: Currency,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub planned_timeline: TimelineStamps,
    #[serde(default)]
    pub booking_source: BookingSource,
    #[serde(default)]
    pub load_ref: Option<String>,
}

impl NewTrip {
    /// Materialize the trip aggregate with engine defaults.
    pub fn into_trip(self, id: String) -> Trip {
        Trip {
            id,
            fleet_number: self.fleet_number,
            driver_name: self.driver_name,
            client_name: self.client_name,
            client_type: self.client_type,
            route: self.route,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            base_revenue: self.base_revenue,
            revenue_currency: self.revenue_currency,
            distance_km: self.distance_km,
            status: TripStatus::Active,
            costs: Vec::new(),
            additional_costs: Vec::new(),
            edit_history: Vec::new(),
            delay_reasons: Vec::new(),
            follow_up_history: Vec::new(),
            timeline: TripTimeline {
                planned: self.planned_timeline,
                ..TripTimeline::default()
            },
            completed_at: None,
            completed_by: None,
            auto_completed_at: None,
            auto_completed_reason: None,
            invoice: None,
            payment: Default::default(),
            proof_of_delivery: Vec::new(),
            signed_invoice: Vec::new(),
            booking_source: self.booking_source,
            load_ref: self.load_ref,
            imported_at: None,
            created_at: None,
            created_by: None,
            updated_at: None,
            updated_by: None,
            version: 0,
        }
    }
}

/// Proposed manual cost entry, prior to validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCostEntry {
    pub category: String,
    pub sub_category: String,
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<Currency>,
    pub reference_number: String,
    pub date: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Justification when no attachment accompanies the entry.
    #[serde(default)]
    pub no_document_reason: Option<String>,
    /// Caller-requested flag; requires `flag_reason`.
    #[serde(default)]
    pub flag_requested: bool,
    #[serde(default)]
    pub flag_reason: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl NewCostEntry {
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }

    pub fn trimmed_no_document_reason(&self) -> Option<&str> {
        self.no_document_reason
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn trimmed_flag_reason(&self) -> Option<&str> {
        self.flag_reason
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Invoice submission payload for a completed trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceSubmission {
    pub invoice_number: String,
    pub invoice_date: String,
    pub invoice_due_date: String,
    /// Final confirmed arrival/offload/departure for billing.
    pub final_timeline: TimelineStamps,
    #[serde(default)]
    pub proof_of_delivery: Vec<Attachment>,
    #[serde(default)]
    pub signed_invoice: Vec<Attachment>,
    #[serde(default)]
    pub validation_notes: Option<String>,
}

/// Payment reconciliation update for an invoiced trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentUpdate {
    pub status: PaymentStatus,
    pub amount: f64,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub bank_reference: Option<String>,
    #[serde(default)]
    pub received_date: Option<String>,
}

/// Editable fields on an active trip. Each edit carries a mandatory reason
/// and is captured in the edit history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripField {
    Route,
    Description,
    DriverName,
    ClientName,
    FleetNumber,
    StartDate,
    EndDate,
    BaseRevenue,
    DistanceKm,
}

impl TripField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripField::Route => "route",
            TripField::Description => "description",
            TripField::DriverName => "driver_name",
            TripField::ClientName => "client_name",
            TripField::FleetNumber => "fleet_number",
            TripField::StartDate => "start_date",
            TripField::EndDate => "end_date",
            TripField::BaseRevenue => "base_revenue",
            TripField::DistanceKm => "distance_km",
        }
    }
}

/// One audited field edit on an active trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripFieldEdit {
    pub field: TripField,
    pub new_value: String,
    pub reason: String,
}

/// Post-completion cost to append before invoicing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAdditionalCost {
    pub description: String,
    pub cost_type: AdditionalCostType,
    pub amount: f64,
    pub currency: Currency,
    pub date: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub supporting_documents: Vec<Attachment>,
}

/// Delay report for an active trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDelayReason {
    pub delay_type: DelayType,
    pub description: String,
    /// Duration in hours.
    pub delay_duration: f64,
    pub severity: DelaySeverity,
}

/// Payment follow-up contact on an invoiced trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFollowUp {
    pub follow_up_date: String,
    pub contact_method: ContactMethod,
    pub responsible_staff: String,
    pub response_summary: String,
    #[serde(default)]
    pub next_follow_up_date: Option<String>,
    pub status: FollowUpStatus,
    pub priority: FollowUpPriority,
    pub outcome: FollowUpOutcome,
}
