//! Cost entries and the satellite records attached to a trip.

use serde::{Deserialize, Serialize};

use crate::{Attachment, Currency};

/// Investigation workflow for a flagged entry. Transitions only move
/// forward: pending -> in-progress -> resolved, no skipping, no reversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvestigationStatus {
    Pending,
    InProgress,
    Resolved,
}

impl InvestigationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestigationStatus::Pending => "pending",
            InvestigationStatus::InProgress => "in-progress",
            InvestigationStatus::Resolved => "resolved",
        }
    }

    /// Whether `next` is the single legal successor of `self`.
    pub fn can_advance_to(&self, next: InvestigationStatus) -> bool {
        matches!(
            (self, next),
            (InvestigationStatus::Pending, InvestigationStatus::InProgress)
                | (InvestigationStatus::InProgress, InvestigationStatus::Resolved)
        )
    }
}

impl std::fmt::Display for InvestigationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rate family produced a system-generated entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SystemCostType {
    PerKm,
    PerDay,
}

impl std::fmt::Display for SystemCostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SystemCostType::PerKm => "per-km",
            SystemCostType::PerDay => "per-day",
        };
        f.write_str(s)
    }
}

/// One monetary line item attributed to a trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostEntry {
    pub id: String,
    pub trip_id: String,
    pub category: String,
    pub sub_category: String,
    pub amount: f64,
    pub currency: Currency,
    /// Unique per trip among non-system entries (case-insensitive).
    pub reference_number: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub is_flagged: bool,
    /// Always non-empty when `is_flagged` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_document_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investigation_status: Option<InvestigationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investigation_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flagged_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flagged_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    #[serde(default)]
    pub is_system_generated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_cost_type: Option<SystemCostType>,
    /// Human-readable record of the factors used, for audit display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculation_details: Option<String>,
}

impl CostEntry {
    /// Flagged and not yet resolved: blocks trip completion.
    pub fn is_unresolved(&self) -> bool {
        self.is_flagged && self.investigation_status != Some(InvestigationStatus::Resolved)
    }
}

/// Cost types chargeable after completion, before invoicing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdditionalCostType {
    Demurrage,
    ClearingFees,
    TollCharges,
    Detention,
    EscortFees,
    Storage,
    Other,
}

/// A cost appended once the trip is completed or later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdditionalCost {
    pub id: String,
    pub trip_id: String,
    pub description: String,
    pub cost_type: AdditionalCostType,
    pub amount: f64,
    pub currency: Currency,
    #[serde(default)]
    pub supporting_documents: Vec<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub date: String,
    pub added_at: String,
    pub added_by: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayType {
    BorderDelays,
    Breakdown,
    CustomerNotReady,
    PaperworkIssues,
    WeatherConditions,
    Traffic,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelaySeverity {
    Minor,
    Moderate,
    Major,
    Critical,
}

/// A reported delay on the trip, with impact severity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayReason {
    pub id: String,
    pub trip_id: String,
    pub delay_type: DelayType,
    pub description: String,
    /// Duration in hours.
    pub delay_duration: f64,
    pub severity: DelaySeverity,
    pub reported_at: String,
    pub reported_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactMethod {
    Call,
    Email,
    Whatsapp,
    InPerson,
    Sms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowUpStatus {
    Pending,
    Completed,
    Escalated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowUpPriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpOutcome {
    NoResponse,
    PromisedPayment,
    Dispute,
    PaymentReceived,
    PartialPayment,
}

/// One payment follow-up contact on an invoiced trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpRecord {
    pub id: String,
    pub trip_id: String,
    pub follow_up_date: String,
    pub contact_method: ContactMethod,
    pub responsible_staff: String,
    pub response_summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_follow_up_date: Option<String>,
    pub status: FollowUpStatus,
    pub priority: FollowUpPriority,
    pub outcome: FollowUpOutcome,
}
