//! Immutable audit records: who changed what, when, and why.
//!
//! Records are append-only. Nothing in the engine updates or deletes one.

use serde::{Deserialize, Serialize};

use crate::Trip;

/// Classification of a trip mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripChangeType {
    Update,
    StatusChange,
    Completion,
    AutoCompletion,
}

/// Classification of a cost entry mutation. Creation records carry an
/// empty old value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostChangeType {
    Creation,
    Update,
    FlagStatus,
    Investigation,
}

/// One field mutation on a trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripEditRecord {
    pub id: String,
    pub trip_id: String,
    pub edited_by: String,
    /// Advisory RFC3339 stamp; the persistence collaborator owns the
    /// authoritative clock.
    pub edited_at: String,
    pub reason: String,
    pub field_changed: String,
    pub old_value: String,
    pub new_value: String,
    pub change_type: TripChangeType,
}

/// One field mutation on a cost entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostEditRecord {
    pub id: String,
    pub cost_id: String,
    pub edited_by: String,
    pub edited_at: String,
    pub reason: String,
    pub field_changed: String,
    pub old_value: String,
    pub new_value: String,
    pub change_type: CostChangeType,
}

/// Snapshot produced instead of a hard delete. The caller owns persisting
/// it; the engine never removes trip documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripDeletionRecord {
    pub id: String,
    pub trip_id: String,
    pub deleted_by: String,
    pub deleted_at: String,
    pub reason: String,
    /// Full serialized trip at deletion time.
    pub trip_data: String,
    pub total_revenue: f64,
    pub total_costs: f64,
    pub cost_entries_count: usize,
    pub flagged_items_count: usize,
}

impl TripDeletionRecord {
    /// Build the snapshot for a trip about to be removed by the caller.
    pub fn snapshot(
        trip: &Trip,
        deleted_by: &str,
        reason: &str,
        deleted_at: String,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            trip_id: trip.id.clone(),
            deleted_by: deleted_by.to_string(),
            deleted_at,
            reason: reason.to_string(),
            trip_data: serde_json::to_string(trip)?,
            total_revenue: trip.base_revenue,
            total_costs: trip.total_costs(),
            cost_entries_count: trip.costs.len(),
            flagged_items_count: trip.flagged_cost_count(),
        })
    }
}
