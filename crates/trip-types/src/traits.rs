//! Traits for the persistence collaborators: trip documents and the
//! append-only audit log.

use async_trait::async_trait;

use crate::{CostEditRecord, Trip, TripEditRecord};

/// Document store abstraction for trips. Writes are whole-document upserts
/// guarded by the trip's version counter; the collaborator owns atomicity
/// and authoritative timestamps.
#[async_trait]
pub trait TripStore: Send + Sync {
    /// Insert a new trip. Fails on duplicate id.
    async fn insert(&self, trip: Trip) -> Result<(), StoreError>;

    /// Fetch one trip by id.
    async fn get(&self, id: &str) -> Result<Option<Trip>, StoreError>;

    /// Compare-and-set write: succeeds only if the stored version equals
    /// `expected_version`, then stores the trip with the version bumped.
    /// Returns the stored trip.
    async fn update(&self, trip: Trip, expected_version: u32) -> Result<Trip, StoreError>;

    /// All trips, deterministically ordered by id.
    async fn list(&self) -> Result<Vec<Trip>, StoreError>;
}

/// Append-only audit log. No update or delete surface exists: records are
/// immutable once written.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append_trip(&self, record: TripEditRecord) -> Result<(), AuditStoreError>;

    async fn append_cost(&self, record: CostEditRecord) -> Result<(), AuditStoreError>;

    /// Edit records for one trip, in append order.
    async fn trip_history(&self, trip_id: &str) -> Result<Vec<TripEditRecord>, AuditStoreError>;

    /// Edit records for one cost entry, in append order.
    async fn cost_history(&self, cost_id: &str) -> Result<Vec<CostEditRecord>, AuditStoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("version conflict for trip {id}: expected {expected}, found {found}")]
    Conflict {
        id: String,
        expected: u32,
        found: u32,
    },
    #[error("trip not found: {0}")]
    NotFound(String),
    #[error("duplicate trip id: {0}")]
    Duplicate(String),
    #[error("store error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuditStoreError {
    #[error("audit store error: {0}")]
    Backend(String),
}
