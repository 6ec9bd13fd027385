//! In-memory AuditStore (process lifetime only).

use std::sync::Arc;

use tokio::sync::RwLock;
use trip_types::{AuditStore, AuditStoreError, CostEditRecord, TripEditRecord};

/// In-memory implementation of the append-only audit log. Reads return
/// clones; nothing mutates a record after append.
pub struct InMemoryAuditLog {
    trip_records: Arc<RwLock<Vec<TripEditRecord>>>,
    cost_records: Arc<RwLock<Vec<CostEditRecord>>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self {
            trip_records: Arc::new(RwLock::new(Vec::new())),
            cost_records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Total number of records across both ledgers.
    pub async fn len(&self) -> usize {
        self.trip_records.read().await.len() + self.cost_records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AuditStore for InMemoryAuditLog {
    async fn append_trip(&self, record: TripEditRecord) -> Result<(), AuditStoreError> {
        self.trip_records.write().await.push(record);
        Ok(())
    }

    async fn append_cost(&self, record: CostEditRecord) -> Result<(), AuditStoreError> {
        self.cost_records.write().await.push(record);
        Ok(())
    }

    async fn trip_history(&self, trip_id: &str) -> Result<Vec<TripEditRecord>, AuditStoreError> {
        let guard = self.trip_records.read().await;
        Ok(guard
            .iter()
            .filter(|r| r.trip_id == trip_id)
            .cloned()
            .collect())
    }

    async fn cost_history(&self, cost_id: &str) -> Result<Vec<CostEditRecord>, AuditStoreError> {
        let guard = self.cost_records.read().await;
        Ok(guard
            .iter()
            .filter(|r| r.cost_id == cost_id)
            .cloned()
            .collect())
    }
}
