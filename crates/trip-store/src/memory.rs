//! In-memory TripStore with compare-and-set writes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use trip_types::{StoreError, Trip, TripStore};

/// In-memory document store keyed by trip id. Writes are whole-document
/// replacements guarded by the trip's version counter, so two writers
/// racing on the same trip cannot both commit against a stale snapshot.
pub struct InMemoryTripStore {
    trips: Arc<RwLock<HashMap<String, Trip>>>,
}

impl InMemoryTripStore {
    pub fn new() -> Self {
        Self {
            trips: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryTripStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TripStore for InMemoryTripStore {
    async fn insert(&self, mut trip: Trip) -> Result<(), StoreError> {
        let mut guard = self.trips.write().await;
        if guard.contains_key(&trip.id) {
            return Err(StoreError::Duplicate(trip.id));
        }
        trip.version = 0;
        guard.insert(trip.id.clone(), trip);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Trip>, StoreError> {
        let guard = self.trips.read().await;
        Ok(guard.get(id).cloned())
    }

    async fn update(&self, mut trip: Trip, expected_version: u32) -> Result<Trip, StoreError> {
        let mut guard = self.trips.write().await;
        let current = guard
            .get(&trip.id)
            .ok_or_else(|| StoreError::NotFound(trip.id.clone()))?;
        if current.version != expected_version {
            return Err(StoreError::Conflict {
                id: trip.id.clone(),
                expected: expected_version,
                found: current.version,
            });
        }
        trip.version = expected_version + 1;
        let stored = trip.clone();
        guard.insert(trip.id.clone(), trip);
        Ok(stored)
    }

    async fn list(&self) -> Result<Vec<Trip>, StoreError> {
        let guard = self.trips.read().await;
        let mut trips: Vec<Trip> = guard.values().cloned().collect();
        // Deterministic ordering regardless of hash-map iteration.
        trips.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(trips)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trip_types::{ClientType, Currency, NewTrip};

    fn sample_trip(id: &str) -> Trip {
        NewTrip {
            fleet_number: "21H".to_string(),
            driver_name: "T. Ncube".to_string(),
            client_name: "Acme Produce".to_string(),
            client_type: ClientType::External,
            route: "Harare - Johannesburg".to_string(),
            description: None,
            start_date: "2024-03-01".to_string(),
            end_date: "2024-03-06".to_string(),
            base_revenue: 45_000.0,
            revenue_currency: Currency::Zar,
            distance_km: Some(1_200.0),
            planned_timeline: Default::default(),
            booking_source: Default::default(),
            load_ref: None,
        }
        .into_trip(id.to_string())
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_ids() {
        let store = InMemoryTripStore::new();
        store.insert(sample_trip("t1")).await.unwrap();
        let err = store.insert(sample_trip("t1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(id) if id == "t1"));
    }

    #[tokio::test]
    async fn update_bumps_version_and_rejects_stale_writers() {
        let store = InMemoryTripStore::new();
        store.insert(sample_trip("t1")).await.unwrap();

        let snapshot = store.get("t1").await.unwrap().unwrap();
        assert_eq!(snapshot.version, 0);

        let mut first = snapshot.clone();
        first.route = "Harare - Durban".to_string();
        let stored = store.update(first, snapshot.version).await.unwrap();
        assert_eq!(stored.version, 1);

        // Second writer still holds version 0.
        let mut stale = snapshot.clone();
        stale.route = "Harare - Cape Town".to_string();
        let err = store.update(stale, snapshot.version).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Conflict {
                expected: 0,
                found: 1,
                ..
            }
        ));

        let current = store.get("t1").await.unwrap().unwrap();
        assert_eq!(current.route, "Harare - Durban");
    }

    #[tokio::test]
    async fn list_is_sorted_by_id() {
        let store = InMemoryTripStore::new();
        store.insert(sample_trip("t2")).await.unwrap();
        store.insert(sample_trip("t1")).await.unwrap();
        store.insert(sample_trip("t3")).await.unwrap();

        let ids: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["t1", "t2", "t3"]);
    }
}
