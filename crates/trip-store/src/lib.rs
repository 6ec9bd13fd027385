//! Trip document store with per-trip optimistic versioning.

mod memory;

pub use memory::InMemoryTripStore;
pub use trip_types::{StoreError, TripStore};
