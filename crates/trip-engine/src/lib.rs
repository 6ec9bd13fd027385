//! Trip cost governance and lifecycle engine.
//!
//! Pure decision functions (validate, generate, can_complete, submit) plus a
//! [`TripEngine`] orchestrator that binds them to a [`trip_types::TripStore`]
//! and an append-only [`trip_types::AuditStore`]. Each mutation is one
//! read-decide-write unit per trip, committed with compare-and-set.

mod engine;
pub mod import;
mod invoice;
mod lifecycle;
mod system_costs;
mod validator;

pub use engine::TripEngine;
pub use invoice::submit_invoice;
pub use lifecycle::{
    apply_auto_completion, apply_field_edit, can_complete, complete, record_payment,
};
pub use system_costs::{generate, trip_duration_days};
pub use validator::{advance_investigation, CostValidator};
