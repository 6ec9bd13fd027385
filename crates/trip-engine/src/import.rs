//! Boundary normalization for externally imported trips.
//!
//! Web-imported records arrive with a wider status vocabulary than the state
//! machine's four canonical states. The mapping happens here, at the system
//! boundary; the state machine never absorbs external vocabulary.

use trip_types::TripStatus;

/// Map an external status string to a canonical [`TripStatus`]. Returns
/// `None` for unknown vocabulary, which the caller must reject rather than
/// pass through.
pub fn normalize_status(raw: &str) -> Option<TripStatus> {
    let normalized = raw.trim().to_ascii_lowercase().replace([' ', '-'], "_");
    match normalized.as_str() {
        "active" | "booked" | "confirmed" | "loaded" | "shipped" | "in_transit" => {
            Some(TripStatus::Active)
        }
        "completed" | "delivered" => Some(TripStatus::Completed),
        "invoiced" => Some(TripStatus::Invoiced),
        "paid" => Some(TripStatus::Paid),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_vocabulary_maps_to_canonical_statuses() {
        assert_eq!(normalize_status("shipped"), Some(TripStatus::Active));
        assert_eq!(normalize_status("In Transit"), Some(TripStatus::Active));
        assert_eq!(normalize_status("booked"), Some(TripStatus::Active));
        assert_eq!(normalize_status("delivered"), Some(TripStatus::Completed));
    }

    #[test]
    fn canonical_statuses_pass_through() {
        assert_eq!(normalize_status("active"), Some(TripStatus::Active));
        assert_eq!(normalize_status("completed"), Some(TripStatus::Completed));
        assert_eq!(normalize_status("invoiced"), Some(TripStatus::Invoiced));
        assert_eq!(normalize_status("paid"), Some(TripStatus::Paid));
    }

    #[test]
    fn unknown_vocabulary_is_rejected() {
        assert_eq!(normalize_status("archived"), None);
        assert_eq!(normalize_status(""), None);
    }
}
