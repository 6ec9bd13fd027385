//! Trip lifecycle state machine: active -> completed -> invoiced -> paid.
//!
//! Pure transition functions over the trip aggregate. Each successful
//! transition or field edit returns the audit record describing it; the
//! orchestrator commits trip and record together.

use chrono::Utc;
use trip_types::{
    EngineError, GateViolation, PaymentStatus, PaymentUpdate, Trip, TripChangeType,
    TripEditRecord, TripField, TripFieldEdit, TripStatus, ValidationError,
};
use uuid::Uuid;

fn status_record(
    trip: &Trip,
    from: TripStatus,
    to: TripStatus,
    actor: &str,
    reason: &str,
    change_type: TripChangeType,
    at: String,
) -> TripEditRecord {
    TripEditRecord {
        id: Uuid::new_v4().to_string(),
        trip_id: trip.id.clone(),
        edited_by: actor.to_string(),
        edited_at: at,
        reason: reason.to_string(),
        field_changed: "status".to_string(),
        old_value: from.to_string(),
        new_value: to.to_string(),
        change_type,
    }
}

/// A trip may complete once no flagged entry remains unresolved.
pub fn can_complete(trip: &Trip) -> bool {
    trip.unresolved_flag_count() == 0
}

/// active -> completed, gated on the unresolved-flag ledger. The trip is
/// untouched when the gate rejects.
pub fn complete(trip: &mut Trip, actor: &str) -> Result<TripEditRecord, GateViolation> {
    if trip.status != TripStatus::Active {
        return Err(GateViolation::WrongStatus {
            expected: TripStatus::Active,
            actual: trip.status,
        });
    }
    let unresolved = trip.unresolved_flag_count();
    if unresolved > 0 {
        return Err(GateViolation::UnresolvedFlags { count: unresolved });
    }

    let now = Utc::now().to_rfc3339();
    trip.status = TripStatus::Completed;
    trip.completed_at = Some(now.clone());
    trip.completed_by = Some(actor.to_string());
    Ok(status_record(
        trip,
        TripStatus::Active,
        TripStatus::Completed,
        actor,
        "trip completed",
        TripChangeType::Completion,
        now,
    ))
}

/// Accept an external resolver's auto-completion as equivalent to the manual
/// transition. The flag-count gate is NOT re-applied here; the reason string
/// is trusted input.
pub fn apply_auto_completion(
    trip: &mut Trip,
    reason: &str,
    at: &str,
) -> Result<TripEditRecord, GateViolation> {
    if trip.status != TripStatus::Active {
        return Err(GateViolation::WrongStatus {
            expected: TripStatus::Active,
            actual: trip.status,
        });
    }

    trip.status = TripStatus::Completed;
    trip.completed_at = Some(at.to_string());
    trip.auto_completed_at = Some(at.to_string());
    trip.auto_completed_reason = Some(reason.to_string());
    Ok(status_record(
        trip,
        TripStatus::Active,
        TripStatus::Completed,
        "system",
        reason,
        TripChangeType::AutoCompletion,
        at.to_string(),
    ))
}

/// Record a payment against an invoiced trip. A full payment advances the
/// trip to paid; a partial payment updates tracking but does not advance the
/// status until fully reconciled.
pub fn record_payment(
    trip: &mut Trip,
    update: &PaymentUpdate,
    actor: &str,
) -> Result<TripEditRecord, GateViolation> {
    if trip.status != TripStatus::Invoiced {
        return Err(GateViolation::WrongStatus {
            expected: TripStatus::Invoiced,
            actual: trip.status,
        });
    }
    if update.status != PaymentStatus::Unpaid && update.amount <= 0.0 {
        return Err(GateViolation::PaymentAmountMissing);
    }

    let now = Utc::now().to_rfc3339();
    let previous = trip.payment.status;
    trip.payment.status = update.status;
    trip.payment.amount = Some(update.amount);
    trip.payment.method = update.method.clone();
    trip.payment.bank_reference = update.bank_reference.clone();
    trip.payment.received_date = update.received_date.clone();

    if update.status == PaymentStatus::Paid {
        trip.status = TripStatus::Paid;
        return Ok(status_record(
            trip,
            TripStatus::Invoiced,
            TripStatus::Paid,
            actor,
            "payment received in full",
            TripChangeType::StatusChange,
            now,
        ));
    }

    Ok(TripEditRecord {
        id: Uuid::new_v4().to_string(),
        trip_id: trip.id.clone(),
        edited_by: actor.to_string(),
        edited_at: now,
        reason: "payment tracking updated".to_string(),
        field_changed: "payment_status".to_string(),
        old_value: previous.to_string(),
        new_value: update.status.to_string(),
        change_type: TripChangeType::Update,
    })
}

/// Apply one audited field edit to an active trip. The reason is mandatory;
/// the returned record captures old and new values.
pub fn apply_field_edit(
    trip: &mut Trip,
    edit: &TripFieldEdit,
    actor: &str,
) -> Result<TripEditRecord, EngineError> {
    if trip.status != TripStatus::Active {
        return Err(GateViolation::WrongStatus {
            expected: TripStatus::Active,
            actual: trip.status,
        }
        .into());
    }
    let reason = edit.reason.trim();
    if reason.is_empty() {
        return Err(EngineError::Validation(vec![ValidationError::new(
            "reason",
            "An edit reason is required",
        )]));
    }

    let new_value = edit.new_value.trim();
    let parse_number = |field: &str| -> Result<f64, EngineError> {
        new_value.parse::<f64>().map_err(|_| {
            EngineError::Validation(vec![ValidationError::new(
                field,
                format!("'{new_value}' is not a valid number"),
            )])
        })
    };

    let old_value = match edit.field {
        TripField::Route => std::mem::replace(&mut trip.route, new_value.to_string()),
        TripField::Description => {
            let old = trip.description.take().unwrap_or_default();
            trip.description = Some(new_value.to_string()).filter(|s| !s.is_empty());
            old
        }
        TripField::DriverName => std::mem::replace(&mut trip.driver_name, new_value.to_string()),
        TripField::ClientName => std::mem::replace(&mut trip.client_name, new_value.to_string()),
        TripField::FleetNumber => std::mem::replace(&mut trip.fleet_number, new_value.to_string()),
        TripField::StartDate => std::mem::replace(&mut trip.start_date, new_value.to_string()),
        TripField::EndDate => std::mem::replace(&mut trip.end_date, new_value.to_string()),
        TripField::BaseRevenue => {
            let parsed = parse_number("base_revenue")?;
            let old = trip.base_revenue;
            trip.base_revenue = parsed;
            old.to_string()
        }
        TripField::DistanceKm => {
            let parsed = parse_number("distance_km")?;
            let old = trip.distance_km.map(|d| d.to_string()).unwrap_or_default();
            trip.distance_km = Some(parsed);
            old
        }
    };

    Ok(TripEditRecord {
        id: Uuid::new_v4().to_string(),
        trip_id: trip.id.clone(),
        edited_by: actor.to_string(),
        edited_at: Utc::now().to_rfc3339(),
        reason: reason.to_string(),
        field_changed: edit.field.as_str().to_string(),
        old_value,
        new_value: new_value.to_string(),
        change_type: TripChangeType::Update,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::CostValidator;
    use trip_types::{
        Attachment, ClientType, CostTaxonomy, Currency, InvestigationStatus, NewCostEntry, NewTrip,
    };

    fn trip() -> Trip {
        NewTrip {
            fleet_number: "26H".to_string(),
            driver_name: "B. Chikane".to_string(),
            client_name: "Acme Produce".to_string(),
            client_type: ClientType::Internal,
            route: "Harare - Lusaka".to_string(),
            description: None,
            start_date: "2024-04-01".to_string(),
            end_date: "2024-04-04".to_string(),
            base_revenue: 18_000.0,
            revenue_currency: Currency::Usd,
            distance_km: Some(490.0),
            planned_timeline: Default::default(),
            booking_source: Default::default(),
            load_ref: None,
        }
        .into_trip("t1".to_string())
    }

    fn flagged_cost(trip: &Trip) -> trip_types::CostEntry {
        CostValidator::new(CostTaxonomy::default())
            .validate(
                trip,
                &NewCostEntry {
                    category: "Border Costs".to_string(),
                    sub_category: "Gate Pass".to_string(),
                    amount: 120.0,
                    currency: Some(Currency::Usd),
                    reference_number: "GP-14".to_string(),
                    date: "2024-04-02".to_string(),
                    notes: None,
                    no_document_reason: None,
                    flag_requested: false,
                    flag_reason: None,
                    attachments: vec![Attachment {
                        id: "a1".to_string(),
                        filename: "gatepass.jpg".to_string(),
                        file_url: "files/gatepass.jpg".to_string(),
                        file_type: None,
                        uploaded_at: None,
                    }],
                },
                "ops",
            )
            .unwrap()
    }

    #[test]
    fn completion_is_gated_on_unresolved_flags() {
        let mut trip = trip();
        let cost = flagged_cost(&trip);
        trip.costs.push(cost);

        assert!(!can_complete(&trip));
        let err = complete(&mut trip, "ops").unwrap_err();
        assert_eq!(err, GateViolation::UnresolvedFlags { count: 1 });
        // Gate rejection leaves the trip unchanged.
        assert_eq!(trip.status, TripStatus::Active);
        assert!(trip.completed_at.is_none());

        trip.costs[0].investigation_status = Some(InvestigationStatus::Resolved);
        assert!(can_complete(&trip));
        let record = complete(&mut trip, "ops").unwrap();
        assert_eq!(trip.status, TripStatus::Completed);
        assert_eq!(trip.completed_by.as_deref(), Some("ops"));
        assert_eq!(record.change_type, TripChangeType::Completion);
        assert_eq!(record.old_value, "active");
        assert_eq!(record.new_value, "completed");
    }

    #[test]
    fn completion_requires_an_active_trip() {
        let mut trip = trip();
        trip.status = TripStatus::Completed;
        let err = complete(&mut trip, "ops").unwrap_err();
        assert!(matches!(err, GateViolation::WrongStatus { .. }));
    }

    #[test]
    fn auto_completion_skips_the_flag_gate() {
        let mut trip = trip();
        let cost = flagged_cost(&trip);
        trip.costs.push(cost);
        assert!(!can_complete(&trip));

        let record = apply_auto_completion(
            &mut trip,
            "all investigations closed by resolver",
            "2024-04-05T08:00:00Z",
        )
        .unwrap();
        assert_eq!(trip.status, TripStatus::Completed);
        assert_eq!(
            trip.auto_completed_reason.as_deref(),
            Some("all investigations closed by resolver")
        );
        assert_eq!(record.change_type, TripChangeType::AutoCompletion);
    }

    #[test]
    fn partial_payment_does_not_advance_past_invoiced() {
        let mut trip = trip();
        trip.status = TripStatus::Invoiced;

        let record = record_payment(
            &mut trip,
            &PaymentUpdate {
                status: PaymentStatus::Partial,
                amount: 9_000.0,
                method: Some("EFT".to_string()),
                bank_reference: Some("FNB-2211".to_string()),
                received_date: Some("2024-05-01".to_string()),
            },
            "finance",
        )
        .unwrap();
        assert_eq!(trip.status, TripStatus::Invoiced);
        assert_eq!(trip.payment.status, PaymentStatus::Partial);
        assert_eq!(record.change_type, TripChangeType::Update);

        let record = record_payment(
            &mut trip,
            &PaymentUpdate {
                status: PaymentStatus::Paid,
                amount: 18_000.0,
                method: Some("EFT".to_string()),
                bank_reference: None,
                received_date: Some("2024-05-20".to_string()),
            },
            "finance",
        )
        .unwrap();
        assert_eq!(trip.status, TripStatus::Paid);
        assert_eq!(record.new_value, "paid");
    }

    #[test]
    fn payment_without_amount_is_rejected() {
        let mut trip = trip();
        trip.status = TripStatus::Invoiced;
        let err = record_payment(
            &mut trip,
            &PaymentUpdate {
                status: PaymentStatus::Paid,
                amount: 0.0,
                method: None,
                bank_reference: None,
                received_date: None,
            },
            "finance",
        )
        .unwrap_err();
        assert_eq!(err, GateViolation::PaymentAmountMissing);
        assert_eq!(trip.status, TripStatus::Invoiced);
    }

    #[test]
    fn field_edits_capture_old_and_new_values() {
        let mut trip = trip();
        let record = apply_field_edit(
            &mut trip,
            &TripFieldEdit {
                field: TripField::Route,
                new_value: "Harare - Ndola".to_string(),
                reason: "Route modification due to operational requirements".to_string(),
            },
            "ops",
        )
        .unwrap();
        assert_eq!(trip.route, "Harare - Ndola");
        assert_eq!(record.old_value, "Harare - Lusaka");
        assert_eq!(record.new_value, "Harare - Ndola");
        assert_eq!(record.field_changed, "route");
    }

    #[test]
    fn field_edits_require_a_reason_and_an_active_trip() {
        let mut trip = trip();
        let err = apply_field_edit(
            &mut trip,
            &TripFieldEdit {
                field: TripField::Route,
                new_value: "Harare - Ndola".to_string(),
                reason: "  ".to_string(),
            },
            "ops",
        )
        .unwrap_err();
        assert!(err.validation_errors().is_some());

        trip.status = TripStatus::Completed;
        let err = apply_field_edit(
            &mut trip,
            &TripFieldEdit {
                field: TripField::Route,
                new_value: "Harare - Ndola".to_string(),
                reason: "Client requested change".to_string(),
            },
            "ops",
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Gate(_)));
    }

    #[test]
    fn numeric_field_edits_validate_the_value() {
        let mut trip = trip();
        let err = apply_field_edit(
            &mut trip,
            &TripFieldEdit {
                field: TripField::BaseRevenue,
                new_value: "not-a-number".to_string(),
                reason: "Revenue adjustment per contract amendment".to_string(),
            },
            "ops",
        )
        .unwrap_err();
        assert!(err.validation_errors().is_some());
        assert_eq!(trip.base_revenue, 18_000.0);
    }
}
