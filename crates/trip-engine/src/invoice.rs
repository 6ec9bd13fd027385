//! Invoice submission gate: the only path from completed to invoiced.

use chrono::NaiveDate;
use trip_types::{
    EngineError, GateViolation, InvoiceDetails, InvoiceSubmission, PaymentStatus, TimelineStamps,
    Trip, TripChangeType, TripEditRecord, TripStatus, ValidationError,
};
use uuid::Uuid;

fn parse_date(s: &str) -> Option<NaiveDate> {
    // Accept a bare date or the date part of a datetime stamp.
    NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d").ok()
}

/// Fall back to actual, then planned, for any final stamp the caller left
/// unset, mirroring how the timeline is confirmed at submission time.
fn confirmed_timeline(trip: &Trip, submitted: &TimelineStamps) -> TimelineStamps {
    let pick = |submitted: &Option<String>, actual: &Option<String>, planned: &Option<String>| {
        submitted
            .clone()
            .or_else(|| actual.clone())
            .or_else(|| planned.clone())
    };
    TimelineStamps {
        arrival: pick(
            &submitted.arrival,
            &trip.timeline.actual.arrival,
            &trip.timeline.planned.arrival,
        ),
        offload: pick(
            &submitted.offload,
            &trip.timeline.actual.offload,
            &trip.timeline.planned.offload,
        ),
        departure: pick(
            &submitted.departure,
            &trip.timeline.actual.departure,
            &trip.timeline.planned.departure,
        ),
    }
}

/// Validate and apply an invoice submission to a completed trip. Records the
/// final reconciled timeline, marks it validated, attaches the delivery
/// documents, initializes payment tracking as unpaid, and advances the
/// status to invoiced. No invoice-number format policy is imposed.
pub fn submit_invoice(
    trip: &mut Trip,
    submission: &InvoiceSubmission,
    actor: &str,
) -> Result<TripEditRecord, EngineError> {
    if trip.status != TripStatus::Completed {
        return Err(GateViolation::WrongStatus {
            expected: TripStatus::Completed,
            actual: trip.status,
        }
        .into());
    }

    let mut errors = Vec::new();
    let number = submission.invoice_number.trim();
    if number.is_empty() {
        errors.push(ValidationError::new(
            "invoice_number",
            "Invoice number is required",
        ));
    }
    let invoice_date = parse_date(submission.invoice_date.trim());
    if invoice_date.is_none() {
        errors.push(ValidationError::new(
            "invoice_date",
            "Invoice date is required",
        ));
    }
    let due_date = parse_date(submission.invoice_due_date.trim());
    match (invoice_date, due_date) {
        (_, None) => errors.push(ValidationError::new(
            "invoice_due_date",
            "Invoice due date is required",
        )),
        (Some(invoiced), Some(due)) if due < invoiced => errors.push(ValidationError::new(
            "invoice_due_date",
            "Due date must be on or after the invoice date",
        )),
        _ => {}
    }
    if !errors.is_empty() {
        return Err(EngineError::Validation(errors));
    }

    let now = chrono::Utc::now().to_rfc3339();
    trip.timeline.final_confirmed = confirmed_timeline(trip, &submission.final_timeline);
    trip.timeline.validated = true;
    trip.timeline.validated_by = Some(actor.to_string());
    trip.timeline.validated_at = Some(now.clone());
    trip.proof_of_delivery
        .extend(submission.proof_of_delivery.iter().cloned());
    trip.signed_invoice
        .extend(submission.signed_invoice.iter().cloned());
    trip.invoice = Some(InvoiceDetails {
        number: number.to_string(),
        date: submission.invoice_date.trim().to_string(),
        due_date: submission.invoice_due_date.trim().to_string(),
        submitted_at: Some(now.clone()),
        submitted_by: Some(actor.to_string()),
        validation_notes: submission.validation_notes.clone(),
    });
    trip.payment.status = PaymentStatus::Unpaid;
    trip.status = TripStatus::Invoiced;

    Ok(TripEditRecord {
        id: Uuid::new_v4().to_string(),
        trip_id: trip.id.clone(),
        edited_by: actor.to_string(),
        edited_at: now,
        reason: format!("invoice {number} submitted"),
        field_changed: "status".to_string(),
        old_value: TripStatus::Completed.to_string(),
        new_value: TripStatus::Invoiced.to_string(),
        change_type: TripChangeType::StatusChange,
    })
}
