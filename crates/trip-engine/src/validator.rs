//! Cost entry validation and flagging.
//!
//! Rules run in order and every failure is collected, so the caller can
//! surface all problems at once. Flags are ORed across the auto-flag and
//! manual-flag rules; a flagged entry always carries a non-empty reason.

use chrono::Utc;
use trip_types::{
    CostChangeType, CostEditRecord, CostEntry, CostTaxonomy, GateViolation, InvestigationStatus,
    NewCostEntry, Trip, ValidationError,
};
use uuid::Uuid;

/// Validates proposed manual cost entries against the injected taxonomy and
/// the trip's existing cost set.
pub struct CostValidator {
    taxonomy: CostTaxonomy,
}

impl CostValidator {
    pub fn new(taxonomy: CostTaxonomy) -> Self {
        Self { taxonomy }
    }

    pub fn taxonomy(&self) -> &CostTaxonomy {
        &self.taxonomy
    }

    /// Validate a proposed entry and, on success, return the normalized
    /// [`CostEntry`] ready for insertion. No side effects: persistence and
    /// audit are the caller's responsibility.
    pub fn validate(
        &self,
        trip: &Trip,
        proposed: &NewCostEntry,
        actor: &str,
    ) -> Result<CostEntry, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let category = proposed.category.trim();
        let sub_category = proposed.sub_category.trim();

        // Rule 1: closed taxonomy; the system category is generator-only.
        if category.is_empty() {
            errors.push(ValidationError::new("category", "Cost category is required"));
        } else if CostTaxonomy::is_system(category) {
            errors.push(ValidationError::new(
                "category",
                "System costs are automatically generated and cannot be manually added",
            ));
        } else if sub_category.is_empty() {
            errors.push(ValidationError::new(
                "sub_category",
                "Sub-cost type is required",
            ));
        } else if !self.taxonomy.contains(category, sub_category) {
            errors.push(ValidationError::new(
                "sub_category",
                format!("'{sub_category}' is not a valid sub-cost type for '{category}'"),
            ));
        }

        // Rule 2: amount must be a number greater than zero.
        if !proposed.amount.is_finite() {
            errors.push(ValidationError::new("amount", "Amount must be a valid number"));
        } else if proposed.amount <= 0.0 {
            errors.push(ValidationError::new(
                "amount",
                "Amount must be greater than 0",
            ));
        }

        // Rule 3: reference, date, and currency are required.
        let reference = proposed.reference_number.trim();
        if reference.is_empty() {
            errors.push(ValidationError::new(
                "reference_number",
                "Reference number is required",
            ));
        } else if trip.reference_in_use(reference) {
            // Rule 4: case-insensitive collision against non-system entries.
            errors.push(ValidationError::new(
                "reference_number",
                "Reference number already used in another cost entry",
            ));
        }
        if proposed.date.trim().is_empty() {
            errors.push(ValidationError::new("date", "Date is required"));
        }
        if proposed.currency.is_none() {
            errors.push(ValidationError::new("currency", "Currency is required"));
        }

        // Rule 5: documentation is mandatory. A missing attachment without a
        // stated reason is a hard failure, not a flag.
        let has_attachments = proposed.has_attachments();
        let no_document_reason = proposed.trimmed_no_document_reason();
        if !has_attachments && no_document_reason.is_none() {
            errors.push(ValidationError::new(
                "documents",
                "Either attach a receipt/document or provide a reason for missing documentation",
            ));
        }

        // Rule 8 precondition: a manual flag request needs a reason.
        let manual_reason = proposed.trimmed_flag_reason();
        if proposed.flag_requested && manual_reason.is_none() {
            errors.push(ValidationError::new(
                "flag_reason",
                "Flag reason is required when manually flagging a cost entry",
            ));
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        // Rules 6-8: flag derivation. ORed, never replaced; the caller's
        // reason wins over auto-generated ones.
        let is_high_risk = self.taxonomy.is_high_risk(category);
        let missing_documentation = !has_attachments && no_document_reason.is_some();
        let is_flagged = proposed.flag_requested || is_high_risk || missing_documentation;

        let flag_reason = if is_flagged {
            if let Some(reason) = manual_reason.filter(|_| proposed.flag_requested) {
                Some(reason.to_string())
            } else if is_high_risk {
                Some(format!(
                    "High-risk category: {category} - {sub_category} requires review"
                ))
            } else {
                no_document_reason.map(|r| format!("Missing documentation: {r}"))
            }
        } else {
            None
        };

        let now = Utc::now().to_rfc3339();
        Ok(CostEntry {
            id: Uuid::new_v4().to_string(),
            trip_id: trip.id.clone(),
            category: category.to_string(),
            sub_category: sub_category.to_string(),
            amount: proposed.amount,
            currency: proposed.currency.unwrap_or(trip.revenue_currency),
            reference_number: reference.to_string(),
            date: proposed.date.trim().to_string(),
            notes: proposed
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            attachments: proposed.attachments.clone(),
            is_flagged,
            flag_reason,
            no_document_reason: no_document_reason.map(String::from),
            investigation_status: is_flagged.then_some(InvestigationStatus::Pending),
            investigation_notes: None,
            flagged_at: is_flagged.then(|| now.clone()),
            flagged_by: is_flagged.then(|| actor.to_string()),
            resolved_at: None,
            resolved_by: None,
            is_system_generated: false,
            system_cost_type: None,
            calculation_details: None,
        })
    }
}

/// Advance a flagged entry's investigation by exactly one step:
/// pending -> in-progress -> resolved. Returns the audit record for the
/// transition; the caller commits both.
pub fn advance_investigation(
    entry: &mut CostEntry,
    next: InvestigationStatus,
    actor: &str,
    notes: Option<&str>,
) -> Result<CostEditRecord, GateViolation> {
    if !entry.is_flagged {
        return Err(GateViolation::NotUnderInvestigation);
    }
    let current = entry
        .investigation_status
        .ok_or(GateViolation::NotUnderInvestigation)?;
    if !current.can_advance_to(next) {
        return Err(GateViolation::InvalidInvestigation {
            from: current,
            to: next,
        });
    }

    let now = Utc::now().to_rfc3339();
    entry.investigation_status = Some(next);
    if let Some(notes) = notes.map(str::trim).filter(|s| !s.is_empty()) {
        entry.investigation_notes = Some(match entry.investigation_notes.take() {
            Some(existing) => format!("{existing}\n{notes}"),
            None => notes.to_string(),
        });
    }
    if next == InvestigationStatus::Resolved {
        entry.resolved_at = Some(now.clone());
        entry.resolved_by = Some(actor.to_string());
    }

    Ok(CostEditRecord {
        id: Uuid::new_v4().to_string(),
        cost_id: entry.id.clone(),
        edited_by: actor.to_string(),
        edited_at: now,
        reason: "investigation status advanced".to_string(),
        field_changed: "investigation_status".to_string(),
        old_value: current.to_string(),
        new_value: next.to_string(),
        change_type: CostChangeType::Investigation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use trip_types::{Attachment, ClientType, Currency, NewTrip};

    fn trip() -> Trip {
        NewTrip {
            fleet_number: "23H".to_string(),
            driver_name: "P. Moyo".to_string(),
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
        .into_trip("t1".to_string())
    }

    fn attachment() -> Attachment {
        Attachment {
            id: "a1".to_string(),
            filename: "receipt.pdf".to_string(),
            file_url: "files/receipt.pdf".to_string(),
            file_type: None,
            uploaded_at: None,
        }
    }

    fn proposed(category: &str, sub_category: &str) -> NewCostEntry {
        NewCostEntry {
            category: category.to_string(),
            sub_category: sub_category.to_string(),
            amount: 250.0,
            currency: Some(Currency::Zar),
            reference_number: "REF-001".to_string(),
            date: "2024-03-02".to_string(),
            notes: None,
            no_document_reason: None,
            flag_requested: false,
            flag_reason: None,
            attachments: vec![attachment()],
        }
    }

    fn validator() -> CostValidator {
        CostValidator::new(CostTaxonomy::default())
    }

    #[test]
    fn accepts_valid_entry_without_flags() {
        let entry = validator()
            .validate(&trip(), &proposed("Trip Allowances", "Food"), "ops")
            .unwrap();
        assert!(!entry.is_flagged);
        assert!(entry.flag_reason.is_none());
        assert!(entry.investigation_status.is_none());
        assert!(!entry.is_system_generated);
    }

    #[test]
    fn high_risk_category_is_auto_flagged_even_with_documentation() {
        let entry = validator()
            .validate(&trip(), &proposed("Border Costs", "Gate Pass"), "ops")
            .unwrap();
        assert!(entry.is_flagged);
        assert_eq!(
            entry.flag_reason.as_deref(),
            Some("High-risk category: Border Costs - Gate Pass requires review")
        );
        assert_eq!(entry.investigation_status, Some(InvestigationStatus::Pending));
    }

    #[test]
    fn missing_documentation_without_reason_is_a_hard_failure() {
        let mut req = proposed("Border Costs", "Gate Pass");
        req.attachments.clear();
        let errors = validator().validate(&trip(), &req, "ops").unwrap_err();
        assert!(errors.iter().any(|e| e.field == "documents"));
    }

    #[test]
    fn missing_documentation_with_reason_flags_the_entry() {
        let mut req = proposed("Trip Allowances", "Airtime");
        req.attachments.clear();
        req.no_document_reason = Some("receipt lost at border".to_string());
        let entry = validator().validate(&trip(), &req, "ops").unwrap();
        assert!(entry.is_flagged);
        assert_eq!(
            entry.flag_reason.as_deref(),
            Some("Missing documentation: receipt lost at border")
        );
    }

    #[test]
    fn manual_flag_reason_takes_precedence_over_auto_reason() {
        let mut req = proposed("Border Costs", "Gate Pass");
        req.flag_requested = true;
        req.flag_reason = Some("amount looks inflated".to_string());
        let entry = validator().validate(&trip(), &req, "ops").unwrap();
        assert!(entry.is_flagged);
        assert_eq!(entry.flag_reason.as_deref(), Some("amount looks inflated"));
    }

    #[test]
    fn manual_flag_without_reason_is_rejected() {
        let mut req = proposed("Trip Allowances", "Food");
        req.flag_requested = true;
        let errors = validator().validate(&trip(), &req, "ops").unwrap_err();
        assert!(errors.iter().any(|e| e.field == "flag_reason"));
    }

    #[test]
    fn system_category_is_rejected_for_manual_entries() {
        let req = proposed("System Costs", "Wages");
        let errors = validator().validate(&trip(), &req, "ops").unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.field == "category" && e.message.contains("automatically generated")));
    }

    #[test]
    fn unknown_sub_category_is_rejected() {
        let req = proposed("Tolls", "Food");
        let errors = validator().validate(&trip(), &req, "ops").unwrap_err();
        assert!(errors.iter().any(|e| e.field == "sub_category"));
    }

    #[test]
    fn duplicate_reference_is_rejected_case_insensitively() {
        let mut trip = trip();
        let existing = validator()
            .validate(&trip, &proposed("Trip Allowances", "Food"), "ops")
            .unwrap();
        trip.costs.push(existing);

        let mut req = proposed("Trip Allowances", "Taxi");
        req.reference_number = "ref-001".to_string();
        let errors = validator().validate(&trip, &req, "ops").unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.field == "reference_number" && e.message.contains("already used")));
    }

    #[test]
    fn all_failures_are_reported_simultaneously() {
        let req = NewCostEntry {
            category: String::new(),
            sub_category: String::new(),
            amount: -4.0,
            currency: None,
            reference_number: String::new(),
            date: String::new(),
            notes: None,
            no_document_reason: None,
            flag_requested: false,
            flag_reason: None,
            attachments: Vec::new(),
        };
        let errors = validator().validate(&trip(), &req, "ops").unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        for expected in ["category", "amount", "reference_number", "date", "currency", "documents"] {
            assert!(fields.contains(&expected), "missing {expected}: {fields:?}");
        }
    }

    #[test]
    fn investigation_advances_one_step_at_a_time() {
        let mut entry = validator()
            .validate(&trip(), &proposed("Border Costs", "Gate Pass"), "ops")
            .unwrap();

        // Skipping straight to resolved is illegal.
        let err =
            advance_investigation(&mut entry, InvestigationStatus::Resolved, "ops", None)
                .unwrap_err();
        assert!(matches!(err, GateViolation::InvalidInvestigation { .. }));

        advance_investigation(&mut entry, InvestigationStatus::InProgress, "ops", None).unwrap();
        let record =
            advance_investigation(&mut entry, InvestigationStatus::Resolved, "ops", Some("ok"))
                .unwrap();
        assert_eq!(record.old_value, "in-progress");
        assert_eq!(record.new_value, "resolved");
        assert!(entry.resolved_at.is_some());
        assert_eq!(entry.resolved_by.as_deref(), Some("ops"));

        // No reversal once resolved.
        let err =
            advance_investigation(&mut entry, InvestigationStatus::InProgress, "ops", None)
                .unwrap_err();
        assert!(matches!(err, GateViolation::InvalidInvestigation { .. }));
    }

    #[test]
    fn unflagged_entry_has_no_investigation_to_advance() {
        let mut entry = validator()
            .validate(&trip(), &proposed("Trip Allowances", "Food"), "ops")
            .unwrap();
        let err =
            advance_investigation(&mut entry, InvestigationStatus::InProgress, "ops", None)
                .unwrap_err();
        assert!(matches!(err, GateViolation::NotUnderInvestigation));
    }
}
