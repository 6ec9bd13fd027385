//! Orchestrator binding the decision functions to the stores.
//!
//! Every mutation is one read-decide-write unit per trip: load a snapshot,
//! evaluate the rules against it, commit with compare-and-set. A version
//! conflict means another writer landed first; the operation re-reads and
//! re-evaluates against the fresh snapshot, so rule checks (duplicate
//! references, gates) never pass against stale state. Backend failures are
//! propagated unchanged and never retried.

use chrono::Utc;
use trip_types::{
    AdditionalCost, AuditStore, CostChangeType, CostEditRecord, CostEntry, CostTaxonomy,
    DelayReason, EngineError, FollowUpRecord, GateViolation, InvestigationStatus,
    InvoiceSubmission, NewAdditionalCost, NewCostEntry, NewDelayReason, NewFollowUp, NewTrip,
    PaymentUpdate, StoreError, SystemCostRates, Trip, TripChangeType, TripDeletionRecord,
    TripEditRecord, TripFieldEdit, TripStatus, TripStore, ValidationError,
};
use uuid::Uuid;

use crate::{invoice, lifecycle, system_costs, validator, CostValidator};

/// The governance engine over a trip store and an append-only audit log.
pub struct TripEngine<S, A> {
    store: S,
    audit: A,
    validator: CostValidator,
}

impl<S, A> TripEngine<S, A>
where
    S: TripStore,
    A: AuditStore,
{
    pub fn new(store: S, audit: A, taxonomy: CostTaxonomy) -> Self {
        Self {
            store,
            audit,
            validator: CostValidator::new(taxonomy),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn audit(&self) -> &A {
        &self.audit
    }

    fn now() -> String {
        Utc::now().to_rfc3339()
    }

    async fn load(&self, trip_id: &str) -> Result<Trip, EngineError> {
        self.store
            .get(trip_id)
            .await?
            .ok_or_else(|| EngineError::TripNotFound(trip_id.to_string()))
    }

    /// One read-decide-write unit. The decision closure is synchronous; a
    /// CAS conflict re-reads and re-evaluates, any other failure surfaces.
    async fn mutate<F, T>(&self, trip_id: &str, mut decide: F) -> Result<(Trip, T), EngineError>
    where
        F: FnMut(&mut Trip) -> Result<T, EngineError>,
    {
        loop {
            let mut trip = self.load(trip_id).await?;
            let expected = trip.version;
            let outcome = decide(&mut trip)?;
            match self.store.update(trip, expected).await {
                Ok(stored) => return Ok((stored, outcome)),
                Err(StoreError::Conflict { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn touch(trip: &mut Trip, actor: &str) {
        trip.updated_at = Some(Self::now());
        trip.updated_by = Some(actor.to_string());
    }

    fn entry_summary(entry: &CostEntry) -> String {
        format!(
            "{} - {} ({} {:.2})",
            entry.category, entry.sub_category, entry.currency, entry.amount
        )
    }

    fn creation_record(entry: &CostEntry, actor: &str) -> CostEditRecord {
        CostEditRecord {
            id: Uuid::new_v4().to_string(),
            cost_id: entry.id.clone(),
            edited_by: actor.to_string(),
            edited_at: Self::now(),
            reason: "cost entry created".to_string(),
            field_changed: "entry".to_string(),
            old_value: String::new(),
            new_value: Self::entry_summary(entry),
            change_type: CostChangeType::Creation,
        }
    }

    /// Book a new trip in the active state.
    pub async fn create_trip(&self, request: NewTrip, actor: &str) -> Result<Trip, EngineError> {
        let mut trip = request.into_trip(Uuid::new_v4().to_string());
        trip.created_at = Some(Self::now());
        trip.created_by = Some(actor.to_string());
        self.store.insert(trip.clone()).await?;
        tracing::info!(trip_id = %trip.id, route = %trip.route, "trip created");
        Ok(trip)
    }

    /// Validate and insert a manual cost entry. All rule failures come back
    /// as one list; nothing is written on failure.
    pub async fn add_cost_entry(
        &self,
        trip_id: &str,
        proposed: &NewCostEntry,
        actor: &str,
    ) -> Result<CostEntry, EngineError> {
        let (_, entry) = self
            .mutate(trip_id, |trip| {
                if !trip.is_cost_editable() {
                    return Err(GateViolation::CostsFrozen {
                        status: trip.status,
                    }
                    .into());
                }
                let entry = self
                    .validator
                    .validate(trip, proposed, actor)
                    .map_err(EngineError::Validation)?;
                trip.costs.push(entry.clone());
                Self::touch(trip, actor);
                Ok(entry)
            })
            .await?;

        self.audit
            .append_cost(Self::creation_record(&entry, actor))
            .await?;
        if entry.is_flagged {
            tracing::info!(
                trip_id,
                cost_id = %entry.id,
                reason = entry.flag_reason.as_deref().unwrap_or_default(),
                "cost entry flagged for investigation"
            );
        }
        Ok(entry)
    }

    /// Re-validate and replace an existing manual entry. The duplicate
    /// reference check runs against the other entries, never against the
    /// entry being edited; flags are re-derived from the edited values.
    pub async fn update_cost_entry(
        &self,
        trip_id: &str,
        cost_id: &str,
        proposed: &NewCostEntry,
        actor: &str,
    ) -> Result<CostEntry, EngineError> {
        let (_, (entry, record)) = self
            .mutate(trip_id, |trip| {
                if !trip.is_cost_editable() {
                    return Err(GateViolation::CostsFrozen {
                        status: trip.status,
                    }
                    .into());
                }
                let index = trip
                    .costs
                    .iter()
                    .position(|c| c.id == cost_id)
                    .ok_or_else(|| EngineError::CostNotFound(cost_id.to_string()))?;
                if trip.costs[index].is_system_generated {
                    return Err(GateViolation::SystemEntryImmutable.into());
                }
                let previous = trip.costs.remove(index);
                let mut updated = self
                    .validator
                    .validate(trip, proposed, actor)
                    .map_err(EngineError::Validation)?;
                updated.id = previous.id.clone();
                let record = CostEditRecord {
                    id: Uuid::new_v4().to_string(),
                    cost_id: previous.id.clone(),
                    edited_by: actor.to_string(),
                    edited_at: Self::now(),
                    reason: "cost entry updated".to_string(),
                    field_changed: "entry".to_string(),
                    old_value: Self::entry_summary(&previous),
                    new_value: Self::entry_summary(&updated),
                    change_type: CostChangeType::Update,
                };
                trip.costs.insert(index, updated.clone());
                Self::touch(trip, actor);
                Ok((updated, record))
            })
            .await?;

        self.audit.append_cost(record).await?;
        Ok(entry)
    }

    /// Manually flag an existing unflagged entry for investigation.
    pub async fn flag_cost_entry(
        &self,
        trip_id: &str,
        cost_id: &str,
        reason: &str,
        actor: &str,
    ) -> Result<CostEntry, EngineError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(EngineError::Validation(vec![ValidationError::new(
                "flag_reason",
                "Flag reason is required when manually flagging a cost entry",
            )]));
        }

        let (_, (entry, record)) = self
            .mutate(trip_id, |trip| {
                if !trip.is_cost_editable() {
                    return Err(GateViolation::CostsFrozen {
                        status: trip.status,
                    }
                    .into());
                }
                let cost = trip
                    .costs
                    .iter_mut()
                    .find(|c| c.id == cost_id)
                    .ok_or_else(|| EngineError::CostNotFound(cost_id.to_string()))?;
                if cost.is_system_generated {
                    return Err(GateViolation::SystemEntryImmutable.into());
                }
                if cost.is_flagged {
                    return Err(GateViolation::AlreadyFlagged.into());
                }
                let now = Self::now();
                cost.is_flagged = true;
                cost.flag_reason = Some(reason.to_string());
                cost.investigation_status = Some(InvestigationStatus::Pending);
                cost.flagged_at = Some(now.clone());
                cost.flagged_by = Some(actor.to_string());
                let record = CostEditRecord {
                    id: Uuid::new_v4().to_string(),
                    cost_id: cost.id.clone(),
                    edited_by: actor.to_string(),
                    edited_at: now,
                    reason: reason.to_string(),
                    field_changed: "is_flagged".to_string(),
                    old_value: "false".to_string(),
                    new_value: "true".to_string(),
                    change_type: CostChangeType::FlagStatus,
                };
                let entry = cost.clone();
                Self::touch(trip, actor);
                Ok((entry, record))
            })
            .await?;

        self.audit.append_cost(record).await?;
        tracing::info!(trip_id, cost_id, reason, "cost entry flagged for investigation");
        Ok(entry)
    }

    /// Generate the overhead cost set for a trip. Re-generation is an
    /// upsert: any previously generated system entries are purged in the
    /// same write, so invoking twice never duplicates.
    pub async fn generate_system_costs(
        &self,
        trip_id: &str,
        rates: &SystemCostRates,
        actor: &str,
    ) -> Result<Vec<CostEntry>, EngineError> {
        let (_, entries) = self
            .mutate(trip_id, |trip| {
                if !trip.is_cost_editable() {
                    return Err(GateViolation::CostsFrozen {
                        status: trip.status,
                    }
                    .into());
                }
                let entries =
                    system_costs::generate(trip, rates).map_err(EngineError::Validation)?;
                trip.costs.retain(|c| !c.is_system_generated);
                trip.costs.extend(entries.iter().cloned());
                Self::touch(trip, actor);
                Ok(entries)
            })
            .await?;

        for entry in &entries {
            self.audit
                .append_cost(Self::creation_record(entry, actor))
                .await?;
        }
        tracing::info!(trip_id, count = entries.len(), "system costs generated");
        Ok(entries)
    }

    /// Advance a flagged entry's investigation by one step.
    pub async fn advance_investigation(
        &self,
        trip_id: &str,
        cost_id: &str,
        next: InvestigationStatus,
        notes: Option<&str>,
        actor: &str,
    ) -> Result<CostEntry, EngineError> {
        let (_, (entry, record)) = self
            .mutate(trip_id, |trip| {
                if !trip.is_cost_editable() {
                    return Err(GateViolation::CostsFrozen {
                        status: trip.status,
                    }
                    .into());
                }
                let cost = trip
                    .costs
                    .iter_mut()
                    .find(|c| c.id == cost_id)
                    .ok_or_else(|| EngineError::CostNotFound(cost_id.to_string()))?;
                let record = validator::advance_investigation(cost, next, actor, notes)?;
                let entry = cost.clone();
                Self::touch(trip, actor);
                Ok((entry, record))
            })
            .await?;

        self.audit.append_cost(record).await?;
        Ok(entry)
    }

    /// active -> completed, gated on the unresolved-flag ledger.
    pub async fn complete_trip(&self, trip_id: &str, actor: &str) -> Result<Trip, EngineError> {
        let result = self
            .mutate(trip_id, |trip| {
                let record = lifecycle::complete(trip, actor)?;
                trip.edit_history.push(record.clone());
                Self::touch(trip, actor);
                Ok(record)
            })
            .await;

        match result {
            Ok((trip, record)) => {
                self.audit.append_trip(record).await?;
                tracing::info!(trip_id, "trip completed");
                Ok(trip)
            }
            Err(EngineError::Gate(violation)) => {
                tracing::warn!(trip_id, %violation, "completion blocked");
                Err(violation.into())
            }
            Err(e) => Err(e),
        }
    }

    /// Accept an external resolver's auto-completion without re-applying
    /// the flag gate.
    pub async fn apply_auto_completion(
        &self,
        trip_id: &str,
        reason: &str,
        at: &str,
    ) -> Result<Trip, EngineError> {
        let (trip, record) = self
            .mutate(trip_id, |trip| {
                let record = lifecycle::apply_auto_completion(trip, reason, at)?;
                trip.edit_history.push(record.clone());
                Ok(record)
            })
            .await?;
        self.audit.append_trip(record).await?;
        tracing::info!(trip_id, reason, "trip auto-completed");
        Ok(trip)
    }

    /// completed -> invoiced via the submission gate.
    pub async fn submit_invoice(
        &self,
        trip_id: &str,
        submission: &InvoiceSubmission,
        actor: &str,
    ) -> Result<Trip, EngineError> {
        let (trip, record) = self
            .mutate(trip_id, |trip| {
                let record = invoice::submit_invoice(trip, submission, actor)?;
                trip.edit_history.push(record.clone());
                Self::touch(trip, actor);
                Ok(record)
            })
            .await?;
        self.audit.append_trip(record).await?;
        tracing::info!(trip_id, invoice = %submission.invoice_number, "invoice submitted");
        Ok(trip)
    }

    /// Record payment; a full payment advances invoiced -> paid.
    pub async fn record_payment(
        &self,
        trip_id: &str,
        update: &PaymentUpdate,
        actor: &str,
    ) -> Result<Trip, EngineError> {
        let (trip, record) = self
            .mutate(trip_id, |trip| {
                let record = lifecycle::record_payment(trip, update, actor)?;
                trip.edit_history.push(record.clone());
                Self::touch(trip, actor);
                Ok(record)
            })
            .await?;
        self.audit.append_trip(record).await?;
        Ok(trip)
    }

    /// Apply one audited field edit to an active trip.
    pub async fn edit_trip_field(
        &self,
        trip_id: &str,
        edit: &TripFieldEdit,
        actor: &str,
    ) -> Result<Trip, EngineError> {
        let (trip, record) = self
            .mutate(trip_id, |trip| {
                let record = lifecycle::apply_field_edit(trip, edit, actor)?;
                trip.edit_history.push(record.clone());
                Self::touch(trip, actor);
                Ok(record)
            })
            .await?;
        self.audit.append_trip(record).await?;
        Ok(trip)
    }

    /// Append a post-completion cost. Rejected while the trip is active.
    pub async fn add_additional_cost(
        &self,
        trip_id: &str,
        request: &NewAdditionalCost,
        actor: &str,
    ) -> Result<AdditionalCost, EngineError> {
        let (_, (cost, record)) = self
            .mutate(trip_id, |trip| {
                if trip.status < TripStatus::Completed {
                    return Err(GateViolation::TooEarlyForAdditionalCosts {
                        status: trip.status,
                    }
                    .into());
                }
                let now = Self::now();
                let cost = AdditionalCost {
                    id: Uuid::new_v4().to_string(),
                    trip_id: trip.id.clone(),
                    description: request.description.clone(),
                    cost_type: request.cost_type,
                    amount: request.amount,
                    currency: request.currency,
                    supporting_documents: request.supporting_documents.clone(),
                    notes: request.notes.clone(),
                    date: request.date.clone(),
                    added_at: now.clone(),
                    added_by: actor.to_string(),
                };
                let record = TripEditRecord {
                    id: Uuid::new_v4().to_string(),
                    trip_id: trip.id.clone(),
                    edited_by: actor.to_string(),
                    edited_at: now,
                    reason: "additional cost added".to_string(),
                    field_changed: "additional_costs".to_string(),
                    old_value: String::new(),
                    new_value: format!(
                        "{} ({} {:.2})",
                        cost.description, cost.currency, cost.amount
                    ),
                    change_type: TripChangeType::Update,
                };
                trip.additional_costs.push(cost.clone());
                trip.edit_history.push(record.clone());
                Self::touch(trip, actor);
                Ok((cost, record))
            })
            .await?;

        self.audit.append_trip(record).await?;
        Ok(cost)
    }

    /// Append a delay report to the trip.
    pub async fn add_delay_reason(
        &self,
        trip_id: &str,
        request: &NewDelayReason,
        actor: &str,
    ) -> Result<DelayReason, EngineError> {
        let (_, (delay, record)) = self
            .mutate(trip_id, |trip| {
                let now = Self::now();
                let delay = DelayReason {
                    id: Uuid::new_v4().to_string(),
                    trip_id: trip.id.clone(),
                    delay_type: request.delay_type,
                    description: request.description.clone(),
                    delay_duration: request.delay_duration,
                    severity: request.severity,
                    reported_at: now.clone(),
                    reported_by: actor.to_string(),
                    resolved_at: None,
                    resolution_notes: None,
                };
                let record = TripEditRecord {
                    id: Uuid::new_v4().to_string(),
                    trip_id: trip.id.clone(),
                    edited_by: actor.to_string(),
                    edited_at: now,
                    reason: "delay reported".to_string(),
                    field_changed: "delay_reasons".to_string(),
                    old_value: String::new(),
                    new_value: request.description.clone(),
                    change_type: TripChangeType::Update,
                };
                trip.delay_reasons.push(delay.clone());
                trip.edit_history.push(record.clone());
                Self::touch(trip, actor);
                Ok((delay, record))
            })
            .await?;

        self.audit.append_trip(record).await?;
        Ok(delay)
    }

    /// Append a payment follow-up contact to an invoiced trip.
    pub async fn add_follow_up(
        &self,
        trip_id: &str,
        request: &NewFollowUp,
        actor: &str,
    ) -> Result<FollowUpRecord, EngineError> {
        let (_, (follow_up, record)) = self
            .mutate(trip_id, |trip| {
                if trip.status < TripStatus::Invoiced {
                    return Err(GateViolation::WrongStatus {
                        expected: TripStatus::Invoiced,
                        actual: trip.status,
                    }
                    .into());
                }
                let now = Self::now();
                let follow_up = FollowUpRecord {
                    id: Uuid::new_v4().to_string(),
                    trip_id: trip.id.clone(),
                    follow_up_date: request.follow_up_date.clone(),
                    contact_method: request.contact_method,
                    responsible_staff: request.responsible_staff.clone(),
                    response_summary: request.response_summary.clone(),
                    next_follow_up_date: request.next_follow_up_date.clone(),
                    status: request.status,
                    priority: request.priority,
                    outcome: request.outcome,
                };
                let record = TripEditRecord {
                    id: Uuid::new_v4().to_string(),
                    trip_id: trip.id.clone(),
                    edited_by: actor.to_string(),
                    edited_at: now,
                    reason: "payment follow-up recorded".to_string(),
                    field_changed: "follow_up_history".to_string(),
                    old_value: String::new(),
                    new_value: request.response_summary.clone(),
                    change_type: TripChangeType::Update,
                };
                trip.follow_up_history.push(follow_up.clone());
                trip.edit_history.push(record.clone());
                Self::touch(trip, actor);
                Ok((follow_up, record))
            })
            .await?;

        self.audit.append_trip(record).await?;
        Ok(follow_up)
    }

    /// Build the deletion snapshot for a trip. The engine never removes the
    /// document; the caller owns both the snapshot and the removal.
    pub async fn deletion_record(
        &self,
        trip_id: &str,
        reason: &str,
        actor: &str,
    ) -> Result<TripDeletionRecord, EngineError> {
        let trip = self.load(trip_id).await?;
        TripDeletionRecord::snapshot(&trip, actor, reason, Self::now())
            .map_err(|e| EngineError::Serialization(e.to_string()))
    }
}
