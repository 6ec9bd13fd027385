//! Deterministic generation of per-km and per-day overhead cost entries.
//!
//! Pure functions: no persistence side effects. Insertion (and the purge of
//! any previously generated set) is the orchestrator's responsibility.

use chrono::{DateTime, NaiveDate, Utc};
use trip_types::{
    CostEntry, SystemCostRates, SystemCostType, Trip, ValidationError, SYSTEM_COST_CATEGORY,
};
use uuid::Uuid;

fn parse_point(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Trip duration in whole days: ceiling of the absolute start/end span,
/// floored at 1 so same-day trips still accrue one day of overheads.
pub fn trip_duration_days(trip: &Trip) -> Result<i64, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let start = parse_point(&trip.start_date);
    if start.is_none() {
        errors.push(ValidationError::new(
            "start_date",
            format!("'{}' is not a valid date", trip.start_date),
        ));
    }
    let end = parse_point(&trip.end_date);
    if end.is_none() {
        errors.push(ValidationError::new(
            "end_date",
            format!("'{}' is not a valid date", trip.end_date),
        ));
    }
    let (Some(start), Some(end)) = (start, end) else {
        return Err(errors);
    };

    let span_seconds = (end - start).num_seconds().abs();
    let days = (span_seconds + 86_399) / 86_400;
    Ok(days.max(1))
}

fn reference_slug(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '-'
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn entry(
    trip: &Trip,
    sub_category: &str,
    amount: f64,
    cost_type: SystemCostType,
    calculation_details: String,
    notes: String,
    date: &str,
) -> CostEntry {
    let kind = match cost_type {
        SystemCostType::PerKm => "KM",
        SystemCostType::PerDay => "DAY",
    };
    CostEntry {
        id: Uuid::new_v4().to_string(),
        trip_id: trip.id.clone(),
        category: SYSTEM_COST_CATEGORY.to_string(),
        sub_category: sub_category.to_string(),
        amount,
        currency: trip.revenue_currency,
        // Deterministic per (trip, cost type, sub-category): re-generation
        // produces the same reference set instead of a new one.
        reference_number: format!("SYS-{kind}-{}-{}", trip.id, reference_slug(sub_category)),
        date: date.to_string(),
        notes: Some(notes),
        attachments: Vec::new(),
        is_flagged: false,
        flag_reason: None,
        no_document_reason: None,
        investigation_status: None,
        investigation_notes: None,
        flagged_at: None,
        flagged_by: None,
        resolved_at: None,
        resolved_by: None,
        is_system_generated: true,
        system_cost_type: Some(cost_type),
        calculation_details: Some(calculation_details),
    }
}

/// Generate the full overhead set for a trip from one rate card: two per-km
/// entries and eight per-day entries. Entries bypass manual validation and
/// are never flagged.
pub fn generate(trip: &Trip, rates: &SystemCostRates) -> Result<Vec<CostEntry>, Vec<ValidationError>> {
    let duration_days = trip_duration_days(trip)?;
    let distance_km = trip.distance_km.unwrap_or(0.0);
    let date = Utc::now().format("%Y-%m-%d").to_string();

    let mut entries = Vec::with_capacity(10);
    for (label, rate) in rates.per_km_items() {
        entries.push(entry(
            trip,
            label,
            rate * distance_km,
            SystemCostType::PerKm,
            format!("{distance_km} km × {rate:.2} per km"),
            format!("System generated per-kilometer cost ({rate} per km × {distance_km} km)"),
            &date,
        ));
    }
    for (label, rate) in rates.per_day_items() {
        entries.push(entry(
            trip,
            label,
            rate * duration_days as f64,
            SystemCostType::PerDay,
            format!("{duration_days} days × {rate:.2} per day"),
            format!("System generated per-day cost ({rate} per day × {duration_days} days)"),
            &date,
        ));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trip_types::{ClientType, Currency, NewTrip};

    fn trip(start: &str, end: &str, distance_km: Option<f64>) -> Trip {
        NewTrip {
            fleet_number: "28H".to_string(),
            driver_name: "S. Dube".to_string(),
            client_name: "Acme Produce".to_string(),
            client_type: ClientType::External,
            route: "Harare - Beitbridge".to_string(),
            description: None,
            start_date: start.to_string(),
            end_date: end.to_string(),
            base_revenue: 30_000.0,
            revenue_currency: Currency::Zar,
            distance_km,
            planned_timeline: Default::default(),
            booking_source: Default::default(),
            load_ref: None,
        }
        .into_trip("t1".to_string())
    }

    #[test]
    fn five_day_500km_zar_trip_matches_the_rate_card() {
        let trip = trip("2024-03-01", "2024-03-06", Some(500.0));
        let rates = SystemCostRates::default_for(Currency::Zar);
        let entries = generate(&trip, &rates).unwrap();

        assert_eq!(entries.len(), 10);
        let total: f64 = entries.iter().map(|e| e.amount).sum();
        let expected = 5.0 * rates.per_day_total() + 500.0 * rates.per_km_total();
        assert!((total - expected).abs() < 1e-6, "{total} != {expected}");

        for entry in &entries {
            assert!(entry.is_system_generated);
            assert!(!entry.is_flagged);
            assert_eq!(entry.category, SYSTEM_COST_CATEGORY);
            assert!(entry.system_cost_type.is_some());
            // Each amount is traceable from its recorded factors.
            assert!(entry.calculation_details.as_deref().unwrap().contains("×"));
        }

        let per_km = entries
            .iter()
            .filter(|e| e.system_cost_type == Some(SystemCostType::PerKm))
            .count();
        assert_eq!(per_km, 2);
        assert_eq!(entries.len() - per_km, 8);
    }

    #[test]
    fn duration_is_ceiled_and_floored_at_one_day() {
        assert_eq!(
            trip_duration_days(&trip("2024-03-01", "2024-03-01", None)).unwrap(),
            1
        );
        // 4.5 days of wall clock rounds up to 5.
        assert_eq!(
            trip_duration_days(&trip(
                "2024-03-01T08:00:00Z",
                "2024-03-05T20:00:00Z",
                None
            ))
            .unwrap(),
            5
        );
        // Reversed dates still produce a positive duration.
        assert_eq!(
            trip_duration_days(&trip("2024-03-06", "2024-03-01", None)).unwrap(),
            5
        );
    }

    #[test]
    fn invalid_dates_are_reported_per_field() {
        let errors = generate(
            &trip("not-a-date", "2024-03-06", Some(100.0)),
            &SystemCostRates::default_for(Currency::Zar),
        )
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "start_date");
    }

    #[test]
    fn references_are_deterministic_per_trip_and_line() {
        let trip = trip("2024-03-01", "2024-03-06", Some(500.0));
        let rates = SystemCostRates::default_for(Currency::Zar);
        let first = generate(&trip, &rates).unwrap();
        let second = generate(&trip, &rates).unwrap();

        let refs = |entries: &[CostEntry]| {
            entries
                .iter()
                .map(|e| e.reference_number.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(refs(&first), refs(&second));
        assert!(first
            .iter()
            .any(|e| e.reference_number == "SYS-DAY-t1-GIT-INSURANCE"));
    }

    #[test]
    fn missing_distance_yields_zero_per_km_amounts() {
        let trip = trip("2024-03-01", "2024-03-03", None);
        let rates = SystemCostRates::default_for(Currency::Usd);
        let entries = generate(&trip, &rates).unwrap();
        for entry in entries
            .iter()
            .filter(|e| e.system_cost_type == Some(SystemCostType::PerKm))
        {
            assert_eq!(entry.amount, 0.0);
        }
    }
}
