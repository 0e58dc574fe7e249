//! Facility capacity-exhaustion forecasting.
//!
//! Extrapolates the recent admission velocity against the latest resource
//! snapshot. Every returned float is finite; the sentinel stands in wherever
//! the math would otherwise produce inf/NaN, because the boundary format
//! cannot carry either.

use crate::config::EngineConfig;
use crate::models::{CapacityPrediction, FacilityEvent, Resource, StatusSnapshot, TransactionKind};

impl Resource {
    fn safety_margin(&self, cfg: &EngineConfig) -> f64 {
        match self {
            Resource::Beds => cfg.bed_safety_margin,
            Resource::Icu => cfg.icu_safety_margin,
        }
    }

    fn crisis_hours(&self, cfg: &EngineConfig) -> f64 {
        match self {
            Resource::Beds => cfg.bed_crisis_hours,
            Resource::Icu => cfg.icu_crisis_hours,
        }
    }

    fn available(&self, snapshot: Option<&StatusSnapshot>) -> i64 {
        match snapshot {
            Some(status) => match self {
                Resource::Beds => status.beds_available.max(0),
                Resource::Icu => status.icu_available.max(0),
            },
            None => 0,
        }
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Forecast hours until a facility exhausts a resource.
///
/// `events` are the facility's CASE events inside the admission window;
/// admissions are their summed weights. With no admission pressure there is
/// no exhaustion: hours_remaining pins to the sentinel and crisis is false.
pub fn predict(
    facility_id: &str,
    resource: Resource,
    events: &[FacilityEvent],
    snapshot: Option<&StatusSnapshot>,
    cfg: &EngineConfig,
) -> CapacityPrediction {
    let admissions: i64 = events
        .iter()
        .filter(|event| event.kind == TransactionKind::Case)
        .map(|event| event.count.max(0))
        .sum();

    let rate = admissions as f64 / cfg.admission_window_hours;
    let projected_24h = (rate * 24.0).floor() as i64;
    let available = resource.available(snapshot);

    let (hours_remaining, crisis_likely) = if rate <= 0.0 {
        (cfg.hours_remaining_sentinel, false)
    } else {
        let adjusted_rate = rate * resource.safety_margin(cfg);
        let hours = finite_or(available as f64 / adjusted_rate, cfg.hours_remaining_sentinel);
        (hours, hours < resource.crisis_hours(cfg))
    };

    CapacityPrediction {
        facility_id: facility_id.to_string(),
        resource,
        avg_admission_rate: finite_or(rate, 0.0),
        projected_24h_admissions: projected_24h,
        hours_remaining,
        crisis_likely,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MedicineStock;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn case_event(facility_id: &str, count: i64, hours_ago: i64) -> FacilityEvent {
        FacilityEvent {
            id: Uuid::new_v4(),
            facility_id: facility_id.to_string(),
            kind: TransactionKind::Case,
            department: "General Medicine".to_string(),
            indicator: "Dengue Cases".to_string(),
            count,
            occurred_at: Utc::now() - Duration::hours(hours_ago),
        }
    }

    fn snapshot(facility_id: &str, beds: i64, icu: i64) -> StatusSnapshot {
        StatusSnapshot {
            facility_id: facility_id.to_string(),
            beds_available: beds,
            icu_available: icu,
            ventilators_available: 4,
            oxygen_units_available: 40,
            medicine_stock: MedicineStock::Adequate,
            reported_at: Utc::now(),
        }
    }

    #[test]
    fn forecasts_bed_exhaustion() {
        let events: Vec<FacilityEvent> = (0..12).map(|_| case_event("HSP1", 1, 2)).collect();
        let status = snapshot("HSP1", 4, 10);

        let pred = predict("HSP1", Resource::Beds, &events, Some(&status), &EngineConfig::default());
        assert!((pred.avg_admission_rate - 2.0).abs() < 0.001);
        assert_eq!(pred.projected_24h_admissions, 48);
        // 4 beds at 2.0/hr with a 1.2 margin: 4 / 2.4.
        assert!((pred.hours_remaining - 1.6667).abs() < 0.001);
        assert!(pred.crisis_likely);
    }

    #[test]
    fn icu_margin_is_more_conservative() {
        let events: Vec<FacilityEvent> = (0..6).map(|_| case_event("HSP1", 1, 1)).collect();
        let status = snapshot("HSP1", 100, 30);

        let pred = predict("HSP1", Resource::Icu, &events, Some(&status), &EngineConfig::default());
        // 30 ICU beds at 1.0/hr with a 1.5 margin: 20 hours, above the
        // 12-hour crisis horizon.
        assert!((pred.hours_remaining - 20.0).abs() < 0.001);
        assert!(!pred.crisis_likely);
    }

    #[test]
    fn no_admissions_means_no_crisis() {
        let status = snapshot("HSP1", 0, 0);
        let pred = predict("HSP1", Resource::Beds, &[], Some(&status), &EngineConfig::default());
        assert!((pred.hours_remaining - 999.0).abs() < 0.001);
        assert!(!pred.crisis_likely);
        assert_eq!(pred.projected_24h_admissions, 0);
    }

    #[test]
    fn missing_snapshot_defaults_to_zero_availability() {
        let events: Vec<FacilityEvent> = (0..6).map(|_| case_event("HSP1", 1, 1)).collect();
        let pred = predict("HSP1", Resource::Beds, &events, None, &EngineConfig::default());
        assert!((pred.hours_remaining - 0.0).abs() < 0.001);
        assert!(pred.crisis_likely);
    }

    #[test]
    fn event_weights_add_up() {
        // One bulk event of weight 12 behaves like twelve unit events.
        let events = vec![case_event("HSP1", 12, 3)];
        let status = snapshot("HSP1", 4, 10);
        let pred = predict("HSP1", Resource::Beds, &events, Some(&status), &EngineConfig::default());
        assert!((pred.avg_admission_rate - 2.0).abs() < 0.001);
        assert!(pred.crisis_likely);
    }

    #[test]
    fn vaccination_events_are_not_admissions() {
        let mut events = vec![case_event("HSP1", 1, 2)];
        events.push(FacilityEvent {
            kind: TransactionKind::Vaccination,
            ..case_event("HSP1", 50, 2)
        });
        let pred = predict("HSP1", Resource::Beds, &events, None, &EngineConfig::default());
        assert!((pred.avg_admission_rate - 1.0 / 6.0).abs() < 0.001);
    }

    #[test]
    fn outputs_are_always_finite() {
        let events = vec![case_event("HSP1", i64::MAX / 2, 1)];
        let status = snapshot("HSP1", i64::MAX / 2, 0);
        let pred = predict("HSP1", Resource::Beds, &events, Some(&status), &EngineConfig::default());
        assert!(pred.avg_admission_rate.is_finite());
        assert!(pred.hours_remaining.is_finite());
    }
}
