//! Ward-level composite risk.
//!
//! One 0-100 score per ward from three bounded terms: recent case volume,
//! short-term growth, and ICU pressure. Each term is clamped before
//! weighting, so no input can push the composite outside [0, 100].

use chrono::{DateTime, Duration, Utc};

use crate::config::EngineConfig;
use crate::models::{FacilityEvent, RiskLevel, StatusSnapshot, TransactionKind, WardRisk};

fn classify_score(score: f64, cfg: &EngineConfig) -> RiskLevel {
    if score >= cfg.critical_score_cutoff {
        RiskLevel::Critical
    } else if score >= cfg.high_score_cutoff {
        RiskLevel::High
    } else if score >= cfg.medium_score_cutoff {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

fn weighted_cases(events: &[FacilityEvent], since: DateTime<Utc>) -> i64 {
    events
        .iter()
        .filter(|event| event.kind == TransactionKind::Case && event.occurred_at >= since)
        .map(|event| event.count.max(0))
        .sum()
}

/// ICU pressure across the ward's facilities: occupied fraction of assumed
/// capacity, clamped to [0, 1]. A ward with no reporting facilities has no
/// pressure signal.
fn icu_pressure(statuses: &[StatusSnapshot], cfg: &EngineConfig) -> f64 {
    let capacity = statuses.len() as i64 * cfg.icu_beds_per_facility;
    if capacity <= 0 {
        return 0.0;
    }
    let available: i64 = statuses.iter().map(|status| status.icu_available.max(0)).sum();
    let pressure = (capacity - available) as f64 / capacity as f64;
    pressure.clamp(0.0, 1.0)
}

/// Composite risk for one ward.
///
/// `events` are CASE events from the ward's facilities over the last 24
/// hours; `statuses` the latest snapshot per facility. A 6-hour share above
/// a quarter of the day's cases means onset is accelerating.
pub fn compute(
    ward: &str,
    events: &[FacilityEvent],
    statuses: &[StatusSnapshot],
    now: DateTime<Utc>,
    cfg: &EngineConfig,
) -> WardRisk {
    let cases_24h = weighted_cases(events, now - Duration::hours(24));
    let cases_6h = weighted_cases(events, now - Duration::hours(6));

    let cases_normalized =
        (cases_24h as f64 / cfg.ward_case_ceiling as f64 * 100.0).min(100.0);

    let growth_rate = if cases_24h > 0 {
        cases_6h as f64 / (cases_24h as f64 / 4.0)
    } else {
        0.0
    };
    let growth_normalized = (growth_rate / 1.5 * 100.0).min(100.0);

    let pressure = icu_pressure(statuses, cfg);

    let score = cases_normalized * 0.5 + growth_normalized * 0.3 + pressure * 100.0 * 0.2;

    WardRisk {
        ward: ward.to_string(),
        score,
        level: classify_score(score, cfg),
        recent_cases: cases_24h,
        icu_pressure: pressure,
        growth_rate,
    }
}

/// Order wards for the heatmap: highest score first, ward id breaking ties
/// so the ranking is stable across runs.
pub fn rank_wards(mut risks: Vec<WardRisk>) -> Vec<WardRisk> {
    risks.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.ward.cmp(&b.ward))
    });
    risks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MedicineStock;
    use uuid::Uuid;

    fn ward_event(count: i64, hours_ago: i64, now: DateTime<Utc>) -> FacilityEvent {
        FacilityEvent {
            id: Uuid::new_v4(),
            facility_id: "PHC1".to_string(),
            kind: TransactionKind::Case,
            department: "General Medicine".to_string(),
            indicator: "Dengue Cases".to_string(),
            count,
            occurred_at: now - Duration::hours(hours_ago),
        }
    }

    fn icu_status(facility_id: &str, icu_available: i64) -> StatusSnapshot {
        StatusSnapshot {
            facility_id: facility_id.to_string(),
            beds_available: 20,
            icu_available,
            ventilators_available: 2,
            oxygen_units_available: 30,
            medicine_stock: MedicineStock::Adequate,
            reported_at: Utc::now(),
        }
    }

    #[test]
    fn combines_the_three_weighted_terms() {
        let now = Utc::now();
        // 100 cases over 24h, 40 of them inside the last 6h.
        let events = vec![ward_event(60, 10, now), ward_event(40, 2, now)];
        // Two facilities, 20 assumed ICU beds each, 20 free: pressure 0.5.
        let statuses = vec![icu_status("PHC1", 12), icu_status("HSP1", 8)];

        let risk = compute("Ward-12", &events, &statuses, now, &EngineConfig::default());
        assert_eq!(risk.recent_cases, 100);
        assert!((risk.growth_rate - 1.6).abs() < 0.001);
        assert!((risk.icu_pressure - 0.5).abs() < 0.001);
        // 50*0.5 + 100*0.3 + 50*0.2
        assert!((risk.score - 65.0).abs() < 0.001);
        assert_eq!(risk.level, RiskLevel::High);
    }

    #[test]
    fn quiet_ward_scores_zero() {
        let risk = compute("Ward-3", &[], &[], Utc::now(), &EngineConfig::default());
        assert!((risk.score - 0.0).abs() < 0.001);
        assert_eq!(risk.level, RiskLevel::Low);
        assert!((risk.growth_rate - 0.0).abs() < 0.001);
        assert!((risk.icu_pressure - 0.0).abs() < 0.001);
    }

    #[test]
    fn score_is_bounded_under_extreme_input() {
        let now = Utc::now();
        let events = vec![ward_event(1_000_000, 1, now)];
        // No ICU beds free anywhere.
        let statuses = vec![icu_status("PHC1", 0), icu_status("HSP1", 0)];

        let risk = compute("Ward-9", &events, &statuses, now, &EngineConfig::default());
        assert!(risk.score <= 100.0);
        assert!((risk.score - 100.0).abs() < 0.001);
        assert_eq!(risk.level, RiskLevel::Critical);
    }

    #[test]
    fn negative_looking_input_cannot_push_below_zero() {
        let now = Utc::now();
        let events = vec![ward_event(-50, 2, now)];
        // More ICU free than the assumed capacity: pressure clamps at 0.
        let statuses = vec![icu_status("PHC1", 500)];

        let risk = compute("Ward-1", &events, &statuses, now, &EngineConfig::default());
        assert!(risk.score >= 0.0);
        assert!((risk.icu_pressure - 0.0).abs() < 0.001);
        assert_eq!(risk.recent_cases, 0);
    }

    #[test]
    fn level_cutoffs_are_inclusive_lower_bounds() {
        let cfg = EngineConfig::default();
        assert_eq!(classify_score(75.0, &cfg), RiskLevel::Critical);
        assert_eq!(classify_score(74.9, &cfg), RiskLevel::High);
        assert_eq!(classify_score(50.0, &cfg), RiskLevel::High);
        assert_eq!(classify_score(25.0, &cfg), RiskLevel::Medium);
        assert_eq!(classify_score(24.9, &cfg), RiskLevel::Low);
        assert_eq!(classify_score(0.0, &cfg), RiskLevel::Low);
    }

    #[test]
    fn events_older_than_a_day_are_ignored() {
        let now = Utc::now();
        let events = vec![ward_event(80, 30, now), ward_event(20, 3, now)];
        let risk = compute("Ward-5", &events, &[], now, &EngineConfig::default());
        assert_eq!(risk.recent_cases, 20);
    }

    #[test]
    fn ranking_breaks_score_ties_by_ward_id() {
        let now = Utc::now();
        let cfg = EngineConfig::default();
        let b = compute("Ward-B", &[], &[], now, &cfg);
        let a = compute("Ward-A", &[], &[], now, &cfg);
        let hot = compute(
            "Ward-Z",
            &[ward_event(100, 2, now)],
            &[],
            now,
            &cfg,
        );

        let ranked = rank_wards(vec![b, hot, a]);
        assert_eq!(ranked[0].ward, "Ward-Z");
        assert_eq!(ranked[1].ward, "Ward-A");
        assert_eq!(ranked[2].ward, "Ward-B");
    }
}
