//! Maternal risk-ratio scoring per district.
//!
//! The three high-risk indicators overlap on the same women, so the proxy
//! "risk events" count is the maximum of the three sums, not their total.

use std::collections::BTreeMap;

use crate::models::{IndicatorRecord, MaternalRisk};

/// Indicator classification sections that form the maternal universe.
const MATERNAL_SECTIONS: &[&str] = &["M1", "M2", "M3", "M4"];

#[derive(Debug, Default)]
struct DistrictSums {
    severe_anemia: i64,
    hypertension: i64,
    low_birth_weight: i64,
    pregnancies: i64,
}

fn in_maternal_section(record: &IndicatorRecord) -> bool {
    record
        .code_section
        .as_deref()
        .map(|section| MATERNAL_SECTIONS.iter().any(|prefix| section.starts_with(prefix)))
        .unwrap_or(false)
}

/// Rank districts by high-risk maternal events per registered pregnancy.
/// Districts without a positive pregnancy denominator are excluded.
pub fn score(records: &[IndicatorRecord]) -> Vec<MaternalRisk> {
    let mut sums: BTreeMap<String, DistrictSums> = BTreeMap::new();

    for record in records {
        if !in_maternal_section(record) {
            continue;
        }
        let indicator = record.indicator.to_lowercase();
        let cases = record.total_cases.max(0);
        let entry = sums.entry(record.district.clone()).or_default();

        if indicator.contains("hb level<7") {
            entry.severe_anemia += cases;
        }
        if indicator.contains("hypertension") {
            entry.hypertension += cases;
        }
        if indicator.contains("weight less than") || indicator.contains("low birth") {
            entry.low_birth_weight += cases;
        }
        if indicator.contains("pregnant women registered") {
            entry.pregnancies += cases;
        }
    }

    let mut risks: Vec<MaternalRisk> = sums
        .into_iter()
        .filter(|(_, sums)| sums.pregnancies > 0)
        .map(|(district, sums)| {
            let risk_events = sums
                .severe_anemia
                .max(sums.hypertension)
                .max(sums.low_birth_weight);
            let ratio = risk_events as f64 / sums.pregnancies as f64;
            MaternalRisk {
                district,
                risk_events,
                pregnancies: sums.pregnancies,
                risk_score: ratio * 100.0,
                risk_per_1000: ratio * 1000.0,
            }
        })
        .collect();

    risks.sort_by(|a, b| {
        b.risk_score
            .partial_cmp(&a.risk_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.district.cmp(&b.district))
    });
    risks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReportingPeriod;
    use chrono::Utc;
    use uuid::Uuid;

    fn maternal_record(
        district: &str,
        section: Option<&str>,
        indicator: &str,
        total_cases: i64,
    ) -> IndicatorRecord {
        IndicatorRecord {
            id: Uuid::new_v4(),
            district: district.to_string(),
            subdistrict: None,
            ward: None,
            indicator_raw: indicator.to_string(),
            indicator: indicator.to_string(),
            code_section: section.map(str::to_string),
            total_cases,
            period: ReportingPeriod::new(2, Some(2026)),
            recorded_at: Utc::now(),
        }
    }

    fn district_fixture(district: &str) -> Vec<IndicatorRecord> {
        vec![
            maternal_record(district, Some("M1.2"), "Hb level<7 (severe anemia)", 10),
            maternal_record(district, Some("M2.1"), "Hypertension Cases", 25),
            maternal_record(district, Some("M3.4"), "Low Birth Weight", 5),
            maternal_record(district, Some("M1.1"), "Pregnant women registered", 200),
        ]
    }

    #[test]
    fn takes_the_max_indicator_not_the_sum() {
        let risks = score(&district_fixture("Solapur"));
        assert_eq!(risks.len(), 1);
        let risk = &risks[0];
        assert_eq!(risk.risk_events, 25);
        assert_eq!(risk.pregnancies, 200);
        assert!((risk.risk_score - 12.5).abs() < 0.001);
        assert!((risk.risk_per_1000 - 125.0).abs() < 0.001);
    }

    #[test]
    fn districts_without_pregnancies_are_dropped() {
        let records = vec![
            maternal_record("Mohol", Some("M2.1"), "Hypertension Cases", 40),
            maternal_record("Mohol", Some("M1.1"), "Pregnant women registered", 0),
        ];
        assert!(score(&records).is_empty());
    }

    #[test]
    fn ignores_records_outside_maternal_sections() {
        let mut records = district_fixture("Solapur");
        // Same indicators under a non-maternal section must not count.
        records.push(maternal_record("Solapur", Some("C7"), "Hypertension Cases", 500));
        records.push(maternal_record("Solapur", None, "Hypertension Cases", 500));

        let risks = score(&records);
        assert_eq!(risks[0].risk_events, 25);
    }

    #[test]
    fn ranks_by_score_descending() {
        let mut records = district_fixture("Solapur");
        records.extend(vec![
            maternal_record("Mohol", Some("M1.2"), "Hb level<7 (severe anemia)", 50),
            maternal_record("Mohol", Some("M1.1"), "Pregnant women registered", 100),
        ]);

        let risks = score(&records);
        assert_eq!(risks.len(), 2);
        assert_eq!(risks[0].district, "Mohol");
        assert!((risks[0].risk_score - 50.0).abs() < 0.001);
        assert_eq!(risks[1].district, "Solapur");
    }

    #[test]
    fn equal_scores_break_ties_by_district() {
        let records = vec![
            maternal_record("Barshi", Some("M2.1"), "Hypertension Cases", 10),
            maternal_record("Barshi", Some("M1.1"), "Pregnant women registered", 100),
            maternal_record("Akkalkot", Some("M2.1"), "Hypertension Cases", 10),
            maternal_record("Akkalkot", Some("M1.1"), "Pregnant women registered", 100),
        ];
        let risks = score(&records);
        assert_eq!(risks[0].district, "Akkalkot");
        assert_eq!(risks[1].district, "Barshi");
    }
}
