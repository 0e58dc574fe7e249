//! Spike/outbreak detection over periodic indicator aggregates.
//!
//! Two signals, deliberately distinct: `detect` is the authoritative batch
//! pass (rolling-mean baseline per geography+indicator), `check_record` is a
//! cheap median-ratio hint for the ingest path. They can disagree on the same
//! data; batch wins.

use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::models::{IndicatorRecord, Outbreak, ReportingPeriod};

/// Indicators eligible for outbreak analysis. "tb " keeps its trailing space
/// so words like "outbreak" don't match.
const OUTBREAK_INDICATOR_KEYWORDS: &[&str] = &[
    "malaria",
    "dengue",
    "tuberculosis",
    "tb ",
    "hiv",
    "sti",
    "rti",
    "hepatitis",
    "encephalitis",
    "diarrhea",
    "cholera",
    "influenza",
    "pneumonia",
    "measles",
    "maternal death",
    "neonatal death",
    "death",
    "low birth weight",
    "hb level<7",
    "hypertension",
];

/// Operational activity markers. Campaign throughput is volume, not disease
/// pressure, and must never be flagged as an outbreak.
const ACTIVITY_KEYWORDS: &[&str] = &[
    "immunisation",
    "immunization",
    "vaccination",
    "sterilization",
    "sterilisation",
    "tested",
    "screened",
    "counselling",
    "counseling",
    "stock",
    "distribution",
    "campaign",
];

const DISEASE_SIGNAL_WORDS: &[&str] = &[
    "malaria",
    "dengue",
    "sti",
    "rti",
    "tuberculosis",
    "death",
    "pneumonia",
    "syphilis",
    "diarrhea",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalClass {
    Disease,
    Activity,
    Operational,
}

impl SignalClass {
    pub fn label(&self) -> &'static str {
        match self {
            SignalClass::Disease => "Disease Signal",
            SignalClass::Activity => "Healthcare Activity",
            SignalClass::Operational => "Operational / Other",
        }
    }
}

/// Tag an indicator for reporting: disease pressure, campaign activity, or
/// everything else.
pub fn classify(indicator: &str) -> SignalClass {
    let folded = indicator.to_lowercase();
    if DISEASE_SIGNAL_WORDS.iter().any(|word| folded.contains(word)) {
        return SignalClass::Disease;
    }
    if ACTIVITY_KEYWORDS.iter().any(|word| folded.contains(word)) {
        return SignalClass::Activity;
    }
    SignalClass::Operational
}

fn is_outbreak_indicator(indicator: &str) -> bool {
    let folded = indicator.to_lowercase();
    OUTBREAK_INDICATOR_KEYWORDS.iter().any(|word| folded.contains(word))
        && !ACTIVITY_KEYWORDS.iter().any(|word| folded.contains(word))
}

/// Batch detection: aggregate, baseline, flag, rank. Recomputed from scratch
/// on every call; identical input yields identical ordered output.
pub fn detect(records: &[IndicatorRecord], cfg: &EngineConfig) -> Vec<Outbreak> {
    // (district, indicator, period) -> summed cases; BTreeMap keeps the
    // groups chronologically ordered before windowing.
    let mut totals: BTreeMap<(String, String, ReportingPeriod), i64> = BTreeMap::new();
    for record in records {
        if !is_outbreak_indicator(&record.indicator) {
            continue;
        }
        let key = (
            record.district.clone(),
            record.indicator.clone(),
            record.period,
        );
        *totals.entry(key).or_insert(0) += record.total_cases.max(0);
    }

    let mut outbreaks = Vec::new();
    let mut group_key: Option<(String, String)> = None;
    let mut history: Vec<i64> = Vec::new();

    for ((district, indicator, period), total) in totals {
        let key = (district.clone(), indicator.clone());
        if group_key.as_ref() != Some(&key) {
            group_key = Some(key);
            history.clear();
        }

        if total < cfg.minimum_case_volume {
            continue;
        }

        // Baseline over up to `rolling_window_periods` surviving prior
        // periods; undefined until two have been observed.
        if history.len() >= 2 {
            let window = &history[history.len().saturating_sub(cfg.rolling_window_periods)..];
            let baseline = window.iter().sum::<i64>() as f64 / window.len() as f64;
            if baseline > 0.0 {
                let current = total as f64;
                if current > baseline * cfg.spike_multiplier {
                    outbreaks.push(Outbreak {
                        district,
                        indicator,
                        period,
                        total_cases: total,
                        baseline,
                        surge_percent: (current - baseline) / baseline * 100.0,
                    });
                }
            }
        }
        history.push(total);
    }

    // Largest surge first; full key tie-break keeps reruns byte-identical.
    outbreaks.sort_by(|a, b| {
        b.surge_percent
            .partial_cmp(&a.surge_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.district.cmp(&b.district))
            .then_with(|| a.indicator.cmp(&b.indicator))
            .then_with(|| a.period.cmp(&b.period))
    });
    outbreaks
}

/// Human summary for responders, one paragraph per flagged row.
pub fn explain(outbreak: &Outbreak) -> String {
    format!(
        "{}\nIn {}, {} reported {} cases of '{}'.\nBaseline: {} | Surge: {:.1}%.",
        classify(&outbreak.indicator).label(),
        outbreak.period,
        outbreak.district,
        outbreak.total_cases,
        outbreak.indicator,
        outbreak.baseline as i64,
        outbreak.surge_percent
    )
}

fn median(values: &mut [i64]) -> f64 {
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) as f64 / 2.0
    } else {
        values[mid] as f64
    }
}

/// Fast single-record check against recent history. Fires on an absolute
/// count or on a count-to-median ratio; with no same-indicator history the
/// answer is false, the batch pass will catch anything real.
pub fn check_record(
    history: &[IndicatorRecord],
    record: &IndicatorRecord,
    cfg: &EngineConfig,
) -> bool {
    let total = record.total_cases;
    if total >= cfg.absolute_outbreak_threshold {
        return true;
    }

    let mut same_indicator: Vec<i64> = history
        .iter()
        .take(cfg.recent_window_size)
        .filter(|r| r.indicator == record.indicator)
        .map(|r| r.total_cases)
        .collect();
    if same_indicator.is_empty() {
        return false;
    }

    let med = median(&mut same_indicator);
    if med == 0.0 {
        return total > 0;
    }
    total as f64 / med >= cfg.median_ratio
}
