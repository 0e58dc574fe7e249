use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record intake failures. Callers route offending rows to a dead-letter
/// path instead of letting them reach an aggregation.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("unknown reporting month: {0:?}")]
    UnknownMonth(String),
    #[error("negative case count: {0}")]
    NegativeCount(i64),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const MONTH_ABBREVS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Monthly reporting period, year optional because several upstream feeds
/// report month-only. Ordering treats an unknown year as year 0 so that
/// records from the same feed stay chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportingPeriod {
    pub month: u32,
    pub year: Option<i32>,
}

impl ReportingPeriod {
    pub fn new(month: u32, year: Option<i32>) -> Self {
        Self { month, year }
    }

    /// Parse "January", "jan", or "1"; anything else is a validation error.
    pub fn parse(raw: &str, year: Option<i32>) -> Result<Self, RecordError> {
        let folded = raw.trim().to_lowercase();
        if folded.is_empty() {
            return Err(RecordError::MissingField("month"));
        }
        if let Ok(n) = folded.parse::<u32>() {
            if (1..=12).contains(&n) {
                return Ok(Self::new(n, year));
            }
            return Err(RecordError::UnknownMonth(raw.to_string()));
        }
        for (idx, name) in MONTH_NAMES.iter().enumerate() {
            let abbrev = &name[..3];
            if *name == folded || abbrev == folded {
                return Ok(Self::new(idx as u32 + 1, year));
            }
        }
        Err(RecordError::UnknownMonth(raw.to_string()))
    }

    /// Chronological sort key.
    pub fn ordinal(&self) -> i64 {
        i64::from(self.year.unwrap_or(0)) * 12 + i64::from(self.month)
    }

    pub fn label(&self) -> String {
        let abbrev = MONTH_ABBREVS[(self.month.clamp(1, 12) as usize) - 1];
        match self.year {
            Some(year) => format!("{abbrev} {year}"),
            None => abbrev.to_string(),
        }
    }
}

impl fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl PartialOrd for ReportingPeriod {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReportingPeriod {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ordinal()
            .cmp(&other.ordinal())
            .then_with(|| self.year.cmp(&other.year))
            .then_with(|| self.month.cmp(&other.month))
    }
}

/// Periodic indicator report from a facility feed, one row per
/// (geography, indicator, period). Append-only once ingested.
#[derive(Debug, Clone)]
pub struct IndicatorRecord {
    pub id: Uuid,
    pub district: String,
    pub subdistrict: Option<String>,
    pub ward: Option<String>,
    pub indicator_raw: String,
    pub indicator: String,
    pub code_section: Option<String>,
    pub total_cases: i64,
    pub period: ReportingPeriod,
    pub recorded_at: DateTime<Utc>,
}

/// Inbound indicator report before validation. Field names follow the feed
/// format; `into_record` is the only way to turn one into an
/// `IndicatorRecord`, so nothing unvalidated reaches an aggregation.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestPayload {
    pub district: String,
    #[serde(default)]
    pub subdistrict: Option<String>,
    #[serde(default)]
    pub ward: Option<String>,
    pub indicator_name: String,
    #[serde(default)]
    pub code_section: Option<String>,
    pub total_cases: i64,
    pub month: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl IngestPayload {
    pub fn into_record(self) -> Result<IndicatorRecord, RecordError> {
        if self.district.trim().is_empty() {
            return Err(RecordError::MissingField("district"));
        }
        if self.indicator_name.trim().is_empty() {
            return Err(RecordError::MissingField("indicator_name"));
        }
        if self.total_cases < 0 {
            return Err(RecordError::NegativeCount(self.total_cases));
        }
        let period = ReportingPeriod::parse(&self.month, self.year)?;
        Ok(IndicatorRecord {
            id: Uuid::new_v4(),
            district: self.district.trim().to_string(),
            subdistrict: self.subdistrict.filter(|s| !s.trim().is_empty()),
            ward: self.ward.filter(|s| !s.trim().is_empty()),
            indicator: crate::normalize::normalize(&self.indicator_name),
            indicator_raw: self.indicator_name,
            code_section: self.code_section.filter(|s| !s.trim().is_empty()),
            total_cases: self.total_cases,
            period,
            recorded_at: self.timestamp.unwrap_or_else(Utc::now),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Case,
    Vaccination,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Case => "CASE",
            TransactionKind::Vaccination => "VACCINATION",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "CASE" => Some(TransactionKind::Case),
            "VACCINATION" => Some(TransactionKind::Vaccination),
            _ => None,
        }
    }
}

/// Individual clinical event. `count` is the aggregation weight: per-patient
/// feeds emit 1, bulk feeds emit the batch size, and every downstream sum is
/// a weighted sum over the same path.
#[derive(Debug, Clone)]
pub struct FacilityEvent {
    pub id: Uuid,
    pub facility_id: String,
    pub kind: TransactionKind,
    pub department: String,
    pub indicator: String,
    pub count: i64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MedicineStock {
    Adequate,
    Low,
    Critical,
}

impl MedicineStock {
    pub fn as_str(&self) -> &'static str {
        match self {
            MedicineStock::Adequate => "Adequate",
            MedicineStock::Low => "Low",
            MedicineStock::Critical => "Critical",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Adequate" => Some(MedicineStock::Adequate),
            "Low" => Some(MedicineStock::Low),
            "Critical" => Some(MedicineStock::Critical),
            _ => None,
        }
    }
}

/// Point-in-time resource availability for a facility. The latest snapshot
/// by timestamp is the facility's current status.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub facility_id: String,
    pub beds_available: i64,
    pub icu_available: i64,
    pub ventilators_available: i64,
    pub oxygen_units_available: i64,
    pub medicine_stock: MedicineStock,
    pub reported_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Facility {
    pub facility_id: String,
    pub facility_type: String,
    pub district: String,
    pub subdistrict: String,
    pub ward: String,
}

/// Flagged spike for a (district, indicator, period) aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct Outbreak {
    pub district: String,
    pub indicator: String,
    pub period: ReportingPeriod,
    pub total_cases: i64,
    pub baseline: f64,
    pub surge_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaternalRisk {
    pub district: String,
    pub risk_events: i64,
    pub pregnancies: i64,
    pub risk_score: f64,
    pub risk_per_1000: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Resource {
    Beds,
    Icu,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Beds => "beds",
            Resource::Icu => "icu",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CapacityPrediction {
    pub facility_id: String,
    pub resource: Resource,
    pub avg_admission_rate: f64,
    pub projected_24h_admissions: i64,
    pub hours_remaining: f64,
    pub crisis_likely: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WardRisk {
    pub ward: String,
    pub score: f64,
    pub level: RiskLevel,
    pub recent_cases: i64,
    pub icu_pressure: f64,
    pub growth_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_month_names_and_abbreviations() {
        assert_eq!(ReportingPeriod::parse("January", None).unwrap().month, 1);
        assert_eq!(ReportingPeriod::parse("jan", None).unwrap().month, 1);
        assert_eq!(ReportingPeriod::parse("SEP", Some(2026)).unwrap().month, 9);
        assert_eq!(ReportingPeriod::parse("12", None).unwrap().month, 12);
    }

    #[test]
    fn rejects_unknown_months() {
        assert!(matches!(
            ReportingPeriod::parse("Smarch", None),
            Err(RecordError::UnknownMonth(_))
        ));
        assert!(matches!(
            ReportingPeriod::parse("13", None),
            Err(RecordError::UnknownMonth(_))
        ));
        assert!(matches!(
            ReportingPeriod::parse("  ", None),
            Err(RecordError::MissingField("month"))
        ));
    }

    fn sample_payload() -> IngestPayload {
        IngestPayload {
            district: "Solapur".to_string(),
            subdistrict: Some("Mohol".to_string()),
            ward: Some("Ward-12".to_string()),
            indicator_name: "New malaria-cases identified".to_string(),
            code_section: None,
            total_cases: 42,
            month: "Feb".to_string(),
            year: Some(2026),
            timestamp: None,
        }
    }

    #[test]
    fn payload_validation_normalizes_the_indicator() {
        let record = sample_payload().into_record().unwrap();
        assert_eq!(record.indicator, "New Malaria Cases");
        assert_eq!(record.indicator_raw, "New malaria-cases identified");
        assert_eq!(record.period, ReportingPeriod::new(2, Some(2026)));
    }

    #[test]
    fn payload_validation_rejects_bad_counts_and_blanks() {
        let mut negative = sample_payload();
        negative.total_cases = -1;
        assert!(matches!(
            negative.into_record(),
            Err(RecordError::NegativeCount(-1))
        ));

        let mut blank = sample_payload();
        blank.district = "  ".to_string();
        assert!(matches!(
            blank.into_record(),
            Err(RecordError::MissingField("district"))
        ));
    }

    #[test]
    fn periods_order_chronologically_across_years() {
        let dec_2025 = ReportingPeriod::new(12, Some(2025));
        let jan_2026 = ReportingPeriod::new(1, Some(2026));
        assert!(dec_2025 < jan_2026);
        assert_eq!(jan_2026.label(), "Jan 2026");
        assert_eq!(ReportingPeriod::new(3, None).label(), "Mar");
    }
}
