/// Engine thresholds, passed explicitly into each computation so tenants can
/// tune them and tests can pin them. Defaults match the production values.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Aggregates below this volume are noise, never outbreak candidates.
    pub minimum_case_volume: i64,
    /// A period spikes when its volume exceeds baseline times this factor.
    pub spike_multiplier: f64,
    /// Width of the trailing baseline window, in periods.
    pub rolling_window_periods: usize,
    /// Single-record check: counts at or above this always fire.
    pub absolute_outbreak_threshold: i64,
    /// Single-record check: history depth for the median comparison.
    pub recent_window_size: usize,
    /// Single-record check: count-to-median ratio that fires.
    pub median_ratio: f64,
    pub bed_safety_margin: f64,
    pub icu_safety_margin: f64,
    pub bed_crisis_hours: f64,
    pub icu_crisis_hours: f64,
    /// Hours of recent admissions the capacity forecast extrapolates from.
    pub admission_window_hours: f64,
    /// Stand-in hours-remaining when there is no admission pressure.
    pub hours_remaining_sentinel: f64,
    /// Ward case count that maps to a normalized score of 100.
    pub ward_case_ceiling: i64,
    /// ICU capacity assumed per reporting facility when computing pressure.
    pub icu_beds_per_facility: i64,
    pub critical_score_cutoff: f64,
    pub high_score_cutoff: f64,
    pub medium_score_cutoff: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            minimum_case_volume: 75,
            spike_multiplier: 1.75,
            rolling_window_periods: 3,
            absolute_outbreak_threshold: 200,
            recent_window_size: 50,
            median_ratio: 3.0,
            bed_safety_margin: 1.2,
            icu_safety_margin: 1.5,
            bed_crisis_hours: 24.0,
            icu_crisis_hours: 12.0,
            admission_window_hours: 6.0,
            hours_remaining_sentinel: 999.0,
            ward_case_ceiling: 200,
            icu_beds_per_facility: 20,
            critical_score_cutoff: 75.0,
            high_score_cutoff: 50.0,
            medium_score_cutoff: 25.0,
        }
    }
}
