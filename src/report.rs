use std::fmt::Write;

use crate::models::{MaternalRisk, Outbreak, WardRisk};
use crate::outbreak;

pub fn build_report(
    district: Option<&str>,
    outbreaks: &[Outbreak],
    maternal: &[MaternalRisk],
    wards: &[WardRisk],
) -> String {
    let mut output = String::new();
    let scope_label = district.unwrap_or("all districts");

    let _ = writeln!(output, "# Municipal Health Situation Report");
    let _ = writeln!(output, "Generated for {}", scope_label);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Outbreak Alerts");

    if outbreaks.is_empty() {
        let _ = writeln!(output, "No outbreak signals for this window.");
    } else {
        for hit in outbreaks.iter().take(10) {
            let _ = writeln!(output, "- {}", outbreak::explain(hit).replace('\n', " "));
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Maternal Risk Ranking");

    if maternal.is_empty() {
        let _ = writeln!(output, "No districts with a pregnancy denominator on record.");
    } else {
        for risk in maternal.iter().take(10) {
            let _ = writeln!(
                output,
                "- {}: {} high-risk events across {} pregnancies (score {:.1}, {:.0} per 1000)",
                risk.district,
                risk.risk_events,
                risk.pregnancies,
                risk.risk_score,
                risk.risk_per_1000
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Ward Risk");

    if wards.is_empty() {
        let _ = writeln!(output, "No wards with reporting facilities.");
    } else {
        for ward in wards.iter() {
            let _ = writeln!(
                output,
                "- {} [{}] score {:.1} ({} cases in 24h, ICU pressure {:.2}, growth {:.2})",
                ward.ward,
                ward.level,
                ward.score,
                ward.recent_cases,
                ward.icu_pressure,
                ward.growth_rate
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReportingPeriod, RiskLevel};

    #[test]
    fn report_covers_all_sections() {
        let outbreaks = vec![Outbreak {
            district: "Solapur North".to_string(),
            indicator: "Dengue Cases".to_string(),
            period: ReportingPeriod::new(3, Some(2026)),
            total_cases: 300,
            baseline: 85.0,
            surge_percent: 252.9,
        }];
        let maternal = vec![MaternalRisk {
            district: "Mohol".to_string(),
            risk_events: 30,
            pregnancies: 150,
            risk_score: 20.0,
            risk_per_1000: 200.0,
        }];
        let wards = vec![WardRisk {
            ward: "Ward-12".to_string(),
            score: 65.0,
            level: RiskLevel::High,
            recent_cases: 100,
            icu_pressure: 0.5,
            growth_rate: 1.6,
        }];

        let report = build_report(Some("Solapur"), &outbreaks, &maternal, &wards);
        assert!(report.contains("# Municipal Health Situation Report"));
        assert!(report.contains("Generated for Solapur"));
        assert!(report.contains("Dengue Cases"));
        assert!(report.contains("Surge: 252.9%"));
        assert!(report.contains("Mohol: 30 high-risk events across 150 pregnancies"));
        assert!(report.contains("Ward-12 [HIGH] score 65.0"));
    }

    #[test]
    fn empty_sections_fall_back_to_placeholders() {
        let report = build_report(None, &[], &[], &[]);
        assert!(report.contains("Generated for all districts"));
        assert!(report.contains("No outbreak signals for this window."));
        assert!(report.contains("No districts with a pregnancy denominator on record."));
        assert!(report.contains("No wards with reporting facilities."));
    }
}
