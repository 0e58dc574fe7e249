use anyhow::{anyhow, Context};
use chrono::{Duration, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    Facility, FacilityEvent, IndicatorRecord, IngestPayload, MedicineStock, ReportingPeriod,
    StatusSnapshot, TransactionKind,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportSummary {
    pub inserted: usize,
    pub rejected: usize,
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn record_from_row(row: &PgRow) -> IndicatorRecord {
    let month: i32 = row.get("month");
    IndicatorRecord {
        id: row.get("id"),
        district: row.get("district"),
        subdistrict: row.get("subdistrict"),
        ward: row.get("ward"),
        indicator_raw: row.get("indicator_raw"),
        indicator: row.get("indicator"),
        code_section: row.get("code_section"),
        total_cases: row.get("total_cases"),
        period: ReportingPeriod::new(month as u32, row.get("year")),
        recorded_at: row.get("recorded_at"),
    }
}

fn event_from_row(row: &PgRow) -> anyhow::Result<FacilityEvent> {
    let kind: String = row.get("kind");
    Ok(FacilityEvent {
        id: row.get("id"),
        facility_id: row.get("facility_id"),
        kind: TransactionKind::parse(&kind)
            .ok_or_else(|| anyhow!("unknown transaction kind: {kind}"))?,
        department: row.get("department"),
        indicator: row.get("indicator"),
        count: row.get("count"),
        occurred_at: row.get("occurred_at"),
    })
}

fn status_from_row(row: &PgRow) -> anyhow::Result<StatusSnapshot> {
    let stock: String = row.get("medicine_stock");
    Ok(StatusSnapshot {
        facility_id: row.get("facility_id"),
        beds_available: row.get("beds_available"),
        icu_available: row.get("icu_available"),
        ventilators_available: row.get("ventilators_available"),
        oxygen_units_available: row.get("oxygen_units_available"),
        medicine_stock: MedicineStock::parse(&stock)
            .ok_or_else(|| anyhow!("unknown medicine stock level: {stock}"))?,
        reported_at: row.get("reported_at"),
    })
}

pub async fn insert_record(pool: &PgPool, record: &IndicatorRecord, source_key: &str) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO health_signals.indicator_records
        (id, district, subdistrict, ward, indicator_raw, indicator, code_section,
         total_cases, month, year, recorded_at, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(record.id)
    .bind(&record.district)
    .bind(&record.subdistrict)
    .bind(&record.ward)
    .bind(&record.indicator_raw)
    .bind(&record.indicator)
    .bind(&record.code_section)
    .bind(record.total_cases)
    .bind(record.period.month as i32)
    .bind(record.period.year)
    .bind(record.recorded_at)
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// All indicator records, ordered by (district, indicator, period) so the
/// detector receives groups already chronological.
pub async fn fetch_indicator_records(
    pool: &PgPool,
    district: Option<&str>,
) -> anyhow::Result<Vec<IndicatorRecord>> {
    let mut query = String::from(
        "SELECT id, district, subdistrict, ward, indicator_raw, indicator, code_section, \
         total_cases, month, year, recorded_at \
         FROM health_signals.indicator_records",
    );
    if district.is_some() {
        query.push_str(" WHERE district = $1");
    }
    query.push_str(" ORDER BY district, indicator, year NULLS FIRST, month");

    let mut rows = sqlx::query(&query);
    if let Some(value) = district {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    Ok(records.iter().map(record_from_row).collect())
}

/// Last `limit` records by ingestion time, newest first. History feed for
/// the single-record outbreak check.
pub async fn fetch_recent_records(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<IndicatorRecord>> {
    let records = sqlx::query(
        r#"
        SELECT id, district, subdistrict, ward, indicator_raw, indicator, code_section,
               total_cases, month, year, recorded_at
        FROM health_signals.indicator_records
        ORDER BY recorded_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(records.iter().map(record_from_row).collect())
}

pub async fn fetch_facility_case_events(
    pool: &PgPool,
    facility_id: &str,
    hours: i64,
) -> anyhow::Result<Vec<FacilityEvent>> {
    let cutoff = Utc::now() - Duration::hours(hours);
    let rows = sqlx::query(
        r#"
        SELECT id, facility_id, kind, department, indicator, count, occurred_at
        FROM health_signals.facility_events
        WHERE facility_id = $1 AND kind = 'CASE' AND occurred_at >= $2
        ORDER BY occurred_at DESC
        "#,
    )
    .bind(facility_id)
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    rows.iter().map(event_from_row).collect()
}

pub async fn fetch_ward_case_events(
    pool: &PgPool,
    ward: &str,
    hours: i64,
) -> anyhow::Result<Vec<FacilityEvent>> {
    let cutoff = Utc::now() - Duration::hours(hours);
    let rows = sqlx::query(
        r#"
        SELECT e.id, e.facility_id, e.kind, e.department, e.indicator, e.count, e.occurred_at
        FROM health_signals.facility_events e
        JOIN health_signals.facilities f ON f.facility_id = e.facility_id
        WHERE f.ward = $1 AND e.kind = 'CASE' AND e.occurred_at >= $2
        ORDER BY e.occurred_at DESC
        "#,
    )
    .bind(ward)
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    rows.iter().map(event_from_row).collect()
}

pub async fn fetch_latest_status(
    pool: &PgPool,
    facility_id: &str,
) -> anyhow::Result<Option<StatusSnapshot>> {
    let row = sqlx::query(
        r#"
        SELECT facility_id, beds_available, icu_available, ventilators_available,
               oxygen_units_available, medicine_stock, reported_at
        FROM health_signals.status_snapshots
        WHERE facility_id = $1
        ORDER BY reported_at DESC
        LIMIT 1
        "#,
    )
    .bind(facility_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(status_from_row).transpose()
}

/// Latest snapshot per facility in the ward, one row each.
pub async fn fetch_ward_latest_statuses(
    pool: &PgPool,
    ward: &str,
) -> anyhow::Result<Vec<StatusSnapshot>> {
    let rows = sqlx::query(
        r#"
        SELECT DISTINCT ON (s.facility_id)
               s.facility_id, s.beds_available, s.icu_available, s.ventilators_available,
               s.oxygen_units_available, s.medicine_stock, s.reported_at
        FROM health_signals.status_snapshots s
        JOIN health_signals.facilities f ON f.facility_id = s.facility_id
        WHERE f.ward = $1
        ORDER BY s.facility_id, s.reported_at DESC
        "#,
    )
    .bind(ward)
    .fetch_all(pool)
    .await?;

    rows.iter().map(status_from_row).collect()
}

pub async fn list_facilities(pool: &PgPool) -> anyhow::Result<Vec<Facility>> {
    let rows = sqlx::query(
        "SELECT facility_id, facility_type, district, subdistrict, ward \
         FROM health_signals.facilities ORDER BY facility_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| Facility {
            facility_id: row.get("facility_id"),
            facility_type: row.get("facility_type"),
            district: row.get("district"),
            subdistrict: row.get("subdistrict"),
            ward: row.get("ward"),
        })
        .collect())
}

pub async fn list_wards(pool: &PgPool) -> anyhow::Result<Vec<String>> {
    let rows = sqlx::query("SELECT DISTINCT ward FROM health_signals.facilities ORDER BY ward")
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(|row| row.get("ward")).collect())
}

/// Validate and persist one inbound report. Returns the stored record so the
/// caller can run the single-record outbreak check against recent history.
pub async fn ingest_record(pool: &PgPool, payload: IngestPayload) -> anyhow::Result<IndicatorRecord> {
    let record = payload.into_record().context("payload failed validation")?;
    let source_key = format!("ingest-{}", record.id);
    insert_record(pool, &record, &source_key).await?;
    Ok(record)
}

/// Import indicator records from CSV. Rows that fail to parse or validate
/// are skipped and counted; they never abort the rows behind them.
pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<ImportSummary> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        district: String,
        subdistrict: Option<String>,
        ward: Option<String>,
        indicator_name: String,
        code_section: Option<String>,
        total_cases: i64,
        month: String,
        year: Option<i32>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut summary = ImportSummary::default();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(err) => {
                log::warn!("skipping unparseable csv row {}: {err}", line + 1);
                summary.rejected += 1;
                continue;
            }
        };

        let payload = IngestPayload {
            district: row.district,
            subdistrict: row.subdistrict,
            ward: row.ward,
            indicator_name: row.indicator_name,
            code_section: row.code_section,
            total_cases: row.total_cases,
            month: row.month,
            year: row.year,
            timestamp: None,
        };
        let record = match payload.into_record() {
            Ok(record) => record,
            Err(err) => {
                log::warn!("skipping invalid csv row {}: {err}", line + 1);
                summary.rejected += 1;
                continue;
            }
        };

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));
        if insert_record(pool, &record, &source_key).await? {
            summary.inserted += 1;
        }
    }

    Ok(summary)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let facilities = vec![
        ("HSP-001", "Hospital", "Solapur", "Solapur North", "Ward-12"),
        ("PHC-002", "PHC", "Solapur", "Mohol", "Ward-12"),
        ("HSP-003", "Hospital", "Solapur", "Barshi", "Ward-07"),
        ("PHC-004", "PHC", "Solapur", "Akkalkot", "Ward-03"),
    ];

    for (facility_id, facility_type, district, subdistrict, ward) in facilities {
        sqlx::query(
            r#"
            INSERT INTO health_signals.facilities
            (facility_id, facility_type, district, subdistrict, ward)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (facility_id) DO UPDATE
            SET facility_type = EXCLUDED.facility_type,
                district = EXCLUDED.district,
                subdistrict = EXCLUDED.subdistrict,
                ward = EXCLUDED.ward
            "#,
        )
        .bind(facility_id)
        .bind(facility_type)
        .bind(district)
        .bind(subdistrict)
        .bind(ward)
        .execute(pool)
        .await?;
    }

    // Monthly dengue history with a surge in the latest period, plus a flat
    // malaria series and the maternal section records the risk scorer needs.
    let monthly: Vec<(&str, &str, &str, Option<&str>, i64, u32)> = vec![
        ("seed-r01", "Solapur North", "Dengue Cases", None, 80, 1),
        ("seed-r02", "Solapur North", "Dengue Cases", None, 90, 2),
        ("seed-r03", "Solapur North", "Dengue Cases", None, 300, 3),
        ("seed-r04", "Mohol", "New Malaria Cases", None, 110, 1),
        ("seed-r05", "Mohol", "New Malaria Cases", None, 95, 2),
        ("seed-r06", "Mohol", "New Malaria Cases", None, 120, 3),
        ("seed-r07", "Solapur North", "Hb level<7 (severe anemia)", Some("M1.2"), 10, 3),
        ("seed-r08", "Solapur North", "Hypertension Cases", Some("M2.1"), 25, 3),
        ("seed-r09", "Solapur North", "Low Birth Weight", Some("M3.4"), 5, 3),
        ("seed-r10", "Solapur North", "Pregnant women registered", Some("M1.1"), 200, 3),
        ("seed-r11", "Mohol", "Hb level<7 (severe anemia)", Some("M1.2"), 30, 3),
        ("seed-r12", "Mohol", "Pregnant women registered", Some("M1.1"), 150, 3),
    ];

    for (source_key, district, indicator, code_section, total_cases, month) in monthly {
        let payload = IngestPayload {
            district: district.to_string(),
            subdistrict: None,
            ward: None,
            indicator_name: indicator.to_string(),
            code_section: code_section.map(str::to_string),
            total_cases,
            month: month.to_string(),
            year: Some(2026),
            timestamp: None,
        };
        let record = payload.into_record().context("seed record failed validation")?;
        insert_record(pool, &record, source_key).await?;
    }

    // Events and snapshots are anchored to now; reseeding replaces them
    // instead of stacking a second copy on top.
    sqlx::query("DELETE FROM health_signals.facility_events")
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM health_signals.status_snapshots")
        .execute(pool)
        .await?;

    // Recent clinical events: a busy 6 hours at HSP-001, a quieter spread
    // elsewhere. Weights default to 1 per patient.
    let events: Vec<(&str, &str, &str, &str, i64, i64)> = vec![
        ("HSP-001", "CASE", "General Medicine", "Dengue Cases", 1, 1),
        ("HSP-001", "CASE", "General Medicine", "Dengue Cases", 1, 2),
        ("HSP-001", "CASE", "Pediatrics", "Dengue Cases", 1, 3),
        ("HSP-001", "CASE", "General Medicine", "New Malaria Cases", 1, 4),
        ("HSP-001", "CASE", "Pulmonology", "Pneumonia Cases", 1, 5),
        ("HSP-001", "CASE", "General Medicine", "Dengue Cases", 1, 5),
        ("HSP-001", "VACCINATION", "Immunization", "Measles Cases", 1, 2),
        ("PHC-002", "CASE", "General Medicine", "Diarrhea Cases", 1, 8),
        ("PHC-002", "CASE", "General Medicine", "Dengue Cases", 1, 12),
        ("HSP-003", "CASE", "General Medicine", "New Malaria Cases", 1, 20),
    ];

    for (facility_id, kind, department, indicator, count, hours_ago) in events {
        sqlx::query(
            r#"
            INSERT INTO health_signals.facility_events
            (id, facility_id, kind, department, indicator, count, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(facility_id)
        .bind(kind)
        .bind(department)
        .bind(indicator)
        .bind(count)
        .bind(Utc::now() - Duration::hours(hours_ago))
        .execute(pool)
        .await?;
    }

    let statuses: Vec<(&str, i64, i64, i64, i64, &str)> = vec![
        ("HSP-001", 4, 12, 6, 50, "Adequate"),
        ("PHC-002", 14, 8, 2, 30, "Low"),
        ("HSP-003", 30, 15, 8, 80, "Adequate"),
        ("PHC-004", 10, 20, 1, 25, "Critical"),
    ];

    for (facility_id, beds, icu, vents, oxygen, stock) in statuses {
        sqlx::query(
            r#"
            INSERT INTO health_signals.status_snapshots
            (id, facility_id, beds_available, icu_available, ventilators_available,
             oxygen_units_available, medicine_stock, reported_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(facility_id)
        .bind(beds)
        .bind(icu)
        .bind(vents)
        .bind(oxygen)
        .bind(stock)
        .bind(Utc::now())
        .execute(pool)
        .await?;
    }

    log::info!("seeded facilities, indicator history, events, and status snapshots");
    Ok(())
}
