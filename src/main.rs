use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

mod capacity;
mod config;
mod db;
mod maternal;
mod models;
mod normalize;
mod outbreak;
mod report;
mod ward;

use config::EngineConfig;
use models::{IngestPayload, Resource};

#[derive(Parser)]
#[command(name = "health-signals")]
#[command(about = "Health facility signal engine for municipal early warning", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ResourceArg {
    Beds,
    Icu,
}

impl From<ResourceArg> for Resource {
    fn from(value: ResourceArg) -> Self {
        match value {
            ResourceArg::Beds => Resource::Beds,
            ResourceArg::Icu => Resource::Icu,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import indicator records from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Ingest one indicator report (JSON) and run the fast outbreak check
    #[command(group(
        ArgGroup::new("input")
            .args(["payload", "file"])
            .required(true)
            .multiple(false)
    ))]
    Ingest {
        /// Inline JSON payload
        #[arg(long)]
        payload: Option<String>,
        /// Path to a JSON payload file
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Run batch outbreak detection over the indicator history
    Outbreaks {
        #[arg(long)]
        district: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Minimum aggregate volume considered at all
        #[arg(long)]
        floor: Option<i64>,
        /// Baseline multiplier that defines a spike
        #[arg(long)]
        multiplier: Option<f64>,
        #[arg(long)]
        json: bool,
    },
    /// Rank districts by maternal risk ratio
    MaternalRisk {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Forecast hours until a facility exhausts beds or ICU capacity
    Capacity {
        /// Facility to forecast; omit to sweep every facility
        #[arg(long)]
        facility: Option<String>,
        #[arg(long, value_enum, default_value_t = ResourceArg::Beds)]
        resource: ResourceArg,
        #[arg(long)]
        json: bool,
    },
    /// Compute ward composite risk scores
    WardRisk {
        /// Single ward; omit to rank all wards
        #[arg(long)]
        ward: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown situation report
    Report {
        #[arg(long)]
        district: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

async fn ward_risks(pool: &PgPool, cfg: &EngineConfig) -> anyhow::Result<Vec<models::WardRisk>> {
    let now = chrono::Utc::now();
    let mut risks = Vec::new();
    for ward_id in db::list_wards(pool).await? {
        let events = db::fetch_ward_case_events(pool, &ward_id, 24).await?;
        let statuses = db::fetch_ward_latest_statuses(pool, &ward_id).await?;
        risks.push(ward::compute(&ward_id, &events, &statuses, now, cfg));
    }
    Ok(ward::rank_wards(risks))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    let cfg = EngineConfig::default();

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let summary = db::import_csv(&pool, &csv).await?;
            println!(
                "Imported {} records from {} ({} rejected).",
                summary.inserted,
                csv.display(),
                summary.rejected
            );
        }
        Commands::Ingest { payload, file } => {
            let raw = match (payload, file) {
                (Some(inline), _) => inline,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                (None, None) => anyhow::bail!("either --payload or --file is required"),
            };
            let payload: IngestPayload =
                serde_json::from_str(&raw).context("payload is not valid JSON")?;
            let record = db::ingest_record(&pool, payload).await?;

            let history = db::fetch_recent_records(&pool, cfg.recent_window_size as i64).await?;
            let detected = outbreak::check_record(&history, &record, &cfg);
            println!(
                "Ingested '{}' for {} ({} cases). outbreak_detected: {}",
                record.indicator, record.district, record.total_cases, detected
            );
        }
        Commands::Outbreaks {
            district,
            limit,
            floor,
            multiplier,
            json,
        } => {
            let mut cfg = cfg;
            if let Some(floor) = floor {
                cfg.minimum_case_volume = floor;
            }
            if let Some(multiplier) = multiplier {
                cfg.spike_multiplier = multiplier;
            }

            let records = db::fetch_indicator_records(&pool, district.as_deref()).await?;
            let outbreaks = outbreak::detect(&records, &cfg);

            if json {
                let top: Vec<_> = outbreaks.iter().take(limit).collect();
                println!("{}", serde_json::to_string_pretty(&top)?);
                return Ok(());
            }
            if outbreaks.is_empty() {
                println!("No outbreak signals in the indicator history.");
                return Ok(());
            }

            println!("Detected outbreak signals (largest surge first):");
            for hit in outbreaks.iter().take(limit) {
                println!(
                    "- {} / {} in {}: {} cases vs baseline {:.0} (surge {:.1}%)",
                    hit.district,
                    hit.indicator,
                    hit.period,
                    hit.total_cases,
                    hit.baseline,
                    hit.surge_percent
                );
            }
        }
        Commands::MaternalRisk { limit, json } => {
            let records = db::fetch_indicator_records(&pool, None).await?;
            let risks = maternal::score(&records);

            if json {
                let top: Vec<_> = risks.iter().take(limit).collect();
                println!("{}", serde_json::to_string_pretty(&top)?);
                return Ok(());
            }
            if risks.is_empty() {
                println!("No districts with maternal records and a pregnancy denominator.");
                return Ok(());
            }

            println!("Districts by maternal risk score:");
            for risk in risks.iter().take(limit) {
                println!(
                    "- {}: score {:.1} ({} high-risk events, {} pregnancies, {:.0} per 1000)",
                    risk.district,
                    risk.risk_score,
                    risk.risk_events,
                    risk.pregnancies,
                    risk.risk_per_1000
                );
            }
        }
        Commands::Capacity {
            facility,
            resource,
            json,
        } => {
            let resource = Resource::from(resource);
            let facility_ids = match facility {
                Some(id) => vec![id],
                None => db::list_facilities(&pool)
                    .await?
                    .into_iter()
                    .map(|f| f.facility_id)
                    .collect(),
            };

            let mut predictions = Vec::new();
            for facility_id in &facility_ids {
                let events = db::fetch_facility_case_events(
                    &pool,
                    facility_id,
                    cfg.admission_window_hours as i64,
                )
                .await?;
                let snapshot = db::fetch_latest_status(&pool, facility_id).await?;
                predictions.push(capacity::predict(
                    facility_id,
                    resource,
                    &events,
                    snapshot.as_ref(),
                    &cfg,
                ));
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&predictions)?);
                return Ok(());
            }

            let crisis_count = predictions.iter().filter(|p| p.crisis_likely).count();
            println!("Capacity forecast ({}):", resource.as_str());
            for pred in &predictions {
                println!(
                    "- {}: {:.2} admissions/hr, {} projected in 24h, {:.1}h of {} left{}",
                    pred.facility_id,
                    pred.avg_admission_rate,
                    pred.projected_24h_admissions,
                    pred.hours_remaining,
                    pred.resource.as_str(),
                    if pred.crisis_likely { " [CRISIS]" } else { "" }
                );
            }
            println!("{} of {} facilities in crisis.", crisis_count, predictions.len());
        }
        Commands::WardRisk { ward, json } => {
            let risks = match ward {
                Some(ward_id) => {
                    let now = chrono::Utc::now();
                    let events = db::fetch_ward_case_events(&pool, &ward_id, 24).await?;
                    let statuses = db::fetch_ward_latest_statuses(&pool, &ward_id).await?;
                    vec![ward::compute(&ward_id, &events, &statuses, now, &cfg)]
                }
                None => ward_risks(&pool, &cfg).await?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&risks)?);
                return Ok(());
            }

            println!("Ward risk (highest first):");
            for risk in &risks {
                println!(
                    "- {} [{}] score {:.1} ({} cases in 24h, ICU pressure {:.2}, growth {:.2})",
                    risk.ward,
                    risk.level,
                    risk.score,
                    risk.recent_cases,
                    risk.icu_pressure,
                    risk.growth_rate
                );
            }
        }
        Commands::Report { district, out } => {
            let records = db::fetch_indicator_records(&pool, district.as_deref()).await?;
            let outbreaks = outbreak::detect(&records, &cfg);
            let maternal = maternal::score(&records);
            let wards = ward_risks(&pool, &cfg).await?;

            let report = report::build_report(district.as_deref(), &outbreaks, &maternal, &wards);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
