use anyhow::Result;
use clap::{Parser, Subcommand};
use jobfit_core::config;
use jobfit_core::config::AppConfig;
use jobfit_core::models::JobPosting;
use jobfit_core::pathway;
use jobfit_core::pipeline::{self, RunMode};
use sqlx::{QueryBuilder, Row};
use std::collections::HashSet;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Evaluate {
            dry_run,
            force,
            json,
        } => run_evaluate(cfg, dry_run, force, json).await,
        Commands::Results {
            status,
            pathway,
            min_rating,
            since,
            fields,
            json,
        } => {
            run_results(
                cfg,
                &status,
                pathway.as_deref(),
                min_rating,
                since.as_deref(),
                &fields,
                json,
            )
            .await
        }
        Commands::Classify { url } => run_classify(&url),
    }
}

#[derive(Parser)]
#[command(name = "jobfit")]
#[command(about = "Job fit evaluation engine", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the newest filtered job drop against the resume profile
    Evaluate {
        /// Substitute all network calls with canned data (no cost)
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        /// Re-evaluate even when a cache entry exists, superseding it
        #[arg(long, default_value_t = false)]
        force: bool,
        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },
    /// List finalized records from the evaluation cache
    Results {
        /// Status filter (scored|failed|all)
        #[arg(long, default_value = "scored")]
        status: String,
        /// Filter by pathway tag (e.g. greenhouse, workday)
        #[arg(long)]
        pathway: Option<String>,
        /// Only include records with overall score >= this value
        #[arg(long)]
        min_rating: Option<f64>,
        /// Only include records created at or after this RFC3339 timestamp
        #[arg(long)]
        since: Option<String>,
        /// Restrict output fields (comma-separated), e.g. identifier,title,overall
        #[arg(long, value_delimiter = ',', num_args = 1.., default_values_t = Vec::<String>::new())]
        fields: Vec<String>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Classify the application pathway for a single URL
    Classify {
        /// Apply or posting URL
        url: String,
    },
}

async fn run_evaluate(cfg: AppConfig, dry_run: bool, force: bool, json: bool) -> Result<()> {
    let mode = if dry_run { RunMode::DryRun } else { RunMode::Live };
    let summary = pipeline::run(cfg, mode, force).await?;
    if json {
        let summary_json = serde_json::json!({
            "status": "ok",
            "mode": if dry_run { "dry-run" } else { "live" },
            "total": summary.total,
            "scored": summary.scored,
            "cache_hits": summary.cache_hits,
            "escalated": summary.escalated,
            "emitted": summary.emitted,
            "below_threshold": summary.below_threshold,
            "failed": summary.failed,
            "backup_calls": summary.backup_calls,
            "total_tokens": summary.total_tokens,
            "total_cost": summary.total_cost,
        });
        println!("{}", serde_json::to_string_pretty(&summary_json)?);
    } else {
        println!(
            "evaluated {}: scored {}, cache hits {}, escalated {}, failed {}, emitted {}",
            summary.total,
            summary.scored,
            summary.cache_hits,
            summary.escalated,
            summary.failed,
            summary.emitted
        );
        println!(
            "usage: {} backup calls, {} tokens, ${:.4}",
            summary.backup_calls, summary.total_tokens, summary.total_cost
        );
    }
    Ok(())
}

async fn run_results(
    cfg: AppConfig,
    status: &str,
    pathway: Option<&str>,
    min_rating: Option<f64>,
    since: Option<&str>,
    fields: &[String],
    json: bool,
) -> Result<()> {
    let pool = storage::connect(&cfg.database.path).await?;
    let mut query = QueryBuilder::new(
        "SELECT identifier, record_json, pathway, status, overall, created_at FROM evaluations WHERE 1=1",
    );
    if status != "all" {
        query.push(" AND status = ");
        query.push_bind(status);
    }
    if let Some(p) = pathway {
        query.push(" AND pathway = ");
        query.push_bind(p);
    }
    if let Some(min) = min_rating {
        query.push(" AND overall >= ");
        query.push_bind(min);
    }
    if let Some(s) = since.and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok()) {
        // created_at is stored as RFC3339 UTC, so string order is time order.
        query.push(" AND created_at >= ");
        query.push_bind(s.with_timezone(&chrono::Utc).to_rfc3339());
    }
    query.push(" ORDER BY overall DESC");
    let rows = query.build().fetch_all(&pool).await?;

    let mut vals = Vec::new();
    for row in rows {
        let identifier: String = row.get(0);
        let record_json: String = row.get(1);
        let pathway: String = row.get(2);
        let status: String = row.get(3);
        let overall: Option<f64> = row.try_get(4).ok();
        let created_at: String = row.get(5);
        let record: serde_json::Value =
            serde_json::from_str(&record_json).unwrap_or(serde_json::Value::Null);
        vals.push(serde_json::json!({
            "identifier": identifier,
            "title": record.get("title").cloned().unwrap_or_default(),
            "company": record.get("company").cloned().unwrap_or_default(),
            "overall": overall,
            "pathway": pathway,
            "status": status,
            "created_at": created_at,
            "record": record,
        }));
    }
    let filtered_fields = if fields.is_empty() {
        vec![
            "identifier".to_string(),
            "title".to_string(),
            "company".to_string(),
            "overall".to_string(),
            "pathway".to_string(),
            "status".to_string(),
        ]
    } else {
        fields.to_vec()
    };
    let filtered = filter_fields(vals, &filtered_fields);
    if json {
        println!("{}", serde_json::to_string_pretty(&filtered)?);
    } else {
        for v in &filtered {
            println!("{}", serde_json::to_string(v)?);
        }
    }
    Ok(())
}

fn run_classify(url: &str) -> Result<()> {
    let job = JobPosting {
        id: None,
        title: String::new(),
        company: String::new(),
        location: String::new(),
        posted_at: None,
        description: String::new(),
        link: String::new(),
        apply_url: url.to_string(),
        application_hint: None,
        seniority_level: None,
        employment_type: None,
    };
    println!("{}", pathway::classify(&job));
    Ok(())
}

fn filter_fields(mut results: Vec<serde_json::Value>, fields: &[String]) -> Vec<serde_json::Value> {
    if fields.is_empty() {
        return results;
    }
    let want: HashSet<String> = fields.iter().map(|s| s.to_lowercase()).collect();
    for r in results.iter_mut() {
        if let Some(obj) = r.as_object_mut() {
            let mut keep = serde_json::Map::new();
            for (k, v) in obj.iter() {
                if want.contains(&k.to_lowercase()) {
                    keep.insert(k.clone(), v.clone());
                }
            }
            *obj = keep;
        }
    }
    results
}
