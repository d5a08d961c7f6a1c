use crate::cache::{EvaluationCache, SqliteCache};
use crate::config::AppConfig;
use crate::evaluator::JobFitEvaluator;
use crate::gateway::ScoringGateway;
use crate::models::RecordStatus;
use crate::retry::RetryPolicy;
use crate::sink::{JsonlSink, RecordSink, TrackerSink};
use crate::{jobs, profile};
use anyhow::Context;
use providers::canned::CannedProvider;
use providers::notion::{NotionClient, NotionConfig};
use providers::openai::{OpenAiConfig, OpenAiProvider};
use providers::ProviderRegistry;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Live,
    /// Substitutes all network calls with canned data; no cost is incurred.
    DryRun,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub total: usize,
    pub scored: usize,
    pub cache_hits: usize,
    pub escalated: usize,
    pub emitted: usize,
    pub below_threshold: usize,
    pub failed: usize,
    pub backup_calls: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
}

pub async fn run(config: AppConfig, mode: RunMode, force: bool) -> anyhow::Result<RunSummary> {
    // Cache store unavailability is fatal for the run.
    let pool = storage::connect(&config.database.path)
        .await
        .context("cache store connect")?;
    storage::migrate(&pool).await.context("cache store migrate")?;
    let cache: Arc<dyn EvaluationCache> = Arc::new(SqliteCache::new(pool));

    let profile = profile::load(&config.profile.resume_path)?;
    info!(chars = profile.text.len(), "resume profile loaded");

    let (input_path, jobs) = jobs::load_latest(&config.input.dir, &config.input.pattern)?;
    info!(count = jobs.len(), input = %input_path.display(), "job records loaded");

    let registry = build_registry(&config, mode)?;
    let gateway = ScoringGateway::new(registry, &config);
    let retry = RetryPolicy::from(&config.retry);
    let evaluator = JobFitEvaluator::new(
        gateway,
        cache,
        profile,
        config.escalation.clone(),
        retry.clone(),
    )
    .with_force(force);
    let sink = build_sink(&config, mode, retry)?;

    let mut summary = RunSummary {
        total: jobs.len(),
        ..RunSummary::default()
    };

    for job in &jobs {
        let outcome = evaluator.evaluate(job).await?;
        if outcome.cache_hit {
            summary.cache_hits += 1;
            continue;
        }
        if outcome.escalated {
            summary.escalated += 1;
        }
        match outcome.record.status {
            RecordStatus::Scored => {
                summary.scored += 1;
                let overall = outcome.record.overall().unwrap_or(0.0);
                if overall >= config.scoring.minimum_score {
                    sink.emit(&outcome.record)
                        .await
                        .with_context(|| format!("emit record {}", outcome.record.identifier))?;
                    summary.emitted += 1;
                } else {
                    info!(
                        identifier = %outcome.record.identifier,
                        overall,
                        minimum = config.scoring.minimum_score,
                        "below threshold, cached but not pushed to tracker"
                    );
                    summary.below_threshold += 1;
                }
            }
            RecordStatus::Failed => {
                summary.failed += 1;
                if let Some(failure) = &outcome.record.failure {
                    warn!(
                        identifier = %outcome.record.identifier,
                        tier = %failure.tier,
                        kind = %failure.kind,
                        "job failed evaluation"
                    );
                }
                // Failed records are still emitted so they can be
                // reprocessed later.
                sink.emit(&outcome.record)
                    .await
                    .with_context(|| format!("emit failed record {}", outcome.record.identifier))?;
                summary.emitted += 1;
            }
        }
    }

    let usage = evaluator.gateway().usage();
    summary.backup_calls = usage.backup_calls;
    summary.total_tokens = usage.total_tokens;
    summary.total_cost = usage.total_cost;
    log_summary(&summary);
    Ok(summary)
}

fn log_summary(summary: &RunSummary) {
    info!("==================== RUN SUMMARY ====================");
    info!(
        total = summary.total,
        scored = summary.scored,
        cache_hits = summary.cache_hits,
        escalated = summary.escalated,
        failed = summary.failed,
        "per-job outcomes"
    );
    info!(
        emitted = summary.emitted,
        below_threshold = summary.below_threshold,
        "tracker pushes"
    );
    info!(
        backup_calls = summary.backup_calls,
        total_tokens = summary.total_tokens,
        total_cost = format!("{:.4}", summary.total_cost).as_str(),
        "model usage"
    );
    info!("=====================================================");
}

pub fn build_registry(config: &AppConfig, mode: RunMode) -> anyhow::Result<ProviderRegistry> {
    match mode {
        RunMode::DryRun => Ok(ProviderRegistry::new()
            .with_chat("canned", Arc::new(CannedProvider::default()))
            .set_preferred_chat("canned")),
        RunMode::Live => {
            let api_key = std::env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY not set; required for a live run")?;
            let provider = OpenAiProvider::new(OpenAiConfig {
                api_key,
                base_url: config.models.base_url.clone(),
                timeout_secs: config.models.timeout_secs,
            })
            .map_err(|e| anyhow::anyhow!("building scoring provider: {e}"))?;
            Ok(ProviderRegistry::new()
                .with_chat("openai", Arc::new(provider))
                .set_preferred_chat("openai"))
        }
    }
}

pub fn build_sink(
    config: &AppConfig,
    mode: RunMode,
    retry: RetryPolicy,
) -> anyhow::Result<Arc<dyn RecordSink>> {
    if mode == RunMode::DryRun {
        return Ok(Arc::new(JsonlSink::new(&config.sink.jsonl_path)));
    }
    match config.sink.kind.as_str() {
        "notion" => {
            let api_key = std::env::var("NOTION_API_KEY")
                .context("NOTION_API_KEY not set; required for the notion sink")?;
            let database_id = config
                .sink
                .notion_database_id
                .clone()
                .context("sink.notion_database_id not configured")?;
            let client = NotionClient::new(NotionConfig {
                api_key,
                database_id,
                base_url: None,
            });
            Ok(Arc::new(TrackerSink::new(client, retry)))
        }
        "jsonl" => Ok(Arc::new(JsonlSink::new(&config.sink.jsonl_path))),
        other => anyhow::bail!("unknown sink kind: {other}"),
    }
}
