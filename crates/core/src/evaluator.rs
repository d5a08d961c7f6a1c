//! Job fit evaluator: per-job state machine driving cache lookup, the
//! two-tier scoring protocol, pathway classification and cache write-through.
//!
//! Per job: `Pending -> CacheHit` or `Pending -> PrimaryScored ->
//! {Finalized | BackupScored -> Finalized}`. Per-job failures become
//! `failed` records; only cache-store unavailability propagates as an error.

use crate::cache::{CacheError, EvaluationCache};
use crate::config::EscalationConfig;
use crate::error::EvalError;
use crate::gateway::ScoringGateway;
use crate::models::{
    Criterion, EvaluationResult, FailureDetail, FinalizedRecord, JobPosting, RecordStatus,
    ResumeProfile, Tier,
};
use crate::pathway;
use crate::retry::RetryPolicy;
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

pub struct EvalOutcome {
    pub record: FinalizedRecord,
    pub cache_hit: bool,
    pub escalated: bool,
}

pub struct JobFitEvaluator {
    gateway: ScoringGateway,
    cache: Arc<dyn EvaluationCache>,
    profile: ResumeProfile,
    escalation: EscalationConfig,
    retry: RetryPolicy,
    force: bool,
}

impl JobFitEvaluator {
    pub fn new(
        gateway: ScoringGateway,
        cache: Arc<dyn EvaluationCache>,
        profile: ResumeProfile,
        escalation: EscalationConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            gateway,
            cache,
            profile,
            escalation,
            retry,
            force: false,
        }
    }

    /// Forced re-evaluation bypasses the cache lookup and supersedes the
    /// existing entry with a fresh one.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn gateway(&self) -> &ScoringGateway {
        &self.gateway
    }

    /// Evaluates one job record. `Ok` covers both scored and failed records;
    /// `Err` means the run cannot continue (cache store unusable).
    pub async fn evaluate(&self, job: &JobPosting) -> anyhow::Result<EvalOutcome> {
        let identifier = job.identifier();

        if self.force {
            info!(identifier = %identifier, "forced re-evaluation, bypassing cache");
        } else {
            match self.cache.get(&identifier).await {
                Ok(Some(record)) => {
                    info!(identifier = %identifier, "cache hit, skipping paid evaluation");
                    return Ok(EvalOutcome {
                        record,
                        cache_hit: true,
                        escalated: false,
                    });
                }
                Ok(None) => {}
                Err(CacheError::Corrupt(msg)) => {
                    warn!(identifier = %identifier, %msg, "corrupt cache entry, treating as absent");
                }
                Err(e @ CacheError::Unavailable(_)) => {
                    return Err(e).context("evaluation cache unusable");
                }
            }
        }

        let (chosen, audit, escalated, failure) = self.run_protocol(job).await;

        let record = self.finalize(job, &identifier, chosen, audit, failure);
        if record.status == RecordStatus::Scored {
            self.cache
                .put(&identifier, &record)
                .await
                .context("evaluation cache write")?;
        }
        Ok(EvalOutcome {
            record,
            cache_hit: false,
            escalated,
        })
    }

    /// Two-tier protocol. Returns (chosen result, primary audit, escalated,
    /// failure).
    async fn run_protocol(
        &self,
        job: &JobPosting,
    ) -> (
        Option<EvaluationResult>,
        Option<EvaluationResult>,
        bool,
        Option<FailureDetail>,
    ) {
        match self.call_tier(job, Tier::Primary).await {
            Ok(primary) => {
                if !self.needs_escalation(&primary) {
                    return (Some(primary), None, false, None);
                }
                info!(
                    identifier = %job.identifier(),
                    overall = primary.overall,
                    "primary result inconclusive, escalating to backup tier"
                );
                match self.call_tier(job, Tier::Backup).await {
                    Ok(backup) => (Some(backup), Some(primary), true, None),
                    Err(e) => {
                        let failed = EvalError::failed(Tier::Backup, e);
                        (None, Some(primary), true, Some(failure_detail(Tier::Backup, &failed)))
                    }
                }
            }
            Err(EvalError::MalformedResponse(msg)) => {
                // Not retried on the same tier; escalate immediately.
                warn!(
                    identifier = %job.identifier(),
                    %msg,
                    "malformed primary response, escalating to backup tier"
                );
                match self.call_tier(job, Tier::Backup).await {
                    Ok(backup) => (Some(backup), None, true, None),
                    Err(e) => {
                        let failed = EvalError::failed(Tier::Backup, e);
                        (None, None, true, Some(failure_detail(Tier::Backup, &failed)))
                    }
                }
            }
            Err(e) => {
                let failed = EvalError::failed(Tier::Primary, e);
                (None, None, false, Some(failure_detail(Tier::Primary, &failed)))
            }
        }
    }

    /// One tier with bounded retry. Only `ModelUnavailable` is retried;
    /// everything else surfaces immediately.
    async fn call_tier(&self, job: &JobPosting, tier: Tier) -> Result<EvaluationResult, EvalError> {
        let mut last: Option<EvalError> = None;
        for attempt in 0..self.retry.attempts() {
            if attempt > 0 {
                let delay = self.retry.delay_for(attempt - 1);
                warn!(
                    tier = %tier,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "model unavailable, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
            }
            match self.gateway.evaluate(job, &self.profile, tier).await {
                Ok(result) => return Ok(result),
                Err(e @ EvalError::ModelUnavailable(_)) => last = Some(e),
                Err(e) => return Err(e),
            }
        }
        Err(last.unwrap_or_else(|| EvalError::ModelUnavailable("retry budget exhausted".into())))
    }

    /// Unclear band (inclusive) or sharp sub-score divergence from the
    /// overall triggers backup evaluation.
    fn needs_escalation(&self, result: &EvaluationResult) -> bool {
        let overall = result.overall;
        if overall >= self.escalation.band_low && overall <= self.escalation.band_high {
            return true;
        }
        Criterion::ALL
            .iter()
            .any(|c| (result.scores.get(*c) - overall).abs() > self.escalation.divergence)
    }

    fn finalize(
        &self,
        job: &JobPosting,
        identifier: &str,
        chosen: Option<EvaluationResult>,
        audit: Option<EvaluationResult>,
        failure: Option<FailureDetail>,
    ) -> FinalizedRecord {
        let status = if chosen.is_some() {
            RecordStatus::Scored
        } else {
            RecordStatus::Failed
        };
        FinalizedRecord {
            identifier: identifier.to_string(),
            title: job.title.clone(),
            company: job.company.clone(),
            location: job.location.clone(),
            link: job.link.clone(),
            apply_url: job.apply_url.clone(),
            pathway: pathway::classify(job),
            status,
            evaluation: chosen,
            primary_audit: audit,
            failure,
            posted_at: job.posted_at.clone(),
            seniority_level: job.seniority_level.clone(),
            employment_type: job.employment_type.clone(),
        }
    }
}

fn failure_detail(tier: Tier, err: &EvalError) -> FailureDetail {
    FailureDetail {
        tier,
        kind: err.kind().to_string(),
        message: err.to_string(),
    }
}
