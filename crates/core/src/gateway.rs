//! Scoring model gateway: one cost-bearing chat call per invocation, strict
//! parsing of the structured response, weighted overall computation. Retry
//! policy belongs to the caller.

use crate::config::{AppConfig, ModelConfig};
use crate::error::EvalError;
use crate::models::{Criterion, EvaluationResult, JobPosting, ResumeProfile, SubScores, Tier};
use chrono::Utc;
use providers::{ChatRequest, ProviderRegistry};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

const DEFAULT_COST_PER_1K: f64 = 0.01;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UsageSummary {
    pub total_tokens: u64,
    pub total_cost: f64,
    pub backup_calls: u64,
}

pub struct ScoringGateway {
    registry: ProviderRegistry,
    models: ModelConfig,
    costs: HashMap<String, f64>,
    usage: Mutex<UsageSummary>,
}

impl ScoringGateway {
    pub fn new(registry: ProviderRegistry, config: &AppConfig) -> Self {
        Self {
            registry,
            models: config.models.clone(),
            costs: config.costs.clone(),
            usage: Mutex::new(UsageSummary::default()),
        }
    }

    pub fn model_for(&self, tier: Tier) -> &str {
        match tier {
            Tier::Primary => &self.models.primary,
            Tier::Backup => &self.models.backup,
        }
    }

    /// One outbound call; no internal retries.
    pub async fn evaluate(
        &self,
        job: &JobPosting,
        profile: &ResumeProfile,
        tier: Tier,
    ) -> Result<EvaluationResult, EvalError> {
        let model = self.model_for(tier);
        let (system, user) = build_prompt(job, profile);
        let provider = self
            .registry
            .chat(None)
            .map_err(|e| EvalError::ModelUnavailable(e.to_string()))?;

        let completion = provider
            .complete(ChatRequest {
                model,
                system: &system,
                user: &user,
                max_tokens: self.models.max_tokens,
                temperature: self.models.temperature,
            })
            .await?;

        self.record_usage(tier, completion.total_tokens, model);
        debug!(
            tier = %tier,
            model,
            tokens = completion.total_tokens,
            "scoring call completed"
        );

        let (scores, rationale) = parse_scores(&completion.content)?;
        Ok(EvaluationResult {
            overall: scores.overall(),
            scores,
            tier,
            rationale,
            evaluated_at: Utc::now(),
        })
    }

    pub fn usage(&self) -> UsageSummary {
        *self.usage.lock().unwrap()
    }

    fn record_usage(&self, tier: Tier, tokens: u64, model: &str) {
        let cost_per_1k = self.costs.get(model).copied().unwrap_or(DEFAULT_COST_PER_1K);
        let mut usage = self.usage.lock().unwrap();
        usage.total_tokens += tokens;
        usage.total_cost += (tokens as f64 / 1000.0) * cost_per_1k;
        if tier == Tier::Backup {
            usage.backup_calls += 1;
        }
    }
}

fn build_prompt(job: &JobPosting, profile: &ResumeProfile) -> (String, String) {
    let criteria = Criterion::ALL
        .iter()
        .map(|c| format!("- {}", c.prompt_line()))
        .collect::<Vec<_>>()
        .join("\n");

    let system = format!(
        "You are a precise, analytical technical recruiter with 15+ years of experience. \
Your sole task is to evaluate a candidate's job fit based on the provided resume and job details.\n\n\
EVALUATION FRAMEWORK:\n\
Score each criterion from 0 to 100:\n{criteria}\n\n\
REQUIREMENTS:\n\
- Be precise and specific about skill gaps or overlaps.\n\
- Reference concrete resume evidence.\n\
- Consider learning curve and ramp-up time.\n\
- Avoid generic phrases like \"good fit\" or \"strong background\".\n\
- Use direct, factual language.\n\n\
Your entire response MUST be a single, valid JSON object. Do NOT include any introductory text, \
conversation, apologies, or explanations outside of the JSON structure.\n\n\
OUTPUT FORMAT:\n\
{{\"technical_skills\": 0-100, \"experience_level\": 0-100, \"domain_relevance\": 0-100, \
\"soft_skills\": 0-100, \"rationale\": \"specific reasoning\"}}"
    );

    let user = format!(
        "CANDIDATE RESUME:\n{}\n\nJOB DETAILS:\nTitle: {}\nCompany: {}\nLocation: {}\nSeniority: {}\nDescription: {}",
        profile.text,
        job.title,
        job.company,
        job.location,
        job.seniority_level.as_deref().unwrap_or("N/A"),
        job.description,
    );
    (system, user)
}

#[derive(Deserialize)]
struct ScorePayload {
    technical_skills: f64,
    experience_level: f64,
    domain_relevance: f64,
    soft_skills: f64,
    #[serde(default)]
    rationale: String,
}

fn parse_scores(content: &str) -> Result<(SubScores, String), EvalError> {
    let cleaned = strip_code_fences(content);
    let payload: ScorePayload = serde_json::from_str(cleaned)
        .map_err(|e| EvalError::MalformedResponse(format!("{e}; raw: {}", truncate(content, 200))))?;
    let scores = SubScores {
        technical_skills: payload.technical_skills,
        experience_level: payload.experience_level,
        domain_relevance: payload.domain_relevance,
        soft_skills: payload.soft_skills,
    };
    if !scores.in_range() {
        return Err(EvalError::MalformedResponse(format!(
            "sub-score out of [0,100]: {:?}",
            scores
        )));
    }
    Ok((scores, payload.rationale))
}

/// Strips ```json ... ``` or ``` ... ``` fences models sometimes wrap
/// JSON output in.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
