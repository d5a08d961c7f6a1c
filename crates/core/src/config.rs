use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub input: InputConfig,
    pub profile: ProfileConfig,
    pub models: ModelConfig,
    pub escalation: EscalationConfig,
    pub retry: RetryConfig,
    pub scoring: ScoringConfig,
    pub sink: SinkConfig,
    /// Cost per 1K tokens ($) by model name, for the run summary.
    pub costs: HashMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/jobfit.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Drop directory of the upstream filter stage.
    pub dir: String,
    pub pattern: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dir: "data/filtered".to_string(),
            pattern: "filtered_jobs_*.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub resume_path: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            resume_path: "resume.txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub primary: String,
    pub backup: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            primary: "gpt-4o-mini".to_string(),
            backup: "gpt-4o".to_string(),
            base_url: "https://api.openai.com".to_string(),
            max_tokens: 400,
            temperature: 0.7,
            timeout_secs: 30,
        }
    }
}

/// Escalation triggers. The band is inclusive on both ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    pub band_low: f64,
    pub band_high: f64,
    /// A sub-score further than this from the overall signals inconsistent
    /// per-criterion judgment.
    pub divergence: f64,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            band_low: 50.0,
            band_high: 75.0,
            divergence: 35.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Scored records below this overall are cached but not pushed to the
    /// tracker. 0.0 pushes everything.
    pub minimum_score: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { minimum_score: 0.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// "notion" or "jsonl".
    pub kind: String,
    pub jsonl_path: String,
    pub notion_database_id: Option<String>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: "jsonl".to_string(),
            jsonl_path: "data/finalized_records.jsonl".to_string(),
            notion_database_id: None,
        }
    }
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
