//! Downstream emission of finalized records. The tracking database's own
//! idempotency (upsert-by-identifier) is assumed; responsibility here ends
//! at emitting one well-formed record per evaluation.

use crate::models::FinalizedRecord;
use crate::retry::RetryPolicy;
use anyhow::Context;
use providers::notion::NotionClient;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

const TRACKER_TEXT_LIMIT: usize = 2000;

#[async_trait::async_trait]
pub trait RecordSink: Send + Sync {
    async fn emit(&self, record: &FinalizedRecord) -> anyhow::Result<()>;
}

/// Append-only local file of finalized records, one JSON object per line.
/// Used by dry runs and as an audit trail.
pub struct JsonlSink {
    path: PathBuf,
    // Serializes appends so concurrent emitters never interleave lines.
    lock: Mutex<()>,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait::async_trait]
impl RecordSink for JsonlSink {
    async fn emit(&self, record: &FinalizedRecord) -> anyhow::Result<()> {
        let line = serde_json::to_string(record)?;
        let _guard = self.lock.lock().unwrap();
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open sink file {}", self.path.display()))?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

/// Pushes finalized records into the external tracking database with
/// bounded retry.
pub struct TrackerSink {
    client: NotionClient,
    retry: RetryPolicy,
}

impl TrackerSink {
    pub fn new(client: NotionClient, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    fn build_properties(record: &FinalizedRecord) -> serde_json::Value {
        let rationale = record
            .evaluation
            .as_ref()
            .map(|e| e.rationale.as_str())
            .or_else(|| record.failure.as_ref().map(|f| f.message.as_str()))
            .unwrap_or("");
        let tier = record
            .evaluation
            .as_ref()
            .map(|e| e.tier.to_string())
            .unwrap_or_else(|| "none".to_string());
        serde_json::json!({
            "Job Title": {"title": [{"text": {"content": clamp_text(&record.title)}}]},
            "Company": {"rich_text": [{"text": {"content": clamp_text(&record.company)}}]},
            "Location": {"rich_text": [{"text": {"content": clamp_text(&record.location)}}]},
            "Rating": {"number": record.overall().unwrap_or(0.0)},
            "Explanation": {"rich_text": [{"text": {"content": clamp_text(rationale)}}]},
            "Link": {"url": safe_url(&record.link)},
            "Apply URL": {"url": safe_url(&record.apply_url)},
            "Type": {"select": {"name": record.pathway.as_str()}},
            "Status": {"select": {"name": record.status.to_string()}},
            "Tier": {"select": {"name": tier}},
            "Date Posted": {"date": {"start": record.posted_at.as_deref().unwrap_or("2025-01-01")}},
            "Job ID": {"rich_text": [{"text": {"content": clamp_text(&record.identifier)}}]},
            "Seniority Level": {"select": {"name": record.seniority_level.as_deref().unwrap_or("N/A")}},
            "Employment Type": {"select": {"name": record.employment_type.as_deref().unwrap_or("N/A")}},
        })
    }
}

#[async_trait::async_trait]
impl RecordSink for TrackerSink {
    async fn emit(&self, record: &FinalizedRecord) -> anyhow::Result<()> {
        let properties = Self::build_properties(record);
        let mut last_err = None;
        for attempt in 0..self.retry.attempts() {
            if attempt > 0 {
                let delay = self.retry.delay_for(attempt - 1);
                warn!(
                    identifier = %record.identifier,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "tracker push failed, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
            }
            match self.client.create_page(properties.clone()).await {
                Ok(()) => return Ok(()),
                Err(e) => last_err = Some(e),
            }
        }
        Err(anyhow::anyhow!(
            "tracker push for {} exhausted retries: {}",
            record.identifier,
            last_err.map(|e| e.to_string()).unwrap_or_default()
        ))
    }
}

fn clamp_text(text: &str) -> String {
    text.chars().take(TRACKER_TEXT_LIMIT).collect()
}

fn safe_url(url: &str) -> &str {
    if url.starts_with("http://") || url.starts_with("https://") {
        url
    } else {
        "https://www.linkedin.com"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PathwayTag, RecordStatus};

    fn record() -> FinalizedRecord {
        FinalizedRecord {
            identifier: "J1".into(),
            title: "Engineer".into(),
            company: "Acme".into(),
            location: "Remote".into(),
            link: "https://example.com/j/1".into(),
            apply_url: "not a url".into(),
            pathway: PathwayTag::Greenhouse,
            status: RecordStatus::Scored,
            evaluation: None,
            primary_audit: None,
            failure: None,
            posted_at: None,
            seniority_level: None,
            employment_type: None,
        }
    }

    #[tokio::test]
    async fn jsonl_sink_appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/records.jsonl");
        let sink = JsonlSink::new(&path);
        sink.emit(&record()).await.unwrap();
        sink.emit(&record()).await.unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: FinalizedRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.identifier, "J1");
    }

    #[test]
    fn invalid_urls_fall_back() {
        let props = TrackerSink::build_properties(&record());
        assert_eq!(
            props["Apply URL"]["url"].as_str().unwrap(),
            "https://www.linkedin.com"
        );
        assert_eq!(
            props["Link"]["url"].as_str().unwrap(),
            "https://example.com/j/1"
        );
    }

    #[test]
    fn text_fields_are_clamped() {
        let mut r = record();
        r.title = "x".repeat(5000);
        let props = TrackerSink::build_properties(&r);
        let title = props["Job Title"]["title"][0]["text"]["content"]
            .as_str()
            .unwrap();
        assert_eq!(title.chars().count(), TRACKER_TEXT_LIMIT);
    }
}
