//! Evaluation cache: at most one paid evaluation per job identifier.
//! Abstract key-value interface with an in-memory implementation for tests
//! and dry runs, and a durable SQLite implementation.

use crate::models::FinalizedRecord;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    /// The stored entry cannot be parsed; callers degrade to a miss after
    /// surfacing a warning.
    #[error("cache corrupt: {0}")]
    Corrupt(String),
    /// The store cannot be read or written at all; callers abort the run.
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

#[async_trait::async_trait]
pub trait EvaluationCache: Send + Sync {
    async fn get(&self, identifier: &str) -> Result<Option<FinalizedRecord>, CacheError>;
    async fn put(&self, identifier: &str, record: &FinalizedRecord) -> Result<(), CacheError>;
    async fn exists(&self, identifier: &str) -> Result<bool, CacheError>;
}

#[derive(Default)]
pub struct MemoryCache {
    inner: RwLock<HashMap<String, FinalizedRecord>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl EvaluationCache for MemoryCache {
    async fn get(&self, identifier: &str) -> Result<Option<FinalizedRecord>, CacheError> {
        Ok(self.inner.read().unwrap().get(identifier).cloned())
    }

    async fn put(&self, identifier: &str, record: &FinalizedRecord) -> Result<(), CacheError> {
        self.inner
            .write()
            .unwrap()
            .insert(identifier.to_string(), record.clone());
        Ok(())
    }

    async fn exists(&self, identifier: &str) -> Result<bool, CacheError> {
        Ok(self.inner.read().unwrap().contains_key(identifier))
    }
}

/// Durable cache backed by the storage crate's SQLite pool. Entries are
/// superseded by a whole-row replace, never mutated in place.
pub struct SqliteCache {
    pool: SqlitePool,
}

impl SqliteCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EvaluationCache for SqliteCache {
    async fn get(&self, identifier: &str) -> Result<Option<FinalizedRecord>, CacheError> {
        let row = sqlx::query("SELECT record_json FROM evaluations WHERE identifier = ?")
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        match row {
            None => Ok(None),
            Some(row) => {
                let json: String = row.get(0);
                serde_json::from_str(&json).map(Some).map_err(|e| {
                    CacheError::Corrupt(format!("entry {identifier}: {e}"))
                })
            }
        }
    }

    async fn put(&self, identifier: &str, record: &FinalizedRecord) -> Result<(), CacheError> {
        let json = serde_json::to_string(record)
            .map_err(|e| CacheError::Corrupt(format!("entry {identifier}: {e}")))?;
        sqlx::query(
            "INSERT OR REPLACE INTO evaluations (identifier, record_json, pathway, status, overall, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(identifier)
        .bind(json)
        .bind(record.pathway.as_str())
        .bind(record.status.to_string())
        .bind(record.overall())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn exists(&self, identifier: &str) -> Result<bool, CacheError> {
        let row = sqlx::query("SELECT 1 FROM evaluations WHERE identifier = ?")
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        Ok(row.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PathwayTag, RecordStatus};

    fn record(identifier: &str) -> FinalizedRecord {
        FinalizedRecord {
            identifier: identifier.to_string(),
            title: "Engineer".into(),
            company: "Acme".into(),
            location: "Remote".into(),
            link: "https://example.com/j/1".into(),
            apply_url: String::new(),
            pathway: PathwayTag::Other,
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
    async fn memory_cache_roundtrip() {
        let cache = MemoryCache::new();
        assert!(cache.get("J1").await.unwrap().is_none());
        cache.put("J1", &record("J1")).await.unwrap();
        assert!(cache.exists("J1").await.unwrap());
        let got = cache.get("J1").await.unwrap().unwrap();
        assert_eq!(got.identifier, "J1");
    }

    #[tokio::test]
    async fn sqlite_cache_read_after_write() {
        let pool = storage::connect("sqlite://file:cache_raw_test?mode=memory&cache=shared")
            .await
            .unwrap();
        storage::migrate(&pool).await.unwrap();
        let cache = SqliteCache::new(pool);
        cache.put("J1", &record("J1")).await.unwrap();
        let got = cache.get("J1").await.unwrap().unwrap();
        assert_eq!(got.identifier, "J1");
        assert_eq!(got.status, RecordStatus::Scored);
    }

    #[tokio::test]
    async fn sqlite_cache_overwrite_supersedes() {
        let pool = storage::connect("sqlite://file:cache_overwrite_test?mode=memory&cache=shared")
            .await
            .unwrap();
        storage::migrate(&pool).await.unwrap();
        let cache = SqliteCache::new(pool);
        cache.put("J1", &record("J1")).await.unwrap();
        let mut updated = record("J1");
        updated.company = "Other Corp".into();
        cache.put("J1", &updated).await.unwrap();
        let got = cache.get("J1").await.unwrap().unwrap();
        assert_eq!(got.company, "Other Corp");
    }

    #[tokio::test]
    async fn corrupt_row_surfaces_cache_corrupt() {
        let pool = storage::connect("sqlite://file:cache_corrupt_test?mode=memory&cache=shared")
            .await
            .unwrap();
        storage::migrate(&pool).await.unwrap();
        sqlx::query(
            "INSERT INTO evaluations (identifier, record_json, pathway, status, overall, created_at) \
             VALUES ('J9', 'not json {', 'other', 'scored', 50.0, '2025-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .unwrap();
        let cache = SqliteCache::new(pool);
        let err = cache.get("J9").await.unwrap_err();
        assert!(matches!(err, CacheError::Corrupt(_)));
    }
}
