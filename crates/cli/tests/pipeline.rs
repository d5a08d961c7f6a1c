use jobfit_core::config::AppConfig;
use jobfit_core::models::FinalizedRecord;
use jobfit_core::pipeline::{self, RunMode};
use std::fs;
use tempfile::tempdir;

#[tokio::test]
async fn dry_run_pipeline_scores_caches_and_emits() {
    let temp = tempdir().unwrap();
    let resume_path = temp.path().join("resume.txt");
    let input_dir = temp.path().join("filtered");
    let sink_path = temp.path().join("out/records.jsonl");
    // Shared in-memory DB so both runs see the same cache.
    let db_url = "sqlite://file:cli_pipeline_test?mode=memory&cache=shared".to_string();

    fs::create_dir_all(&input_dir).unwrap();
    fs::write(&resume_path, "Senior Rust engineer, 8 years of backend work.").unwrap();
    fs::write(
        input_dir.join("filtered_jobs_2025-06-01.json"),
        r#"[
            {"id": "J1", "title": "Backend Engineer", "company": "Acme",
             "location": "Remote", "description": "Rust services",
             "link": "https://example.com/j/1",
             "applyUrl": "https://jobs.lever.co/acme/1"},
            {"id": "J2", "title": "Platform Engineer", "company": "Beta",
             "location": "NYC", "description": "Distributed systems",
             "link": "https://example.com/j/2",
             "applyUrl": "https://example.com/openings/2"},
            {"title": "Data Engineer", "company": "Gamma",
             "location": "Remote", "description": "Pipelines",
             "link": "https://boards.greenhouse.io/gamma/jobs/3",
             "applyUrl": ""}
        ]"#,
    )
    .unwrap();

    let mut cfg = AppConfig::default();
    cfg.database.path = db_url.clone();
    cfg.input.dir = input_dir.to_string_lossy().into_owned();
    cfg.profile.resume_path = resume_path.to_string_lossy().into_owned();
    cfg.sink.jsonl_path = sink_path.to_string_lossy().into_owned();

    // Keep the shared in-memory DB alive across both runs.
    let holder = storage::connect(&db_url).await.unwrap();
    storage::migrate(&holder).await.unwrap();

    let summary = pipeline::run(cfg.clone(), RunMode::DryRun, false)
        .await
        .unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.scored, 3);
    assert_eq!(summary.cache_hits, 0);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.emitted, 3);
    // Canned provider reports no token usage.
    assert_eq!(summary.total_tokens, 0);

    let content = fs::read_to_string(&sink_path).unwrap();
    let records: Vec<FinalizedRecord> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.len(), 3);
    let lever = records.iter().find(|r| r.identifier == "J1").unwrap();
    assert_eq!(lever.pathway.as_str(), "lever");
    let hashed = records
        .iter()
        .find(|r| r.title == "Data Engineer")
        .unwrap();
    assert_eq!(hashed.identifier.len(), 16, "missing id gets a stable hash");
    assert_eq!(hashed.pathway.as_str(), "greenhouse");
    for record in &records {
        let eval = record.evaluation.as_ref().unwrap();
        assert!((0.0..=100.0).contains(&eval.overall));
    }

    // Second run: everything short-circuits through the cache.
    let second = pipeline::run(cfg, RunMode::DryRun, false).await.unwrap();
    assert_eq!(second.total, 3);
    assert_eq!(second.cache_hits, 3);
    assert_eq!(second.scored, 0);
    assert_eq!(second.emitted, 0);

    drop(holder);
}
