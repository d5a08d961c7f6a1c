//! Locates and loads the upstream filter stage's newest drop file.

use crate::models::JobPosting;
use anyhow::Context;
use globset::Glob;
use std::path::PathBuf;
use std::time::SystemTime;
use walkdir::WalkDir;

/// Picks the newest file matching `pattern` in `dir` and parses it as a
/// JSON array of job postings.
pub fn load_latest(dir: &str, pattern: &str) -> anyhow::Result<(PathBuf, Vec<JobPosting>)> {
    let matcher = Glob::new(pattern)
        .with_context(|| format!("invalid input pattern {pattern}"))?
        .compile_matcher();

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in WalkDir::new(dir).max_depth(1) {
        let entry = entry.with_context(|| format!("reading input dir {dir}"))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if !matcher.is_match(entry.file_name()) {
            continue;
        }
        let mtime = entry
            .metadata()
            .with_context(|| format!("stat {}", entry.path().display()))?
            .modified()
            .unwrap_or(SystemTime::UNIX_EPOCH);
        if newest.as_ref().map(|(t, _)| mtime > *t).unwrap_or(true) {
            newest = Some((mtime, entry.into_path()));
        }
    }

    let (_, path) =
        newest.with_context(|| format!("no files matching {pattern} in {dir}"))?;
    let data = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let jobs: Vec<JobPosting> =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok((path, jobs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_newest_matching_file() {
        let dir = tempfile::tempdir().unwrap();
        let older = dir.path().join("filtered_jobs_2025-01-01.json");
        let newer = dir.path().join("filtered_jobs_2025-02-01.json");
        std::fs::write(&older, r#"[{"title": "Old"}]"#).unwrap();
        std::fs::write(&newer, r#"[{"title": "New"}, {"title": "Newer"}]"#).unwrap();
        let old_time = std::time::SystemTime::now() - std::time::Duration::from_secs(3600);
        let file = std::fs::File::open(&older).unwrap();
        file.set_modified(old_time).unwrap();

        let (path, jobs) =
            load_latest(dir.path().to_str().unwrap(), "filtered_jobs_*.json").unwrap();
        assert_eq!(path, newer);
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].title, "New");
    }

    #[test]
    fn errors_when_nothing_matches() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hi").unwrap();
        let err = load_latest(dir.path().to_str().unwrap(), "filtered_jobs_*.json").unwrap_err();
        assert!(err.to_string().contains("no files matching"));
    }
}
