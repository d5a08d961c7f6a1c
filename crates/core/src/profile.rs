//! Loads the candidate's resume text once per run; immutable afterwards.

use crate::error::EvalError;
use crate::models::ResumeProfile;

pub fn load(path: &str) -> Result<ResumeProfile, EvalError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| EvalError::ProfileMissing(format!("{}: {}", path, e)))?;
    let text = raw.trim();
    if text.is_empty() {
        return Err(EvalError::ProfileMissing(format!("{} is empty", path)));
    }
    Ok(ResumeProfile {
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_profile_missing() {
        let err = load("/definitely/not/here/resume.txt").unwrap_err();
        assert!(matches!(err, EvalError::ProfileMissing(_)));
    }

    #[test]
    fn empty_file_is_profile_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.txt");
        std::fs::write(&path, "   \n").unwrap();
        let err = load(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, EvalError::ProfileMissing(_)));
    }

    #[test]
    fn loads_and_trims() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.txt");
        std::fs::write(&path, "Senior Rust engineer.\n").unwrap();
        let profile = load(path.to_str().unwrap()).unwrap();
        assert_eq!(profile.text, "Senior Rust engineer.");
    }
}
