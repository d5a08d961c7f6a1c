use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized job posting as produced by the upstream filter stage.
/// Consumed read-only by the evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub posted_at: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Source URL of the listing.
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub apply_url: String,
    /// Optional application-system hint from upstream.
    #[serde(default)]
    pub application_hint: Option<String>,
    #[serde(default)]
    pub seniority_level: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
}

impl JobPosting {
    /// Stable identifier: the upstream id when present, otherwise a blake3
    /// hash over source URL + title + company.
    pub fn identifier(&self) -> String {
        if let Some(id) = &self.id {
            if !id.is_empty() {
                return id.clone();
            }
        }
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.link.as_bytes());
        hasher.update(self.title.as_bytes());
        hasher.update(self.company.as_bytes());
        let hex = hasher.finalize().to_hex();
        hex.as_str()[..16].to_string()
    }
}

#[derive(Debug, Clone)]
pub struct ResumeProfile {
    pub text: String,
}

/// Weighted evaluation criteria; weights sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    TechnicalSkills,
    ExperienceLevel,
    DomainRelevance,
    SoftSkills,
}

impl Criterion {
    pub const ALL: [Criterion; 4] = [
        Criterion::TechnicalSkills,
        Criterion::ExperienceLevel,
        Criterion::DomainRelevance,
        Criterion::SoftSkills,
    ];

    pub fn weight(self) -> f64 {
        match self {
            Criterion::TechnicalSkills => 0.40,
            Criterion::ExperienceLevel => 0.25,
            Criterion::DomainRelevance => 0.20,
            Criterion::SoftSkills => 0.15,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Criterion::TechnicalSkills => "technical_skills",
            Criterion::ExperienceLevel => "experience_level",
            Criterion::DomainRelevance => "domain_relevance",
            Criterion::SoftSkills => "soft_skills",
        }
    }

    pub fn prompt_line(self) -> &'static str {
        match self {
            Criterion::TechnicalSkills => {
                "technical_skills (40%): stack, languages, frameworks, tools"
            }
            Criterion::ExperienceLevel => {
                "experience_level (25%): years, seniority, scope of responsibility"
            }
            Criterion::DomainRelevance => {
                "domain_relevance (20%): industry, business model, problem space"
            }
            Criterion::SoftSkills => {
                "soft_skills (15%): client-facing work, teamwork, communication"
            }
        }
    }
}

/// Per-criterion sub-scores, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub technical_skills: f64,
    pub experience_level: f64,
    pub domain_relevance: f64,
    pub soft_skills: f64,
}

impl SubScores {
    pub fn get(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::TechnicalSkills => self.technical_skills,
            Criterion::ExperienceLevel => self.experience_level,
            Criterion::DomainRelevance => self.domain_relevance,
            Criterion::SoftSkills => self.soft_skills,
        }
    }

    /// Weighted overall score in [0, 100].
    pub fn overall(&self) -> f64 {
        Criterion::ALL
            .iter()
            .map(|c| self.get(*c) * c.weight())
            .sum()
    }

    pub fn in_range(&self) -> bool {
        Criterion::ALL
            .iter()
            .all(|c| (0.0..=100.0).contains(&self.get(*c)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Primary,
    Backup,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Primary => write!(f, "primary"),
            Tier::Backup => write!(f, "backup"),
        }
    }
}

/// One tier's evaluation outcome. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub scores: SubScores,
    pub overall: f64,
    pub tier: Tier,
    pub rationale: String,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Scored,
    Failed,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Scored => write!(f, "scored"),
            RecordStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Application-tracking system behind a posting. Closed set; classification
/// is total and falls back to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathwayTag {
    Greenhouse,
    Workday,
    Lever,
    Bamboohr,
    Smartrecruiters,
    Jobvite,
    Ashby,
    Icims,
    Taleo,
    Jazzhr,
    Linkedin,
    Indeed,
    Angellist,
    Ziprecruiter,
    Glassdoor,
    CompanySite,
    Other,
}

impl PathwayTag {
    pub fn as_str(self) -> &'static str {
        match self {
            PathwayTag::Greenhouse => "greenhouse",
            PathwayTag::Workday => "workday",
            PathwayTag::Lever => "lever",
            PathwayTag::Bamboohr => "bamboohr",
            PathwayTag::Smartrecruiters => "smartrecruiters",
            PathwayTag::Jobvite => "jobvite",
            PathwayTag::Ashby => "ashby",
            PathwayTag::Icims => "icims",
            PathwayTag::Taleo => "taleo",
            PathwayTag::Jazzhr => "jazzhr",
            PathwayTag::Linkedin => "linkedin",
            PathwayTag::Indeed => "indeed",
            PathwayTag::Angellist => "angellist",
            PathwayTag::Ziprecruiter => "ziprecruiter",
            PathwayTag::Glassdoor => "glassdoor",
            PathwayTag::CompanySite => "company_site",
            PathwayTag::Other => "other",
        }
    }
}

impl fmt::Display for PathwayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error detail carried by a failed record, enough to support manual
/// reprocessing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureDetail {
    pub tier: Tier,
    pub kind: String,
    pub message: String,
}

/// The single merged evaluation outcome emitted downstream and cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizedRecord {
    pub identifier: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub link: String,
    pub apply_url: String,
    pub pathway: PathwayTag,
    pub status: RecordStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub evaluation: Option<EvaluationResult>,
    /// Primary-tier result retained for audit when escalation occurred.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub primary_audit: Option<EvaluationResult>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub failure: Option<FailureDetail>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub posted_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub seniority_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub employment_type: Option<String>,
}

impl FinalizedRecord {
    pub fn overall(&self) -> Option<f64> {
        self.evaluation.as_ref().map(|e| e.overall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criterion_weights_sum_to_one() {
        let sum: f64 = Criterion::ALL.iter().map(|c| c.weight()).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn overall_is_weighted_sum() {
        let scores = SubScores {
            technical_skills: 80.0,
            experience_level: 60.0,
            domain_relevance: 40.0,
            soft_skills: 20.0,
        };
        // 0.40*80 + 0.25*60 + 0.20*40 + 0.15*20
        assert!((scores.overall() - 58.0).abs() < 1e-9);
    }

    #[test]
    fn overall_bounds() {
        let zero = SubScores {
            technical_skills: 0.0,
            experience_level: 0.0,
            domain_relevance: 0.0,
            soft_skills: 0.0,
        };
        let full = SubScores {
            technical_skills: 100.0,
            experience_level: 100.0,
            domain_relevance: 100.0,
            soft_skills: 100.0,
        };
        assert_eq!(zero.overall(), 0.0);
        assert!((full.overall() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn identifier_prefers_upstream_id() {
        let job = JobPosting {
            id: Some("J42".into()),
            title: "Engineer".into(),
            company: "Acme".into(),
            location: String::new(),
            posted_at: None,
            description: String::new(),
            link: "https://example.com/j/42".into(),
            apply_url: String::new(),
            application_hint: None,
            seniority_level: None,
            employment_type: None,
        };
        assert_eq!(job.identifier(), "J42");
    }

    #[test]
    fn identifier_is_stable_hash_without_id() {
        let mut job = JobPosting {
            id: None,
            title: "Engineer".into(),
            company: "Acme".into(),
            location: String::new(),
            posted_at: None,
            description: String::new(),
            link: "https://example.com/j/42".into(),
            apply_url: String::new(),
            application_hint: None,
            seniority_level: None,
            employment_type: None,
        };
        let first = job.identifier();
        assert_eq!(first, job.identifier());
        assert_eq!(first.len(), 16);
        job.company = "Other Corp".into();
        assert_ne!(first, job.identifier());
    }
}
