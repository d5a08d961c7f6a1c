//! Classifies which application-tracking system a posting uses. Pure and
//! total over its input; unrecognized URLs map to `Other`.

use crate::models::{JobPosting, PathwayTag};

const DOMAIN_PATTERNS: &[(PathwayTag, &[&str])] = &[
    (
        PathwayTag::Greenhouse,
        &["greenhouse.io", "boards.greenhouse.io", "app.greenhouse.io"],
    ),
    (
        PathwayTag::Workday,
        &[
            "workday.com",
            "myworkdayjobs.com",
            "workdayrecruiting.com",
        ],
    ),
    (PathwayTag::Lever, &["lever.co", "jobs.lever.co"]),
    (PathwayTag::Bamboohr, &["bamboohr.com"]),
    (
        PathwayTag::Smartrecruiters,
        &["smartrecruiters.com", "jobs.smartrecruiters.com"],
    ),
    (PathwayTag::Jobvite, &["jobvite.com", "app.jobvite.com"]),
    (PathwayTag::Ashby, &["ashbyhq.com", "jobs.ashbyhq.com"]),
    (PathwayTag::Icims, &["icims.com", "jobs.icims.com"]),
    (PathwayTag::Taleo, &["taleo.net", "chk.tbe.taleo.net"]),
    (PathwayTag::Jazzhr, &["jazzhr.com", "recruiting.jazzhr.com"]),
    (PathwayTag::Linkedin, &["linkedin.com/jobs"]),
    (PathwayTag::Indeed, &["indeed.com"]),
    (PathwayTag::Angellist, &["angel.co", "angellist.com", "wellfound.com"]),
    (PathwayTag::Ziprecruiter, &["ziprecruiter.com"]),
    (PathwayTag::Glassdoor, &["glassdoor.com"]),
];

const CAREER_PAGE_MARKERS: &[&str] =
    &["/careers", "/jobs", "/career", "/job", "/apply", "/hiring"];

pub fn classify(job: &JobPosting) -> PathwayTag {
    if let Some(hint) = &job.application_hint {
        if let Some(tag) = from_hint(hint) {
            return tag;
        }
    }
    if let Some(tag) = classify_url(&job.apply_url) {
        return tag;
    }
    if let Some(tag) = classify_url(&job.link) {
        return tag;
    }
    PathwayTag::Other
}

fn classify_url(url: &str) -> Option<PathwayTag> {
    let url = url.trim().to_lowercase();
    if url.is_empty() {
        return None;
    }
    for (tag, patterns) in DOMAIN_PATTERNS {
        if patterns.iter().any(|p| url.contains(p)) {
            return Some(*tag);
        }
    }
    if CAREER_PAGE_MARKERS.iter().any(|m| url.contains(m)) {
        return Some(PathwayTag::CompanySite);
    }
    None
}

fn from_hint(hint: &str) -> Option<PathwayTag> {
    let hint = hint.trim().to_lowercase();
    DOMAIN_PATTERNS
        .iter()
        .map(|(tag, _)| *tag)
        .chain([PathwayTag::CompanySite, PathwayTag::Other])
        .find(|tag| tag.as_str() == hint)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_with_urls(apply_url: &str, link: &str) -> JobPosting {
        JobPosting {
            id: None,
            title: "Engineer".into(),
            company: "Acme".into(),
            location: String::new(),
            posted_at: None,
            description: String::new(),
            link: link.into(),
            apply_url: apply_url.into(),
            application_hint: None,
            seniority_level: None,
            employment_type: None,
        }
    }

    #[test]
    fn recognizes_ats_domains() {
        let cases = [
            ("https://boards.greenhouse.io/acme/jobs/1", PathwayTag::Greenhouse),
            ("https://acme.wd5.myworkdayjobs.com/en-US/ext", PathwayTag::Workday),
            ("https://jobs.lever.co/acme/abc", PathwayTag::Lever),
            ("https://jobs.ashbyhq.com/acme/123", PathwayTag::Ashby),
            ("https://careers-acme.icims.com/jobs/42", PathwayTag::Icims),
            ("https://www.linkedin.com/jobs/view/99", PathwayTag::Linkedin),
            ("https://www.ziprecruiter.com/c/acme/job", PathwayTag::Ziprecruiter),
        ];
        for (url, expected) in cases {
            assert_eq!(classify(&job_with_urls(url, "")), expected, "{url}");
        }
    }

    #[test]
    fn career_page_markers_map_to_company_site() {
        let job = job_with_urls("https://acme.example/careers/backend-engineer", "");
        assert_eq!(classify(&job), PathwayTag::CompanySite);
    }

    #[test]
    fn unrecognized_url_maps_to_other() {
        let job = job_with_urls("https://example.com/something-else", "");
        assert_eq!(classify(&job), PathwayTag::Other);
    }

    #[test]
    fn empty_urls_map_to_other() {
        let job = job_with_urls("", "");
        assert_eq!(classify(&job), PathwayTag::Other);
    }

    #[test]
    fn falls_back_to_source_link() {
        let job = job_with_urls("", "https://boards.greenhouse.io/acme/jobs/1");
        assert_eq!(classify(&job), PathwayTag::Greenhouse);
    }

    #[test]
    fn upstream_hint_wins() {
        let mut job = job_with_urls("https://example.com/x", "");
        job.application_hint = Some("workday".into());
        assert_eq!(classify(&job), PathwayTag::Workday);
    }

    #[test]
    fn unknown_hint_is_ignored() {
        let mut job = job_with_urls("https://jobs.lever.co/acme/abc", "");
        job.application_hint = Some("carrier-pigeon".into());
        assert_eq!(classify(&job), PathwayTag::Lever);
    }
}
