//! Degree and seniority detection

use crate::model::{CompletionStatus, DegreeLevel, Seniority};
use once_cell::sync::Lazy;
use regex::Regex;

/// Highest level first; the first pattern that fires decides the level.
static DEGREE_PATTERNS: Lazy<Vec<(DegreeLevel, Regex)>> = Lazy::new(|| {
    [
        (
            DegreeLevel::Doctorate,
            r"(?i)\b(?:ph\.?\s?d\b|doctorate\b|doctoral\b|doctor\s+of\b|d\.?phil\b)",
        ),
        (
            DegreeLevel::Master,
            r"(?i)\b(?:masters?\b|master'?s\b|m\.sc\b|msc\b|m\.s\.|mba\b|m\.eng\b|meng\b|m\.a\.)",
        ),
        (
            DegreeLevel::Bachelor,
            r"(?i)\b(?:bachelors?\b|bachelor'?s\b|b\.sc\b|bsc\b|b\.s\.|b\.a\.|b\.eng\b|beng\b|b\.?tech\b|undergraduate\s+degree\b)|(?-i:\b(?:BS|BA)\b)",
        ),
        (
            DegreeLevel::Associate,
            r"(?i)\b(?:associate'?s?\s+(?:degree|of)\b|a\.a\.s?\.|a\.s\.)",
        ),
        (
            DegreeLevel::Certificate,
            r"(?i)\b(?:certificate|certification|certified|diploma)\b",
        ),
    ]
    .into_iter()
    .map(|(level, pattern)| (level, Regex::new(pattern).expect("Invalid degree regex")))
    .collect()
});

static IN_PROGRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:expected|in\s+progress|ongoing|currently|pursuing|candidate|present)\b")
        .expect("Invalid status regex")
});

static COMPLETED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:graduated|completed|awarded|conferred|19[5-9]\d|20\d{2})\b").expect("Invalid status regex")
});

const INSTITUTION_WORDS: &[&str] = &["university", "college", "institute", "school", "academy", "polytechnic"];

/// (seniority, title keywords) checked from the top down.
const SENIORITY_KEYWORDS: &[(Seniority, &[&str])] = &[
    (
        Seniority::Executive,
        &["chief", "cto", "ceo", "cfo", "cio", "vp", "vice president", "director", "head of"],
    ),
    (Seniority::Principal, &["principal", "staff", "distinguished", "architect"]),
    (Seniority::Lead, &["lead", "manager", "team lead", "tech lead"]),
    (Seniority::Senior, &["senior", "sr"]),
    (Seniority::Junior, &["junior", "jr", "associate"]),
    (
        Seniority::Entry,
        &["intern", "internship", "trainee", "apprentice", "graduate", "entry level", "entry-level"],
    ),
    (Seniority::Mid, &["mid", "mid-level", "intermediate"]),
];

#[derive(Debug, Clone, PartialEq)]
pub struct DegreeMatch {
    pub level: DegreeLevel,
    pub field: Option<String>,
    pub institution: Option<String>,
    pub status: CompletionStatus,
    /// Byte range of the degree keyword
    pub span: (usize, usize),
}

/// Detect the highest degree named on a line.
pub fn detect_degree(line: &str) -> Option<DegreeMatch> {
    let (level, m) = DEGREE_PATTERNS
        .iter()
        .find_map(|(level, re)| re.find(line).map(|m| (*level, m)))?;

    Some(DegreeMatch {
        level,
        field: field_of_study(&line[m.end()..]),
        institution: institution(line),
        status: completion_status(line),
        span: (m.start(), m.end()),
    })
}

/// Every degree level mentioned in a piece of text.
pub fn degree_levels(text: &str) -> Vec<DegreeLevel> {
    DEGREE_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(level, _)| *level)
        .collect()
}

pub fn completion_status(line: &str) -> CompletionStatus {
    if IN_PROGRESS_RE.is_match(line) {
        CompletionStatus::InProgress
    } else if COMPLETED_RE.is_match(line) {
        CompletionStatus::Completed
    } else {
        CompletionStatus::Unknown
    }
}

/// `in X` wins over `of X`: "Bachelor of Science in Statistics" -> Statistics.
/// Markers are ASCII, so ASCII lowercasing keeps offsets valid for `rest`.
fn field_of_study(rest: &str) -> Option<String> {
    let lower = rest.to_ascii_lowercase();
    let start = [" in ", " of "]
        .iter()
        .find_map(|marker| lower.find(marker).map(|idx| idx + marker.len()))?;

    let tail = &rest[start..];
    let lower_tail = &lower[start..];
    let mut end = tail.len();
    for stop in [",", "|", "(", " - ", " at ", " from ", ";"] {
        if let Some(idx) = lower_tail.find(stop) {
            end = end.min(idx);
        }
    }
    if let Some(idx) = tail.find(|c: char| c.is_ascii_digit()) {
        end = end.min(idx);
    }

    let field = tail[..end].trim().trim_end_matches('.').trim();
    let words = field.split_whitespace().count();
    if field.is_empty() || words > 6 || INSTITUTION_WORDS.iter().any(|w| field.to_lowercase().contains(w)) {
        None
    } else {
        Some(field.to_string())
    }
}

/// Segment of the line naming a university, college, institute, etc.
pub fn institution(line: &str) -> Option<String> {
    line.split(|c| matches!(c, ',' | '|' | '(' | ')' | ';'))
        .flat_map(|segment| segment.split(" - "))
        .map(|segment| segment.trim())
        .find(|segment| {
            let lower = segment.to_lowercase();
            INSTITUTION_WORDS.iter().any(|w| lower.contains(w))
        })
        .map(|segment| {
            let cleaned = segment
                .trim_start_matches("at ")
                .trim_start_matches("from ")
                .trim_end_matches(|c: char| c.is_ascii_digit() || c.is_whitespace() || c == '-');
            cleaned.trim().to_string()
        })
        .filter(|s| !s.is_empty())
}

/// Seniority implied by a job title, if it names one.
pub fn detect_seniority(title: &str) -> Option<Seniority> {
    let lower = title.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .filter(|w| !w.is_empty())
        .collect();

    SENIORITY_KEYWORDS
        .iter()
        .find(|(_, keywords)| {
            keywords.iter().any(|keyword| {
                if keyword.contains(' ') {
                    lower.contains(keyword)
                } else {
                    words.contains(keyword)
                }
            })
        })
        .map(|(level, _)| *level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degree_levels_highest_first() {
        assert_eq!(detect_degree("PhD in Computer Science").unwrap().level, DegreeLevel::Doctorate);
        assert_eq!(detect_degree("M.Sc. Data Science").unwrap().level, DegreeLevel::Master);
        assert_eq!(detect_degree("MBA, Harvard Business School").unwrap().level, DegreeLevel::Master);
        assert_eq!(detect_degree("Bachelor's degree in Statistics").unwrap().level, DegreeLevel::Bachelor);
        assert_eq!(detect_degree("BS in Mathematics").unwrap().level, DegreeLevel::Bachelor);
        assert_eq!(detect_degree("Associate Degree in Accounting").unwrap().level, DegreeLevel::Associate);
        assert_eq!(detect_degree("AWS Certified Solutions Architect").unwrap().level, DegreeLevel::Certificate);
        assert!(detect_degree("Proficient in MS Excel").is_none());
        assert!(detect_degree("Associate Software Engineer").is_none());
    }

    #[test]
    fn test_degree_details() {
        let m = detect_degree("Bachelor of Science in Statistics, State University, 2018").unwrap();
        assert_eq!(m.field.as_deref(), Some("Statistics"));
        assert_eq!(m.institution.as_deref(), Some("State University"));
        assert_eq!(m.status, CompletionStatus::Completed);

        let m = detect_degree("Master of Business Administration (expected 2026)").unwrap();
        assert_eq!(m.field.as_deref(), Some("Business Administration"));
        assert_eq!(m.status, CompletionStatus::InProgress);
    }

    #[test]
    fn test_degree_details_with_non_ascii_text() {
        let m = detect_degree("Bachelor İstanbul in Économie").unwrap();
        assert_eq!(m.level, DegreeLevel::Bachelor);
        assert_eq!(m.field.as_deref(), Some("Économie"));

        let m = detect_degree("Master İİ of Ingeniería Química, Técnica University, 2015").unwrap();
        assert_eq!(m.field.as_deref(), Some("Ingeniería Química"));
        assert_eq!(m.institution.as_deref(), Some("Técnica University"));
    }

    #[test]
    fn test_degree_levels_in_text() {
        let levels = degree_levels("Bachelor's degree required; Master's preferred.");
        assert!(levels.contains(&DegreeLevel::Bachelor));
        assert!(levels.contains(&DegreeLevel::Master));
    }

    #[test]
    fn test_seniority_detection() {
        assert_eq!(detect_seniority("Senior Data Engineer"), Some(Seniority::Senior));
        assert_eq!(detect_seniority("Sr. Software Engineer"), Some(Seniority::Senior));
        assert_eq!(detect_seniority("Engineering Manager"), Some(Seniority::Lead));
        assert_eq!(detect_seniority("VP of Engineering"), Some(Seniority::Executive));
        assert_eq!(detect_seniority("Software Engineering Intern"), Some(Seniority::Entry));
        assert_eq!(detect_seniority("Staff Engineer"), Some(Seniority::Principal));
        assert_eq!(detect_seniority("Data Analyst"), None);
    }
}
