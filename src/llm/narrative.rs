//! Narrative summaries of an evaluation

use crate::output::report::{CandidateProfile, EvaluationReport};
use crate::recommendations::GapItem;
use crate::scoring::{ScoreBreakdown, ScoreMode};

/// The computed evaluation a narrator may describe. Narrators never see
/// the raw CV text.
#[derive(Debug, Clone, Copy)]
pub struct NarrativeInput<'a> {
    pub mode: ScoreMode,
    pub breakdown: &'a ScoreBreakdown,
    pub gaps: &'a [GapItem],
    pub profile: &'a CandidateProfile,
    pub job_title: Option<&'a str>,
}

impl<'a> NarrativeInput<'a> {
    pub fn from_report(report: &'a EvaluationReport) -> Self {
        Self {
            mode: report.mode,
            breakdown: &report.breakdown,
            gaps: &report.gaps,
            profile: &report.profile,
            job_title: report.job_title.as_deref(),
        }
    }

    pub fn percentage(&self) -> f32 {
        if self.breakdown.max_overall > 0.0 {
            self.breakdown.overall / self.breakdown.max_overall * 100.0
        } else {
            0.0
        }
    }
}

/// Plug-in seam for summary text. Errors are reported through `anyhow` so
/// that backends can surface whatever failure they have; the evaluator
/// logs them and carries on without a summary.
pub trait NarrativeGenerator: Send + Sync {
    fn narrate(&self, input: &NarrativeInput<'_>) -> anyhow::Result<String>;

    fn name(&self) -> &str;
}

/// Rule-based narrator: a verdict from the score band plus the top gaps.
#[derive(Debug, Clone)]
pub struct TemplateNarrator {
    max_gaps: usize,
}

impl Default for TemplateNarrator {
    fn default() -> Self {
        Self { max_gaps: 3 }
    }
}

impl TemplateNarrator {
    pub fn new(max_gaps: usize) -> Self {
        Self { max_gaps }
    }

    fn verdict(percentage: f32) -> &'static str {
        match percentage {
            p if p >= 80.0 => "Excellent",
            p if p >= 65.0 => "Strong",
            p if p >= 50.0 => "Moderate",
            p if p >= 35.0 => "Developing",
            _ => "Limited",
        }
    }
}

impl NarrativeGenerator for TemplateNarrator {
    fn narrate(&self, input: &NarrativeInput<'_>) -> anyhow::Result<String> {
        let percentage = input.percentage();
        let verdict = Self::verdict(percentage);

        let mut summary = match (input.mode, input.job_title) {
            (ScoreMode::JobMatch, Some(title)) => {
                format!("{} match for {} ({:.0}/100).", verdict, title, percentage)
            }
            (ScoreMode::JobMatch, None) => format!("{} match for this role ({:.0}/100).", verdict, percentage),
            (ScoreMode::General, _) => format!("{} overall profile ({:.0}/100).", verdict, percentage),
        };

        summary.push_str(&format!(
            " The CV shows {} recognized skills and {:.1} years of experience",
            input.profile.skills.len(),
            input.profile.total_years
        ));
        if input.profile.highest_degree.rank() > 0 {
            summary.push_str(&format!(", with a {} as the highest degree", input.profile.highest_degree));
        }
        summary.push('.');

        let top: Vec<String> = input
            .gaps
            .iter()
            .take(self.max_gaps)
            .map(|gap| format!("{} ({})", gap.subject, gap.severity.to_string().to_lowercase()))
            .collect();
        if top.is_empty() {
            summary.push_str(" No significant gaps were found.");
        } else {
            summary.push_str(&format!(" Main gaps: {}.", top.join(", ")));
        }

        Ok(summary)
    }

    fn name(&self) -> &str {
        "template"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendations::{GapKind, Severity};
    use crate::model::RequirementTier;

    fn gap(subject: &str, severity: Severity) -> GapItem {
        GapItem {
            kind: GapKind::MissingSkill,
            subject: subject.to_string(),
            severity,
            tier: Some(RequirementTier::MustHave),
            remediation: String::new(),
            declared_index: 0,
        }
    }

    #[test]
    fn test_verdict_bands() {
        assert_eq!(TemplateNarrator::verdict(92.0), "Excellent");
        assert_eq!(TemplateNarrator::verdict(65.0), "Strong");
        assert_eq!(TemplateNarrator::verdict(50.0), "Moderate");
        assert_eq!(TemplateNarrator::verdict(40.0), "Developing");
        assert_eq!(TemplateNarrator::verdict(5.0), "Limited");
    }

    #[test]
    fn test_job_match_summary_mentions_title_and_gaps() {
        let mut report = EvaluationReport::placeholder();
        report.breakdown.overall = 72.0;
        report.job_title = Some("Data Analyst".to_string());
        report.gaps = vec![
            gap("AWS", Severity::Critical),
            gap("SQL", Severity::Moderate),
            gap("Docker", Severity::Minor),
            gap("Go", Severity::Minor),
        ];

        let summary = TemplateNarrator::default().narrate(&NarrativeInput::from_report(&report)).unwrap();
        assert!(summary.starts_with("Strong match for Data Analyst (72/100)."));
        assert!(summary.contains("AWS (critical), SQL (moderate), Docker (minor)"));
        assert!(!summary.contains("Go"));
    }

    #[test]
    fn test_summary_without_gaps() {
        let report = EvaluationReport::placeholder();
        let summary = TemplateNarrator::default().narrate(&NarrativeInput::from_report(&report)).unwrap();
        assert!(summary.starts_with("Limited match"));
        assert!(summary.ends_with("No significant gaps were found."));
    }
}
