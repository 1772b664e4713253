//! Prompt rendering for an external language model

use super::narrative::NarrativeInput;
use crate::processing::TextProcessor;
use log::debug;

/// CV excerpts longer than this are cut at a character boundary.
const MAX_EXCERPT_CHARS: usize = 6000;

/// Single evaluation prompt template
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub evaluation: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            evaluation: EVALUATION_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Fill the template with the computed scores and gaps and a redacted
    /// CV excerpt. The model is asked to explain the numbers, not to
    /// produce new ones.
    pub fn render_evaluation_prompt(&self, input: &NarrativeInput<'_>, cv_excerpt: &str) -> String {
        let excerpt = truncate_chars(&TextProcessor::new().redact_pii(cv_excerpt), MAX_EXCERPT_CHARS);

        let target = match input.job_title {
            Some(title) => format!("{} for the role \"{}\"", input.mode, title),
            None => input.mode.to_string(),
        };

        let scores = input
            .breakdown
            .categories
            .iter()
            .map(|c| format!("- {}: {:.2} / {:.0}", c.category, c.score, c.max))
            .chain(std::iter::once(format!(
                "- Overall: {:.2} / {:.0}",
                input.breakdown.overall, input.breakdown.max_overall
            )))
            .collect::<Vec<_>>()
            .join("\n");

        let gaps = if input.gaps.is_empty() {
            "- none".to_string()
        } else {
            input
                .gaps
                .iter()
                .map(|g| format!("- [{}] {}: {}", g.severity, g.subject, g.remediation))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let prompt = self
            .evaluation
            .replace("{target}", &target)
            .replace("{scores}", &scores)
            .replace("{gaps}", &gaps)
            .replace("{cv}", &excerpt);
        debug!("Rendered evaluation prompt ({} chars)", prompt.chars().count());
        prompt
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}\n[...]", &text[..cut]),
        None => text.to_string(),
    }
}

const EVALUATION_TEMPLATE: &str = r#"TASK: Write a short, factual summary of a CV evaluation ({target}).

The scores below were computed deterministically. Do not change them or invent new ones.

<SCORES>
{scores}
</SCORES>

<GAPS>
{gaps}
</GAPS>

<CV EXCERPT>
{cv}
</CV EXCERPT>

Provide your answer in the following format:

## SUMMARY
Two or three sentences explaining the overall score.

## PRIORITY ACTIONS
The three changes to this CV that would address the most severe gaps.

IMPORTANT: Reference the actual CV content above, not generic advice."#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::report::EvaluationReport;
    use crate::recommendations::{GapItem, GapKind, Severity};
    use crate::scoring::{CategoryScore, ScoreCategory};

    #[test]
    fn test_prompt_contains_scores_gaps_and_excerpt() {
        let mut report = EvaluationReport::placeholder();
        report.job_title = Some("Data Analyst".to_string());
        report.breakdown.categories =
            vec![CategoryScore { category: ScoreCategory::Fulfillment, score: 62.5, max: 100.0 }];
        report.breakdown.overall = 62.5;
        report.gaps = vec![GapItem {
            kind: GapKind::MissingSkill,
            subject: "AWS".to_string(),
            severity: Severity::Critical,
            tier: None,
            remediation: "Add AWS".to_string(),
            declared_index: 0,
        }];

        let prompt = PromptTemplates::default()
            .render_evaluation_prompt(&NarrativeInput::from_report(&report), "Analyst at Acme Corp");

        assert!(prompt.contains("Job match for the role \"Data Analyst\""));
        assert!(prompt.contains("- Requirement fulfillment: 62.50 / 100"));
        assert!(prompt.contains("- [Critical] AWS: Add AWS"));
        assert!(prompt.contains("Analyst at Acme Corp"));
        assert!(prompt.contains("<CV EXCERPT>"));
    }

    #[test]
    fn test_contact_details_are_redacted() {
        let report = EvaluationReport::placeholder();
        let prompt = PromptTemplates::default().render_evaluation_prompt(
            &NarrativeInput::from_report(&report),
            "Jane Doe\njane.doe@example.com\n555-123-4567",
        );
        assert!(!prompt.contains("jane.doe@example.com"));
        assert!(!prompt.contains("555-123-4567"));
        assert!(prompt.contains("[EMAIL REMOVED]"));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let text = "é".repeat(10);
        assert_eq!(truncate_chars(&text, 4), "éééé\n[...]");
        assert_eq!(truncate_chars("short", 10), "short");
    }
}
