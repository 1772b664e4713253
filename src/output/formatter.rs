//! Output formatters for evaluation reports and candidate rankings

use crate::config::OutputFormat;
use crate::error::{CvEvaluatorError, Result};
use crate::model::{CompletionStatus, Period, PeriodEnd};
use crate::output::report::{EvaluationReport, ExtractionConfidence};
use crate::recommendations::Severity;
use crate::scoring::{RankedCandidate, RequirementStatus, ScoreMode};
use askama::Template;
use colored::{Color, Colorize};
use std::path::Path;

/// Trait for formatting evaluation reports
pub trait OutputFormatter {
    fn format_report(&self, report: &EvaluationReport) -> Result<String>;
    fn format_ranking(&self, ranking: &[RankedCandidate]) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Console formatter with colors
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

/// JSON formatter for API integration and structured data
pub struct JsonFormatter {
    pretty: bool,
}

/// Markdown formatter for documentation and reports
pub struct MarkdownFormatter {
    include_metadata: bool,
}

/// HTML formatter with inline styling
pub struct HtmlFormatter {
    include_styles: bool,
}

/// Report generator that coordinates different formatters
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
    html_formatter: HtmlFormatter,
}

/// Askama template for HTML output
#[derive(Template)]
#[template(source = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ title }}</title>
    {% if include_styles %}
    <style>
        :root {
            --ink: #1f2933;
            --muted: #616e7c;
            --rule: #d9e2ec;
            --paper: #fffdf8;
            --accent: #3d5a80;
            --critical: #b42318;
            --moderate: #b54708;
            --minor: #3f6212;
        }
        body {
            font-family: Georgia, 'Iowan Old Style', 'Times New Roman', serif;
            color: var(--ink);
            background: #eef1f5;
            margin: 0;
            padding: 32px 16px;
        }
        main.scorecard {
            max-width: 820px;
            margin: 0 auto;
            background: var(--paper);
            border-top: 6px solid var(--accent);
            padding: 28px 36px;
        }
        header.verdict {
            display: flex;
            justify-content: space-between;
            align-items: flex-end;
            gap: 24px;
            border-bottom: 1px solid var(--rule);
            padding-bottom: 16px;
        }
        header.verdict h1 { font-size: 1.6em; margin: 0 0 4px 0; }
        header.verdict .meta { color: var(--muted); font-size: 0.9em; margin: 0; }
        .total { text-align: right; font-family: 'Helvetica Neue', Arial, sans-serif; }
        .total .figure { font-size: 2.4em; font-weight: 700; line-height: 1; }
        .total .band {
            display: inline-block;
            margin-top: 6px;
            padding: 2px 10px;
            font-size: 0.8em;
            letter-spacing: 0.08em;
            text-transform: uppercase;
            border: 1px solid currentColor;
        }
        .band-excellent { color: #1d6f42; }
        .band-strong { color: #2f6690; }
        .band-moderate { color: #8a6d1d; }
        .band-developing { color: var(--moderate); }
        .band-limited { color: var(--critical); }
        section { margin-top: 28px; }
        section h2 {
            font-size: 0.85em;
            letter-spacing: 0.12em;
            text-transform: uppercase;
            color: var(--accent);
            margin-bottom: 12px;
        }
        .meter { margin: 10px 0; font-family: 'Helvetica Neue', Arial, sans-serif; font-size: 0.9em; }
        .meter .label { display: flex; justify-content: space-between; }
        .meter .track { height: 8px; background: var(--rule); margin-top: 4px; }
        .meter .fill { height: 8px; background: var(--accent); }
        blockquote { margin: 16px 0; padding-left: 14px; border-left: 3px solid var(--rule); font-style: italic; }
        ol.gaps { list-style: none; padding: 0; margin: 0; }
        .gap { padding: 10px 12px; margin-bottom: 8px; background: #ffffff; border: 1px solid var(--rule); }
        .gap p { margin: 6px 0 0 0; color: var(--muted); }
        .gap .severity {
            float: right;
            font-family: 'Helvetica Neue', Arial, sans-serif;
            font-size: 0.75em;
            text-transform: uppercase;
            letter-spacing: 0.06em;
        }
        .gap-critical { border-left: 5px solid var(--critical); }
        .gap-critical .severity { color: var(--critical); }
        .gap-moderate { border-left: 5px solid var(--moderate); }
        .gap-moderate .severity { color: var(--moderate); }
        .gap-minor { border-left: 5px solid var(--minor); }
        .gap-minor .severity { color: var(--minor); }
        .gap .tier { font-size: 0.8em; color: var(--muted); }
        table.requirements { border-collapse: collapse; width: 100%; font-size: 0.92em; }
        table.requirements th { text-align: left; color: var(--muted); font-weight: normal; border-bottom: 2px solid var(--rule); padding: 4px 8px; }
        table.requirements td { padding: 6px 8px; border-bottom: 1px solid var(--rule); }
        .status-satisfied { color: #1d6f42; }
        .status-partial { color: var(--moderate); }
        .status-missing { color: var(--critical); font-weight: 700; }
        ul.checks { padding-left: 18px; }
        footer.provenance {
            margin-top: 32px;
            padding-top: 12px;
            border-top: 1px solid var(--rule);
            font-size: 0.8em;
            color: var(--muted);
        }
    </style>
    {% endif %}
</head>
<body>
    <main class="scorecard">
        <header class="verdict">
            <div>
                <h1>{{ title }}</h1>
                <p class="meta">{{ mode }} &middot; extraction confidence {{ confidence }}</p>
            </div>
            <div class="total">
                <div class="figure">{{ overall }}<small> / {{ max_overall }}</small></div>
                <span class="band {{ band_class }}">{{ score_label }}</span>
            </div>
        </header>

        {% if has_summary %}
        <blockquote>{{ summary }}</blockquote>
        {% endif %}

        <section class="breakdown">
            <h2>Score breakdown</h2>
            {% for category in categories %}
            <div class="meter">
                <div class="label"><span>{{ category.name }}</span><span>{{ category.score }} / {{ category.max }}</span></div>
                <div class="track"><div class="fill" style="width: {{ category.percent }}%"></div></div>
            </div>
            {% endfor %}
        </section>

        {% if has_requirements %}
        <section class="requirements">
            <h2>Requirements</h2>
            {{ requirements_html | safe }}
        </section>
        {% endif %}

        <section class="recommendations">
            <h2>Gaps and recommendations</h2>
            {{ gaps_html | safe }}
        </section>

        {% if has_profile %}
        <section class="profile">
            <h2>Candidate profile</h2>
            {{ profile_html | safe }}
        </section>
        {% endif %}

        <footer class="provenance">
            CV Evaluator v{{ version }} &middot; reference date {{ reference_date }} &middot;
            {{ similarity }} similarity &middot; {{ taxonomy_size }} skills in taxonomy
        </footer>
    </main>
</body>
</html>"#, ext = "html")]
struct HtmlTemplate {
    include_styles: bool,
    title: String,
    mode: String,
    confidence: String,
    overall: String,
    max_overall: String,
    band_class: String,
    score_label: String,
    summary: String,
    has_summary: bool,
    categories: Vec<HtmlCategory>,
    // Pre-rendered fragments; every interpolated value is escaped first
    requirements_html: String,
    has_requirements: bool,
    gaps_html: String,
    profile_html: String,
    has_profile: bool,
    version: String,
    reference_date: String,
    similarity: String,
    taxonomy_size: usize,
}

#[derive(Debug, Clone)]
struct HtmlCategory {
    name: String,
    score: String,
    max: String,
    /// Meter width, 0 to 100
    percent: u8,
}

fn gap_class(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "gap-critical",
        Severity::Moderate => "gap-moderate",
        Severity::Minor => "gap-minor",
    }
}

fn status_class(status: RequirementStatus) -> &'static str {
    match status {
        RequirementStatus::Satisfied => "status-satisfied",
        RequirementStatus::UnderSatisfied => "status-partial",
        RequirementStatus::Unmet => "status-missing",
    }
}

/// Label shared by every formatter, keyed on the whole-number percentage.
fn score_label(percentage: u8) -> &'static str {
    match percentage {
        80..=100 => "Excellent",
        65..=79 => "Strong",
        50..=64 => "Moderate",
        35..=49 => "Developing",
        _ => "Limited",
    }
}

fn report_title(report: &EvaluationReport) -> String {
    match (report.mode, report.job_title.as_deref()) {
        (ScoreMode::JobMatch, Some(title)) => format!("CV Evaluation: {}", title),
        (ScoreMode::JobMatch, None) => "CV Evaluation: Job Match".to_string(),
        (ScoreMode::General, _) => "CV Evaluation".to_string(),
    }
}

fn format_month(index: i32) -> String {
    const MONTHS: [&str; 12] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];
    format!("{} {}", MONTHS[index.rem_euclid(12) as usize], index.div_euclid(12))
}

/// Inclusive display form of a half-open period.
fn format_period(period: Option<&Period>) -> String {
    match period {
        None => "undated".to_string(),
        Some(p) => match p.end() {
            PeriodEnd::Open => format!("{} - Present", format_month(p.start())),
            PeriodEnd::Closed(end) => {
                format!("{} - {}", format_month(p.start()), format_month((end - 1).max(p.start())))
            }
        },
    }
}

fn format_years(years: Option<f32>) -> String {
    years.map_or_else(|| "-".to_string(), |y| format!("{:.1}", y))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            _ => "▒",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            _ => Color::Yellow,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_score_badge(&self, percentage: u8) -> String {
        let color = match percentage {
            80..=100 => Color::Green,
            65..=79 => Color::BrightGreen,
            50..=64 => Color::Yellow,
            35..=49 => Color::BrightYellow,
            _ => Color::Red,
        };
        let badge = score_label(percentage).to_uppercase();

        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }

    fn format_bar(ratio: f32) -> String {
        let filled = (ratio.clamp(0.0, 1.0) * 20.0).round() as usize;
        format!("{}{}", "█".repeat(filled), "░".repeat(20 - filled))
    }

    fn format_severity(&self, severity: Severity) -> String {
        let (label, color) = match severity {
            Severity::Critical => ("[!]", Color::Red),
            Severity::Moderate => ("[*]", Color::Yellow),
            Severity::Minor => ("[-]", Color::Blue),
        };
        self.colorize(label, color)
    }

    fn format_status(&self, status: RequirementStatus) -> String {
        match status {
            RequirementStatus::Satisfied => self.colorize("✓", Color::Green),
            RequirementStatus::UnderSatisfied => self.colorize("~", Color::Yellow),
            RequirementStatus::Unmet => self.colorize("✗", Color::Red),
        }
    }

    fn format_profile(&self, report: &EvaluationReport) -> String {
        let profile = &report.profile;
        let mut output = String::new();

        output.push_str(&self.format_header("Candidate Profile", 2));
        output.push_str(&format!(
            "Total experience: {:.1} years | Highest degree: {}\n",
            profile.total_years, profile.highest_degree
        ));
        if !profile.contact.emails.is_empty() {
            output.push_str(&format!("Contact: {}\n", profile.contact.emails.join(", ")));
        }

        output.push_str(&self.format_header("Skills", 3));
        for skill in &profile.skills {
            output.push_str(&format!(
                "  • {} {} ({}, {} yrs)\n",
                skill.name,
                self.colorize(&format!("[{}]", skill.category), Color::BrightBlack),
                skill.proficiency,
                format_years(skill.years)
            ));
        }
        if !profile.unrecognized_terms.is_empty() {
            output.push_str(&format!(
                "  Unrecognized: {}\n",
                self.colorize(&profile.unrecognized_terms.join(", "), Color::BrightBlack)
            ));
        }

        if !profile.experience.is_empty() {
            output.push_str(&self.format_header("Experience", 3));
            for entry in &profile.experience {
                output.push_str(&format!(
                    "  • {} ({}) {}\n",
                    entry.title,
                    entry.seniority,
                    self.colorize(&format_period(entry.period.as_ref()), Color::BrightBlack)
                ));
            }
        }

        if !profile.education.is_empty() {
            output.push_str(&self.format_header("Education", 3));
            for entry in &profile.education {
                let field = entry.field.as_deref().map(|f| format!(" in {}", f)).unwrap_or_default();
                let status = if entry.status == CompletionStatus::InProgress { " (in progress)" } else { "" };
                output.push_str(&format!("  • {}{}{}\n", entry.level, field, status));
            }
        }

        if !report.warnings.is_empty() {
            output.push_str(&self.format_header("Extraction Warnings", 3));
            for warning in &report.warnings {
                output.push_str(&format!(
                    "  line {}: {} {}\n",
                    warning.line,
                    warning.kind,
                    self.colorize(&format!("\"{}\"", warning.text), Color::BrightBlack)
                ));
            }
        }

        output
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &EvaluationReport) -> Result<String> {
        let mut output = String::new();
        let percentage = report.percentage();

        output.push_str(&self.format_header(&report_title(report), 1));
        output.push_str(&format!("{} | Extraction confidence: {}\n", report.mode, report.confidence));

        output.push_str(&self.format_header("Score Breakdown", 2));
        output.push_str(&format!(
            "Overall: {:.2} / {:.0} {}\n\n",
            report.breakdown.overall,
            report.breakdown.max_overall,
            self.format_score_badge(percentage)
        ));
        for category in &report.breakdown.categories {
            output.push_str(&format!(
                "  {:<24} {} {:>6.2} / {:.0}\n",
                category.category.to_string(),
                self.colorize(&Self::format_bar(category.ratio()), Color::Cyan),
                category.score,
                category.max
            ));
        }

        if let Some(summary) = &report.summary {
            output.push_str(&format!("\n{} {}\n", self.colorize("Summary:", Color::Cyan), summary));
        }

        if !report.requirement_outcomes.is_empty() {
            output.push_str(&self.format_header("Requirements", 2));
            for outcome in &report.requirement_outcomes {
                let requirement = &outcome.requirement;
                let found = match (outcome.matched_proficiency, outcome.matched_years) {
                    (Some(p), Some(y)) => format!("{}, {:.1} yrs", p, y),
                    (Some(p), None) => p.to_string(),
                    _ => "not found".to_string(),
                };
                output.push_str(&format!(
                    "  {} {} {} {}\n",
                    self.format_status(outcome.status),
                    requirement.name,
                    self.colorize(&format!("({})", requirement.tier), Color::BrightBlack),
                    self.colorize(&format!("- {}", found), Color::BrightBlack)
                ));
            }
            for check in &report.constraint_checks {
                let marker = if check.met { self.colorize("✓", Color::Green) } else { self.colorize("✗", Color::Red) };
                output.push_str(&format!(
                    "  {} {}: required {}, found {}\n",
                    marker, check.kind, check.required, check.actual
                ));
            }
            if !report.unresolved_job_terms.is_empty() {
                output.push_str(&format!(
                    "  Not in taxonomy (ignored): {}\n",
                    self.colorize(&report.unresolved_job_terms.join(", "), Color::BrightBlack)
                ));
            }
        }

        output.push_str(&self.format_header("Recommendations", 2));
        if report.gaps.is_empty() {
            output.push_str(&self.colorize("No significant gaps found.\n", Color::Green));
        }
        for (i, gap) in report.gaps.iter().enumerate() {
            output.push_str(&format!(
                "{}. {} {}\n   {}\n",
                i + 1,
                self.format_severity(gap.severity),
                self.colorize(&gap.subject, Color::White),
                gap.remediation
            ));
        }

        if !report.suggested_skills.is_empty() {
            output.push_str(&self.format_header("In-Demand Skills to Consider", 3));
            let names: Vec<&str> = report.suggested_skills.iter().map(|s| s.name.as_str()).collect();
            output.push_str(&format!("  {}\n", names.join(", ")));
        }

        if self.detailed {
            output.push_str(&self.format_profile(report));
        } else if report.confidence != ExtractionConfidence::High {
            output.push_str(&format!(
                "\n{} {} extraction warning(s); run with --detailed to see them\n",
                self.colorize("Note:", Color::Yellow),
                report.warnings.len()
            ));
        }

        output.push_str(&format!(
            "\n{} CV Evaluator v{} | as of {} | {} similarity, {} skills\n",
            self.colorize("ℹ", Color::Blue),
            report.metadata.evaluator_version,
            report.metadata.reference_date,
            report.metadata.similarity,
            report.metadata.taxonomy_size
        ));

        Ok(output)
    }

    fn format_ranking(&self, ranking: &[RankedCandidate]) -> Result<String> {
        let mut output = self.format_header("Candidate Ranking", 1);
        if let Some(title) = ranking.first().and_then(|c| c.report.job_title.as_deref()) {
            output.push_str(&format!("Job: {}\n\n", title));
        }
        output.push_str(&format!(
            "{:>4}  {:<8}  {:>8}  {:>11}  {:>6}  {}\n",
            "Rank", "CV", "Overall", "Fulfillment", "Years", "Critical gaps"
        ));
        for candidate in ranking {
            let critical = candidate.report.gaps.iter().filter(|g| g.severity == Severity::Critical).count();
            output.push_str(&format!(
                "{:>4}  {:<8}  {:>8.2}  {:>11.2}  {:>6.1}  {}\n",
                candidate.rank,
                format!("#{}", candidate.submission_index + 1),
                candidate.overall,
                candidate.fulfillment,
                candidate.total_years,
                if critical > 0 { self.colorize(&critical.to_string(), Color::Red) } else { "0".to_string() }
            ));
        }
        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn to_json<T: serde::Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &EvaluationReport) -> Result<String> {
        self.to_json(report)
    }

    fn format_ranking(&self, ranking: &[RankedCandidate]) -> Result<String> {
        self.to_json(ranking)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl HtmlFormatter {
    pub fn new(include_styles: bool) -> Self {
        Self { include_styles }
    }

    fn create_template_data(&self, report: &EvaluationReport) -> HtmlTemplate {
        let percentage = report.percentage();
        let label = score_label(percentage);

        let categories = report
            .breakdown
            .categories
            .iter()
            .map(|c| HtmlCategory {
                name: c.category.to_string(),
                score: format!("{:.2}", c.score),
                max: format!("{:.0}", c.max),
                percent: (c.ratio() * 100.0).round().clamp(0.0, 100.0) as u8,
            })
            .collect();

        HtmlTemplate {
            include_styles: self.include_styles,
            title: report_title(report),
            mode: report.mode.to_string(),
            confidence: report.confidence.to_string(),
            overall: format!("{:.2}", report.breakdown.overall),
            max_overall: format!("{:.0}", report.breakdown.max_overall),
            band_class: format!("band-{}", label.to_lowercase()),
            score_label: label.to_string(),
            summary: report.summary.clone().unwrap_or_default(),
            has_summary: report.summary.is_some(),
            categories,
            requirements_html: Self::requirements_html(report),
            has_requirements: !report.requirement_outcomes.is_empty(),
            gaps_html: Self::gaps_html(report),
            profile_html: Self::profile_html(report),
            has_profile: !report.profile.skills.is_empty() || !report.profile.experience.is_empty(),
            version: report.metadata.evaluator_version.clone(),
            reference_date: report.metadata.reference_date.to_string(),
            similarity: report.metadata.similarity.clone(),
            taxonomy_size: report.metadata.taxonomy_size,
        }
    }

    fn requirements_html(report: &EvaluationReport) -> String {
        let mut html = String::from(
            "<table class=\"requirements\">\n<tr><th>Skill</th><th>Tier</th><th>Status</th><th>Found</th></tr>\n",
        );
        for outcome in &report.requirement_outcomes {
            let found = match (outcome.matched_proficiency, outcome.matched_years) {
                (Some(p), Some(y)) => format!("{}, {:.1} yrs", p, y),
                (Some(p), None) => p.to_string(),
                _ => "-".to_string(),
            };
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td class=\"{}\">{}</td><td>{}</td></tr>\n",
                escape_html(&outcome.requirement.name),
                outcome.requirement.tier,
                status_class(outcome.status),
                outcome.status,
                escape_html(&found)
            ));
        }
        html.push_str("</table>\n");

        if !report.constraint_checks.is_empty() {
            html.push_str("<ul class=\"checks\">\n");
            for check in &report.constraint_checks {
                html.push_str(&format!(
                    "<li>{} {}: required {}, found {}</li>\n",
                    if check.met { "✓" } else { "✗" },
                    check.kind,
                    escape_html(&check.required),
                    escape_html(&check.actual)
                ));
            }
            html.push_str("</ul>\n");
        }
        html
    }

    fn gaps_html(report: &EvaluationReport) -> String {
        if report.gaps.is_empty() {
            return "<p>No significant gaps found.</p>".to_string();
        }
        let items: String = report
            .gaps
            .iter()
            .map(|gap| {
                let tier = gap.tier.map(|t| format!(" <span class=\"tier\">{}</span>", t)).unwrap_or_default();
                format!(
                    "<li class=\"gap {}\"><span class=\"severity\">{}</span><strong>{}</strong>{}<p>{}</p></li>\n",
                    gap_class(gap.severity),
                    gap.severity,
                    escape_html(&gap.subject),
                    tier,
                    escape_html(&gap.remediation)
                )
            })
            .collect();
        format!("<ol class=\"gaps\">\n{}</ol>\n", items)
    }

    fn profile_html(report: &EvaluationReport) -> String {
        let profile = &report.profile;
        let mut html = format!(
            "<p><strong>Experience:</strong> {:.1} years | <strong>Highest degree:</strong> {}</p>\n",
            profile.total_years, profile.highest_degree
        );
        if !profile.skills.is_empty() {
            let skills: Vec<String> = profile
                .skills
                .iter()
                .map(|s| format!("<li>{} ({})</li>", escape_html(&s.name), s.proficiency))
                .collect();
            html.push_str(&format!("<ul>\n{}\n</ul>\n", skills.join("\n")));
        }
        if !profile.experience.is_empty() {
            let roles: Vec<String> = profile
                .experience
                .iter()
                .map(|e| format!("<li>{} ({})</li>", escape_html(&e.title), format_period(e.period.as_ref())))
                .collect();
            html.push_str(&format!("<ul>\n{}\n</ul>\n", roles.join("\n")));
        }
        html
    }
}

impl OutputFormatter for HtmlFormatter {
    fn format_report(&self, report: &EvaluationReport) -> Result<String> {
        let template_data = self.create_template_data(report);
        template_data
            .render()
            .map_err(|e| CvEvaluatorError::OutputFormatting(e.to_string()))
    }

    fn format_ranking(&self, ranking: &[RankedCandidate]) -> Result<String> {
        let rows: String = ranking
            .iter()
            .map(|c| {
                format!(
                    "<tr><td>{}</td><td>#{}</td><td>{:.2}</td><td>{:.2}</td><td>{:.1}</td></tr>\n",
                    c.rank,
                    c.submission_index + 1,
                    c.overall,
                    c.fulfillment,
                    c.total_years
                )
            })
            .collect();
        Ok(format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"UTF-8\"><title>Candidate Ranking</title></head>\n<body>\n<h1>Candidate Ranking</h1>\n<table>\n<tr><th>Rank</th><th>CV</th><th>Overall</th><th>Fulfillment</th><th>Years</th></tr>\n{}</table>\n</body>\n</html>\n",
            rows
        ))
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Html
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn markdown_severity(severity: Severity) -> &'static str {
        match severity {
            Severity::Critical => "🔴 Critical",
            Severity::Moderate => "🟠 Moderate",
            Severity::Minor => "🟡 Minor",
        }
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &EvaluationReport) -> Result<String> {
        let mut output = format!("# {}\n\n", report_title(report));

        if self.include_metadata {
            output.push_str(&format!(
                "**Mode:** {} | **Reference date:** {} | **Extraction confidence:** {}\n\n",
                report.mode, report.metadata.reference_date, report.confidence
            ));
        }

        output.push_str("## Score Breakdown\n\n");
        output.push_str(&format!(
            "**Overall:** {:.2} / {:.0} ({})\n\n",
            report.breakdown.overall,
            report.breakdown.max_overall,
            score_label(report.percentage())
        ));
        output.push_str("| Category | Score | Max |\n");
        output.push_str("|----------|-------|-----|\n");
        for category in &report.breakdown.categories {
            output.push_str(&format!("| {} | {:.2} | {:.0} |\n", category.category, category.score, category.max));
        }
        output.push('\n');

        if let Some(summary) = &report.summary {
            output.push_str(&format!("> {}\n\n", summary));
        }

        if !report.requirement_outcomes.is_empty() {
            output.push_str("## Requirements\n\n");
            output.push_str("| Skill | Tier | Status | Years found |\n");
            output.push_str("|-------|------|--------|-------------|\n");
            for outcome in &report.requirement_outcomes {
                output.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    outcome.requirement.name,
                    outcome.requirement.tier,
                    outcome.status,
                    format_years(outcome.matched_years)
                ));
            }
            output.push('\n');
            for check in &report.constraint_checks {
                output.push_str(&format!(
                    "- {} **{}:** required {}, found {}\n",
                    if check.met { "✅" } else { "❌" },
                    check.kind,
                    check.required,
                    check.actual
                ));
            }
            if !report.constraint_checks.is_empty() {
                output.push('\n');
            }
        }

        output.push_str("## Recommendations\n\n");
        if report.gaps.is_empty() {
            output.push_str("No significant gaps found.\n\n");
        }
        for (i, gap) in report.gaps.iter().enumerate() {
            output.push_str(&format!(
                "{}. **{}** ({})\n   {}\n",
                i + 1,
                gap.subject,
                Self::markdown_severity(gap.severity),
                gap.remediation
            ));
        }
        if !report.gaps.is_empty() {
            output.push('\n');
        }

        if !report.suggested_skills.is_empty() {
            let names: Vec<&str> = report.suggested_skills.iter().map(|s| s.name.as_str()).collect();
            output.push_str(&format!("**In-demand skills to consider:** {}\n\n", names.join(", ")));
        }

        output.push_str("## Candidate Profile\n\n");
        output.push_str(&format!(
            "- **Experience:** {:.1} years\n- **Highest degree:** {}\n",
            report.profile.total_years, report.profile.highest_degree
        ));
        if !report.profile.skills.is_empty() {
            let skills: Vec<String> = report
                .profile
                .skills
                .iter()
                .map(|s| format!("`{}` ({})", s.name, s.proficiency))
                .collect();
            output.push_str(&format!("- **Skills:** {}\n", skills.join(", ")));
        }
        for entry in &report.profile.experience {
            output.push_str(&format!("- {} ({})\n", entry.title, format_period(entry.period.as_ref())));
        }
        if !report.warnings.is_empty() {
            output.push_str(&format!("\n_{} extraction warning(s)._\n", report.warnings.len()));
        }

        if self.include_metadata {
            output.push_str("\n---\n\n");
            output.push_str(&format!(
                "*Generated by CV Evaluator v{} using {} similarity over {} skills*\n",
                report.metadata.evaluator_version, report.metadata.similarity, report.metadata.taxonomy_size
            ));
        }

        Ok(output)
    }

    fn format_ranking(&self, ranking: &[RankedCandidate]) -> Result<String> {
        let mut output = String::from("# Candidate Ranking\n\n");
        output.push_str("| Rank | CV | Overall | Fulfillment | Years |\n");
        output.push_str("|------|----|---------|-------------|-------|\n");
        for c in ranking {
            output.push_str(&format!(
                "| {} | #{} | {:.2} | {:.2} | {:.1} |\n",
                c.rank,
                c.submission_index + 1,
                c.overall,
                c.fulfillment,
                c.total_years
            ));
        }
        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(true, false),
            json_formatter: JsonFormatter::new(true),
            markdown_formatter: MarkdownFormatter::new(true),
            html_formatter: HtmlFormatter::new(true),
        }
    }

    pub fn with_options(
        use_colors: bool,
        detailed: bool,
        pretty_json: bool,
        include_metadata: bool,
        include_html_styles: bool,
    ) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(pretty_json),
            markdown_formatter: MarkdownFormatter::new(include_metadata),
            html_formatter: HtmlFormatter::new(include_html_styles),
        }
    }

    fn formatter(&self, format: &OutputFormat) -> &dyn OutputFormatter {
        match format {
            OutputFormat::Console => &self.console_formatter,
            OutputFormat::Json => &self.json_formatter,
            OutputFormat::Markdown => &self.markdown_formatter,
            OutputFormat::Html => &self.html_formatter,
        }
    }

    pub fn generate_report(&self, report: &EvaluationReport, format: &OutputFormat) -> Result<String> {
        self.formatter(format).format_report(report)
    }

    pub fn generate_ranking(&self, ranking: &[RankedCandidate], format: &OutputFormat) -> Result<String> {
        self.formatter(format).format_ranking(ranking)
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// Utility functions for saving reports
pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, content)?;
    Ok(())
}

pub fn suggest_filename(format: &OutputFormat, cv_name: &str) -> String {
    let base_name = Path::new(cv_name).file_stem().unwrap_or_default().to_string_lossy();

    match format {
        OutputFormat::Console => format!("{}_evaluation.txt", base_name),
        OutputFormat::Json => format!("{}_evaluation.json", base_name),
        OutputFormat::Markdown => format!("{}_evaluation.md", base_name),
        OutputFormat::Html => format!("{}_evaluation.html", base_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::cv::month_index;
    use crate::model::{RequirementTier, SkillRequirement};
    use crate::recommendations::{GapItem, GapKind};
    use crate::scoring::{CategoryScore, RequirementOutcome, ScoreCategory};
    use crate::taxonomy::SkillId;

    fn sample_report() -> EvaluationReport {
        let mut report = EvaluationReport::placeholder();
        report.job_title = Some("Data <Analyst>".to_string());
        report.breakdown.categories = vec![
            CategoryScore { category: ScoreCategory::Fulfillment, score: 62.5, max: 100.0 },
            CategoryScore { category: ScoreCategory::GapPenalty, score: 0.0, max: 100.0 },
        ];
        report.breakdown.overall = 62.5;
        report.requirement_outcomes = vec![RequirementOutcome {
            requirement: SkillRequirement::new(SkillId::new("aws"), "AWS", RequirementTier::MustHave, 1.0),
            status: RequirementStatus::Unmet,
            matched_proficiency: None,
            matched_years: None,
            credit: 0.0,
        }];
        report.gaps = vec![GapItem {
            kind: GapKind::MissingSkill,
            subject: "AWS".to_string(),
            severity: Severity::Critical,
            tier: Some(RequirementTier::MustHave),
            remediation: "Add AWS & cloud work".to_string(),
            declared_index: 0,
        }];
        report
    }

    #[test]
    fn test_console_output_without_colors() {
        let output = ConsoleFormatter::new(false, true).format_report(&sample_report()).unwrap();
        assert!(output.contains("CV Evaluation: Data <Analyst>"));
        assert!(output.contains("Overall: 62.50 / 100 [MODERATE]"));
        assert!(output.contains("[!] AWS"));
        assert!(output.contains("✗ AWS (must-have)"));
        assert!(output.contains("Candidate Profile"));
    }

    #[test]
    fn test_json_round_trips_report() {
        let json = JsonFormatter::new(false).format_report(&sample_report()).unwrap();
        let parsed: EvaluationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.breakdown, sample_report().breakdown);
        assert_eq!(parsed.gaps, sample_report().gaps);
    }

    #[test]
    fn test_markdown_tables() {
        let output = MarkdownFormatter::new(true).format_report(&sample_report()).unwrap();
        assert!(output.starts_with("# CV Evaluation: Data <Analyst>"));
        assert!(output.contains("| Requirement fulfillment | 62.50 | 100 |"));
        assert!(output.contains("| AWS | must-have | missing | - |"));
        assert!(output.contains("1. **AWS** (🔴 Critical)"));
    }

    #[test]
    fn test_html_escapes_user_text() {
        let output = HtmlFormatter::new(false).format_report(&sample_report()).unwrap();
        assert!(output.contains("Data &lt;Analyst&gt;") || output.contains("Data &#60;Analyst&#62;"));
        assert!(!output.contains("Data <Analyst>"));
        assert!(output.contains("Add AWS &amp; cloud work"));
        assert!(!output.contains("<style>"));
    }

    #[test]
    fn test_html_marks_gaps_and_statuses() {
        let output = HtmlFormatter::new(true).format_report(&sample_report()).unwrap();
        assert!(output.contains(".gap-critical {"));
        assert!(output.contains("<li class=\"gap gap-critical\"><span class=\"severity\">Critical</span><strong>AWS</strong>"));
        assert!(output.contains("<td class=\"status-missing\">missing</td>"));
        assert!(output.contains("class=\"band band-"));
        assert!(output.contains("style=\"width: 63%\""));
        assert!(!output.contains("score-badge"));
    }

    #[test]
    fn test_ranking_formats() {
        let mut first = crate::scoring::RankedCandidate::new(1, sample_report());
        first.rank = 1;
        let ranking = vec![first];
        let console = ConsoleFormatter::new(false, false).format_ranking(&ranking).unwrap();
        assert!(console.contains("#2"));
        assert!(console.contains("62.50"));
        let markdown = MarkdownFormatter::new(false).format_ranking(&ranking).unwrap();
        assert!(markdown.contains("| 1 | #2 | 62.50 | 62.50 | 0.0 |"));
    }

    #[test]
    fn test_period_display_is_inclusive() {
        let closed = Period::new(month_index(2019, 3), PeriodEnd::Closed(month_index(2021, 7))).unwrap();
        assert_eq!(format_period(Some(&closed)), "Mar 2019 - Jun 2021");
        let open = Period::new(month_index(2022, 1), PeriodEnd::Open).unwrap();
        assert_eq!(format_period(Some(&open)), "Jan 2022 - Present");
        assert_eq!(format_period(None), "undated");
    }

    #[test]
    fn test_suggest_filename() {
        assert_eq!(suggest_filename(&OutputFormat::Json, "cvs/jane_doe.pdf"), "jane_doe_evaluation.json");
        assert_eq!(suggest_filename(&OutputFormat::Html, "cv.txt"), "cv_evaluation.html");
    }
}
