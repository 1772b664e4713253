//! CLI interface for the CV evaluator

use crate::config::OutputFormat;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cv-evaluator")]
#[command(about = "Deterministic CV evaluation and job matching")]
#[command(long_about = "Score a CV on its own merits or against a job description, with a per-category breakdown and prioritized recommendations")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Flags shared by every command that prints a report.
#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Output format: console, json, markdown, html
    #[arg(short, long)]
    pub output: Option<String>,

    /// Save output to file
    #[arg(short, long)]
    pub save: Option<PathBuf>,

    /// Include the extracted profile and warnings
    #[arg(short, long)]
    pub detailed: bool,

    /// Reference date for open-ended roles (YYYY-MM-DD); defaults to today
    #[arg(long, value_parser = parse_date)]
    pub as_of: Option<NaiveDate>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score a CV on its own merits
    Evaluate {
        /// Path to CV file (PDF, TXT, MD)
        #[arg(long)]
        cv: PathBuf,

        #[command(flatten)]
        report: ReportArgs,

        /// Print the prompt an external language model would receive
        #[arg(long)]
        prompt: bool,
    },

    /// Score a CV against a job description
    Match {
        /// Path to CV file (PDF, TXT, MD)
        #[arg(long)]
        cv: PathBuf,

        /// Path to job description (TXT, MD, PDF) or template (TOML, JSON)
        #[arg(short, long)]
        job: PathBuf,

        #[command(flatten)]
        report: ReportArgs,

        /// Print the prompt an external language model would receive
        #[arg(long)]
        prompt: bool,
    },

    /// Rank several CVs against one job
    Rank {
        /// Path to job description or template
        #[arg(short, long)]
        job: PathBuf,

        /// CV files, in submission order
        #[arg(long = "cv", required = true, num_args = 1..)]
        cvs: Vec<PathBuf>,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Inspect the skill taxonomy
    Taxonomy {
        #[command(subcommand)]
        action: TaxonomyAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum TaxonomyAction {
    /// List canonical skills
    List {
        /// Only skills in this category (e.g. "database", "cloud")
        #[arg(long)]
        category: Option<String>,
    },

    /// Show which canonical skill a term resolves to
    Lookup {
        /// Skill name as it might appear in a CV
        term: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file location
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        "html" => Ok(OutputFormat::Html),
        _ => Err(format!("Invalid output format: {}. Supported: console, json, markdown, html", format)),
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| format!("Expected YYYY-MM-DD: {}", e))
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_match_command() {
        let cli = Cli::try_parse_from([
            "cv-evaluator",
            "match",
            "--cv",
            "cv.pdf",
            "--job",
            "job.toml",
            "--output",
            "json",
            "--as-of",
            "2024-06-01",
        ])
        .unwrap();
        match cli.command {
            Commands::Match { cv, job, report, prompt } => {
                assert_eq!(cv, PathBuf::from("cv.pdf"));
                assert_eq!(job, PathBuf::from("job.toml"));
                assert_eq!(report.output.as_deref(), Some("json"));
                assert_eq!(report.as_of, NaiveDate::from_ymd_opt(2024, 6, 1));
                assert!(!prompt);
            }
            _ => panic!("expected match command"),
        }
    }

    #[test]
    fn test_rank_takes_several_cvs() {
        let cli = Cli::try_parse_from(["cv-evaluator", "rank", "--job", "job.txt", "--cv", "a.txt", "b.md"]).unwrap();
        match cli.command {
            Commands::Rank { cvs, .. } => assert_eq!(cvs.len(), 2),
            _ => panic!("expected rank command"),
        }
    }

    #[test]
    fn test_output_format_and_extension_checks() {
        assert_eq!(parse_output_format("MD"), Ok(OutputFormat::Markdown));
        assert!(parse_output_format("pdf").is_err());
        assert!(validate_file_extension(Path::new("cv.PDF"), &["pdf", "txt"]).is_ok());
        assert!(validate_file_extension(Path::new("cv.docx"), &["pdf", "txt"]).is_err());
        assert!(parse_date("2024-13-01").is_err());
    }
}
