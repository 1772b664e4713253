//! cv-evaluator: deterministic CV evaluation and job matching

use clap::Parser;
use colored::Colorize;
use cv_evaluator::cli::{self, Cli, Commands, ConfigAction, ReportArgs, TaxonomyAction};
use cv_evaluator::config::{Config, OutputFormat};
use cv_evaluator::input::InputManager;
use cv_evaluator::llm::{NarrativeInput, PromptTemplates};
use cv_evaluator::output::{save_report_to_file, EvaluationReport, ReportGenerator};
use cv_evaluator::taxonomy::SkillCategory;
use cv_evaluator::{CvEvaluator, CvEvaluatorError, Result};
use log::{error, info};
use std::path::Path;
use std::process;

const CV_EXTENSIONS: &[&str] = &["pdf", "txt", "md", "markdown"];

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config).await {
        error!("Command failed: {}", e);
        process::exit(if e.is_user_actionable() { 2 } else { 1 });
    }
}

async fn run_command(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Evaluate { cv, report, prompt } => {
            check_cv_path(&cv)?;
            let evaluator = build_evaluator(&config, &report)?;

            let mut input_manager = InputManager::from_config(&config.input);
            let cv_text = input_manager.extract_text(&cv).await?;
            info!("Evaluating {} ({} characters)", cv.display(), cv_text.chars().count());

            let result = evaluator.evaluate_general(&cv_text)?;
            emit_report(&config, &report, &result, &cv)?;
            if prompt {
                print_prompt(&result, &cv_text);
            }
        }

        Commands::Match { cv, job, report, prompt } => {
            check_cv_path(&cv)?;
            let evaluator = build_evaluator(&config, &report)?;

            let mut input_manager = InputManager::from_config(&config.input);
            let cv_text = input_manager.extract_text(&cv).await?;
            let job_input = input_manager.load_job(&job).await?;
            info!("Matching {} against {}", cv.display(), job.display());

            let result = evaluator.evaluate_job_match(&cv_text, &job_input)?;
            emit_report(&config, &report, &result, &cv)?;
            if prompt {
                print_prompt(&result, &cv_text);
            }
        }

        Commands::Rank { job, cvs, report } => {
            for cv in &cvs {
                check_cv_path(cv)?;
            }
            let evaluator = build_evaluator(&config, &report)?;

            let mut input_manager = InputManager::from_config(&config.input);
            let job_input = input_manager.load_job(&job).await?;
            let mut texts = Vec::with_capacity(cvs.len());
            for cv in &cvs {
                texts.push(input_manager.extract_text(cv).await?);
            }

            let ranking = evaluator.rank_candidates(&texts, &job_input)?;
            let format = output_format(&config, &report)?;
            let generator = report_generator(&config, &report, &format);
            let mut content = generator.generate_ranking(&ranking, &format)?;
            if format == OutputFormat::Console {
                for candidate in &ranking {
                    if let Some(path) = cvs.get(candidate.submission_index) {
                        content.push_str(&format!("  #{} = {}\n", candidate.submission_index + 1, path.display()));
                    }
                }
            }
            deliver(&content, report.save.as_deref())?;
        }

        Commands::Taxonomy { action } => {
            let evaluator = CvEvaluator::from_config(&config)?;
            let taxonomy = evaluator.taxonomy();
            match action {
                TaxonomyAction::List { category } => {
                    let filter = match category.as_deref() {
                        Some(name) => Some(SkillCategory::parse(name).ok_or_else(|| {
                            CvEvaluatorError::Configuration(format!("Unknown skill category: {}", name))
                        })?),
                        None => None,
                    };

                    let mut entries: Vec<_> = taxonomy
                        .entries()
                        .iter()
                        .filter(|e| filter.map_or(true, |c| e.category == c))
                        .collect();
                    entries.sort_by(|a, b| a.category.to_string().cmp(&b.category.to_string()).then(a.id.cmp(&b.id)));

                    let mut current = None;
                    for entry in &entries {
                        if current != Some(entry.category) {
                            println!("\n{}", entry.category.to_string().bold());
                            current = Some(entry.category);
                        }
                        if entry.synonyms.is_empty() {
                            println!("  {}", entry.name);
                        } else {
                            println!("  {} {}", entry.name, format!("({})", entry.synonyms.join(", ")).dimmed());
                        }
                    }
                    println!("\n{} skills ({} similarity)", entries.len(), taxonomy.similarity_name());
                }

                TaxonomyAction::Lookup { term } => match taxonomy.normalize(&term) {
                    Some(found) => {
                        println!(
                            "{} -> {} [{}] ({:?} match, confidence {:.2})",
                            term,
                            found.entry.name.green().bold(),
                            found.entry.category,
                            found.kind,
                            found.confidence
                        );
                    }
                    None => println!("{} -> {}", term, "not in taxonomy".yellow()),
                },
            }
        }

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                println!("⚙️  Current Configuration ({})\n", Config::config_path().display());
                let content = toml::to_string_pretty(&config)
                    .map_err(|e| CvEvaluatorError::Configuration(format!("Failed to serialize config: {}", e)))?;
                println!("{}", content);
            }

            Some(ConfigAction::Reset) => {
                println!("🔄 Resetting configuration to defaults...");
                Config::default().save()?;
                println!("✅ Configuration reset successfully!");
            }

            Some(ConfigAction::Path) => {
                println!("{}", Config::config_path().display());
            }
        },
    }

    Ok(())
}

fn check_cv_path(path: &Path) -> Result<()> {
    cli::validate_file_extension(path, CV_EXTENSIONS)
        .map_err(|e| CvEvaluatorError::UnsupportedFormat(format!("CV file {}: {}", path.display(), e)))
}

fn build_evaluator(config: &Config, report: &ReportArgs) -> Result<CvEvaluator> {
    let evaluator = CvEvaluator::from_config(config)?;
    Ok(match report.as_of {
        Some(date) => evaluator.with_reference_date(date),
        None => evaluator,
    })
}

fn output_format(config: &Config, report: &ReportArgs) -> Result<OutputFormat> {
    match &report.output {
        Some(name) => cli::parse_output_format(name).map_err(CvEvaluatorError::Configuration),
        None => Ok(config.output.format),
    }
}

fn report_generator(config: &Config, report: &ReportArgs, format: &OutputFormat) -> ReportGenerator {
    // Saved console output should not carry escape codes
    let use_colors = config.output.color_output && report.save.is_none() && *format == OutputFormat::Console;
    ReportGenerator::with_options(use_colors, report.detailed || config.output.detailed, true, true, true)
}

fn emit_report(config: &Config, report: &ReportArgs, result: &EvaluationReport, cv: &Path) -> Result<()> {
    let format = output_format(config, report)?;
    let generator = report_generator(config, report, &format);
    let content = generator.generate_report(result, &format)?;
    if report.save.is_none() && format != OutputFormat::Console {
        info!(
            "Tip: save this report with --save {}",
            cv_evaluator::output::suggest_filename(&format, &cv.to_string_lossy())
        );
    }
    deliver(&content, report.save.as_deref())
}

fn deliver(content: &str, save: Option<&Path>) -> Result<()> {
    match save {
        Some(path) => {
            save_report_to_file(content, path)?;
            println!("✅ Report saved to {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn print_prompt(report: &EvaluationReport, cv_text: &str) {
    let prompt = PromptTemplates::default().render_evaluation_prompt(&NarrativeInput::from_report(report), cv_text);
    println!("\n{}\n{}", "LLM prompt".bold(), prompt);
}
