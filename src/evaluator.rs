//! Evaluation engine coordinating extraction, scoring, recommendations and
//! narration

use crate::config::Config;
use crate::error::Result;
use crate::llm::{NarrativeGenerator, NarrativeInput, TemplateNarrator};
use crate::model::{CVFeatureSet, JobInput, RequirementModel};
use crate::output::report::{EvaluationReport, ReportMetadata};
use crate::processing::{FeatureExtractor, RequirementModelBuilder, SkillMatcher, TextProcessor};
use crate::recommendations::RecommendationComposer;
use crate::scoring::{rank, GeneralScorer, JobMatchScorer, RankedCandidate, ScoreResult};
use crate::taxonomy::{similarity, DemandTable, MarketDemand, SkillTaxonomy};
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::sync::Arc;

/// Shared, read-only evaluator. Every operation takes `&self` and builds
/// only per-request state, so one instance can serve many threads.
pub struct CvEvaluator {
    taxonomy: Arc<SkillTaxonomy>,
    matcher: Arc<SkillMatcher>,
    processor: TextProcessor,
    extractor: FeatureExtractor,
    requirements: RequirementModelBuilder,
    general: GeneralScorer,
    job_match: JobMatchScorer,
    composer: RecommendationComposer,
    narrator: Option<Arc<dyn NarrativeGenerator>>,
}

impl CvEvaluator {
    /// Build from explicit collaborators. No narrator is installed.
    pub fn new(config: &Config, taxonomy: Arc<SkillTaxonomy>, demand: Arc<dyn MarketDemand>) -> Result<Self> {
        config.validate()?;
        let matcher = Arc::new(SkillMatcher::new(taxonomy.clone())?);
        let reference_date = config
            .extraction
            .reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());

        Ok(Self {
            processor: TextProcessor::new(),
            extractor: FeatureExtractor::new(matcher.clone(), reference_date),
            requirements: RequirementModelBuilder::new(
                matcher.clone(),
                demand.clone(),
                config.requirements.unmarked_must_have_limit,
            ),
            general: GeneralScorer::new(config.scoring.general.clone(), taxonomy.clone(), demand),
            job_match: JobMatchScorer::new(config.scoring.job_match.clone()),
            composer: RecommendationComposer::new(config.recommendations.clone()),
            narrator: None,
            matcher,
            taxonomy,
        })
    }

    /// Load the taxonomy and market table the config points at. The
    /// template narrator is installed when narratives are enabled.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let similarity = similarity::from_backend(config.taxonomy.similarity);
        let taxonomy = Arc::new(match &config.taxonomy.path {
            Some(path) => SkillTaxonomy::load(path, similarity, config.taxonomy.fuzzy_floor)?,
            None => SkillTaxonomy::builtin(similarity, config.taxonomy.fuzzy_floor)?,
        });
        let demand: Arc<dyn MarketDemand> = Arc::new(DemandTable::from_config(&taxonomy, &config.market)?);
        info!(
            "Loaded taxonomy with {} skills ({} similarity)",
            taxonomy.len(),
            taxonomy.similarity_name()
        );

        let evaluator = Self::new(config, taxonomy, demand)?;
        if config.output.narrative {
            Ok(evaluator.with_narrator(Arc::new(TemplateNarrator::default())))
        } else {
            Ok(evaluator)
        }
    }

    pub fn with_narrator(mut self, narrator: Arc<dyn NarrativeGenerator>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    pub fn without_narrator(mut self) -> Self {
        self.narrator = None;
        self
    }

    /// Date open-ended ranges such as "2021 - Present" are closed at.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.extractor = FeatureExtractor::new(self.matcher.clone(), date);
        self
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.extractor.reference_date()
    }

    pub fn taxonomy(&self) -> &SkillTaxonomy {
        &self.taxonomy
    }

    pub fn extract(&self, cv_text: &str) -> Result<CVFeatureSet> {
        self.processor.validate(cv_text, "CV")?;
        Ok(self.extractor.extract(cv_text))
    }

    pub fn build_requirements(&self, job: &JobInput) -> Result<RequirementModel> {
        if let JobInput::Text(text) = job {
            self.processor.validate(text, "Job")?;
        }
        self.requirements.build(job)
    }

    pub fn evaluate_general(&self, cv_text: &str) -> Result<EvaluationReport> {
        let features = self.extract(cv_text)?;
        let result = self.general.score(&features)?;
        info!("General evaluation: {:.2} / 100", result.breakdown.overall);
        Ok(self.finish(&features, result, None))
    }

    pub fn evaluate_job_match(&self, cv_text: &str, job: &JobInput) -> Result<EvaluationReport> {
        let model = self.build_requirements(job)?;
        self.evaluate_against(cv_text, &model)
    }

    /// Evaluate every CV against one job and order them. The job is parsed
    /// once; any CV that cannot be evaluated fails the whole ranking.
    pub fn rank_candidates(&self, cvs: &[String], job: &JobInput) -> Result<Vec<RankedCandidate>> {
        let model = self.build_requirements(job)?;
        let mut candidates = Vec::with_capacity(cvs.len());
        for (index, cv_text) in cvs.iter().enumerate() {
            let report = self.evaluate_against(cv_text, &model).map_err(|e| {
                warn!("CV #{} could not be evaluated: {}", index + 1, e);
                e
            })?;
            candidates.push(RankedCandidate::new(index, report));
        }
        let ranked = rank(candidates);
        info!("Ranked {} candidates", ranked.len());
        Ok(ranked)
    }

    fn evaluate_against(&self, cv_text: &str, model: &RequirementModel) -> Result<EvaluationReport> {
        let features = self.extract(cv_text)?;
        let result = self.job_match.score(&features, model)?;
        info!(
            "Job match against '{}': {:.2} / 100",
            model.title().unwrap_or("untitled job"),
            result.breakdown.overall
        );
        Ok(self.finish(&features, result, Some(model)))
    }

    fn finish(&self, features: &CVFeatureSet, result: ScoreResult, model: Option<&RequirementModel>) -> EvaluationReport {
        let gaps = self.composer.compose(&result);
        let metadata = ReportMetadata::new(
            features.reference_date(),
            self.taxonomy.similarity_name(),
            self.taxonomy.len(),
        );
        let report = EvaluationReport::from_evaluation(features, result, gaps, model, metadata);
        let summary = self.narrate(&report);
        report.with_summary(summary)
    }

    fn narrate(&self, report: &EvaluationReport) -> Option<String> {
        let narrator = self.narrator.as_ref()?;
        match narrator.narrate(&NarrativeInput::from_report(report)) {
            Ok(summary) => {
                debug!("Narrative from '{}' narrator ({} chars)", narrator.name(), summary.len());
                Some(summary)
            }
            Err(e) => {
                warn!("Narrator '{}' failed, continuing without a summary: {:#}", narrator.name(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CvEvaluatorError;
    use crate::scoring::ScoreCategory;

    const CV: &str = "Jane Doe\n\
        jane.doe@example.com\n\
        \n\
        Experience\n\
        Data Analyst, Acme Corp\n\
        Jan 2021 - Dec 2023\n\
        - Built dashboards in Tableau and automated reports with Python\n\
        \n\
        Skills\n\
        Python (3 years), SQL, Tableau\n\
        \n\
        Education\n\
        Bachelor of Science in Statistics, State University, 2020\n";

    fn evaluator() -> CvEvaluator {
        let config = Config::default();
        CvEvaluator::from_config(&config)
            .unwrap()
            .with_reference_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    struct FailingNarrator;

    impl NarrativeGenerator for FailingNarrator {
        fn narrate(&self, _input: &NarrativeInput<'_>) -> anyhow::Result<String> {
            anyhow::bail!("backend offline")
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_evaluator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CvEvaluator>();
    }

    #[test]
    fn test_general_evaluation_scores_every_category() {
        let report = evaluator().evaluate_general(CV).unwrap();
        let breakdown = &report.breakdown;
        assert!(breakdown.overall > 0.0 && breakdown.overall < 100.0);
        for category in [ScoreCategory::Skills, ScoreCategory::Experience, ScoreCategory::Education] {
            assert!(breakdown.score_of(category) > 0.0, "{} should be positive", category);
        }
        assert!(report.summary.is_some());
        assert_eq!(report.metadata.reference_date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let evaluator = evaluator();
        let first = evaluator.evaluate_general(CV).unwrap();
        let second = evaluator.evaluate_general(CV).unwrap();
        assert_eq!(first.breakdown, second.breakdown);
        assert_eq!(first.gaps, second.gaps);
        assert_eq!(first.summary, second.summary);
    }

    #[test]
    fn test_single_unmet_must_have() {
        let job = JobInput::from("Data Engineer\nRequirements:\n- Must have Kubernetes");
        let report = evaluator().evaluate_job_match(CV, &job).unwrap();
        assert_eq!(report.breakdown.score_of(ScoreCategory::Fulfillment), 5.0);
        let critical: Vec<_> = report
            .gaps
            .iter()
            .filter(|g| g.severity == crate::recommendations::Severity::Critical)
            .collect();
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].subject, "Kubernetes");
    }

    #[test]
    fn test_empty_and_binary_input_rejected() {
        let evaluator = evaluator();
        assert!(matches!(evaluator.evaluate_general("   \n"), Err(CvEvaluatorError::InputMalformed(_))));
        assert!(matches!(evaluator.evaluate_general("abc\0def"), Err(CvEvaluatorError::InputMalformed(_))));
        assert!(matches!(
            evaluator.evaluate_job_match(CV, &JobInput::from("")),
            Err(CvEvaluatorError::InputMalformed(_))
        ));
    }

    #[test]
    fn test_job_without_known_skills_is_configuration_error() {
        let job = JobInput::from("Friendly team member\nWe value kindness and punctuality.");
        assert!(matches!(
            evaluator().evaluate_job_match(CV, &job),
            Err(CvEvaluatorError::Configuration(_))
        ));
    }

    #[test]
    fn test_narrator_failure_is_not_fatal() {
        let report = evaluator()
            .with_narrator(Arc::new(FailingNarrator))
            .evaluate_general(CV)
            .unwrap();
        assert!(report.summary.is_none());
    }

    #[test]
    fn test_rank_candidates_orders_by_fit() {
        let weak = "John Smith\nSkills\nExcel\n".to_string();
        let job = JobInput::from("Data Analyst\nRequirements:\n- Python\n- SQL\n- Tableau");
        let ranked = evaluator().rank_candidates(&[weak, CV.to_string()], &job).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].submission_index, 1);
        assert_eq!(ranked[0].rank, 1);
        assert!(ranked[0].overall > ranked[1].overall);
    }

    #[test]
    fn test_shared_across_threads() {
        let evaluator = evaluator();
        let expected = evaluator.evaluate_general(CV).unwrap().breakdown;
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4).map(|_| scope.spawn(|| evaluator.evaluate_general(CV))).collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap().unwrap().breakdown, expected);
            }
        });
    }
}
