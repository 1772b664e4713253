//! Behavioural guarantees checked across many inputs

use chrono::NaiveDate;
use cv_evaluator::config::{Config, GeneralScoringConfig, JobMatchConfig, SimilarityBackend};
use cv_evaluator::model::{
    CVFeatureSet, EvidenceSpan, JobInput, Proficiency, RequirementModel, RequirementTemplate, RequirementTier,
    SkillMention, SkillRequirement,
};
use cv_evaluator::processing::document::SectionKind;
use cv_evaluator::recommendations::Severity;
use cv_evaluator::scoring::{GeneralScorer, JobMatchScorer, ScoreCategory};
use cv_evaluator::taxonomy::{similarity, DemandTable, SkillCategory, SkillEntry, SkillId, SkillTaxonomy};
use cv_evaluator::{CvEvaluator, CvEvaluatorError};
use std::sync::Arc;

const CV: &str = "Jane Doe\n\
    Skills\n\
    Python (3 years), SQL, Tableau\n\
    \n\
    Experience\n\
    Data Analyst | Acme Corp | Jan 2021 - Dec 2023\n\
    - Built Tableau dashboards and automated reporting with Python and SQL\n\
    \n\
    Education\n\
    Bachelor of Science in Statistics\n\
    State University, 2020\n";

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn evaluator() -> CvEvaluator {
    CvEvaluator::from_config(&Config::default()).unwrap().with_reference_date(as_of())
}

fn taxonomy() -> Arc<SkillTaxonomy> {
    Arc::new(SkillTaxonomy::builtin(similarity::from_backend(SimilarityBackend::JaroWinkler), 0.9).unwrap())
}

fn mention(id: &str, proficiency: Proficiency) -> SkillMention {
    SkillMention {
        skill: SkillId::new(id),
        name: id.to_string(),
        category: SkillCategory::ProgrammingLanguage,
        proficiency,
        years: None,
        confidence: 1.0,
        evidence: vec![EvidenceSpan { start: 0, end: id.len(), text: id.to_string(), section: SectionKind::Skills }],
    }
}

fn features(ids: &[&str]) -> CVFeatureSet {
    let mentions = ids.iter().map(|id| mention(id, Proficiency::Professional)).collect();
    CVFeatureSet::new(mentions, Vec::new(), Vec::new(), as_of())
}

fn must_haves(ids: &[&str]) -> RequirementModel {
    let requirements = ids
        .iter()
        .map(|id| SkillRequirement::new(SkillId::new(id), *id, RequirementTier::MustHave, 1.0))
        .collect();
    RequirementModel::new(requirements).unwrap()
}

#[test]
fn test_empty_feature_set_scores_zero_everywhere() {
    let taxonomy = taxonomy();
    let demand = Arc::new(DemandTable::from_taxonomy(&taxonomy, 0.5));
    let general = GeneralScorer::new(GeneralScoringConfig::default(), taxonomy, demand);
    let result = general.score(&CVFeatureSet::empty(as_of())).unwrap();
    assert_eq!(result.breakdown.overall, 0.0);
    assert!(result.breakdown.categories.iter().all(|c| c.score == 0.0));
}

#[test]
fn test_meeting_more_must_haves_never_lowers_fulfillment() {
    let scorer = JobMatchScorer::new(JobMatchConfig::default());
    let model = must_haves(&["python", "sql", "tableau", "aws"]);

    let cases: [&[&str]; 5] = [&[], &["python"], &["python", "sql"], &["python", "sql", "tableau"], &[
        "python", "sql", "tableau", "aws",
    ]];
    let scores: Vec<f32> = cases
        .iter()
        .map(|ids| {
            scorer
                .score(&features(ids), &model)
                .unwrap()
                .breakdown
                .score_of(ScoreCategory::Fulfillment)
        })
        .collect();

    for pair in scores.windows(2) {
        assert!(pair[1] >= pair[0], "fulfillment dropped: {:?}", scores);
    }
    assert_eq!(scores[4], 100.0);
}

#[test]
fn test_scores_stay_within_bounds() {
    let evaluator = evaluator();
    let cvs = [
        CV,
        "Hello there",
        "Skills\nPython, Java, Go, Rust, SQL, Docker, Kubernetes, AWS, Azure, GCP, Excel, Tableau, Spark, Kafka",
        "Experience\nCTO | Mega Corp | 1970 - Present\nEducation\nPhD in Physics\nPhD in Chemistry\nMaster of Arts\n",
    ];
    let job = JobInput::from("Engineer\nRequirements:\n- 5+ years of Python\n- Docker\nNice to have:\n- Redis");

    for cv in cvs {
        let matched = evaluator.evaluate_job_match(cv, &job).unwrap();
        let tiers: Vec<(&str, RequirementTier)> = matched
            .requirement_outcomes
            .iter()
            .map(|o| (o.requirement.skill.as_str(), o.requirement.tier))
            .collect();
        assert!(tiers.contains(&("redis", RequirementTier::NiceToHave)), "{:?}", tiers);
        assert!(tiers.contains(&("docker", RequirementTier::MustHave)), "{:?}", tiers);

        for report in [evaluator.evaluate_general(cv).unwrap(), matched] {
            let breakdown = &report.breakdown;
            assert!(breakdown.verify().is_ok(), "{:?}", breakdown);
            assert!((0.0..=breakdown.max_overall).contains(&breakdown.overall));
            for category in &breakdown.categories {
                assert!(category.score >= 0.0 && category.score <= category.max, "{:?}", category);
            }
        }
    }
}

#[test]
fn test_overlapping_roles_count_once() {
    let cv = "Experience\nAnalyst, Acme, 2019 - 2021\nEngineer, Beta, 2020 - 2022\n";
    let features = evaluator().extract(cv).unwrap();
    assert_eq!(features.total_years(), 3.0);
}

#[test]
fn test_gap_list_is_bounded_and_ordered() {
    let job = JobInput::from(
        "Senior Platform Engineer\nRequirements:\n- Kubernetes\n- AWS\n- Terraform\n- Go\n- Rust\n- Kafka\n\
         Nice to have:\n- Docker\n- Redis\nMaster's degree required. 10+ years of experience.",
    );
    let report = evaluator().evaluate_job_match(CV, &job).unwrap();
    let max_items = Config::default().recommendations.max_items;

    assert!(!report.gaps.is_empty());
    assert!(report.gaps.len() <= max_items);
    for pair in report.gaps.windows(2) {
        assert!(pair[0].severity >= pair[1].severity, "{:?}", report.gaps);
    }
}

#[test]
fn test_typical_match_lands_strictly_inside_the_scale() {
    let job = JobInput::from(
        "Data Analyst\nRequirements:\n- Python\n- SQL\n- Tableau\n- AWS\nNice to have:\n- Docker",
    );
    let report = evaluator().evaluate_job_match(CV, &job).unwrap();
    assert!(report.breakdown.overall > 0.0);
    assert!(report.breakdown.overall < 100.0);
}

#[test]
fn test_single_unmet_must_have_hits_floor_with_one_critical_gap() {
    let job = JobInput::from("Platform Engineer\nRequirements:\n- Must have Kubernetes");
    let report = evaluator().evaluate_job_match(CV, &job).unwrap();

    assert_eq!(report.breakdown.score_of(ScoreCategory::Fulfillment), JobMatchConfig::default().floor);
    let critical: Vec<_> = report.gaps.iter().filter(|g| g.severity == Severity::Critical).collect();
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].subject, "Kubernetes");
}

#[test]
fn test_same_input_gives_same_report() {
    let job = JobInput::from("Data Analyst\nPython and SQL required. Tableau is a plus.");
    let first = evaluator().evaluate_job_match(CV, &job).unwrap();
    let second = evaluator().evaluate_job_match(CV, &job).unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_similarity_backends_are_symmetric_and_reflexive() {
    let pairs = [
        ("python", "pyhton"),
        ("postgres", "postgresql"),
        ("machine learning", "deep learning"),
        ("", "sql"),
        ("c++", "c#"),
    ];
    for backend in [
        SimilarityBackend::JaroWinkler,
        SimilarityBackend::Levenshtein,
        SimilarityBackend::TokenJaccard,
        SimilarityBackend::CharNgram,
    ] {
        let sim = similarity::from_backend(backend);
        for (a, b) in pairs {
            let forward = sim.similarity(a, b);
            let backward = sim.similarity(b, a);
            assert!((forward - backward).abs() < 1e-6, "{} not symmetric on {:?}", sim.name(), (a, b));
            assert!((0.0..=1.0).contains(&forward));
            assert!((sim.similarity(a, a) - 1.0).abs() < 1e-6, "{} not reflexive on {:?}", sim.name(), a);
        }
    }
}

#[test]
fn test_skill_in_both_tiers_is_rejected() {
    let template = RequirementTemplate {
        title: Some("Analyst".to_string()),
        must_have: vec!["Python".to_string()],
        nice_to_have: vec!["python3".to_string()],
        ..Default::default()
    };
    let result = evaluator().evaluate_job_match(CV, &JobInput::from(template));
    assert!(matches!(result, Err(CvEvaluatorError::Configuration(_))));
}

#[test]
fn test_surface_form_shared_by_two_skills_is_rejected() {
    let entries = vec![
        SkillEntry::new("golang", "Go", SkillCategory::ProgrammingLanguage, &["golang"]),
        SkillEntry::new("go-board", "Go (board game)", SkillCategory::Tool, &["go"]),
    ];
    let result = SkillTaxonomy::new(entries, similarity::from_backend(SimilarityBackend::JaroWinkler), 0.9);
    assert!(matches!(result, Err(CvEvaluatorError::Configuration(_))));
}

#[test]
fn test_empty_or_binary_cv_is_malformed() {
    let evaluator = evaluator();
    for cv in ["", "   \n\t", "PK\u{3}\u{4}\0\0binary"] {
        assert!(
            matches!(evaluator.evaluate_general(cv), Err(CvEvaluatorError::InputMalformed(_))),
            "{:?} should be rejected",
            cv
        );
    }
}

#[test]
fn test_undated_experience_lowers_confidence() {
    let dated = evaluator().extract(CV).unwrap();
    assert!(dated.warnings().is_empty());

    let undated = evaluator()
        .extract("Experience\nSenior Analyst\n- Analysed churn with SQL\nConsultant, Gamma, sometime in 2020\n")
        .unwrap();
    assert!(!undated.warnings().is_empty());
    assert!(undated.experience().iter().all(|e| e.period.is_none()));
}

#[test]
fn test_identical_candidates_keep_submission_order() {
    let job = JobInput::from("Data Analyst\nRequirements:\n- Python\n- SQL");
    let cvs = vec![CV.to_string(), "Skills\nExcel".to_string(), CV.to_string()];
    let ranked = evaluator().rank_candidates(&cvs, &job).unwrap();

    let order: Vec<usize> = ranked.iter().map(|c| c.submission_index).collect();
    assert_eq!(order, vec![0, 2, 1]);
    assert_eq!(ranked[0].overall, ranked[1].overall);
}

#[test]
fn test_unmet_python_against_skill_free_cv() {
    let job = JobInput::from("Developer\nRequirements:\n- Must have Python");
    let report = evaluator().evaluate_job_match("Jane Doe\nI enjoy long walks and good books.", &job).unwrap();

    assert_eq!(report.breakdown.score_of(ScoreCategory::Fulfillment), JobMatchConfig::default().floor);
    assert_eq!(report.gaps.len(), 1);
    assert_eq!(report.gaps[0].severity, Severity::Critical);
    assert_eq!(report.gaps[0].subject, "Python");
}

#[test]
fn test_data_analyst_example_scores_in_every_category() {
    let report = evaluator().evaluate_general(CV).unwrap();
    let breakdown = &report.breakdown;
    assert!(breakdown.overall > 0.0 && breakdown.overall < 100.0);
    for category in [ScoreCategory::Skills, ScoreCategory::Experience, ScoreCategory::Education] {
        assert!(breakdown.score_of(category) > 0.0, "{} should be positive", category);
    }
}
