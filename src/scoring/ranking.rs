//! Deterministic ordering of several candidates against one job

use super::ScoreCategory;
use crate::output::report::EvaluationReport;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCandidate {
    /// 1-based position after sorting
    pub rank: usize,
    /// Position of the CV in the submitted list
    pub submission_index: usize,
    pub overall: f32,
    pub fulfillment: f32,
    pub total_years: f32,
    pub report: EvaluationReport,
}

impl RankedCandidate {
    pub fn new(submission_index: usize, report: EvaluationReport) -> Self {
        Self {
            rank: 0,
            submission_index,
            overall: report.breakdown.overall,
            fulfillment: report.breakdown.score_of(ScoreCategory::Fulfillment),
            total_years: report.profile.total_years,
            report,
        }
    }
}

/// Overall score, then fulfillment, then total experience (all
/// descending), then submission order.
fn compare(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    b.overall
        .total_cmp(&a.overall)
        .then_with(|| b.fulfillment.total_cmp(&a.fulfillment))
        .then_with(|| b.total_years.total_cmp(&a.total_years))
        .then_with(|| a.submission_index.cmp(&b.submission_index))
}

pub fn rank(mut candidates: Vec<RankedCandidate>) -> Vec<RankedCandidate> {
    candidates.sort_by(compare);
    for (position, candidate) in candidates.iter_mut().enumerate() {
        candidate.rank = position + 1;
    }
    candidates
}
