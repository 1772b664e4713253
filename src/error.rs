//! Error handling for the CV evaluator

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CvEvaluatorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Empty, binary or undecodable CV / job text. Raised before any extraction.
    #[error("Malformed input: {0}")]
    InputMalformed(String),

    /// Zero-requirement models, conflicting tiers, broken taxonomy or config values.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A score breakdown broke one of its bounds. Always a defect, never clamped.
    #[error("Scoring invariant violated: {0}")]
    ScoringInvariantViolation(String),

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Narrative generation failed: {0}")]
    Narrative(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, CvEvaluatorError>;

/// Convert anyhow errors coming out of plug-in collaborators
impl From<anyhow::Error> for CvEvaluatorError {
    fn from(err: anyhow::Error) -> Self {
        CvEvaluatorError::Narrative(err.to_string())
    }
}

impl CvEvaluatorError {
    /// True for the errors a caller can fix by changing what they send in.
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            CvEvaluatorError::InputMalformed(_)
                | CvEvaluatorError::Configuration(_)
                | CvEvaluatorError::UnsupportedFormat(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_actionable_errors() {
        assert!(CvEvaluatorError::InputMalformed("empty".into()).is_user_actionable());
        assert!(CvEvaluatorError::Configuration("zero requirements".into()).is_user_actionable());
        assert!(!CvEvaluatorError::ScoringInvariantViolation("skills > 50".into()).is_user_actionable());
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: CvEvaluatorError = anyhow::anyhow!("backend offline").into();
        assert!(matches!(err, CvEvaluatorError::Narrative(ref m) if m == "backend offline"));
    }
}
