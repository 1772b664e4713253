//! Text processing: segmentation, lexical helpers, feature extraction and
//! requirement model construction

pub mod credentials;
pub mod dates;
pub mod document;
pub mod extractor;
pub mod requirements;
pub mod skill_matcher;
pub mod text_processor;

pub use extractor::FeatureExtractor;
pub use requirements::RequirementModelBuilder;
pub use skill_matcher::SkillMatcher;
pub use text_processor::TextProcessor;
