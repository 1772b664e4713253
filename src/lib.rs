//! CV evaluator library

pub mod cli;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod input;
pub mod llm;
pub mod model;
pub mod output;
pub mod processing;
pub mod recommendations;
pub mod scoring;
pub mod taxonomy;

pub use config::Config;
pub use error::{CvEvaluatorError, Result};
pub use evaluator::CvEvaluator;
