//! Narrative summaries and the prompt for an external language model

pub mod narrative;
pub mod prompts;

pub use narrative::{NarrativeGenerator, NarrativeInput, TemplateNarrator};
pub use prompts::PromptTemplates;
