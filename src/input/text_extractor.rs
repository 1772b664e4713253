//! Text extraction from various file formats

use crate::error::{CvEvaluatorError, Result};
use pulldown_cmark::{Event, Parser, Tag};
use std::path::Path;
use tokio::fs;

pub trait TextExtractor {
    fn extract(&self, path: &Path) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// Read a file that must be UTF-8 text.
async fn read_utf8(path: &Path) -> Result<String> {
    let bytes = fs::read(path).await?;
    String::from_utf8(bytes).map_err(|e| {
        CvEvaluatorError::InputMalformed(format!(
            "'{}' is not valid UTF-8 text (invalid byte at offset {})",
            path.display(),
            e.utf8_error().valid_up_to()
        ))
    })
}

pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).await?;

        let text = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
            CvEvaluatorError::PdfExtraction(format!("Failed to extract text from PDF '{}': {}", path.display(), e))
        })?;
        Ok(text)
    }
}

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        read_utf8(path).await
    }
}

pub struct MarkdownExtractor;

impl TextExtractor for MarkdownExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let markdown_content = read_utf8(path).await?;
        Ok(markdown_to_text(&markdown_content))
    }
}

/// Strip markup but keep one block per line, so headings stay recognizable
/// as section headers and list items stay separate.
pub fn markdown_to_text(markdown: &str) -> String {
    let mut text = String::new();
    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak | Event::Rule => text.push('\n'),
            Event::End(Tag::Paragraph | Tag::Heading(..) | Tag::Item | Tag::CodeBlock(_)) => text.push('\n'),
            Event::Start(Tag::Item) => text.push_str("- "),
            _ => {}
        }
    }

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_keeps_blocks_on_lines() {
        let text = markdown_to_text("# Jane Doe\n\n## Skills\n\n- **Python** (5 years)\n- `SQL`\n\nSome *text* here.");
        assert_eq!(text, "Jane Doe\nSkills\n- Python (5 years)\n- SQL\nSome text here.");
    }
}
