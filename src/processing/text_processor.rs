//! Text validation, normalization and small lexical helpers

use crate::error::{CvEvaluatorError, Result};
use crate::model::{ContactInfo, TextStats};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("Invalid email regex"));

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+\d{1,3}[-. ]?)?\(?\b\d{3}\)?[-. ]?\d{3}[-. ]?\d{4}\b").expect("Invalid phone regex")
});

static SSN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("Invalid SSN regex"));

const BULLET_MARKERS: &[char] = &['-', '*', '•', '·', '▪', '◦', '‣', '●', '○', '►', '+'];

#[derive(Debug, Clone)]
pub struct TextProcessor {
    /// Share of control characters above which text is treated as binary
    max_control_ratio: f32,
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor {
    pub fn new() -> Self {
        Self { max_control_ratio: 0.05 }
    }

    /// Reject text that is empty or looks like a binary artifact.
    pub fn validate(&self, text: &str, what: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(CvEvaluatorError::InputMalformed(format!("{} text is empty", what)));
        }
        if text.contains('\0') {
            return Err(CvEvaluatorError::InputMalformed(format!(
                "{} text contains NUL bytes; expected decoded plain text",
                what
            )));
        }

        let total = text.chars().count();
        let control = text
            .chars()
            .filter(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
            .count();
        if control as f32 / total as f32 > self.max_control_ratio {
            return Err(CvEvaluatorError::InputMalformed(format!(
                "{} text is mostly control characters ({} of {})",
                what, control, total
            )));
        }
        Ok(())
    }

    /// Canonical line-preserving form: unified quotes and dashes, no stray
    /// control characters, single spaces inside lines.
    pub fn normalize(&self, text: &str) -> String {
        self.normalize_with_offsets(text).text
    }

    /// [`normalize`](Self::normalize) that remembers where every output byte
    /// came from, so offsets found in the result can be reported against `text`.
    pub fn normalize_with_offsets<'a>(&self, text: &'a str) -> NormalizedText<'a> {
        // (char, source start, source end) per line, plus the line breaks
        let mut lines: Vec<Vec<(char, usize, usize)>> = Vec::new();
        let mut line: Vec<(char, usize, usize)> = Vec::new();
        let mut breaks: Vec<(usize, usize)> = Vec::new();
        let mut in_space_run = false;
        let mut chars = text.char_indices().peekable();

        while let Some((idx, c)) = chars.next() {
            let end = idx + c.len_utf8();
            let mapped = match c {
                '\r' | '\n' => {
                    let mut end = end;
                    if c == '\r' && chars.peek().map(|&(_, next)| next) == Some('\n') {
                        chars.next();
                        end += 1;
                    }
                    breaks.push((idx, end));
                    lines.push(std::mem::take(&mut line));
                    in_space_run = false;
                    continue;
                }
                '\u{2018}' | '\u{2019}' => '\'',
                '\u{201C}' | '\u{201D}' => '"',
                '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
                '\u{2026}' => '.',
                ' ' | '\t' | '\u{a0}' => ' ',
                c if c.is_control() => continue,
                c => c,
            };

            let is_space = matches!(c, ' ' | '\t' | '\u{a0}');
            match line.last_mut() {
                Some(last) if is_space && in_space_run => last.2 = end,
                _ => line.push((mapped, idx, end)),
            }
            in_space_run = is_space;
        }

        // `str::lines` semantics: a trailing break does not open a new line
        if !text.ends_with(|c: char| c == '\n' || c == '\r') {
            lines.push(line);
        }

        let mut normalized = NormalizedText {
            source: text,
            text: String::with_capacity(text.len()),
            spans: Vec::with_capacity(text.len()),
        };
        for (number, line) in lines.iter().enumerate() {
            if number > 0 {
                normalized.push('\n', breaks[number - 1]);
            }
            let first = line.iter().position(|(c, _, _)| !c.is_whitespace());
            let last = line.iter().rposition(|(c, _, _)| !c.is_whitespace());
            if let (Some(first), Some(last)) = (first, last) {
                for &(c, start, end) in &line[first..=last] {
                    normalized.push(c, (start, end));
                }
            }
        }
        normalized
    }

    pub fn extract_contact(&self, text: &str) -> ContactInfo {
        let mut emails: Vec<String> = EMAIL_RE.find_iter(text).map(|m| m.as_str().to_string()).collect();
        emails.dedup();
        let mut phones: Vec<String> = PHONE_RE.find_iter(text).map(|m| m.as_str().trim().to_string()).collect();
        phones.dedup();
        ContactInfo { emails, phones }
    }

    pub fn stats(&self, text: &str) -> TextStats {
        TextStats {
            characters: text.chars().count(),
            words: text.unicode_words().count(),
            lines: text.lines().filter(|l| !l.trim().is_empty()).count(),
        }
    }

    /// Remove personal identifiable information
    pub fn redact_pii(&self, text: &str) -> String {
        let mut cleaned = EMAIL_RE.replace_all(text, "[EMAIL REMOVED]").to_string();
        cleaned = SSN_RE.replace_all(&cleaned, "[SSN REMOVED]").to_string();
        cleaned = PHONE_RE.replace_all(&cleaned, "[PHONE REMOVED]").to_string();
        cleaned
    }
}

/// Normalized text tied back to the text it was made from.
#[derive(Debug, Clone)]
pub struct NormalizedText<'a> {
    source: &'a str,
    pub text: String,
    /// Source byte range behind each byte of `text`
    spans: Vec<(usize, usize)>,
}

impl<'a> NormalizedText<'a> {
    fn push(&mut self, c: char, span: (usize, usize)) {
        self.text.push(c);
        self.spans.extend(std::iter::repeat(span).take(c.len_utf8()));
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Source byte range covering `start..end` of the normalized text.
    pub fn source_range(&self, start: usize, end: usize) -> Range<usize> {
        let from = self.spans.get(start).map_or(self.source.len(), |s| s.0);
        if end <= start {
            return from..from;
        }
        let to = self.spans.get(end - 1).map_or(self.source.len(), |s| s.1);
        from..to.max(from)
    }

    /// The source text behind `start..end` of the normalized text.
    pub fn source_slice(&self, start: usize, end: usize) -> &'a str {
        &self.source[self.source_range(start, end)]
    }
}

/// Content of a bullet line, or `None` for ordinary lines.
pub fn bullet_content(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let mut chars = trimmed.chars();
    let first = chars.next()?;
    if !BULLET_MARKERS.contains(&first) {
        return None;
    }
    let rest = chars.as_str();
    // "-2019" or "+5" are not bullets
    if rest.starts_with(' ') || first == '•' || first == '▪' || first == '●' {
        let content = rest.trim();
        if content.is_empty() {
            None
        } else {
            Some(content)
        }
    } else {
        None
    }
}

/// Split a list line on `,` `;` `|` `•` with byte offsets. `/` is kept so
/// terms like CI/CD survive.
pub fn split_list_items(line: &str) -> Vec<(usize, &str)> {
    let mut items = Vec::new();
    let mut start = 0;
    for (idx, c) in line.char_indices() {
        if matches!(c, ',' | ';' | '|' | '•') {
            push_item(line, start, idx, &mut items);
            start = idx + c.len_utf8();
        }
    }
    push_item(line, start, line.len(), &mut items);
    items
}

fn push_item<'a>(line: &'a str, start: usize, end: usize, items: &mut Vec<(usize, &'a str)>) {
    let raw = &line[start..end];
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        let offset = start + (raw.len() - raw.trim_start().len());
        items.push((offset, trimmed));
    }
}

/// True when `haystack[start..end]` is not glued to neighbouring word characters.
pub fn is_word_bounded(haystack: &str, start: usize, end: usize) -> bool {
    let before = haystack[..start].chars().next_back();
    let after = haystack[end..].chars().next();
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    !before.map_or(false, is_word) && !after.map_or(false, is_word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_and_binary() {
        let processor = TextProcessor::new();
        assert!(processor.validate("Jane Doe\nPython", "CV").is_ok());
        assert!(matches!(processor.validate("   \n\t", "CV"), Err(CvEvaluatorError::InputMalformed(_))));
        assert!(processor.validate("abc\0def", "CV").is_err());

        let binary: String = (0..200u8).map(|b| (b % 32) as char).filter(|c| *c != '\0').collect();
        assert!(processor.validate(&binary, "Job description").is_err());
    }

    #[test]
    fn test_normalize_keeps_lines() {
        let processor = TextProcessor::new();
        let text = "Data Analyst  \u{2013}  Acme\r\n\u{201C}Quoted\u{201D}\tline\r\n";
        let normalized = processor.normalize(text);
        assert_eq!(normalized, "Data Analyst - Acme\n\"Quoted\" line");
    }

    #[test]
    fn test_normalized_offsets_point_into_source() {
        let processor = TextProcessor::new();
        let source = "Jane  \u{2013} Doe\r\n  Skills\r\nPython,\t\tSQL\r\n";
        let normalized = processor.normalize_with_offsets(source);
        assert_eq!(normalized.as_str(), "Jane - Doe\nSkills\nPython, SQL");
        assert_eq!(normalized.as_str(), processor.normalize(source));

        let at = normalized.as_str().find("SQL").unwrap();
        assert_eq!(normalized.source_slice(at, at + 3), "SQL");
        let dash = normalized.as_str().find('-').unwrap();
        assert_eq!(normalized.source_slice(dash, dash + 1), "\u{2013}");
        let comma = normalized.as_str().find(", ").unwrap();
        assert_eq!(normalized.source_slice(comma, comma + 5), ",\t\tSQL");
        assert_eq!(normalized.source_range(0, 0), 0..0);
    }

    #[test]
    fn test_contact_extraction() {
        let processor = TextProcessor::new();
        let contact = processor.extract_contact("Jane Doe | jane.doe@example.com | (555) 123-4567");
        assert_eq!(contact.emails, vec!["jane.doe@example.com"]);
        assert_eq!(contact.phones.len(), 1);
    }

    #[test]
    fn test_date_ranges_are_not_phones() {
        let processor = TextProcessor::new();
        let contact = processor.extract_contact("Analyst 2019-2021\nEngineer 2021 - 2024");
        assert!(contact.phones.is_empty());
    }

    #[test]
    fn test_stats() {
        let stats = TextProcessor::new().stats("Jane Doe\n\nPython developer.");
        assert_eq!(stats.lines, 2);
        assert_eq!(stats.words, 4);
    }

    #[test]
    fn test_pii_redaction() {
        let processor = TextProcessor::new();
        let cleaned = processor.redact_pii("Contact john.doe@company.com or (555) 123-4567. SSN: 123-45-6789");
        assert!(!cleaned.contains("john.doe@company.com"));
        assert!(!cleaned.contains("123-4567"));
        assert!(!cleaned.contains("123-45-6789"));
    }

    #[test]
    fn test_bullets() {
        assert_eq!(bullet_content("- Built dashboards"), Some("Built dashboards"));
        assert_eq!(bullet_content("  • Led a team"), Some("Led a team"));
        assert_eq!(bullet_content("-2019"), None);
        assert_eq!(bullet_content("Python"), None);
        assert_eq!(bullet_content("- "), None);
    }

    #[test]
    fn test_split_list_items() {
        let items = split_list_items("Python, SQL; CI/CD | Tableau");
        let texts: Vec<&str> = items.iter().map(|(_, t)| *t).collect();
        assert_eq!(texts, vec!["Python", "SQL", "CI/CD", "Tableau"]);
        assert_eq!(items[1].0, 8);
    }

    #[test]
    fn test_word_bounds() {
        assert!(is_word_bounded("I use Go daily", 6, 8));
        assert!(!is_word_bounded("Google", 0, 2));
    }
}
