//! Section segmentation for CV text

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    /// Lines before the first recognised header (name, contact details)
    Header,
    Summary,
    Skills,
    Experience,
    Education,
    Projects,
    Certifications,
    /// No headers anywhere; the whole document is one section
    Unsegmented,
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKind::Header => write!(f, "Header"),
            SectionKind::Summary => write!(f, "Summary"),
            SectionKind::Skills => write!(f, "Skills"),
            SectionKind::Experience => write!(f, "Experience"),
            SectionKind::Education => write!(f, "Education"),
            SectionKind::Projects => write!(f, "Projects"),
            SectionKind::Certifications => write!(f, "Certifications"),
            SectionKind::Unsegmented => write!(f, "Unsegmented"),
        }
    }
}

const SECTION_VOCABULARY: &[(SectionKind, &[&str])] = &[
    (
        SectionKind::Summary,
        &["summary", "professional summary", "profile", "professional profile", "objective", "career objective", "about", "about me", "overview"],
    ),
    (
        SectionKind::Skills,
        &["skills", "technical skills", "key skills", "core skills", "core competencies", "competencies", "expertise", "technologies", "tech stack", "tools", "skills & tools", "skills and tools"],
    ),
    (
        SectionKind::Experience,
        &["experience", "work experience", "professional experience", "relevant experience", "employment", "employment history", "work history", "career history"],
    ),
    (
        SectionKind::Education,
        &["education", "academic background", "education & training", "education and training", "academic qualifications"],
    ),
    (SectionKind::Projects, &["projects", "personal projects", "notable projects", "portfolio"]),
    (
        SectionKind::Certifications,
        &["certifications", "certificates", "licenses", "licenses & certifications", "certifications & licenses", "licenses and certifications", "certifications and licenses"],
    ),
];

/// One line of the source with its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number
    pub number: usize,
    /// Byte offset of `text` in the document
    pub offset: usize,
    pub text: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section<'a> {
    pub kind: SectionKind,
    pub heading: Option<&'a str>,
    pub lines: Vec<Line<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentedDocument<'a> {
    pub sections: Vec<Section<'a>>,
}

impl<'a> SegmentedDocument<'a> {
    pub fn is_unsegmented(&self) -> bool {
        self.sections.iter().all(|s| s.kind == SectionKind::Unsegmented)
    }

    pub fn sections_of(&self, kind: SectionKind) -> impl Iterator<Item = &Section<'a>> {
        self.sections.iter().filter(move |s| s.kind == kind)
    }

    pub fn has(&self, kind: SectionKind) -> bool {
        self.sections.iter().any(|s| s.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct HeaderMatch<'a> {
    kind: SectionKind,
    /// Content on the header line itself, e.g. `Skills: Python, SQL`
    inline: Option<(usize, &'a str)>,
}

type HeaderMatcher = for<'a> fn(&'a str) -> Option<HeaderMatch<'a>>;

/// Tried in order; the first match wins.
const HEADER_MATCHERS: &[HeaderMatcher] = &[decorated_header, colon_header, bare_header];

fn classify(label: &str) -> Option<SectionKind> {
    let cleaned: String = label
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '&')
        .collect::<String>()
        .to_lowercase();
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.is_empty() || cleaned.split(' ').count() > 5 {
        return None;
    }

    SECTION_VOCABULARY
        .iter()
        .find(|(_, labels)| labels.contains(&cleaned.as_str()))
        .map(|(kind, _)| kind.clone())
}

/// `## Skills`, `=== EDUCATION ===`, `**Experience**`
fn decorated_header(line: &str) -> Option<HeaderMatch<'_>> {
    let decorations: &[char] = &['#', '=', '*', '_', '-', '~'];
    let trimmed = line.trim();
    if trimmed.starts_with("- ") || trimmed.starts_with("* ") {
        return None;
    }
    let undecorated = trimmed.trim_matches(decorations);
    if undecorated.len() == trimmed.len() {
        return None;
    }
    classify(undecorated.trim().trim_end_matches(':')).map(|kind| HeaderMatch { kind, inline: None })
}

/// `Skills:` optionally followed by inline content
fn colon_header(line: &str) -> Option<HeaderMatch<'_>> {
    let colon = line.find(':')?;
    let kind = classify(&line[..colon])?;
    let rest = &line[colon + 1..];
    let content = rest.trim();
    let inline = if content.is_empty() {
        None
    } else {
        Some((colon + 1 + (rest.len() - rest.trim_start().len()), content))
    };
    Some(HeaderMatch { kind, inline })
}

/// A line consisting only of a known section label
fn bare_header(line: &str) -> Option<HeaderMatch<'_>> {
    classify(line.trim()).map(|kind| HeaderMatch { kind, inline: None })
}

fn match_header(line: &str) -> Option<HeaderMatch<'_>> {
    HEADER_MATCHERS.iter().find_map(|matcher| matcher(line))
}

/// Lines with byte offsets and 1-based numbers, blank lines skipped.
pub fn lines_with_offsets(text: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut offset = 0;
    for (idx, raw) in text.split_inclusive('\n').enumerate() {
        let content = raw.trim_end_matches(['\n', '\r']);
        let leading = content.len() - content.trim_start().len();
        let trimmed = content.trim();
        if !trimmed.is_empty() {
            lines.push(Line {
                number: idx + 1,
                offset: offset + leading,
                text: trimmed,
            });
        }
        offset += raw.len();
    }
    lines
}

/// Split text into sections; falls back to one unsegmented section.
pub fn segment(text: &str) -> SegmentedDocument<'_> {
    let lines = lines_with_offsets(text);
    let mut sections: Vec<Section<'_>> = Vec::new();
    let mut current = Section {
        kind: SectionKind::Header,
        heading: None,
        lines: Vec::new(),
    };
    let mut found_header = false;

    for line in lines.iter().copied() {
        match match_header(line.text) {
            Some(header) => {
                found_header = true;
                let previous = std::mem::replace(
                    &mut current,
                    Section {
                        kind: header.kind,
                        heading: Some(line.text),
                        lines: Vec::new(),
                    },
                );
                if !previous.lines.is_empty() || previous.heading.is_some() {
                    sections.push(previous);
                }
                if let Some((start, content)) = header.inline {
                    current.lines.push(Line {
                        number: line.number,
                        offset: line.offset + start,
                        text: content,
                    });
                }
            }
            None => current.lines.push(line),
        }
    }

    if !found_header {
        debug!("No section headers found; treating document as unsegmented");
        return SegmentedDocument {
            sections: vec![Section {
                kind: SectionKind::Unsegmented,
                heading: None,
                lines,
            }],
        };
    }

    sections.push(current);
    debug!(
        "Detected sections: {:?}",
        sections.iter().map(|s| s.kind.to_string()).collect::<Vec<_>>()
    );
    SegmentedDocument { sections }
}
