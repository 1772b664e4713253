//! File type detection

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Pdf,
    Text,
    Markdown,
    /// Structured job template
    Toml,
    Json,
    Unknown,
}

impl FileType {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => FileType::Pdf,
            "txt" | "text" => FileType::Text,
            "md" | "markdown" => FileType::Markdown,
            "toml" => FileType::Toml,
            "json" => FileType::Json,
            _ => FileType::Unknown,
        }
    }

    pub fn is_template(&self) -> bool {
        matches!(self, FileType::Toml | FileType::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(FileType::from_extension("PDF"), FileType::Pdf);
        assert_eq!(FileType::from_extension("markdown"), FileType::Markdown);
        assert_eq!(FileType::from_extension("docx"), FileType::Unknown);
        assert!(FileType::from_extension("toml").is_template());
        assert!(!FileType::from_extension("txt").is_template());
    }
}
