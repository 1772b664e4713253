//! Input manager for handling different file types

use crate::config::InputConfig;
use crate::error::{CvEvaluatorError, Result};
use crate::input::file_detector::FileType;
use crate::input::text_extractor::{MarkdownExtractor, PdfExtractor, PlainTextExtractor, TextExtractor};
use crate::model::{JobInput, RequirementTemplate};
use log::{debug, info};
use std::collections::HashMap;
use std::path::Path;

pub struct InputManager {
    cache: HashMap<String, String>,
    enable_cache: bool,
    max_file_size: u64,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            enable_cache: true,
            max_file_size: InputConfig::default().max_file_size_bytes(),
        }
    }

    pub fn from_config(config: &InputConfig) -> Self {
        Self::new().with_max_file_size(config.max_file_size_bytes())
    }

    /// Largest file, in bytes, that will be read. At least one byte.
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes.max(1);
        self
    }

    pub fn with_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    pub async fn extract_text(&mut self, path: &Path) -> Result<String> {
        let path_str = path.to_string_lossy().to_string();

        if self.enable_cache {
            if let Some(cached_text) = self.cache.get(&path_str) {
                info!("Using cached text for: {}", path.display());
                return Ok(cached_text.clone());
            }
        }

        self.check_size(path).await?;

        let text = match self.detect_file_type(path) {
            FileType::Pdf => {
                info!("Extracting text from PDF: {}", path.display());
                PdfExtractor.extract(path).await?
            }
            FileType::Text => {
                info!("Reading plain text file: {}", path.display());
                PlainTextExtractor.extract(path).await?
            }
            FileType::Markdown => {
                info!("Processing markdown file: {}", path.display());
                MarkdownExtractor.extract(path).await?
            }
            FileType::Toml | FileType::Json | FileType::Unknown => {
                return Err(CvEvaluatorError::UnsupportedFormat(format!(
                    "Unsupported file type for: {} (expected .txt, .md or .pdf)",
                    path.display()
                )));
            }
        };

        if self.enable_cache {
            self.cache.insert(path_str, text.clone());
        }

        Ok(text)
    }

    /// A `.toml` or `.json` job file is a structured template; anything
    /// else is read as free text.
    pub async fn load_job(&mut self, path: &Path) -> Result<JobInput> {
        if self.detect_file_type(path).is_template() {
            self.check_size(path).await?;
            info!("Loading job template: {}", path.display());
            return Ok(JobInput::Template(RequirementTemplate::load(path)?));
        }
        Ok(JobInput::Text(self.extract_text(path).await?))
    }

    /// Refuse missing, empty and oversized files before reading them.
    async fn check_size(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(CvEvaluatorError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File does not exist: {}", path.display()),
            )));
        }

        let size = tokio::fs::metadata(path).await?.len();
        debug!("{} is {} bytes (limit {})", path.display(), size, self.max_file_size);
        if size == 0 {
            return Err(CvEvaluatorError::InputMalformed(format!("File is empty: {}", path.display())));
        }
        if size > self.max_file_size {
            return Err(CvEvaluatorError::InputMalformed(format!(
                "File {} is {} bytes, over the {} byte limit (input.max_file_size_mb)",
                path.display(),
                size,
                self.max_file_size
            )));
        }
        Ok(())
    }

    fn detect_file_type(&self, path: &Path) -> FileType {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(FileType::from_extension)
            .unwrap_or(FileType::Unknown)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}
