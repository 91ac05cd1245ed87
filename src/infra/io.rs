use anyhow::{Context, Result};
use memmap2::Mmap;
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::core::model::Question;

const MMAP_THRESHOLD: u64 = 1024 * 1024; // 1 MiB

pub enum FileContent {
    Mapped(Mmap),
    Buffered(String),
}

impl FileContent {
    /// Borrow the content as UTF-8
    pub fn as_str(&self) -> Result<&str> {
        match self {
            FileContent::Mapped(mmap) => {
                std::str::from_utf8(mmap).context("File is not valid UTF-8")
            }
            FileContent::Buffered(s) => Ok(s.as_str()),
        }
    }
}

/// Expand `~` and `$VAR` in a user-supplied path
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path.to_path_buf(),
    }
}

pub fn read_file_smart<P: AsRef<Path>>(path: P) -> Result<FileContent> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata for {}", path.display()))?;

    if metadata.len() > MMAP_THRESHOLD {
        // Use memory mapping for large source documents
        let file =
            File::open(path).with_context(|| format!("Failed to open file {}", path.display()))?;

        // Safety: We're only reading the file, not modifying it
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("Failed to memory-map {}", path.display()))?;

        Ok(FileContent::Mapped(mmap))
    } else {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file {}", path.display()))?;

        Ok(FileContent::Buffered(content))
    }
}

/// Read an already-extracted plain-text source document.
/// Large files stay memory-mapped; borrow the text with [`FileContent::as_str`].
pub fn read_source(path: &Path) -> Result<FileContent> {
    let path = expand_path(path);
    let content = read_file_smart(&path)?;

    // Reject non-UTF-8 input here so later borrows cannot fail
    content
        .as_str()
        .with_context(|| format!("Source {} is not valid UTF-8", path.display()))?;

    Ok(content)
}

/// Malformed question file, rendered with the offending location
#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("Invalid question file {path}: {message}")]
#[diagnostic(help("expected a JSON array of questions or an object with a `questions` array"))]
pub struct QuestionFileError {
    pub path: String,
    pub message: String,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("here")]
    pub span: SourceSpan,
}

#[derive(Deserialize)]
struct WrappedQuestions {
    questions: Vec<Question>,
}

/// Read a question list from JSON: either `[...]` or `{"questions": [...]}`
pub fn read_questions(path: &Path) -> Result<Vec<Question>> {
    let path = expand_path(path);
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read question file {}", path.display()))?;

    parse_questions(&path.display().to_string(), &text).map_err(anyhow::Error::new)
}

/// Parse question JSON, mapping serde errors to a located diagnostic
pub fn parse_questions(name: &str, text: &str) -> Result<Vec<Question>, QuestionFileError> {
    let parsed = if text.trim_start().starts_with('{') {
        serde_json::from_str::<WrappedQuestions>(text).map(|w| w.questions)
    } else {
        serde_json::from_str::<Vec<Question>>(text)
    };

    parsed.map_err(|e| {
        let offset = byte_offset(text, e.line(), e.column());
        QuestionFileError {
            path: name.to_string(),
            message: e.to_string(),
            src: NamedSource::new(name, text.to_string()),
            span: (offset, 0).into(),
        }
    })
}

/// Convert serde_json's 1-based line/column into a byte offset
fn byte_offset(text: &str, line: usize, column: usize) -> usize {
    if line == 0 {
        return 0;
    }

    let line_start: usize = text
        .split_inclusive('\n')
        .take(line - 1)
        .map(str::len)
        .sum();

    (line_start + column.saturating_sub(1)).min(text.len())
}
