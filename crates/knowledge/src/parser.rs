//! Document parsing and text extraction.
//!
//! Turns raw document bytes into clean plain text, by format. The format is
//! detected from the file extension; unsupported formats are a parse
//! failure, fatal for that ingestion.

use ragflow_core::{AppError, AppResult};

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Markdown,
}

impl DocumentFormat {
    /// Detect the format from a file name, if supported.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = file_name.rsplit_once('.').map(|(_, e)| e.to_lowercase())?;
        match ext.as_str() {
            "txt" | "text" | "log" => Some(Self::PlainText),
            "md" | "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainText => "text",
            Self::Markdown => "markdown",
        }
    }
}

/// Whether a file name maps to a supported format.
pub fn is_supported(file_name: &str) -> bool {
    DocumentFormat::from_file_name(file_name).is_some()
}

/// All supported file extensions, for upload validation messages.
pub fn supported_extensions() -> &'static [&'static str] {
    &[".txt", ".text", ".log", ".md", ".markdown"]
}

/// Parse raw document bytes into clean plain text.
pub fn parse_document(bytes: &[u8], file_name: &str) -> AppResult<String> {
    let format = DocumentFormat::from_file_name(file_name).ok_or_else(|| {
        AppError::Parse(format!(
            "Unsupported file type: {} (supported: {})",
            file_name,
            supported_extensions().join(", ")
        ))
    })?;

    let raw = decode_text(bytes);

    let text = match format {
        DocumentFormat::PlainText => clean_text(&raw),
        DocumentFormat::Markdown => clean_text(&strip_markdown(&raw)),
    };

    if text.is_empty() {
        return Err(AppError::Parse(format!(
            "Document {} parsed to empty text",
            file_name
        )));
    }

    tracing::debug!(
        file_name,
        format = format.as_str(),
        chars = text.chars().count(),
        "Parsed document"
    );

    Ok(text)
}

/// Decode bytes as UTF-8, falling back to lossy replacement for documents
/// with stray legacy-encoded bytes.
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Normalize whitespace: trim line edges and collapse runs of blank lines
/// to a single paragraph break.
fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0usize;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if blank_run > 0 {
                out.push('\n');
            }
        }
        out.push_str(trimmed);
        blank_run = 0;
    }

    out
}

/// Strip markdown structure that carries no prose content.
fn strip_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start();

        // Code fences and horizontal rules
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") || trimmed == "---" {
            continue;
        }

        // Headers keep their text, lose the markers
        let stripped = trimmed.trim_start_matches('#').trim_start();

        out.push_str(stripped);
        out.push('\n');
    }

    out
}
