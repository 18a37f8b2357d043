//! Provision chunks: the atomic retrievable unit of statute text.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::acts::Act;

/// One statute section's text plus structural metadata, created at
/// ingestion time and immutable thereafter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProvisionChunk {
    pub id: String,
    /// Canonically normalized section number, see [`normalize_section`].
    pub section: String,
    #[serde(default)]
    pub section_display: String,
    #[serde(default)]
    pub heading: String,
    /// Full formatted text: act label, chapter, and body.
    pub content: String,
    #[serde(default)]
    pub raw_content: String,
    #[serde(default)]
    pub chapter: String,
}

/// Canonical section-number form, applied identically at ingestion time
/// and at query time: keep digits and letters only, zero-pad the leading
/// digit run to three, uppercase any letter suffix. `"41a"` -> `"041A"`.
#[must_use]
pub fn normalize_section(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_uppercase();

    let digit_end = cleaned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(cleaned.len());
    let (digits, suffix) = cleaned.split_at(digit_end);

    if digits.is_empty() {
        return cleaned;
    }
    format!("{digits:0>3}{suffix}")
}

/// The formatted chunk text embedded and stored for one section.
#[must_use]
pub fn format_chunk_text(act: Act, section: &str, heading: &str, chapter: &str, body: &str) -> String {
    format!(
        "{prefix} Section {section}: {heading}\nChapter: {chapter}\n\nLegal Text:\n{body}\n(End of Section {section})",
        prefix = act.prefix(),
    )
}

/// Load provision chunks from a JSON file (an array of chunk records),
/// re-normalizing the `section` field and regenerating the formatted
/// content and display fields.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid chunk JSON.
pub fn load_chunks(path: &Path, act: Act) -> anyhow::Result<Vec<ProvisionChunk>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read chunk file {}", path.display()))?;
    let mut chunks: Vec<ProvisionChunk> = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse chunk file {}", path.display()))?;

    for chunk in &mut chunks {
        chunk.section = normalize_section(&chunk.section);
        chunk.section_display = format!("Section {}", chunk.section);
        chunk.content = format_chunk_text(
            act,
            &chunk.section,
            &chunk.heading,
            &chunk.chapter,
            &chunk.raw_content,
        );
    }

    Ok(chunks)
}
