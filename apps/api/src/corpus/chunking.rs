use serde::{Deserialize, Serialize};

/// Window sizes for splitting reference documents, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1200,
            chunk_overlap: 200,
        }
    }
}

/// Splits `text` into overlapping windows of at most `chunk_size` characters.
///
/// A window is cut at its last whitespace when that lies past the halfway
/// point, so words are rarely split. Consecutive windows share up to
/// `chunk_overlap` characters. Blank windows are dropped.
pub fn split_text(text: &str, config: ChunkingConfig) -> Vec<String> {
    let size = config.chunk_size.max(1);
    let overlap = config.chunk_overlap.min(size - 1);
    let chars: Vec<char> = text.chars().collect();

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let mut end = (start + size).min(chars.len());

        if end < chars.len() {
            if let Some(pos) = chars[start..end].iter().rposition(|c| c.is_whitespace()) {
                if pos > size / 2 {
                    end = start + pos;
                }
            }
        }

        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }

        if end >= chars.len() {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }

    chunks
}
