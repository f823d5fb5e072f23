//! Corpus: reference material loaded once at startup into an immutable snapshot.
//!
//! Layout under the data root:
//!   pdf_mga_ejemplos/          example MGA projects
//!   documento_tecnico_base/    base technical documents
//!   plan_desarrollo/           development plans
//!   formatos/cadena.csv        value-chain format template
//!   formatos/concepto.csv      sector-concept format template
//!
//! The snapshot is built by `CorpusSnapshot::load` and shared as
//! `Arc<CorpusSnapshot>`; nothing mutates it afterwards.

pub mod chunking;
pub mod retrieval;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use chunking::{split_text, ChunkingConfig};

pub const CORPUS_FOLDERS: [&str; 3] = [
    "pdf_mga_ejemplos",
    "documento_tecnico_base",
    "plan_desarrollo",
];

pub const FORMATS_FOLDER: &str = "formatos";

/// (file name, label shown to the model)
pub const FORMAT_TEMPLATES: [(&str, &str); 2] = [
    (
        "cadena.csv",
        "FORMATO OFICIAL CADENA DE VALOR MGA (EJEMPLO REAL)",
    ),
    (
        "concepto.csv",
        "FORMATO OFICIAL CONCEPTO SECTORIAL MGA (EJEMPLO REAL)",
    ),
];

const MIN_TERM_CHARS: usize = 3;
const STOP_WORDS: [&str; 12] = [
    "para", "con", "los", "las", "del", "por", "una", "que", "sus", "the", "and", "for",
];

/// A whole source document before chunking.
#[derive(Debug, Clone)]
pub struct Document {
    pub source: String,
    pub text: String,
}

impl Document {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }
}

/// One retrievable passage. `terms` is precomputed for keyword retrieval.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub source: String,
    pub ordinal: usize,
    pub text: String,
    pub terms: HashSet<String>,
}

/// A CSV format template passed verbatim to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatTemplate {
    pub label: String,
    pub csv: String,
}

#[derive(Debug, Default)]
pub struct CorpusSnapshot {
    chunks: Vec<Chunk>,
    formats: Vec<FormatTemplate>,
}

impl CorpusSnapshot {
    /// Builds a snapshot from already-loaded documents.
    pub fn from_documents(
        documents: Vec<Document>,
        formats: Vec<FormatTemplate>,
        chunking: ChunkingConfig,
    ) -> Self {
        let chunks = documents
            .into_iter()
            .flat_map(|doc| {
                split_text(&doc.text, chunking)
                    .into_iter()
                    .enumerate()
                    .map(move |(ordinal, text)| Chunk {
                        source: doc.source.clone(),
                        ordinal,
                        terms: tokenize(&text).collect(),
                        text,
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        Self { chunks, formats }
    }

    /// Reads every corpus folder and format template under `data_dir`.
    ///
    /// Missing folders and templates are skipped; unreadable files are logged
    /// and skipped. Blocking; run it on a blocking thread.
    pub fn load(data_dir: &Path, chunking: ChunkingConfig) -> Result<Self> {
        let mut documents = Vec::new();

        for folder in CORPUS_FOLDERS {
            let dir = data_dir.join(folder);
            if !dir.is_dir() {
                warn!("Corpus folder {} not found, skipping", dir.display());
                continue;
            }
            for path in list_files(&dir)? {
                match read_document(&path) {
                    Ok(Some(doc)) => documents.push(doc),
                    Ok(None) => {}
                    Err(e) => warn!("Skipping unreadable corpus file {}: {e:#}", path.display()),
                }
            }
        }

        let formats = load_formats(&data_dir.join(FORMATS_FOLDER))?;
        let snapshot = Self::from_documents(documents, formats, chunking);

        info!(
            "Corpus loaded: {} chunks from {} sources, {} format templates",
            snapshot.chunks.len(),
            snapshot.sources().len(),
            snapshot.formats.len()
        );

        Ok(snapshot)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn formats(&self) -> &[FormatTemplate] {
        &self.formats
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Distinct source file names, in load order.
    pub fn sources(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.chunks
            .iter()
            .map(|c| c.source.as_str())
            .filter(|s| seen.insert(*s))
            .collect()
    }
}

/// Lower-cased alphanumeric terms of at least three characters, stop words removed.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_TERM_CHARS)
        .map(str::to_lowercase)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Returns `Ok(None)` for file types the corpus does not index.
fn read_document(path: &Path) -> Result<Option<Document>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let text = match extension.as_str() {
        "pdf" => extract_pdf_text(path)?,
        "txt" | "md" => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        _ => return Ok(None),
    };

    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Some(Document::new(source, text)))
}

fn extract_pdf_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    // pdf-extract panics on some malformed files instead of returning an error.
    std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes))
        .map_err(|_| anyhow::anyhow!("PDF parser panicked on {}", path.display()))?
        .map_err(|e| anyhow::anyhow!("PDF text extraction failed for {}: {e}", path.display()))
}

fn load_formats(dir: &Path) -> Result<Vec<FormatTemplate>> {
    let mut formats = Vec::new();
    for (file, label) in FORMAT_TEMPLATES {
        let path = dir.join(file);
        if !path.is_file() {
            continue;
        }
        let csv = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read format template {}", path.display()))?;
        formats.push(FormatTemplate {
            label: label.to_string(),
            csv: csv.trim().to_string(),
        });
    }
    Ok(formats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_tokenize_lowercases_and_filters() {
        let terms: Vec<String> = tokenize("Acueducto de AGUA para la vereda, año 2024").collect();
        assert_eq!(terms, vec!["acueducto", "agua", "vereda", "año", "2024"]);
    }

    #[test]
    fn test_load_reads_text_documents_and_formats() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "plan_desarrollo/plan.txt", "Meta: cobertura de agua potable");
        write(tmp.path(), "documento_tecnico_base/base.md", "Estructura del documento técnico");
        write(tmp.path(), "plan_desarrollo/notas.docx", "ignored");
        write(tmp.path(), "formatos/cadena.csv", "objetivo,producto,costo\n");

        let snapshot = CorpusSnapshot::load(tmp.path(), ChunkingConfig::default()).unwrap();

        assert_eq!(snapshot.sources(), vec!["base.md", "plan.txt"]);
        assert_eq!(snapshot.formats().len(), 1);
        assert_eq!(snapshot.formats()[0].csv, "objetivo,producto,costo");
        assert!(snapshot.formats()[0].label.contains("CADENA DE VALOR"));
    }

    #[test]
    fn test_load_with_missing_folders_is_empty_not_error() {
        let tmp = TempDir::new().unwrap();
        let snapshot = CorpusSnapshot::load(tmp.path(), ChunkingConfig::default()).unwrap();
        assert!(snapshot.is_empty());
        assert!(snapshot.formats().is_empty());
    }

    #[test]
    fn test_unreadable_pdf_is_skipped() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "pdf_mga_ejemplos/roto.pdf", "not a pdf");
        write(tmp.path(), "pdf_mga_ejemplos/ok.txt", "Proyecto de vías terciarias");

        let snapshot = CorpusSnapshot::load(tmp.path(), ChunkingConfig::default()).unwrap();
        assert_eq!(snapshot.sources(), vec!["ok.txt"]);
    }

    #[test]
    fn test_from_documents_numbers_chunks_per_source() {
        let chunking = ChunkingConfig {
            chunk_size: 10,
            chunk_overlap: 0,
        };
        let snapshot = CorpusSnapshot::from_documents(
            vec![
                Document::new("a.txt", "uno dos tres cuatro cinco"),
                Document::new("b.txt", "seis"),
            ],
            Vec::new(),
            chunking,
        );
        let ids: Vec<(&str, usize)> = snapshot
            .chunks()
            .iter()
            .map(|c| (c.source.as_str(), c.ordinal))
            .collect();
        assert_eq!(ids, vec![("a.txt", 0), ("a.txt", 1), ("a.txt", 2), ("b.txt", 0)]);
        assert!(snapshot.chunks()[0].terms.contains("uno"));
    }
}
