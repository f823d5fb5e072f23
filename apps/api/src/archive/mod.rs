//! Archive writer: packages a `NormalizedRecord` into the downloadable zip.
//!
//! Entries:
//!   Documento_Tecnico_MGA.md   heading + narrative paragraphs
//!   CADENA_VALOR.csv           value-chain rows
//!   CONCEPTO_SECTORIAL.csv     sector-concept rows
//!   Proyecto_MGA.txt           plain-text field, UTF-8

use std::io::{Cursor, Write};

use indexmap::IndexSet;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::normalizer::record::Row;
use crate::normalizer::NormalizedRecord;

pub const ARCHIVE_FILE_NAME: &str = "Proyecto_MGA_Completo.zip";
pub const DOCUMENT_ENTRY: &str = "Documento_Tecnico_MGA.md";
pub const VALUE_CHAIN_ENTRY: &str = "CADENA_VALOR.csv";
pub const SECTOR_CONCEPT_ENTRY: &str = "CONCEPTO_SECTORIAL.csv";
pub const TEXT_ENTRY: &str = "Proyecto_MGA.txt";

const DOCUMENT_TITLE: &str = "DOCUMENTO TÉCNICO MGA";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A named blob inside the archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEntry {
    pub name: &'static str,
    pub bytes: Vec<u8>,
}

/// Renders every artifact of a record. Never fails on missing fields.
pub fn render_entries(record: &NormalizedRecord) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    Ok(vec![
        ArchiveEntry {
            name: DOCUMENT_ENTRY,
            bytes: render_document(&record.narrative()).into_bytes(),
        },
        ArchiveEntry {
            name: VALUE_CHAIN_ENTRY,
            bytes: render_table(&record.value_chain())?,
        },
        ArchiveEntry {
            name: SECTOR_CONCEPT_ENTRY,
            bytes: render_table(&record.sector_concept())?,
        },
        ArchiveEntry {
            name: TEXT_ENTRY,
            bytes: record.plain_text().into_owned().into_bytes(),
        },
    ])
}

/// Builds the deflated zip for a record.
pub fn build_archive(record: &NormalizedRecord) -> Result<Vec<u8>, ArchiveError> {
    pack(&render_entries(record)?)
}

pub fn pack(entries: &[ArchiveEntry]) -> Result<Vec<u8>, ArchiveError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        writer.start_file(entry.name, options)?;
        writer.write_all(&entry.bytes)?;
    }

    Ok(writer.finish()?.into_inner())
}

/// Title heading, then one paragraph per blank-line separated block.
fn render_document(narrative: &str) -> String {
    let mut out = format!("# {DOCUMENT_TITLE}\n");
    for block in narrative.split("\n\n").map(str::trim).filter(|b| !b.is_empty()) {
        out.push('\n');
        out.push_str(block);
        out.push('\n');
    }
    out
}

/// CSV with the union of row keys as header, in first-seen order.
/// Missing cells are empty. No rows → empty file.
fn render_table(rows: &[&Row]) -> Result<Vec<u8>, ArchiveError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let columns: IndexSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;

    for row in rows {
        let record: Vec<String> = columns
            .iter()
            .map(|col| {
                row.get(*col)
                    .map(|v| v.render().into_owned())
                    .unwrap_or_default()
            })
            .collect();
        writer.write_record(&record)?;
    }

    writer.into_inner().map_err(|e| ArchiveError::Io(e.into_error()))
}
