// src/process/reader.rs

use anyhow::Result;
use csv::ReaderBuilder;
use std::{
    borrow::Cow,
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

use crate::error::StagingError;
use crate::process::raw_table::RawTable;
use crate::sources::{SourceDescriptor, SourceEncoding};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Where source bytes come from. The pipeline reads through this so tests can run
/// without touching the filesystem.
pub trait SourceLoader {
    fn load(&self, source: &SourceDescriptor) -> Result<Vec<u8>>;
}

/// Reads sources from their declared paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, source: &SourceDescriptor) -> Result<Vec<u8>> {
        fs::read(&source.path).map_err(|e| {
            StagingError::SourceUnavailable {
                source_file: source.path.display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}

/// In-memory sources keyed by path.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> &mut Self {
        self.files.insert(path.into(), bytes.into());
        self
    }

    pub fn with(mut self, path: impl AsRef<Path>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path.as_ref(), bytes);
        self
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, source: &SourceDescriptor) -> Result<Vec<u8>> {
        match self.files.get(&source.path) {
            Some(bytes) => Ok(bytes.clone()),
            None => Err(StagingError::SourceUnavailable {
                source_file: source.path.display().to_string(),
                reason: "no such file".to_string(),
            }
            .into()),
        }
    }
}

/// Decode under the declared encoding, without replacement characters.
/// A leading UTF-8 BOM is dropped.
pub fn decode<'a>(source: &SourceDescriptor, bytes: &'a [u8]) -> Result<Cow<'a, str>> {
    let bytes = match source.encoding {
        SourceEncoding::Utf8 => bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes),
        SourceEncoding::Latin1 | SourceEncoding::Windows1252 => bytes,
    };
    let Some(codec) = source.encoding.codec() else {
        return Ok(encoding_rs::mem::decode_latin1(bytes));
    };
    codec
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or_else(|| {
            StagingError::Undecodable {
                source_file: source.file_name(),
                encoding: source.encoding.label(),
            }
            .into()
        })
}

/// Split decoded text under the source's delimiter and rename its header row.
pub fn parse_delimited(source: &SourceDescriptor, text: &str) -> Result<RawTable> {
    let source_file = source.file_name();
    let malformed = |reason: String| StagingError::Malformed {
        source_file: source_file.clone(),
        reason,
    };

    let mut rdr = ReaderBuilder::new()
        .delimiter(source.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let raw_headers = rdr
        .headers()
        .map_err(|e| malformed(format!("header row: {}", e)))?
        .clone();
    if raw_headers.iter().all(|h| h.trim().is_empty()) {
        return Err(malformed("missing header row".to_string()).into());
    }

    let headers: Vec<String> = raw_headers
        .iter()
        .map(|h| source.era.rename(h.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')))
        .collect();
    let width = headers.len();

    let mut rows = Vec::new();
    let mut ragged = 0usize;
    for (idx, result) in rdr.records().enumerate() {
        let record =
            result.map_err(|e| malformed(format!("record {}: {}", idx + 1, e)))?;
        if record.len() != width {
            ragged += 1;
        }
        let mut row: Vec<String> = record.iter().take(width).map(str::to_string).collect();
        row.resize(width, String::new());
        rows.push(row);
    }

    if ragged > 0 {
        warn!(source = %source_file, ragged, width, "records with unexpected field count were padded/truncated");
    }
    debug!(source = %source_file, columns = width, rows = rows.len(), "parsed delimited source");

    Ok(RawTable {
        source_file,
        headers,
        rows,
    })
}

/// Load, decode and split one source. Any failure here is fatal for the run.
#[tracing::instrument(level = "debug", skip(source, loader), fields(source = %source.file_name()))]
pub fn read_raw(source: &SourceDescriptor, loader: &dyn SourceLoader) -> Result<RawTable> {
    let bytes = loader.load(source)?;
    let text = decode(source, &bytes)?;
    parse_delimited(source, &text)
}
