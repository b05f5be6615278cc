// src/sources/mod.rs

pub mod era;

use anyhow::{bail, Result};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use era::{Era, RenameTable};

/// Character encodings the upstream extracts were published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceEncoding {
    #[serde(rename = "utf-8", alias = "utf8", alias = "UTF-8")]
    Utf8,
    /// ISO-8859-1: every byte is the code point of the same value, so 0x80-0x9F
    /// decode to C1 controls.
    #[serde(rename = "latin-1", alias = "latin1", alias = "iso-8859-1")]
    Latin1,
    /// Windows code page 1252: like latin-1 except 0x80-0x9F, which carry
    /// typographic characters (`€`, curly quotes).
    #[serde(rename = "windows-1252", alias = "cp1252")]
    Windows1252,
}

impl SourceEncoding {
    /// Codec for encodings that can reject input. Latin-1 maps every byte and has none.
    pub fn codec(self) -> Option<&'static Encoding> {
        match self {
            SourceEncoding::Utf8 => Some(encoding_rs::UTF_8),
            SourceEncoding::Latin1 => None,
            SourceEncoding::Windows1252 => Some(encoding_rs::WINDOWS_1252),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SourceEncoding::Utf8 => "utf-8",
            SourceEncoding::Latin1 => "latin-1",
            SourceEncoding::Windows1252 => "windows-1252",
        }
    }
}

/// One physical extract and how to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub path: PathBuf,
    pub delimiter: u8,
    pub encoding: SourceEncoding,
    pub era: Era,
}

impl SourceDescriptor {
    pub fn new(path: impl Into<PathBuf>, delimiter: u8, encoding: SourceEncoding, era: Era) -> Self {
        Self {
            path: path.into(),
            delimiter,
            encoding,
            era,
        }
    }

    /// Bare file name, stamped into `source_file`.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Registry entry as written in the YAML config; resolved against `raw_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub file: String,
    pub delimiter: char,
    pub encoding: SourceEncoding,
    pub era: Era,
}

impl SourceSpec {
    pub fn resolve(&self, raw_dir: &Path) -> Result<SourceDescriptor> {
        if !self.delimiter.is_ascii() {
            bail!(
                "delimiter {:?} for {} must be a single ASCII character",
                self.delimiter,
                self.file
            );
        }
        Ok(SourceDescriptor::new(
            raw_dir.join(&self.file),
            self.delimiter as u8,
            self.encoding,
            self.era,
        ))
    }
}

/// The fixed source registry: one 2005-2017 bulk extract, one file per year
/// 2018-2023, one 2024-2026 bulk extract.
pub fn default_registry(raw_dir: &Path) -> Vec<SourceDescriptor> {
    let mut sources = vec![SourceDescriptor::new(
        raw_dir.join("2005-2017.csv"),
        b';',
        SourceEncoding::Utf8,
        Era::Era2005To2017,
    )];
    for year in 2018..=2023 {
        sources.push(SourceDescriptor::new(
            raw_dir.join(format!("{}.csv", year)),
            b';',
            SourceEncoding::Latin1,
            Era::Era2018To2023,
        ));
    }
    sources.push(SourceDescriptor::new(
        raw_dir.join("2024-2026.csv"),
        b',',
        SourceEncoding::Utf8,
        Era::Era2024To2026,
    ));
    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_order_and_dialects() {
        let reg = default_registry(Path::new("data/raw"));
        let names: Vec<String> = reg.iter().map(|s| s.file_name()).collect();
        assert_eq!(
            names,
            vec![
                "2005-2017.csv",
                "2018.csv",
                "2019.csv",
                "2020.csv",
                "2021.csv",
                "2022.csv",
                "2023.csv",
                "2024-2026.csv"
            ]
        );
        assert_eq!(reg[0].delimiter, b';');
        assert_eq!(reg[0].encoding, SourceEncoding::Utf8);
        assert!(reg[1..7]
            .iter()
            .all(|s| s.encoding == SourceEncoding::Latin1 && s.era == Era::Era2018To2023));
        assert_eq!(reg[7].delimiter, b',');
        assert_eq!(reg[7].era, Era::Era2024To2026);
        assert_eq!(reg[3].path, Path::new("data/raw/2020.csv"));
    }

    #[test]
    fn encoding_labels_parse_from_yaml() {
        let parse = |s: &str| serde_yaml::from_str::<SourceEncoding>(s).unwrap();
        assert_eq!(parse("iso-8859-1"), SourceEncoding::Latin1);
        assert_eq!(parse("latin-1"), SourceEncoding::Latin1);
        assert_eq!(parse("cp1252"), SourceEncoding::Windows1252);
        assert_eq!(parse("utf8"), SourceEncoding::Utf8);
    }

    #[test]
    fn spec_rejects_non_ascii_delimiter() {
        let spec = SourceSpec {
            file: "x.csv".into(),
            delimiter: '¦',
            encoding: SourceEncoding::Utf8,
            era: Era::Era2024To2026,
        };
        assert!(spec.resolve(Path::new("raw")).is_err());
    }
}
