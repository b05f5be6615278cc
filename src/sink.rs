// src/sink.rs

use anyhow::{Context, Result};
use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::StagingError;
use crate::schema::CanonicalDataset;

/// Final destination of a staging run.
pub trait DatasetSink {
    fn persist(&mut self, dataset: &CanonicalDataset) -> Result<()>;
}

/// Writes the dataset as a single Parquet file, replacing any previous artifact.
///
/// The file is written next to the destination under a temporary name and renamed
/// into place only once the writer has closed cleanly, so a failed run never leaves
/// a truncated artifact behind.
#[derive(Debug, Clone)]
pub struct ParquetSink {
    path: PathBuf,
    props: WriterProperties,
}

impl ParquetSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .set_dictionary_enabled(true)
            .set_statistics_enabled(EnabledStatistics::Page)
            .build();
        Self {
            path: path.into(),
            props,
        }
    }

    pub fn with_properties(mut self, props: WriterProperties) -> Self {
        self.props = props;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist_error(&self, reason: impl ToString) -> StagingError {
        StagingError::Persist {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

impl DatasetSink for ParquetSink {
    #[tracing::instrument(level = "info", skip(self, dataset), fields(path = %self.path.display()))]
    fn persist(&mut self, dataset: &CanonicalDataset) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        // NamedTempFile removes itself on drop, so every early return cleans up.
        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| self.persist_error(e))?;
        debug!(tmp = %tmp.path().display(), "writing staging parquet");

        let batch = dataset.batch();
        let mut writer = ArrowWriter::try_new(&mut tmp, batch.schema(), Some(self.props.clone()))
            .map_err(|e| self.persist_error(e))?;
        writer.write(batch).map_err(|e| self.persist_error(e))?;
        writer.close().map_err(|e| self.persist_error(e))?;

        tmp.as_file()
            .sync_all()
            .map_err(|e| self.persist_error(e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.persist_error(e.error))?;

        info!(rows = dataset.num_rows(), "staging parquet committed");
        Ok(())
    }
}

/// Keeps the last persisted dataset in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub persisted: Option<CanonicalDataset>,
}

impl DatasetSink for MemorySink {
    fn persist(&mut self, dataset: &CanonicalDataset) -> Result<()> {
        self.persisted = Some(dataset.clone());
        Ok(())
    }
}

/// Read a whole Parquet file back into one RecordBatch.
pub fn load_parquet(path: impl AsRef<Path>) -> Result<RecordBatch> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("staging parquet not found at {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("reading parquet metadata of {}", path.display()))?;
    let schema = builder.schema().clone();
    let reader = builder.build().context("building parquet record batch reader")?;
    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("decoding {}", path.display()))?;
    concat_batches(&schema, &batches).context("concatenating parquet batches")
}
