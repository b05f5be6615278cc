// src/process/mod.rs
pub mod convert;
pub mod raw_table;
pub mod reader;
pub mod shape;
pub mod utils;

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use chrono::{Local, NaiveDate};
use std::{fs, path::PathBuf, time::Instant};
use tracing::info;

use crate::config::StagingConfig;
use crate::schema::CanonicalDataset;
use crate::sink::{DatasetSink, ParquetSink};
use crate::sources::SourceDescriptor;

pub use convert::coerce_types;
pub use raw_table::RawTable;
pub use reader::{read_raw, FsLoader, MemoryLoader, SourceLoader};
pub use shape::ensure_canonical;

/// Rows contributed by one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub source_file: String,
    pub rows: usize,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingReport {
    pub ingest_date: NaiveDate,
    pub rows: usize,
    pub columns: usize,
    pub sources: Vec<SourceReport>,
    pub output: Option<PathBuf>,
}

/// Read → coerce → shape one source.
#[tracing::instrument(level = "info", skip(source, loader), fields(source = %source.file_name(), era = %source.era))]
pub fn stage_source(
    source: &SourceDescriptor,
    loader: &dyn SourceLoader,
    ingest_date: NaiveDate,
) -> Result<RecordBatch> {
    let raw = read_raw(source, loader)?;
    let coerced = coerce_types(&raw);
    let batch = ensure_canonical(&coerced, ingest_date)?;
    info!(rows = batch.num_rows(), raw_columns = raw.num_columns(), "source staged");
    Ok(batch)
}

/// Stage every source in registry order and concatenate. The first failing source
/// aborts the whole build.
pub fn build_dataset(
    sources: &[SourceDescriptor],
    loader: &dyn SourceLoader,
    ingest_date: NaiveDate,
) -> Result<(CanonicalDataset, Vec<SourceReport>)> {
    let mut batches = Vec::with_capacity(sources.len());
    let mut reports = Vec::with_capacity(sources.len());
    for source in sources {
        let batch = stage_source(source, loader, ingest_date)
            .with_context(|| format!("staging {}", source.path.display()))?;
        reports.push(SourceReport {
            source_file: source.file_name(),
            rows: batch.num_rows(),
        });
        batches.push(batch);
    }
    let dataset = if batches.is_empty() {
        CanonicalDataset::empty()
    } else {
        CanonicalDataset::concat(&batches)?
    };
    Ok((dataset, reports))
}

/// Build the complete dataset in memory, then hand it to `sink` in one call.
pub fn run_with(
    sources: &[SourceDescriptor],
    loader: &dyn SourceLoader,
    sink: &mut dyn DatasetSink,
    ingest_date: NaiveDate,
) -> Result<StagingReport> {
    let start = Instant::now();
    let (dataset, sources) = build_dataset(sources, loader, ingest_date)?;
    sink.persist(&dataset).context("persisting staging dataset")?;

    let (rows, columns) = dataset.shape();
    info!(rows, columns, elapsed = ?start.elapsed(), "staging build complete");
    Ok(StagingReport {
        ingest_date,
        rows,
        columns,
        sources,
        output: None,
    })
}

/// Full rebuild from the configured raw directory into the configured Parquet file,
/// stamped with today's local date.
pub fn run_staging(config: &StagingConfig) -> Result<StagingReport> {
    run_staging_on(config, Local::now().date_naive())
}

pub fn run_staging_on(config: &StagingConfig, ingest_date: NaiveDate) -> Result<StagingReport> {
    let sources = config.registry()?;
    fs::create_dir_all(&config.staging_dir).with_context(|| {
        format!("creating staging directory {}", config.staging_dir.display())
    })?;

    let out = config.output_path();
    let mut sink = ParquetSink::new(&out);
    let mut report = run_with(&sources, &FsLoader, &mut sink, ingest_date)?;
    report.output = Some(out);
    Ok(report)
}
