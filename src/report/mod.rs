// src/report/mod.rs
//
// Downstream consumer of the staging artifact: aggregate tables written as CSV.

pub mod insights;

use anyhow::{anyhow, Context, Result};
use arrow::array::{Array, AsArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::record_batch::RecordBatch;
use csv::WriterBuilder;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::config::StagingConfig;
use crate::schema::CanonicalField;
use crate::sink::load_parquet;

pub use insights::{
    emissions_by_year, top_contaminants, top_emitters_concentration, top_regions, Concentration,
    GroupKey, GroupTotal, YearTotal,
};

/// The staging dataset as loaded for reporting. Unlike `CanonicalDataset` it tolerates
/// missing columns, so callers check `has_field` before relying on one.
#[derive(Debug, Clone)]
pub struct StagingFrame {
    batch: RecordBatch,
}

impl StagingFrame {
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(load_parquet(path)?))
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.batch.num_rows(), self.batch.num_columns())
    }

    pub fn has_field(&self, field: CanonicalField) -> bool {
        self.batch.schema_ref().index_of(field.name()).is_ok()
    }

    fn typed_column(&self, field: CanonicalField, expected: &DataType) -> Result<&dyn Array> {
        let col = self
            .batch
            .column_by_name(field.name())
            .ok_or_else(|| anyhow!("staging dataset has no `{}` column", field))?;
        if col.data_type() != expected {
            return Err(anyhow!(
                "column `{}` has type {:?}, expected {:?}",
                field,
                col.data_type(),
                expected
            ));
        }
        Ok(col.as_ref())
    }

    pub fn text(&self, field: CanonicalField) -> Result<&StringArray> {
        Ok(self.typed_column(field, &DataType::Utf8)?.as_string::<i32>())
    }

    pub fn float(&self, field: CanonicalField) -> Result<&Float64Array> {
        Ok(self
            .typed_column(field, &DataType::Float64)?
            .as_primitive::<Float64Type>())
    }

    pub fn integer(&self, field: CanonicalField) -> Result<&Int64Array> {
        Ok(self
            .typed_column(field, &DataType::Int64)?
            .as_primitive::<Int64Type>())
    }
}

fn table_writer(
    dir: &Path,
    name: &str,
    headers: &[&str],
) -> Result<(csv::Writer<fs::File>, PathBuf)> {
    let out = dir.join(format!("{}.csv", name));
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_path(&out)
        .with_context(|| format!("creating {}", out.display()))?;
    // written up front so a table with no rows still carries its header
    wtr.write_record(headers)
        .with_context(|| format!("writing header to {}", out.display()))?;
    Ok((wtr, out))
}

/// Write `rows` as `<dir>/<name>.csv` under the given header line.
pub fn save_table<T: Serialize>(
    rows: &[T],
    headers: &[&str],
    dir: &Path,
    name: &str,
) -> Result<PathBuf> {
    let (mut wtr, out) = table_writer(dir, name, headers)?;
    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("writing row to {}", out.display()))?;
    }
    wtr.flush()?;
    Ok(out)
}

/// Like `save_table`, with `key_header` naming the grouping column.
pub fn save_group_table(
    rows: &[GroupTotal],
    key_header: &str,
    dir: &Path,
    name: &str,
) -> Result<PathBuf> {
    let (mut wtr, out) = table_writer(dir, name, &[key_header, "emision_total_ton"])?;
    for row in rows {
        wtr.serialize((&row.key, row.emision_total_ton))
            .with_context(|| format!("writing row to {}", out.display()))?;
    }
    wtr.flush()?;
    Ok(out)
}

/// Short run summary, also written as `resumen.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightsSummary {
    pub rows: usize,
    pub columns: usize,
    pub first_year: Option<i64>,
    pub last_year: Option<i64>,
    pub top_region: Option<String>,
    pub top_contaminant: Option<String>,
    pub group_key: GroupKey,
    pub share_top: f64,
}

/// Load the staging artifact and write every aggregate table under `reports/tables`.
pub fn run_insights(config: &StagingConfig) -> Result<InsightsSummary> {
    let tables = config.tables_dir();
    fs::create_dir_all(&tables)
        .with_context(|| format!("creating reports directory {}", tables.display()))?;

    let input = config.output_path();
    let frame = StagingFrame::load(&input)?;
    let (rows, columns) = frame.shape();
    info!(input = %input.display(), rows, columns, "loaded staging");

    let by_year = emissions_by_year(&frame)?;
    save_table(&by_year, &YearTotal::HEADERS, &tables, "emisiones_por_anio")?;

    let regions = top_regions(&frame, 10)?;
    save_group_table(&regions, "region", &tables, "top_regiones")?;

    let contaminants = top_contaminants(&frame, 10)?;
    save_group_table(&contaminants, "contaminante", &tables, "top_contaminantes")?;

    let concentration = top_emitters_concentration(&frame, 0.05)?;
    save_table(
        std::slice::from_ref(&concentration),
        &Concentration::HEADERS,
        &tables,
        "concentracion_top_emisores",
    )?;

    let summary = InsightsSummary {
        rows,
        columns,
        first_year: by_year.first().map(|y| y.anio),
        last_year: by_year.last().map(|y| y.anio),
        top_region: regions.first().map(|r| r.key.clone()),
        top_contaminant: contaminants.first().map(|c| c.key.clone()),
        group_key: concentration.group_key,
        share_top: concentration.share_top,
    };

    let summary_path = tables.join("resumen.json");
    let f = fs::File::create(&summary_path)
        .with_context(|| format!("creating {}", summary_path.display()))?;
    serde_json::to_writer_pretty(f, &summary).context("serializing insights summary")?;

    info!(
        years = ?summary.first_year.zip(summary.last_year),
        top_region = summary.top_region.as_deref().unwrap_or("N/A"),
        top_contaminant = summary.top_contaminant.as_deref().unwrap_or("N/A"),
        share_top = %format!("{:.2}%", summary.share_top * 100.0),
        tables = %tables.display(),
        "insights written"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{convert::coerce_types, raw_table::RawTable, shape::ensure_canonical};
    use crate::schema::CanonicalDataset;
    use crate::sink::{DatasetSink, ParquetSink};
    use chrono::NaiveDate;

    fn staged(config: &StagingConfig, rows: &[[&str; 5]]) -> Result<()> {
        let raw = RawTable {
            source_file: "2005-2017.csv".into(),
            headers: ["anio", "id_vu", "region", "contaminante", "emision_toneladas"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        };
        let day = NaiveDate::from_ymd_opt(2026, 1, 19).unwrap();
        let dataset = if rows.is_empty() {
            CanonicalDataset::empty()
        } else {
            CanonicalDataset::concat(&[ensure_canonical(&coerce_types(&raw), day)?])?
        };
        fs::create_dir_all(&config.staging_dir)?;
        ParquetSink::new(config.output_path()).persist(&dataset)
    }

    fn read_table(config: &StagingConfig, name: &str) -> String {
        fs::read_to_string(config.tables_dir().join(name)).unwrap()
    }

    #[test]
    fn writes_every_table_and_summary() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = StagingConfig::rooted_at(dir.path());
        staged(
            &config,
            &[
                ["2006", "001", "Biobío", "DBO5", "10,0"],
                ["2006", "002", "Biobío", "Fósforo", "5"],
                ["2019", "003", "Antofagasta", "Cobre", "80"],
                ["2024", "004", "Ñuble", "DBO5", "5.0"],
            ],
        )?;

        let summary = run_insights(&config)?;

        let mut names: Vec<String> = fs::read_dir(config.tables_dir())?
            .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<std::io::Result<_>>()?;
        names.sort();
        assert_eq!(
            names,
            vec![
                "concentracion_top_emisores.csv",
                "emisiones_por_anio.csv",
                "resumen.json",
                "top_contaminantes.csv",
                "top_regiones.csv",
            ]
        );

        assert_eq!(
            read_table(&config, "emisiones_por_anio.csv"),
            "anio,emision_total_ton\n2006,15.0\n2019,80.0\n2024,5.0\n"
        );
        assert_eq!(
            read_table(&config, "top_regiones.csv"),
            "region,emision_total_ton\nAntofagasta,80.0\nBiobío,15.0\nÑuble,5.0\n"
        );
        assert_eq!(
            read_table(&config, "top_contaminantes.csv"),
            "contaminante,emision_total_ton\nCobre,80.0\nDBO5,15.0\nFósforo,5.0\n"
        );
        assert_eq!(
            read_table(&config, "concentracion_top_emisores.csv"),
            "group_key,emitters_total,top_pct,top_n,emision_total_ton,emision_top_ton,share_top\n\
             id_vu,4,0.05,1,100.0,80.0,0.8\n"
        );

        let json: serde_json::Value =
            serde_json::from_str(&read_table(&config, "resumen.json"))?;
        assert_eq!(json["rows"], 4);
        assert_eq!(json["columns"], 27);
        assert_eq!(json["first_year"], 2006);
        assert_eq!(json["last_year"], 2024);
        assert_eq!(json["top_region"], "Antofagasta");
        assert_eq!(json["top_contaminant"], "Cobre");
        assert_eq!(json["group_key"], "id_vu");
        assert_eq!(json["share_top"], 0.8);
        assert_eq!(summary.share_top, 0.8);
        Ok(())
    }

    #[test]
    fn empty_staging_still_writes_headers() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = StagingConfig::rooted_at(dir.path());
        staged(&config, &[])?;

        let summary = run_insights(&config)?;
        assert_eq!(summary.rows, 0);
        assert_eq!(summary.first_year, None);
        assert_eq!(summary.top_region, None);

        assert_eq!(
            read_table(&config, "emisiones_por_anio.csv"),
            "anio,emision_total_ton\n"
        );
        assert_eq!(
            read_table(&config, "top_regiones.csv"),
            "region,emision_total_ton\n"
        );
        assert_eq!(
            read_table(&config, "top_contaminantes.csv"),
            "contaminante,emision_total_ton\n"
        );
        assert_eq!(
            read_table(&config, "concentracion_top_emisores.csv"),
            "group_key,emitters_total,top_pct,top_n,emision_total_ton,emision_top_ton,share_top\n\
             id_vu,0,0.05,1,0.0,0.0,0.0\n"
        );
        Ok(())
    }

    #[test]
    fn missing_staging_artifact_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = StagingConfig::rooted_at(dir.path());
        let err = run_insights(&config).unwrap_err();
        assert!(err.to_string().contains("staging parquet not found"));
    }
}
