// src/process/shape.rs

use anyhow::{bail, Context, Result};
use arrow::array::{new_null_array, ArrayRef, Date32Array, StringArray};
use arrow::compute::is_not_null;
use arrow::compute::kernels::zip::zip;
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

use crate::process::convert::{CoercedColumn, CoercedTable};
use crate::schema::{canonical_schema, map_to_arrow_type, CanonicalField};

/// Days since 1970-01-01, the Date32 representation.
pub fn date32_days(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    date.signed_duration_since(epoch).num_days() as i32
}

/// Left-to-right coalesce: each row takes the first non-null value across `cols`.
fn coalesce(cols: &[&CoercedColumn]) -> Result<ArrayRef> {
    let mut acc = cols[0].values.clone();
    for next in &cols[1..] {
        let keep = is_not_null(&acc).context("computing null mask")?;
        acc = zip(&keep, &acc, &next.values)
            .with_context(|| format!("coalescing duplicate column {}", next.name))?;
    }
    Ok(acc)
}

/// Produce exactly the canonical columns, in canonical order.
///
/// - `source_file` / `fecha_ingestion` are stamped on every row.
/// - a canonical field the source lacks becomes an all-null column of its type.
/// - headers that resolved to the same field are coalesced in header order.
/// - everything else is dropped.
pub fn ensure_canonical(table: &CoercedTable, ingest_date: NaiveDate) -> Result<RecordBatch> {
    let n = table.num_rows;
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(CanonicalField::ALL.len());

    for field in CanonicalField::ALL {
        let col: ArrayRef = match field {
            CanonicalField::SourceFile => {
                Arc::new(StringArray::from(vec![table.source_file.as_str(); n]))
            }
            CanonicalField::FechaIngestion => {
                Arc::new(Date32Array::from(vec![date32_days(ingest_date); n]))
            }
            _ => {
                let dtype = map_to_arrow_type(field.logical_type());
                let present: Vec<&CoercedColumn> = table
                    .columns
                    .iter()
                    .filter(|c| c.field == Some(field))
                    .collect();
                for c in &present {
                    if c.values.data_type() != &dtype {
                        bail!(
                            "column {} in {} has type {:?}, expected {:?}",
                            c.name,
                            table.source_file,
                            c.values.data_type(),
                            dtype
                        );
                    }
                }
                match present.len() {
                    0 => new_null_array(&dtype, n),
                    1 => present[0].values.clone(),
                    _ => {
                        debug!(source = %table.source_file, field = %field, headers = present.len(), "coalescing synonym columns");
                        coalesce(&present)?
                    }
                }
            }
        };
        columns.push(col);
    }

    let dropped: Vec<&str> = table
        .columns
        .iter()
        .filter(|c| c.field.map_or(true, |f| f.is_metadata()))
        .map(|c| c.name.as_str())
        .collect();
    if !dropped.is_empty() {
        debug!(source = %table.source_file, ?dropped, "dropping non-canonical columns");
    }

    RecordBatch::try_new(canonical_schema(), columns)
        .with_context(|| format!("building canonical batch for {}", table.source_file))
}
