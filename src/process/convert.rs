// src/process/convert.rs

use arrow::array::{ArrayRef, Float64Builder, Int64Builder, StringBuilder};
use std::sync::Arc;
use tracing::debug;

use crate::process::raw_table::RawTable;
use crate::process::utils::{clean_cell, parse_float, parse_year};
use crate::schema::{CanonicalField, LogicalType};

/// A column after coercion. `field` is set when the header is a canonical name.
#[derive(Debug, Clone)]
pub struct CoercedColumn {
    pub name: String,
    pub field: Option<CanonicalField>,
    pub values: ArrayRef,
}

/// A source table with every column typed. Header order is kept, duplicates included.
#[derive(Debug, Clone)]
pub struct CoercedTable {
    pub source_file: String,
    pub num_rows: usize,
    pub columns: Vec<CoercedColumn>,
}

/// Cast one column of raw cells to the Arrow type of `ty`.
/// Returns the array plus how many non-empty cells failed to parse and became null.
pub fn coerce_cells<'a>(ty: LogicalType, cells: impl Iterator<Item = &'a str>) -> (ArrayRef, usize) {
    let mut lost = 0usize;
    let mut track = |raw: &str, parsed: bool| {
        if !parsed && clean_cell(raw).is_some() {
            lost += 1;
        }
    };

    let array: ArrayRef = match ty {
        LogicalType::Integer => {
            let mut b = Int64Builder::new();
            for raw in cells {
                let v = parse_year(raw);
                track(raw, v.is_some());
                b.append_option(v);
            }
            Arc::new(b.finish())
        }
        LogicalType::Float => {
            let mut b = Float64Builder::new();
            for raw in cells {
                let v = parse_float(raw);
                track(raw, v.is_some());
                b.append_option(v);
            }
            Arc::new(b.finish())
        }
        // Dates are only produced by the run itself; a raw column of that name is text.
        LogicalType::Text | LogicalType::Identifier | LogicalType::Date => {
            let mut b = StringBuilder::new();
            for raw in cells {
                b.append_option(clean_cell(raw));
            }
            Arc::new(b.finish())
        }
    };
    (array, lost)
}

/// Apply the per-field coercion rules to every column of `raw`.
///
/// The rules depend only on the (renamed) header, never on the source era.
/// Columns that are not canonical are kept as trimmed text.
pub fn coerce_types(raw: &RawTable) -> CoercedTable {
    let columns = raw
        .headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let field = CanonicalField::from_name(name).filter(|f| !f.is_metadata());
            let ty = field.map(|f| f.logical_type()).unwrap_or(LogicalType::Text);
            let (values, lost) = coerce_cells(ty, raw.column(idx));
            if lost > 0 {
                debug!(source = %raw.source_file, column = %name, lost, "unparseable cells coerced to null");
            }
            CoercedColumn {
                name: name.clone(),
                field,
                values,
            }
        })
        .collect();

    CoercedTable {
        source_file: raw.source_file.clone(),
        num_rows: raw.num_rows(),
        columns,
    }
}
