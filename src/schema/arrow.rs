// src/schema/arrow.rs

use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema, SchemaRef};
use once_cell::sync::Lazy;
use std::sync::Arc;

use super::types::{CanonicalField, LogicalType};

/// Map a canonical logical type into an Arrow DataType.
///
/// - Text, Identifier → Utf8
/// - Integer          → Int64 (exact, never a float approximation)
/// - Float            → Float64
/// - Date             → Date32
pub fn map_to_arrow_type(ty: LogicalType) -> DataType {
    match ty {
        LogicalType::Text | LogicalType::Identifier => DataType::Utf8,
        LogicalType::Integer => DataType::Int64,
        LogicalType::Float => DataType::Float64,
        LogicalType::Date => DataType::Date32,
    }
}

/// Arrow field for one canonical column. Only the ingestion metadata is non-nullable.
pub fn canonical_arrow_field(field: CanonicalField) -> ArrowField {
    ArrowField::new(
        field.name(),
        map_to_arrow_type(field.logical_type()),
        !field.is_metadata(),
    )
}

/// Build an ArrowSchema (inside an Arc) from a slice of canonical fields.
pub fn build_arrow_schema(fields: &[CanonicalField]) -> SchemaRef {
    let fields: Vec<ArrowField> = fields.iter().copied().map(canonical_arrow_field).collect();
    Arc::new(ArrowSchema::new(fields))
}

static CANONICAL_SCHEMA: Lazy<SchemaRef> = Lazy::new(|| build_arrow_schema(&CanonicalField::ALL));

/// The canonical v1 schema: all 27 fields, fixed order.
pub fn canonical_schema() -> SchemaRef {
    CANONICAL_SCHEMA.clone()
}
