pub mod arrow;
pub mod record;
pub mod types;

pub use arrow::{build_arrow_schema, canonical_arrow_field, canonical_schema, map_to_arrow_type};
pub use record::{CanonicalDataset, CanonicalRecord};
pub use types::{CanonicalField, LogicalType};
