pub mod config;
pub mod error;
pub mod process;
pub mod report;
pub mod schema;
pub mod sink;
pub mod sources;

pub use config::StagingConfig;
pub use error::StagingError;
pub use process::{run_staging, StagingReport};
pub use schema::{CanonicalDataset, CanonicalField, CanonicalRecord};
