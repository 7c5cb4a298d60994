//! Output of finalized results.

mod csv;

pub use self::csv::CsvSink;

use crate::error::Result;
use crate::models::{FacilityRecord, SamplePoint};

/// Destination for the rows of a finished region
pub trait ResultSink {
    /// Persist the deduplicated facilities of a region
    fn write_records(&mut self, region: &str, records: &[FacilityRecord]) -> Result<()>;

    /// Persist the sample grid of a region (dry runs)
    fn write_points(&mut self, region: &str, points: &[SamplePoint]) -> Result<()>;
}
