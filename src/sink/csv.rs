//! CSV files per region, one row per facility.

use std::fs;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use serde::Serialize;
use tracing::info;

use super::ResultSink;
use crate::error::{Result, SweepError};
use crate::models::{FacilityRecord, SamplePoint};

const RECORD_HEADERS: [&str; 8] = [
    "name",
    "province",
    "street",
    "district",
    "neighborhood",
    "lng",
    "lat",
    "id",
];
const POINT_HEADERS: [&str; 2] = ["lng", "lat"];
const DEFAULT_PREVIEW_ROWS: usize = 10;

/// Writes `<dir>/<region>_results.csv` and `<dir>/<region>_points.csv`
pub struct CsvSink {
    output_dir: PathBuf,
    preview_rows: usize,
}

impl CsvSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }

    /// Number of rows logged after writing; 0 disables the preview
    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    pub fn results_path(&self, region: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_results.csv", file_stem(region)))
    }

    pub fn points_path(&self, region: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_points.csv", file_stem(region)))
    }

    fn write_rows<T: Serialize>(&self, path: &Path, headers: &[&str], rows: &[T]) -> Result<()> {
        fs::create_dir_all(&self.output_dir).map_err(|e| {
            SweepError::io(
                format!("Failed to create {}", self.output_dir.display()),
                e,
            )
        })?;

        // Header written explicitly so empty results still get one
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(|e| sink_err(path, e))?;
        writer.write_record(headers).map_err(|e| sink_err(path, e))?;
        for row in rows {
            writer.serialize(row).map_err(|e| sink_err(path, e))?;
        }
        writer
            .flush()
            .map_err(|e| SweepError::io(format!("Failed to flush {}", path.display()), e))?;
        Ok(())
    }
}

impl ResultSink for CsvSink {
    fn write_records(&mut self, region: &str, records: &[FacilityRecord]) -> Result<()> {
        let path = self.results_path(region);
        self.write_rows(&path, &RECORD_HEADERS, records)?;
        info!("Wrote {} facilities to {}", records.len(), path.display());

        for record in records.iter().take(self.preview_rows) {
            info!(
                "  {} | {} | {} | {} | {} | ({}, {})",
                record.id,
                record.name,
                record.neighborhood,
                record.street,
                record.district,
                record.lon,
                record.lat
            );
        }
        Ok(())
    }

    fn write_points(&mut self, region: &str, points: &[SamplePoint]) -> Result<()> {
        let path = self.points_path(region);
        self.write_rows(&path, &POINT_HEADERS, points)?;
        info!("Wrote {} sample points to {}", points.len(), path.display());
        Ok(())
    }
}

/// Region names become file names; path separators are replaced
fn file_stem(region: &str) -> String {
    region
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect()
}

fn sink_err(path: &Path, e: csv::Error) -> SweepError {
    SweepError::Sink(format!("{}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::Builder;

    fn record(id: &str, name: &str) -> FacilityRecord {
        FacilityRecord {
            name: name.to_string(),
            province: "ISTANBUL".to_string(),
            street: "Cinar, Sk.".to_string(),
            district: "ADALAR".to_string(),
            neighborhood: "Nizam".to_string(),
            lon: 29.1,
            lat: 40.87,
            id: id.to_string(),
        }
    }

    #[test]
    fn test_write_records() {
        let dir = Builder::new().prefix("gridsweep-sink-").tempdir().unwrap();
        let mut sink = CsvSink::new(dir.path().join("results"));

        sink.write_records("Adalar", &[record("1", "Park"), record("2", "Okul")])
            .unwrap();

        let contents = fs::read_to_string(sink.results_path("Adalar")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "name,province,street,district,neighborhood,lng,lat,id");
        assert_eq!(lines[1], "Park,ISTANBUL,\"Cinar, Sk.\",ADALAR,Nizam,29.1,40.87,1");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_empty_results_still_have_header() {
        let dir = Builder::new().prefix("gridsweep-sink-").tempdir().unwrap();
        let mut sink = CsvSink::new(dir.path());

        sink.write_records("Empty", &[]).unwrap();

        let contents = fs::read_to_string(sink.results_path("Empty")).unwrap();
        assert_eq!(contents.trim(), "name,province,street,district,neighborhood,lng,lat,id");
    }

    #[test]
    fn test_write_points() {
        let dir = Builder::new().prefix("gridsweep-sink-").tempdir().unwrap();
        let mut sink = CsvSink::new(dir.path());

        sink.write_points("A/B", &[SamplePoint::new(29.0, 40.5)])
            .unwrap();

        let path = sink.points_path("A/B");
        assert!(path.ends_with("A_B_points.csv"));
        let contents = fs::read_to_string(path).unwrap();
        assert_eq!(contents, "lng,lat\n29.0,40.5\n");
    }
}
