//! Region boundary extraction from GeoJSON feature collections.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use geo::Coord;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Result, SweepError};
use crate::models::{BoundarySet, Polygon};

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<serde_json::Map<String, Value>>,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    geo_type: String,
    #[serde(default)]
    coordinates: Value,
}

/// A position may carry altitude; only lon/lat are read
type Position = Vec<f64>;
type Ring = Vec<Position>;

impl Feature {
    fn name(&self) -> Option<&str> {
        self.properties.as_ref()?.get("name")?.as_str()
    }
}

/// Load the polygons of `region` from a GeoJSON file (optionally `.gz`).
///
/// Only the outer ring of each polygon is kept; holes are ignored.
/// Fails with `RegionNotFound` when no feature carries the requested name.
pub fn load_boundary(path: &Path, region: &str) -> Result<BoundarySet> {
    info!("Loading boundary for {} from {}", region, path.display());

    let file = File::open(path)
        .map_err(|e| SweepError::io(format!("Failed to open {}", path.display()), e))?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let collection: FeatureCollection =
        serde_json::from_reader(BufReader::new(reader)).map_err(|e| {
            SweepError::BoundaryParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;

    extract_region(collection, region, path)
}

fn extract_region(collection: FeatureCollection, region: &str, path: &Path) -> Result<BoundarySet> {
    let mut matched = 0usize;
    let mut rings: Vec<Ring> = Vec::new();

    for feature in collection.features {
        if feature.name() != Some(region) {
            continue;
        }
        matched += 1;

        let geometry = match feature.geometry {
            Some(g) => g,
            None => {
                warn!("Feature named {} has no geometry, skipping", region);
                continue;
            }
        };

        let parse_err = |e: serde_json::Error| SweepError::BoundaryParse {
            path: path.to_path_buf(),
            message: format!("{} coordinates for {}: {}", geometry.geo_type, region, e),
        };

        match geometry.geo_type.as_str() {
            "Polygon" => {
                let polygon: Vec<Ring> =
                    serde_json::from_value(geometry.coordinates.clone()).map_err(parse_err)?;
                rings.extend(polygon.into_iter().next());
            }
            "MultiPolygon" => {
                let members: Vec<Vec<Ring>> =
                    serde_json::from_value(geometry.coordinates.clone()).map_err(parse_err)?;
                rings.extend(members.into_iter().filter_map(|m| m.into_iter().next()));
            }
            other => {
                return Err(SweepError::UnsupportedGeometry {
                    region: region.to_string(),
                    kind: other.to_string(),
                })
            }
        }
    }

    if matched == 0 {
        return Err(SweepError::RegionNotFound(region.to_string()));
    }

    let total = rings.len();
    let polygons: Vec<Polygon> = rings
        .into_iter()
        .filter_map(|ring| {
            let coords = to_coords(ring);
            let polygon = Polygon::new(coords);
            if polygon.is_none() {
                warn!("Skipping degenerate ring in {}", region);
            }
            polygon
        })
        .collect();

    debug!("Kept {}/{} rings for {}", polygons.len(), total, region);
    info!(
        "Loaded {} polygon(s) from {} feature(s) for {}",
        polygons.len(),
        matched,
        region
    );

    BoundarySet::new(region, polygons)
}

fn to_coords(ring: Ring) -> Vec<Coord<f64>> {
    ring.into_iter()
        .filter_map(|pos| match pos.as_slice() {
            [x, y, ..] => Some(Coord { x: *x, y: *y }),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::Builder;

    const DATASET: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "name": "Adalar" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [
                            [[29.0, 40.8], [29.1, 40.8], [29.1, 40.9], [29.0, 40.9], [29.0, 40.8]],
                            [[29.02, 40.82], [29.03, 40.82], [29.03, 40.83], [29.02, 40.82]]
                        ],
                        [
                            [[29.2, 40.8, 12.0], [29.3, 40.8, 10.0], [29.3, 40.9, 8.0]]
                        ]
                    ]
                }
            },
            {
                "type": "Feature",
                "properties": { "name": "Kadikoy" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [
                        [[29.0, 40.95], [29.1, 40.95], [29.1, 41.0], [29.0, 41.0], [29.0, 40.95]]
                    ]
                }
            },
            {
                "type": "Feature",
                "properties": { "name": "Besiktas" },
                "geometry": { "type": "Point", "coordinates": [29.0, 41.04] }
            }
        ]
    }"#;

    fn write_dataset(contents: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".geojson").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_multipolygon_outer_rings_only() {
        let file = write_dataset(DATASET);
        let set = load_boundary(file.path(), "Adalar").unwrap();
        assert_eq!(set.region(), "Adalar");
        // Two members; the hole of the first is dropped
        assert_eq!(set.polygons().len(), 2);
        // Open ring with altitude gets closed
        let second = &set.polygons()[1];
        assert_eq!(second.ring().len(), 4);
        assert_eq!(second.ring()[0], Coord { x: 29.2, y: 40.8 });
        // Hole interior still counts as inside
        assert!(set.contains(29.025, 40.821));
    }

    #[test]
    fn test_load_single_polygon() {
        let file = write_dataset(DATASET);
        let set = load_boundary(file.path(), "Kadikoy").unwrap();
        assert_eq!(set.polygons().len(), 1);
        assert!(set.contains(29.05, 40.97));
    }

    #[test]
    fn test_region_not_found() {
        let file = write_dataset(DATASET);
        let err = load_boundary(file.path(), "adalar").unwrap_err();
        assert!(matches!(err, SweepError::RegionNotFound(name) if name == "adalar"));
    }

    #[test]
    fn test_unsupported_geometry() {
        let file = write_dataset(DATASET);
        let err = load_boundary(file.path(), "Besiktas").unwrap_err();
        assert!(matches!(
            err,
            SweepError::UnsupportedGeometry { ref kind, .. } if kind == "Point"
        ));
    }

    #[test]
    fn test_malformed_json() {
        let file = write_dataset("{ not json");
        let err = load_boundary(file.path(), "Adalar").unwrap_err();
        assert!(matches!(err, SweepError::BoundaryParse { .. }));
    }

    #[test]
    fn test_all_rings_degenerate() {
        let file = write_dataset(
            r#"{"features": [{"properties": {"name": "Line"},
                "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 1], [0, 0]]]}}]}"#,
        );
        let err = load_boundary(file.path(), "Line").unwrap_err();
        assert!(matches!(err, SweepError::DegenerateBoundary(_)));
    }

    #[test]
    fn test_load_gzip() {
        let mut file = Builder::new().suffix(".geojson.gz").tempfile().unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(DATASET.as_bytes()).unwrap();
        file.write_all(&encoder.finish().unwrap()).unwrap();

        let set = load_boundary(file.path(), "Kadikoy").unwrap();
        assert_eq!(set.polygons().len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let err = load_boundary(Path::new("/nonexistent/boundary.geojson"), "Adalar").unwrap_err();
        assert!(matches!(err, SweepError::Io { .. }));
    }
}
