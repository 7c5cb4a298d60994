//! Sample grid generation over region boundaries.
//!
//! Rows are spaced by a fixed latitude step. Within a row the longitude step
//! is widened by 1/cos(lat) so that samples stay roughly `spacing` meters
//! apart on the ground. Each polygon is walked over its own bounding box, and
//! a candidate is kept if it is strictly inside any polygon of the set.

use hashbrown::HashSet;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{Result, SweepError};
use crate::models::{BoundarySet, SamplePoint};

/// Meters per degree of latitude (and of longitude at the equator)
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Latitude step in degrees for a spacing in meters
pub fn latitude_step(spacing_meters: f64) -> f64 {
    spacing_meters / METERS_PER_DEGREE
}

/// Longitude step in degrees at `lat` for a spacing in meters
pub fn longitude_step(spacing_meters: f64, lat: f64) -> f64 {
    spacing_meters / (METERS_PER_DEGREE * lat.to_radians().cos())
}

/// Half-open range `start + i * step` for every value below `stop`.
///
/// A non-finite step (at a pole) yields only `start`.
pub fn arange(start: f64, stop: f64, step: f64) -> impl Iterator<Item = f64> {
    let count = if !(stop > start) {
        0
    } else if step.is_finite() && step > 0.0 {
        ((stop - start) / step).ceil() as usize
    } else {
        1
    };
    (0..count).map(move |i| start + i as f64 * step)
}

/// Generate the sample points for a boundary set.
///
/// Output order is polygon by polygon, latitude-major then longitude-minor.
/// Points already emitted for an earlier polygon are not repeated.
pub fn generate(boundary: &BoundarySet, spacing_meters: f64) -> Result<Vec<SamplePoint>> {
    if !(spacing_meters.is_finite() && spacing_meters > 0.0) {
        return Err(SweepError::InvalidSpacing(spacing_meters));
    }

    let lat_step = latitude_step(spacing_meters);
    let mut seen: HashSet<(u64, u64)> = HashSet::new();
    let mut points = Vec::new();
    let mut tested = 0usize;

    for polygon in boundary.polygons() {
        let bbox = polygon.bbox();

        let candidates: Vec<SamplePoint> = arange(bbox.min_lat, bbox.max_lat, lat_step)
            .flat_map(|lat| {
                arange(
                    bbox.min_lon,
                    bbox.max_lon,
                    longitude_step(spacing_meters, lat),
                )
                .map(move |lon| SamplePoint::new(lon, lat))
            })
            .collect();
        tested += candidates.len();

        // Containment is checked against every polygon, not only this one
        let inside: Vec<bool> = candidates
            .par_iter()
            .map(|p| boundary.contains(p.lon, p.lat))
            .collect();

        for (point, keep) in candidates.into_iter().zip(inside) {
            if keep && seen.insert(point.key()) {
                points.push(point);
            }
        }
    }

    debug!(
        "Tested {} candidates across {} polygon(s)",
        tested,
        boundary.polygons().len()
    );
    info!(
        "Generated {} sample points for {} at {}m spacing",
        points.len(),
        boundary.region(),
        spacing_meters
    );

    Ok(points)
}
