//! Boundary geometry types: rings, bounding boxes and sample points.

use geo::Coord;
use hashbrown::HashSet;
use serde::Serialize;

use crate::boundary::geometry;
use crate::error::{Result, SweepError};

/// A (longitude, latitude) query point produced by the grid generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplePoint {
    pub lon: f64,
    pub lat: f64,
}

impl SamplePoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Bit-exact key for coordinate deduplication
    pub(crate) fn key(&self) -> (u64, u64) {
        (self.lon.to_bits(), self.lat.to_bits())
    }
}

/// Axis-aligned envelope in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Compute the envelope of a ring. Returns None for an empty ring.
    pub fn of_ring(ring: &[Coord<f64>]) -> Option<Self> {
        let first = ring.first()?;
        let mut bbox = Self {
            min_lon: first.x,
            min_lat: first.y,
            max_lon: first.x,
            max_lat: first.y,
        };
        for c in &ring[1..] {
            bbox.min_lon = bbox.min_lon.min(c.x);
            bbox.max_lon = bbox.max_lon.max(c.x);
            bbox.min_lat = bbox.min_lat.min(c.y);
            bbox.max_lat = bbox.max_lat.max(c.y);
        }
        Some(bbox)
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}

/// A closed outer ring of (lon, lat) coordinates.
///
/// Construction normalizes the ring: an open ring gets its first point
/// appended, and rings with fewer than 3 distinct points are rejected.
#[derive(Debug, Clone)]
pub struct Polygon {
    ring: Vec<Coord<f64>>,
    bbox: BoundingBox,
}

impl Polygon {
    /// Build a polygon from raw ring coordinates, closing the ring if needed
    pub fn new(coords: Vec<Coord<f64>>) -> Option<Self> {
        let distinct: HashSet<(u64, u64)> = coords
            .iter()
            .map(|c| (c.x.to_bits(), c.y.to_bits()))
            .collect();
        if distinct.len() < 3 {
            return None;
        }

        let mut ring = coords;
        if ring.first() != ring.last() {
            ring.push(ring[0]);
        }

        let bbox = BoundingBox::of_ring(&ring)?;
        Some(Self { ring, bbox })
    }

    /// Closed ring, first point equal to last
    pub fn ring(&self) -> &[Coord<f64>] {
        &self.ring
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// Strict interior test; points on an edge or vertex are outside.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.bbox.contains(lon, lat) && geometry::ring_contains(&self.ring, lon, lat)
    }
}

/// All polygons of one named region. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct BoundarySet {
    region: String,
    polygons: Vec<Polygon>,
}

impl BoundarySet {
    pub fn new(region: impl Into<String>, polygons: Vec<Polygon>) -> Result<Self> {
        let region = region.into();
        if polygons.is_empty() {
            return Err(SweepError::DegenerateBoundary(region));
        }
        Ok(Self { region, polygons })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    /// True if the point is strictly inside any polygon of the set
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.polygons.iter().any(|p| p.contains(lon, lat))
    }
}
