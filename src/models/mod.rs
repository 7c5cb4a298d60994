//! Core data models for the sweep pipeline.

pub mod boundary;
pub mod facility;

pub use boundary::{BoundarySet, BoundingBox, Polygon, SamplePoint};
pub use facility::{FacilityRecord, Occurrence, ResultSet};
