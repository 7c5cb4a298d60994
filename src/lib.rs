//! gridsweep - sample a region with a point grid and collect facilities
//!
//! This library provides the boundary loader, grid generator, lookup adapter
//! and aggregator used by the `sweep` binary.

pub mod aggregate;
pub mod boundary;
pub mod cancel;
pub mod error;
pub mod grid;
pub mod lookup;
pub mod models;
pub mod pipeline;
pub mod sink;

pub use error::{LookupError, SweepError};
pub use models::{BoundarySet, FacilityRecord, Polygon, ResultSet, SamplePoint};
pub use pipeline::{Pipeline, RunConfig, RunReport};
