//! Region boundary loading and point-in-polygon math.

pub mod geometry;
mod loader;

pub use loader::load_boundary;
