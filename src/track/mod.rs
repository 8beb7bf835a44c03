// src/track/mod.rs
//! Location samples and track geometry

pub mod distance;
pub mod sample;

pub use sample::{Coordinate, GeoSample};
