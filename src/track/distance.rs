// src/track/distance.rs
//! Great-circle distance and elapsed time between fixes

use super::sample::GeoSample;
use chrono::{DateTime, Utc};

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two fixes in kilometers
pub fn distance_between(a: &GeoSample, b: &GeoSample) -> f64 {
    haversine_km(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Haversine distance between two lat/lon pairs in kilometers
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Sum of consecutive-pair distances, in sample order
pub fn accumulate(samples: &[GeoSample]) -> f64 {
    samples
        .windows(2)
        .map(|w| distance_between(&w[0], &w[1]))
        .sum()
}

/// Whole seconds from `start` to `end`, rounded down
pub fn duration_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let elapsed = end.signed_duration_since(start);
    let secs = elapsed.num_seconds();
    // num_seconds truncates toward zero
    if elapsed.subsec_nanos() < 0 {
        secs - 1
    } else {
        secs
    }
}
