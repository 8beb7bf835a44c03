// src/gps/mod.rs
//! Location sources

pub mod feed;
pub mod gpsd;
pub mod nmea;

pub use feed::{list_serial_ports, LocationFeed, LocationSource};
