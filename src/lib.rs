// src/lib.rs
//! Route Recorder Library
//!
//! Turns a stream of GPS fixes into a validated route and hands it to a
//! route service.
//!
//! ```no_run
//! use route_recorder::{GeoSample, HttpRouteStore, RouteDetails, RouteRecorder};
//! use std::time::Duration;
//!
//! # async fn run() -> route_recorder::Result<()> {
//! let store = HttpRouteStore::new("http://localhost:3000/api", None, Duration::from_secs(30))?;
//! let mut recorder = RouteRecorder::new(store);
//!
//! recorder.start()?;
//! recorder.add_point(GeoSample::new(24.7136, 46.6753, chrono::Utc::now()));
//! // ... more samples from a location feed ...
//! recorder.stop()?;
//! let route = recorder.save(RouteDetails::named("Evening walk")).await?;
//! println!("saved as {:?}", route.id);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod gps;
pub mod recording;
pub mod track;

// Re-export main types for convenience
pub use api::{HttpRouteStore, PersistedRoute, RouteStore, RouteType, ValidatedRouteData};
pub use error::{RecorderError, Result};
pub use gps::{LocationFeed, LocationSource};
pub use recording::{
    RecordingSession, RecordingState, RouteDetails, RouteRecorder, ValidationError,
    ValidationRules,
};
pub use track::{Coordinate, GeoSample};
