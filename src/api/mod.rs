// src/api/mod.rs
//! Persistence of finished routes

pub mod client;
pub mod payload;

pub use client::{HttpRouteStore, RouteStore};
pub use payload::{LineString, PersistedRoute, RouteType, ValidatedRouteData};
