// src/api/payload.rs
//! Wire format exchanged with the route service

use crate::recording::session::RecordingSession;
use crate::track::{Coordinate, GeoSample};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Activity type attached to a saved route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RouteType {
    #[default]
    Walking,
    Running,
    Cycling,
    Hiking,
    Driving,
    Other,
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RouteType::Walking => "walking",
            RouteType::Running => "running",
            RouteType::Cycling => "cycling",
            RouteType::Hiking => "hiking",
            RouteType::Driving => "driving",
            RouteType::Other => "other",
        };
        f.write_str(name)
    }
}

/// GeoJSON LineString; positions are `[longitude, latitude]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineString {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<[f64; 2]>,
}

impl LineString {
    pub fn from_samples(samples: &[GeoSample]) -> Self {
        Self {
            kind: "LineString".to_string(),
            coordinates: samples.iter().map(GeoSample::lon_lat).collect(),
        }
    }
}

/// Body of `POST /routes`, built only from a session that passed validation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedRouteData {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub path: LineString,
    pub start_time: DateTime<Utc>,
    pub distance: f64,
    pub duration: i64,
    pub points: Vec<GeoSample>,
    pub is_public: bool,
    pub route_type: RouteType,
    pub start_point: Option<Coordinate>,
    pub end_point: Option<Coordinate>,
}

impl ValidatedRouteData {
    pub(crate) fn from_session(
        session: &RecordingSession,
        name: &str,
        description: Option<&str>,
        is_public: bool,
        route_type: RouteType,
    ) -> Self {
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        Self {
            name: name.trim().to_string(),
            description,
            path: LineString::from_samples(session.samples()),
            start_time: session.start_time(),
            distance: session.distance_km(),
            duration: session.duration_secs(),
            points: session.samples().to_vec(),
            is_public,
            route_type,
            start_point: session.start_point(),
            end_point: session.end_point(),
        }
    }
}

/// Route as acknowledged by the service.
///
/// `id` is `None` when the service accepted the route but its reply carried
/// no usable identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedRoute {
    #[serde(default, alias = "_id", deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Accept string or numeric identifiers
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    }))
}

/// Responses may arrive bare or wrapped in a `data`/`route` envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CreateRouteResponse {
    Data { data: PersistedRoute },
    Route { route: PersistedRoute },
    Bare(PersistedRoute),
}

impl CreateRouteResponse {
    pub(crate) fn into_route(self) -> PersistedRoute {
        match self {
            CreateRouteResponse::Data { data } => data,
            CreateRouteResponse::Route { route } => route,
            CreateRouteResponse::Bare(route) => route,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session() -> RecordingSession {
        let t0 = DateTime::parse_from_rfc3339("2024-05-10T06:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut session = RecordingSession::new(t0);
        session.push(GeoSample::new(24.7136, 46.6753, t0).with_elevation(612.0));
        session.push(GeoSample::new(24.7236, 46.6753, t0 + Duration::seconds(70)));
        session
    }

    #[test]
    fn test_payload_shape() {
        let payload = ValidatedRouteData::from_session(
            &session(),
            "  Morning walk ",
            Some("   "),
            true,
            RouteType::Walking,
        );
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["name"], "Morning walk");
        assert!(json.get("description").is_none());
        assert_eq!(json["path"]["type"], "LineString");
        assert_eq!(json["path"]["coordinates"][0][0], 46.6753);
        assert_eq!(json["path"]["coordinates"][0][1], 24.7136);
        assert_eq!(json["startTime"], "2024-05-10T06:30:00Z");
        assert_eq!(json["duration"], 70);
        assert_eq!(json["isPublic"], true);
        assert_eq!(json["routeType"], "walking");
        assert_eq!(json["points"][0]["timestamp"], "2024-05-10T06:30:00Z");
        assert_eq!(json["points"][0]["elevation"], 612.0);
        assert_eq!(json["startPoint"]["latitude"], 24.7136);
        assert_eq!(json["endPoint"]["latitude"], 24.7236);
    }

    #[test]
    fn test_response_envelopes() {
        let bare: CreateRouteResponse = serde_json::from_str(r#"{"_id":"abc","name":"x"}"#).unwrap();
        assert_eq!(bare.into_route().id.as_deref(), Some("abc"));

        let data: CreateRouteResponse =
            serde_json::from_str(r#"{"success":true,"data":{"id":"r1"}}"#).unwrap();
        assert_eq!(data.into_route().id.as_deref(), Some("r1"));

        let route: CreateRouteResponse = serde_json::from_str(r#"{"route":{"id":"r2"}}"#).unwrap();
        assert_eq!(route.into_route().id.as_deref(), Some("r2"));
    }

    #[test]
    fn test_response_id_leniency() {
        let numeric: CreateRouteResponse = serde_json::from_str(r#"{"id":42,"name":"Trip"}"#).unwrap();
        assert_eq!(numeric.into_route().id.as_deref(), Some("42"));

        let wrapped: CreateRouteResponse = serde_json::from_str(r#"{"data":{"_id":7}}"#).unwrap();
        assert_eq!(wrapped.into_route().id.as_deref(), Some("7"));

        let missing: CreateRouteResponse = serde_json::from_str(r#"{"ok":true}"#).unwrap();
        assert_eq!(missing.into_route().id, None);
    }
}
