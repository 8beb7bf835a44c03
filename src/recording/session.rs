// src/recording/session.rs
//! In-progress route aggregate

use crate::track::{distance, Coordinate, GeoSample};
use chrono::{DateTime, Utc};

/// Samples and running totals for one recording
///
/// Only the recorder that owns a session can append to it; everything
/// else sees it through read-only accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSession {
    samples: Vec<GeoSample>,
    start_time: DateTime<Utc>,
    distance_km: f64,
    duration_secs: i64,
    start_point: Option<Coordinate>,
    end_point: Option<Coordinate>,
}

impl RecordingSession {
    pub(crate) fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            samples: Vec::new(),
            start_time,
            distance_km: 0.0,
            duration_secs: 0,
            start_point: None,
            end_point: None,
        }
    }

    /// Append a sample and fold it into the running totals.
    ///
    /// Only the newest pair contributes to the distance, so each call is O(1).
    pub(crate) fn push(&mut self, sample: GeoSample) {
        if let Some(previous) = self.samples.last() {
            self.distance_km += distance::distance_between(previous, &sample);
        }

        if self.start_point.is_none() {
            self.start_point = Some(sample.coordinate());
        }
        self.end_point = Some(sample.coordinate());
        self.duration_secs = distance::duration_between(self.start_time, sample.timestamp).max(0);
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[GeoSample] {
        &self.samples
    }

    pub fn point_count(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn duration_secs(&self) -> i64 {
        self.duration_secs
    }

    pub fn start_point(&self) -> Option<Coordinate> {
        self.start_point
    }

    pub fn end_point(&self) -> Option<Coordinate> {
        self.end_point
    }

    pub fn last_sample(&self) -> Option<&GeoSample> {
        self.samples.last()
    }

    /// Average speed over the recorded duration in km/h
    pub fn average_speed_kmh(&self) -> Option<f64> {
        if self.duration_secs <= 0 {
            return None;
        }
        Some(self.distance_km / (self.duration_secs as f64 / 3600.0))
    }

    /// Elapsed time formatted for display
    pub fn format_duration(&self) -> String {
        let hours = self.duration_secs / 3600;
        let minutes = (self.duration_secs % 3600) / 60;
        let seconds = self.duration_secs % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_empty_session() {
        let session = RecordingSession::new(Utc::now());
        assert!(session.is_empty());
        assert_eq!(session.distance_km(), 0.0);
        assert_eq!(session.duration_secs(), 0);
        assert!(session.start_point().is_none());
        assert!(session.end_point().is_none());
        assert!(session.average_speed_kmh().is_none());
    }

    #[test]
    fn test_push_updates_endpoints_and_totals() {
        let t0 = Utc::now();
        let mut session = RecordingSession::new(t0);

        session.push(GeoSample::new(0.0, 0.0, t0 + Duration::seconds(5)));
        assert_eq!(session.distance_km(), 0.0);
        assert_eq!(session.duration_secs(), 5);
        assert_eq!(session.start_point(), session.end_point());

        session.push(GeoSample::new(0.0, 0.01, t0 + Duration::milliseconds(30_700)));
        assert!(session.distance_km() > 1.1);
        assert_eq!(session.duration_secs(), 30);
        assert_eq!(session.start_point().map(|p| p.longitude), Some(0.0));
        assert_eq!(session.end_point().map(|p| p.longitude), Some(0.01));
    }

    #[test]
    fn test_incremental_matches_batch() {
        let t0 = Utc::now();
        let mut session = RecordingSession::new(t0);
        for i in 0..20 {
            let step = i as f64;
            session.push(GeoSample::new(
                51.5 + step * 0.001,
                -0.12 + (step * 0.7).sin() * 0.002,
                t0 + Duration::seconds(i * 3),
            ));
        }
        let batch = distance::accumulate(session.samples());
        assert!((session.distance_km() - batch).abs() < 1e-9);
    }

    #[test]
    fn test_format_duration() {
        let t0 = Utc::now();
        let mut session = RecordingSession::new(t0);
        session.push(GeoSample::new(0.0, 0.0, t0 + Duration::seconds(3725)));
        assert_eq!(session.format_duration(), "1h 2m 5s");
    }
}
