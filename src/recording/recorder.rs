// src/recording/recorder.rs
//! Recording lifecycle: start, pause, resume, stop, discard, save

use super::session::RecordingSession;
use super::validation::{self, ValidationRules};
use super::RecordingState;
use crate::api::{PersistedRoute, RouteStore, RouteType, ValidatedRouteData};
use crate::error::{RecorderError, Result};
use crate::track::GeoSample;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::path::PathBuf;

/// Metadata supplied by the user when saving a route
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteDetails {
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub route_type: RouteType,
    pub screenshot: Option<PathBuf>,
}

impl RouteDetails {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Session plus the phase it is in; exists only while a recording is live
#[derive(Debug)]
struct ActiveRecording {
    session: RecordingSession,
    phase: RecordingState,
}

/// Owns at most one recording session and enforces legal transitions.
///
/// All operations take `&mut self`, so the session has a single writer.
/// Only a successful `save` or an explicit `discard` drops the session.
pub struct RouteRecorder<S> {
    store: S,
    rules: ValidationRules,
    active: Option<ActiveRecording>,
}

impl<S: RouteStore> RouteRecorder<S> {
    pub fn new(store: S) -> Self {
        Self::with_rules(store, ValidationRules::default())
    }

    pub fn with_rules(store: S, rules: ValidationRules) -> Self {
        Self {
            store,
            rules,
            active: None,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.active
            .as_ref()
            .map_or(RecordingState::Idle, |active| active.phase)
    }

    /// A session is live, whether accepting samples or paused
    pub fn is_recording(&self) -> bool {
        matches!(
            self.state(),
            RecordingState::Recording | RecordingState::Paused
        )
    }

    pub fn is_paused(&self) -> bool {
        self.state() == RecordingState::Paused
    }

    pub fn current_route(&self) -> Option<&RecordingSession> {
        self.active.as_ref().map(|active| &active.session)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Begin a new session timed from now
    pub fn start(&mut self) -> Result<()> {
        self.start_at(Utc::now())
    }

    /// Begin a new session with an explicit start time
    pub fn start_at(&mut self, start_time: DateTime<Utc>) -> Result<()> {
        if self.active.is_some() {
            return Err(self.illegal("start"));
        }

        self.active = Some(ActiveRecording {
            session: RecordingSession::new(start_time),
            phase: RecordingState::Recording,
        });
        info!("Recording started at {}", start_time.to_rfc3339());
        Ok(())
    }

    /// Feed one location fix into the session.
    ///
    /// Returns `false` when the sample was dropped: outside `Recording`, or
    /// timestamped before the last accepted sample.
    pub fn add_point(&mut self, sample: GeoSample) -> bool {
        let state = self.state();
        let active = match self.active.as_mut() {
            Some(active) if state == RecordingState::Recording => active,
            _ => {
                debug!("Dropping sample while {}", state);
                return false;
            }
        };

        if let Some(last) = active.session.last_sample() {
            if sample.timestamp < last.timestamp {
                warn!(
                    "Dropping out-of-order sample at {} (last accepted {})",
                    sample.timestamp.to_rfc3339(),
                    last.timestamp.to_rfc3339()
                );
                return false;
            }
        }

        active.session.push(sample);
        debug!(
            "Sample {} accepted: {:.3} km, {}s",
            active.session.point_count(),
            active.session.distance_km(),
            active.session.duration_secs()
        );
        true
    }

    pub fn pause(&mut self) -> Result<()> {
        self.transition("pause", &[RecordingState::Recording], RecordingState::Paused)
    }

    pub fn resume(&mut self) -> Result<()> {
        self.transition("resume", &[RecordingState::Paused], RecordingState::Recording)
    }

    /// Freeze the session until the caller saves or discards it
    pub fn stop(&mut self) -> Result<()> {
        self.transition(
            "stop",
            &[RecordingState::Recording, RecordingState::Paused],
            RecordingState::Stopped,
        )
    }

    /// Drop the session without persisting it.
    ///
    /// Rejected when there is nothing to discard.
    pub fn discard(&mut self) -> Result<()> {
        match self.active.take() {
            Some(active) => {
                info!(
                    "Recording discarded ({} points, {:.3} km)",
                    active.session.point_count(),
                    active.session.distance_km()
                );
                Ok(())
            }
            None => Err(self.illegal("discard")),
        }
    }

    /// Validate and persist the session, then return to `Idle`.
    ///
    /// Validation and create failures leave the state and session exactly as
    /// they were so the caller can keep recording or retry. A screenshot
    /// upload failure is logged and does not affect the result.
    pub async fn save(&mut self, details: RouteDetails) -> Result<PersistedRoute> {
        let active = match self.active.as_ref() {
            Some(active) => active,
            None => return Err(self.illegal("save")),
        };

        validation::validate(&active.session, &details.name, &self.rules)?;

        let payload = ValidatedRouteData::from_session(
            &active.session,
            &details.name,
            details.description.as_deref(),
            details.is_public,
            details.route_type,
        );

        info!(
            "Saving route '{}' ({} points, {:.3} km, {}s)",
            payload.name,
            payload.points.len(),
            payload.distance,
            payload.duration
        );
        let persisted = self.store.create(&payload).await?;

        match (details.screenshot.as_deref(), persisted.id.as_deref()) {
            (Some(screenshot), Some(id)) => {
                if let Err(e) = self.store.attach_screenshot(id, screenshot).await {
                    warn!("Screenshot upload for route {} failed, keeping route: {}", id, e);
                }
            }
            (Some(_), None) => warn!("Skipping screenshot upload: route has no id"),
            _ => {}
        }

        self.active = None;
        Ok(persisted)
    }

    fn transition(
        &mut self,
        operation: &'static str,
        from: &[RecordingState],
        to: RecordingState,
    ) -> Result<()> {
        let state = self.state();
        match self.active.as_mut() {
            Some(active) if from.contains(&state) => {
                debug!("{} -> {}", state, to);
                active.phase = to;
                Ok(())
            }
            _ => Err(RecorderError::IllegalTransition { operation, state }),
        }
    }

    fn illegal(&self, operation: &'static str) -> RecorderError {
        RecorderError::IllegalTransition {
            operation,
            state: self.state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    struct NullStore {
        created: Mutex<usize>,
    }

    impl RouteStore for NullStore {
        async fn create(&self, route: &ValidatedRouteData) -> Result<PersistedRoute> {
            *self.created.lock().unwrap() += 1;
            Ok(PersistedRoute {
                id: Some("r-1".to_string()),
                name: Some(route.name.clone()),
            })
        }

        async fn attach_screenshot(&self, _route_id: &str, _image: &Path) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_starts_idle() {
        let recorder = RouteRecorder::new(NullStore::default());
        assert_eq!(recorder.state(), RecordingState::Idle);
        assert!(!recorder.is_recording());
        assert!(recorder.current_route().is_none());
    }

    #[test]
    fn test_start_twice_rejected_without_replacing_session() {
        let mut recorder = RouteRecorder::new(NullStore::default());
        let t0 = Utc::now();
        recorder.start_at(t0).unwrap();
        assert!(recorder.add_point(GeoSample::new(1.0, 1.0, t0)));

        let err = recorder.start().unwrap_err();
        assert!(matches!(
            err,
            RecorderError::IllegalTransition {
                operation: "start",
                state: RecordingState::Recording
            }
        ));
        assert_eq!(recorder.current_route().unwrap().point_count(), 1);
    }

    #[test]
    fn test_start_rejected_while_paused_or_stopped() {
        let mut recorder = RouteRecorder::new(NullStore::default());
        let t0 = Utc::now();
        recorder.start_at(t0).unwrap();
        assert!(recorder.add_point(GeoSample::new(1.0, 1.0, t0)));
        assert!(recorder.add_point(GeoSample::new(1.001, 1.0, t0 + chrono::Duration::seconds(5))));

        recorder.pause().unwrap();
        assert!(matches!(
            recorder.start_at(t0 + chrono::Duration::seconds(10)),
            Err(RecorderError::IllegalTransition {
                operation: "start",
                state: RecordingState::Paused
            })
        ));
        assert_eq!(recorder.state(), RecordingState::Paused);
        assert_eq!(recorder.current_route().unwrap().point_count(), 2);

        recorder.stop().unwrap();
        let distance = recorder.current_route().unwrap().distance_km();
        assert!(matches!(
            recorder.start(),
            Err(RecorderError::IllegalTransition {
                operation: "start",
                state: RecordingState::Stopped
            })
        ));
        assert_eq!(recorder.state(), RecordingState::Stopped);
        let session = recorder.current_route().unwrap();
        assert_eq!(session.point_count(), 2);
        assert_eq!(session.start_time(), t0);
        assert_eq!(session.distance_km(), distance);
    }

    #[test]
    fn test_illegal_transitions_leave_state() {
        let mut recorder = RouteRecorder::new(NullStore::default());
        assert!(recorder.pause().is_err());
        assert!(recorder.resume().is_err());
        assert!(recorder.stop().is_err());
        assert_eq!(recorder.state(), RecordingState::Idle);

        recorder.start().unwrap();
        assert!(recorder.resume().is_err());
        recorder.stop().unwrap();
        assert!(recorder.pause().is_err());
        assert!(recorder.stop().is_err());
        assert_eq!(recorder.state(), RecordingState::Stopped);
    }

    #[test]
    fn test_stop_from_paused() {
        let mut recorder = RouteRecorder::new(NullStore::default());
        recorder.start().unwrap();
        recorder.pause().unwrap();
        assert!(recorder.is_paused());
        assert!(recorder.is_recording());
        recorder.stop().unwrap();
        assert!(!recorder.is_recording());
        assert!(recorder.current_route().is_some());
    }

    #[test]
    fn test_out_of_order_sample_dropped() {
        let mut recorder = RouteRecorder::new(NullStore::default());
        let t0 = Utc::now();
        recorder.start_at(t0).unwrap();
        assert!(recorder.add_point(GeoSample::new(1.0, 1.0, t0 + chrono::Duration::seconds(10))));
        assert!(!recorder.add_point(GeoSample::new(1.1, 1.0, t0 + chrono::Duration::seconds(5))));

        let session = recorder.current_route().unwrap();
        assert_eq!(session.point_count(), 1);
        assert_eq!(session.duration_secs(), 10);
    }

    #[tokio::test]
    async fn test_save_from_idle_rejected() {
        let mut recorder = RouteRecorder::new(NullStore::default());
        let err = recorder.save(RouteDetails::named("Trip")).await.unwrap_err();
        assert!(matches!(err, RecorderError::IllegalTransition { operation: "save", .. }));
        assert_eq!(*recorder.store().created.lock().unwrap(), 0);
    }
}
