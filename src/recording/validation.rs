// src/recording/validation.rs
//! Save-time checks that reject routes too short to keep

use super::session::RecordingSession;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_POINTS: usize = 10;
pub const MIN_DURATION_SECS: i64 = 60;

/// Thresholds a session must meet before it can be saved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRules {
    pub min_points: usize,
    pub min_duration_secs: i64,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_points: MIN_POINTS,
            min_duration_secs: MIN_DURATION_SECS,
        }
    }
}

/// Why a route was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    NameRequired,
    TooFewPoints { count: usize, required: usize },
    TooShort { duration_secs: i64, required: i64 },
}

impl ValidationError {
    /// Stable machine-readable reason
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::NameRequired => "name_required",
            ValidationError::TooFewPoints { .. } => "too_few_points",
            ValidationError::TooShort { .. } => "duration_too_short",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NameRequired => write!(f, "Enter a name for the route"),
            ValidationError::TooFewPoints { count, required } => write!(
                f,
                "Route has {} points, at least {} are needed; record a longer path",
                count, required
            ),
            ValidationError::TooShort {
                duration_secs,
                required,
            } => write!(
                f,
                "Route lasts {}s, at least {}s are needed; keep recording",
                duration_secs, required
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check a session against the rules, reporting the first failure.
///
/// Order is fixed: name, then point count, then duration.
pub fn validate(
    session: &RecordingSession,
    name: &str,
    rules: &ValidationRules,
) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::NameRequired);
    }

    if session.point_count() < rules.min_points {
        return Err(ValidationError::TooFewPoints {
            count: session.point_count(),
            required: rules.min_points,
        });
    }

    if session.duration_secs() < rules.min_duration_secs {
        return Err(ValidationError::TooShort {
            duration_secs: session.duration_secs(),
            required: rules.min_duration_secs,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::GeoSample;
    use chrono::{Duration, Utc};

    fn session_with(points: usize, span_secs: i64) -> RecordingSession {
        let t0 = Utc::now();
        let mut session = RecordingSession::new(t0);
        for i in 0..points {
            let offset = if points > 1 {
                span_secs * i as i64 / (points as i64 - 1)
            } else {
                span_secs
            };
            session.push(GeoSample::new(
                10.0 + i as f64 * 0.0005,
                20.0,
                t0 + Duration::seconds(offset),
            ));
        }
        session
    }

    #[test]
    fn test_name_checked_first() {
        let session = session_with(3, 10);
        let result = validate(&session, "", &ValidationRules::default());
        assert_eq!(result, Err(ValidationError::NameRequired));
    }

    #[test]
    fn test_whitespace_name_rejected() {
        let session = session_with(12, 90);
        let result = validate(&session, "  \t\n", &ValidationRules::default());
        assert_eq!(result.unwrap_err().code(), "name_required");
    }

    #[test]
    fn test_point_count_before_duration() {
        let session = session_with(3, 10);
        let result = validate(&session, "Trip", &ValidationRules::default());
        assert_eq!(
            result,
            Err(ValidationError::TooFewPoints {
                count: 3,
                required: 10
            })
        );
    }

    #[test]
    fn test_duration_too_short() {
        let session = session_with(10, 59);
        let err = validate(&session, "Trip", &ValidationRules::default()).unwrap_err();
        assert_eq!(err.code(), "duration_too_short");
        assert_eq!(
            err,
            ValidationError::TooShort {
                duration_secs: 59,
                required: 60
            }
        );
    }

    #[test]
    fn test_boundaries_pass() {
        let session = session_with(10, 60);
        assert!(validate(&session, "Trip", &ValidationRules::default()).is_ok());
    }

    #[test]
    fn test_custom_rules() {
        let session = session_with(3, 10);
        let rules = ValidationRules {
            min_points: 2,
            min_duration_secs: 5,
        };
        assert!(validate(&session, "Short", &rules).is_ok());
    }
}
