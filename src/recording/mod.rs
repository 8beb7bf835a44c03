// src/recording/mod.rs
//! Route recording engine

pub mod recorder;
pub mod session;
pub mod validation;

use std::fmt;

pub use recorder::{RouteDetails, RouteRecorder};
pub use session::RecordingSession;
pub use validation::{ValidationError, ValidationRules};

/// Lifecycle phase of the recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
    Paused,
    Stopped,
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordingState::Idle => "idle",
            RecordingState::Recording => "recording",
            RecordingState::Paused => "paused",
            RecordingState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
