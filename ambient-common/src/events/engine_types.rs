//! Engine-related type definitions
//!
//! Supporting types for scheduler state and diagnostics.

use serde::{Deserialize, Serialize};

/// Crossfade scheduler state
///
/// A paused session stays in `SteadyState` with `is_playing == false`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// No session
    #[default]
    Idle,
    /// Players loading and fading in
    Starting,
    /// Looping with the position monitor armed
    SteadyState,
    /// Loop-boundary crossfade in flight
    Transitioning,
    /// Fading out and tearing down the session
    Stopping,
}

impl EngineState {
    /// True while a session exists
    pub fn is_active(&self) -> bool {
        !matches!(self, EngineState::Idle)
    }
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Idle => write!(f, "idle"),
            EngineState::Starting => write!(f, "starting"),
            EngineState::SteadyState => write!(f, "steady_state"),
            EngineState::Transitioning => write!(f, "transitioning"),
            EngineState::Stopping => write!(f, "stopping"),
        }
    }
}

/// Kinds of failure reported on the diagnostics channel
///
/// None of these cross the engine's public API as errors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Requested sound name is not in the catalog
    UnknownSound,
    /// Players have not been initialized (or were disposed)
    PlayerNotReady,
    /// An underlying player call failed
    PlaybackFailure,
    /// Track duration unknown, fallback duration substituted
    DurationUnavailable,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::UnknownSound => write!(f, "unknown_sound"),
            DiagnosticKind::PlayerNotReady => write!(f, "player_not_ready"),
            DiagnosticKind::PlaybackFailure => write!(f, "playback_failure"),
            DiagnosticKind::DurationUnavailable => write!(f, "duration_unavailable"),
        }
    }
}

/// What the watchdog did after a failure inside the loop
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WatchdogAction {
    /// Gains normalized and monitoring restarted
    Recovered,
    /// Failure limit reached, session forced to idle
    GaveUp,
}
