//! Shared engine state
//!
//! State observable by the engine's public accessors, the loop driver task
//! and the HTTP layer. Locks are never held across player calls.

use ambient_common::events::{EngineState, EventBus, LoopEvent};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use tokio::sync::{broadcast, RwLock};
use tracing::info;
use uuid::Uuid;

/// Live state of the current playback session
///
/// Reset to `Default` when the session is torn down.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackSession {
    pub session_id: Option<Uuid>,
    pub sound_name: Option<String>,
    pub is_playing: bool,
    pub is_paused: bool,
    /// Paused with a fade-out, so resume fades back in
    pub paused_with_fade: bool,
    /// Completed crossfades in this session
    pub loop_count: u64,
    /// Measured track length, `None` when the fallback applies
    pub track_duration: Option<std::time::Duration>,
}

/// Point-in-time view of the engine
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EngineStatus {
    pub state: EngineState,
    pub sound_name: Option<String>,
    pub volume: f32,
    pub is_playing: bool,
    pub is_paused: bool,
    pub is_transitioning: bool,
    /// Index of the active slot, `None` before initialize
    pub active_slot: Option<u8>,
    pub loop_count: u64,
    pub watchdog_interventions: u64,
}

/// Shared state accessible by all engine components
pub struct SharedState {
    engine_state: RwLock<EngineState>,
    session: RwLock<PlaybackSession>,
    /// Target volume (0.0-1.0), survives session teardown
    volume: RwLock<f32>,
    /// Gates crossfade entry; at most one transition in flight
    transitioning: AtomicBool,
    events: EventBus,
    watchdog_interventions_total: AtomicU64,
    consecutive_failures: AtomicU32,
}

impl SharedState {
    pub fn new(initial_volume: f32) -> Self {
        Self {
            engine_state: RwLock::new(EngineState::Idle),
            session: RwLock::new(PlaybackSession::default()),
            volume: RwLock::new(initial_volume.clamp(0.0, 1.0)),
            transitioning: AtomicBool::new(false),
            events: EventBus::new(256),
            watchdog_interventions_total: AtomicU64::new(0),
            consecutive_failures: AtomicU32::new(0),
        }
    }

    pub fn broadcast_event(&self, event: LoopEvent) {
        self.events.emit_lossy(event);
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<LoopEvent> {
        self.events.subscribe()
    }

    pub async fn engine_state(&self) -> EngineState {
        *self.engine_state.read().await
    }

    /// Set scheduler state, emitting `StateChanged` when it differs
    pub async fn set_engine_state(&self, new_state: EngineState) {
        let old_state = {
            let mut guard = self.engine_state.write().await;
            std::mem::replace(&mut *guard, new_state)
        };
        if old_state != new_state {
            info!("Engine state: {} -> {}", old_state, new_state);
            self.broadcast_event(LoopEvent::StateChanged {
                old_state,
                new_state,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    pub async fn session(&self) -> PlaybackSession {
        self.session.read().await.clone()
    }

    pub async fn update_session<F>(&self, update: F)
    where
        F: FnOnce(&mut PlaybackSession),
    {
        update(&mut *self.session.write().await);
    }

    pub async fn reset_session(&self) {
        *self.session.write().await = PlaybackSession::default();
    }

    pub async fn is_playing(&self) -> bool {
        self.session.read().await.is_playing
    }

    pub async fn current_sound_name(&self) -> Option<String> {
        self.session.read().await.sound_name.clone()
    }

    pub async fn volume(&self) -> f32 {
        *self.volume.read().await
    }

    /// Store a new target volume, returning the clamped value
    pub async fn set_volume(&self, volume: f32) -> f32 {
        let clamped = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        *self.volume.write().await = clamped;
        clamped
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning.load(Ordering::Acquire)
    }

    /// Claim the transition gate; false if a transition is already in flight
    pub fn try_begin_transition(&self) -> bool {
        self.transitioning
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn end_transition(&self) {
        self.transitioning.store(false, Ordering::Release);
    }

    pub fn increment_watchdog_interventions(&self) -> u64 {
        self.watchdog_interventions_total.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn watchdog_interventions(&self) -> u64 {
        self.watchdog_interventions_total.load(Ordering::Relaxed)
    }

    /// Count one loop failure, returning the consecutive total
    pub fn record_failure(&self) -> u32 {
        self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn reset_failures(&self) {
        self.consecutive_failures.store(0, Ordering::Release);
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Acquire)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(0.75)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_volume_is_clamped() {
        let state = SharedState::new(0.75);
        assert_eq!(state.volume().await, 0.75);

        assert_eq!(state.set_volume(0.5).await, 0.5);
        assert_eq!(state.set_volume(1.5).await, 1.0);
        assert_eq!(state.volume().await, 1.0);
        assert_eq!(state.set_volume(-0.5).await, 0.0);
        assert_eq!(state.set_volume(f32::NAN).await, 0.0);

        assert_eq!(SharedState::new(3.0).volume().await, 1.0);
    }

    #[tokio::test]
    async fn test_state_change_emits_once() {
        let state = SharedState::default();
        let mut rx = state.subscribe_events();

        state.set_engine_state(EngineState::Starting).await;
        state.set_engine_state(EngineState::Starting).await;
        state.set_engine_state(EngineState::SteadyState).await;

        let mut transitions = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let LoopEvent::StateChanged { new_state, .. } = event {
                transitions.push(new_state);
            }
        }
        assert_eq!(transitions, vec![EngineState::Starting, EngineState::SteadyState]);
    }

    #[test]
    fn test_transition_gate_admits_one() {
        let state = SharedState::default();
        assert!(state.try_begin_transition());
        assert!(!state.try_begin_transition());
        assert!(state.is_transitioning());
        state.end_transition();
        assert!(state.try_begin_transition());
    }

    #[tokio::test]
    async fn test_session_update_and_reset() {
        let state = SharedState::default();
        state
            .update_session(|s| {
                s.sound_name = Some("Rain".into());
                s.is_playing = true;
            })
            .await;
        assert!(state.is_playing().await);
        assert_eq!(state.current_sound_name().await.as_deref(), Some("Rain"));

        state.reset_session().await;
        assert_eq!(state.session().await, PlaybackSession::default());
    }

    #[test]
    fn test_failure_counters() {
        let state = SharedState::default();
        assert_eq!(state.record_failure(), 1);
        assert_eq!(state.record_failure(), 2);
        state.reset_failures();
        assert_eq!(state.consecutive_failures(), 0);
        assert_eq!(state.increment_watchdog_interventions(), 1);
        assert_eq!(state.watchdog_interventions(), 1);
    }
}
