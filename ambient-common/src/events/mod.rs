//! Event types for the ambient loop player
//!
//! Provides shared event definitions and the EventBus.

mod engine_types;

pub use engine_types::{DiagnosticKind, EngineState, WatchdogAction};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Loop player event types
///
/// Events are broadcast via EventBus and can be serialized for SSE
/// transmission. Failures inside the engine are only observable here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LoopEvent {
    /// Scheduler state changed
    StateChanged {
        old_state: EngineState,
        new_state: EngineState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A sound finished its start fade-in and is looping
    SoundStarted {
        sound_name: String,
        session_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A session was torn down
    SoundStopped {
        sound_name: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback paused
    Paused {
        sound_name: String,
        /// Whether the pause faded out first
        faded: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback resumed
    Resumed {
        sound_name: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Loop boundary reached, crossfade beginning
    CrossfadeStarted {
        sound_name: String,
        /// Active player position when the boundary was detected
        position_ms: u64,
        /// Time left before the active player's track end
        remaining_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Crossfade finished and slot roles swapped
    CrossfadeCompleted {
        sound_name: String,
        /// Index (0 or 1) of the newly active slot
        active_slot: u8,
        /// Completed loop iterations in this session
        loop_count: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Target volume changed (already clamped)
    VolumeChanged {
        volume: f32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A failure or fallback was handled internally
    Diagnostic {
        kind: DiagnosticKind,
        /// Engine operation that observed it (e.g. "play", "crossfade")
        operation: String,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The loop watchdog intervened after a failure
    WatchdogIntervention {
        action: WatchdogAction,
        interventions_total: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl LoopEvent {
    /// Variant name, used as the SSE event field
    pub fn event_type(&self) -> &'static str {
        match self {
            LoopEvent::StateChanged { .. } => "StateChanged",
            LoopEvent::SoundStarted { .. } => "SoundStarted",
            LoopEvent::SoundStopped { .. } => "SoundStopped",
            LoopEvent::Paused { .. } => "Paused",
            LoopEvent::Resumed { .. } => "Resumed",
            LoopEvent::CrossfadeStarted { .. } => "CrossfadeStarted",
            LoopEvent::CrossfadeCompleted { .. } => "CrossfadeCompleted",
            LoopEvent::VolumeChanged { .. } => "VolumeChanged",
            LoopEvent::Diagnostic { .. } => "Diagnostic",
            LoopEvent::WatchdogIntervention { .. } => "WatchdogIntervention",
        }
    }

    /// Build a diagnostic event stamped now
    pub fn diagnostic(kind: DiagnosticKind, operation: &str, message: impl Into<String>) -> Self {
        LoopEvent::Diagnostic {
            kind,
            operation: operation.to_string(),
            message: message.into(),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Event bus for one-to-many broadcasting
///
/// Thin wrapper over `tokio::sync::broadcast`. Slow subscribers lag and
/// lose the oldest events rather than blocking the engine.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<LoopEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use ambient_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// let mut rx = event_bus.subscribe();
    /// assert!(rx.try_recv().is_err());
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<LoopEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: LoopEvent) {
        let _ = self.tx.send(event);
    }
}
