//! Position monitor
//!
//! Polls the active player's position and decides when the loop boundary
//! is close enough to begin a crossfade. The per-tick decision is the pure
//! function [`evaluate`]; [`PositionMonitor`] runs it on a cancellable
//! tokio task.

use crate::config::LoopTiming;
use crate::player::{Player, PlayerError};
use crate::state::SharedState;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Engine flags sampled at each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorFlags {
    pub is_playing: bool,
    pub is_transitioning: bool,
}

/// Result of evaluating one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDecision {
    /// Not playing or a transition is already in flight
    Skip,
    /// Boundary still ahead
    Wait { remaining: Duration },
    /// Remaining time within the lead time: start the crossfade
    Transition { remaining: Duration },
}

/// Track length used for boundary math: measured, or the fallback
pub fn effective_duration(total: Option<Duration>, timing: &LoopTiming) -> Duration {
    total.unwrap_or(timing.fallback_duration)
}

/// Decide what one monitor tick should do
pub fn evaluate(
    position: Duration,
    total: Option<Duration>,
    timing: &LoopTiming,
    flags: MonitorFlags,
) -> TransitionDecision {
    if flags.is_transitioning || !flags.is_playing {
        return TransitionDecision::Skip;
    }

    let remaining = effective_duration(total, timing).saturating_sub(position);
    if remaining <= timing.preload_lead_time {
        TransitionDecision::Transition { remaining }
    } else {
        TransitionDecision::Wait { remaining }
    }
}

/// Why a monitor stopped polling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// Boundary reached; the caller owns the transition
    BoundaryReached { position: Duration, remaining: Duration },
    /// Token cancelled
    Cancelled,
    /// Reading the player's position failed
    Failed(PlayerError),
}

/// Poll `player` until the loop boundary approaches or `token` is cancelled
pub async fn watch(
    player: &dyn Player,
    total: Option<Duration>,
    timing: &LoopTiming,
    state: &SharedState,
    token: &CancellationToken,
) -> MonitorOutcome {
    let mut ticker = tokio::time::interval(timing.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => return MonitorOutcome::Cancelled,
            _ = ticker.tick() => {}
        }

        let flags = MonitorFlags {
            is_playing: state.is_playing().await,
            is_transitioning: state.is_transitioning(),
        };
        if flags.is_transitioning || !flags.is_playing {
            continue;
        }

        let position = match player.position().await {
            Ok(position) => position,
            Err(e) => {
                warn!("Position monitor: failed to read position: {}", e);
                return MonitorOutcome::Failed(e);
            }
        };

        match evaluate(position, total, timing, flags) {
            TransitionDecision::Transition { remaining } => {
                debug!(
                    "Loop boundary approaching: position {:?}, remaining {:?}",
                    position, remaining
                );
                return MonitorOutcome::BoundaryReached { position, remaining };
            }
            TransitionDecision::Wait { .. } | TransitionDecision::Skip => {}
        }
    }
}

/// Handle to a spawned position monitor task
pub struct PositionMonitor {
    token: CancellationToken,
    handle: JoinHandle<MonitorOutcome>,
}

impl PositionMonitor {
    /// Start polling `player` on its own task
    ///
    /// `token` is typically a child of the loop driver's token, so
    /// cancelling the driver cancels the monitor too.
    pub fn spawn(
        player: Arc<dyn Player>,
        total: Option<Duration>,
        timing: LoopTiming,
        state: Arc<SharedState>,
        token: CancellationToken,
    ) -> Self {
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            watch(player.as_ref(), total, &timing, &state, &task_token).await
        });
        Self { token, handle }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Wait for the monitor to finish
    pub async fn outcome(self) -> MonitorOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => MonitorOutcome::Cancelled,
            Err(e) => MonitorOutcome::Failed(PlayerError::Failure(format!(
                "position monitor task panicked: {}",
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AssetRef;
    use crate::player::VirtualPlayer;

    const PLAYING: MonitorFlags = MonitorFlags {
        is_playing: true,
        is_transitioning: false,
    };

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_evaluate_waits_before_lead_time() {
        let timing = LoopTiming::default();
        let decision = evaluate(secs(10.0), Some(secs(60.0)), &timing, PLAYING);
        assert_eq!(decision, TransitionDecision::Wait { remaining: secs(50.0) });
    }

    #[test]
    fn test_evaluate_transitions_at_lead_time() {
        let timing = LoopTiming::default();
        let decision = evaluate(secs(56.5), Some(secs(60.0)), &timing, PLAYING);
        assert_eq!(decision, TransitionDecision::Transition { remaining: secs(3.5) });
    }

    #[test]
    fn test_evaluate_past_end_saturates() {
        let timing = LoopTiming::default();
        let decision = evaluate(secs(70.0), Some(secs(60.0)), &timing, PLAYING);
        assert_eq!(decision, TransitionDecision::Transition { remaining: Duration::ZERO });
    }

    #[test]
    fn test_evaluate_uses_fallback_duration() {
        let timing = LoopTiming::default();
        assert!(matches!(
            evaluate(secs(26.0), None, &timing, PLAYING),
            TransitionDecision::Wait { .. }
        ));
        assert_eq!(
            evaluate(secs(26.5), None, &timing, PLAYING),
            TransitionDecision::Transition { remaining: secs(3.5) }
        );
    }

    #[test]
    fn test_evaluate_skips_when_gated() {
        let timing = LoopTiming::default();
        let transitioning = MonitorFlags {
            is_playing: true,
            is_transitioning: true,
        };
        let paused = MonitorFlags {
            is_playing: false,
            is_transitioning: false,
        };
        assert_eq!(
            evaluate(secs(59.0), Some(secs(60.0)), &timing, transitioning),
            TransitionDecision::Skip
        );
        assert_eq!(
            evaluate(secs(59.0), Some(secs(60.0)), &timing, paused),
            TransitionDecision::Skip
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_reports_boundary() {
        let player = Arc::new(VirtualPlayer::new("m", Some(Duration::from_secs(10))));
        player.load(&AssetRef::new("a")).await.unwrap();
        player.play().await.unwrap();

        let state = Arc::new(SharedState::default());
        state.update_session(|s| s.is_playing = true).await;

        let monitor = PositionMonitor::spawn(
            player,
            Some(Duration::from_secs(10)),
            LoopTiming::default(),
            state,
            CancellationToken::new(),
        );

        match monitor.outcome().await {
            MonitorOutcome::BoundaryReached { position, remaining } => {
                assert!(remaining <= Duration::from_millis(3500));
                assert!(position >= Duration::from_millis(6500));
                assert!(position < Duration::from_millis(6700));
            }
            other => panic!("Expected boundary, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_cancel() {
        let player = Arc::new(VirtualPlayer::new("m", None));
        let state = Arc::new(SharedState::default());
        let monitor = PositionMonitor::spawn(
            player,
            None,
            LoopTiming::default(),
            state,
            CancellationToken::new(),
        );
        monitor.cancel();
        assert_eq!(monitor.outcome().await, MonitorOutcome::Cancelled);
    }
}
