//! Loop driver - one task per playing session
//!
//! Repeats monitor → crossfade → swap until cancelled. A player failure
//! inside the cycle goes to the watchdog, which normalizes gains and
//! restarts monitoring, or forces `Idle` once the consecutive-failure
//! limit is reached.

use super::core::force_idle;
use crate::config::LoopTiming;
use crate::player::{PlayerError, PlayerResult};
use crate::playback::fader::{crossfade, sleep_or_cancel, FadeOutcome};
use crate::playback::monitor::{MonitorOutcome, PositionMonitor};
use crate::playback::slots::{PlayerSlots, SlotIndex};
use crate::state::SharedState;
use ambient_common::events::{DiagnosticKind, EngineState, LoopEvent, WatchdogAction};
use ambient_common::time::duration_to_millis;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How one boundary transition ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransitionOutcome {
    Completed,
    /// Another transition held the gate; monitoring resumes
    Skipped,
    /// Cancelled; the canceller settles slot state
    Aborted,
}

pub(super) struct LoopDriver {
    pub(super) state: Arc<SharedState>,
    pub(super) slots: Arc<PlayerSlots>,
    pub(super) timing: LoopTiming,
    pub(super) fade_lock: Arc<Mutex<()>>,
    pub(super) sound_name: String,
    pub(super) track_duration: Option<Duration>,
}

impl LoopDriver {
    pub(super) async fn run(self, token: CancellationToken) {
        debug!("Loop driver started for '{}'", self.sound_name);

        loop {
            let monitor = PositionMonitor::spawn(
                self.slots.active_player(),
                self.track_duration,
                self.timing.clone(),
                Arc::clone(&self.state),
                token.child_token(),
            );

            let keep_running = match monitor.outcome().await {
                MonitorOutcome::Cancelled => false,
                MonitorOutcome::Failed(e) => self.watchdog("monitor", e, &token).await,
                MonitorOutcome::BoundaryReached { position, remaining } => {
                    match self.transition(position, remaining, &token).await {
                        Ok(TransitionOutcome::Completed) | Ok(TransitionOutcome::Skipped) => true,
                        Ok(TransitionOutcome::Aborted) => false,
                        Err(e) => self.watchdog("crossfade", e, &token).await,
                    }
                }
            };

            if !keep_running || token.is_cancelled() {
                break;
            }
        }

        debug!("Loop driver stopped for '{}'", self.sound_name);
    }

    async fn transition(
        &self,
        position: Duration,
        remaining: Duration,
        token: &CancellationToken,
    ) -> PlayerResult<TransitionOutcome> {
        // A running volume ramp finishes before the crossfade takes over the gains
        let _fade_guard = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(TransitionOutcome::Aborted),
            guard = self.fade_lock.lock() => guard,
        };

        if !self.state.try_begin_transition() {
            debug!("Transition already in flight, skipping boundary");
            return Ok(TransitionOutcome::Skipped);
        }

        self.state.set_engine_state(EngineState::Transitioning).await;
        self.state.broadcast_event(LoopEvent::CrossfadeStarted {
            sound_name: self.sound_name.clone(),
            position_ms: duration_to_millis(position),
            remaining_ms: duration_to_millis(remaining),
            timestamp: chrono::Utc::now(),
        });

        let outgoing = self.slots.active_index();
        let incoming = outgoing.other();

        if self.crossfade_slots(outgoing, incoming, token).await? == FadeOutcome::Aborted {
            debug!("Crossfade {} -> {} cancelled", outgoing, incoming);
            return Ok(TransitionOutcome::Aborted);
        }

        let active = self.slots.swap_roles();
        self.slots.player(outgoing).stop().await?;
        self.slots.set_gain(outgoing, 0.0).await?;

        let mut loop_count = 0;
        self.state
            .update_session(|s| {
                s.loop_count += 1;
                loop_count = s.loop_count;
            })
            .await;
        self.state.reset_failures();
        self.state.end_transition();
        self.state.set_engine_state(EngineState::SteadyState).await;

        info!(
            "Crossfade complete for '{}': {} active (loop {})",
            self.sound_name, active, loop_count
        );
        self.state.broadcast_event(LoopEvent::CrossfadeCompleted {
            sound_name: self.sound_name.clone(),
            active_slot: active.index() as u8,
            loop_count,
            timestamp: chrono::Utc::now(),
        });

        Ok(TransitionOutcome::Completed)
    }

    /// Restart the incoming player from the top and run the S-curve crossfade
    async fn crossfade_slots(
        &self,
        outgoing: SlotIndex,
        incoming: SlotIndex,
        token: &CancellationToken,
    ) -> PlayerResult<FadeOutcome> {
        let player = self.slots.player(incoming);
        player.stop().await?;
        self.slots.set_gain(incoming, 0.0).await?;
        player.play().await?;

        if !sleep_or_cancel(self.timing.stabilization_delay, token).await {
            return Ok(FadeOutcome::Aborted);
        }

        crossfade(
            &self.slots,
            outgoing,
            incoming,
            &self.timing.crossfade,
            &self.state,
            token,
        )
        .await
    }

    /// Handle a player failure; returns whether the driver keeps running
    ///
    /// Gains and engine state are only touched while holding the fade
    /// lock, so a volume ramp in flight finishes first.
    async fn watchdog(&self, operation: &str, err: PlayerError, token: &CancellationToken) -> bool {
        let failures = self.state.record_failure();
        let interventions_total = self.state.increment_watchdog_interventions();

        warn!(
            "Loop {} failed for '{}' ({}/{} consecutive): {}",
            operation, self.sound_name, failures, self.timing.max_consecutive_failures, err
        );
        self.state.broadcast_event(LoopEvent::diagnostic(
            DiagnosticKind::PlaybackFailure,
            operation,
            err.to_string(),
        ));

        let _fade_guard = tokio::select! {
            biased;
            _ = token.cancelled() => return false,
            guard = self.fade_lock.lock() => guard,
        };

        if failures >= self.timing.max_consecutive_failures {
            error!(
                "Giving up on '{}' after {} consecutive failures",
                self.sound_name, failures
            );
            force_idle(&self.state, &self.slots).await;
            self.state.reset_failures();
            self.state.broadcast_event(LoopEvent::WatchdogIntervention {
                action: WatchdogAction::GaveUp,
                interventions_total,
                timestamp: chrono::Utc::now(),
            });
            return false;
        }

        self.normalize().await;
        self.state.end_transition();
        self.state.set_engine_state(EngineState::SteadyState).await;
        self.state.broadcast_event(LoopEvent::WatchdogIntervention {
            action: WatchdogAction::Recovered,
            interventions_total,
            timestamp: chrono::Utc::now(),
        });
        true
    }

    /// Inactive player stopped at gain 0, active player at the target volume
    async fn normalize(&self) {
        let inactive = self.slots.inactive_index();
        let active = inactive.other();
        let volume = self.state.volume().await;

        if let Err(e) = self.slots.player(inactive).stop().await {
            debug!("Watchdog: stopping {} failed: {}", inactive, e);
        }
        if let Err(e) = self
            .slots
            .set_gain_pair((inactive, 0.0), (active, volume))
            .await
        {
            debug!("Watchdog: gain reset failed: {}", e);
        }
    }
}
