//! Public transport operations
//!
//! Each operation has a `try_*` form returning `Result` and a silent form
//! that only logs and publishes a diagnostic. Both report failures the
//! same way; the silent form just drops the `Result`.
//!
//! `stop`, `dispose` and `play` of a different sound cancel the fade owned
//! by whichever operation is running before queueing for the operation
//! lock, so they never wait out a fade they are about to undo.

use super::core::LoopEngine;
use crate::catalog::SoundDefinition;
use crate::error::{Error, Result};
use crate::player::PlayerResult;
use crate::playback::fader::{fade_out_both, ramp_slot, FadeOutcome};
use crate::playback::slots::PlayerSlots;
use crate::state::PlaybackSession;
use ambient_common::events::{DiagnosticKind, EngineState, LoopEvent};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Options for [`LoopEngine::pause_with`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PauseOptions {
    /// Ramp the audible gain to 0 before pausing; resume fades back in
    pub fade_out: bool,
}

impl LoopEngine {
    /// Start looping `sound_name`
    ///
    /// A no-op when that sound is already playing, a resume when it is
    /// paused. A different sound is faded out and torn down first.
    pub async fn play(&self, sound_name: &str) {
        let _ = self.try_play(sound_name).await;
    }

    pub async fn try_play(&self, sound_name: &str) -> Result<()> {
        let result = self.play_inner(sound_name).await;
        self.report("play", &result);
        result
    }

    async fn play_inner(&self, sound_name: &str) -> Result<()> {
        // Rejected before any state change or player call
        let definition = self.catalog.resolve(sound_name)?.clone();

        let current = self.state.current_sound_name().await;
        if current.as_deref().is_some_and(|name| name != sound_name) {
            self.cancel_session().await;
        }

        let _guard = self.op_lock.lock().await;
        // Resolved under the lock: a dispose queued ahead of us releases them
        let slots = self.slots().await?;
        let session = self.state.session().await;

        if session.sound_name.as_deref() == Some(sound_name) {
            if session.is_paused {
                return self.resume_locked(&slots).await;
            }
            debug!("'{}' already playing, ignoring play", sound_name);
            return Ok(());
        }

        if let Some(previous) = &session.sound_name {
            info!("Switching sound: '{}' -> '{}'", previous, sound_name);
            if let Err(e) = self.stop_locked().await {
                warn!("Teardown of '{}' failed, starting anyway: {}", previous, e);
            }
        }

        self.start_locked(&slots, &definition).await
    }

    async fn start_locked(
        &self,
        slots: &Arc<PlayerSlots>,
        definition: &SoundDefinition,
    ) -> Result<()> {
        let token = self.fresh_session_token().await;
        let session_id = Uuid::new_v4();
        info!("Starting '{}' (session {})", definition.name, session_id);

        self.state.set_engine_state(EngineState::Starting).await;
        self.state
            .update_session(|s| {
                *s = PlaybackSession {
                    session_id: Some(session_id),
                    sound_name: Some(definition.name.clone()),
                    ..PlaybackSession::default()
                };
            })
            .await;
        self.state.reset_failures();

        match self.start_players(slots, definition, &token).await {
            Ok(FadeOutcome::Completed) => {}
            Ok(FadeOutcome::Aborted) => {
                debug!("Start of '{}' superseded during fade-in", definition.name);
                return Ok(());
            }
            Err(e) => return Err(self.fail_to_idle(slots, e).await),
        }

        self.state.set_engine_state(EngineState::SteadyState).await;
        self.state.broadcast_event(LoopEvent::SoundStarted {
            sound_name: definition.name.clone(),
            session_id,
            timestamp: chrono::Utc::now(),
        });

        let track_duration = self.state.session().await.track_duration;
        self.spawn_driver(Arc::clone(slots), definition.name.clone(), track_duration)
            .await;
        Ok(())
    }

    /// Load both slots, start them silent and fade the active slot in
    async fn start_players(
        &self,
        slots: &PlayerSlots,
        definition: &SoundDefinition,
        token: &CancellationToken,
    ) -> PlayerResult<FadeOutcome> {
        slots.load_both(&definition.asset).await?;
        slots.set_both_gains(0.0).await?;
        slots.play_both().await?;
        self.state.update_session(|s| s.is_playing = true).await;

        let track_duration = slots.active_player().duration().await?;
        if track_duration.is_none() {
            warn!(
                "Duration of '{}' unavailable, assuming {:?}",
                definition.name, self.timing.fallback_duration
            );
            self.state.broadcast_event(LoopEvent::diagnostic(
                DiagnosticKind::DurationUnavailable,
                "play",
                format!("using fallback duration {:?}", self.timing.fallback_duration),
            ));
        }
        self.state
            .update_session(|s| s.track_duration = track_duration)
            .await;

        let volume = self.state.volume().await;
        ramp_slot(slots, slots.active_index(), 0.0, volume, &self.timing.fade_in, token).await
    }

    /// Pause immediately, without a fade
    pub async fn pause(&self) {
        self.pause_with(PauseOptions::default()).await;
    }

    pub async fn pause_with(&self, options: PauseOptions) {
        let _ = self.try_pause_with(options).await;
    }

    pub async fn try_pause_with(&self, options: PauseOptions) -> Result<()> {
        let result = self.pause_inner(options).await;
        self.report("pause", &result);
        result
    }

    async fn pause_inner(&self, options: PauseOptions) -> Result<()> {
        let _guard = self.op_lock.lock().await;
        let slots = self.slots().await?;

        let session = self.state.session().await;
        let Some(sound_name) = session.sound_name.clone() else {
            debug!("Nothing playing, ignoring pause");
            return Ok(());
        };
        if session.is_paused || !session.is_playing {
            debug!("'{}' already paused, ignoring pause", sound_name);
            return Ok(());
        }

        self.cancel_driver().await;

        let token = self.fresh_session_token().await;
        if let Err(e) = self.pause_players(&slots, options, &token).await {
            return Err(self.fail_to_idle(&slots, e).await);
        }
        if token.is_cancelled() {
            debug!("Pause of '{}' superseded", sound_name);
            return Ok(());
        }

        self.state
            .update_session(|s| {
                s.is_playing = false;
                s.is_paused = true;
                s.paused_with_fade = options.fade_out;
            })
            .await;
        self.state.set_engine_state(EngineState::SteadyState).await;

        info!("Paused '{}' (fade: {})", sound_name, options.fade_out);
        self.state.broadcast_event(LoopEvent::Paused {
            sound_name,
            faded: options.fade_out,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    async fn pause_players(
        &self,
        slots: &PlayerSlots,
        options: PauseOptions,
        token: &CancellationToken,
    ) -> PlayerResult<()> {
        if self.state.is_transitioning() {
            self.settle_crossfade(slots).await?;
        }
        if options.fade_out
            && fade_out_both(slots, &self.timing.fade_out, token).await? == FadeOutcome::Aborted
        {
            return Ok(());
        }
        slots.pause_both().await
    }

    /// Finish an interrupted crossfade at once: the incoming slot becomes
    /// active at the target volume and the outgoing one is stopped silent
    async fn settle_crossfade(&self, slots: &PlayerSlots) -> PlayerResult<()> {
        let outgoing = slots.active_index();
        let incoming = outgoing.other();
        let volume = self.state.volume().await;

        slots.player(incoming).play().await?;
        let active = slots.swap_roles();
        slots.player(outgoing).stop().await?;
        slots
            .set_gain_pair((outgoing, 0.0), (incoming, volume))
            .await?;
        self.state.end_transition();

        let mut loop_count = 0;
        let mut sound_name = String::new();
        self.state
            .update_session(|s| {
                s.loop_count += 1;
                loop_count = s.loop_count;
                sound_name = s.sound_name.clone().unwrap_or_default();
            })
            .await;

        debug!("Settled interrupted crossfade, {} active", active);
        self.state.broadcast_event(LoopEvent::CrossfadeCompleted {
            sound_name,
            active_slot: active.index() as u8,
            loop_count,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    pub async fn resume(&self) {
        let _ = self.try_resume().await;
    }

    pub async fn try_resume(&self) -> Result<()> {
        let result = self.resume_inner().await;
        self.report("resume", &result);
        result
    }

    async fn resume_inner(&self) -> Result<()> {
        let _guard = self.op_lock.lock().await;
        let slots = self.slots().await?;
        self.resume_locked(&slots).await
    }

    /// Resume a paused session; monitoring restarts from the current position
    pub(super) async fn resume_locked(&self, slots: &Arc<PlayerSlots>) -> Result<()> {
        let session = self.state.session().await;
        let Some(sound_name) = session.sound_name.clone() else {
            debug!("Nothing paused, ignoring resume");
            return Ok(());
        };
        if !session.is_paused {
            debug!("'{}' not paused, ignoring resume", sound_name);
            return Ok(());
        }

        let token = self.fresh_session_token().await;
        match self.resume_players(slots, session.paused_with_fade, &token).await {
            Ok(FadeOutcome::Completed) => {}
            Ok(FadeOutcome::Aborted) => {
                debug!("Resume of '{}' superseded during fade-in", sound_name);
                return Ok(());
            }
            Err(e) => return Err(self.fail_to_idle(slots, e).await),
        }

        self.state.set_engine_state(EngineState::SteadyState).await;
        info!("Resumed '{}'", sound_name);
        self.state.broadcast_event(LoopEvent::Resumed {
            sound_name: sound_name.clone(),
            timestamp: chrono::Utc::now(),
        });

        self.spawn_driver(Arc::clone(slots), sound_name, session.track_duration)
            .await;
        Ok(())
    }

    async fn resume_players(
        &self,
        slots: &PlayerSlots,
        fade_in: bool,
        token: &CancellationToken,
    ) -> PlayerResult<FadeOutcome> {
        let active = slots.active_index();
        let volume = self.state.volume().await;

        if !fade_in {
            // Volume may have changed while paused
            slots.set_gain(active, volume).await?;
        }
        slots.resume_both().await?;
        self.state
            .update_session(|s| {
                s.is_playing = true;
                s.is_paused = false;
                s.paused_with_fade = false;
            })
            .await;

        if fade_in {
            ramp_slot(slots, active, 0.0, volume, &self.timing.fade_in, token).await
        } else {
            Ok(FadeOutcome::Completed)
        }
    }

    /// Fade out, stop both players and clear the session
    ///
    /// A no-op when already stopped.
    pub async fn stop(&self) {
        let _ = self.try_stop().await;
    }

    pub async fn try_stop(&self) -> Result<()> {
        self.cancel_session().await;
        let result = {
            let _guard = self.op_lock.lock().await;
            self.stop_locked().await
        };
        self.report("stop", &result);
        result
    }

    /// Tear down the current session; caller holds `op_lock`
    ///
    /// Always ends in `Idle`. A player failure during teardown is returned
    /// after the session has been cleared.
    pub(super) async fn stop_locked(&self) -> Result<()> {
        self.cancel_driver().await;

        if self.state.engine_state().await == EngineState::Idle {
            debug!("Already stopped, ignoring stop");
            return Ok(());
        }
        let Some(slots) = self.current_slots().await else {
            self.state.reset_session().await;
            self.state.set_engine_state(EngineState::Idle).await;
            return Err(Error::PlayerNotReady("engine not initialized".to_string()));
        };

        self.state.set_engine_state(EngineState::Stopping).await;
        let session = self.state.session().await;
        let result = self.stop_players(&slots, session.is_playing).await;

        self.state.end_transition();
        self.state.reset_session().await;
        self.state.set_engine_state(EngineState::Idle).await;

        if let Some(sound_name) = session.sound_name {
            info!("Stopped '{}'", sound_name);
            self.state.broadcast_event(LoopEvent::SoundStopped {
                sound_name,
                timestamp: chrono::Utc::now(),
            });
        }
        result.map_err(Error::from)
    }

    async fn stop_players(&self, slots: &PlayerSlots, audible: bool) -> PlayerResult<()> {
        let fade_result = if audible {
            // Own token: the teardown fade always runs to silence
            fade_out_both(slots, &self.timing.fade_out, &CancellationToken::new())
                .await
                .map(|_| ())
        } else {
            Ok(())
        };

        let stop_result = slots.stop_both().await;
        let gain_result = slots.set_both_gains(0.0).await;
        fade_result.and(stop_result).and(gain_result)
    }

    /// Set the target volume (clamped to 0.0-1.0)
    ///
    /// While playing steadily the active gain ramps to the new target.
    /// During a crossfade both sides pick it up on the next step; while
    /// paused or stopped it is only stored.
    pub async fn set_volume(&self, level: f32) {
        let _ = self.try_set_volume(level).await;
    }

    pub async fn try_set_volume(&self, level: f32) -> Result<()> {
        let result = self.set_volume_inner(level).await;
        self.report("set_volume", &result);
        result
    }

    async fn set_volume_inner(&self, level: f32) -> Result<()> {
        let volume = self.state.set_volume(level).await;
        debug!("Volume set to {:.3}", volume);
        self.state.broadcast_event(LoopEvent::VolumeChanged {
            volume,
            timestamp: chrono::Utc::now(),
        });

        let _guard = self.op_lock.lock().await;
        let Some(slots) = self.current_slots().await else {
            return Ok(());
        };

        // The driver changes engine state only while holding the fade lock,
        // so the state checked below holds until the ramp ends
        let Ok(_fade_guard) = self.fade_lock.try_lock() else {
            debug!("Loop driver owns the gains, stored volume only");
            return Ok(());
        };
        let steady = self.state.engine_state().await == EngineState::SteadyState;
        if !steady || !self.state.is_playing().await || self.state.is_transitioning() {
            return Ok(());
        }

        let token = self.fresh_session_token().await;
        let active = slots.active_index();
        let target = self.state.volume().await;
        ramp_slot(
            &slots,
            active,
            slots.gain(active),
            target,
            &self.timing.volume_ramp,
            &token,
        )
        .await?;
        Ok(())
    }
}
