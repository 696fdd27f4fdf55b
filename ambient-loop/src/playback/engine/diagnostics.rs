//! Read-only observers and status snapshot

use super::core::LoopEngine;
use crate::catalog::SoundCatalog;
use crate::config::LoopTiming;
use crate::state::{EngineStatus, SharedState};
use ambient_common::events::LoopEvent;
use std::sync::Arc;
use tokio::sync::broadcast;

impl LoopEngine {
    pub async fn is_playing(&self) -> bool {
        self.state.is_playing().await
    }

    pub async fn current_sound_name(&self) -> Option<String> {
        self.state.current_sound_name().await
    }

    /// Target volume, always within 0.0-1.0
    pub async fn volume(&self) -> f32 {
        self.state.volume().await
    }

    pub async fn is_initialized(&self) -> bool {
        self.current_slots().await.is_some()
    }

    pub async fn status(&self) -> EngineStatus {
        let session = self.state.session().await;
        let active_slot = self
            .current_slots()
            .await
            .map(|slots| slots.active_index().index() as u8);

        EngineStatus {
            state: self.state.engine_state().await,
            sound_name: session.sound_name,
            volume: self.state.volume().await,
            is_playing: session.is_playing,
            is_paused: session.is_paused,
            is_transitioning: self.state.is_transitioning(),
            active_slot,
            loop_count: session.loop_count,
            watchdog_interventions: self.state.watchdog_interventions(),
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<LoopEvent> {
        self.state.subscribe_events()
    }

    pub fn catalog(&self) -> &SoundCatalog {
        &self.catalog
    }

    pub fn timing(&self) -> &LoopTiming {
        &self.timing
    }

    pub fn shared_state(&self) -> Arc<SharedState> {
        Arc::clone(&self.state)
    }
}
