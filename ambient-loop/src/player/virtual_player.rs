//! Clock-driven player backend
//!
//! Tracks transport state, gain and position on the tokio clock without
//! rendering audio. Position advances while playing and wraps at the
//! configured track length; with no track length the duration is reported
//! as unknown and position grows without bound.
//!
//! Every transport and gain call is recorded so the engine's behavior can
//! be inspected. Because it reads `tokio::time::Instant`, it follows the
//! paused test clock.

use super::{Player, PlayerError, PlayerFactory, PlayerResult};
use crate::catalog::AssetRef;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Transport state of a virtual player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Playing,
    Paused,
}

/// A recorded player call
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCall {
    Load(AssetRef),
    Play,
    Pause,
    Resume,
    Stop,
    SetGain(f32),
}

#[derive(Debug)]
struct VirtualState {
    asset: Option<AssetRef>,
    transport: TransportState,
    gain: f32,
    /// Elapsed play time accumulated before `started_at`
    offset: Duration,
    started_at: Option<Instant>,
    calls: Vec<PlayerCall>,
}

impl VirtualState {
    fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(started) => self.offset + started.elapsed(),
            None => self.offset,
        }
    }
}

#[derive(Debug)]
pub struct VirtualPlayer {
    label: String,
    track_length: Option<Duration>,
    state: Mutex<VirtualState>,
}

impl VirtualPlayer {
    /// Create a player; `track_length == None` reports an unknown duration
    pub fn new(label: impl Into<String>, track_length: Option<Duration>) -> Self {
        Self {
            label: label.into(),
            track_length: track_length.filter(|length| !length.is_zero()),
            state: Mutex::new(VirtualState {
                asset: None,
                transport: TransportState::Stopped,
                gain: 0.0,
                offset: Duration::ZERO,
                started_at: None,
                calls: Vec::new(),
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub async fn gain(&self) -> f32 {
        self.state.lock().await.gain
    }

    pub async fn transport(&self) -> TransportState {
        self.state.lock().await.transport
    }

    pub async fn asset(&self) -> Option<AssetRef> {
        self.state.lock().await.asset.clone()
    }

    /// All recorded calls, oldest first
    pub async fn calls(&self) -> Vec<PlayerCall> {
        self.state.lock().await.calls.clone()
    }

    /// Gains applied via `set_gain`, oldest first
    pub async fn gain_history(&self) -> Vec<f32> {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter_map(|call| match call {
                PlayerCall::SetGain(level) => Some(*level),
                _ => None,
            })
            .collect()
    }

    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }
}

#[async_trait]
impl Player for VirtualPlayer {
    async fn load(&self, asset: &AssetRef) -> PlayerResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(PlayerCall::Load(asset.clone()));
        state.asset = Some(asset.clone());
        state.transport = TransportState::Stopped;
        state.offset = Duration::ZERO;
        state.started_at = None;
        debug!("{}: loaded {}", self.label, asset);
        Ok(())
    }

    async fn play(&self) -> PlayerResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(PlayerCall::Play);
        if state.asset.is_none() {
            return Err(PlayerError::NotReady(format!("{}: nothing loaded", self.label)));
        }
        if state.transport != TransportState::Playing {
            state.transport = TransportState::Playing;
            state.started_at = Some(Instant::now());
        }
        Ok(())
    }

    async fn pause(&self) -> PlayerResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(PlayerCall::Pause);
        if state.transport == TransportState::Playing {
            state.offset = state.elapsed();
            state.started_at = None;
            state.transport = TransportState::Paused;
        }
        Ok(())
    }

    async fn resume(&self) -> PlayerResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(PlayerCall::Resume);
        if state.transport == TransportState::Paused {
            state.started_at = Some(Instant::now());
            state.transport = TransportState::Playing;
        }
        Ok(())
    }

    async fn stop(&self) -> PlayerResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(PlayerCall::Stop);
        state.transport = TransportState::Stopped;
        state.offset = Duration::ZERO;
        state.started_at = None;
        Ok(())
    }

    async fn set_gain(&self, level: f32) -> PlayerResult<()> {
        let mut state = self.state.lock().await;
        let level = level.clamp(0.0, 1.0);
        state.calls.push(PlayerCall::SetGain(level));
        state.gain = level;
        Ok(())
    }

    async fn position(&self) -> PlayerResult<Duration> {
        let state = self.state.lock().await;
        let elapsed = state.elapsed();
        Ok(match self.track_length {
            Some(length) => {
                let wrapped = elapsed.as_nanos() % length.as_nanos();
                Duration::from_nanos(u64::try_from(wrapped).unwrap_or(u64::MAX))
            }
            None => elapsed,
        })
    }

    async fn duration(&self) -> PlayerResult<Option<Duration>> {
        let state = self.state.lock().await;
        Ok(state.asset.as_ref().and(self.track_length))
    }
}

/// Factory handing out virtual players and keeping handles to them
#[derive(Debug, Default)]
pub struct VirtualPlayerFactory {
    track_length: Option<Duration>,
    created: Mutex<Vec<Arc<VirtualPlayer>>>,
}

impl VirtualPlayerFactory {
    pub fn new(track_length: Option<Duration>) -> Self {
        Self {
            track_length,
            created: Mutex::new(Vec::new()),
        }
    }

    /// Players created so far, in creation order
    pub async fn players(&self) -> Vec<Arc<VirtualPlayer>> {
        self.created.lock().await.clone()
    }
}

#[async_trait]
impl PlayerFactory for VirtualPlayerFactory {
    async fn create_player(&self, slot: usize) -> PlayerResult<Arc<dyn Player>> {
        let player = Arc::new(VirtualPlayer::new(format!("slot-{}", slot), self.track_length));
        self.created.lock().await.push(Arc::clone(&player));
        Ok(player)
    }
}
