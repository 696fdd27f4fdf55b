//! Fault-injecting player backend
//!
//! Wraps a `VirtualPlayer` and fails selected operations a configurable
//! number of times with `PlayerError::Failure`.

use ambient_loop::catalog::AssetRef;
use ambient_loop::player::{Player, PlayerError, PlayerFactory, PlayerResult, VirtualPlayer};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Player operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerOp {
    Load,
    Play,
    Pause,
    Resume,
    Stop,
    SetGain,
    Position,
    Duration,
}

pub struct FaultyPlayer {
    inner: Arc<VirtualPlayer>,
    /// Remaining injected failures per operation
    faults: Mutex<HashMap<PlayerOp, u32>>,
}

impl FaultyPlayer {
    pub fn new(inner: Arc<VirtualPlayer>) -> Self {
        Self {
            inner,
            faults: Mutex::new(HashMap::new()),
        }
    }

    /// Make the next `count` calls of `op` fail
    pub async fn fail_next(&self, op: PlayerOp, count: u32) {
        self.faults.lock().await.insert(op, count);
    }

    pub async fn clear_faults(&self) {
        self.faults.lock().await.clear();
    }

    pub fn inner(&self) -> &Arc<VirtualPlayer> {
        &self.inner
    }

    async fn check(&self, op: PlayerOp) -> PlayerResult<()> {
        let mut faults = self.faults.lock().await;
        match faults.get_mut(&op) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(PlayerError::Failure(format!("injected {:?} failure", op)))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Player for FaultyPlayer {
    async fn load(&self, asset: &AssetRef) -> PlayerResult<()> {
        self.check(PlayerOp::Load).await?;
        self.inner.load(asset).await
    }

    async fn play(&self) -> PlayerResult<()> {
        self.check(PlayerOp::Play).await?;
        self.inner.play().await
    }

    async fn pause(&self) -> PlayerResult<()> {
        self.check(PlayerOp::Pause).await?;
        self.inner.pause().await
    }

    async fn resume(&self) -> PlayerResult<()> {
        self.check(PlayerOp::Resume).await?;
        self.inner.resume().await
    }

    async fn stop(&self) -> PlayerResult<()> {
        self.check(PlayerOp::Stop).await?;
        self.inner.stop().await
    }

    async fn set_gain(&self, level: f32) -> PlayerResult<()> {
        self.check(PlayerOp::SetGain).await?;
        self.inner.set_gain(level).await
    }

    async fn position(&self) -> PlayerResult<Duration> {
        self.check(PlayerOp::Position).await?;
        self.inner.position().await
    }

    async fn duration(&self) -> PlayerResult<Option<Duration>> {
        self.check(PlayerOp::Duration).await?;
        self.inner.duration().await
    }
}

#[derive(Default)]
pub struct FaultyFactory {
    track_length: Option<Duration>,
    created: Mutex<Vec<Arc<FaultyPlayer>>>,
}

impl FaultyFactory {
    pub fn new(track_length: Option<Duration>) -> Self {
        Self {
            track_length,
            created: Mutex::new(Vec::new()),
        }
    }

    pub async fn players(&self) -> Vec<Arc<FaultyPlayer>> {
        self.created.lock().await.clone()
    }
}

#[async_trait]
impl PlayerFactory for FaultyFactory {
    async fn create_player(&self, slot: usize) -> PlayerResult<Arc<dyn Player>> {
        let inner = Arc::new(VirtualPlayer::new(format!("faulty-{}", slot), self.track_length));
        let player = Arc::new(FaultyPlayer::new(inner));
        self.created.lock().await.push(Arc::clone(&player));
        Ok(player)
    }
}
