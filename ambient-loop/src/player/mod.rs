//! Player capability
//!
//! A single-stream playback primitive with transport and gain control.
//! The engine owns two of these concurrently (one per slot) and never
//! assumes anything about how audio is actually rendered.
//!
//! Contract:
//! - every call may suspend
//! - every call is safe on a stopped or unloaded player: it is a no-op
//!   or fails with `PlayerError::NotReady`, never panics
//! - a loaded player loops its asset on its own when it reaches the end
//! - `duration()` returning `Ok(None)` is a normal answer (streaming or
//!   unmeasured source), not an error

mod virtual_player;

pub use virtual_player::{PlayerCall, TransportState, VirtualPlayer, VirtualPlayerFactory};

use crate::catalog::AssetRef;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors reported by a player backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    /// Player not initialized or nothing loaded
    #[error("player not ready: {0}")]
    NotReady(String),

    /// Backend call failed
    #[error("player failure: {0}")]
    Failure(String),
}

pub type PlayerResult<T> = std::result::Result<T, PlayerError>;

#[async_trait]
pub trait Player: Send + Sync {
    /// Load an asset, resetting the transport to stopped at position zero
    async fn load(&self, asset: &AssetRef) -> PlayerResult<()>;
    /// Start playback from the current position (zero after stop/load)
    async fn play(&self) -> PlayerResult<()>;
    async fn pause(&self) -> PlayerResult<()>;
    async fn resume(&self) -> PlayerResult<()>;
    /// Stop playback and rewind to the beginning
    async fn stop(&self) -> PlayerResult<()>;
    /// Set linear gain (0.0-1.0)
    async fn set_gain(&self, level: f32) -> PlayerResult<()>;
    /// Position within the current loop iteration
    async fn position(&self) -> PlayerResult<Duration>;
    /// Track length, `None` when it cannot be determined
    async fn duration(&self) -> PlayerResult<Option<Duration>>;
}

/// Creates the players owned by the engine's two slots
#[async_trait]
pub trait PlayerFactory: Send + Sync {
    /// Create the player for slot `slot` (0 or 1)
    async fn create_player(&self, slot: usize) -> PlayerResult<Arc<dyn Player>>;
}
