//! # Ambient Loop Player Library (ambient-loop)
//!
//! Seamless looped playback of ambient sounds using two player slots and
//! S-curve crossfades at each loop boundary.
//!
//! **Architecture:** the [`LoopEngine`] owns two [`player::Player`]s,
//! fades one in on start, watches its position and crossfades into the
//! other shortly before the track ends. An HTTP/SSE control surface is in
//! [`api`].

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod playback;
pub mod player;
pub mod state;

pub use catalog::{AssetRef, SoundCatalog, SoundDefinition};
pub use config::LoopTiming;
pub use error::{Error, Result};
pub use playback::{LoopEngine, PauseOptions};
pub use state::{EngineStatus, SharedState};
