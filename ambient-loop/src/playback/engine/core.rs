//! Core loop engine - struct definition and lifecycle
//!
//! **Responsibilities:**
//! - LoopEngine struct definition and construction
//! - Lifecycle control (initialize, dispose)
//! - Session token, loop driver handle and failure reporting helpers

use super::driver::LoopDriver;
use crate::catalog::SoundCatalog;
use crate::config::LoopTiming;
use crate::error::{Error, Result};
use crate::player::{PlayerError, PlayerFactory};
use crate::playback::slots::PlayerSlots;
use crate::state::SharedState;
use ambient_common::events::{EngineState, LoopEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Running loop driver task and the token that stops it
pub(super) struct DriverHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

/// Seamless loop engine
///
/// Constructed once by the host and shared by handle (`Arc<LoopEngine>`).
/// Owns two player slots between `initialize` and `dispose`.
pub struct LoopEngine {
    /// Shared observable state
    pub(super) state: Arc<SharedState>,

    pub(super) catalog: Arc<SoundCatalog>,

    pub(super) timing: LoopTiming,

    pub(super) factory: Arc<dyn PlayerFactory>,

    /// `None` before initialize and after dispose
    pub(super) slots: RwLock<Option<Arc<PlayerSlots>>>,

    /// Serializes public operations
    pub(super) op_lock: Mutex<()>,

    /// Cancels the fade run by the operation holding `op_lock`
    pub(super) session_token: Mutex<CancellationToken>,

    /// Loop driver for the current session
    pub(super) driver: Mutex<Option<DriverHandle>>,

    /// Held by whoever is writing gains outside a public operation's
    /// fade: the driver's crossfade or a volume ramp
    pub(super) fade_lock: Arc<Mutex<()>>,
}

impl LoopEngine {
    pub fn new(
        state: Arc<SharedState>,
        catalog: SoundCatalog,
        timing: LoopTiming,
        factory: Arc<dyn PlayerFactory>,
    ) -> Self {
        info!(
            "Creating loop engine ({} sounds, lead time {:?}, crossfade {:?} {})",
            catalog.names().len(),
            timing.preload_lead_time,
            timing.crossfade.duration,
            timing.crossfade.curve
        );
        Self {
            state,
            catalog: Arc::new(catalog),
            timing,
            factory,
            slots: RwLock::new(None),
            op_lock: Mutex::new(()),
            session_token: Mutex::new(CancellationToken::new()),
            driver: Mutex::new(None),
            fade_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Acquire both players
    ///
    /// Calling it again while initialized is a no-op.
    pub async fn initialize(&self) {
        let _ = self.try_initialize().await;
    }

    pub async fn try_initialize(&self) -> Result<()> {
        let result = self.initialize_inner().await;
        self.report("initialize", &result);
        result
    }

    async fn initialize_inner(&self) -> Result<()> {
        let _guard = self.op_lock.lock().await;
        if self.slots.read().await.is_some() {
            debug!("Loop engine already initialized");
            return Ok(());
        }

        let first = self.factory.create_player(0).await?;
        let second = self.factory.create_player(1).await?;
        *self.slots.write().await = Some(Arc::new(PlayerSlots::new(first, second)));

        info!("Loop engine initialized with 2 player slots");
        Ok(())
    }

    /// Stop playback, cancel all timers and release both players
    pub async fn dispose(&self) {
        self.cancel_session().await;
        let _guard = self.op_lock.lock().await;

        let result = self.stop_locked().await;
        self.report("dispose", &result);

        self.cancel_driver().await;
        if self.slots.write().await.take().is_some() {
            info!("Loop engine disposed");
        }
    }

    /// Slots, or `PlayerNotReady` when not initialized
    pub(super) async fn slots(&self) -> Result<Arc<PlayerSlots>> {
        self.slots
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::PlayerNotReady("engine not initialized".to_string()))
    }

    pub(super) async fn current_slots(&self) -> Option<Arc<PlayerSlots>> {
        self.slots.read().await.clone()
    }

    /// Abort the fade owned by the operation currently holding `op_lock`
    pub(super) async fn cancel_session(&self) {
        self.session_token.lock().await.cancel();
    }

    /// Install a fresh token for the calling operation's fades
    pub(super) async fn fresh_session_token(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.session_token.lock().await = token.clone();
        token
    }

    /// Start the loop driver for the current session
    ///
    /// Any previous driver is stopped first so at most one polling loop
    /// is ever active.
    pub(super) async fn spawn_driver(
        &self,
        slots: Arc<PlayerSlots>,
        sound_name: String,
        track_duration: Option<Duration>,
    ) {
        self.cancel_driver().await;

        let token = CancellationToken::new();
        let driver = LoopDriver {
            state: Arc::clone(&self.state),
            slots,
            timing: self.timing.clone(),
            fade_lock: Arc::clone(&self.fade_lock),
            sound_name,
            track_duration,
        };
        let task = tokio::spawn(driver.run(token.clone()));
        *self.driver.lock().await = Some(DriverHandle { token, task });
    }

    /// Cancel the loop driver and wait until it has exited
    pub(super) async fn cancel_driver(&self) {
        let handle = self.driver.lock().await.take();
        if let Some(DriverHandle { token, task }) = handle {
            token.cancel();
            if let Err(e) = task.await {
                warn!("Loop driver task ended abnormally: {}", e);
            }
        }
    }

    /// Log a failed operation and publish it as a diagnostic event
    pub(super) fn report(&self, operation: &str, result: &Result<()>) {
        if let Err(e) = result {
            warn!("Loop engine {} failed: {}", operation, e);
            self.state.broadcast_event(LoopEvent::diagnostic(
                e.diagnostic_kind(),
                operation,
                e.to_string(),
            ));
        }
    }

    /// Fall back to `Idle` after a player failure, returning the error to report
    pub(super) async fn fail_to_idle(&self, slots: &PlayerSlots, err: PlayerError) -> Error {
        force_idle(&self.state, slots).await;
        Error::from(err)
    }
}

/// Reset to the nearest safe state: both players stopped at gain 0, no session
///
/// Player failures here are logged and ignored.
pub(super) async fn force_idle(state: &SharedState, slots: &PlayerSlots) {
    if let Err(e) = slots.stop_both().await {
        debug!("force_idle: stop failed: {}", e);
    }
    if let Err(e) = slots.set_both_gains(0.0).await {
        debug!("force_idle: gain reset failed: {}", e);
    }

    let sound_name = state.current_sound_name().await;
    state.end_transition();
    state.reset_session().await;
    state.set_engine_state(EngineState::Idle).await;

    if let Some(sound_name) = sound_name {
        state.broadcast_event(LoopEvent::SoundStopped {
            sound_name,
            timestamp: chrono::Utc::now(),
        });
    }
}
