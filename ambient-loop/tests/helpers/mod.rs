//! Test helpers for ambient-loop integration tests
//!
//! - engine builders over the virtual and fault-injecting backends
//! - event collection from the engine's broadcast channel

#![allow(dead_code)]

pub mod fault_injection;

pub use fault_injection::{FaultyFactory, FaultyPlayer, PlayerOp};

use ambient_common::events::LoopEvent;
use ambient_loop::player::{PlayerFactory, VirtualPlayer, VirtualPlayerFactory};
use ambient_loop::{LoopEngine, LoopTiming, SharedState, SoundCatalog};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

pub const VOLUME: f32 = 0.75;

fn engine_with(factory: Arc<dyn PlayerFactory>) -> Arc<LoopEngine> {
    Arc::new(LoopEngine::new(
        Arc::new(SharedState::new(VOLUME)),
        SoundCatalog::reference(),
        LoopTiming::default(),
        factory,
    ))
}

/// Initialized engine over virtual players, plus handles to both players
pub async fn virtual_engine(
    track_length: Option<Duration>,
) -> (Arc<LoopEngine>, Arc<VirtualPlayer>, Arc<VirtualPlayer>) {
    let factory = Arc::new(VirtualPlayerFactory::new(track_length));
    let engine = engine_with(factory.clone());
    engine.initialize().await;

    let players = factory.players().await;
    assert_eq!(players.len(), 2, "initialize must create both slot players");
    (engine, Arc::clone(&players[0]), Arc::clone(&players[1]))
}

/// Initialized engine over fault-injecting players
pub async fn faulty_engine(
    track_length: Option<Duration>,
) -> (Arc<LoopEngine>, Arc<FaultyPlayer>, Arc<FaultyPlayer>) {
    let factory = Arc::new(FaultyFactory::new(track_length));
    let engine = engine_with(factory.clone());
    engine.initialize().await;

    let players = factory.players().await;
    assert_eq!(players.len(), 2, "initialize must create both slot players");
    (engine, Arc::clone(&players[0]), Arc::clone(&players[1]))
}

/// Engine that was never initialized
pub fn uninitialized_engine() -> Arc<LoopEngine> {
    engine_with(Arc::new(VirtualPlayerFactory::new(None)))
}

/// Everything currently queued on `rx`
pub fn drain_events(rx: &mut broadcast::Receiver<LoopEvent>) -> Vec<LoopEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Variant names of the queued events, in order
pub fn event_types(rx: &mut broadcast::Receiver<LoopEvent>) -> Vec<&'static str> {
    drain_events(rx).iter().map(LoopEvent::event_type).collect()
}

/// Wait (on the test clock) for the first event matching `predicate`
pub async fn wait_for_event<F>(
    rx: &mut broadcast::Receiver<LoopEvent>,
    limit: Duration,
    predicate: F,
) -> Option<LoopEvent>
where
    F: Fn(&LoopEvent) -> bool,
{
    tokio::time::timeout(limit, async {
        loop {
            match rx.recv().await {
                Ok(event) if predicate(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .await
    .ok()
    .flatten()
}
