//! Player slots
//!
//! Two interchangeable player ownership slots. Roles are an index that
//! flips rather than swapped references, so "exactly one active slot"
//! holds by construction. Each slot owns its player for the engine's
//! lifetime and remembers the last gain successfully applied to it.

use crate::catalog::AssetRef;
use crate::player::{Player, PlayerResult};
use serde::Serialize;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;

/// Index of one of the two slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SlotIndex {
    Zero,
    One,
}

impl SlotIndex {
    pub fn index(self) -> usize {
        match self {
            SlotIndex::Zero => 0,
            SlotIndex::One => 1,
        }
    }

    pub fn other(self) -> SlotIndex {
        match self {
            SlotIndex::Zero => SlotIndex::One,
            SlotIndex::One => SlotIndex::Zero,
        }
    }

    fn from_bits(bits: u8) -> SlotIndex {
        if bits & 1 == 0 {
            SlotIndex::Zero
        } else {
            SlotIndex::One
        }
    }
}

impl std::fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot {}", self.index())
    }
}

pub struct PlayerSlots {
    players: [Arc<dyn Player>; 2],
    active: AtomicU8,
    /// f32 bits of the last applied gain per slot
    gains: [AtomicU32; 2],
}

impl PlayerSlots {
    /// Slot 0 starts active
    pub fn new(first: Arc<dyn Player>, second: Arc<dyn Player>) -> Self {
        Self {
            players: [first, second],
            active: AtomicU8::new(0),
            gains: [AtomicU32::new(0f32.to_bits()), AtomicU32::new(0f32.to_bits())],
        }
    }

    pub fn active_index(&self) -> SlotIndex {
        SlotIndex::from_bits(self.active.load(Ordering::Acquire))
    }

    pub fn inactive_index(&self) -> SlotIndex {
        self.active_index().other()
    }

    pub fn player(&self, slot: SlotIndex) -> Arc<dyn Player> {
        Arc::clone(&self.players[slot.index()])
    }

    pub fn active_player(&self) -> Arc<dyn Player> {
        self.player(self.active_index())
    }

    /// Flip roles, returning the newly active slot
    pub fn swap_roles(&self) -> SlotIndex {
        let previous = self.active.fetch_xor(1, Ordering::AcqRel);
        SlotIndex::from_bits(previous).other()
    }

    /// Last gain applied to `slot`
    pub fn gain(&self, slot: SlotIndex) -> f32 {
        f32::from_bits(self.gains[slot.index()].load(Ordering::Acquire))
    }

    fn record_gain(&self, slot: SlotIndex, level: f32) {
        self.gains[slot.index()].store(level.to_bits(), Ordering::Release);
    }

    pub async fn set_gain(&self, slot: SlotIndex, level: f32) -> PlayerResult<()> {
        let level = level.clamp(0.0, 1.0);
        self.players[slot.index()].set_gain(level).await?;
        self.record_gain(slot, level);
        Ok(())
    }

    /// Apply two gains as one step
    ///
    /// Both calls are issued before either is awaited, so neither side is
    /// audibly applied ahead of the other.
    pub async fn set_gain_pair(
        &self,
        first: (SlotIndex, f32),
        second: (SlotIndex, f32),
    ) -> PlayerResult<()> {
        let (first_result, second_result) =
            tokio::join!(self.set_gain(first.0, first.1), self.set_gain(second.0, second.1));
        first_result.and(second_result)
    }

    pub async fn set_both_gains(&self, level: f32) -> PlayerResult<()> {
        self.set_gain_pair((SlotIndex::Zero, level), (SlotIndex::One, level)).await
    }

    pub async fn load_both(&self, asset: &AssetRef) -> PlayerResult<()> {
        let (a, b) = tokio::join!(self.players[0].load(asset), self.players[1].load(asset));
        a.and(b)
    }

    pub async fn play_both(&self) -> PlayerResult<()> {
        let (a, b) = tokio::join!(self.players[0].play(), self.players[1].play());
        a.and(b)
    }

    pub async fn pause_both(&self) -> PlayerResult<()> {
        let (a, b) = tokio::join!(self.players[0].pause(), self.players[1].pause());
        a.and(b)
    }

    /// Resume both; a stopped player ignores resume
    pub async fn resume_both(&self) -> PlayerResult<()> {
        let (a, b) = tokio::join!(self.players[0].resume(), self.players[1].resume());
        a.and(b)
    }

    pub async fn stop_both(&self) -> PlayerResult<()> {
        let (a, b) = tokio::join!(self.players[0].stop(), self.players[1].stop());
        a.and(b)
    }
}
