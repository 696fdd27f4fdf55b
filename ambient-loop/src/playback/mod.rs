//! Loop playback: player slots, fade driver, position monitor and engine

pub mod engine;
pub mod fader;
pub mod monitor;
pub mod slots;

pub use engine::{LoopEngine, PauseOptions};
pub use fader::FadeOutcome;
pub use monitor::{evaluate, MonitorFlags, MonitorOutcome, PositionMonitor, TransitionDecision};
pub use slots::{PlayerSlots, SlotIndex};
