//! Loop engine
//!
//! **Module Structure:**
//! - `core.rs`: engine struct, lifecycle (initialize, dispose), shared helpers
//! - `transport.rs`: public operations (play, pause, resume, stop, set_volume)
//! - `driver.rs`: per-session loop driver (monitor, crossfade, watchdog)
//! - `diagnostics.rs`: observers and status snapshot
//!
//! Public operations are serialized by an internal operation lock. The
//! loop driver runs on its own task and never takes that lock; operations
//! that need it quiet cancel it and wait for it to exit first.

mod core;
mod diagnostics;
mod driver;
mod transport;

pub use self::core::LoopEngine;
pub use transport::PauseOptions;
