//! HTTP control surface for the loop engine
//!
//! JSON endpoints for transport and volume control plus an SSE stream of
//! engine events.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, run, AppContext};
