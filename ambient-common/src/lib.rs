//! # Ambient Common Library
//!
//! Shared code for the ambient loop player:
//! - Fade curve definitions and gain envelopes
//! - Event types (LoopEvent enum) and the EventBus
//! - Bootstrap configuration loading
//! - Error types and timestamp helpers

pub mod config;
pub mod error;
pub mod events;
pub mod fade_curves;
pub mod time;

pub use error::{Error, Result};
pub use fade_curves::{FadeCurve, FadeProfile};
