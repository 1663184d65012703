//! # Vibe DJ Common Library
//!
//! Shared code for the Vibe DJ service crates:
//! - Bootstrap configuration (TOML + environment + compiled defaults)
//! - Event types (VibeEvent enum) and the event bus
//! - API authentication (timestamp + hash)
//! - Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
pub use events::{EventBus, PlaybackState, VibeEvent};
