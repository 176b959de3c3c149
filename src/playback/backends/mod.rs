//! Playback backends

// Clock-driven stand-in for an audio output
pub mod simulated;

pub use simulated::{SimulatedBackend, SimulatedFactory};
