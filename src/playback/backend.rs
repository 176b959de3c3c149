//! Playback backend abstraction
//!
//! The engine never decodes audio. Each clip is an opaque handle with
//! transport operations and a queue of notifications, opened fresh for every
//! playback session.

use crate::Result;

/// Notifications emitted by a playback handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    /// The resource is loaded and can start playing
    CanPlay,
    /// Playback reached the end of the clip
    Ended,
    /// The resource could not be loaded or played
    LoadFailed(String),
}

/// One playable audio clip
///
/// Mirrors the capability set of a host media element. Positions are in
/// milliseconds of clip time, unscaled by the rate.
pub trait PlaybackBackend {
    /// Locator this handle was opened from
    fn locator(&self) -> &str;

    /// Start or continue playback from the current position
    fn play(&mut self) -> Result<()>;

    /// Pause playback, retaining the current position
    fn pause(&mut self) -> Result<()>;

    /// Whether the handle is in the playing media state
    fn is_playing(&self) -> bool;

    /// Current clip position (ms)
    fn current_time_ms(&self) -> u64;

    /// Move to a clip position (ms)
    fn set_current_time_ms(&mut self, ms: u64);

    /// Current playback rate multiplier
    fn rate(&self) -> f64;

    /// Set playback rate multiplier
    fn set_rate(&mut self, rate: f64);

    /// Take the next pending notification, if any
    fn poll_event(&mut self) -> Option<BackendEvent>;
}

/// Opens playback handles from resource locators
pub trait BackendFactory {
    fn open(&mut self, locator: &str) -> Result<Box<dyn PlaybackBackend>>;
}
