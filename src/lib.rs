//! readalong - synchronized read-along narration
//!
//! Plays a document's pre-recorded clips in order while highlighting the
//! text span being spoken, at an adjustable rate, across pause, resume,
//! seek-by-click and clip-to-clip transitions.

pub mod alignment;
pub mod clock;
pub mod config;
pub mod control;
pub mod error;
pub mod manuscript;
pub mod narration;
pub mod playback;

pub use error::{ReadalongError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "readalong";
