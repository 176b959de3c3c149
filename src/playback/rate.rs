//! Playback rate multiplier

use crate::{ReadalongError, Result};
use std::fmt;

/// Positive, finite speed multiplier shared by audio and highlight timing
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Rate(f64);

impl Rate {
    pub const NORMAL: Rate = Rate(1.0);

    /// Validate a rate; zero, negative and non-finite values are rejected
    pub fn new(rate: f64) -> Result<Self> {
        if rate.is_finite() && rate > 0.0 {
            Ok(Self(rate))
        } else {
            Err(ReadalongError::RateOutOfRange(rate))
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }

    /// Real time (ms) that `clip_ms` of clip time takes at this rate
    pub fn scale(self, clip_ms: u64) -> f64 {
        clip_ms as f64 / self.0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0)
    }
}
