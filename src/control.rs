//! Transport commands
//!
//! Text commands for driving a `Narrator` from a terminal or a script, one
//! per line.

use crate::alignment::SpanId;
use crate::playback::{Narrator, Rate, TransportState};
use crate::{ReadalongError, Result};
use log::debug;

/// A single transport command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Pause,
    Resume,
    /// Pause when playing, resume otherwise
    Toggle,
    Rate(f64),
    Faster,
    Slower,
    Seek(SpanId),
    /// Let playback run for this many milliseconds
    Wait(u64),
    Stop,
    Status,
    Quit,
}

impl Command {
    /// Parse one command line; blank lines and `#` comments yield `None`
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let mut parts = line.split_whitespace();
        let word = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next();

        let cmd = match (word.as_str(), arg) {
            ("pause", None) => Command::Pause,
            ("resume" | "play", None) => Command::Resume,
            ("toggle" | "space", None) => Command::Toggle,
            ("rate" | "speed", Some(r)) => Command::Rate(
                r.parse()
                    .map_err(|_| ReadalongError::Other(format!("Invalid rate: {}", r)))?,
            ),
            ("faster" | "+", None) => Command::Faster,
            ("slower" | "-", None) => Command::Slower,
            ("seek" | "click", Some(id)) => Command::Seek(SpanId::from(id)),
            ("wait", Some(ms)) => Command::Wait(
                ms.parse()
                    .map_err(|_| ReadalongError::Other(format!("Invalid duration: {}", ms)))?,
            ),
            ("stop", None) => Command::Stop,
            ("status", None) => Command::Status,
            ("quit" | "exit", None) => Command::Quit,
            _ => return Err(ReadalongError::Other(format!("Unknown command: {}", line))),
        };
        Ok(Some(cmd))
    }

    /// Apply an immediate command to the narrator
    ///
    /// `Wait`, `Status` and `Quit` are left to the caller's loop.
    pub fn apply(&self, narrator: &mut Narrator, rate_step: f64) -> Result<()> {
        debug!("Applying {:?}", self);
        match self {
            Command::Pause => narrator.pause(),
            Command::Resume => narrator.resume(),
            Command::Toggle => {
                if narrator.state() == TransportState::Playing {
                    narrator.pause();
                } else {
                    narrator.resume();
                }
            }
            Command::Rate(r) => {
                let rate = Rate::new(*r)?;
                narrator.set_rate(narrator.clamp_rate(rate.get()))?;
            }
            Command::Faster => {
                narrator.step_rate(rate_step)?;
            }
            Command::Slower => {
                narrator.step_rate(-rate_step)?;
            }
            Command::Seek(span) => {
                narrator.seek_to_span(span);
            }
            Command::Stop => narrator.stop(),
            Command::Wait(_) | Command::Status | Command::Quit => {}
        }
        Ok(())
    }
}
