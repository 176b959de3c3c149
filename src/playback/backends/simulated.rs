//! Clock-driven playback backend
//!
//! Stands in for a real audio output: a handle only tracks its position
//! against a shared clock and reports `Ended` once the position reaches the
//! registered duration. Used by the command-line player and the tests.

use crate::clock::Clock;
use crate::playback::backend::{BackendEvent, BackendFactory, PlaybackBackend};
use crate::{ReadalongError, Result};
use log::{debug, trace};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

struct Track {
    duration_ms: u64,
    failure: Option<String>,
}

struct HandleState {
    locator: String,
    duration_ms: u64,
    failure: Option<String>,
    position_ms: u64,
    /// Clock time at which playback last (re)started
    started_at: Option<u64>,
    rate: f64,
    events: VecDeque<BackendEvent>,
}

impl HandleState {
    fn position(&self, now: u64) -> u64 {
        match self.started_at {
            Some(t0) => {
                let played = (now.saturating_sub(t0) as f64 * self.rate).round() as u64;
                self.position_ms.saturating_add(played).min(self.duration_ms)
            }
            None => self.position_ms,
        }
    }

    /// Stop at the end and queue `Ended` once the position runs out
    fn check_ended(&mut self, now: u64) -> bool {
        if self.started_at.is_some() && self.position(now) >= self.duration_ms {
            self.position_ms = self.duration_ms;
            self.started_at = None;
            self.events.push_back(BackendEvent::Ended);
            return true;
        }
        false
    }

    /// Fold elapsed play time into the stored position
    fn rebase(&mut self, now: u64) {
        if self.started_at.is_some() {
            self.position_ms = self.position(now);
            self.started_at = Some(now);
        }
    }
}

#[derive(Default)]
struct Registry {
    tracks: HashMap<String, Track>,
    handles: Vec<Rc<RefCell<HandleState>>>,
    completions: Vec<String>,
}

/// Factory for simulated handles
///
/// Clones share the same track table and handle registry, so a caller can
/// keep one to inspect what the engine did with the handles it opened.
#[derive(Clone)]
pub struct SimulatedFactory {
    clock: Rc<dyn Clock>,
    registry: Rc<RefCell<Registry>>,
}

impl SimulatedFactory {
    pub fn new<C: Clock + 'static>(clock: C) -> Self {
        Self {
            clock: Rc::new(clock),
            registry: Rc::new(RefCell::new(Registry::default())),
        }
    }

    /// Register a playable clip of the given length
    pub fn add_track(&self, locator: &str, duration_ms: u64) {
        self.registry.borrow_mut().tracks.insert(
            locator.to_string(),
            Track {
                duration_ms,
                failure: None,
            },
        );
    }

    /// Register a clip whose `play()` always fails
    pub fn add_broken_track(&self, locator: &str, reason: &str) {
        self.registry.borrow_mut().tracks.insert(
            locator.to_string(),
            Track {
                duration_ms: 0,
                failure: Some(reason.to_string()),
            },
        );
    }

    /// Number of handles opened so far
    pub fn opened(&self) -> usize {
        self.registry.borrow().handles.len()
    }

    /// Locators of every handle currently in the playing state
    pub fn playing(&self) -> Vec<String> {
        let now = self.clock.now_ms();
        self.registry
            .borrow()
            .handles
            .iter()
            .filter_map(|h| {
                let h = h.borrow();
                (h.started_at.is_some() && h.position(now) < h.duration_ms)
                    .then(|| h.locator.clone())
            })
            .collect()
    }

    /// Locators in the order their handles reported `Ended`
    pub fn completions(&self) -> Vec<String> {
        self.registry.borrow().completions.clone()
    }
}

impl BackendFactory for SimulatedFactory {
    fn open(&mut self, locator: &str) -> Result<Box<dyn PlaybackBackend>> {
        let mut registry = self.registry.borrow_mut();
        let track = registry.tracks.get(locator).ok_or_else(|| {
            ReadalongError::Backend(format!("No such audio resource: {}", locator))
        })?;

        let mut events = VecDeque::new();
        if track.failure.is_none() {
            events.push_back(BackendEvent::CanPlay);
        }

        let state = Rc::new(RefCell::new(HandleState {
            locator: locator.to_string(),
            duration_ms: track.duration_ms,
            failure: track.failure.clone(),
            position_ms: 0,
            started_at: None,
            rate: 1.0,
            events,
        }));
        registry.handles.push(Rc::clone(&state));
        debug!("Opened simulated handle for {}", locator);

        Ok(Box::new(SimulatedBackend {
            locator: locator.to_string(),
            clock: Rc::clone(&self.clock),
            registry: Rc::clone(&self.registry),
            state,
        }))
    }
}

/// Handle produced by `SimulatedFactory`
pub struct SimulatedBackend {
    locator: String,
    clock: Rc<dyn Clock>,
    registry: Rc<RefCell<Registry>>,
    state: Rc<RefCell<HandleState>>,
}

impl PlaybackBackend for SimulatedBackend {
    fn locator(&self) -> &str {
        &self.locator
    }

    fn play(&mut self) -> Result<()> {
        let now = self.clock.now_ms();
        let mut state = self.state.borrow_mut();
        if let Some(reason) = &state.failure {
            return Err(ReadalongError::Backend(format!(
                "{}: {}",
                state.locator, reason
            )));
        }
        if state.started_at.is_none() {
            if state.position_ms >= state.duration_ms {
                state.position_ms = 0;
            }
            state.started_at = Some(now);
            trace!("{} playing from {}ms", state.locator, state.position_ms);
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        let now = self.clock.now_ms();
        let mut state = self.state.borrow_mut();
        if state.check_ended(now) {
            self.record_completion(&state.locator);
        }
        state.position_ms = state.position(now);
        state.started_at = None;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        let state = self.state.borrow();
        state.started_at.is_some() && state.position(self.clock.now_ms()) < state.duration_ms
    }

    fn current_time_ms(&self) -> u64 {
        self.state.borrow().position(self.clock.now_ms())
    }

    fn set_current_time_ms(&mut self, ms: u64) {
        let now = self.clock.now_ms();
        let mut state = self.state.borrow_mut();
        state.position_ms = ms.min(state.duration_ms);
        if state.started_at.is_some() {
            state.started_at = Some(now);
        }
    }

    fn rate(&self) -> f64 {
        self.state.borrow().rate
    }

    fn set_rate(&mut self, rate: f64) {
        let now = self.clock.now_ms();
        let mut state = self.state.borrow_mut();
        state.rebase(now);
        state.rate = rate;
    }

    fn poll_event(&mut self) -> Option<BackendEvent> {
        let now = self.clock.now_ms();
        let mut state = self.state.borrow_mut();
        if state.check_ended(now) {
            self.record_completion(&state.locator);
        }
        state.events.pop_front()
    }
}

impl SimulatedBackend {
    fn record_completion(&self, locator: &str) {
        self.registry
            .borrow_mut()
            .completions
            .push(locator.to_string());
    }
}
