//! Transport controller
//!
//! The public face of the engine. `Narrator` owns the document, the backend
//! factory, the highlight sink, the clock, and at most one live
//! `PlaybackSession`. Every operation mutates state synchronously and issues
//! backend commands before returning; only highlight cues are deferred, and
//! those fire from `poll`.

use crate::alignment::SpanId;
use crate::clock::Clock;
use crate::narration::Narration;
use crate::playback::backend::BackendFactory;
use crate::playback::rate::Rate;
use crate::playback::scheduler::CueKind;
use crate::playback::sequencer::Cursor;
use crate::playback::session::PlaybackSession;
use crate::playback::sink::HighlightSink;
use crate::Result;
use log::{debug, info};

/// Externally visible playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Idle,
    Playing,
    Paused,
    Finished,
}

/// Settings the narrator is built with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NarratorOptions {
    pub rate: Rate,
    pub min_rate: f64,
    pub max_rate: f64,
    /// Bring activated spans into view
    pub auto_scroll: bool,
}

impl Default for NarratorOptions {
    fn default() -> Self {
        Self {
            rate: Rate::NORMAL,
            min_rate: 0.25,
            max_rate: 4.0,
            auto_scroll: true,
        }
    }
}

/// Synchronized narration engine
pub struct Narrator {
    narration: Narration,
    factory: Box<dyn BackendFactory>,
    sink: Box<dyn HighlightSink>,
    clock: Box<dyn Clock>,
    options: NarratorOptions,

    session: Option<PlaybackSession>,
    sessions_started: u64,
    state: TransportState,
    /// Rate preference, carried into every new session
    rate: Rate,

    /// Called once each time a session runs to its end
    on_finished: Option<Box<dyn FnMut()>>,
}

impl Narrator {
    pub fn new(
        narration: Narration,
        factory: Box<dyn BackendFactory>,
        sink: Box<dyn HighlightSink>,
        clock: Box<dyn Clock>,
        options: NarratorOptions,
    ) -> Self {
        info!(
            "Narrator ready: {} clips, outro: {}",
            narration.clips.len(),
            narration.outro.is_some()
        );
        Self {
            narration,
            factory,
            sink,
            clock,
            rate: options.rate,
            options,
            session: None,
            sessions_started: 0,
            state: TransportState::Idle,
            on_finished: None,
        }
    }

    /// Register the session-terminal notification
    pub fn set_on_finished<F>(&mut self, f: F)
    where
        F: FnMut() + 'static,
    {
        self.on_finished = Some(Box::new(f));
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.session.as_ref().map_or(false, |s| s.is_playing())
    }

    pub fn rate(&self) -> Rate {
        self.rate
    }

    pub fn narration(&self) -> &Narration {
        &self.narration
    }

    /// Narration index of the clip currently loaded
    pub fn current_clip(&self) -> Option<usize> {
        self.session.as_ref().and_then(|s| s.current_clip())
    }

    /// Whether the outro is the active handle
    pub fn in_outro(&self) -> bool {
        self.session
            .as_ref()
            .map_or(false, |s| s.cursor() == Some(Cursor::Outro))
    }

    /// Clip position of the active handle (ms)
    pub fn position_ms(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.position_ms())
    }

    /// Pending highlight cues, in firing order
    pub fn pending_cues(&self) -> Vec<(u64, SpanId, CueKind)> {
        self.session
            .as_ref()
            .map_or_else(Vec::new, |s| s.scheduler().pending_cues())
    }

    /// Earliest pending cue deadline, for hosts that sleep between polls
    pub fn next_deadline(&self) -> Option<u64> {
        self.session
            .as_ref()
            .and_then(|s| s.scheduler().next_deadline())
    }

    /// Spans currently highlighted
    pub fn lit(&self) -> Vec<SpanId> {
        self.session
            .as_ref()
            .map_or_else(Vec::new, |s| s.scheduler().lit().to_vec())
    }

    /// Begin narrating from the first clip
    pub fn start(&mut self) {
        self.begin_session(0);
    }

    /// Pause audio and cancel pending cues; the lit highlight stays
    ///
    /// Cues already due fire first, as a host timer would have run them
    /// before the command arrived.
    pub fn pause(&mut self) {
        self.poll();
        let paused = self.session.as_mut().map_or(false, |s| s.pause());
        if paused {
            self.state = TransportState::Paused;
            info!("Paused");
        }
    }

    /// Continue from the retained position
    ///
    /// With no session (idle or finished) narration restarts from the top.
    pub fn resume(&mut self) {
        if self.session.is_none() {
            debug!("Resume with no session, starting over");
            self.start();
            return;
        }
        let now = self.clock.now_ms();
        let sink = self.sink.as_mut();
        let resumed = self
            .session
            .as_mut()
            .map_or(false, |s| s.resume(now, sink));
        if resumed {
            self.state = TransportState::Playing;
            info!("Resumed");
            self.poll();
        }
    }

    /// Change the playback rate
    ///
    /// Applies to the active handle at once and re-arms cues from the
    /// current position when playing. A rate that is not positive is
    /// rejected without changing anything.
    pub fn set_rate(&mut self, rate: f64) -> Result<()> {
        let rate = Rate::new(rate)?;
        self.poll();
        self.rate = rate;
        let now = self.clock.now_ms();
        if let Some(session) = self.session.as_mut() {
            session.set_rate(rate, now);
        }
        info!("Rate set to {}", rate);
        Ok(())
    }

    /// Nudge the rate by `delta`, clamped to the configured range
    pub fn step_rate(&mut self, delta: f64) -> Result<Rate> {
        self.set_rate(self.clamp_rate(self.rate.get() + delta))?;
        Ok(self.rate)
    }

    /// Clamp `rate` into the configured range
    pub fn clamp_rate(&self, rate: f64) -> f64 {
        rate.clamp(self.options.min_rate, self.options.max_rate)
    }

    /// Jump to the clip containing `span` and play from its start
    ///
    /// An unknown span is ignored. Returns whether a new session began.
    pub fn seek_to_span(&mut self, span: &SpanId) -> bool {
        match self.narration.clip_for_span(span) {
            Some(index) => {
                info!("Seek to {} (clip {})", span, index);
                self.begin_session(index);
                true
            }
            None => {
                debug!("Seek target {} not in any clip, ignored", span);
                false
            }
        }
    }

    /// Tear down the session and go idle
    pub fn stop(&mut self) {
        self.end_session();
        self.state = TransportState::Idle;
    }

    /// Fire due cues and follow clip completions
    ///
    /// Hosts call this from their event loop.
    pub fn poll(&mut self) {
        let now = self.clock.now_ms();
        let sink = self.sink.as_mut();
        let finished = self
            .session
            .as_mut()
            .map_or(false, |s| s.poll(now, sink));
        if finished {
            self.finish();
        }
    }

    fn begin_session(&mut self, first: usize) {
        self.end_session();

        self.sessions_started += 1;
        let mut session = PlaybackSession::open(
            self.sessions_started,
            &self.narration,
            first,
            self.factory.as_mut(),
            self.rate,
            self.options.auto_scroll,
        );
        session.start(self.clock.now_ms());
        self.session = Some(session);
        self.state = TransportState::Playing;
        self.poll();
    }

    fn end_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.teardown(self.sink.as_mut());
        }
    }

    fn finish(&mut self) {
        self.end_session();
        self.state = TransportState::Finished;
        info!("Narration finished");
        if let Some(callback) = self.on_finished.as_mut() {
            callback();
        }
    }
}
