//! Playback session
//!
//! One exclusive traversal of the clip sequence. The session owns the
//! handles it opened and the pending highlight cues, and every operation on
//! it cancels cues before arming new ones, with no point in between where
//! another event can observe a half-updated state.

use crate::narration::Narration;
use crate::playback::backend::BackendFactory;
use crate::playback::rate::Rate;
use crate::playback::scheduler::HighlightScheduler;
use crate::playback::sequencer::{Clip, ClipSequencer, Cursor};
use crate::playback::sink::HighlightSink;
use log::{debug, info, warn};

/// The live playback state of one traversal
pub struct PlaybackSession {
    id: u64,
    sequencer: ClipSequencer,
    scheduler: HighlightScheduler,
    is_playing: bool,
    rate: Rate,
}

impl PlaybackSession {
    /// Open fresh handles for every clip from `first` on, plus the outro
    ///
    /// Handles that fail to open are kept as empty slots; the sequencer
    /// skips them when it gets there.
    pub fn open(
        id: u64,
        narration: &Narration,
        first: usize,
        factory: &mut dyn BackendFactory,
        rate: Rate,
        scroll: bool,
    ) -> Self {
        let clips = narration
            .clips
            .iter()
            .enumerate()
            .skip(first)
            .map(|(index, source)| {
                let handle = match factory.open(&source.audio) {
                    Ok(h) => Some(h),
                    Err(e) => {
                        warn!("Could not open clip {} ({}): {}", index, source.audio, e);
                        None
                    }
                };
                Clip::new(
                    index,
                    source.span_ids.clone(),
                    source.alignment.clone(),
                    handle,
                )
            })
            .collect();

        let outro = narration
            .outro
            .as_deref()
            .and_then(|locator| match factory.open(locator) {
                Ok(h) => Some(h),
                Err(e) => {
                    warn!("Could not open outro ({}): {}", locator, e);
                    None
                }
            });

        info!(
            "Session {} opened at clip {} of {}",
            id,
            first,
            narration.clips.len()
        );

        Self {
            id,
            sequencer: ClipSequencer::new(clips, outro),
            scheduler: HighlightScheduler::new(scroll),
            is_playing: false,
            rate,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn rate(&self) -> Rate {
        self.rate
    }

    pub fn is_finished(&self) -> bool {
        self.sequencer.is_finished()
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.sequencer.cursor()
    }

    /// Narration index of the clip being played
    pub fn current_clip(&self) -> Option<usize> {
        self.sequencer.current_clip().map(|c| c.index)
    }

    /// Clip position of the active handle (ms)
    pub fn position_ms(&self) -> u64 {
        self.sequencer.position_ms()
    }

    pub fn scheduler(&self) -> &HighlightScheduler {
        &self.scheduler
    }

    pub fn sequencer(&self) -> &ClipSequencer {
        &self.sequencer
    }

    /// Start audible playback from the first clip
    pub fn start(&mut self, now: u64) -> Cursor {
        self.is_playing = true;
        let cursor = self.sequencer.start(true, self.rate);
        if let Cursor::Clip(_) = cursor {
            self.arm_current(0, now);
        }
        cursor
    }

    /// Returns false if already paused
    pub fn pause(&mut self) -> bool {
        if !self.is_playing {
            return false;
        }
        self.is_playing = false;
        if let Err(e) = self.sequencer.pause() {
            warn!("Session {}: pause failed: {}", self.id, e);
        }
        self.scheduler.cancel_all();
        debug!("Session {} paused at {}ms", self.id, self.position_ms());
        true
    }

    /// Returns false if already playing
    pub fn resume(&mut self, now: u64, sink: &mut dyn HighlightSink) -> bool {
        if self.is_playing {
            return false;
        }
        self.is_playing = true;
        match self.sequencer.resume() {
            Ok(()) => {
                let elapsed = self.position_ms();
                debug!("Session {} resumed at {}ms", self.id, elapsed);
                self.arm_current(elapsed, now);
            }
            Err(e) => {
                warn!("Session {}: clip failed on resume, skipping: {}", self.id, e);
                self.complete_clip(now, sink);
            }
        }
        true
    }

    /// Apply a new rate to the active handle, re-arming cues if playing
    pub fn set_rate(&mut self, rate: Rate, now: u64) {
        self.rate = rate;
        self.sequencer.set_rate(rate);
        if self.is_playing {
            let elapsed = self.position_ms();
            self.arm_current(elapsed, now);
        }
    }

    /// Fire due cues and follow clip completions
    ///
    /// Returns true when the sequence has run out.
    pub fn poll(&mut self, now: u64, sink: &mut dyn HighlightSink) -> bool {
        loop {
            self.scheduler.fire_due(now, self.is_playing, sink);
            if !self.sequencer.poll_completion() {
                break;
            }
            if self.complete_clip(now, sink) == Cursor::Finished {
                break;
            }
        }
        self.is_finished()
    }

    /// Stop the active handle and clear every cue and highlight
    pub fn teardown(&mut self, sink: &mut dyn HighlightSink) {
        self.scheduler.cancel_all();
        self.scheduler.clear_highlights(sink);
        self.sequencer.stop();
        self.is_playing = false;
        debug!("Session {} torn down", self.id);
    }

    fn complete_clip(&mut self, now: u64, sink: &mut dyn HighlightSink) -> Cursor {
        self.scheduler.cancel_all();
        self.scheduler.clear_highlights(sink);
        let cursor = self.sequencer.advance(self.is_playing, self.rate);
        if let Cursor::Clip(_) = cursor {
            if self.is_playing {
                self.arm_current(0, now);
            }
        }
        cursor
    }

    fn arm_current(&mut self, elapsed_ms: u64, now: u64) {
        let alignment = self
            .sequencer
            .current_clip()
            .and_then(|c| c.alignment.as_ref());
        self.scheduler.arm(alignment, elapsed_ms, self.rate, now);
    }
}
