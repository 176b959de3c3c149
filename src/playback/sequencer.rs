//! Clip sequencer
//!
//! Walks the clips of one session in order, then the outro. The walk is an
//! index into the clip list driven by a single completion check on the
//! active handle, so only one handle is ever listened to and nothing from a
//! previous clip can trigger an advance.

use crate::alignment::{ClipAlignment, SpanId};
use crate::playback::backend::{BackendEvent, PlaybackBackend};
use crate::playback::rate::Rate;
use crate::{ReadalongError, Result};
use log::{debug, info, warn};

/// A clip owned by a session
pub struct Clip {
    /// Position of this clip in the narration
    pub index: usize,
    pub span_ids: Vec<SpanId>,
    pub alignment: Option<ClipAlignment>,
    /// `None` when the handle could not be opened
    handle: Option<Box<dyn PlaybackBackend>>,
}

impl Clip {
    pub fn new(
        index: usize,
        span_ids: Vec<SpanId>,
        alignment: Option<ClipAlignment>,
        handle: Option<Box<dyn PlaybackBackend>>,
    ) -> Self {
        Self {
            index,
            span_ids,
            alignment,
            handle,
        }
    }
}

/// Where the walk currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// Position within the session's clip list
    Clip(usize),
    Outro,
    Finished,
}

/// Ordered traversal of clips followed by the outro
pub struct ClipSequencer {
    clips: Vec<Clip>,
    outro: Option<Box<dyn PlaybackBackend>>,
    /// `None` until `start`
    cursor: Option<Cursor>,
    /// Completion listener attached to the active handle
    listening: bool,
}

impl ClipSequencer {
    pub fn new(clips: Vec<Clip>, outro: Option<Box<dyn PlaybackBackend>>) -> Self {
        Self {
            clips,
            outro,
            cursor: None,
            listening: false,
        }
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor == Some(Cursor::Finished)
    }

    /// Clip currently playing, if the cursor is on a clip
    pub fn current_clip(&self) -> Option<&Clip> {
        match self.cursor {
            Some(Cursor::Clip(i)) => self.clips.get(i),
            _ => None,
        }
    }

    /// Begin the walk at the first clip (or the outro when there are none)
    ///
    /// Clips that fail to load are skipped. A handle that becomes current
    /// while `playing` is false is loaded and paused, never started.
    pub fn start(&mut self, playing: bool, rate: Rate) -> Cursor {
        let first = if self.clips.is_empty() {
            self.outro_or_finished()
        } else {
            Cursor::Clip(0)
        };
        self.enter(first, playing, rate)
    }

    /// Move past the current clip after it completed
    pub fn advance(&mut self, playing: bool, rate: Rate) -> Cursor {
        self.listening = false;
        let next = match self.cursor {
            Some(cursor) => self.successor(cursor),
            None => return self.start(playing, rate),
        };
        self.enter(next, playing, rate)
    }

    /// Check the active handle for completion
    ///
    /// Returns true once when the clip ended or failed to load; the
    /// listener is detached at that point.
    pub fn poll_completion(&mut self) -> bool {
        if !self.listening {
            return false;
        }
        let mut completed = false;
        if let Some(handle) = self.active_handle_mut() {
            while let Some(event) = handle.poll_event() {
                match event {
                    BackendEvent::CanPlay => debug!("{} ready", handle.locator()),
                    BackendEvent::Ended => {
                        debug!("{} ended", handle.locator());
                        completed = true;
                        break;
                    }
                    BackendEvent::LoadFailed(reason) => {
                        warn!("{} failed to load, skipping: {}", handle.locator(), reason);
                        completed = true;
                        break;
                    }
                }
            }
        }
        if completed {
            self.listening = false;
        }
        completed
    }

    /// Continue the active handle from its retained position
    pub fn resume(&mut self) -> Result<()> {
        match self.active_handle_mut() {
            Some(handle) => handle.play(),
            None => Ok(()),
        }
    }

    pub fn pause(&mut self) -> Result<()> {
        match self.active_handle_mut() {
            Some(handle) => handle.pause(),
            None => Ok(()),
        }
    }

    /// Apply a rate to the active handle
    pub fn set_rate(&mut self, rate: Rate) {
        if let Some(handle) = self.active_handle_mut() {
            handle.set_rate(rate.get());
        }
    }

    /// Position of the active handle (ms of clip time)
    pub fn position_ms(&self) -> u64 {
        self.active_handle().map_or(0, |h| h.current_time_ms())
    }

    /// Stop the active handle, rewind it, and end the walk
    pub fn stop(&mut self) {
        self.listening = false;
        if let Some(handle) = self.active_handle_mut() {
            if let Err(e) = handle.pause() {
                warn!("Failed to pause {}: {}", handle.locator(), e);
            }
            handle.set_current_time_ms(0);
        }
        self.cursor = Some(Cursor::Finished);
    }

    pub fn active_handle(&self) -> Option<&dyn PlaybackBackend> {
        match self.cursor? {
            Cursor::Clip(i) => self.clips.get(i)?.handle.as_deref(),
            Cursor::Outro => self.outro.as_deref(),
            Cursor::Finished => None,
        }
    }

    fn active_handle_mut(&mut self) -> Option<&mut Box<dyn PlaybackBackend>> {
        match self.cursor? {
            Cursor::Clip(i) => self.clips.get_mut(i)?.handle.as_mut(),
            Cursor::Outro => self.outro.as_mut(),
            Cursor::Finished => None,
        }
    }

    fn outro_or_finished(&self) -> Cursor {
        if self.outro.is_some() {
            Cursor::Outro
        } else {
            Cursor::Finished
        }
    }

    fn successor(&self, cursor: Cursor) -> Cursor {
        match cursor {
            Cursor::Clip(i) if i + 1 < self.clips.len() => Cursor::Clip(i + 1),
            Cursor::Clip(_) => self.outro_or_finished(),
            Cursor::Outro | Cursor::Finished => Cursor::Finished,
        }
    }

    /// Make `cursor` current, skipping forward past anything that fails
    fn enter(&mut self, mut cursor: Cursor, playing: bool, rate: Rate) -> Cursor {
        loop {
            self.cursor = Some(cursor);
            if cursor == Cursor::Finished {
                self.listening = false;
                info!("Sequence finished");
                return cursor;
            }
            match self.begin(playing, rate) {
                Ok(()) => {
                    debug!("Now on {:?} (playing: {})", cursor, playing);
                    return cursor;
                }
                Err(e) => {
                    warn!("Skipping {:?}: {}", cursor, e);
                    self.listening = false;
                    cursor = self.successor(cursor);
                }
            }
        }
    }

    /// Attach the listener to the current handle, then play or pause it
    fn begin(&mut self, playing: bool, rate: Rate) -> Result<()> {
        self.listening = true;
        let handle = self
            .active_handle_mut()
            .ok_or_else(|| ReadalongError::Backend("audio resource not loaded".to_string()))?;
        handle.set_rate(rate.get());
        if playing {
            handle.play()
        } else {
            handle.pause()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Handle whose events are pushed by the test
    struct StubHandle {
        name: String,
        playing: bool,
        fail_play: bool,
        events: Rc<RefCell<VecDeque<BackendEvent>>>,
    }

    impl PlaybackBackend for StubHandle {
        fn locator(&self) -> &str {
            &self.name
        }
        fn play(&mut self) -> Result<()> {
            if self.fail_play {
                return Err(ReadalongError::Backend("broken".into()));
            }
            self.playing = true;
            Ok(())
        }
        fn pause(&mut self) -> Result<()> {
            self.playing = false;
            Ok(())
        }
        fn is_playing(&self) -> bool {
            self.playing
        }
        fn current_time_ms(&self) -> u64 {
            0
        }
        fn set_current_time_ms(&mut self, _ms: u64) {}
        fn rate(&self) -> f64 {
            1.0
        }
        fn set_rate(&mut self, _rate: f64) {}
        fn poll_event(&mut self) -> Option<BackendEvent> {
            self.events.borrow_mut().pop_front()
        }
    }

    type Events = Rc<RefCell<VecDeque<BackendEvent>>>;

    fn stub(name: &str, fail_play: bool) -> (Box<dyn PlaybackBackend>, Events) {
        let events: Events = Rc::default();
        let handle = StubHandle {
            name: name.to_string(),
            playing: false,
            fail_play,
            events: Rc::clone(&events),
        };
        (Box::new(handle), events)
    }

    fn clip(index: usize, handle: Box<dyn PlaybackBackend>) -> Clip {
        Clip::new(index, Vec::new(), None, Some(handle))
    }

    #[test]
    fn test_walks_clips_then_outro() {
        let (a, a_ev) = stub("a", false);
        let (b, b_ev) = stub("b", false);
        let (o, o_ev) = stub("outro", false);
        let mut seq = ClipSequencer::new(vec![clip(0, a), clip(1, b)], Some(o));

        assert_eq!(seq.start(true, Rate::NORMAL), Cursor::Clip(0));
        assert!(!seq.poll_completion());

        a_ev.borrow_mut().push_back(BackendEvent::Ended);
        assert!(seq.poll_completion());
        assert_eq!(seq.advance(true, Rate::NORMAL), Cursor::Clip(1));

        b_ev.borrow_mut().push_back(BackendEvent::Ended);
        assert!(seq.poll_completion());
        assert_eq!(seq.advance(true, Rate::NORMAL), Cursor::Outro);

        o_ev.borrow_mut().push_back(BackendEvent::Ended);
        assert!(seq.poll_completion());
        assert_eq!(seq.advance(true, Rate::NORMAL), Cursor::Finished);
        assert!(seq.is_finished());
    }

    #[test]
    fn test_empty_clips_plays_outro() {
        let (o, _) = stub("outro", false);
        let mut seq = ClipSequencer::new(Vec::new(), Some(o));
        assert_eq!(seq.start(true, Rate::NORMAL), Cursor::Outro);
        assert!(seq.active_handle().unwrap().is_playing());
    }

    #[test]
    fn test_nothing_at_all_finishes() {
        let mut seq = ClipSequencer::new(Vec::new(), None);
        assert_eq!(seq.start(true, Rate::NORMAL), Cursor::Finished);
    }

    #[test]
    fn test_broken_clip_skipped() {
        let (a, _) = stub("a", true);
        let (b, _) = stub("b", false);
        let mut seq = ClipSequencer::new(vec![clip(0, a), clip(1, b)], None);
        assert_eq!(seq.start(true, Rate::NORMAL), Cursor::Clip(1));
    }

    #[test]
    fn test_unopened_clip_skipped() {
        let (b, _) = stub("b", false);
        let mut seq = ClipSequencer::new(
            vec![Clip::new(0, Vec::new(), None, None), clip(1, b)],
            None,
        );
        assert_eq!(seq.start(true, Rate::NORMAL), Cursor::Clip(1));
    }

    #[test]
    fn test_load_failure_event_completes() {
        let (a, a_ev) = stub("a", false);
        let (b, _) = stub("b", false);
        let mut seq = ClipSequencer::new(vec![clip(0, a), clip(1, b)], None);
        seq.start(true, Rate::NORMAL);

        a_ev.borrow_mut()
            .push_back(BackendEvent::LoadFailed("404".into()));
        assert!(seq.poll_completion());
        assert_eq!(seq.advance(true, Rate::NORMAL), Cursor::Clip(1));
    }

    #[test]
    fn test_paused_advance_does_not_play() {
        let (a, _) = stub("a", false);
        let (b, _) = stub("b", false);
        let mut seq = ClipSequencer::new(vec![clip(0, a), clip(1, b)], None);
        seq.start(true, Rate::NORMAL);

        assert_eq!(seq.advance(false, Rate::NORMAL), Cursor::Clip(1));
        assert!(!seq.active_handle().unwrap().is_playing());
    }

    #[test]
    fn test_completion_reported_once() {
        let (a, a_ev) = stub("a", false);
        let mut seq = ClipSequencer::new(vec![clip(0, a)], None);
        seq.start(true, Rate::NORMAL);

        a_ev.borrow_mut().push_back(BackendEvent::Ended);
        a_ev.borrow_mut().push_back(BackendEvent::Ended);
        assert!(seq.poll_completion());
        assert!(!seq.poll_completion());
    }

    #[test]
    fn test_stop_ends_walk() {
        let (a, _) = stub("a", false);
        let mut seq = ClipSequencer::new(vec![clip(0, a)], None);
        seq.start(true, Rate::NORMAL);
        seq.stop();
        assert!(seq.is_finished());
        assert!(seq.active_handle().is_none());
    }
}
