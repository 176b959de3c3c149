//! Highlight timer scheduler
//!
//! Turns a clip's alignment into timed activate/deactivate cues against the
//! host clock. Cues live in a deadline-ordered map owned by the scheduler, so
//! cancelling removes them outright and nothing stale can fire later.
//!
//! Rate changes are never applied to armed deadlines in place. Callers cancel
//! and re-arm from the current clip position, which keeps highlight
//! boundaries locked to the audio no matter how often the rate changes.

use crate::alignment::{ClipAlignment, SpanId};
use crate::playback::rate::Rate;
use crate::playback::sink::HighlightSink;
use log::{debug, trace};
use std::collections::BTreeMap;

/// What a cue does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueKind {
    Activate,
    Deactivate,
}

#[derive(Debug, Clone)]
struct Cue {
    span: SpanId,
    kind: CueKind,
}

/// Pending highlight cues for the active clip
pub struct HighlightScheduler {
    /// Keyed by (deadline, arm order) so simultaneous cues keep their order
    pending: BTreeMap<(u64, u64), Cue>,
    next_seq: u64,
    /// Spans activated and not yet deactivated
    lit: Vec<SpanId>,
    /// Ask the sink to scroll activated spans into view
    scroll: bool,
}

impl HighlightScheduler {
    pub fn new(scroll: bool) -> Self {
        Self {
            pending: BTreeMap::new(),
            next_seq: 0,
            lit: Vec::new(),
            scroll,
        }
    }

    /// Arm cues for a clip at clip position `elapsed_ms`
    ///
    /// Anything already pending is cancelled first. Spans whose start has
    /// already passed are never activated; if such a span is still lit from
    /// before, it only gets its closing cue. A clip without alignment arms
    /// nothing. Returns the number of cues armed.
    pub fn arm(
        &mut self,
        alignment: Option<&ClipAlignment>,
        elapsed_ms: u64,
        rate: Rate,
        now: u64,
    ) -> usize {
        self.cancel_all();

        let alignment = match alignment {
            Some(a) if !a.is_empty() => a,
            _ => {
                debug!("No alignment for this clip, highlighting skipped");
                return 0;
            }
        };

        for span in alignment {
            if span.start_ms >= elapsed_ms {
                let lead = rate.scale(span.start_ms - elapsed_ms);
                let on = deadline(now, lead);
                let off = deadline(now, lead + rate.scale(span.length_ms));
                self.push(on, &span.span_id, CueKind::Activate);
                self.push(off, &span.span_id, CueKind::Deactivate);
            } else if self.is_lit(&span.span_id) {
                let remaining = rate.scale(span.end_ms().saturating_sub(elapsed_ms));
                self.push(deadline(now, remaining), &span.span_id, CueKind::Deactivate);
            }
        }

        debug!(
            "Armed {} cues at {}ms ({}), {} spans in clip",
            self.pending.len(),
            elapsed_ms,
            rate,
            alignment.len()
        );
        self.pending.len()
    }

    /// Drop every pending cue. Safe to call with nothing pending.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.pending.len();
        if cancelled > 0 {
            trace!("Cancelled {} pending cues", cancelled);
        }
        self.pending.clear();
        cancelled
    }

    /// Fire every cue due at or before `now`, in deadline order
    ///
    /// Activations only reach the sink while `playing`; deactivations always
    /// do, so nothing stays stuck on screen.
    pub fn fire_due(&mut self, now: u64, playing: bool, sink: &mut dyn HighlightSink) -> usize {
        let mut fired = 0;
        while let Some(entry) = self.pending.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let cue = entry.remove();
            fired += 1;
            match cue.kind {
                CueKind::Activate => {
                    if self.is_lit(&cue.span) {
                        trace!("{} already lit", cue.span);
                    } else if playing {
                        trace!("activate {} at {}", cue.span, now);
                        sink.activate(&cue.span, self.scroll);
                        self.lit.push(cue.span);
                    } else {
                        trace!("activation of {} suppressed, not playing", cue.span);
                    }
                }
                CueKind::Deactivate => {
                    trace!("deactivate {} at {}", cue.span, now);
                    sink.deactivate(&cue.span);
                    self.lit.retain(|s| s != &cue.span);
                }
            }
        }
        fired
    }

    /// Deactivate every lit span immediately
    pub fn clear_highlights(&mut self, sink: &mut dyn HighlightSink) {
        for span in self.lit.drain(..) {
            sink.deactivate(&span);
        }
    }

    /// Number of cues waiting to fire
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Pending cues in firing order
    pub fn pending_cues(&self) -> Vec<(u64, SpanId, CueKind)> {
        self.pending
            .iter()
            .map(|((deadline, _), cue)| (*deadline, cue.span.clone(), cue.kind))
            .collect()
    }

    /// Spans currently emphasised
    pub fn lit(&self) -> &[SpanId] {
        &self.lit
    }

    pub fn is_lit(&self, span: &SpanId) -> bool {
        self.lit.contains(span)
    }

    fn push(&mut self, deadline: u64, span: &SpanId, kind: CueKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert(
            (deadline, seq),
            Cue {
                span: span.clone(),
                kind,
            },
        );
    }
}

/// Clock time `delay_ms` after `now`, pinned to `u64::MAX` for very slow rates
fn deadline(now: u64, delay_ms: f64) -> u64 {
    // float to int casts saturate, so only the add needs guarding
    now.saturating_add(delay_ms.round() as u64)
}

impl Default for HighlightScheduler {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::HighlightSpan;
    use crate::playback::sink::{HighlightChange, RecordingSink};

    fn alignment() -> ClipAlignment {
        ClipAlignment::new(vec![
            HighlightSpan::new("a", 0, 1000),
            HighlightSpan::new("b", 1000, 2000),
            HighlightSpan::new("c", 4000, 1000),
        ])
    }

    fn rate(r: f64) -> Rate {
        Rate::new(r).unwrap()
    }

    #[test]
    fn test_arm_from_start() {
        let mut scheduler = HighlightScheduler::default();
        assert_eq!(scheduler.arm(Some(&alignment()), 0, Rate::NORMAL, 100), 6);

        let cues = scheduler.pending_cues();
        assert_eq!(cues[0], (100, SpanId::from("a"), CueKind::Activate));
        assert_eq!(cues[1], (1100, SpanId::from("a"), CueKind::Deactivate));
        assert_eq!(cues[2], (1100, SpanId::from("b"), CueKind::Activate));
        assert_eq!(cues[5], (5100, SpanId::from("c"), CueKind::Deactivate));
    }

    #[test]
    fn test_rate_scales_delays() {
        let mut scheduler = HighlightScheduler::default();
        scheduler.arm(Some(&alignment()), 1000, rate(2.0), 0);

        let cues = scheduler.pending_cues();
        let c_on = cues
            .iter()
            .find(|(_, s, k)| s.as_str() == "c" && *k == CueKind::Activate)
            .unwrap();
        assert_eq!(c_on.0, 1500);
        let c_off = cues
            .iter()
            .find(|(_, s, k)| s.as_str() == "c" && *k == CueKind::Deactivate)
            .unwrap();
        assert_eq!(c_off.0, 2000);
    }

    #[test]
    fn test_past_spans_not_armed() {
        let mut scheduler = HighlightScheduler::default();
        scheduler.arm(Some(&alignment()), 1500, Rate::NORMAL, 0);

        let cues = scheduler.pending_cues();
        assert!(cues.iter().all(|(_, s, _)| s.as_str() == "c"));
        assert_eq!(cues.len(), 2);
    }

    #[test]
    fn test_missing_alignment_is_noop() {
        let mut scheduler = HighlightScheduler::default();
        assert_eq!(scheduler.arm(None, 0, Rate::NORMAL, 0), 0);
        assert_eq!(
            scheduler.arm(Some(&ClipAlignment::default()), 0, Rate::NORMAL, 0),
            0
        );
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_cancel_all_idempotent() {
        let mut scheduler = HighlightScheduler::default();
        scheduler.arm(Some(&alignment()), 0, Rate::NORMAL, 0);
        assert_eq!(scheduler.cancel_all(), 6);
        assert_eq!(scheduler.cancel_all(), 0);
        assert_eq!(scheduler.cancel_all(), 0);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn test_cancelled_cues_never_fire() {
        let mut scheduler = HighlightScheduler::default();
        let mut sink = RecordingSink::new();
        scheduler.arm(Some(&alignment()), 0, Rate::NORMAL, 0);
        scheduler.cancel_all();

        assert_eq!(scheduler.fire_due(10_000, true, &mut sink), 0);
        assert!(sink.changes().is_empty());
    }

    #[test]
    fn test_fire_due_in_order() {
        let mut scheduler = HighlightScheduler::default();
        let mut sink = RecordingSink::new();
        scheduler.arm(Some(&alignment()), 0, Rate::NORMAL, 0);

        scheduler.fire_due(1000, true, &mut sink);
        let kinds: Vec<_> = sink.changes().into_iter().map(|(_, c)| c).collect();
        assert_eq!(
            kinds,
            vec![
                HighlightChange::Activate("a".into()),
                HighlightChange::Deactivate("a".into()),
                HighlightChange::Activate("b".into()),
            ]
        );
        assert_eq!(scheduler.lit(), &[SpanId::from("b")]);
    }

    #[test]
    fn test_activation_suppressed_when_not_playing() {
        let mut scheduler = HighlightScheduler::default();
        let mut sink = RecordingSink::new();
        scheduler.arm(Some(&alignment()), 0, Rate::NORMAL, 0);

        scheduler.fire_due(500, false, &mut sink);
        assert!(sink.activations("a").is_empty());
        assert!(scheduler.lit().is_empty());

        // Deactivation still goes through
        scheduler.fire_due(1000, false, &mut sink);
        assert_eq!(sink.deactivations("a").len(), 1);
    }

    #[test]
    fn test_rearm_closes_lit_span() {
        let mut scheduler = HighlightScheduler::default();
        let mut sink = RecordingSink::new();
        scheduler.arm(Some(&alignment()), 0, Rate::NORMAL, 0);
        scheduler.fire_due(1500, true, &mut sink);
        assert!(scheduler.is_lit(&"b".into()));

        // b runs 1000..3000; re-armed at 1500 with 2x it closes 750ms later
        scheduler.arm(Some(&alignment()), 1500, rate(2.0), 1500);
        let cues = scheduler.pending_cues();
        assert_eq!(cues[0], (2250, SpanId::from("b"), CueKind::Deactivate));
        assert!(!cues
            .iter()
            .any(|(_, s, k)| s.as_str() == "b" && *k == CueKind::Activate));
    }

    #[test]
    fn test_clear_highlights() {
        let mut scheduler = HighlightScheduler::default();
        let mut sink = RecordingSink::new();
        scheduler.arm(Some(&alignment()), 0, Rate::NORMAL, 0);
        scheduler.fire_due(0, true, &mut sink);
        scheduler.cancel_all();

        scheduler.clear_highlights(&mut sink);
        assert!(scheduler.lit().is_empty());
        assert!(sink.lit().is_empty());
    }

    #[test]
    fn test_extreme_rates_do_not_overflow() {
        let mut scheduler = HighlightScheduler::default();
        let mut sink = RecordingSink::new();
        scheduler.arm(Some(&alignment()), 0, Rate::NORMAL, 0);
        scheduler.fire_due(1500, true, &mut sink);

        // b is lit; its closing cue and every later cue land at the far end
        assert_eq!(scheduler.arm(Some(&alignment()), 1500, rate(1e-300), 1500), 3);
        assert!(scheduler
            .pending_cues()
            .iter()
            .all(|(deadline, _, _)| *deadline == u64::MAX));
        assert_eq!(scheduler.fire_due(u64::MAX - 1, true, &mut sink), 0);

        scheduler.arm(Some(&alignment()), 1500, rate(1e300), u64::MAX - 10);
        assert_eq!(scheduler.next_deadline(), Some(u64::MAX - 10));
    }
}
