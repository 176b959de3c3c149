//! Highlight output
//!
//! The sink is whatever renders the text: it emphasises a span and may bring
//! it into view, and removes the emphasis again.

use crate::alignment::SpanId;
use crate::clock::{Clock, ManualClock};
use log::info;
use std::cell::RefCell;
use std::rc::Rc;

/// Visual highlight target
pub trait HighlightSink {
    /// Emphasise a span; `scroll` asks for it to be brought into view
    fn activate(&mut self, span: &SpanId, scroll: bool);

    /// Remove a span's emphasis
    fn deactivate(&mut self, span: &SpanId);
}

/// A single highlight change, as recorded by `RecordingSink`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightChange {
    Activate(SpanId),
    Deactivate(SpanId),
}

/// Sink that records every change with the clock time it happened at
///
/// Clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingSink {
    log: Rc<RefCell<Vec<(u64, HighlightChange)>>>,
    now: Option<ManualClock>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp recorded changes with this clock's time
    pub fn with_clock(clock: ManualClock) -> Self {
        Self {
            log: Rc::default(),
            now: Some(clock),
        }
    }

    /// Every change so far, with its timestamp
    pub fn changes(&self) -> Vec<(u64, HighlightChange)> {
        self.log.borrow().clone()
    }

    /// Timestamps at which `span` was activated
    pub fn activations(&self, span: &str) -> Vec<u64> {
        self.times(|c| matches!(c, HighlightChange::Activate(id) if id.as_str() == span))
    }

    /// Timestamps at which `span` was deactivated
    pub fn deactivations(&self, span: &str) -> Vec<u64> {
        self.times(|c| matches!(c, HighlightChange::Deactivate(id) if id.as_str() == span))
    }

    /// Spans currently emphasised according to the log
    pub fn lit(&self) -> Vec<SpanId> {
        let mut lit: Vec<SpanId> = Vec::new();
        for (_, change) in self.log.borrow().iter() {
            match change {
                HighlightChange::Activate(id) => {
                    if !lit.contains(id) {
                        lit.push(id.clone());
                    }
                }
                HighlightChange::Deactivate(id) => lit.retain(|l| l != id),
            }
        }
        lit
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    fn times(&self, pred: impl Fn(&HighlightChange) -> bool) -> Vec<u64> {
        self.log
            .borrow()
            .iter()
            .filter(|(_, c)| pred(c))
            .map(|(t, _)| *t)
            .collect()
    }

    fn stamp(&self) -> u64 {
        self.now.as_ref().map_or(0, |c| c.now_ms())
    }
}

impl HighlightSink for RecordingSink {
    fn activate(&mut self, span: &SpanId, _scroll: bool) {
        let t = self.stamp();
        self.log
            .borrow_mut()
            .push((t, HighlightChange::Activate(span.clone())));
    }

    fn deactivate(&mut self, span: &SpanId) {
        let t = self.stamp();
        self.log
            .borrow_mut()
            .push((t, HighlightChange::Deactivate(span.clone())));
    }
}

/// Sink that only logs
pub struct LogSink;

impl HighlightSink for LogSink {
    fn activate(&mut self, span: &SpanId, scroll: bool) {
        info!("highlight on: {} (scroll: {})", span, scroll);
    }

    fn deactivate(&mut self, span: &SpanId) {
        info!("highlight off: {}", span);
    }
}
