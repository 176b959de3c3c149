//! Synchronized playback engine
//!
//! Plays a document's clips in order while highlighting the span being
//! spoken. The pieces, leaves first:
//!
//! - `scheduler`: timed highlight cues for the active clip
//! - `sequencer`: clip-to-clip chaining, then the outro
//! - `session`: one exclusive traversal owning handles and cues
//! - `transport`: the public play / pause / seek / rate state machine

pub mod backend;
pub mod backends;
pub mod rate;
pub mod scheduler;
pub mod sequencer;
pub mod session;
pub mod sink;
pub mod transport;

pub use backend::{BackendEvent, BackendFactory, PlaybackBackend};
pub use rate::Rate;
pub use scheduler::{CueKind, HighlightScheduler};
pub use sequencer::{ClipSequencer, Cursor};
pub use session::PlaybackSession;
pub use sink::{HighlightChange, HighlightSink, LogSink, RecordingSink};
pub use transport::{Narrator, NarratorOptions, TransportState};
