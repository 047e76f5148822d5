//! Core library for the Lanebeat rhythm game.
//!
//! A song is a list of timestamped lane presses. Capture records one from
//! live input, playback replays it as falling notes and scores presses by
//! how close they land to the hit line. Each module owns one piece of that
//! loop: the event store, the tick cursor, hit detection, score popups and
//! the binary slot format used to keep songs between sessions.

pub mod config;
pub mod effects;
pub mod error;
pub mod input;
pub mod judge;
pub mod playback;
pub mod record;
pub mod render;
pub mod song;
pub mod storage;
pub mod timeline;

pub use config::{EffectsConfig, GameConfig, JudgeConfig, Playfield, StorageConfig};
pub use effects::{ColorClass, EffectsPool, ScoreEffect};
pub use error::{LanebeatError, Result};
pub use input::{EdgeTracker, Edges, InputSample, InputScript, InputSource, ScriptedInput};
pub use judge::{score_for_distance, Hit, HitDetector, TickHits};
pub use playback::{PlayOutcome, PlaySession, PlayStatus};
pub use record::{CaptureStatus, Recorder};
pub use render::{Mode, RenderFrame, Renderer, VisibleNote};
pub use song::{Event, EventStore, Lane, LANE_COUNT};
pub use storage::{FileSlots, SlotId, SlotStorage, SlotSummary};
pub use timeline::{CursorState, PlaybackClock, PlaybackCursor};
