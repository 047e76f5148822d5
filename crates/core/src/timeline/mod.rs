use crate::{config::Playfield, song::EventStore};

/// Discrete tick counter. Starts at 0 and moves forward by exactly one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackClock {
    tick: u32,
}

impl PlaybackClock {
    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn reset(&mut self) {
        self.tick = 0;
    }

    pub fn advance(&mut self) {
        self.tick = self.tick.saturating_add(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Advancing,
    Finished,
}

/// Clock plus a monotonic head index into the event store.
///
/// Every event before `head` has either been scored or has fallen off the
/// bottom of the screen. The head never moves backwards, so no event is
/// revisited once it has been passed.
#[derive(Debug, Clone)]
pub struct PlaybackCursor {
    clock: PlaybackClock,
    head: usize,
    state: CursorState,
}

impl Default for PlaybackCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackCursor {
    pub fn new() -> Self {
        Self {
            clock: PlaybackClock::default(),
            head: 0,
            state: CursorState::Advancing,
        }
    }

    pub fn clock(&self) -> u32 {
        self.clock.tick()
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == CursorState::Finished
    }

    /// Moves the head past every leading event that has been scored or has
    /// dropped below the screen.
    pub fn catch_up(&mut self, store: &EventStore, playfield: &Playfield) {
        let clock = self.clock();
        while let Some(event) = store.get(self.head) {
            if !event.is_consumed() && !playfield.has_passed(event.timestamp, clock) {
                break;
            }
            self.head += 1;
        }
    }

    /// Ends the current tick: the clock moves on and the run finishes once
    /// every event has been resolved or passed.
    pub fn advance(&mut self, store: &EventStore) {
        self.clock.advance();
        if self.head >= store.len() {
            if self.state == CursorState::Advancing {
                tracing::debug!(clock = self.clock(), "playback finished");
            }
            self.state = CursorState::Finished;
        }
    }

    /// Index range the hit detector may inspect this tick.
    pub fn window(&self, store: &EventStore, lookahead: usize) -> std::ops::Range<usize> {
        let end = self.head.saturating_add(lookahead).min(store.len());
        self.head.min(end)..end
    }
}
