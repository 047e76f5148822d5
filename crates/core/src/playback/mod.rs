use crate::{
    config::{GameConfig, Playfield},
    effects::EffectsPool,
    input::{EdgeTracker, InputSample, InputSource},
    judge::{HitDetector, TickHits},
    render::{RenderFrame, Renderer},
    song::EventStore,
    storage::{load_slot, save_slot, SlotId, SlotStorage},
    timeline::PlaybackCursor,
    Result,
};

const STATUS: &str = "PLAYING";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayStatus {
    Playing,
    Finished,
    Cancelled,
}

/// Result of a completed or cancelled run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayOutcome {
    pub slot: SlotId,
    pub status: PlayStatus,
    pub score: u32,
    pub best_score: u32,
    pub new_record: bool,
    /// Whether a new best score made it to storage.
    pub persisted: bool,
}

/// Playback session owning the loaded song and all per-run state.
#[derive(Debug)]
pub struct PlaySession {
    slot: SlotId,
    store: EventStore,
    cursor: PlaybackCursor,
    detector: HitDetector,
    effects: EffectsPool,
    edges: EdgeTracker,
    playfield: Playfield,
    score: u32,
    best_score: u32,
    status: PlayStatus,
}

impl PlaySession {
    /// Loads `slot` and prepares a run. Fails with `SlotEmpty` when there is
    /// nothing to play.
    pub fn load<S: SlotStorage>(storage: &S, slot: SlotId, config: &GameConfig) -> Result<Self> {
        let mut store = EventStore::with_capacity(config.max_events);
        let best_score = load_slot(storage, slot, &mut store)?;
        Ok(Self::new(slot, store, best_score, config))
    }

    pub fn new(slot: SlotId, mut store: EventStore, best_score: u32, config: &GameConfig) -> Self {
        store.reset_consumed();
        Self {
            slot,
            store,
            cursor: PlaybackCursor::new(),
            detector: HitDetector::new(&config.judge),
            effects: EffectsPool::new(&config.effects),
            edges: EdgeTracker::new(),
            playfield: config.playfield.clone(),
            score: 0,
            best_score,
            status: PlayStatus::Playing,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    pub fn status(&self) -> PlayStatus {
        self.status
    }

    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn effects(&self) -> &EffectsPool {
        &self.effects
    }

    pub fn playfield(&self) -> &Playfield {
        &self.playfield
    }

    /// Runs one playback tick and returns the hits it resolved.
    ///
    /// Order within a tick: exit check, head catch-up, hit detection,
    /// rendering, effect aging, clock advance, end check. Hits on the last
    /// tick therefore still count.
    pub fn tick<R: Renderer>(&mut self, sample: &InputSample, renderer: &mut R) -> Result<TickHits> {
        if self.status != PlayStatus::Playing {
            return Ok(TickHits::default());
        }

        let edges = self.edges.update(sample);
        if edges.exit {
            tracing::debug!(slot = %self.slot, clock = self.cursor.clock(), "playback cancelled");
            self.status = PlayStatus::Cancelled;
            return Ok(TickHits::default());
        }

        self.cursor.catch_up(&self.store, &self.playfield);
        let hits = self.detector.detect(
            &mut self.store,
            &self.cursor,
            &edges,
            &self.playfield,
            &mut self.effects,
        );
        self.score = self.score.saturating_add(hits.total());

        renderer.present(&RenderFrame::playback(STATUS, self))?;

        self.effects.tick();
        self.cursor.advance(&self.store);
        if self.cursor.is_finished() {
            self.status = PlayStatus::Finished;
        }
        Ok(hits)
    }

    /// Plays until the song ends or the input signals exit.
    pub fn run<I: InputSource, R: Renderer>(
        &mut self,
        input: &mut I,
        renderer: &mut R,
    ) -> Result<PlayStatus> {
        while self.status == PlayStatus::Playing {
            self.tick(&input.sample(), renderer)?;
        }
        Ok(self.status)
    }

    /// Closes the run. A finished run that beats the slot's best score
    /// re-saves the slot with the same song and the new best; a cancelled
    /// run never touches storage.
    pub fn finish<S: SlotStorage>(self, storage: &S) -> PlayOutcome {
        let new_record = self.status == PlayStatus::Finished && self.score > self.best_score;
        let mut outcome = PlayOutcome {
            slot: self.slot,
            status: self.status,
            score: self.score,
            best_score: self.best_score,
            new_record,
            persisted: false,
        };
        if !new_record {
            return outcome;
        }

        outcome.best_score = self.score;
        match save_slot(storage, self.slot, &self.store, self.score) {
            Ok(()) => outcome.persisted = true,
            Err(err) => {
                tracing::warn!(slot = %self.slot, error = %err, "could not store new best score")
            }
        }
        outcome
    }
}
