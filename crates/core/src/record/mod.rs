use crate::{
    config::{GameConfig, Playfield},
    input::{EdgeTracker, InputSample, InputSource},
    render::{RenderFrame, Renderer},
    song::EventStore,
    storage::{save_slot, SlotId, SlotStorage},
    timeline::PlaybackClock,
    LanebeatError, Result,
};

const STATUS: &str = "RECORDING... press exit to finish";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    Recording,
    Stopped,
}

/// Capture session: turns lane presses into a timestamped song.
#[derive(Debug)]
pub struct Recorder {
    store: EventStore,
    clock: PlaybackClock,
    edges: EdgeTracker,
    playfield: Playfield,
    is_recording: bool,
    saturated: bool,
}

impl Recorder {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            store: EventStore::with_capacity(config.max_events),
            clock: PlaybackClock::default(),
            edges: EdgeTracker::new(),
            playfield: config.playfield.clone(),
            is_recording: false,
            saturated: false,
        }
    }

    /// Begins a fresh capture, discarding anything recorded before.
    pub fn start(&mut self) {
        self.store.clear();
        self.clock.reset();
        self.edges = EdgeTracker::new();
        self.saturated = false;
        self.is_recording = true;
        tracing::debug!(capacity = self.store.capacity(), "capture started");
    }

    pub fn stop(&mut self) {
        if self.is_recording {
            tracing::debug!(
                events = self.store.len(),
                ticks = self.clock.tick(),
                "capture stopped"
            );
        }
        self.is_recording = false;
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn clock(&self) -> u32 {
        self.clock.tick()
    }

    pub fn playfield(&self) -> &Playfield {
        &self.playfield
    }

    /// Runs one capture tick. An exit edge stops the capture before any
    /// press of the same tick is recorded.
    pub fn tick<R: Renderer>(
        &mut self,
        sample: &InputSample,
        renderer: &mut R,
    ) -> Result<CaptureStatus> {
        if !self.is_recording {
            return Ok(CaptureStatus::Stopped);
        }

        let edges = self.edges.update(sample);
        if edges.exit {
            self.stop();
            return Ok(CaptureStatus::Stopped);
        }

        let now = self.clock.tick();
        for lane in edges.pressed_lanes() {
            match self.store.try_append(now, lane) {
                Ok(()) => {}
                Err(LanebeatError::CapacityExceeded { capacity }) => {
                    if !self.saturated {
                        tracing::warn!(capacity, "song is full, further presses are ignored");
                        self.saturated = true;
                    }
                }
                Err(err) => return Err(err),
            }
        }

        renderer.present(&RenderFrame::capture(STATUS, self))?;
        self.clock.advance();
        Ok(CaptureStatus::Recording)
    }

    /// Captures until the input signals exit.
    pub fn run<I: InputSource, R: Renderer>(&mut self, input: &mut I, renderer: &mut R) -> Result<()> {
        if !self.is_recording {
            self.start();
        }
        while self.tick(&input.sample(), renderer)? == CaptureStatus::Recording {}
        Ok(())
    }

    /// Stores the capture in `slot`. A new song always starts with a best
    /// score of zero.
    pub fn save<S: SlotStorage>(&self, storage: &S, slot: SlotId) -> Result<()> {
        save_slot(storage, slot, &self.store, 0)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{
        input::InputScript,
        song::Lane,
        storage::{load_slot, FileSlots},
    };

    #[derive(Default)]
    struct CountingRenderer {
        frames: usize,
        last_notes: usize,
    }

    impl Renderer for CountingRenderer {
        fn present(&mut self, frame: &RenderFrame<'_>) -> Result<()> {
            self.frames += 1;
            self.last_notes = frame.visible_notes().count();
            Ok(())
        }
    }

    fn lane(index: u8) -> Lane {
        Lane::new(index).unwrap()
    }

    fn pairs(store: &EventStore) -> Vec<(u32, u8)> {
        store
            .events()
            .iter()
            .map(|e| (e.timestamp, u8::from(e.lane)))
            .collect()
    }

    #[test]
    fn records_rising_edges_with_tick_timestamps() {
        let mut recorder = Recorder::new(&GameConfig::default());
        let mut renderer = CountingRenderer::default();
        recorder.start();

        let held = InputSample::with_lanes([lane(0)]);
        let both = InputSample::with_lanes([lane(0), lane(2)]);
        for sample in [held, held, both, InputSample::default(), held] {
            recorder.tick(&sample, &mut renderer).unwrap();
        }

        assert_eq!(pairs(recorder.store()), vec![(0, 0), (2, 2), (4, 0)]);
        assert_eq!(renderer.frames, 5);
        assert_eq!(renderer.last_notes, 3);
    }

    #[test]
    fn exit_stops_without_recording_that_tick() {
        let mut recorder = Recorder::new(&GameConfig::default());
        let mut renderer = CountingRenderer::default();
        recorder.start();

        let mut sample = InputSample::with_lanes([lane(1)]);
        sample.exit = true;
        let status = recorder.tick(&sample, &mut renderer).unwrap();

        assert_eq!(status, CaptureStatus::Stopped);
        assert!(recorder.store().is_empty());
        assert!(!recorder.is_recording());
        assert_eq!(renderer.frames, 0);
    }

    #[test]
    fn fast_input_never_exceeds_capacity() {
        let config = GameConfig {
            max_events: 7,
            ..GameConfig::default()
        };
        let mut recorder = Recorder::new(&config);
        let mut renderer = CountingRenderer::default();
        recorder.start();

        let all = InputSample::with_lanes(Lane::all());
        for _ in 0..10 {
            recorder.tick(&all, &mut renderer).unwrap();
            recorder.tick(&InputSample::default(), &mut renderer).unwrap();
            assert!(recorder.store().len() <= 7);
        }

        let events = recorder.store().events();
        assert_eq!(events.len(), 7);
        assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn scripted_capture_saves_with_zero_best_score() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileSlots::new(temp_dir.path(), 4);
        let slot = storage.slot(1).unwrap();

        let script = InputScript::from_json(
            r#"{ "presses": [ { "tick": 3, "lane": 1 }, { "tick": 9, "lane": 4 } ] }"#,
        )
        .unwrap();
        let mut recorder = Recorder::new(&GameConfig::default());
        recorder
            .run(
                &mut script.exit_after_last_press().into_source(),
                &mut CountingRenderer::default(),
            )
            .unwrap();
        recorder.save(&storage, slot).unwrap();

        let mut loaded = EventStore::with_capacity(16);
        let best = load_slot(&storage, slot, &mut loaded).unwrap();
        assert_eq!(best, 0);
        assert_eq!(pairs(&loaded), vec![(3, 1), (9, 4)]);
        assert_eq!(recorder.clock(), 11);
    }
}
