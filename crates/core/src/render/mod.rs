use crate::{
    config::Playfield,
    effects::{EffectsPool, ScoreEffect},
    playback::PlaySession,
    record::Recorder,
    song::{EventStore, Lane},
    Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Capture,
    Playback,
}

/// A note on screen: top-left corner of its sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleNote {
    pub index: usize,
    pub lane: Lane,
    pub x: i32,
    pub y: i64,
}

/// Everything a renderer needs for one tick, borrowed from the running session.
#[derive(Debug, Clone, Copy)]
pub struct RenderFrame<'a> {
    pub mode: Mode,
    pub status: &'a str,
    pub clock: u32,
    pub score: u32,
    pub best_score: u32,
    store: &'a EventStore,
    head: usize,
    playfield: &'a Playfield,
    effects: Option<&'a EffectsPool>,
}

impl<'a> RenderFrame<'a> {
    /// Frame for a capture session: recorded notes, no score.
    pub fn capture(status: &'a str, recorder: &'a Recorder) -> Self {
        Self {
            mode: Mode::Capture,
            status,
            clock: recorder.clock(),
            score: 0,
            best_score: 0,
            store: recorder.store(),
            head: 0,
            playfield: recorder.playfield(),
            effects: None,
        }
    }

    /// Frame for a playback session at its current tick.
    pub fn playback(status: &'a str, session: &'a PlaySession) -> Self {
        Self {
            mode: Mode::Playback,
            status,
            clock: session.cursor().clock(),
            score: session.score(),
            best_score: session.best_score(),
            store: session.store(),
            head: session.cursor().head(),
            playfield: session.playfield(),
            effects: Some(session.effects()),
        }
    }

    /// Notes inside the screen, in drawing order.
    ///
    /// Playback walks forward from the head and skips scored notes; capture
    /// walks backwards from the newest note as recorded notes rise away
    /// from the hit line. Both stop at the first note above the top edge.
    pub fn visible_notes(&self) -> VisibleNotes<'a> {
        let next = match self.mode {
            Mode::Playback => self.head,
            Mode::Capture => self.store.len(),
        };
        VisibleNotes {
            mode: self.mode,
            clock: self.clock,
            store: self.store,
            playfield: self.playfield,
            next,
            done: false,
        }
    }

    pub fn effects(&self) -> impl Iterator<Item = &'a ScoreEffect> {
        self.effects.into_iter().flat_map(|pool| pool.active())
    }

    pub fn playfield(&self) -> &'a Playfield {
        self.playfield
    }
}

#[derive(Debug, Clone)]
pub struct VisibleNotes<'a> {
    mode: Mode,
    clock: u32,
    store: &'a EventStore,
    playfield: &'a Playfield,
    next: usize,
    done: bool,
}

impl VisibleNotes<'_> {
    fn next_index(&mut self) -> Option<usize> {
        match self.mode {
            Mode::Playback => {
                let index = self.next;
                self.next += 1;
                (index < self.store.len()).then_some(index)
            }
            Mode::Capture => {
                self.next = self.next.checked_sub(1)?;
                Some(self.next)
            }
        }
    }
}

impl Iterator for VisibleNotes<'_> {
    type Item = VisibleNote;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let Some(index) = self.next_index() else {
                self.done = true;
                break;
            };
            let Some(event) = self.store.get(index) else {
                self.done = true;
                break;
            };
            if event.is_consumed() {
                continue;
            }

            let y = match self.mode {
                Mode::Playback => self.playfield.note_y(event.timestamp, self.clock),
                Mode::Capture => {
                    i64::from(self.playfield.hit_line_y)
                        + self.playfield.offset(event.timestamp, self.clock)
                }
            };
            if y < -i64::from(self.playfield.note_height) {
                self.done = true;
                break;
            }
            if y < i64::from(self.playfield.screen_height) {
                return Some(VisibleNote {
                    index,
                    lane: event.lane,
                    x: self.playfield.lane_x(event.lane),
                    y,
                });
            }
        }
        None
    }
}

/// Display collaborator handed one frame per tick.
pub trait Renderer {
    fn present(&mut self, frame: &RenderFrame<'_>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::GameConfig,
        input::InputSample,
        storage::SlotId,
    };

    #[derive(Default)]
    struct LastFrame {
        notes: Vec<(usize, i64)>,
        effects: usize,
    }

    impl Renderer for LastFrame {
        fn present(&mut self, frame: &RenderFrame<'_>) -> Result<()> {
            self.notes = frame.visible_notes().map(|n| (n.index, n.y)).collect();
            self.effects = frame.effects().count();
            Ok(())
        }
    }

    fn lane(index: u8) -> Lane {
        Lane::new(index).unwrap()
    }

    #[test]
    fn playback_shows_unscored_notes_between_top_and_bottom() {
        let mut store = EventStore::with_capacity(16);
        for (timestamp, index) in [(40, 0), (45, 1), (100, 2), (120, 1), (140, 3), (300, 4)] {
            store.append(timestamp, lane(index));
        }
        let config = GameConfig::default();
        let mut play = PlaySession::new(SlotId::new(1, 4).unwrap(), store, 0, &config);
        let mut frame = LastFrame::default();

        for _ in 0..100 {
            play.tick(&InputSample::default(), &mut frame).unwrap();
        }
        play.tick(&InputSample::with_lanes([lane(2)]), &mut frame).unwrap();

        // t=100 was just scored, t=120 sits at y=120, t=140 at y=60, and
        // t=300 far above the screen ends the walk.
        assert_eq!(frame.notes, vec![(3, 120), (4, 60)]);
        assert_eq!(frame.effects, 1);
    }

    #[test]
    fn capture_shows_newest_notes_rising() {
        let mut recorder = Recorder::new(&GameConfig::default());
        let mut frame = LastFrame::default();
        recorder.start();

        for tick in 0..=100 {
            let sample = match tick {
                0 => InputSample::with_lanes([lane(0)]),
                50 => InputSample::with_lanes([lane(1)]),
                95 => InputSample::with_lanes([lane(2)]),
                _ => InputSample::default(),
            };
            recorder.tick(&sample, &mut frame).unwrap();
        }

        assert_eq!(frame.notes, vec![(2, 165), (1, 30)]);
        assert_eq!(frame.effects, 0);
    }
}
