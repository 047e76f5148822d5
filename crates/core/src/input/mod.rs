use serde::{Deserialize, Serialize};

use crate::{
    song::{Lane, LANE_COUNT},
    Result,
};

/// Level state of every input for one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InputSample {
    pub lanes: [bool; LANE_COUNT],
    pub exit: bool,
}

impl InputSample {
    pub fn with_lanes(lanes: impl IntoIterator<Item = Lane>) -> Self {
        let mut sample = Self::default();
        for lane in lanes {
            sample.lanes[lane.index()] = true;
        }
        sample
    }

    pub fn exit() -> Self {
        Self {
            exit: true,
            ..Self::default()
        }
    }
}

/// Device collaborator polled once per tick.
pub trait InputSource {
    fn sample(&mut self) -> InputSample;
}

/// Rising edges (pressed this tick, released the tick before).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Edges {
    pub lanes: [bool; LANE_COUNT],
    pub exit: bool,
}

impl Edges {
    pub fn lane(&self, lane: Lane) -> bool {
        self.lanes[lane.index()]
    }

    pub fn pressed_lanes(&self) -> impl Iterator<Item = Lane> + '_ {
        Lane::all().filter(|lane| self.lane(*lane))
    }
}

/// Remembers the previous tick's sample so edges can be derived.
#[derive(Debug, Default, Clone)]
pub struct EdgeTracker {
    previous: InputSample,
}

impl EdgeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes this tick's edges and remembers `sample` for the next one.
    pub fn update(&mut self, sample: &InputSample) -> Edges {
        let mut edges = Edges {
            exit: sample.exit && !self.previous.exit,
            ..Edges::default()
        };
        for (index, edge) in edges.lanes.iter_mut().enumerate() {
            *edge = sample.lanes[index] && !self.previous.lanes[index];
        }
        self.previous = *sample;
        edges
    }
}

/// A single scripted key press, held for exactly one tick.
///
/// Presses in the same lane on consecutive ticks read as one held key and
/// produce a single rising edge; leave a tick between them for two edges.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScriptedPress {
    pub tick: u32,
    pub lane: Lane,
}

/// Recorded input used in place of a keypad.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputScript {
    #[serde(default)]
    pub presses: Vec<ScriptedPress>,
    /// Tick on which the exit input goes down. Without one the script
    /// never asks to exit.
    #[serde(default)]
    pub exit_at: Option<u32>,
}

impl InputScript {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Fills in a missing `exit_at` with the tick after the last press is
    /// released, so open-ended sessions such as capture stop on their own.
    pub fn exit_after_last_press(mut self) -> Self {
        if self.exit_at.is_none() {
            let last = self.presses.iter().map(|press| press.tick).max();
            self.exit_at = Some(last.map_or(0, |tick| tick.saturating_add(2)));
        }
        self
    }

    pub fn into_source(self) -> ScriptedInput {
        ScriptedInput::new(self)
    }
}

/// Replays an [`InputScript`] one tick per call to [`InputSource::sample`].
#[derive(Debug, Clone)]
pub struct ScriptedInput {
    presses: Vec<ScriptedPress>,
    next: usize,
    exit_at: Option<u32>,
    tick: u32,
}

impl ScriptedInput {
    pub fn new(script: InputScript) -> Self {
        let mut presses = script.presses;
        presses.sort_by_key(|press| press.tick);
        Self {
            presses,
            next: 0,
            exit_at: script.exit_at,
            tick: 0,
        }
    }
}

impl InputSource for ScriptedInput {
    fn sample(&mut self) -> InputSample {
        let mut sample = InputSample {
            exit: self.exit_at.is_some_and(|exit_at| self.tick >= exit_at),
            ..InputSample::default()
        };
        while let Some(press) = self.presses.get(self.next) {
            if press.tick > self.tick {
                break;
            }
            if press.tick == self.tick {
                sample.lanes[press.lane.index()] = true;
            }
            self.next += 1;
        }
        self.tick = self.tick.saturating_add(1);
        sample
    }
}
