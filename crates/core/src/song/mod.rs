use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{LanebeatError, Result};

/// Number of lane inputs on the playfield.
pub const LANE_COUNT: usize = 5;

/// Index of a lane, always within `0..LANE_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Lane(u8);

impl Lane {
    pub fn new(index: u8) -> Option<Self> {
        ((index as usize) < LANE_COUNT).then_some(Self(index))
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub fn all() -> impl Iterator<Item = Lane> {
        (0..LANE_COUNT as u8).map(Lane)
    }
}

impl TryFrom<u8> for Lane {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Lane::new(value).ok_or_else(|| format!("lane {value} is out of range"))
    }
}

impl From<Lane> for u8 {
    fn from(lane: Lane) -> Self {
        lane.0
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single recorded lane press.
///
/// `timestamp` and `lane` never change once recorded; `consumed` is play
/// state and is not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub timestamp: u32,
    pub lane: Lane,
    consumed: bool,
}

impl Event {
    pub fn new(timestamp: u32, lane: Lane) -> Self {
        Self {
            timestamp,
            lane,
            consumed: false,
        }
    }

    /// True once the event has been scored during the current run.
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }
}

/// Fixed-capacity, timestamp-ordered sequence of events (the "song").
///
/// The backing storage is allocated once; appends past capacity are
/// refused and never reallocate.
#[derive(Debug, Clone)]
pub struct EventStore {
    events: Vec<Event>,
    capacity: usize,
}

impl EventStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.events.len() >= self.capacity
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    /// Appends an event, failing once the store is full.
    ///
    /// Callers are responsible for feeding timestamps in non-decreasing
    /// order; the store never re-sorts.
    pub fn try_append(&mut self, timestamp: u32, lane: Lane) -> Result<()> {
        if self.is_full() {
            return Err(LanebeatError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.events.push(Event::new(timestamp, lane));
        Ok(())
    }

    /// Saturating append: a full store silently ignores the event.
    /// Returns whether the event was stored.
    pub fn append(&mut self, timestamp: u32, lane: Lane) -> bool {
        self.try_append(timestamp, lane).is_ok()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Marks the event at `index` as scored. Returns `false` when it already was.
    pub fn mark_consumed(&mut self, index: usize) -> bool {
        match self.events.get_mut(index) {
            Some(event) if !event.consumed => {
                event.consumed = true;
                true
            }
            _ => false,
        }
    }

    /// Makes every event hittable again for a fresh run.
    pub fn reset_consumed(&mut self) {
        for event in &mut self.events {
            event.consumed = false;
        }
    }
}
