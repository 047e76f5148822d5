use crate::{
    config::{JudgeConfig, Playfield},
    effects::EffectsPool,
    input::Edges,
    song::{EventStore, Lane, LANE_COUNT},
    timeline::PlaybackCursor,
};

/// Reward for a hit dead on the hit line.
pub const MAX_HIT_SCORE: u32 = 10;

// Popup text is nudged to sit roughly centred above the lane.
const POPUP_X_OFFSET: i32 = -8;
const POPUP_Y_OFFSET: i32 = -10;

/// Reward for a hit `distance` screen units away from the hit line.
///
/// Decays by one point every two units, never dropping below 1.
pub fn score_for_distance(distance: i64) -> u32 {
    let decay = (distance.unsigned_abs() / 2).min(u64::from(MAX_HIT_SCORE));
    (MAX_HIT_SCORE - decay as u32).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub index: usize,
    pub lane: Lane,
    pub distance: i64,
    pub score: u32,
}

/// Hits resolved during one tick; at most one per lane.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickHits {
    by_lane: [Option<Hit>; LANE_COUNT],
}

impl TickHits {
    pub fn iter(&self) -> impl Iterator<Item = &Hit> {
        self.by_lane.iter().flatten()
    }

    pub fn lane(&self, lane: Lane) -> Option<&Hit> {
        self.by_lane[lane.index()].as_ref()
    }

    pub fn total(&self) -> u32 {
        self.iter().map(|hit| hit.score).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

/// Matches rising lane edges against the events near the cursor head.
#[derive(Debug, Clone)]
pub struct HitDetector {
    hit_window: i64,
    lookahead: usize,
}

impl HitDetector {
    pub fn new(config: &JudgeConfig) -> Self {
        Self {
            hit_window: config.hit_window,
            lookahead: config.lookahead,
        }
    }

    pub fn hit_window(&self) -> i64 {
        self.hit_window
    }

    pub fn is_eligible(&self, distance: i64) -> bool {
        distance.abs() <= self.hit_window
    }

    /// Resolves this tick's hits.
    ///
    /// Only `lookahead` events from the head are considered. Each lane edge
    /// claims the earliest eligible unconsumed event in its lane; claimed
    /// events are marked consumed and spawn a popup.
    pub fn detect(
        &self,
        store: &mut EventStore,
        cursor: &PlaybackCursor,
        edges: &Edges,
        playfield: &Playfield,
        effects: &mut EffectsPool,
    ) -> TickHits {
        let mut hits = TickHits::default();
        if edges.lanes.iter().all(|down| !down) {
            return hits;
        }

        let clock = cursor.clock();
        for index in cursor.window(store, self.lookahead) {
            let Some(event) = store.get(index).copied() else {
                break;
            };
            if event.is_consumed() || !edges.lane(event.lane) {
                continue;
            }
            if hits.by_lane[event.lane.index()].is_some() {
                continue;
            }

            let distance = playfield.offset(event.timestamp, clock).abs();
            if !self.is_eligible(distance) {
                continue;
            }

            let score = score_for_distance(distance);
            store.mark_consumed(index);
            let spawned = effects.spawn(
                playfield.lane_x(event.lane) + playfield.lane_width / 2 + POPUP_X_OFFSET,
                playfield.hit_line_y + POPUP_Y_OFFSET,
                score,
            );
            if spawned.is_none() {
                tracing::trace!(index, "effects pool full, dropping popup");
            }

            hits.by_lane[event.lane.index()] = Some(Hit {
                index,
                lane: event.lane,
                distance,
                score,
            });
        }

        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::EffectsConfig, effects::ColorClass, input::InputSample};

    fn lane(index: u8) -> Lane {
        Lane::new(index).unwrap()
    }

    fn press(lanes: &[u8]) -> Edges {
        let mut edges = Edges::default();
        for &index in lanes {
            edges.lanes[index as usize] = true;
        }
        edges
    }

    struct Rig {
        store: EventStore,
        cursor: PlaybackCursor,
        detector: HitDetector,
        field: Playfield,
        effects: EffectsPool,
    }

    impl Rig {
        fn new(events: &[(u32, u8)]) -> Self {
            let mut store = EventStore::with_capacity(64);
            for &(timestamp, index) in events {
                store.append(timestamp, lane(index));
            }
            Self {
                store,
                cursor: PlaybackCursor::new(),
                detector: HitDetector::new(&JudgeConfig::default()),
                field: Playfield::default(),
                effects: EffectsPool::new(&EffectsConfig::default()),
            }
        }

        fn run_to(&mut self, tick: u32) {
            while self.cursor.clock() < tick {
                self.cursor.catch_up(&self.store, &self.field);
                self.cursor.advance(&self.store);
            }
            self.cursor.catch_up(&self.store, &self.field);
        }

        fn detect(&mut self, edges: &Edges) -> TickHits {
            self.detector.detect(
                &mut self.store,
                &self.cursor,
                edges,
                &self.field,
                &mut self.effects,
            )
        }
    }

    #[test]
    fn score_decays_linearly_with_distance() {
        assert_eq!(score_for_distance(0), 10);
        assert_eq!(score_for_distance(1), 10);
        assert_eq!(score_for_distance(3), 9);
        assert_eq!(score_for_distance(-3), 9);
        assert_eq!(score_for_distance(15), 3);
        assert_eq!(score_for_distance(18), 1);
        assert_eq!(score_for_distance(1_000), 1);
    }

    #[test]
    fn hit_window_boundary_is_inclusive() {
        let detector = HitDetector::new(&JudgeConfig {
            hit_window: 15,
            lookahead: 6,
        });

        assert!(detector.is_eligible(15));
        assert!(detector.is_eligible(-15));
        assert!(!detector.is_eligible(16));
    }

    #[test]
    fn boundary_distance_scores_and_one_past_does_not() {
        // Speed 1 so that every tick is one unit of distance.
        let mut rig = Rig::new(&[(100, 0), (200, 1)]);
        rig.field.note_speed = 1;

        rig.run_to(85);
        assert_eq!(rig.detect(&press(&[0])).total(), score_for_distance(15));

        rig.run_to(184);
        assert!(rig.detect(&press(&[1])).is_empty());
    }

    #[test]
    fn exact_hit_scores_maximum_and_spawns_popup() {
        let mut rig = Rig::new(&[(100, 2)]);
        rig.run_to(100);

        let hits = rig.detect(&press(&[2]));
        let hit = hits.lane(lane(2)).unwrap();
        assert_eq!((hit.index, hit.distance, hit.score), (0, 0, 10));

        let popup = rig.effects.active().next().unwrap();
        assert_eq!((popup.x, popup.y, popup.value), (152, 170, 10));
        assert_eq!(popup.color, ColorClass::High);
    }

    #[test]
    fn wrong_lane_or_out_of_window_does_nothing() {
        let mut rig = Rig::new(&[(100, 0)]);
        rig.run_to(94);

        assert!(rig.detect(&press(&[0])).is_empty());
        rig.run_to(100);
        assert!(rig.detect(&press(&[1])).is_empty());
        assert!(!rig.store.events()[0].is_consumed());
    }

    #[test]
    fn consumed_events_never_score_again() {
        let mut rig = Rig::new(&[(100, 0)]);
        rig.run_to(99);
        assert_eq!(rig.detect(&press(&[0])).total(), 9);

        for tick in 100..106 {
            rig.run_to(tick);
            assert!(rig.detect(&press(&[0])).is_empty());
        }
    }

    #[test]
    fn one_edge_claims_only_the_earliest_event_per_lane() {
        let mut rig = Rig::new(&[(100, 0), (101, 0), (101, 3)]);
        rig.run_to(100);

        let hits = rig.detect(&press(&[0, 3]));
        assert_eq!(hits.lane(lane(0)).unwrap().index, 0);
        assert_eq!(hits.lane(lane(3)).unwrap().index, 2);
        assert!(!rig.store.events()[1].is_consumed());

        rig.run_to(101);
        let hits = rig.detect(&press(&[0]));
        assert_eq!(hits.lane(lane(0)).unwrap().index, 1);
    }

    #[test]
    fn only_the_lookahead_window_is_inspected() {
        let events: Vec<(u32, u8)> = (0..8).map(|i| (100, (i % 2) as u8)).collect();
        let mut rig = Rig::new(&events);
        rig.detector = HitDetector::new(&JudgeConfig {
            hit_window: 15,
            lookahead: 2,
        });
        rig.run_to(100);

        let mut scored = 0;
        for _ in 0..6 {
            scored += rig.detect(&press(&[0, 1])).iter().count();
        }
        assert_eq!(scored, 2);
    }

    #[test]
    fn tick_zero_events_are_hittable() {
        let mut rig = Rig::new(&[(0, 4)]);
        rig.run_to(0);

        let sample = InputSample::with_lanes([lane(4)]);
        assert_eq!(rig.detect(&Edges { lanes: sample.lanes, exit: false }).total(), 10);
    }
}
