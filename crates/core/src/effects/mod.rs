use crate::config::EffectsConfig;

/// Popup values at or above this are drawn in the `High` color.
pub const HIGH_VALUE_THRESHOLD: u32 = 9;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ColorClass {
    High,
    #[default]
    Low,
}

impl ColorClass {
    pub fn for_value(value: u32) -> Self {
        if value >= HIGH_VALUE_THRESHOLD {
            Self::High
        } else {
            Self::Low
        }
    }
}

/// Floating "+N" popup. Inactive once `life` reaches zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScoreEffect {
    pub x: i32,
    pub y: i32,
    pub value: u32,
    pub color: ColorClass,
    pub life: i32,
}

impl ScoreEffect {
    pub fn is_active(&self) -> bool {
        self.life > 0
    }
}

/// Fixed set of popup slots, allocated once and reused by index.
#[derive(Debug, Clone)]
pub struct EffectsPool {
    slots: Box<[ScoreEffect]>,
    lifetime: i32,
    rise_per_tick: i32,
}

impl EffectsPool {
    pub fn new(config: &EffectsConfig) -> Self {
        Self {
            slots: vec![ScoreEffect::default(); config.capacity].into_boxed_slice(),
            lifetime: config.lifetime,
            rise_per_tick: config.rise_per_tick,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Starts a popup in the first free slot. Returns the slot index, or
    /// `None` when every slot is busy and the popup was dropped.
    pub fn spawn(&mut self, x: i32, y: i32, value: u32) -> Option<usize> {
        let (index, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| !slot.is_active())?;
        *slot = ScoreEffect {
            x,
            y,
            value,
            color: ColorClass::for_value(value),
            life: self.lifetime,
        };
        Some(index)
    }

    /// Ages every active popup by one tick.
    pub fn tick(&mut self) {
        for slot in self.slots.iter_mut().filter(|slot| slot.is_active()) {
            slot.y -= self.rise_per_tick;
            slot.life -= 1;
        }
    }

    pub fn active(&self) -> impl Iterator<Item = &ScoreEffect> {
        self.slots.iter().filter(|slot| slot.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.life = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(capacity: usize, lifetime: i32) -> EffectsPool {
        EffectsPool::new(&EffectsConfig {
            capacity,
            lifetime,
            rise_per_tick: 1,
        })
    }

    #[test]
    fn popups_float_up_and_expire() {
        let mut pool = pool(2, 3);
        pool.spawn(10, 100, 10);

        pool.tick();
        let effect = *pool.active().next().unwrap();
        assert_eq!((effect.y, effect.life), (99, 2));
        assert_eq!(effect.color, ColorClass::High);

        pool.tick();
        pool.tick();
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn saturation_drops_excess_without_touching_active() {
        let mut pool = pool(3, 20);
        assert_eq!(pool.spawn(0, 0, 1), Some(0));
        pool.tick();
        assert_eq!(pool.spawn(0, 0, 2), Some(1));
        assert_eq!(pool.spawn(0, 0, 3), Some(2));

        assert_eq!(pool.spawn(0, 0, 4), None);
        assert_eq!(pool.spawn(0, 0, 5), None);

        let lives: Vec<i32> = pool.active().map(|effect| effect.life).collect();
        assert_eq!(lives, vec![19, 20, 20]);
    }

    #[test]
    fn expired_slots_are_reused() {
        let mut pool = pool(1, 1);
        pool.spawn(0, 0, 3);
        assert_eq!(pool.spawn(0, 0, 4), None);

        pool.tick();
        assert_eq!(pool.spawn(5, 5, 4), Some(0));
        assert_eq!(pool.active().next().unwrap().color, ColorClass::Low);
    }
}
