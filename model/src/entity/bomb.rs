use serde::Serialize;

use crate::{EntityId, Map, Positioned};

/// Lifecycle of a bomb. Transitions only ever go forwards:
/// `Armed -> Detonating -> Spent`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BombState {
    Armed,
    Detonating,
    Spent,
}

#[derive(Clone, Debug, Serialize)]
pub struct Bomb {
    owner_id: EntityId,
    pos: (i32, i32),
    blast_radius: u8,
    countdown: i32,
    state: BombState,
}

impl Bomb {
    pub fn new(owner_id: EntityId, pos: (i32, i32), blast_radius: u8, fuse_ticks: i32) -> Self {
        Bomb {
            owner_id,
            pos,
            blast_radius,
            countdown: fuse_ticks,
            state: BombState::Armed,
        }
    }

    pub fn owner_id(&self) -> EntityId {
        self.owner_id
    }

    pub fn blast_radius(&self) -> u8 {
        self.blast_radius
    }

    pub fn countdown(&self) -> i32 {
        self.countdown
    }

    pub fn state(&self) -> BombState {
        self.state
    }

    /// Armed and detonating bombs both count against the owner's capacity.
    pub fn is_live(&self) -> bool {
        self.state != BombState::Spent
    }

    /// Advances the fuse by one tick. Returns true if the fuse has burnt out and the bomb should
    /// detonate this tick.
    pub fn tick(&mut self) -> bool {
        if self.state != BombState::Armed {
            return false;
        }

        self.countdown -= 1;
        self.countdown <= 0
    }

    /// Caught in another blast: burn the fuse out so it goes off in the same tick.
    pub fn force_detonation(&mut self) {
        if self.state == BombState::Armed {
            self.countdown = 0;
        }
    }

    /// Moves an armed bomb with a burnt out fuse into `Detonating` and returns its footprint.
    ///
    /// Returns None if the bomb has already detonated (or isn't ready) which guarantees the blast
    /// is only ever applied once.
    pub fn begin_detonation(&mut self, map: &Map) -> Option<Footprint> {
        if self.state != BombState::Armed || self.countdown > 0 {
            return None;
        }

        self.state = BombState::Detonating;
        Some(self.footprint(map))
    }

    /// Called once the blast has been applied.
    pub fn finish_detonation(&mut self) {
        debug_assert_eq!(self.state, BombState::Detonating);
        self.state = BombState::Spent;
    }

    /// The square of side `2 * blast_radius + 1` centred on the bomb, clipped to the map.
    pub fn footprint(&self, map: &Map) -> Footprint {
        let r = self.blast_radius as i32;
        let (x, y) = self.pos;

        Footprint {
            min: ((x - r).max(0), (y - r).max(0)),
            max: (
                (x + r).min(map.width() as i32 - 1),
                (y + r).min(map.height() as i32 - 1),
            ),
        }
    }
}

impl Positioned for Bomb {
    fn position(&self) -> (i32, i32) {
        self.pos
    }
}

/// The cells covered by a single detonation (inclusive bounds).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Footprint {
    pub min: (i32, i32),
    pub max: (i32, i32),
}

impl Footprint {
    pub fn contains(&self, (x, y): (i32, i32)) -> bool {
        x >= self.min.0 && x <= self.max.0 && y >= self.min.1 && y <= self.max.1
    }

    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> {
        let (min, max) = (self.min, self.max);
        (min.0..=max.0).flat_map(move |x| (min.1..=max.1).map(move |y| (x, y)))
    }
}
