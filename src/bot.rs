use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Stands in for a player at the keyboard, picking a key token at random each tick.
pub struct RandomBot {
    rng: StdRng,
    bomb_chance: f64,
}

const MOVES: [&str; 5] = ["U", "D", "L", "R", "N"];

impl RandomBot {
    pub fn new(seed: Option<u64>, bomb_chance: f64) -> RandomBot {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        RandomBot { rng, bomb_chance }
    }

    pub fn next_intent(&mut self) -> &'static str {
        if self.rng.gen_bool(self.bomb_chance) {
            "B"
        } else {
            MOVES[self.rng.gen_range(0, MOVES.len())]
        }
    }
}
