use serde::Serialize;
use tracing::debug;

use crate::{Direction, Error, Map, Positioned, PowerUpKind};

#[derive(Clone, Debug, Serialize)]
pub struct Agent {
    pos: (i32, i32),
    previous_pos: (i32, i32),
    spawn_pos: (i32, i32),
    speed: u8,
    bomb_capacity: u8,
    blast_radius: u8,
    lives: u8,
    alive: bool,
}

impl Agent {
    pub fn new(
        spawn_pos: (i32, i32),
        speed: u8,
        bomb_capacity: u8,
        blast_radius: u8,
        lives: u8,
    ) -> Self {
        Agent {
            pos: spawn_pos,
            previous_pos: spawn_pos,
            spawn_pos,
            speed,
            bomb_capacity,
            blast_radius,
            lives,
            alive: lives > 0,
        }
    }

    pub fn previous_position(&self) -> (i32, i32) {
        self.previous_pos
    }

    pub fn spawn_position(&self) -> (i32, i32) {
        self.spawn_pos
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn bomb_capacity(&self) -> u8 {
        self.bomb_capacity
    }

    pub fn blast_radius(&self) -> u8 {
        self.blast_radius
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    pub fn alive(&self) -> bool {
        self.alive
    }

    /// Tries to move `speed` cells in the given direction. Only the destination cell is checked,
    /// if it is a wall, a block or off the map the whole move is rejected and the agent stays
    /// where it was at the start of the tick. Returns whether the move was committed.
    pub fn try_move(&mut self, direction: Direction, map: &Map) -> bool {
        let dest = match map.calc_forward(self.pos, direction, self.speed as i32) {
            Ok(dest) => dest,
            Err(Error::OutOfBounds { x, y, .. }) => {
                debug!(from = ?self.pos, to = ?(x, y), "agent tried to move off the map");
                self.pos = self.previous_pos;
                return false;
            }
            Err(err) => {
                debug!(%err, "agent move rejected");
                self.pos = self.previous_pos;
                return false;
            }
        };

        match map.get_cell(dest.0, dest.1) {
            Ok(kind) if !kind.is_solid() => {
                self.pos = dest;
                self.previous_pos = dest;
                true
            }
            Ok(kind) => {
                debug!(from = ?self.pos, to = ?dest, ?kind, "agent move blocked");
                self.pos = self.previous_pos;
                false
            }
            Err(err) => {
                debug!(%err, "agent move rejected");
                self.pos = self.previous_pos;
                false
            }
        }
    }

    /// Whether another bomb can be placed given how many of this agent's bombs are still live.
    pub fn has_capacity(&self, live_bombs: usize) -> bool {
        live_bombs < self.bomb_capacity as usize
    }

    /// Takes a life and sends the agent back to its spawn point. Once the last life is gone the
    /// agent is marked dead and stays where it was hit.
    pub fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);

        if self.lives == 0 {
            self.alive = false;
        } else {
            self.pos = self.spawn_pos;
            self.previous_pos = self.spawn_pos;
        }
    }

    pub fn collect(&mut self, kind: PowerUpKind) {
        match kind {
            PowerUpKind::Bombs => self.bomb_capacity = self.bomb_capacity.saturating_add(1),
            PowerUpKind::Flames => self.blast_radius = self.blast_radius.saturating_add(1),
            PowerUpKind::Speed => self.speed = self.speed.saturating_add(1),
        }
    }
}

impl Positioned for Agent {
    fn position(&self) -> (i32, i32) {
        self.pos
    }
}
