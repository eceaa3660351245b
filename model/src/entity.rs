use std::str::FromStr;

use serde::Serialize;

use crate::{Error, PowerUp};

mod agent;
pub use agent::Agent;

mod bomb;
pub use bomb::{Bomb, BombState, Footprint};

pub type EntityId = usize;

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Unit step for this direction, y grows downwards.
    pub fn delta(self) -> (i32, i32) {
        use Direction::*;

        match self {
            North => (0, -1),
            East => (1, 0),
            South => (0, 1),
            West => (-1, 0),
        }
    }
}

/// A single input command for one agent for one tick. Raw input is read through `FromStr`.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Intent {
    None,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    PlaceBomb,
}

impl Default for Intent {
    fn default() -> Self {
        Intent::None
    }
}

impl Intent {
    pub fn direction(self) -> Option<Direction> {
        match self {
            Intent::MoveUp => Some(Direction::North),
            Intent::MoveDown => Some(Direction::South),
            Intent::MoveLeft => Some(Direction::West),
            Intent::MoveRight => Some(Direction::East),
            Intent::None | Intent::PlaceBomb => None,
        }
    }
}

impl FromStr for Intent {
    type Err = Error;

    /// Accepts the intent names (`moveUp`, `placeBomb`, ...), the single letter tokens and the
    /// short names, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let intent = match s.trim().to_ascii_lowercase().as_str() {
            "n" | "none" | "" => Intent::None,
            "u" | "up" | "moveup" => Intent::MoveUp,
            "d" | "down" | "movedown" => Intent::MoveDown,
            "l" | "left" | "moveleft" => Intent::MoveLeft,
            "r" | "right" | "moveright" => Intent::MoveRight,
            "b" | "bomb" | "placebomb" => Intent::PlaceBomb,
            _ => return Err(Error::InvalidIntent(s.to_owned())),
        };

        Ok(intent)
    }
}

/// Anything that occupies a single cell of the map.
pub trait Positioned {
    fn position(&self) -> (i32, i32);

    fn is_at(&self, pos: (i32, i32)) -> bool {
        self.position() == pos
    }
}

#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize)]
pub enum EntityType {
    Agent,
    Bomb,
    PowerUp,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum Entity {
    Agent(Agent),
    Bomb(Bomb),
    PowerUp(PowerUp),
}

impl Entity {
    pub fn entity_type(&self) -> EntityType {
        match self {
            Entity::Agent(_) => EntityType::Agent,
            Entity::Bomb(_) => EntityType::Bomb,
            Entity::PowerUp(_) => EntityType::PowerUp,
        }
    }

    pub fn as_agent(&self) -> Option<&Agent> {
        match self {
            Entity::Agent(agent) => Some(agent),
            _ => None,
        }
    }

    pub fn as_agent_mut(&mut self) -> Option<&mut Agent> {
        match self {
            Entity::Agent(agent) => Some(agent),
            _ => None,
        }
    }

    pub fn as_bomb(&self) -> Option<&Bomb> {
        match self {
            Entity::Bomb(bomb) => Some(bomb),
            _ => None,
        }
    }

    pub fn as_bomb_mut(&mut self) -> Option<&mut Bomb> {
        match self {
            Entity::Bomb(bomb) => Some(bomb),
            _ => None,
        }
    }

    pub fn as_power_up(&self) -> Option<&PowerUp> {
        match self {
            Entity::PowerUp(power_up) => Some(power_up),
            _ => None,
        }
    }
}

impl Positioned for Entity {
    fn position(&self) -> (i32, i32) {
        match self {
            Entity::Agent(agent) => agent.position(),
            Entity::Bomb(bomb) => bomb.position(),
            Entity::PowerUp(power_up) => power_up.position(),
        }
    }
}
