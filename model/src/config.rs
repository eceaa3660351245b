use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Tunables for a single match. Every field has a default so a config file only needs to list
/// the values it wants to change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub width: usize,
    pub height: usize,
    /// Chance that a non-wall cell starts out as a block when generating a map.
    pub block_probability: f64,
    /// Ticks between placing a bomb and it detonating.
    pub fuse_ticks: i32,
    pub tick_interval_ms: u64,
    pub starting_lives: u8,
    pub starting_speed: u8,
    pub starting_bomb_capacity: u8,
    pub starting_blast_radius: u8,
    /// Map generation seed, a random one is picked when this is missing.
    pub seed: Option<u64>,
    /// How many ticks the host runs before stopping the engine.
    pub max_ticks: u32,
    pub log_level: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            width: 13,
            height: 11,
            block_probability: 0.5,
            fuse_ticks: 3,
            tick_interval_ms: 500,
            starting_lives: 3,
            starting_speed: 1,
            starting_bomb_capacity: 1,
            starting_blast_radius: 1,
            seed: None,
            max_ticks: 200,
            log_level: "info".to_owned(),
        }
    }
}

impl GameConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<GameConfig> {
        let file = std::fs::File::open(path)?;
        let config: GameConfig = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<GameConfig> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidMap(format!(
                "grid must not be empty (got {}x{})",
                self.width, self.height
            )));
        }

        check_block_probability(self.block_probability)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// NaN fails the range check too.
pub(crate) fn check_block_probability(probability: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(Error::InvalidMap(format!(
            "block probability {} is not within [0, 1]",
            probability
        )));
    }
    Ok(())
}
