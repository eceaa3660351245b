mod error;
pub use error::{Error, Result};

mod config;
pub use config::GameConfig;

mod map;
pub use map::{CellKind, Map};

mod entity;
pub use entity::{
    Agent, Bomb, BombState, Direction, Entity, EntityId, EntityType, Footprint, Intent, Positioned,
};

mod power_up;
pub use power_up::{PowerUp, PowerUpKind};

mod bucket;
pub use bucket::Bucket;

mod grid;
pub use grid::Grid;

mod detonation;
pub use detonation::Blast;
use detonation::DamageLedger;

pub mod engine;
pub use engine::{Engine, EngineController, EngineHandle};

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, trace};

/// The intents sampled for one tick. Agents without an entry do nothing.
pub type IntentSnapshot = BTreeMap<EntityId, Intent>;

/// Everything a renderer needs to draw the game.
#[derive(Debug, Clone, Serialize)]
pub struct GameData {
    pub map: Map,
    pub entities: Bucket<Entity>,
}

impl GameData {
    /// Number of entities of the given type still in the game.
    pub fn count_of(&self, entity_type: EntityType) -> usize {
        self.entities
            .iter()
            .filter(|(_, entity)| entity.entity_type() == entity_type)
            .count()
    }
}

/// An event produced by the game model
#[derive(Debug, Clone)]
pub enum GameEvent {
    BombDetonated {
        bomb_id: EntityId,
        owner_id: EntityId,
        position: (i32, i32),
        footprint: Footprint,
    },
    AgentHit {
        agent_id: EntityId,
        bomb_id: EntityId,
        lives: u8,
    },
    AgentEliminated {
        agent_id: EntityId,
    },
    PowerUpCollected {
        agent_id: EntityId,
        kind: PowerUpKind,
    },
    ProcessTick {
        game_data: GameData,
        tick: u32,
    },
}

/// Why a bomb wasn't placed. Neither case is an error, the intent is simply dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Placed(EntityId),
    AtCapacity,
    Occupied,
}

pub struct Model {
    data: GameData,
    config: GameConfig,
    tick: u32,
}

impl Model {
    /// Creates a model for the given map, placing any power ups the map defines.
    pub fn new(map: Map, config: GameConfig) -> Model {
        let mut entities = Bucket::new();
        for (pos, kind) in map.initial_power_ups() {
            entities.add(Entity::PowerUp(PowerUp::new(*pos, *kind)));
        }

        Model {
            data: GameData { map, entities },
            config,
            tick: 0,
        }
    }

    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        self.data.entities.add(entity)
    }

    /// Spawns an agent at the given location using the starting stats from the config.
    pub fn add_agent(&mut self, spawn: (i32, i32)) -> EntityId {
        let agent = Agent::new(
            spawn,
            self.config.starting_speed,
            self.config.starting_bomb_capacity,
            self.config.starting_blast_radius,
            self.config.starting_lives,
        );
        self.add_entity(Entity::Agent(agent))
    }

    /// Spawns an agent on every spawn point of the map, returning their ids.
    pub fn add_agents_at_spawn_points(&mut self) -> Vec<EntityId> {
        let spawns = self.data.map.spawn_points().to_vec();
        spawns.into_iter().map(|spawn| self.add_agent(spawn)).collect()
    }

    /// Removes the entity from the game, unknown ids are ignored.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        self.data.entities.remove(id)
    }

    /// Places a bomb under the agent if it has capacity left and the cell doesn't already have a
    /// bomb on it.
    pub fn place_bomb(&mut self, agent_id: EntityId) -> Option<Placement> {
        let entities = &mut self.data.entities;
        let agent = entities.get(agent_id)?.as_agent()?;
        if !agent.alive() {
            return None;
        }

        let pos = agent.position();
        let live_bombs = entities
            .iter()
            .filter_map(|(_, e)| e.as_bomb())
            .filter(|bomb| bomb.owner_id() == agent_id && bomb.is_live())
            .count();

        if !agent.has_capacity(live_bombs) {
            trace!(agent_id, live_bombs, "bomb capacity reached");
            return Some(Placement::AtCapacity);
        }

        let occupied = entities
            .iter()
            .filter_map(|(_, e)| e.as_bomb())
            .any(|bomb| bomb.is_live() && bomb.is_at(pos));
        if occupied {
            trace!(agent_id, ?pos, "cell already has a bomb");
            return Some(Placement::Occupied);
        }

        let bomb = Bomb::new(agent_id, pos, agent.blast_radius(), self.config.fuse_ticks);
        let bomb_id = entities.add(Entity::Bomb(bomb));
        debug!(agent_id, bomb_id, ?pos, "bomb placed");

        Some(Placement::Placed(bomb_id))
    }

    /// Performs a single tick applying the intents for each agent.
    ///
    /// Simulation order:
    /// 1. Bombs - every fuse burns down and every bomb that runs out detonates, along with every
    ///    bomb caught in those blasts, before anybody moves.
    /// 2. Agents (ascending id) - move or place a bomb. Movement only looks at the map which
    ///    nothing in this step changes so every agent sees the map as it was after step 1.
    /// 3. Collisions - agents standing in any of this tick's blasts are hit (at most once per
    ///    bomb, including hits from step 1) then agents pick up power ups they're standing on.
    /// 4. Clean up - spent bombs and dead agents are removed.
    pub fn simulate_tick<F: FnMut(GameEvent)>(
        &mut self,
        intents: &IntentSnapshot,
        mut callback: F,
    ) {
        self.tick += 1;

        let mut ledger = DamageLedger::default();

        let blasts = detonation::detonate_bombs(
            &mut self.data.map,
            &mut self.data.entities,
            &mut ledger,
            &mut callback,
        );

        let agent_ids = self.live_agent_ids();

        for agent_id in &agent_ids {
            let intent = intents.get(agent_id).copied().unwrap_or_default();

            if let Some(direction) = intent.direction() {
                let map = &self.data.map;
                if let Some(agent) = self
                    .data
                    .entities
                    .get_mut(*agent_id)
                    .and_then(Entity::as_agent_mut)
                {
                    agent.try_move(direction, map);
                }
            } else if intent == Intent::PlaceBomb {
                self.place_bomb(*agent_id);
            }
        }

        for agent_id in self.live_agent_ids() {
            self.resolve_blast_collisions(agent_id, &blasts, &mut ledger, &mut callback);
            self.resolve_power_up_collisions(agent_id, &mut callback);
        }

        let spent = self
            .data
            .entities
            .drain_where(|e| e.as_bomb().map_or(false, |bomb| !bomb.is_live()));
        trace!(tick = self.tick, spent = spent.len(), "removed spent bombs");

        let dead = self
            .data
            .entities
            .drain_where(|e| e.as_agent().map_or(false, |agent| !agent.alive()));
        for (agent_id, _) in dead {
            info!(agent_id, tick = self.tick, "agent eliminated");
            callback(GameEvent::AgentEliminated { agent_id });
        }

        callback(GameEvent::ProcessTick {
            game_data: self.data.clone(),
            tick: self.tick,
        })
    }

    fn resolve_blast_collisions<F: FnMut(GameEvent)>(
        &mut self,
        agent_id: EntityId,
        blasts: &[Blast],
        ledger: &mut DamageLedger,
        callback: &mut F,
    ) {
        let agent = match self
            .data
            .entities
            .get_mut(agent_id)
            .and_then(Entity::as_agent_mut)
        {
            Some(agent) => agent,
            None => return,
        };

        // The position is re-read for each blast since a hit sends the agent back to spawn
        for blast in blasts {
            if agent.alive() && blast.footprint.contains(agent.position()) {
                ledger.hit(agent_id, agent, blast.bomb_id, callback);
            }
        }
    }

    fn resolve_power_up_collisions<F: FnMut(GameEvent)>(
        &mut self,
        agent_id: EntityId,
        callback: &mut F,
    ) {
        let pos = match self.data.entities.get(agent_id).and_then(Entity::as_agent) {
            Some(agent) if agent.alive() => agent.position(),
            _ => return,
        };

        let collected = self
            .data
            .entities
            .drain_where(|e| e.as_power_up().map_or(false, |p| p.is_at(pos)));

        for (_, entity) in collected {
            if let (Some(power_up), Some(agent)) = (
                entity.as_power_up(),
                self.data
                    .entities
                    .get_mut(agent_id)
                    .and_then(Entity::as_agent_mut),
            ) {
                agent.collect(power_up.kind());
                debug!(agent_id, kind = ?power_up.kind(), "power up collected");
                callback(GameEvent::PowerUpCollected {
                    agent_id,
                    kind: power_up.kind(),
                });
            }
        }
    }

    /// Ids of every agent that is still alive, in ascending order.
    pub fn live_agent_ids(&self) -> Vec<EntityId> {
        self.data
            .entities
            .iter()
            .filter(|(_, e)| e.as_agent().map_or(false, Agent::alive))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn agent(&self, id: EntityId) -> Option<&Agent> {
        self.data.entities.get(id).and_then(Entity::as_agent)
    }

    pub fn bomb(&self, id: EntityId) -> Option<&Bomb> {
        self.data.entities.get(id).and_then(Entity::as_bomb)
    }

    pub fn entities(&self) -> &Bucket<Entity> {
        &self.data.entities
    }

    pub fn map(&self) -> &Map {
        &self.data.map
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn tick_count(&self) -> u32 {
        self.tick
    }

    pub fn data(&self) -> &GameData {
        &self.data
    }
}
