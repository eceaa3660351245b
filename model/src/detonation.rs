//! Resolving bomb fuses and blasts for a single tick.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use crate::{Agent, BombState, Bucket, Entity, EntityId, Footprint, GameEvent, Map, Positioned};

/// A detonation that happened during the current tick.
#[derive(Clone, Debug)]
pub struct Blast {
    pub bomb_id: EntityId,
    pub owner_id: EntityId,
    pub position: (i32, i32),
    pub footprint: Footprint,
}

/// Every life lost to a blast goes through here. An agent can lose at most one life to any
/// one bomb, however many times that bomb's footprint is checked against it in a tick.
#[derive(Debug, Default)]
pub struct DamageLedger {
    hits: HashSet<(EntityId, EntityId)>,
}

impl DamageLedger {
    /// Returns true if the agent lost a life.
    pub fn hit<F: FnMut(GameEvent)>(
        &mut self,
        agent_id: EntityId,
        agent: &mut Agent,
        bomb_id: EntityId,
        callback: &mut F,
    ) -> bool {
        if !agent.alive() || !self.hits.insert((agent_id, bomb_id)) {
            return false;
        }

        agent.lose_life();
        debug!(agent_id, bomb_id, lives = agent.lives(), "agent caught in blast");
        callback(GameEvent::AgentHit {
            agent_id,
            bomb_id,
            lives: agent.lives(),
        });

        true
    }
}

/// Burns every armed fuse down by one tick and then detonates every bomb whose fuse ran out,
/// including bombs set off by other blasts, before returning.
///
/// Bombs go off in ascending id order, bombs caught in a blast are queued behind the bombs that
/// were already waiting. Each detonation clears blocks in its footprint and hits the agents that
/// are standing in it at that moment.
pub fn detonate_bombs<F: FnMut(GameEvent)>(
    map: &mut Map,
    entities: &mut Bucket<Entity>,
    ledger: &mut DamageLedger,
    callback: &mut F,
) -> Vec<Blast> {
    let mut queue: VecDeque<EntityId> = entities
        .iter_mut()
        .filter_map(|(id, entity)| {
            let bomb = entity.as_bomb_mut()?;
            if bomb.tick() {
                Some(*id)
            } else {
                None
            }
        })
        .collect();

    let mut blasts = Vec::new();

    while let Some(bomb_id) = queue.pop_front() {
        let (footprint, owner_id, position) = match entities.get_mut(bomb_id) {
            Some(Entity::Bomb(bomb)) => match bomb.begin_detonation(map) {
                Some(footprint) => (footprint, bomb.owner_id(), bomb.position()),
                // Already went off earlier in the chain
                None => continue,
            },
            _ => continue,
        };

        let mut destroyed = 0;
        for (x, y) in footprint.cells() {
            match map.destroy_block(x, y) {
                Ok(true) => destroyed += 1,
                Ok(false) => {}
                Err(err) => warn!(%err, bomb_id, "blast footprint left the map"),
            }
        }

        let caught: Vec<EntityId> = entities
            .iter()
            .filter(|(id, entity)| **id != bomb_id && footprint.contains(entity.position()))
            .map(|(id, _)| *id)
            .collect();

        for id in caught {
            match entities.get_mut(id) {
                Some(Entity::Agent(agent)) => {
                    ledger.hit(id, agent, bomb_id, callback);
                }
                Some(Entity::Bomb(other)) if other.state() == BombState::Armed => {
                    other.force_detonation();
                    queue.push_back(id);
                }
                _ => {}
            }
        }

        if let Some(Entity::Bomb(bomb)) = entities.get_mut(bomb_id) {
            bomb.finish_detonation();
        }

        debug!(bomb_id, owner_id, ?position, destroyed, "bomb detonated");
        callback(GameEvent::BombDetonated {
            bomb_id,
            owner_id,
            position,
            footprint,
        });

        blasts.push(Blast {
            bomb_id,
            owner_id,
            position,
            footprint,
        });
    }

    blasts
}
