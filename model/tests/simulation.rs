use model::{
    Bomb, CellKind, Entity, EntityId, EntityType, GameConfig, GameEvent, Intent, IntentSnapshot,
    Map, Model, Placement, Positioned, PowerUpKind,
};

fn config(lives: u8) -> GameConfig {
    GameConfig {
        starting_lives: lives,
        ..GameConfig::default()
    }
}

fn model(layout: &str, lives: u8) -> Model {
    Model::new(Map::new_from_string(layout).unwrap(), config(lives))
}

fn intents(list: &[(EntityId, Intent)]) -> IntentSnapshot {
    list.iter().cloned().collect()
}

/// Runs a tick and returns every event it produced.
fn tick(model: &mut Model, intents: &IntentSnapshot) -> Vec<GameEvent> {
    let mut events = Vec::new();
    model.simulate_tick(intents, |event| events.push(event));
    events
}

fn hits(events: &[GameEvent]) -> Vec<(EntityId, EntityId)> {
    events
        .iter()
        .filter_map(|event| match event {
            GameEvent::AgentHit {
                agent_id, bomb_id, ..
            } => Some((*agent_id, *bomb_id)),
            _ => None,
        })
        .collect()
}

fn bomb_count(model: &Model) -> usize {
    model
        .entities()
        .iter()
        .filter(|(_, e)| e.as_bomb().is_some())
        .count()
}

const CHECKERED: &str = "#.#.#\n.....\n#.#.#\n.....\n#.#.#";

#[test]
fn bomb_detonates_three_ticks_after_placement() {
    let mut model = model(CHECKERED, 3);
    let agent = model.add_agent((1, 1));

    tick(&mut model, &intents(&[(agent, Intent::PlaceBomb)]));
    assert_eq!(bomb_count(&model), 1);

    tick(&mut model, &IntentSnapshot::new());
    tick(&mut model, &IntentSnapshot::new());
    assert_eq!(bomb_count(&model), 1);
    assert_eq!(model.agent(agent).unwrap().lives(), 3);

    let events = tick(&mut model, &IntentSnapshot::new());

    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::BombDetonated { position: (1, 1), .. })));
    assert_eq!(hits(&events).len(), 1);
    assert_eq!(bomb_count(&model), 0);
    assert_eq!(model.map().get_cell(1, 1).unwrap(), CellKind::Empty);

    let agent = model.agent(agent).unwrap();
    assert_eq!(agent.lives(), 2);
    assert_eq!(agent.position(), agent.spawn_position());
}

#[test]
fn blast_clears_blocks_only_inside_footprint() {
    let layout = vec!["+++++++"; 7].join("\n");
    let mut model = model(&layout, 3);
    model.add_entity(Entity::Bomb(Bomb::new(99, (3, 3), 1, 1)));

    tick(&mut model, &IntentSnapshot::new());

    for ((x, y), kind) in model.map().cells().iter_column_major() {
        let inside = (2..=4).contains(&x) && (2..=4).contains(&y);
        let expected = if inside {
            CellKind::Empty
        } else {
            CellKind::Block
        };
        assert_eq!(*kind, expected, "cell ({}, {})", x, y);
    }
}

#[test]
fn blast_is_clipped_at_the_edge_and_spares_walls() {
    let mut model = model("+#+++\n+++++\n+++++\n+++++", 3);
    model.add_entity(Entity::Bomb(Bomb::new(99, (0, 0), 2, 1)));

    tick(&mut model, &IntentSnapshot::new());

    let map = model.map();
    assert_eq!(map.get_cell(1, 0).unwrap(), CellKind::Wall);
    assert_eq!(map.get_cell(2, 2).unwrap(), CellKind::Empty);
    assert_eq!(map.get_cell(0, 2).unwrap(), CellKind::Empty);
    assert_eq!(map.get_cell(3, 0).unwrap(), CellKind::Block);
    assert_eq!(map.get_cell(0, 3).unwrap(), CellKind::Block);
}

#[test]
fn chained_bombs_go_off_in_the_same_tick() {
    let mut model = model(".......\n.......\n.......", 3);
    let first = model.add_entity(Entity::Bomb(Bomb::new(99, (1, 1), 1, 1)));
    let second = model.add_entity(Entity::Bomb(Bomb::new(99, (2, 1), 1, 50)));
    let third = model.add_entity(Entity::Bomb(Bomb::new(99, (3, 1), 1, 50)));
    let far = model.add_entity(Entity::Bomb(Bomb::new(99, (6, 1), 1, 50)));

    let events = tick(&mut model, &IntentSnapshot::new());

    let detonated: Vec<EntityId> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::BombDetonated { bomb_id, .. } => Some(*bomb_id),
            _ => None,
        })
        .collect();
    assert_eq!(detonated, vec![first, second, third]);

    assert!(model.bomb(first).is_none());
    assert!(model.bomb(second).is_none());
    assert!(model.bomb(third).is_none());
    assert_eq!(model.bomb(far).unwrap().countdown(), 49);
}

#[test]
fn agent_in_overlapping_chain_loses_one_life() {
    let mut model = model(".......\n.......\n.......", 3);
    let agent = model.add_agent((5, 1));
    let first = model.add_entity(Entity::Bomb(Bomb::new(99, (1, 1), 1, 4)));
    model.add_entity(Entity::Bomb(Bomb::new(99, (2, 1), 1, 50)));

    let left = intents(&[(agent, Intent::MoveLeft)]);
    tick(&mut model, &left);
    tick(&mut model, &left);
    tick(&mut model, &left);
    assert_eq!(model.agent(agent).unwrap().position(), (2, 1));

    // (2, 1) is covered by both bombs
    let events = tick(&mut model, &left);

    assert_eq!(hits(&events), vec![(agent, first)]);
    assert_eq!(model.agent(agent).unwrap().lives(), 2);
    assert_eq!(bomb_count(&model), 0);
}

#[test]
fn respawning_into_another_blast_costs_another_life() {
    let mut model = model("....\n....\n....", 3);
    let agent = model.add_agent((2, 1));
    let first = model.add_entity(Entity::Bomb(Bomb::new(99, (1, 1), 1, 1)));
    let second = model.add_entity(Entity::Bomb(Bomb::new(99, (2, 0), 1, 50)));

    let events = tick(&mut model, &IntentSnapshot::new());

    assert_eq!(hits(&events), vec![(agent, first), (agent, second)]);
    assert_eq!(model.agent(agent).unwrap().lives(), 1);
}

#[test]
fn detonation_happens_before_movement() {
    let mut model = model(".....\n.....\n.....", 3);
    let runner = model.add_agent((1, 1));
    let walker = model.add_agent((3, 1));
    let bomb = model.add_entity(Entity::Bomb(Bomb::new(99, (1, 1), 0, 1)));
    let next = model.add_entity(Entity::Bomb(Bomb::new(99, (2, 1), 0, 2)));

    // The runner can't escape a bomb that goes off this tick
    let events = tick(
        &mut model,
        &intents(&[(runner, Intent::MoveDown), (walker, Intent::None)]),
    );
    assert_eq!(hits(&events), vec![(runner, bomb)]);
    assert_eq!(model.agent(walker).unwrap().lives(), 3);

    // The walker steps into a cell that blows up this tick
    let events = tick(&mut model, &intents(&[(walker, Intent::MoveLeft)]));
    assert_eq!(hits(&events), vec![(walker, next)]);
    assert_eq!(model.agent(walker).unwrap().lives(), 2);
    assert_eq!(model.agent(walker).unwrap().position(), (3, 1));
    assert_eq!(model.agent(runner).unwrap().position(), (1, 2));
}

#[test]
fn moving_into_walls_and_blocks_changes_nothing() {
    let mut model = model("#####\n#.+.#\n#####", 3);
    let agent = model.add_agent((1, 1));
    let before = model.map().cells().clone();

    for intent in &[Intent::MoveUp, Intent::MoveDown, Intent::MoveLeft, Intent::MoveRight] {
        tick(&mut model, &intents(&[(agent, *intent)]));
        assert_eq!(model.agent(agent).unwrap().position(), (1, 1));
    }

    assert_eq!(model.map().cells().as_ref(), before.as_ref());
}

#[test]
fn bomb_count_never_exceeds_capacity() {
    let mut model = model(".......\n.......\n.......", 50);
    let agent = model.add_agent((0, 1));

    assert_eq!(model.place_bomb(agent), Some(Placement::Placed(1)));
    assert_eq!(model.place_bomb(agent), Some(Placement::AtCapacity));

    let script = [
        Intent::MoveRight,
        Intent::PlaceBomb,
        Intent::MoveRight,
        Intent::PlaceBomb,
        Intent::PlaceBomb,
        Intent::MoveRight,
        Intent::PlaceBomb,
        Intent::MoveRight,
        Intent::PlaceBomb,
        Intent::PlaceBomb,
    ];

    for intent in script.iter().cycle().take(40) {
        tick(&mut model, &intents(&[(agent, *intent)]));

        let capacity = model.agent(agent).unwrap().bomb_capacity() as usize;
        let owned = model
            .entities()
            .iter()
            .filter_map(|(_, e)| e.as_bomb())
            .filter(|bomb| bomb.owner_id() == agent)
            .count();
        assert!(owned <= capacity, "{} bombs with capacity {}", owned, capacity);
    }
}

#[test]
fn only_one_bomb_per_cell() {
    let mut model = model("...\n...", 3);
    let a = model.add_agent((1, 1));
    let b = model.add_agent((1, 1));

    tick(
        &mut model,
        &intents(&[(a, Intent::PlaceBomb), (b, Intent::PlaceBomb)]),
    );

    let bombs: Vec<_> = model
        .entities()
        .iter()
        .filter_map(|(_, e)| e.as_bomb())
        .collect();
    assert_eq!(bombs.len(), 1);
    assert_eq!(bombs[0].owner_id(), a);
    assert_eq!(model.place_bomb(b), Some(Placement::Occupied));
}

#[test]
fn agents_contesting_a_cell_both_move() {
    let mut model = model(".....\n.....\n.....", 3);
    let low = model.add_agent((1, 1));
    let high = model.add_agent((3, 1));
    assert!(low < high);
    assert_eq!(model.live_agent_ids(), vec![low, high]);

    tick(
        &mut model,
        &intents(&[(high, Intent::MoveLeft), (low, Intent::MoveRight)]),
    );

    assert_eq!(model.agent(low).unwrap().position(), (2, 1));
    assert_eq!(model.agent(high).unwrap().position(), (2, 1));
}

#[test]
fn power_ups_are_collected_and_removed() {
    let mut model = model(".bf\n...", 3);
    let agent = model.add_agent((0, 0));
    assert_eq!(model.entities().len(), 3);

    let events = tick(&mut model, &intents(&[(agent, Intent::MoveRight)]));
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::PowerUpCollected {
            kind: PowerUpKind::Bombs,
            ..
        }
    )));

    tick(&mut model, &intents(&[(agent, Intent::MoveRight)]));

    let agent = model.agent(agent).unwrap();
    assert_eq!(agent.bomb_capacity(), 2);
    assert_eq!(agent.blast_radius(), 2);
    assert_eq!(model.entities().len(), 1);
}

#[test]
fn dead_agents_are_removed() {
    let mut model = model("...\n...", 1);
    let agent = model.add_agent((1, 1));
    let other = model.add_agent((0, 0));
    model.add_entity(Entity::Bomb(Bomb::new(other, (1, 1), 0, 1)));

    let events = tick(&mut model, &intents(&[(agent, Intent::MoveLeft)]));

    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::AgentEliminated { agent_id } if *agent_id == agent)));
    assert!(model.agent(agent).is_none());
    assert_eq!(model.live_agent_ids(), vec![other]);

    // The intent of a removed agent is ignored
    tick(&mut model, &intents(&[(agent, Intent::PlaceBomb)]));
    assert_eq!(bomb_count(&model), 0);
}

#[test]
fn removing_twice_matches_removing_once() {
    let mut model = model("...", 3);
    let a = model.add_agent((0, 0));
    model.add_agent((2, 0));

    assert!(model.remove_entity(a).is_some());
    let once: Vec<EntityId> = model.entities().keys().copied().collect();
    assert!(model.remove_entity(a).is_none());
    let twice: Vec<EntityId> = model.entities().keys().copied().collect();

    assert_eq!(once, twice);
    assert!(model.remove_entity(12345).is_none());
}

#[test]
fn every_tick_reports_a_snapshot() {
    let mut model = model("P..\n..P", 3);
    let agents = model.add_agents_at_spawn_points();
    assert_eq!(agents.len(), 2);

    let events = tick(&mut model, &IntentSnapshot::new());

    match events.last() {
        Some(GameEvent::ProcessTick { game_data, tick }) => {
            assert_eq!(*tick, 1);
            assert_eq!(game_data.entities.len(), 2);

            let json = serde_json::to_value(game_data).unwrap();
            assert_eq!(json["map"]["width"], 3);
            assert_eq!(json["entities"]["inner"]["0"]["type"], "Agent");
        }
        other => panic!("expected the tick snapshot last, got {:?}", other),
    }
    assert_eq!(model.tick_count(), 1);
}

#[test]
fn snapshot_counts_entities_by_type() {
    let mut model = model("Pb.\n..P", 3);
    let agents = model.add_agents_at_spawn_points();

    let events = tick(&mut model, &intents(&[(agents[0], Intent::PlaceBomb)]));

    match events.last() {
        Some(GameEvent::ProcessTick { game_data, .. }) => {
            assert_eq!(game_data.count_of(EntityType::Agent), 2);
            assert_eq!(game_data.count_of(EntityType::Bomb), 1);
            assert_eq!(game_data.count_of(EntityType::PowerUp), 1);
        }
        other => panic!("expected the tick snapshot last, got {:?}", other),
    }
}
