mod bot;
use bot::RandomBot;

use anyhow::Context;
use model::{CellKind, Engine, EntityType, GameConfig, GameEvent, Map, Model};
use tokio::sync::mpsc::unbounded_channel;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Picks where agents start. A map with its own spawn points keeps them, otherwise the corners
/// of the map are used and cleared of blocks so nobody starts sealed in.
fn spawn_points(map: &mut Map) -> model::Result<Vec<(i32, i32)>> {
    if !map.spawn_points().is_empty() {
        return Ok(map.spawn_points().to_vec());
    }

    let (w, h) = (map.width() as i32, map.height() as i32);
    let mut points = Vec::new();
    for &(x, y) in &[(1, 1), (w - 2, h - 2), (w - 2, 1), (1, h - 2)] {
        if !map.contains(x, y) || points.contains(&(x, y)) {
            continue;
        }

        if map.get_cell(x, y)? == CellKind::Wall {
            continue;
        }

        map.clear_around(x, y)?;
        points.push((x, y));
    }

    Ok(points)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::var("BOMBER_CONFIG") {
        Ok(path) => GameConfig::from_path(&path)
            .with_context(|| format!("Couldn't load config from {}", path))?,
        Err(_) => GameConfig::default(),
    };

    let level = config.log_level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut map = match std::env::var("BOMBER_MAP") {
        Ok(path) => {
            let layout = std::fs::read_to_string(&path)
                .with_context(|| format!("Couldn't read map from {}", path))?;
            Map::new_from_string(&layout)?
        }
        Err(_) => Map::from_config(&config)?,
    };

    info!("Map has dimensions w{}xh{}", map.width(), map.height());

    let spawns = spawn_points(&mut map)?;
    let mut model = Model::new(map, config.clone());
    let agents: Vec<_> = spawns.into_iter().map(|spawn| model.add_agent(spawn)).collect();
    info!(agents = agents.len(), "agents spawned");

    let (tx, mut rx) = unbounded_channel();
    let handle = Engine::new(model).start(tx);

    let controller = handle.controller().clone();
    let tick_interval = config.tick_interval();
    let seed = config.seed;
    let bot = tokio::task::spawn(async move {
        let mut bot = RandomBot::new(seed, 0.15);
        let mut ticker = tokio::time::interval(tick_interval);
        while controller.is_running() {
            ticker.tick().await;
            for agent in &agents {
                controller.submit_raw_intent(*agent, bot.next_intent());
            }
        }
    });

    while let Some(event) = rx.recv().await {
        match event {
            GameEvent::ProcessTick { game_data, tick } => {
                let alive = game_data.count_of(EntityType::Agent);
                let bombs = game_data.count_of(EntityType::Bomb);
                debug!(tick, alive, bombs, "tick processed");

                if tick >= config.max_ticks || alive <= 1 {
                    info!(tick, alive, "match over");
                    handle.stop();
                    break;
                }
            }
            GameEvent::AgentHit {
                agent_id,
                bomb_id,
                lives,
            } => info!(agent_id, bomb_id, lives, "agent hit"),
            GameEvent::AgentEliminated { agent_id } => info!(agent_id, "agent eliminated"),
            GameEvent::PowerUpCollected { agent_id, kind } => {
                info!(agent_id, ?kind, "power up collected")
            }
            GameEvent::BombDetonated {
                bomb_id, owner_id, ..
            } => debug!(bomb_id, owner_id, "bomb detonated"),
        }
    }

    let model = handle.join().await?;
    bot.await?;

    println!("{}", serde_json::to_string_pretty(model.data())?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_are_cleared_for_generated_maps() {
        let config = GameConfig {
            width: 9,
            height: 7,
            block_probability: 1.0,
            seed: Some(5),
            ..GameConfig::default()
        };
        let mut map = Map::from_config(&config).unwrap();

        let points = spawn_points(&mut map).unwrap();
        assert_eq!(points, vec![(1, 1), (7, 5), (7, 1), (1, 5)]);

        for &(x, y) in &points {
            assert_eq!(map.get_cell(x, y).unwrap(), CellKind::Empty);
        }
        assert_eq!(map.get_cell(2, 1).unwrap(), CellKind::Empty);
        assert_eq!(map.get_cell(3, 1).unwrap(), CellKind::Block);
    }

    #[test]
    fn map_spawn_points_are_kept() {
        let mut map = Map::new_from_string("P+\n+P").unwrap();
        assert_eq!(spawn_points(&mut map).unwrap(), vec![(0, 0), (1, 1)]);
        assert_eq!(map.get_cell(1, 0).unwrap(), CellKind::Block);
    }
}
