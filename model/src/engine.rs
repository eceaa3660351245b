//! Drives the model at a fixed cadence.
//!
//! A tick always runs to completion inside a single branch of the loop, control commands are
//! only ever handled between two ticks.

use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{Entity, EntityId, GameEvent, Intent, IntentSnapshot, Model};

/// Upper bound on queued commands handled right before a tick, the rest wait until after it.
pub const MAX_COMMANDS_PER_TICK: usize = 256;

enum Command {
    AddEntity(Entity, oneshot::Sender<EntityId>),
    RemoveEntity(EntityId),
    Intent(EntityId, Intent),
    RawIntent(EntityId, String),
    Stop,
}

pub struct Engine {
    model: Model,
    tick_interval: Duration,
    /// Intents received since the last tick, taken as a whole when the next tick starts.
    pending_intents: IntentSnapshot,
}

impl Engine {
    /// Uses the tick interval from the model's config.
    pub fn new(model: Model) -> Engine {
        let tick_interval = model.config().tick_interval();
        Engine::with_tick_interval(model, tick_interval)
    }

    pub fn with_tick_interval(model: Model, tick_interval: Duration) -> Engine {
        Engine {
            model,
            tick_interval,
            pending_intents: IntentSnapshot::new(),
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn into_model(self) -> Model {
        self.model
    }

    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        self.model.add_entity(entity)
    }

    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        self.pending_intents.remove(&id);
        self.model.remove_entity(id)
    }

    /// Queues the intent for the next tick. A later intent for the same agent replaces it.
    pub fn submit_intent(&mut self, agent_id: EntityId, intent: Intent) {
        if self.model.agent(agent_id).is_none() {
            warn!(agent_id, "ignored intent for an agent that doesn't exist");
            return;
        }

        if let Some(previous) = self.pending_intents.insert(agent_id, intent) {
            debug!(agent_id, ?previous, ?intent, "agent sent two intents in one tick");
        }
    }

    /// Parses and queues an intent from the input feed. Tokens that can't be parsed are logged and
    /// treated as no intent at all.
    pub fn submit_raw_intent(&mut self, agent_id: EntityId, raw: &str) {
        match raw.parse() {
            Ok(intent) => self.submit_intent(agent_id, intent),
            Err(err) => {
                warn!(agent_id, %err, "discarding intent");
                self.submit_intent(agent_id, Intent::None);
            }
        }
    }

    /// Runs one tick using everything submitted so far. Intents submitted after this point apply
    /// to the following tick.
    pub fn tick<F: FnMut(GameEvent)>(&mut self, callback: F) {
        let intents = std::mem::take(&mut self.pending_intents);
        self.model.simulate_tick(&intents, callback);
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::AddEntity(entity, reply) => {
                let id = self.add_entity(entity);
                // Nobody waiting on the id is fine, the entity is still added
                let _ = reply.send(id);
            }
            Command::RemoveEntity(id) => {
                self.remove_entity(id);
            }
            Command::Intent(agent_id, intent) => self.submit_intent(agent_id, intent),
            Command::RawIntent(agent_id, raw) => self.submit_raw_intent(agent_id, &raw),
            // Handled by the loop
            Command::Stop => {}
        }
    }

    /// Handles commands that are already queued, up to `MAX_COMMANDS_PER_TICK`. Returns false
    /// if the engine should stop instead of ticking.
    fn drain_commands(&mut self, rx: &mut UnboundedReceiver<Command>) -> bool {
        for _ in 0..MAX_COMMANDS_PER_TICK {
            match rx.try_recv() {
                Ok(Command::Stop) | Err(TryRecvError::Disconnected) => return false,
                Ok(command) => self.handle_command(command),
                Err(TryRecvError::Empty) => break,
            }
        }
        true
    }

    /// Starts ticking in a background task, every event produced by the model is forwarded to
    /// `events`. Must be called from within a tokio runtime.
    pub fn start(mut self, events: UnboundedSender<GameEvent>) -> EngineHandle {
        let (tx, mut rx): (UnboundedSender<Command>, UnboundedReceiver<Command>) =
            unbounded_channel();

        let join = tokio::task::spawn(async move {
            let mut tick_interval = interval(self.tick_interval);
            tick_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(interval = ?self.tick_interval, "engine started");

            loop {
                tokio::select! {
                    // A due tick wins over incoming commands so a busy controller can't hold it off
                    biased;

                    _ = tick_interval.tick() => {
                        // Commands sent before the deadline still make it into this tick
                        if !self.drain_commands(&mut rx) {
                            break;
                        }
                        self.tick(|event| {
                            // The receiver going away doesn't stop the game
                            let _ = events.send(event);
                        });
                    }
                    command = rx.recv() => match command {
                        Some(Command::Stop) | None => break,
                        Some(command) => self.handle_command(command),
                    },
                }
            }

            info!(ticks = self.model.tick_count(), "engine stopped");
            self.model
        });

        EngineHandle {
            controller: EngineController { tx },
            join,
        }
    }
}

/// Cheap to clone way of talking to a running engine.
#[derive(Clone)]
pub struct EngineController {
    tx: UnboundedSender<Command>,
}

impl EngineController {
    /// Adds the entity between two ticks and returns its id, None if the engine has stopped.
    pub async fn add_entity(&self, entity: Entity) -> Option<EntityId> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx.send(Command::AddEntity(entity, reply_tx)).ok()?;
        reply_rx.await.ok()
    }

    /// Removes the entity between two ticks, unknown ids are ignored.
    pub fn remove_entity(&self, id: EntityId) {
        let _ = self.tx.send(Command::RemoveEntity(id));
    }

    pub fn submit_intent(&self, agent_id: EntityId, intent: Intent) {
        let _ = self.tx.send(Command::Intent(agent_id, intent));
    }

    pub fn submit_raw_intent(&self, agent_id: EntityId, raw: impl Into<String>) {
        let _ = self.tx.send(Command::RawIntent(agent_id, raw.into()));
    }

    /// Asks the engine to stop once the current tick (if any) has finished. Stopping an engine
    /// that has already stopped does nothing.
    pub fn stop(&self) {
        let _ = self.tx.send(Command::Stop);
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }
}

pub struct EngineHandle {
    controller: EngineController,
    join: JoinHandle<Model>,
}

impl EngineHandle {
    pub fn controller(&self) -> &EngineController {
        &self.controller
    }

    pub fn stop(&self) {
        self.controller.stop();
    }

    /// Waits for the engine to stop and hands back the model in its final state.
    pub async fn join(self) -> Result<Model, JoinError> {
        self.join.await
    }
}
