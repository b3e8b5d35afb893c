//! The single owner of the world: drains intents between ticks, paces
//! generations and fans frames out to observers.

use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::command::{CommandState, Intent, Outcome};
use crate::config::SimulationConfig;
use crate::message::{self, Command, Message, Response, ServerData};
use crate::observers::{ObserverId, Observers};
use crate::pattern::PatternLibrary;
use crate::world::{World, WorldError};

// ============================================================================
// TYPES
// ============================================================================

/// Work queued for the driver thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    /// `from` is the observer to answer, if any.
    Intent { from: Option<ObserverId>, intent: Intent },
    /// Send the full snapshot and pattern list to a newly registered observer.
    Bootstrap(ObserverId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cycle {
    Ticked,
    Idle,
    /// Every intake handle is gone.
    Closed,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntakeError {
    #[error("simulation has stopped")]
    Stopped,
}

// ============================================================================
// DRIVER
// ============================================================================

pub struct Driver {
    config: SimulationConfig,
    world: World,
    commands: CommandState,
    patterns: PatternLibrary,
    observers: Observers,
    inbox: Receiver<Request>,
}

impl Driver {
    pub fn new(
        config: SimulationConfig,
        patterns: PatternLibrary,
        observers: Observers,
        inbox: Receiver<Request>,
    ) -> Result<Self, WorldError> {
        let world = World::new(config.width, config.height)?;
        let commands = CommandState::new(config.start_paused);
        Ok(Driver { config, world, commands, patterns, observers, inbox })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn paused(&self) -> bool {
        self.commands.paused()
    }

    /// Handles every queued request. Returns false once all senders are gone
    /// and the queue is empty.
    pub fn drain(&mut self) -> bool {
        loop {
            match self.inbox.try_recv() {
                Ok(request) => self.handle(request),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn handle(&mut self, request: Request) {
        match request {
            Request::Intent { from, intent } => {
                let reply = match self.commands.apply(&mut self.world, &self.patterns, intent) {
                    Ok(Outcome::Applied) => Some(Response::Success),
                    Ok(Outcome::Suppressed) => None,
                    Err(err) => {
                        warn!(observer = ?from, %err, "intent rejected");
                        Some(Response::Failure(err.to_string()))
                    }
                };
                if let (Some(id), Some(response)) = (from, reply) {
                    send(&self.observers, id, &Message::Response(response));
                }
            }
            Request::Bootstrap(id) => {
                send(&self.observers, id, &Message::WorldSnapshot(self.world.snapshot()));
                send(&self.observers, id, &Message::RleOptions(self.patterns.options()));
                debug!(observer = id, tick = self.world.tick(), "bootstrap sent");
            }
        }
    }

    /// One loop iteration without pacing: drain, then tick or idle, then
    /// broadcast the current generation.
    pub fn cycle(&mut self) -> Cycle {
        if !self.drain() {
            return Cycle::Closed;
        }

        let has_observers = !self.observers.is_empty();
        if self.paused() || !has_observers {
            if has_observers {
                broadcast(&self.observers, &Message::WorldData(self.world.delta(true)));
            }
            return Cycle::Idle;
        }

        self.world.step(self.config.workers_sqrt, self.config.blend_colors);
        trace!(tick = self.world.tick(), "tick");
        broadcast(&self.observers, &Message::WorldData(self.world.delta(false)));
        Cycle::Ticked
    }

    /// Runs until every intake handle has been dropped.
    pub fn run(mut self) {
        let frame = self.config.frame_budget();
        let idle = self.config.idle_interval();
        info!(
            width = self.world.width(),
            height = self.world.height(),
            workers = self.config.workers_sqrt * self.config.workers_sqrt + 1,
            fps = self.config.target_fps,
            "simulation started"
        );

        loop {
            let started = Instant::now();
            match self.cycle() {
                Cycle::Closed => break,
                Cycle::Idle => thread::sleep(idle),
                Cycle::Ticked => {
                    let elapsed = started.elapsed();
                    match frame.checked_sub(elapsed) {
                        Some(rest) => thread::sleep(rest),
                        None => debug!(?elapsed, budget = ?frame, "tick overran frame budget"),
                    }
                }
            }
        }

        info!(tick = self.world.tick(), "simulation stopped");
    }
}

fn encode(message: &Message) -> Option<Vec<u8>> {
    match message::encode(message) {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            warn!(kind = message.kind(), %err, "encoding failed, message skipped");
            None
        }
    }
}

fn send(observers: &Observers, id: ObserverId, message: &Message) {
    if let Some(bytes) = encode(message) {
        observers.send_to(id, bytes);
    }
}

fn broadcast(observers: &Observers, message: &Message) {
    if let Some(bytes) = encode(message) {
        observers.broadcast(&bytes);
    }
}

// ============================================================================
// HANDLE
// ============================================================================

/// Intake side of a running simulation. Dropping it (or `shutdown`) stops the
/// driver after its current cycle.
pub struct SimulationHandle {
    requests: SyncSender<Request>,
    observers: Observers,
    thread: JoinHandle<()>,
}

/// Starts the driver thread.
pub fn spawn(
    config: SimulationConfig,
    patterns: PatternLibrary,
) -> Result<SimulationHandle, WorldError> {
    let (requests, inbox) = mpsc::sync_channel(config.intent_queue_capacity);
    let observers = Observers::with_capacity(config.outbox_capacity);
    let driver = Driver::new(config, patterns, observers.clone(), inbox)?;
    let thread = thread::spawn(move || driver.run());
    Ok(SimulationHandle { requests, observers, thread })
}

impl SimulationHandle {
    pub fn observers(&self) -> &Observers {
        &self.observers
    }

    /// Queues an intent with no observer to answer. Blocks while the queue is full.
    pub fn submit(&self, intent: Intent) -> Result<(), IntakeError> {
        self.push(Request::Intent { from: None, intent })
    }

    fn push(&self, request: Request) -> Result<(), IntakeError> {
        self.requests.send(request).map_err(|_| IntakeError::Stopped)
    }

    pub fn connect(&self) -> (ObserverId, Receiver<Vec<u8>>) {
        self.observers.connect()
    }

    pub fn disconnect(&self, id: ObserverId) {
        if self.observers.disconnect(id) {
            broadcast(&self.observers, &self.server_data());
        }
    }

    fn server_data(&self) -> Message {
        Message::ServerData(ServerData { players: self.observers.players() })
    }

    /// Entry point for raw bytes from an observer's transport.
    /// Undecodable or unexpected messages are logged and dropped.
    pub fn receive(&self, from: ObserverId, bytes: &[u8]) -> Result<(), IntakeError> {
        let message = match message::decode(bytes) {
            Ok(message) => message,
            Err(err) => {
                warn!(observer = from, %err, len = bytes.len(), "dropping undecodable message");
                return Ok(());
            }
        };

        match message {
            Message::Register(player) => {
                if !self.observers.register(from, player.clone()) {
                    warn!(observer = from, "register from unknown observer");
                    return Ok(());
                }
                send(&self.observers, from, &Message::Register(player));
                broadcast(&self.observers, &self.server_data());
                self.push(Request::Bootstrap(from))
            }
            Message::Command(command) => {
                let Some(color) = self.observers.color_of(from) else {
                    warn!(observer = from, "command from unknown observer");
                    return Ok(());
                };
                let intent = match command {
                    Command::TogglePause => Intent::TogglePause,
                    Command::ClearBoard => Intent::ClearBoard,
                    Command::MarkCell { x, y } => Intent::MarkCell { x, y, color },
                    Command::PlaceRle { name, x, y } => {
                        Intent::PlaceRle { pattern: name, x, y, color }
                    }
                };
                self.push(Request::Intent { from: Some(from), intent })
            }
            other => {
                warn!(observer = from, kind = other.kind(), "ignoring unexpected message");
                Ok(())
            }
        }
    }

    /// Closes the intake and waits for the driver thread to finish.
    pub fn shutdown(self) {
        let SimulationHandle { requests, thread, .. } = self;
        drop(requests);
        if thread.join().is_err() {
            warn!("driver thread panicked");
        }
    }
}
