//! Connected observers and their outboxes.
//!
//! Shared between the driver thread and the transport; every operation takes
//! the table lock for its own duration only. Outboxes are bounded: an
//! observer whose outbox is full or closed is dropped.

use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::message::Player;

pub type ObserverId = u64;

/// Colour used for edits from an observer that has not registered yet.
pub const DEFAULT_COLOR: u32 = 0xFFFF_FF00;

/// Frames an observer may fall behind before it is dropped.
pub const DEFAULT_OUTBOX_CAPACITY: usize = 64;

struct Observer {
    player: Option<Player>,
    outbox: SyncSender<Vec<u8>>,
}

impl Observer {
    /// False when the observer must be dropped.
    fn deliver(&self, id: ObserverId, bytes: Vec<u8>) -> bool {
        match self.outbox.try_send(bytes) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(observer = id, "outbox full, dropping slow observer");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!(observer = id, "outbox closed, observer dropped");
                false
            }
        }
    }
}

#[derive(Default)]
struct Table {
    next_id: ObserverId,
    observers: BTreeMap<ObserverId, Observer>,
}

#[derive(Clone)]
pub struct Observers {
    table: Arc<Mutex<Table>>,
    outbox_capacity: usize,
}

impl Default for Observers {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_OUTBOX_CAPACITY)
    }
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each outbox holds at most `outbox_capacity` undelivered messages (min 1).
    pub fn with_capacity(outbox_capacity: usize) -> Self {
        Observers {
            table: Arc::default(),
            outbox_capacity: outbox_capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds an anonymous observer. Encoded messages for it arrive on the receiver.
    pub fn connect(&self) -> (ObserverId, Receiver<Vec<u8>>) {
        let (outbox, inbox) = mpsc::sync_channel(self.outbox_capacity);
        let mut table = self.lock();
        let id = table.next_id;
        table.next_id += 1;
        table.observers.insert(id, Observer { player: None, outbox });
        info!(observer = id, connected = table.observers.len(), "observer connected");
        (id, inbox)
    }

    /// Returns false if `id` is not connected.
    pub fn register(&self, id: ObserverId, player: Player) -> bool {
        let mut table = self.lock();
        match table.observers.get_mut(&id) {
            Some(observer) => {
                info!(
                    observer = id,
                    name = %player.name,
                    color = player.color,
                    "observer registered"
                );
                observer.player = Some(player);
                true
            }
            None => false,
        }
    }

    pub fn disconnect(&self, id: ObserverId) -> bool {
        let mut table = self.lock();
        let removed = table.observers.remove(&id).is_some();
        if removed {
            info!(observer = id, connected = table.observers.len(), "observer disconnected");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().observers.is_empty()
    }

    pub fn contains(&self, id: ObserverId) -> bool {
        self.lock().observers.contains_key(&id)
    }

    /// `None` for unknown observers; `DEFAULT_COLOR` for anonymous ones.
    pub fn color_of(&self, id: ObserverId) -> Option<u32> {
        self.lock()
            .observers
            .get(&id)
            .map(|o| o.player.as_ref().map_or(DEFAULT_COLOR, |p| p.color))
    }

    /// Registered players in connection order.
    pub fn players(&self) -> Vec<Player> {
        self.lock()
            .observers
            .values()
            .filter_map(|o| o.player.clone())
            .collect()
    }

    /// Delivers to one observer, dropping it if its outbox is full or closed.
    pub fn send_to(&self, id: ObserverId, bytes: Vec<u8>) -> bool {
        let mut table = self.lock();
        let Some(observer) = table.observers.get(&id) else {
            return false;
        };
        if observer.deliver(id, bytes) {
            return true;
        }
        table.observers.remove(&id);
        false
    }

    /// Delivers to everyone; observers with full or closed outboxes are
    /// dropped. Returns how many received the message.
    pub fn broadcast(&self, bytes: &[u8]) -> usize {
        let mut table = self.lock();
        let before = table.observers.len();
        table.observers.retain(|&id, observer| observer.deliver(id, bytes.to_vec()));
        let delivered = table.observers.len();
        if delivered < before {
            info!(dropped = before - delivered, connected = delivered, "pruned observers");
        }
        delivered
    }
}
