//! Collection events and the changes API.
//!
//! Every mutation emits an [`Event`]. Listeners registered with
//! [`EventBus::on`] run in registration order; channel subscribers get a
//! copy of every event. With [`EventDelivery::Deferred`] events queue
//! until [`EventBus::flush`], which plays the role of the next scheduling
//! tick.
//!
//! # Usage
//!
//! ```rust
//! use vellum_core::{Collection, Document, EventKind};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let mut people = Collection::new("people");
//! let inserts = Arc::new(AtomicUsize::new(0));
//! let seen = Arc::clone(&inserts);
//! people.on(EventKind::Insert, move |_| {
//!     seen.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! people.insert_one(Document::new().with("name", "Thomas")).unwrap();
//! assert_eq!(inserts.load(Ordering::SeqCst), 1);
//! ```

use crate::config::EventDelivery;
use crate::document::Document;
use crate::index::IndexDescriptor;
use crate::types::DocId;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// Kind of collection event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A document was inserted.
    Insert,
    /// A document was updated.
    Update,
    /// A document was removed.
    Delete,
    /// An index was rebuilt.
    Rebuild,
    /// A mutation was rejected or the persistence adapter failed.
    Error,
}

impl EventKind {
    /// Returns the event name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Rebuild => "rebuild",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single collection event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Position in the collection's event stream, assigned on emit.
    pub sequence: u64,
    /// Kind of event.
    pub kind: EventKind,
    /// Affected document, for insert, update and delete.
    pub document: Option<Document>,
    /// Rebuilt index.
    pub index: Option<IndexDescriptor>,
    /// Error description.
    pub message: Option<String>,
}

impl Event {
    fn new(kind: EventKind) -> Self {
        Self {
            sequence: 0,
            kind,
            document: None,
            index: None,
            message: None,
        }
    }

    /// Creates an insert event.
    pub fn insert(document: Document) -> Self {
        Self {
            document: Some(document),
            ..Self::new(EventKind::Insert)
        }
    }

    /// Creates an update event.
    pub fn update(document: Document) -> Self {
        Self {
            document: Some(document),
            ..Self::new(EventKind::Update)
        }
    }

    /// Creates a delete event.
    pub fn delete(document: Document) -> Self {
        Self {
            document: Some(document),
            ..Self::new(EventKind::Delete)
        }
    }

    /// Creates a rebuild event.
    pub fn rebuild(index: IndexDescriptor) -> Self {
        Self {
            index: Some(index),
            ..Self::new(EventKind::Rebuild)
        }
    }

    /// Creates an error event.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(EventKind::Error)
        }
    }

    /// Identifier of the affected document.
    pub fn document_id(&self) -> Option<DocId> {
        self.document.as_ref().and_then(Document::id)
    }
}

/// Handle returned by [`EventBus::on`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Distributes events to listeners and subscribers.
pub struct EventBus {
    delivery: EventDelivery,
    listeners: RwLock<Vec<(ListenerId, EventKind, Listener)>>,
    subscribers: RwLock<Vec<Sender<Event>>>,
    pending: RwLock<Vec<Event>>,
    next_listener: AtomicU64,
    sequence: AtomicU64,
}

impl EventBus {
    /// Creates a bus with the given delivery mode.
    pub fn new(delivery: EventDelivery) -> Self {
        Self {
            delivery,
            listeners: RwLock::new(Vec::new()),
            subscribers: RwLock::new(Vec::new()),
            pending: RwLock::new(Vec::new()),
            next_listener: AtomicU64::new(1),
            sequence: AtomicU64::new(0),
        }
    }

    /// Returns the delivery mode.
    pub fn delivery(&self) -> EventDelivery {
        self.delivery
    }

    /// Registers a listener for one event kind.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, kind, Arc::new(listener)));
        id
    }

    /// Unregisters a listener. Returns false if it was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _, _)| *existing != id);
        listeners.len() != before
    }

    /// Subscribes to every future event.
    pub fn subscribe(&self) -> Receiver<Event> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Emits an event, delivering it now or queueing it per the delivery mode.
    pub fn emit(&self, mut event: Event) {
        event.sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        match self.delivery {
            EventDelivery::Sync => self.deliver(&event),
            EventDelivery::Deferred => self.pending.write().push(event),
        }
    }

    /// Delivers every queued event. Returns how many were delivered.
    pub fn flush(&self) -> usize {
        let pending = std::mem::take(&mut *self.pending.write());
        for event in &pending {
            self.deliver(event);
        }
        pending.len()
    }

    /// Number of queued events.
    pub fn pending_len(&self) -> usize {
        self.pending.read().len()
    }

    /// Returns the sequence number of the last emitted event.
    pub fn latest_sequence(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    /// Returns the number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    fn deliver(&self, event: &Event) {
        // Listeners may register or unregister others while running.
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .filter(|(_, kind, _)| *kind == event.kind)
            .map(|(_, _, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(event);
        }
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EventDelivery::Sync)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("delivery", &self.delivery)
            .field("listeners", &self.listener_count())
            .field("subscribers", &self.subscriber_count())
            .field("pending", &self.pending_len())
            .finish()
    }
}

/// A recorded mutation for the changes API.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    /// Name of the collection.
    pub collection: String,
    /// Kind of mutation; only insert, update and delete are recorded.
    pub operation: EventKind,
    /// The document after the mutation, or as removed.
    pub document: Document,
}

/// Bounded history of changes, recorded only while enabled.
#[derive(Debug)]
pub struct ChangeLog {
    enabled: bool,
    history: RwLock<Vec<Change>>,
    max_history: usize,
}

impl ChangeLog {
    /// Creates a change log.
    pub fn new(enabled: bool, max_history: usize) -> Self {
        Self {
            enabled,
            history: RwLock::new(Vec::new()),
            max_history,
        }
    }

    /// Returns true if changes are recorded.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Records a change, trimming the oldest entries beyond the limit.
    pub fn record(&self, change: Change) {
        if !self.enabled {
            return;
        }
        let mut history = self.history.write();
        history.push(change);
        if history.len() > self.max_history {
            let to_remove = history.len() - self.max_history;
            history.drain(0..to_remove);
        }
    }

    /// Returns the recorded changes, oldest first.
    pub fn changes(&self) -> Vec<Change> {
        self.history.read().clone()
    }

    /// Discards every recorded change.
    pub fn flush(&self) {
        self.history.write().clear();
    }

    /// Number of recorded changes.
    pub fn len(&self) -> usize {
        self.history.read().len()
    }

    /// Returns true if nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
