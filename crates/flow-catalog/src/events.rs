//! Typed event channels
//!
//! One [`EventChannel`] per event kind. Delivery is synchronous and follows
//! subscription order. A panicking listener is logged and skipped; later
//! listeners still receive the event and the change that triggered it is
//! never rolled back.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::data::DataTypeInfo;
use crate::entry::ContentRef;
use crate::guard::isolate;
use crate::node::NodeInfo;

/// Identity of one engine instance; every event carries the session that
/// emitted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(u64);

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

impl SessionId {
    /// Allocate a process-unique session id.
    pub fn next() -> Self {
        Self(NEXT_SESSION.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Snapshot of an extension's identity carried by extension events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRef {
    pub id: String,
    pub version: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ExtensionDiscovered {
    pub session: SessionId,
    pub extension: ExtensionRef,
}

#[derive(Debug, Clone)]
pub struct ExtensionRegistered {
    pub session: SessionId,
    pub extension: ExtensionRef,
}

#[derive(Debug, Clone)]
pub struct NodeInfoRegistered {
    pub session: SessionId,
    pub node: NodeInfo,
}

#[derive(Debug, Clone)]
pub struct DatatypeRegistered {
    pub session: SessionId,
    pub data_type: DataTypeInfo,
}

#[derive(Debug, Clone)]
pub struct ExtensionContentAdded {
    pub session: SessionId,
    pub extension_id: String,
    pub content: ContentRef,
}

#[derive(Debug, Clone)]
pub struct ExtensionContentRemoved {
    pub session: SessionId,
    pub extension_id: String,
    pub content: ContentRef,
}

/// Handle returned by [`EventChannel::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Synchronous publish/subscribe channel for one event type.
pub struct EventChannel<E> {
    name: &'static str,
    next_id: AtomicU64,
    listeners: Mutex<Vec<(SubscriptionId, Listener<E>)>>,
}

impl<E> EventChannel<E> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            next_id: AtomicU64::new(0),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Add a listener; it receives events after all earlier subscribers.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }

    /// Deliver `event` to every listener subscribed at the time of the call.
    ///
    /// Returns the number of listeners that handled the event without
    /// panicking.
    pub fn emit(&self, event: &E) -> usize {
        // Listeners run outside the lock so they may (un)subscribe.
        let snapshot: Vec<Listener<E>> = self
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        let mut delivered = 0;
        for listener in snapshot {
            match isolate(|| listener(event)) {
                Ok(()) => delivered += 1,
                Err(message) => {
                    tracing::warn!(channel = self.name, "event listener panicked: {}", message);
                }
            }
        }
        delivered
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Listener<E>)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E> fmt::Debug for EventChannel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("name", &self.name)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// The full event surface of an engine.
#[derive(Debug)]
pub struct EventBus {
    pub extension_discovered: EventChannel<ExtensionDiscovered>,
    pub extension_registered: EventChannel<ExtensionRegistered>,
    pub node_info_registered: EventChannel<NodeInfoRegistered>,
    pub extension_content_added: EventChannel<ExtensionContentAdded>,
    pub extension_content_removed: EventChannel<ExtensionContentRemoved>,
    pub datatype_registered: EventChannel<DatatypeRegistered>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            extension_discovered: EventChannel::new("extension-discovered"),
            extension_registered: EventChannel::new("extension-registered"),
            node_info_registered: EventChannel::new("node-info-registered"),
            extension_content_added: EventChannel::new("extension-content-added"),
            extension_content_removed: EventChannel::new("extension-content-removed"),
            datatype_registered: EventChannel::new("datatype-registered"),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
