//! Capture of published catalog events.

use std::sync::{Arc, Mutex, MutexGuard};

use flow_catalog::{ContentRef, EventBus, SessionId};

/// One captured event, reduced to what tests assert on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Discovered { session: SessionId, id: String },
    Registered { session: SessionId, id: String },
    NodeInfo { session: SessionId, id: String },
    Datatype { session: SessionId, id: String },
    ContentAdded { session: SessionId, extension_id: String, content: ContentRef },
    ContentRemoved { session: SessionId, extension_id: String, content: ContentRef },
}

impl Recorded {
    pub fn session(&self) -> SessionId {
        match self {
            Recorded::Discovered { session, .. }
            | Recorded::Registered { session, .. }
            | Recorded::NodeInfo { session, .. }
            | Recorded::Datatype { session, .. }
            | Recorded::ContentAdded { session, .. }
            | Recorded::ContentRemoved { session, .. } => *session,
        }
    }
}

/// Subscribes to every channel of a bus and keeps what it receives, in
/// delivery order.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<Recorded>>>,
}

impl EventRecorder {
    pub fn attach(bus: &EventBus) -> Self {
        let recorder = Self::default();

        let events = Arc::clone(&recorder.events);
        bus.extension_discovered.subscribe(move |e| {
            events.lock().unwrap().push(Recorded::Discovered {
                session: e.session,
                id: e.extension.id.clone(),
            });
        });
        let events = Arc::clone(&recorder.events);
        bus.extension_registered.subscribe(move |e| {
            events.lock().unwrap().push(Recorded::Registered {
                session: e.session,
                id: e.extension.id.clone(),
            });
        });
        let events = Arc::clone(&recorder.events);
        bus.node_info_registered.subscribe(move |e| {
            events.lock().unwrap().push(Recorded::NodeInfo {
                session: e.session,
                id: e.node.id.clone(),
            });
        });
        let events = Arc::clone(&recorder.events);
        bus.datatype_registered.subscribe(move |e| {
            events.lock().unwrap().push(Recorded::Datatype {
                session: e.session,
                id: e.data_type.id.clone(),
            });
        });
        let events = Arc::clone(&recorder.events);
        bus.extension_content_added.subscribe(move |e| {
            events.lock().unwrap().push(Recorded::ContentAdded {
                session: e.session,
                extension_id: e.extension_id.clone(),
                content: e.content.clone(),
            });
        });
        let events = Arc::clone(&recorder.events);
        bus.extension_content_removed.subscribe(move |e| {
            events.lock().unwrap().push(Recorded::ContentRemoved {
                session: e.session,
                extension_id: e.extension_id.clone(),
                content: e.content.clone(),
            });
        });

        recorder
    }

    pub fn events(&self) -> MutexGuard<'_, Vec<Recorded>> {
        self.events.lock().unwrap()
    }

    /// Ids of discovered extensions, in order.
    pub fn discovered(&self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                Recorded::Discovered { id, .. } => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    /// Ids of registered extensions, in order.
    pub fn registered(&self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                Recorded::Registered { id, .. } => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events().clear();
    }
}
