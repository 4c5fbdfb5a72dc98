//! Event delivery during boot
//!
//! Listeners attach to the engine's bus before boot and observe every
//! session the engine runs.

use std::sync::{Arc, Mutex};

use flow_catalog::{ContentRef, EntryKind, SubscriptionId};
use flow_core::{BootOptions, Engine};
use flow_extensions::{ActivationSettings, Discovered};
use flow_test_utils::{EventRecorder, NodeBehavior, TestExtension};
use flow_test_utils::events::Recorded;
use pretty_assertions::assert_eq;

fn extensions() -> Vec<Discovered> {
    vec![
        Discovered::new(
            TestExtension::new("test:base")
                .core()
                .registers_parameter_type("integer")
                .registers_data_type("blob"),
            100,
        ),
        Discovered::new(
            TestExtension::new("test:nodes")
                .core()
                .registers_node("sorter", NodeBehavior::Healthy),
            0,
        ),
    ]
}

fn engine() -> Engine {
    Engine::new(BootOptions::default(), ActivationSettings::new())
}

#[test]
fn test_discovery_and_registration_follow_priority() {
    let mut engine = engine();
    let recorder = EventRecorder::attach(engine.events());

    let mut discovered = extensions();
    discovered.reverse();
    engine.boot(discovered).unwrap();

    assert_eq!(recorder.discovered(), vec!["test:base", "test:nodes"]);
    assert_eq!(recorder.registered(), vec!["test:base", "test:nodes"]);

    let session = engine.session_id().unwrap();
    assert!(recorder.events().iter().all(|event| event.session() == session));
}

#[test]
fn test_content_events_name_their_source() {
    let mut engine = engine();
    let recorder = EventRecorder::attach(engine.events());
    engine.boot(extensions()).unwrap();

    let session = engine.session_id().unwrap();
    let added: Vec<(String, ContentRef)> = recorder
        .events()
        .iter()
        .filter_map(|event| match event {
            Recorded::ContentAdded { extension_id, content, .. } => {
                Some((extension_id.clone(), content.clone()))
            }
            _ => None,
        })
        .collect();

    assert_eq!(
        added,
        vec![
            ("test:base".to_string(), ContentRef::new(EntryKind::ParameterType, "integer")),
            ("test:base".to_string(), ContentRef::new(EntryKind::DataType, "blob")),
            ("test:nodes".to_string(), ContentRef::new(EntryKind::Node, "sorter")),
        ]
    );
    assert!(recorder.events().contains(&Recorded::NodeInfo {
        session,
        id: "sorter".to_string(),
    }));
    assert!(recorder.events().contains(&Recorded::Datatype {
        session,
        id: "blob".to_string(),
    }));
}

#[test]
fn test_panicking_listener_does_not_disturb_boot() {
    let mut engine = engine();
    engine
        .events()
        .extension_registered
        .subscribe(|_| panic!("listener bug"));
    let recorder = EventRecorder::attach(engine.events());

    let report = engine.boot(extensions()).unwrap();
    assert!(report.is_empty());
    assert_eq!(recorder.registered(), vec!["test:base", "test:nodes"]);
    assert!(engine.catalog().unwrap().nodes().contains("sorter"));
}

#[test]
fn test_listeners_survive_reload() {
    let mut engine = engine();
    let recorder = EventRecorder::attach(engine.events());

    engine.boot(extensions()).unwrap();
    let first = engine.session_id().unwrap();
    recorder.clear();

    engine.reload(extensions()).unwrap();
    let second = engine.session_id().unwrap();

    assert_ne!(first, second);
    assert_eq!(recorder.registered(), vec!["test:base", "test:nodes"]);
    assert!(recorder.events().iter().all(|event| event.session() == second));
}

#[test]
fn test_listener_can_unsubscribe_itself() {
    let mut engine = engine();
    let calls = Arc::new(Mutex::new(0));
    let handle: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

    let id = {
        let calls = Arc::clone(&calls);
        let handle = Arc::clone(&handle);
        let bus = engine.shared_events();
        engine.events().extension_discovered.subscribe(move |_| {
            *calls.lock().unwrap() += 1;
            if let Some(id) = handle.lock().unwrap().take() {
                bus.extension_discovered.unsubscribe(id);
            }
        })
    };
    *handle.lock().unwrap() = Some(id);
    let recorder = EventRecorder::attach(engine.events());

    engine.boot(extensions()).unwrap();

    // Only the first delivery reached the listener; later listeners saw both.
    assert_eq!(*calls.lock().unwrap(), 1);
    assert_eq!(recorder.discovered(), vec!["test:base", "test:nodes"]);
    assert!(!engine.events().extension_discovered.unsubscribe(id));
}

#[test]
fn test_rollback_emits_content_removed() {
    let mut engine = engine();
    let recorder = EventRecorder::attach(engine.events());

    engine
        .boot(vec![Discovered::new(
            TestExtension::new("bad:half")
                .core()
                .registers_data_type("scratch")
                .on_register(|_| Err("second half failed".into())),
            0,
        )])
        .unwrap();

    let session = engine.session_id().unwrap();
    assert!(recorder.events().contains(&Recorded::ContentRemoved {
        session,
        extension_id: "bad:half".to_string(),
        content: ContentRef::new(EntryKind::DataType, "scratch"),
    }));
    assert!(recorder.registered().is_empty());
    assert!(engine.catalog().unwrap().is_empty());
}

#[test]
fn test_validation_removal_emits_content_removed() {
    let mut engine = engine();
    let recorder = EventRecorder::attach(engine.events());

    engine
        .boot(vec![
            Discovered::new(TestExtension::new("test:base").core().registers_parameter_type("integer"), 100),
            Discovered::new(
                TestExtension::new("test:broken")
                    .core()
                    .registers_node("lossy", NodeBehavior::LossyRoundTrip),
                0,
            ),
        ])
        .unwrap();

    let removed: Vec<ContentRef> = recorder
        .events()
        .iter()
        .filter_map(|event| match event {
            Recorded::ContentRemoved { content, .. } => Some(content.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(removed, vec![ContentRef::new(EntryKind::Node, "lossy")]);
}
