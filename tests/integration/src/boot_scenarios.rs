//! Boot scenarios
//!
//! Each test boots a small set of scripted extensions and checks the
//! resulting states, catalog and report.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use flow_catalog::{BoxError, CatalogEntry, ContentRef, EntryKind};
use flow_core::{
    BootOptions, Engine, Error, ExtensionState, IssueKind, RejectionReason, Severity,
};
use flow_extensions::{
    ActivationSettings, Dependency, Discovered, Extension, ExtensionMetadata, Registrar,
};
use flow_test_utils::{NodeBehavior, TestExtension};
use pretty_assertions::assert_eq;
use rstest::rstest;

// =============================================================================
// Test Infrastructure
// =============================================================================

fn boot_with(options: BootOptions, settings: ActivationSettings, extensions: Vec<Discovered>) -> Engine {
    let mut engine = Engine::new(options, settings);
    engine.boot(extensions).unwrap();
    engine
}

fn boot(extensions: Vec<Discovered>) -> Engine {
    boot_with(BootOptions::default(), ActivationSettings::new(), extensions)
}

fn state(engine: &Engine, id: &str) -> ExtensionState {
    engine
        .extension_state(id)
        .unwrap_or_else(|| panic!("no state for {id}"))
}

/// Core extension providing the `integer` parameter type test nodes use.
fn base() -> Discovered {
    Discovered::new(
        TestExtension::new("test:base")
            .core()
            .registers_parameter_type("integer"),
        100,
    )
}

// =============================================================================
// Dependency closure
// =============================================================================

#[test]
fn test_core_pulls_in_unactivated_dependency() {
    let engine = boot(vec![
        Discovered::new(TestExtension::new("core:base").core().depends_on("vendor:utils"), 10),
        Discovered::new(TestExtension::new("vendor:utils"), 0),
    ]);

    assert_eq!(state(&engine, "core:base"), ExtensionState::Postprocessed);
    assert_eq!(state(&engine, "vendor:utils"), ExtensionState::Postprocessed);
    assert!(engine.report().unwrap().is_empty());
}

#[test]
fn test_unrequired_extension_is_parked_silently() {
    let engine = boot(vec![
        base(),
        Discovered::new(TestExtension::new("acme:optional").registers_data_type("blob"), 0),
    ]);

    assert_eq!(state(&engine, "acme:optional"), ExtensionState::Parked);
    assert!(!engine.catalog().unwrap().data_types().contains("blob"));
    assert!(engine.report().unwrap().is_empty());
    assert!(engine.new_extensions().unwrap().contains("acme:optional"));
}

#[test]
fn test_cyclic_dependencies_still_load() {
    let engine = boot_with(
        BootOptions::default(),
        ActivationSettings::with_activated(["cyc:a"]),
        vec![
            Discovered::new(TestExtension::new("cyc:a").depends_on("cyc:b"), 0),
            Discovered::new(TestExtension::new("cyc:b").depends_on("cyc:a"), 0),
        ],
    );

    assert_eq!(state(&engine, "cyc:a"), ExtensionState::Postprocessed);
    assert_eq!(state(&engine, "cyc:b"), ExtensionState::Postprocessed);
    assert!(engine.manager().unwrap().dependency_graph().has_cycles());
}

#[test]
fn test_always_core_option() {
    let options = BootOptions::default().with_core_extension("acme:pinned");
    let engine = boot_with(
        options,
        ActivationSettings::new(),
        vec![Discovered::new(TestExtension::new("acme:pinned"), 0)],
    );

    assert_eq!(state(&engine, "acme:pinned"), ExtensionState::Postprocessed);
    assert!(engine.manager().unwrap().is_core("acme:pinned"));
}

// =============================================================================
// Identity
// =============================================================================

#[test]
fn test_duplicate_id_keeps_first_by_priority() {
    let engine = boot(vec![
        Discovered::new(
            TestExtension::new("acme:tool").core().version("1.0").registers_data_type("second"),
            0,
        ),
        Discovered::new(
            TestExtension::new("acme:tool").core().version("2.0").registers_data_type("first"),
            10,
        ),
    ]);

    assert_eq!(state(&engine, "acme:tool"), ExtensionState::Postprocessed);
    assert_eq!(engine.extensions().unwrap().len(), 1);
    assert_eq!(engine.extension("acme:tool").unwrap().version(), "2.0");

    let catalog = engine.catalog().unwrap();
    assert_eq!(
        catalog.content_of("acme:tool"),
        vec![ContentRef::new(EntryKind::DataType, "first")]
    );

    let duplicates = engine.report().unwrap().of_kind(IssueKind::DuplicateExtension);
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].subject, "acme:tool");
}

#[rstest]
#[case("Org.Example:ext")]
#[case("org..x:ext")]
#[case("org:ext:extra")]
#[case("")]
fn test_invalid_id_is_rejected_before_anything_else(#[case] id: &str) {
    let engine = boot(vec![
        base(),
        Discovered::new(TestExtension::new(id).core().registers_data_type("never"), 50),
    ]);

    assert_eq!(
        engine.extension_state(id),
        Some(ExtensionState::Rejected(RejectionReason::InvalidId))
    );
    assert!(engine.extension(id).is_none());
    assert!(!engine.catalog().unwrap().data_types().contains("never"));

    let report = engine.report().unwrap();
    assert_eq!(report.of_kind(IssueKind::InvalidId).len(), 1);
    assert!(report.has_errors());
    assert_eq!(state(&engine, "test:base"), ExtensionState::Postprocessed);
}

// =============================================================================
// Isolation
// =============================================================================

#[test]
fn test_panicking_register_is_isolated_and_rolled_back() {
    let engine = boot(vec![
        base(),
        Discovered::new(
            TestExtension::new("bad:panics")
                .core()
                .registers_data_type("orphan")
                .panics_on_register("index out of bounds"),
            50,
        ),
        Discovered::new(
            TestExtension::new("good:after")
                .core()
                .registers_node("good-node", NodeBehavior::Healthy),
            0,
        ),
    ]);

    assert_eq!(
        state(&engine, "bad:panics"),
        ExtensionState::Rejected(RejectionReason::RegistrationFailed)
    );
    assert_eq!(state(&engine, "test:base"), ExtensionState::Postprocessed);
    assert_eq!(state(&engine, "good:after"), ExtensionState::Postprocessed);

    let catalog = engine.catalog().unwrap();
    assert!(catalog.content_of("bad:panics").is_empty());
    assert!(catalog.nodes().contains("good-node"));

    let issues = engine.report().unwrap().of_kind(IssueKind::ErroneousExtension);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].subject, "bad:panics");
    assert!(issues[0].explanation.contains("index out of bounds"));
    assert_eq!(engine.registered_extensions().unwrap(), vec!["test:base", "good:after"]);
}

#[test]
fn test_failed_registration_discards_scheduled_tasks() {
    let engine = boot(vec![
        base(),
        Discovered::new(
            TestExtension::new("bad:late")
                .core()
                .schedules_node("late-node", "blob")
                .on_register(|_| Err("configuration file is missing".into())),
            50,
        ),
        Discovered::new(TestExtension::new("good:blob").core().registers_data_type("blob"), 0),
    ]);

    assert!(!engine.catalog().unwrap().nodes().contains("late-node"));
    assert!(engine.report().unwrap().of_kind(IssueKind::AbandonedTask).is_empty());
}

#[test]
fn test_failed_activation_is_isolated() {
    let engine = boot(vec![
        base(),
        Discovered::new(
            TestExtension::new("bad:activate")
                .core()
                .registers_data_type("never")
                .on_activate(|_| Err("license expired".into())),
            0,
        ),
    ]);

    assert_eq!(
        state(&engine, "bad:activate"),
        ExtensionState::Rejected(RejectionReason::ActivationFailed)
    );
    assert!(!engine.catalog().unwrap().data_types().contains("never"));
    assert_eq!(state(&engine, "test:base"), ExtensionState::Postprocessed);
}

#[test]
fn test_panicking_task_condition_only_affects_its_task() {
    let engine = boot(vec![
        base(),
        Discovered::new(
            TestExtension::new("bad:cond").core().on_register(|registrar| {
                registrar.schedule_when("guarded registration", |_| panic!("condition bug"), |_| Ok(()));
                Ok(())
            }),
            50,
        ),
        Discovered::new(
            TestExtension::new("good:ext")
                .core()
                .registers_node("good-node", NodeBehavior::Healthy),
            0,
        ),
    ]);

    assert_eq!(state(&engine, "good:ext"), ExtensionState::Postprocessed);
    assert_eq!(state(&engine, "test:base"), ExtensionState::Postprocessed);
    assert!(engine.catalog().unwrap().nodes().contains("good-node"));

    let issues = engine.report().unwrap().of_kind(IssueKind::AbandonedTask);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].subject, "bad:cond");
    assert!(issues[0].explanation.contains("condition bug"));
}

/// Names itself but panics when asked for its dependencies.
struct BrokenManifest {
    metadata: ExtensionMetadata,
}

impl Extension for BrokenManifest {
    fn id(&self) -> &str {
        "bad:manifest"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn metadata(&self) -> &ExtensionMetadata {
        &self.metadata
    }

    fn dependencies(&self) -> Vec<Dependency> {
        panic!("manifest is truncated")
    }

    fn is_core(&self) -> bool {
        true
    }

    fn register(&self, _registrar: &mut Registrar<'_>) -> Result<(), BoxError> {
        Ok(())
    }
}

#[test]
fn test_panicking_declaration_rejects_only_that_extension() {
    let engine = boot(vec![
        base(),
        Discovered::new(
            BrokenManifest {
                metadata: ExtensionMetadata::new("Broken manifest"),
            },
            50,
        ),
        Discovered::new(
            TestExtension::new("good:ext")
                .core()
                .registers_node("good-node", NodeBehavior::Healthy),
            0,
        ),
    ]);

    assert_eq!(
        state(&engine, "bad:manifest"),
        ExtensionState::Rejected(RejectionReason::DeclarationFailed)
    );
    assert!(engine.extension("bad:manifest").is_none());
    assert_eq!(state(&engine, "good:ext"), ExtensionState::Postprocessed);
    assert_eq!(engine.registered_extensions().unwrap(), vec!["test:base", "good:ext"]);

    let issues = engine.report().unwrap().of_kind(IssueKind::ErroneousExtension);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].subject, "bad:manifest");
    assert!(issues[0].explanation.contains("manifest is truncated"));
}

#[test]
fn test_activation_sees_implied_set() {
    let seen = Arc::new(Mutex::new(BTreeSet::new()));
    let recorded = Arc::clone(&seen);
    boot(vec![
        Discovered::new(
            TestExtension::new("acme:app")
                .core()
                .depends_on("acme:lib")
                .on_activate(move |context| {
                    *recorded.lock().unwrap() = context.loaded.clone();
                    Ok(())
                }),
            0,
        ),
        Discovered::new(TestExtension::new("acme:lib"), 0),
        Discovered::new(TestExtension::new("acme:unused"), 0),
    ]);

    let expected: BTreeSet<String> = ["acme:app", "acme:lib"].map(String::from).into();
    assert_eq!(*seen.lock().unwrap(), expected);
}

#[test]
fn test_postprocess_failure_keeps_registration() {
    let engine = boot(vec![
        base(),
        Discovered::new(
            TestExtension::new("acme:post")
                .core()
                .registers_data_type("kept")
                .on_postprocess(|_| Err("example file missing".into())),
            0,
        ),
    ]);

    assert_eq!(state(&engine, "acme:post"), ExtensionState::Registered);
    assert!(engine.catalog().unwrap().data_types().contains("kept"));
    let issues = engine.report().unwrap().of_kind(IssueKind::ErroneousPostprocess);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, Severity::Warning);
}

// =============================================================================
// Pre-activation checks
// =============================================================================

#[test]
fn test_pre_activation_failure_blocks_and_deactivates() {
    let engine = boot_with(
        BootOptions::default(),
        ActivationSettings::with_activated(["acme:tool"]),
        vec![Discovered::new(
            TestExtension::new("acme:tool")
                .registers_data_type("blob")
                .fails_pre_activation("Tool X is missing"),
            0,
        )],
    );

    assert_eq!(
        state(&engine, "acme:tool"),
        ExtensionState::Rejected(RejectionReason::PreActivationFailed)
    );
    assert!(!engine.settings().is_activated("acme:tool"));
    assert!(!engine.catalog().unwrap().data_types().contains("blob"));

    let issues = engine.report().unwrap().of_kind(IssueKind::PreActivation);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, Severity::Error);
    assert_eq!(issues[0].title, "Tool X is missing");
}

#[test]
fn test_pre_activation_failure_can_be_ignored() {
    let engine = boot_with(
        BootOptions::default().ignore_pre_activation_failures(true),
        ActivationSettings::with_activated(["acme:tool"]),
        vec![Discovered::new(
            TestExtension::new("acme:tool")
                .registers_data_type("blob")
                .fails_pre_activation("Tool X is missing"),
            0,
        )],
    );

    assert_eq!(state(&engine, "acme:tool"), ExtensionState::Postprocessed);
    assert!(engine.settings().is_activated("acme:tool"));
    let report = engine.report().unwrap();
    assert!(!report.has_errors());
    assert_eq!(report.count(Severity::Warning), 1);
}

// =============================================================================
// Deferred registration
// =============================================================================

#[test]
fn test_scheduled_node_waits_for_later_data_type() {
    let engine = boot(vec![
        base(),
        Discovered::new(TestExtension::new("acme:viewer").core().schedules_node("view", "image"), 50),
        Discovered::new(TestExtension::new("acme:imaging").core().registers_data_type("image"), 0),
    ]);

    let catalog = engine.catalog().unwrap();
    assert!(catalog.nodes().contains("view"));
    assert_eq!(catalog.nodes().get("view").unwrap().source(), "acme:viewer");
    assert!(engine.report().unwrap().is_empty());
}

#[test]
fn test_stuck_task_is_abandoned_and_reported() {
    let engine = boot(vec![
        base(),
        Discovered::new(TestExtension::new("acme:viewer").core().schedules_node("view", "image"), 0),
    ]);

    assert!(!engine.catalog().unwrap().nodes().contains("view"));
    assert_eq!(state(&engine, "acme:viewer"), ExtensionState::Postprocessed);

    let issues = engine.report().unwrap().of_kind(IssueKind::AbandonedTask);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].subject, "acme:viewer");
    assert!(issues[0].explanation.contains("image"));
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_validator_removes_only_broken_nodes() {
    let engine = boot(vec![
        base(),
        Discovered::new(
            TestExtension::new("acme:nodes")
                .core()
                .registers_node("lossy", NodeBehavior::LossyRoundTrip)
                .registers_node("sound", NodeBehavior::Healthy),
            0,
        ),
    ]);

    let catalog = engine.catalog().unwrap();
    assert!(catalog.nodes().contains("sound"));
    assert!(!catalog.nodes().contains("lossy"));

    let issues = engine.report().unwrap().of_kind(IssueKind::ErroneousNode);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].subject, "lossy");
    assert_eq!(state(&engine, "acme:nodes"), ExtensionState::Postprocessed);
}

#[test]
fn test_node_validation_can_be_skipped() {
    let engine = boot_with(
        BootOptions::default().validate_node_types(false),
        ActivationSettings::new(),
        vec![
            base(),
            Discovered::new(
                TestExtension::new("acme:nodes")
                    .core()
                    .registers_node("lossy", NodeBehavior::LossyRoundTrip),
                0,
            ),
        ],
    );

    assert!(engine.catalog().unwrap().nodes().contains("lossy"));
}

// =============================================================================
// Dependencies and sites
// =============================================================================

#[test]
fn test_unsatisfied_dependencies_are_reported() {
    let engine = boot(vec![
        Discovered::new(
            TestExtension::new("acme:app")
                .core()
                .depends_on_version("acme:lib", "2.0")
                .depends_on("acme:ghost"),
            0,
        ),
        Discovered::new(TestExtension::new("acme:lib").version("1.5"), 0),
    ]);

    let issues = engine.report().unwrap().of_kind(IssueKind::UnsatisfiedDependency);
    assert_eq!(issues.len(), 2);
    assert!(issues.iter().all(|issue| issue.subject == "acme:app"));
    assert_eq!(state(&engine, "acme:app"), ExtensionState::Postprocessed);

    let missing = engine
        .find_unsatisfied_dependencies(&[
            Dependency::at_least("acme:lib", "1.0"),
            Dependency::new("acme:ghost"),
        ])
        .unwrap();
    assert_eq!(missing, vec![Dependency::new("acme:ghost")]);
}

#[test]
fn test_provided_ids_satisfy_dependencies() {
    let engine = boot(vec![
        Discovered::new(TestExtension::new("acme:app").core().depends_on("acme:legacy"), 0),
        Discovered::new(TestExtension::new("acme:modern").core().provides("acme:legacy"), 0),
    ]);

    assert!(engine.report().unwrap().of_kind(IssueKind::UnsatisfiedDependency).is_empty());
}

#[rstest]
#[case(false, 0)]
#[case(true, 1)]
fn test_site_dependencies(#[case] validate: bool, #[case] expected: usize) {
    let options = BootOptions::default()
        .validate_repository_sites(validate)
        .with_available_site("stats");
    let engine = boot_with(
        options,
        ActivationSettings::new(),
        vec![Discovered::new(
            TestExtension::new("acme:viewer")
                .core()
                .with_site("stats", "https://sites.example/stats")
                .with_site("imaging", "https://sites.example/imaging"),
            0,
        )],
    );

    let issues = engine.report().unwrap().of_kind(IssueKind::MissingSite);
    assert_eq!(issues.len(), expected);
    if validate {
        assert_eq!(issues[0].subject, "imaging");
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_boot_twice_then_reload() {
    let mut engine = Engine::new(BootOptions::default(), ActivationSettings::new());
    engine.boot(vec![base()]).unwrap();
    let first = engine.session_id().unwrap();

    assert!(matches!(engine.boot(vec![base()]), Err(Error::AlreadyBooted)));

    engine
        .reload(vec![
            base(),
            Discovered::new(TestExtension::new("acme:new").core().registers_data_type("fresh"), 0),
        ])
        .unwrap();

    assert_ne!(engine.session_id().unwrap(), first);
    assert!(engine.catalog().unwrap().data_types().contains("fresh"));
    assert_eq!(engine.report().unwrap().session(), engine.session_id().unwrap());
}

#[test]
fn test_shared_catalog_is_readable_from_threads() {
    let engine = boot(vec![
        base(),
        Discovered::new(
            TestExtension::new("acme:nodes").core().registers_node("sound", NodeBehavior::Healthy),
            0,
        ),
    ]);
    let catalog = engine.shared_catalog().unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            std::thread::spawn(move || catalog.instantiate_node("sound").is_ok())
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

#[test]
fn test_schedule_changes_for_next_boot() {
    let mut engine = boot(vec![
        base(),
        Discovered::new(TestExtension::new("acme:io"), 0),
        Discovered::new(TestExtension::new("acme:viewer").depends_on("acme:io"), 0),
    ]);

    let scheduled = engine.schedule_activate("acme:viewer").unwrap();
    assert!(scheduled.contains("acme:io"));
    assert!(engine.settings().is_activated("acme:viewer"));

    engine.dismiss_new_extensions().unwrap();
    assert!(engine.new_extensions().unwrap().is_empty());

    let settings = engine.settings().clone();
    let next = boot_with(
        BootOptions::default(),
        settings,
        vec![
            base(),
            Discovered::new(TestExtension::new("acme:io"), 0),
            Discovered::new(TestExtension::new("acme:viewer").depends_on("acme:io"), 0),
        ],
    );
    assert_eq!(state(&next, "acme:viewer"), ExtensionState::Postprocessed);
    assert_eq!(state(&next, "acme:io"), ExtensionState::Postprocessed);
}

#[test]
fn test_settings_round_trip_through_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("nested").join("extensions.toml");
    let mut engine = boot(vec![base(), Discovered::new(TestExtension::new("acme:io"), 0)]);

    engine.schedule_activate("acme:io").unwrap();
    engine.settings().save(&path).unwrap();

    let loaded = ActivationSettings::load(&path).unwrap();
    assert_eq!(&loaded, engine.settings());
}
