//! Post-registration validation
//!
//! Extensions are trusted to register working types but are not relied on
//! to do so. After registration every entry is exercised once; entries that
//! fail are unregistered and reported so the rest of the catalog stays
//! usable. Parameter types are checked first because node validation relies
//! on them, then data types, then node types.

use flow_catalog::{
    BoxError, Catalog, CatalogEntry, DataTypeInfo, GraphNode, NodeInfo, ParameterTypeInfo,
    isolate,
};

use crate::report::{BootReport, Issue, IssueKind, Severity};

/// How many entries each validation step removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    pub parameter_types_removed: usize,
    pub data_types_removed: usize,
    pub node_types_removed: usize,
}

impl ValidationSummary {
    pub fn total_removed(&self) -> usize {
        self.parameter_types_removed + self.data_types_removed + self.node_types_removed
    }
}

/// A failed check: what broke and how serious it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defect {
    pub severity: Severity,
    pub title: String,
    pub explanation: String,
}

impl Defect {
    fn warning(title: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            title: title.into(),
            explanation: explanation.into(),
        }
    }
}

/// Validate the whole catalog, removing every broken entry.
pub fn validate_catalog(
    catalog: &mut Catalog,
    validate_node_types: bool,
    report: &mut BootReport,
) -> ValidationSummary {
    let mut summary = ValidationSummary::default();

    for id in catalog.parameter_types().ids() {
        let Some(info) = catalog.parameter_types().get(&id) else { continue };
        if let Err(defect) = guarded(|| check_parameter_type(info)) {
            record(report, IssueKind::ErroneousParameterType, info, &defect);
            catalog.unregister_parameter_type(&id);
            summary.parameter_types_removed += 1;
        }
    }

    for id in catalog.data_types().ids() {
        let Some(info) = catalog.data_types().get(&id) else { continue };
        if let Err(defect) = guarded(|| check_data_type(info)) {
            record(report, IssueKind::ErroneousDataType, info, &defect);
            catalog.unregister_data_type(&id);
            summary.data_types_removed += 1;
        }
    }

    if !validate_node_types {
        tracing::debug!("node type validation disabled, checking slots only");
    }
    for id in catalog.nodes().ids() {
        let Some(info) = catalog.nodes().get(&id) else { continue };
        let outcome = if validate_node_types {
            guarded(|| check_node_type(info, catalog))
        } else {
            check_slots(info, catalog)
        };
        if let Err(defect) = outcome {
            record(report, IssueKind::ErroneousNode, info, &defect);
            tracing::warn!("unregistering node type '{}': {}", id, defect.title);
            catalog.unregister_node(&id);
            summary.node_types_removed += 1;
        }
    }

    tracing::info!(
        removed = summary.total_removed(),
        "catalog validation finished"
    );
    summary
}

/// Run a check inside an isolation boundary; a panic is a defect.
fn guarded(check: impl FnOnce() -> Result<(), Defect>) -> Result<(), Defect> {
    isolate(check).unwrap_or_else(|panic| {
        Err(Defect::warning(
            "validation panicked",
            format!("the check panicked: {panic}"),
        ))
    })
}

fn record<T: CatalogEntry>(report: &mut BootReport, kind: IssueKind, entry: &T, defect: &Defect) {
    report.push(Issue {
        severity: defect.severity,
        kind,
        subject: entry.id().to_string(),
        title: defect.title.clone(),
        explanation: format!("{} (registered by '{}')", defect.explanation, entry.source()),
        fix: "Please contact the author of the extension.".to_string(),
    });
}

/// A parameter type must be able to create and copy its default value.
pub fn check_parameter_type(info: &ParameterTypeInfo) -> Result<(), Defect> {
    let value = info
        .new_default()
        .map_err(|e| Defect::warning("cannot create default value", e.to_string()))?;
    info.duplicate(&value)
        .map_err(|e| Defect::warning("cannot duplicate value", e.to_string()))?;
    Ok(())
}

/// A data type must document its storage layout; concrete types must be
/// importable from storage.
pub fn check_data_type(info: &DataTypeInfo) -> Result<(), Defect> {
    let documented = info
        .storage_documentation
        .as_deref()
        .is_some_and(|doc| !doc.trim().is_empty());
    if !documented {
        return Err(Defect::warning(
            "missing storage documentation",
            "the data type does not describe how it is stored",
        ));
    }
    if !info.is_abstract && !info.has_importer() {
        return Err(Defect::warning(
            "cannot be imported from storage",
            "the data type has no importer",
        ));
    }
    Ok(())
}

/// Every slot of a node type must use a registered data type. Checked even
/// when node validation is off.
pub fn check_slots(info: &NodeInfo, catalog: &Catalog) -> Result<(), Defect> {
    match catalog.missing_data_types(info).into_iter().next() {
        Some(missing) => Err(Defect::warning(
            "slot uses unregistered data type",
            format!("data type '{missing}' is not registered"),
        )),
        None => Ok(()),
    }
}

/// A node type must be instantiable, expose only registered parameter
/// types, and survive duplication, a serialization round-trip and a
/// self-comparison.
pub fn check_node_type(info: &NodeInfo, catalog: &Catalog) -> Result<(), Defect> {
    check_slots(info, catalog)?;

    let node = info
        .instantiate()
        .map_err(|e| Defect::warning("cannot instantiate", e.to_string()))?;

    for parameter in node.parameters() {
        if !catalog.parameter_types().contains(&parameter.type_id) {
            return Err(Defect {
                severity: Severity::Error,
                title: "unregistered parameter type".to_string(),
                explanation: format!(
                    "parameter '{}' uses parameter type '{}' which is not registered",
                    parameter.key, parameter.type_id
                ),
            });
        }
    }

    node.duplicate()
        .map_err(|e| Defect::warning("cannot duplicate", e.to_string()))?;

    check_round_trip(info, node.as_ref())
        .map_err(|e| Defect::warning("cannot serialize", e.to_string()))?;

    if !node.functionally_equals(node.as_ref()) {
        return Err(Defect::warning(
            "not functionally equal to itself",
            "cache state generation would be unreliable",
        ));
    }
    Ok(())
}

fn check_round_trip(info: &NodeInfo, node: &dyn GraphNode) -> Result<(), BoxError> {
    let saved = node.to_json()?;
    let mut fresh = info.instantiate()?;
    fresh.load_json(&saved)?;
    let reloaded = fresh.to_json()?;
    if reloaded != saved {
        return Err(format!("reloaded state differs: {saved} != {reloaded}").into());
    }
    Ok(())
}
