//! Boot command: boot the built-in extensions and print the report

use colored::{ColoredString, Colorize};
use flow_catalog::SessionId;
use flow_core::{BootReport, Engine, ExtensionState, Issue, Severity};
use serde::Serialize;

use crate::context::CliContext;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct ExtensionSummary<'a> {
    id: &'a str,
    version: Option<&'a str>,
    name: Option<&'a str>,
    #[serde(flatten)]
    state: ExtensionState,
}

#[derive(Debug, Serialize)]
struct CatalogSummary {
    node_types: usize,
    data_types: usize,
    parameter_types: usize,
    examples: usize,
}

#[derive(Debug, Serialize)]
struct BootSummary<'a> {
    session: SessionId,
    extensions: Vec<ExtensionSummary<'a>>,
    catalog: CatalogSummary,
    report: &'a BootReport,
}

fn summarize(engine: &Engine) -> Result<BootSummary<'_>> {
    let extensions = engine
        .states()?
        .iter()
        .map(|(id, state)| {
            let declaration = engine.declaration(id);
            ExtensionSummary {
                id,
                version: declaration.map(|d| d.version.as_str()),
                name: declaration.map(|d| d.name.as_str()),
                state: *state,
            }
        })
        .collect();
    let catalog = engine.catalog()?;
    let report = engine.report()?;
    Ok(BootSummary {
        session: report.session(),
        extensions,
        catalog: CatalogSummary {
            node_types: catalog.nodes().len(),
            data_types: catalog.data_types().len(),
            parameter_types: catalog.parameter_types().len(),
            examples: catalog.examples().len(),
        },
        report,
    })
}

pub(crate) fn state_label(state: ExtensionState) -> ColoredString {
    let label = state.to_string();
    match state {
        ExtensionState::Registered | ExtensionState::Postprocessed => label.green(),
        ExtensionState::Parked => label.dimmed(),
        ExtensionState::Rejected(_) => label.red(),
        _ => label.yellow(),
    }
}

fn print_issue(issue: &Issue) {
    let severity = match issue.severity {
        Severity::Error => issue.severity.to_string().red().bold(),
        Severity::Warning => issue.severity.to_string().yellow().bold(),
        Severity::Info => issue.severity.to_string().cyan(),
    };
    println!("  {} {} {}: {}", severity, issue.kind.to_string().dimmed(), issue.subject.cyan(), issue.title);
    if !issue.explanation.is_empty() {
        println!("      {}", issue.explanation);
    }
    if !issue.fix.is_empty() {
        println!("      {} {}", "fix:".dimmed(), issue.fix);
    }
}

/// Run the boot command
pub fn run_boot(context: &CliContext, json: bool) -> Result<()> {
    let loaded = context.settings()?;
    let engine = context.boot()?;

    if engine.settings() != &loaded {
        context.save_settings(engine.settings())?;
    }

    let summary = summarize(&engine)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{} session {}", "Booted".green().bold(), summary.session);
    println!();
    println!("{}", "Extensions".bold());
    for extension in &summary.extensions {
        println!(
            "  {:<24} {:<10} {}",
            extension.id.cyan(),
            extension.version.unwrap_or("-"),
            state_label(extension.state)
        );
    }
    println!();
    println!(
        "{} {} node types, {} data types, {} parameter types, {} examples",
        "Catalog:".bold(),
        summary.catalog.node_types,
        summary.catalog.data_types,
        summary.catalog.parameter_types,
        summary.catalog.examples
    );

    let report = summary.report;
    if report.is_empty() {
        println!("{}", "No issues.".green());
    } else {
        println!();
        println!("{}", "Issues".bold());
        for issue in report.issues() {
            print_issue(issue);
        }
        println!();
        println!(
            "{} {} error(s), {} warning(s)",
            "Total:".dimmed(),
            report.count(Severity::Error),
            report.count(Severity::Warning)
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_boot_runs() {
        let dir = TempDir::new().unwrap();
        let context = CliContext::new(None, Some(dir.path().join("settings.toml")));
        assert!(run_boot(&context, false).is_ok());
        assert!(run_boot(&context, true).is_ok());
    }

    #[test]
    fn test_summary_lists_every_extension() {
        let dir = TempDir::new().unwrap();
        let context = CliContext::new(None, Some(dir.path().join("settings.toml")));
        let engine = context.boot().unwrap();

        let summary = summarize(&engine).unwrap();
        let ids: Vec<&str> = summary.extensions.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![flow_standard::CORE_ID, flow_standard::UTILS_ID]);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["extensions"][0]["state"], "postprocessed");
        assert_eq!(json["extensions"][1]["state"], "parked");
    }
}
