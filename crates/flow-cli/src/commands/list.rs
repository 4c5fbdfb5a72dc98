//! List command: known extensions and their state

use colored::Colorize;

use crate::commands::boot::state_label;
use crate::context::CliContext;
use crate::error::Result;

/// Run the list command
pub fn run_list(context: &CliContext) -> Result<()> {
    let engine = context.boot()?;
    let manager = engine.manager()?;
    let new_extensions = engine.new_extensions()?;

    println!("{}", "Extensions".bold());
    println!();
    for declaration in engine.declarations()? {
        let id = declaration.id.as_str();
        let state = engine
            .extension_state(id)
            .map(state_label)
            .unwrap_or_else(|| "unknown".dimmed());
        let mut flags = Vec::new();
        if manager.is_core(id) {
            flags.push("core");
        }
        if new_extensions.contains(id) {
            flags.push("new");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!("[{}]", flags.join(", "))
        };
        println!(
            "  {:<24} {:<10} {:<28} {} {}",
            id.cyan(),
            declaration.version,
            declaration.name,
            state,
            flags.dimmed()
        );
    }

    println!();
    println!(
        "{} {} extensions known. Use {} to enable one.",
        "Total:".dimmed(),
        engine.declarations()?.len(),
        "flow activate <id>".cyan()
    );
    Ok(())
}
