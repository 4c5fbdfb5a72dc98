//! Activate and deactivate commands
//!
//! Both take effect on the next boot; the updated settings are saved
//! immediately.

use std::collections::BTreeSet;

use colored::Colorize;

use crate::context::CliContext;
use crate::error::Result;

fn print_scheduled(verb: &str, id: &str, scheduled: &BTreeSet<String>) {
    println!("{} {} on the next boot:", verb.green().bold(), id.cyan());
    for affected in scheduled {
        let marker = if affected == id { "" } else { " (implied)" };
        println!("  {}{}", affected, marker.dimmed());
    }
}

/// Run the activate command
pub fn run_activate(context: &CliContext, id: &str) -> Result<()> {
    let mut engine = context.boot()?;
    let scheduled = engine.schedule_activate(id)?;
    context.save_settings(engine.settings())?;
    print_scheduled("Activating", id, &scheduled);
    Ok(())
}

/// Run the deactivate command
pub fn run_deactivate(context: &CliContext, id: &str) -> Result<()> {
    let mut engine = context.boot()?;
    let scheduled = engine.schedule_deactivate(id)?;
    context.save_settings(engine.settings())?;
    print_scheduled("Deactivating", id, &scheduled);
    Ok(())
}
