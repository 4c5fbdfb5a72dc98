//! Check-id command: validate extension identifiers

use colored::Colorize;
use flow_extensions::ExtensionId;

use crate::error::{CliError, Result};

/// Run the check-id command
///
/// Fails if at least one id is invalid.
pub fn run_check_id(ids: &[String]) -> Result<()> {
    let mut invalid = 0;
    for id in ids {
        match ExtensionId::parse(id) {
            Ok(parsed) => println!(
                "{} {} (group '{}', artifact '{}')",
                "valid".green().bold(),
                id,
                parsed.group(),
                parsed.artifact()
            ),
            Err(e) => {
                invalid += 1;
                println!("{} {}", "invalid".red().bold(), e);
            }
        }
    }
    if invalid > 0 {
        return Err(CliError::user(format!("{invalid} of {} id(s) are invalid", ids.len())));
    }
    Ok(())
}
