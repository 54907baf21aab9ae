//! Per-label command log.
//!
//! Every planning run appends the commands it issued to
//! `<label>_commands_<iteration>.log`, so a follow-up campaign can be replayed
//! by hand.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::AppError;

/// Append one timestamped entry.
pub fn append_run_log(path: &Path, what: &str, command: &[String]) -> Result<(), AppError> {
    let entry = format_run_log_entry(Utc::now(), what, command);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::output(format!("Failed to open run log '{}': {e}", path.display())))?;
    file.write_all(entry.as_bytes())
        .map_err(|e| AppError::output(format!("Failed to write run log '{}': {e}", path.display())))
}

pub fn format_run_log_entry(at: DateTime<Utc>, what: &str, command: &[String]) -> String {
    format!(
        "# {} {what}\n{}\n\n",
        at.format("%Y-%m-%d %H:%M:%S UTC"),
        command.iter().map(|a| quote(a)).collect::<Vec<_>>().join(" ")
    )
}

fn quote(arg: &str) -> String {
    if arg.is_empty() || arg.contains(char::is_whitespace) || arg.contains('"') {
        format!("\"{}\"", arg.replace('"', "\\\""))
    } else {
        arg.to_string()
    }
}
