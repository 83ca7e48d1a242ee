mod eval;
mod list;
mod report;
mod snapshot;
mod validate;

pub(crate) use eval::cmd_eval;
pub(crate) use list::cmd_list;
pub(crate) use report::{cmd_report, cmd_stats};
pub(crate) use snapshot::cmd_snapshot;
pub(crate) use validate::cmd_validate;

use std::path::Path;
use std::process;

use brief_eval::Registry;

use crate::{report_error, OutputFormat};

/// Read and parse a JSON file, exiting with a report on failure.
pub(crate) fn read_json(
    path: &Path,
    what: &str,
    output: OutputFormat,
    quiet: bool,
) -> serde_json::Value {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => {
            let msg = format!("error: {} file not found: {}", what, path.display());
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("error: invalid JSON in {}: {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

/// Load the rule registry, exiting with a report on failure.
pub(crate) fn load_registry(path: &Path, output: OutputFormat, quiet: bool) -> Registry {
    let doc = read_json(path, "rules", output, quiet);
    match Registry::from_json(&doc) {
        Ok(r) => r,
        Err(e) => {
            let msg = format!("error: cannot load rules from {}: {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value)
            .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e))
    );
}
