use std::path::Path;
use std::process;

use brief_analyze::{Snapshot, Verification};

use super::{load_registry, print_json};
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_snapshot(
    rules_path: &Path,
    snapshot_path: &Path,
    check: bool,
    output: OutputFormat,
    quiet: bool,
) {
    let registry = load_registry(rules_path, output, quiet);

    if !check {
        let snapshot = Snapshot::build(&registry);
        if let Err(e) = snapshot.write(snapshot_path) {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
        if !quiet {
            match output {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "path": snapshot_path.display().to_string(),
                    "rules": snapshot.rules.len(),
                    "cases": snapshot.case_count(),
                })),
                OutputFormat::Text => println!(
                    "wrote {} cases for {} rules to {}",
                    snapshot.case_count(),
                    snapshot.rules.len(),
                    snapshot_path.display()
                ),
            }
        }
        return;
    }

    let verification = match Snapshot::read(snapshot_path).and_then(|s| s.verify(&registry)) {
        Ok(v) => v,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    if !quiet {
        match output {
            OutputFormat::Json => print_json(&serde_json::json!({
                "clean": verification.is_clean(),
                "verification": verification,
            })),
            OutputFormat::Text => print_verification(&verification),
        }
    }
    if !verification.is_clean() {
        process::exit(1);
    }
}

fn print_verification(v: &Verification) {
    for m in &v.mismatches {
        println!(
            "mismatch: rule {} case {}: stored {}, evaluator returns {}",
            m.rule_id, m.label, m.expected, m.actual
        );
    }
    for id in &v.stale {
        println!("stale: rule {} changed since the snapshot was taken", id);
    }
    for id in &v.missing {
        println!("missing: rule {} has no snapshot entry", id);
    }
    for id in &v.orphaned {
        println!("orphaned: snapshot entry for rule {} has no active rule", id);
    }
    if v.is_clean() {
        println!("snapshot ok: {} cases checked", v.cases_checked);
    } else {
        println!(
            "snapshot out of date: {} mismatches, {} stale, {} missing, {} orphaned",
            v.mismatches.len(),
            v.stale.len(),
            v.missing.len(),
            v.orphaned.len()
        );
    }
}
