use std::path::Path;
use std::process;

use brief_eval::Registry;

use super::read_json;
use crate::{report_error, OutputFormat};

static RULE_SCHEMA_STR: &str = include_str!("../../../../docs/rule-schema.json");

/// Structural check against the JSON Schema, then the registry's own
/// checks (operator and literal compatibility, duplicate keys).
pub(crate) fn cmd_validate(doc_path: &Path, output: OutputFormat, quiet: bool) {
    let schema: serde_json::Value = match serde_json::from_str(RULE_SCHEMA_STR) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("internal error: failed to parse embedded rule schema: {}", e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let doc = read_json(doc_path, "rules", output, quiet);

    let validator = match jsonschema::validator_for(&schema) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("internal error: failed to compile schema: {}", e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let mut errors: Vec<String> = validator
        .iter_errors(&doc)
        .map(|e| format!("{}", e))
        .collect();

    // Semantic checks only make sense on a structurally valid document.
    let mut rule_count = 0;
    if errors.is_empty() {
        match Registry::from_json(&doc) {
            Ok(r) => rule_count = r.len(),
            Err(e) => errors.push(e.to_string()),
        }
    }

    if errors.is_empty() {
        if !quiet {
            match output {
                OutputFormat::Text => println!("valid ({} rules)", rule_count),
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({ "valid": true, "rules": rule_count }));
                }
            }
        }
        return;
    }

    match output {
        OutputFormat::Text => {
            if !quiet {
                eprintln!("invalid rule document");
                for err in &errors {
                    eprintln!("  - {}", err);
                }
            }
        }
        OutputFormat::Json => {
            if !quiet {
                let json = serde_json::json!({
                    "valid": false,
                    "errors": errors
                });
                eprintln!(
                    "{}",
                    serde_json::to_string_pretty(&json).unwrap_or_default()
                );
            }
        }
    }
    process::exit(1);
}
