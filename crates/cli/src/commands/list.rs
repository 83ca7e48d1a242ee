use std::path::Path;

use super::{load_registry, print_json};
use crate::OutputFormat;

pub(crate) fn cmd_list(rules_path: &Path, output: OutputFormat, quiet: bool) {
    let registry = load_registry(rules_path, output, quiet);
    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => {
            let rules: Vec<serde_json::Value> = registry
                .rules()
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "id": r.id,
                        "name": r.name,
                        "title": r.title,
                        "active": r.active,
                        "variables": r.variables_used(),
                        "fingerprint": r.ast.fingerprint(),
                    })
                })
                .collect();
            print_json(&serde_json::json!({ "rules": rules }));
        }
        OutputFormat::Text => {
            for r in registry.rules() {
                println!(
                    "{:>4} {:<32} {:>2} vars{}  {}",
                    r.id,
                    r.name,
                    r.variables_used().len(),
                    if r.active { "" } else { " (inactive)" },
                    r.title
                );
            }
        }
    }
}
