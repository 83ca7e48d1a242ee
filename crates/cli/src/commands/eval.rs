use std::path::Path;
use std::process;

use brief_eval::{Activation, Diagnostic, Environment, LeafOutcome};

use super::{load_registry, print_json, read_json};
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_eval(
    rules_path: &Path,
    rule_key: Option<&str>,
    env_path: &Path,
    trace: bool,
    output: OutputFormat,
    quiet: bool,
) {
    let registry = load_registry(rules_path, output, quiet);

    let raw_env = read_json(env_path, "case", output, quiet);
    let env = match Environment::from_json(&raw_env) {
        Ok(e) => e,
        Err(e) => {
            let msg = format!("error: invalid case in {}: {}", env_path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    // All active rules
    let Some(key) = rule_key else {
        if trace {
            report_error("error: --trace requires a rule id or name", output, quiet);
            process::exit(1);
        }
        let results = brief_eval::evaluate_all(&registry, &env);
        if !quiet {
            match output {
                OutputFormat::Json => print_json(&serde_json::json!({ "activations": results })),
                OutputFormat::Text => print_all(&results),
            }
        }
        return;
    };

    let rule = match registry.resolve(key) {
        Ok(r) => r,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    if trace {
        let (trace, diagnostics) = brief_eval::trace(rule, &env);
        if !quiet {
            match output {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "rule_id": rule.id,
                    "name": rule.name,
                    "activated": trace.activated,
                    "leaves": trace.leaves,
                    "diagnostics": diagnostics,
                })),
                OutputFormat::Text => {
                    println!("rule {} ({}): {}", rule.id, rule.name, verdict(trace.activated));
                    for leaf in &trace.leaves {
                        println!(
                            "  {:<12} {} {} [{}] -> {}",
                            leaf.path,
                            leaf.variable,
                            leaf.operator,
                            leaf.observed,
                            leaf.outcome.map_or("skipped", outcome_label)
                        );
                    }
                    for d in &diagnostics {
                        println!("  warning: {}", describe(d));
                    }
                }
            }
        }
        return;
    }

    let activation = brief_eval::evaluate_with_diagnostics(rule, &env);
    if !quiet {
        match output {
            OutputFormat::Json => print_json(&activation),
            OutputFormat::Text => {
                println!(
                    "rule {} ({}): {}",
                    activation.rule_id,
                    activation.name,
                    verdict(activation.activated)
                );
                for d in &activation.diagnostics {
                    println!("  warning: {}", describe(d));
                }
            }
        }
    }
}

fn print_all(results: &[Activation]) {
    let activated = results.iter().filter(|a| a.activated).count();
    for a in results {
        println!(
            "{} {:>4} {}",
            if a.activated { "[x]" } else { "[ ]" },
            a.rule_id,
            a.name
        );
        for d in &a.diagnostics {
            println!("         warning: {}", describe(d));
        }
    }
    println!();
    println!("{} of {} active rules activated", activated, results.len());
}

fn verdict(activated: bool) -> &'static str {
    if activated {
        "activated"
    } else {
        "not activated"
    }
}

fn outcome_label(outcome: LeafOutcome) -> &'static str {
    match outcome {
        LeafOutcome::Matched => "matched",
        LeafOutcome::NotMatched => "not matched",
        LeafOutcome::Absent { satisfied: true } => "absent (satisfied)",
        LeafOutcome::Absent { satisfied: false } => "absent",
        LeafOutcome::TypeMismatch => "type mismatch",
    }
}

fn describe(d: &Diagnostic) -> String {
    let expected: Vec<&str> = d.expected.iter().map(|k| k.as_str()).collect();
    format!(
        "{} at {}: {} cannot compare {} (expects {})",
        d.variable,
        d.path,
        d.operator,
        d.observed,
        expected.join(" or ")
    )
}
