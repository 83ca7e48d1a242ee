use std::path::Path;
use std::process;

use super::{load_registry, print_json};
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_stats(rules_path: &Path, output: OutputFormat, quiet: bool) {
    let registry = load_registry(rules_path, output, quiet);
    let (_, report) = brief_analyze::analyze(&registry);
    if quiet {
        return;
    }
    let c = &report.corpus;
    match output {
        OutputFormat::Json => print_json(c),
        OutputFormat::Text => {
            println!("Coverage");
            println!("========");
            println!();
            println!("  Rules:            {} ({} active)", c.rule_count, c.active_rule_count);
            println!("  Unique variables: {}", c.unique_variables);
            println!("  Generated cases:  {}", c.total_cases);
            println!("  Unsynthesizable:  {}", c.total_unsynthesizable);
            println!("  Excluded rules:   {}", c.excluded_rules);
            println!(
                "  Fully covered:    {}/{} ({:.2}%)",
                c.fully_covered_rules, c.active_rule_count, c.fully_covered_pct
            );
        }
    }
}

pub(crate) fn cmd_report(rules_path: &Path, out: Option<&Path>, output: OutputFormat, quiet: bool) {
    let registry = load_registry(rules_path, output, quiet);
    let (_, report) = brief_analyze::analyze(&registry);

    if output == OutputFormat::Json {
        if !quiet {
            print_json(&report);
        }
        return;
    }

    let markdown = report.to_markdown();
    match out {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &markdown) {
                let msg = format!("error: cannot write {}: {}", path.display(), e);
                report_error(&msg, output, quiet);
                process::exit(1);
            }
            if !quiet {
                println!("wrote coverage report to {}", path.display());
            }
        }
        None => {
            if !quiet {
                print!("{}", markdown);
            }
        }
    }
}
