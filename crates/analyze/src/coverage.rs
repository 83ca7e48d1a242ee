//! Coverage statistics over the registry and its synthesized cases.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use brief_eval::Registry;
use serde::Serialize;

use crate::synth::RuleSynthesis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStatus {
    /// Every planned case was generated.
    Covered,
    /// Some negative cases could not be generated.
    Partial,
    /// No satisfying baseline exists.
    Excluded,
    /// The rule is switched off and was not synthesized.
    Inactive,
}

impl CoverageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageStatus::Covered => "covered",
            CoverageStatus::Partial => "partial",
            CoverageStatus::Excluded => "excluded",
            CoverageStatus::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleCoverage {
    pub rule_id: i64,
    pub name: String,
    pub title: String,
    pub active: bool,
    pub variable_count: usize,
    pub leaf_count: usize,
    pub case_count: usize,
    pub unsynthesizable_count: usize,
    pub status: CoverageStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorpusCoverage {
    pub rule_count: usize,
    pub active_rule_count: usize,
    /// Distinct variables referenced by active rules.
    pub unique_variables: usize,
    pub total_cases: usize,
    pub total_unsynthesizable: usize,
    pub excluded_rules: usize,
    pub fully_covered_rules: usize,
    /// Fully covered rules as a percentage of active rules.
    pub fully_covered_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverageReport {
    pub rules: Vec<RuleCoverage>,
    pub corpus: CorpusCoverage,
}

/// Aggregate coverage for every rule of `registry`.
///
/// `syntheses` is matched to rules by id; an active rule without an entry
/// counts as having no cases.
pub fn build(registry: &Registry, syntheses: &[RuleSynthesis]) -> CoverageReport {
    let mut rows = Vec::with_capacity(registry.len());
    let mut variables = BTreeSet::new();

    for rule in registry.rules() {
        let vars = rule.variables_used();
        let leaf_count = rule.ast.leaves().len();
        let row = if !rule.active {
            RuleCoverage {
                rule_id: rule.id,
                name: rule.name.clone(),
                title: rule.title.clone(),
                active: false,
                variable_count: vars.len(),
                leaf_count,
                case_count: 0,
                unsynthesizable_count: 0,
                status: CoverageStatus::Inactive,
            }
        } else {
            variables.extend(vars.iter().cloned());
            let synthesis = syntheses.iter().find(|s| s.rule_id == rule.id);
            let case_count = synthesis.map_or(0, |s| s.cases.len());
            let unsynthesizable_count = synthesis.map_or(0, |s| s.unsynthesizable.len());
            let status = match synthesis {
                Some(s) if s.excluded.is_some() => CoverageStatus::Excluded,
                None => CoverageStatus::Excluded,
                Some(s) if s.unsynthesizable.is_empty() => CoverageStatus::Covered,
                Some(_) => CoverageStatus::Partial,
            };
            RuleCoverage {
                rule_id: rule.id,
                name: rule.name.clone(),
                title: rule.title.clone(),
                active: true,
                variable_count: vars.len(),
                leaf_count,
                case_count,
                unsynthesizable_count,
                status,
            }
        };
        rows.push(row);
    }

    let active_rule_count = rows.iter().filter(|r| r.active).count();
    let fully_covered_rules = rows
        .iter()
        .filter(|r| r.status == CoverageStatus::Covered)
        .count();
    let fully_covered_pct = if active_rule_count == 0 {
        0.0
    } else {
        fully_covered_rules as f64 * 100.0 / active_rule_count as f64
    };

    let corpus = CorpusCoverage {
        rule_count: rows.len(),
        active_rule_count,
        unique_variables: variables.len(),
        total_cases: rows.iter().map(|r| r.case_count).sum(),
        total_unsynthesizable: rows.iter().map(|r| r.unsynthesizable_count).sum(),
        excluded_rules: rows
            .iter()
            .filter(|r| r.status == CoverageStatus::Excluded)
            .count(),
        fully_covered_rules,
        fully_covered_pct,
    };

    CoverageReport {
        rules: rows,
        corpus,
    }
}

impl CoverageReport {
    pub fn rule(&self, rule_id: i64) -> Option<&RuleCoverage> {
        self.rules.iter().find(|r| r.rule_id == rule_id)
    }

    /// Render as a markdown document: a summary list, then one table row per rule.
    pub fn to_markdown(&self) -> String {
        let c = &self.corpus;
        let mut out = String::new();
        let _ = writeln!(out, "# Rule coverage\n");
        let _ = writeln!(out, "- Rules: {} ({} active)", c.rule_count, c.active_rule_count);
        let _ = writeln!(out, "- Unique variables: {}", c.unique_variables);
        let _ = writeln!(out, "- Generated cases: {}", c.total_cases);
        let _ = writeln!(out, "- Unsynthesizable cases: {}", c.total_unsynthesizable);
        let _ = writeln!(out, "- Excluded rules: {}", c.excluded_rules);
        let _ = writeln!(
            out,
            "- Fully covered: {}/{} ({:.2}%)\n",
            c.fully_covered_rules, c.active_rule_count, c.fully_covered_pct
        );
        let _ = writeln!(out, "| id | name | active | variables | cases | status |");
        let _ = writeln!(out, "|---:|------|:------:|----------:|------:|--------|");
        for r in &self.rules {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} |",
                r.rule_id,
                escape_cell(&r.name),
                if r.active { "yes" } else { "no" },
                r.variable_count,
                r.case_count,
                r.status.as_str()
            );
        }
        out
    }
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|")
}
