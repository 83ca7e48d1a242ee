//! Condition and composite evaluation.
//!
//! Absence is resolved entirely at the leaf, so AND/OR composition is
//! plain two-valued boolean logic. Evaluation is pure: the only side
//! channel is the [`DiagnosticCollector`], which records type mismatches.

use serde::Serialize;

use crate::diagnostics::DiagnosticCollector;
use crate::node::{Condition, NodePath, RuleNode};
use crate::operator::Operator;
use crate::value::{Environment, Value, ValueKind};

/// How a single leaf resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafOutcome {
    Matched,
    NotMatched,
    /// The variable is absent. Only `equals false` is satisfied by absence.
    Absent { satisfied: bool },
    /// The variable's kind is not comparable with the operator.
    TypeMismatch,
}

impl LeafOutcome {
    pub fn is_satisfied(&self) -> bool {
        match self {
            LeafOutcome::Matched => true,
            LeafOutcome::Absent { satisfied } => *satisfied,
            LeafOutcome::NotMatched | LeafOutcome::TypeMismatch => false,
        }
    }
}

/// Evaluate one `(variable, operator, expected)` check against an
/// environment. Type mismatches are logged and resolve to `false`.
pub fn evaluate_condition(
    env: &Environment,
    variable: &str,
    operator: Operator,
    expected: &Value,
) -> bool {
    let value = env.lookup(variable);
    let mut collector = DiagnosticCollector::new();
    resolve_leaf(&value, variable, operator, expected, &NodePath::root(), &mut collector)
        .is_satisfied()
}

/// Evaluate a leaf, recording a diagnostic on type mismatch.
pub fn eval_leaf(
    env: &Environment,
    condition: &Condition,
    path: &NodePath,
    collector: &mut DiagnosticCollector,
) -> LeafOutcome {
    let value = env.lookup(condition.variable());
    resolve_leaf(
        &value,
        condition.variable(),
        condition.operator(),
        condition.expected(),
        path,
        collector,
    )
}

fn resolve_leaf(
    value: &Value,
    variable: &str,
    operator: Operator,
    expected: &Value,
    path: &NodePath,
    collector: &mut DiagnosticCollector,
) -> LeafOutcome {
    if value.is_absent() {
        // An unknown fact is "not asserted": it satisfies a check for
        // falseness and nothing else.
        let satisfied = operator == Operator::Equals && *expected == Value::Bool(false);
        return LeafOutcome::Absent { satisfied };
    }

    if !operator.accepts(value, expected) {
        collector.record_mismatch(
            variable,
            path.to_string(),
            operator,
            value.kind(),
            operator.compatible_kinds(expected),
        );
        return LeafOutcome::TypeMismatch;
    }

    if operator.apply(value, expected) {
        LeafOutcome::Matched
    } else {
        LeafOutcome::NotMatched
    }
}

/// Evaluate a rule tree. AND and OR short-circuit left to right.
pub fn eval_node(node: &RuleNode, env: &Environment, collector: &mut DiagnosticCollector) -> bool {
    walk(node, env, NodePath::root(), collector, &mut None)
}

/// Evaluate a rule tree, discarding diagnostics (they are still logged).
pub fn evaluate_node(node: &RuleNode, env: &Environment) -> bool {
    eval_node(node, env, &mut DiagnosticCollector::new())
}

fn walk(
    node: &RuleNode,
    env: &Environment,
    path: NodePath,
    collector: &mut DiagnosticCollector,
    trace: &mut Option<&mut Vec<LeafRecord>>,
) -> bool {
    match node {
        RuleNode::Condition(cond) => {
            let outcome = eval_leaf(env, cond, &path, collector);
            if let Some(records) = trace.as_deref_mut() {
                records.push(LeafRecord {
                    path: path.to_string(),
                    variable: cond.variable().to_string(),
                    operator: cond.operator(),
                    observed: env.lookup(cond.variable()).kind(),
                    outcome: Some(outcome),
                });
            }
            outcome.is_satisfied()
        }
        RuleNode::And(j) => {
            for (i, child) in j.children().iter().enumerate() {
                if !walk(child, env, path.child(i), collector, trace) {
                    return false;
                }
            }
            true
        }
        RuleNode::Or(j) => {
            for (i, child) in j.children().iter().enumerate() {
                if walk(child, env, path.child(i), collector, trace) {
                    return true;
                }
            }
            false
        }
    }
}

// ──────────────────────────────────────────────
// Tracing evaluation
// ──────────────────────────────────────────────

/// One leaf in an evaluation trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeafRecord {
    pub path: String,
    pub variable: String,
    pub operator: Operator,
    pub observed: ValueKind,
    /// `None` when a short-circuit skipped the leaf.
    pub outcome: Option<LeafOutcome>,
}

/// Per-leaf account of one evaluation, for manual debugging.
#[derive(Debug, Clone, Serialize)]
pub struct EvalTrace {
    pub activated: bool,
    pub leaves: Vec<LeafRecord>,
}

/// Evaluate and record every leaf, in tree order. Leaves never reached
/// because of short-circuiting are listed with no outcome.
pub fn trace_node(
    node: &RuleNode,
    env: &Environment,
    collector: &mut DiagnosticCollector,
) -> EvalTrace {
    let mut visited = Vec::new();
    let activated = walk(node, env, NodePath::root(), collector, &mut Some(&mut visited));

    let leaves = node
        .leaves()
        .into_iter()
        .map(|(path, cond)| {
            let path = path.to_string();
            visited
                .iter()
                .find(|r| r.path == path)
                .cloned()
                .unwrap_or_else(|| LeafRecord {
                    path,
                    variable: cond.variable().to_string(),
                    operator: cond.operator(),
                    observed: env.lookup(cond.variable()).kind(),
                    outcome: None,
                })
        })
        .collect();

    EvalTrace { activated, leaves }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
