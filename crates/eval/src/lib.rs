//! Rule activation evaluator.
//!
//! Decides, for one legal case, which argument modules are activated.
//! Case variables are normalized into an [`Environment`]; each rule's
//! AND/OR tree is evaluated against it, producing a boolean activation
//! plus any type-mismatch diagnostics.
//!
//! Rules are loaded once into an immutable [`Registry`]; malformed rules
//! are rejected at load time and never reach evaluation.

pub mod definition;
pub mod diagnostics;
pub mod error;
pub mod node;
pub mod operator;
pub mod predicate;
pub mod registry;
pub mod value;

use serde::Serialize;

pub use diagnostics::{Diagnostic, DiagnosticCollector};
pub use error::{EnvironmentError, RegistryError, RuleDefinitionError};
pub use node::{Condition, NodePath, RuleNode};
pub use operator::Operator;
pub use predicate::{evaluate_condition, evaluate_node, EvalTrace, LeafOutcome, LeafRecord};
pub use registry::{Registry, RegistryHandle, Rule};
pub use value::{normalize, Absence, Environment, Value, ValueKind};

/// Activation decision for one rule.
#[derive(Debug, Clone, Serialize)]
pub struct Activation {
    pub rule_id: i64,
    pub name: String,
    pub activated: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Evaluate a rule against an environment.
///
/// This is the decision the prompt assembler uses to include the rule's
/// argument text. Type mismatches are logged and resolve to `false`.
pub fn evaluate(rule: &Rule, env: &Environment) -> bool {
    let mut collector = DiagnosticCollector::for_rule(rule.id);
    predicate::eval_node(&rule.ast, env, &mut collector)
}

/// Evaluate a rule and return its diagnostics alongside the decision.
pub fn evaluate_with_diagnostics(rule: &Rule, env: &Environment) -> Activation {
    let mut collector = DiagnosticCollector::for_rule(rule.id);
    let activated = predicate::eval_node(&rule.ast, env, &mut collector);
    Activation {
        rule_id: rule.id,
        name: rule.name.clone(),
        activated,
        diagnostics: collector.into_diagnostics(),
    }
}

/// Evaluate every active rule of the registry against one case.
pub fn evaluate_all(registry: &Registry, env: &Environment) -> Vec<Activation> {
    registry
        .active_rules()
        .into_iter()
        .map(|rule| evaluate_with_diagnostics(rule, env))
        .collect()
}

/// Evaluate a rule recording the outcome of every leaf.
pub fn trace(rule: &Rule, env: &Environment) -> (EvalTrace, Vec<Diagnostic>) {
    let mut collector = DiagnosticCollector::for_rule(rule.id);
    let trace = predicate::trace_node(&rule.ast, env, &mut collector);
    (trace, collector.into_diagnostics())
}

// ──────────────────────────────────────────────
// Integration tests
// ──────────────────────────────────────────────
