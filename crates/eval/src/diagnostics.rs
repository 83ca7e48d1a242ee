//! Evaluation-time diagnostics.
//!
//! A type mismatch resolves its leaf to `false` and is recorded here
//! instead of aborting the tree. Each record is also emitted as a
//! `tracing` warning so that callers without a collector still see it.

use serde::Serialize;

use crate::operator::Operator;
use crate::value::ValueKind;

/// A variable whose kind the leaf operator cannot compare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub rule_id: Option<i64>,
    pub variable: String,
    /// Path of the leaf inside the rule tree.
    pub path: String,
    pub operator: Operator,
    pub observed: ValueKind,
    pub expected: Vec<ValueKind>,
}

/// Collector threaded through one evaluation.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollector {
    rule_id: Option<i64>,
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_rule(rule_id: i64) -> Self {
        DiagnosticCollector {
            rule_id: Some(rule_id),
            diagnostics: Vec::new(),
        }
    }

    /// Record a type mismatch at a leaf.
    pub fn record_mismatch(
        &mut self,
        variable: &str,
        path: String,
        operator: Operator,
        observed: ValueKind,
        expected: &[ValueKind],
    ) {
        tracing::warn!(
            rule_id = ?self.rule_id,
            variable,
            path = %path,
            operator = %operator,
            observed = %observed,
            expected = ?expected,
            "type mismatch, leaf resolves to false"
        );
        self.diagnostics.push(Diagnostic {
            rule_id: self.rule_id,
            variable: variable.to_string(),
            path,
            operator,
            observed,
            expected: expected.to_vec(),
        });
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
