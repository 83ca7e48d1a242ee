//! Error types for rule loading and environment construction.
//!
//! Evaluation itself never fails: type mismatches become diagnostics
//! (see [`crate::diagnostics`]).

/// A malformed rule definition. Fatal at load time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rule {} at {}: {}", rule_label(.rule_id), .path, .message)]
pub struct RuleDefinitionError {
    /// Id of the offending rule, when the definition got far enough to have one.
    pub rule_id: Option<i64>,
    /// Node path (`root.1.0`) or the top-level field that failed.
    pub path: String,
    pub message: String,
}

fn rule_label(rule_id: &Option<i64>) -> String {
    match rule_id {
        Some(id) => id.to_string(),
        None => "<unknown>".to_string(),
    }
}

/// Errors raised by the rule registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Definition(#[from] RuleDefinitionError),

    #[error("rule not found: {rule_id}")]
    RuleNotFound { rule_id: i64 },

    #[error("rule not found: {name}")]
    RuleNameNotFound { name: String },

    #[error("duplicate rule id: {rule_id}")]
    DuplicateId { rule_id: i64 },

    #[error("duplicate rule name '{name}' (rule {rule_id})")]
    DuplicateName { rule_id: i64, name: String },

    #[error("invalid rule document: {0}")]
    InvalidDocument(String),

    #[error("error reading '{path}': {message}")]
    Io { path: String, message: String },
}

/// Errors building an [`crate::Environment`] from raw input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvironmentError {
    #[error("environment must be a JSON object, got {found}")]
    NotAnObject { found: &'static str },
}
