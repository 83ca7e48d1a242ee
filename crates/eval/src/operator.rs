//! The closed operator set and its kind-compatibility table.
//!
//! Dispatch never coerces: [`Operator::compatible_kinds`] is consulted
//! first, and [`Operator::apply`] only sees value/expected pairs that
//! passed the check.

use std::fmt;

use serde::Serialize;

use crate::value::{Value, ValueKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    Contains,
    GreaterThan,
    LessOrEqual,
    InList,
}

const BOOLEAN: &[ValueKind] = &[ValueKind::Boolean];
const NUMBER: &[ValueKind] = &[ValueKind::Number];
const STRING: &[ValueKind] = &[ValueKind::String];
const LIST: &[ValueKind] = &[ValueKind::List];
const STRING_OR_LIST: &[ValueKind] = &[ValueKind::String, ValueKind::List];
const SCALARS: &[ValueKind] = &[ValueKind::Boolean, ValueKind::Number, ValueKind::String];
const NONE: &[ValueKind] = &[];

impl Operator {
    pub const ALL: [Operator; 5] = [
        Operator::Equals,
        Operator::Contains,
        Operator::GreaterThan,
        Operator::LessOrEqual,
        Operator::InList,
    ];

    /// Canonical spelling used by the rule definition format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::Contains => "contains",
            Operator::GreaterThan => "greater_than",
            Operator::LessOrEqual => "less_or_equal",
            Operator::InList => "in_list",
        }
    }

    /// Parse an operator name. Accepts the canonical spelling and the
    /// symbolic aliases `==`, `>`, `<=` and `in`.
    pub fn parse(s: &str) -> Option<Operator> {
        match s {
            "equals" | "==" => Some(Operator::Equals),
            "contains" => Some(Operator::Contains),
            "greater_than" | ">" => Some(Operator::GreaterThan),
            "less_or_equal" | "<=" => Some(Operator::LessOrEqual),
            "in_list" | "in" => Some(Operator::InList),
            _ => None,
        }
    }

    /// Check that a rule literal is usable with this operator.
    ///
    /// Called once at load time; the error string names what was wrong.
    pub fn check_expected(&self, expected: &Value) -> Result<(), String> {
        match (self, expected) {
            (_, Value::Absent(_)) => Err(format!("{} requires a value, got {}", self, expected)),
            (Operator::Equals, Value::List(items)) => {
                if items.iter().any(Value::is_absent) {
                    Err("equals list literal must not contain null".to_string())
                } else {
                    Ok(())
                }
            }
            (Operator::Equals, _) => Ok(()),
            (Operator::Contains, v) if v.is_scalar() => Ok(()),
            (Operator::GreaterThan | Operator::LessOrEqual, Value::Number(_)) => Ok(()),
            (Operator::InList, Value::List(items)) => match items.iter().find(|v| !v.is_scalar()) {
                Some(bad) => Err(format!(
                    "in_list elements must be boolean, number or string, found {}",
                    bad.kind()
                )),
                None => Ok(()),
            },
            (op, v) => Err(format!(
                "{} is not defined for a {} literal (accepts {})",
                op,
                v.kind(),
                op.literal_kinds()
            )),
        }
    }

    fn literal_kinds(&self) -> &'static str {
        match self {
            Operator::Equals => "boolean, number, string or list",
            Operator::Contains => "boolean, number or string",
            Operator::GreaterThan | Operator::LessOrEqual => "number",
            Operator::InList => "list",
        }
    }

    /// Variable kinds this operator accepts against the given literal.
    pub fn compatible_kinds(&self, expected: &Value) -> &'static [ValueKind] {
        match self {
            Operator::Equals => match expected.kind() {
                ValueKind::Boolean => BOOLEAN,
                ValueKind::Number => NUMBER,
                ValueKind::String => STRING,
                ValueKind::List => LIST,
                ValueKind::Absent => NONE,
            },
            Operator::Contains => match expected {
                Value::Text(_) => STRING_OR_LIST,
                Value::Bool(_) | Value::Number(_) => LIST,
                Value::List(_) | Value::Absent(_) => NONE,
            },
            Operator::GreaterThan | Operator::LessOrEqual => NUMBER,
            Operator::InList => SCALARS,
        }
    }

    pub fn accepts(&self, value: &Value, expected: &Value) -> bool {
        self.compatible_kinds(expected).contains(&value.kind())
    }

    /// Apply the operator to a kind-compatible pair.
    ///
    /// Pairs outside the compatibility table yield `false`.
    pub fn apply(&self, value: &Value, expected: &Value) -> bool {
        match (self, value, expected) {
            (Operator::Equals, v, e) => v == e,
            (Operator::Contains, Value::Text(haystack), Value::Text(needle)) => {
                haystack.contains(needle.as_str())
            }
            (Operator::Contains, Value::List(items), needle) => items.contains(needle),
            (Operator::GreaterThan, Value::Number(v), Value::Number(e)) => v > e,
            (Operator::LessOrEqual, Value::Number(v), Value::Number(e)) => v <= e,
            (Operator::InList, v, Value::List(items)) => items.contains(v),
            _ => false,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
