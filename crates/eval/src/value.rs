//! Runtime values and the normalizer that produces them.
//!
//! Every extracted case variable goes through [`normalize`] before it is
//! compared. Normalization is total and performs no coercion between kinds:
//! a JSON `0` is the Number zero and never the Boolean `false`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::EnvironmentError;

// ──────────────────────────────────────────────
// Values
// ──────────────────────────────────────────────

/// Why a variable has no usable value.
///
/// All three reasons evaluate identically; they are kept apart so that
/// diagnostics can tell an extraction gap from an explicit `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Absence {
    /// The key is not present in the environment.
    Missing,
    /// The key is present with a stored `null`.
    Null,
    /// The raw input has no counterpart in the value model (objects,
    /// numbers outside the decimal range).
    Unrepresentable,
}

/// Evaluation-ready value. Numbers are exact decimals, never `f64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Number(Decimal),
    Text(String),
    List(Vec<Value>),
    Absent(Absence),
}

/// The kind tag of a [`Value`], used by the operator compatibility table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Boolean,
    Number,
    String,
    List,
    Absent,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Absent => "absent",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(_) => ValueKind::Number,
            Value::Text(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
            Value::Absent(_) => ValueKind::Absent,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent(_))
    }

    /// True for the kinds that may appear inside an `in_list` literal or as
    /// the needle of a list `contains`.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Bool(_) | Value::Number(_) | Value::Text(_))
    }

    /// Serialize back to plain JSON. Absent values become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(d) => decimal_to_json(*d),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Absent(_) => serde_json::Value::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(d) => write!(f, "{}", d),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Absent(reason) => match reason {
                Absence::Missing => write!(f, "<missing>"),
                Absence::Null => write!(f, "null"),
                Absence::Unrepresentable => write!(f, "<unrepresentable>"),
            },
        }
    }
}

/// Written from the decimal's own text so that no digit is lost; the
/// workspace enables serde_json's `arbitrary_precision` for this.
fn decimal_to_json(d: Decimal) -> serde_json::Value {
    let text = d.normalize().to_string();
    text.parse::<serde_json::Number>()
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::String(text))
}

fn decimal_from_json(n: &serde_json::Number) -> Option<Decimal> {
    if let Some(i) = n.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(Decimal::from(u));
    }
    let text = n.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

// ──────────────────────────────────────────────
// Normalizer
// ──────────────────────────────────────────────

/// Canonicalize a raw extracted variable.
///
/// `None` stands for a missing key. Booleans, numbers, strings and arrays
/// pass through as their own kind; nothing is reinterpreted.
pub fn normalize(raw: Option<&serde_json::Value>) -> Value {
    let Some(raw) = raw else {
        return Value::Absent(Absence::Missing);
    };
    match raw {
        serde_json::Value::Null => Value::Absent(Absence::Null),
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match decimal_from_json(n) {
            Some(d) => Value::Number(d),
            None => {
                tracing::warn!(number = %n, "number outside decimal range normalized to absent");
                Value::Absent(Absence::Unrepresentable)
            }
        },
        serde_json::Value::String(s) => Value::Text(s.clone()),
        serde_json::Value::Array(items) => {
            Value::List(items.iter().map(|item| normalize(Some(item))).collect())
        }
        serde_json::Value::Object(_) => {
            tracing::warn!("object value normalized to absent");
            Value::Absent(Absence::Unrepresentable)
        }
    }
}

// ──────────────────────────────────────────────
// Environment
// ──────────────────────────────────────────────

/// Case variables keyed by name, already normalized.
///
/// A name that is not present looks exactly like a name mapped to
/// `Absent`: [`Environment::lookup`] yields `Absent(Missing)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment(BTreeMap<String, Value>);

impl Environment {
    pub fn new() -> Self {
        Environment(BTreeMap::new())
    }

    /// Build an environment from a JSON object of raw extracted variables.
    pub fn from_json(raw: &serde_json::Value) -> Result<Self, EnvironmentError> {
        let obj = raw.as_object().ok_or_else(|| EnvironmentError::NotAnObject {
            found: json_type_name(raw),
        })?;
        let vars = obj
            .iter()
            .map(|(k, v)| (k.clone(), normalize(Some(v))))
            .collect();
        Ok(Environment(vars))
    }

    pub fn insert(&mut self, variable: impl Into<String>, value: Value) {
        self.0.insert(variable.into(), value);
    }

    pub fn remove(&mut self, variable: &str) -> Option<Value> {
        self.0.remove(variable)
    }

    pub fn get(&self, variable: &str) -> Option<&Value> {
        self.0.get(variable)
    }

    /// Value of `variable`, with a missing key reported as `Absent(Missing)`.
    pub fn lookup(&self, variable: &str) -> Value {
        self.0
            .get(variable)
            .cloned()
            .unwrap_or(Value::Absent(Absence::Missing))
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.0.contains_key(variable)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .0
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

impl FromIterator<(String, Value)> for Environment {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Environment(iter.into_iter().collect())
    }
}

pub(crate) fn json_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
