//! Boundary test-case synthesis.
//!
//! For a rule tree the synthesizer builds a baseline environment that
//! satisfies every leaf, then derives one case per leaf with the leaf's
//! variable pushed to its negative value, and one with the variable
//! removed. Every `expected` is obtained by running the production
//! evaluator on the exact environment emitted; nothing is inferred from
//! the leaf's position in the tree.

use std::fmt;
use std::str::FromStr;

use brief_eval::{Condition, Environment, NodePath, Registry, Rule, Value};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::boundary::{negative_value, satisfying_value};

// ──────────────────────────────────────────────
// Case labels
// ──────────────────────────────────────────────

/// What a generated case exercises.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CaseLabel {
    /// The baseline: every leaf satisfied.
    PositiveAll,
    /// One leaf's variable set to a value that falsifies that leaf.
    NegativeLeaf(NodePath),
    /// One leaf's variable removed from the environment.
    NullLeaf(NodePath),
}

impl fmt::Display for CaseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseLabel::PositiveAll => write!(f, "positive_all"),
            CaseLabel::NegativeLeaf(path) => write!(f, "negative_leaf:{}", path),
            CaseLabel::NullLeaf(path) => write!(f, "null_leaf:{}", path),
        }
    }
}

impl FromStr for CaseLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "positive_all" {
            return Ok(CaseLabel::PositiveAll);
        }
        let (kind, path) = s
            .split_once(':')
            .ok_or_else(|| format!("invalid case label '{}'", s))?;
        let path = NodePath::parse(path).ok_or_else(|| format!("invalid node path in '{}'", s))?;
        match kind {
            "negative_leaf" => Ok(CaseLabel::NegativeLeaf(path)),
            "null_leaf" => Ok(CaseLabel::NullLeaf(path)),
            _ => Err(format!("invalid case label '{}'", s)),
        }
    }
}

impl Serialize for CaseLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CaseLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ──────────────────────────────────────────────
// Synthesis output
// ──────────────────────────────────────────────

/// A generated case. `expected` always equals the evaluator's result on
/// `environment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub rule_id: i64,
    pub label: CaseLabel,
    pub environment: Environment,
    pub expected: bool,
}

/// A case that could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unsynthesizable {
    pub label: CaseLabel,
    pub reason: String,
}

/// Everything synthesized for one rule.
#[derive(Debug, Clone)]
pub struct RuleSynthesis {
    pub rule_id: i64,
    pub cases: Vec<TestCase>,
    pub unsynthesizable: Vec<Unsynthesizable>,
    /// Set when no satisfying baseline exists; the rule then has no cases.
    pub excluded: Option<String>,
}

impl RuleSynthesis {
    pub fn is_fully_covered(&self) -> bool {
        self.excluded.is_none() && self.unsynthesizable.is_empty()
    }
}

// ──────────────────────────────────────────────
// Synthesizer
// ──────────────────────────────────────────────

/// Generate the boundary cases of one rule.
pub fn synthesize(rule: &Rule) -> RuleSynthesis {
    let baseline = match build_baseline(rule) {
        Ok(env) => env,
        Err(reason) => {
            tracing::warn!(
                rule_id = rule.id,
                rule = %rule.name,
                %reason,
                "rule excluded from synthesis"
            );
            return RuleSynthesis {
                rule_id: rule.id,
                cases: Vec::new(),
                unsynthesizable: Vec::new(),
                excluded: Some(reason),
            };
        }
    };

    let leaves = rule.ast.leaves();
    let mut cases = Vec::with_capacity(1 + 2 * leaves.len());
    let mut unsynthesizable = Vec::new();

    cases.push(oracle_case(rule, CaseLabel::PositiveAll, baseline.clone()));

    for (path, cond) in &leaves {
        let label = CaseLabel::NegativeLeaf(path.clone());
        match negative_value(cond) {
            Ok(value) => {
                let mut env = baseline.clone();
                env.insert(cond.variable(), value);
                cases.push(oracle_case(rule, label, env));
            }
            Err(reason) => unsynthesizable.push(Unsynthesizable { label, reason }),
        }
    }

    for (path, cond) in &leaves {
        let mut env = baseline.clone();
        env.remove(cond.variable());
        cases.push(oracle_case(rule, CaseLabel::NullLeaf(path.clone()), env));
    }

    tracing::debug!(
        rule_id = rule.id,
        cases = cases.len(),
        unsynthesizable = unsynthesizable.len(),
        "rule synthesized"
    );

    RuleSynthesis {
        rule_id: rule.id,
        cases,
        unsynthesizable,
        excluded: None,
    }
}

/// Synthesize every active rule, in registry order.
pub fn synthesize_all(registry: &Registry) -> Vec<RuleSynthesis> {
    registry.active_rules().into_iter().map(synthesize).collect()
}

/// Same output as [`synthesize_all`], spread over `workers` threads.
pub fn synthesize_all_parallel(registry: &Registry, workers: usize) -> Vec<RuleSynthesis> {
    let rules = registry.active_rules();
    if rules.is_empty() {
        return Vec::new();
    }
    let chunk_size = rules.len().div_ceil(workers.max(1));
    std::thread::scope(|scope| {
        let handles: Vec<_> = rules
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || chunk.iter().map(|r| synthesize(r)).collect::<Vec<_>>())
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| match h.join() {
                Ok(part) => part,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}

fn oracle_case(rule: &Rule, label: CaseLabel, environment: Environment) -> TestCase {
    let expected = brief_eval::evaluate(rule, &environment);
    TestCase {
        rule_id: rule.id,
        label,
        environment,
        expected,
    }
}

/// Build an environment in which every leaf holds where possible, and
/// check that the whole tree holds.
///
/// A variable shared by several leaves takes the first candidate value
/// that satisfies all of them, else the first candidate.
fn build_baseline(rule: &Rule) -> Result<Environment, String> {
    let leaves = rule.ast.leaves();
    let mut env = Environment::new();

    for variable in rule.ast.variables() {
        let conds: Vec<&Condition> = leaves
            .iter()
            .map(|(_, c)| *c)
            .filter(|c| c.variable() == variable)
            .collect();
        let candidates: Vec<Value> = conds
            .iter()
            .filter_map(|c| satisfying_value(c).ok())
            .collect();
        let chosen = candidates
            .iter()
            .find(|v| conds.iter().all(|c| holds(c, v)))
            .or_else(|| candidates.first());
        if let Some(value) = chosen {
            env.insert(variable, value.clone());
        }
    }

    if brief_eval::evaluate(rule, &env) {
        Ok(env)
    } else {
        Err("no environment satisfying every leaf satisfies the rule".to_string())
    }
}

fn holds(cond: &Condition, value: &Value) -> bool {
    let op = cond.operator();
    op.accepts(value, cond.expected()) && op.apply(value, cond.expected())
}
