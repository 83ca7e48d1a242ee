//! Persisted synthesis output.
//!
//! A snapshot records, per active rule, the generated cases together with
//! the AST fingerprint they were generated from. Verification re-runs the
//! evaluator over every stored case, so a change in evaluator semantics
//! or in a rule definition shows up as a mismatch or a stale entry.

use std::collections::BTreeSet;
use std::path::Path;

use brief_eval::{Environment, Registry, Rule};
use serde::{Deserialize, Serialize};

use crate::synth::{self, CaseLabel, RuleSynthesis, Unsynthesizable};

pub const SNAPSHOT_FORMAT: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("cannot access snapshot '{path}': {message}")]
    Io { path: String, message: String },

    #[error("malformed snapshot: {0}")]
    Json(String),

    #[error("unsupported snapshot format {found} (expected {current})", current = SNAPSHOT_FORMAT)]
    Format { found: u32 },

    #[error("rule {rule_id} case {label}: {source}")]
    Environment {
        rule_id: i64,
        label: String,
        #[source]
        source: brief_eval::EnvironmentError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotCase {
    pub label: CaseLabel,
    pub environment: serde_json::Value,
    pub expected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSnapshot {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub variables: Vec<String>,
    pub fingerprint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded: Option<String>,
    pub cases: Vec<SnapshotCase>,
    #[serde(default)]
    pub unsynthesizable: Vec<Unsynthesizable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub format: u32,
    pub rules: Vec<RuleSnapshot>,
}

impl RuleSnapshot {
    pub fn from_synthesis(rule: &Rule, synthesis: &RuleSynthesis) -> Self {
        RuleSnapshot {
            id: rule.id,
            name: rule.name.clone(),
            title: rule.title.clone(),
            variables: rule.variables_used(),
            fingerprint: rule.ast.fingerprint(),
            excluded: synthesis.excluded.clone(),
            cases: synthesis
                .cases
                .iter()
                .map(|c| SnapshotCase {
                    label: c.label.clone(),
                    environment: c.environment.to_json(),
                    expected: c.expected,
                })
                .collect(),
            unsynthesizable: synthesis.unsynthesizable.clone(),
        }
    }
}

impl Snapshot {
    /// Synthesize every active rule of `registry`.
    pub fn build(registry: &Registry) -> Self {
        let rules = registry
            .active_rules()
            .into_iter()
            .map(|rule| RuleSnapshot::from_synthesis(rule, &synth::synthesize(rule)))
            .collect();
        Snapshot {
            format: SNAPSHOT_FORMAT,
            rules,
        }
    }

    pub fn case_count(&self) -> usize {
        self.rules.iter().map(|r| r.cases.len()).sum()
    }

    pub fn to_json_string(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(|e| SnapshotError::Json(e.to_string()))
    }

    pub fn from_json_str(s: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot =
            serde_json::from_str(s).map_err(|e| SnapshotError::Json(e.to_string()))?;
        if snapshot.format != SNAPSHOT_FORMAT {
            return Err(SnapshotError::Format {
                found: snapshot.format,
            });
        }
        Ok(snapshot)
    }

    pub fn write(&self, path: &Path) -> Result<(), SnapshotError> {
        let mut text = self.to_json_string()?;
        text.push('\n');
        std::fs::write(path, text).map_err(|e| SnapshotError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        tracing::info!(path = %path.display(), rules = self.rules.len(), "snapshot written");
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self, SnapshotError> {
        let text = std::fs::read_to_string(path).map_err(|e| SnapshotError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&text)
    }

    /// Check the stored cases against `registry` and the current evaluator.
    ///
    /// Cases of a stale rule (fingerprint changed) are not re-evaluated;
    /// the rule is reported as stale instead.
    pub fn verify(&self, registry: &Registry) -> Result<Verification, SnapshotError> {
        let mut result = Verification::default();
        let mut seen = BTreeSet::new();

        for stored in &self.rules {
            seen.insert(stored.id);
            let rule = match registry.find(stored.id) {
                Ok(rule) if rule.active => rule,
                _ => {
                    result.orphaned.push(stored.id);
                    continue;
                }
            };
            if rule.ast.fingerprint() != stored.fingerprint {
                result.stale.push(stored.id);
                continue;
            }
            for case in &stored.cases {
                let env = Environment::from_json(&case.environment).map_err(|source| {
                    SnapshotError::Environment {
                        rule_id: stored.id,
                        label: case.label.to_string(),
                        source,
                    }
                })?;
                let actual = brief_eval::evaluate(rule, &env);
                result.cases_checked += 1;
                if actual != case.expected {
                    tracing::warn!(
                        rule_id = stored.id,
                        label = %case.label,
                        "snapshot case disagrees with evaluator"
                    );
                    result.mismatches.push(CaseMismatch {
                        rule_id: stored.id,
                        label: case.label.clone(),
                        expected: case.expected,
                        actual,
                    });
                }
            }
        }

        result.missing = registry
            .active_rules()
            .into_iter()
            .map(|r| r.id)
            .filter(|id| !seen.contains(id))
            .collect();
        Ok(result)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseMismatch {
    pub rule_id: i64,
    pub label: CaseLabel,
    pub expected: bool,
    pub actual: bool,
}

/// Outcome of [`Snapshot::verify`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub cases_checked: usize,
    pub mismatches: Vec<CaseMismatch>,
    /// Rules whose definition changed since the snapshot was taken.
    pub stale: Vec<i64>,
    /// Active rules with no snapshot entry.
    pub missing: Vec<i64>,
    /// Snapshot entries with no active rule behind them.
    pub orphaned: Vec<i64>,
}

impl Verification {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
            && self.stale.is_empty()
            && self.missing.is_empty()
            && self.orphaned.is_empty()
    }
}
