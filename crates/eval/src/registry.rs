//! The loaded rule set.
//!
//! A [`Registry`] is immutable once built. Reloading builds a complete new
//! registry and swaps it into a [`RegistryHandle`]; readers holding the
//! previous `Arc` keep a consistent view until they drop it.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::definition;
use crate::error::RegistryError;
use crate::node::RuleNode;

/// A legal-argument activation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub id: i64,
    /// Unique machine key.
    pub name: String,
    pub title: String,
    pub active: bool,
    pub ast: RuleNode,
}

impl Rule {
    /// Leaf variable names, first-occurrence order, no duplicates.
    pub fn variables_used(&self) -> Vec<String> {
        self.ast.variables()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "name": self.name,
            "title": self.title,
            "active": self.active,
            "ast": self.ast.to_json(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    rules: Vec<Rule>,
    by_id: BTreeMap<i64, usize>,
    by_name: BTreeMap<String, usize>,
}

impl Registry {
    /// Index a rule set, rejecting duplicate ids and names.
    pub fn from_rules(rules: Vec<Rule>) -> Result<Self, RegistryError> {
        let mut by_id = BTreeMap::new();
        let mut by_name = BTreeMap::new();
        for (i, rule) in rules.iter().enumerate() {
            if by_id.insert(rule.id, i).is_some() {
                return Err(RegistryError::DuplicateId { rule_id: rule.id });
            }
            if by_name.insert(rule.name.clone(), i).is_some() {
                return Err(RegistryError::DuplicateName {
                    rule_id: rule.id,
                    name: rule.name.clone(),
                });
            }
        }
        Ok(Registry {
            rules,
            by_id,
            by_name,
        })
    }

    /// Load a rule document. Any malformed rule fails the whole load.
    pub fn from_json(doc: &serde_json::Value) -> Result<Self, RegistryError> {
        let registry = Self::from_rules(definition::parse_document(doc)?)?;
        tracing::info!(
            rules = registry.len(),
            active = registry.active_rules().len(),
            "rule registry loaded"
        );
        Ok(registry)
    }

    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        let io_err = |message: String| RegistryError::Io {
            path: path.display().to_string(),
            message,
        };
        let text = std::fs::read_to_string(path).map_err(|e| io_err(e.to_string()))?;
        let doc: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| RegistryError::InvalidDocument(e.to_string()))?;
        Self::from_json(&doc)
    }

    /// All rules in document order, active or not.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn active_rules(&self) -> Vec<&Rule> {
        self.rules.iter().filter(|r| r.active).collect()
    }

    pub fn find(&self, rule_id: i64) -> Result<&Rule, RegistryError> {
        self.by_id
            .get(&rule_id)
            .map(|&i| &self.rules[i])
            .ok_or(RegistryError::RuleNotFound { rule_id })
    }

    pub fn find_by_name(&self, name: &str) -> Result<&Rule, RegistryError> {
        self.by_name
            .get(name)
            .map(|&i| &self.rules[i])
            .ok_or_else(|| RegistryError::RuleNameNotFound {
                name: name.to_string(),
            })
    }

    /// Look a rule up by numeric id or, failing that, by name.
    pub fn resolve(&self, key: &str) -> Result<&Rule, RegistryError> {
        match key.parse::<i64>() {
            Ok(id) => self.find(id),
            Err(_) => self.find_by_name(key),
        }
    }

    pub fn variables_used(&self, rule: &Rule) -> Vec<String> {
        rule.variables_used()
    }

    /// Distinct variables across all active rules, first-occurrence order.
    pub fn active_variables(&self) -> Vec<String> {
        let mut vars: Vec<String> = Vec::new();
        for rule in self.active_rules() {
            for v in rule.variables_used() {
                if !vars.contains(&v) {
                    vars.push(v);
                }
            }
        }
        vars
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Shared, atomically replaceable registry.
#[derive(Debug, Default)]
pub struct RegistryHandle {
    current: RwLock<Arc<Registry>>,
}

impl RegistryHandle {
    pub fn new(registry: Registry) -> Self {
        RegistryHandle {
            current: RwLock::new(Arc::new(registry)),
        }
    }

    /// The registry as of now. Later reloads do not affect the returned value.
    pub fn snapshot(&self) -> Arc<Registry> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Replace the registry wholesale.
    pub fn replace(&self, registry: Registry) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(registry);
    }

    /// Load a new rule document and swap it in. On error the current
    /// registry stays in place.
    pub fn reload(&self, doc: &serde_json::Value) -> Result<(), RegistryError> {
        let registry = Registry::from_json(doc)?;
        self.replace(registry);
        tracing::info!("rule registry reloaded");
        Ok(())
    }
}
