//! Rule trees.
//!
//! A [`RuleNode`] can only be built through [`RuleNode::condition`],
//! [`RuleNode::and`] and [`RuleNode::or`], which reject empty junctions and
//! literals the operator cannot use. Children are owned, so a tree can
//! neither share subtrees nor contain cycles.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::operator::Operator;
use crate::value::Value;

/// Structural position of a node: child indices from the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        NodePath(Vec::new())
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        NodePath(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Parse the `root.0.2` rendering produced by `Display`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split('.');
        if parts.next()? != "root" {
            return None;
        }
        parts
            .map(|p| p.parse::<usize>().ok())
            .collect::<Option<Vec<_>>>()
            .map(NodePath)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "root")?;
        for i in &self.0 {
            write!(f, ".{}", i)?;
        }
        Ok(())
    }
}

/// Why a node could not be constructed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    #[error("condition variable name is empty")]
    EmptyVariable,
    #[error("{0} node has no children")]
    EmptyJunction(&'static str),
    #[error("{0}")]
    InvalidLiteral(String),
}

/// A leaf check `(variable, operator, expected)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    variable: String,
    operator: Operator,
    expected: Value,
}

impl Condition {
    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn expected(&self) -> &Value {
        &self.expected
    }
}

/// Ordered, non-empty children of an AND/OR node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Junction {
    children: Vec<RuleNode>,
}

impl Junction {
    pub fn children(&self) -> &[RuleNode] {
        &self.children
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleNode {
    Condition(Condition),
    And(Junction),
    Or(Junction),
}

impl RuleNode {
    pub fn condition(
        variable: impl Into<String>,
        operator: Operator,
        expected: Value,
    ) -> Result<RuleNode, NodeError> {
        let variable = variable.into();
        if variable.is_empty() {
            return Err(NodeError::EmptyVariable);
        }
        operator
            .check_expected(&expected)
            .map_err(NodeError::InvalidLiteral)?;
        Ok(RuleNode::Condition(Condition {
            variable,
            operator,
            expected,
        }))
    }

    pub fn and(children: Vec<RuleNode>) -> Result<RuleNode, NodeError> {
        if children.is_empty() {
            return Err(NodeError::EmptyJunction("and"));
        }
        Ok(RuleNode::And(Junction { children }))
    }

    pub fn or(children: Vec<RuleNode>) -> Result<RuleNode, NodeError> {
        if children.is_empty() {
            return Err(NodeError::EmptyJunction("or"));
        }
        Ok(RuleNode::Or(Junction { children }))
    }

    /// Every leaf with its path, in depth-first left-to-right order.
    pub fn leaves(&self) -> Vec<(NodePath, &Condition)> {
        let mut out = Vec::new();
        collect_leaves(self, NodePath::root(), &mut out);
        out
    }

    /// Leaf variable names in first-occurrence order, without duplicates.
    pub fn variables(&self) -> Vec<String> {
        let mut vars: Vec<String> = Vec::new();
        for (_, cond) in self.leaves() {
            if !vars.iter().any(|v| v == cond.variable()) {
                vars.push(cond.variable().to_string());
            }
        }
        vars
    }

    /// The node at `path`, if it exists.
    pub fn get(&self, path: &NodePath) -> Option<&RuleNode> {
        let mut node = self;
        for &i in path.indices() {
            node = match node {
                RuleNode::And(j) | RuleNode::Or(j) => j.children.get(i)?,
                RuleNode::Condition(_) => return None,
            };
        }
        Some(node)
    }

    pub fn node_count(&self) -> usize {
        match self {
            RuleNode::Condition(_) => 1,
            RuleNode::And(j) | RuleNode::Or(j) => {
                1 + j.children.iter().map(RuleNode::node_count).sum::<usize>()
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            RuleNode::Condition(_) => 1,
            RuleNode::And(j) | RuleNode::Or(j) => {
                1 + j.children.iter().map(RuleNode::depth).max().unwrap_or(0)
            }
        }
    }

    /// Serialize in the rule definition format.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            RuleNode::Condition(c) => serde_json::json!({
                "type": "condition",
                "variable": c.variable,
                "operator": c.operator.as_str(),
                "value": c.expected.to_json(),
            }),
            RuleNode::And(j) => serde_json::json!({
                "type": "and",
                "children": j.children.iter().map(RuleNode::to_json).collect::<Vec<_>>(),
            }),
            RuleNode::Or(j) => serde_json::json!({
                "type": "or",
                "children": j.children.iter().map(RuleNode::to_json).collect::<Vec<_>>(),
            }),
        }
    }

    /// SHA-256 of the compact canonical JSON. Object keys are sorted by
    /// `serde_json::Map`, so the digest depends only on the tree.
    pub fn fingerprint(&self) -> String {
        let canonical = self.to_json().to_string();
        format!("{:x}", Sha256::digest(canonical.as_bytes()))
    }
}

fn collect_leaves<'a>(
    node: &'a RuleNode,
    path: NodePath,
    out: &mut Vec<(NodePath, &'a Condition)>,
) {
    match node {
        RuleNode::Condition(c) => out.push((path, c)),
        RuleNode::And(j) | RuleNode::Or(j) => {
            for (i, child) in j.children.iter().enumerate() {
                collect_leaves(child, path.child(i), out);
            }
        }
    }
}
