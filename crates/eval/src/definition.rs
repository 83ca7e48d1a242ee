//! Rule definition format.
//!
//! A rule document is `{"rules": [ ... ]}`. Each rule carries `id`,
//! `name`, `title`, optional `active` (default `true`) and an `ast` whose
//! nodes are tagged by `type`:
//!
//! ```json
//! { "type": "and", "children": [
//!     { "type": "condition", "variable": "municipio_polo_passivo",
//!       "operator": "equals", "value": true },
//!     { "type": "or", "children": [ ... ] } ] }
//! ```
//!
//! Every problem is reported as a [`RuleDefinitionError`] carrying the
//! rule id and node path, so a malformed rule never reaches evaluation.

use crate::error::{RegistryError, RuleDefinitionError};
use crate::node::{NodePath, RuleNode};
use crate::operator::Operator;
use crate::registry::Rule;
use crate::value::{json_type_name, normalize};

/// Parse every rule of a rule document.
pub fn parse_document(doc: &serde_json::Value) -> Result<Vec<Rule>, RegistryError> {
    let rules = doc
        .get("rules")
        .and_then(|r| r.as_array())
        .ok_or_else(|| {
            RegistryError::InvalidDocument("missing 'rules' array".to_string())
        })?;
    let parsed = rules
        .iter()
        .map(parse_rule)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parsed)
}

/// Parse a single rule object.
pub fn parse_rule(obj: &serde_json::Value) -> Result<Rule, RuleDefinitionError> {
    let id = obj
        .get("id")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| RuleDefinitionError {
            rule_id: None,
            path: "id".to_string(),
            message: "missing integer 'id'".to_string(),
        })?;

    let field = |name: &str| -> Result<String, RuleDefinitionError> {
        obj.get(name)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| RuleDefinitionError {
                rule_id: Some(id),
                path: name.to_string(),
                message: format!("missing string '{}'", name),
            })
    };
    let name = field("name")?;
    if name.is_empty() {
        return Err(RuleDefinitionError {
            rule_id: Some(id),
            path: "name".to_string(),
            message: "rule name is empty".to_string(),
        });
    }
    let title = field("title")?;

    let active = match obj.get("active") {
        None => true,
        Some(v) => v.as_bool().ok_or_else(|| RuleDefinitionError {
            rule_id: Some(id),
            path: "active".to_string(),
            message: format!("'active' must be a boolean, got {}", json_type_name(v)),
        })?,
    };

    let ast_json = obj.get("ast").ok_or_else(|| RuleDefinitionError {
        rule_id: Some(id),
        path: "ast".to_string(),
        message: "missing 'ast'".to_string(),
    })?;
    let ast = parse_node(ast_json, id, &NodePath::root())?;

    Ok(Rule {
        id,
        name,
        title,
        active,
        ast,
    })
}

/// Parse one node and its subtree.
pub fn parse_node(
    v: &serde_json::Value,
    rule_id: i64,
    path: &NodePath,
) -> Result<RuleNode, RuleDefinitionError> {
    let fail = |message: String| RuleDefinitionError {
        rule_id: Some(rule_id),
        path: path.to_string(),
        message,
    };

    let node_type = v
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| fail("node missing 'type'".to_string()))?;

    match node_type {
        "condition" => {
            let variable = v
                .get("variable")
                .and_then(|s| s.as_str())
                .ok_or_else(|| fail("condition missing 'variable'".to_string()))?;
            let op_name = v
                .get("operator")
                .and_then(|s| s.as_str())
                .ok_or_else(|| fail("condition missing 'operator'".to_string()))?;
            let operator = Operator::parse(op_name)
                .ok_or_else(|| fail(format!("unknown operator '{}'", op_name)))?;
            let raw = v
                .get("value")
                .ok_or_else(|| fail("condition missing 'value'".to_string()))?;
            let expected = normalize(Some(raw));
            RuleNode::condition(variable, operator, expected).map_err(|e| fail(e.to_string()))
        }
        "and" | "or" => {
            let children = v
                .get("children")
                .and_then(|c| c.as_array())
                .ok_or_else(|| fail(format!("{} node missing 'children' array", node_type)))?;
            let nodes = children
                .iter()
                .enumerate()
                .map(|(i, child)| parse_node(child, rule_id, &path.child(i)))
                .collect::<Result<Vec<_>, _>>()?;
            let built = if node_type == "and" {
                RuleNode::and(nodes)
            } else {
                RuleNode::or(nodes)
            };
            built.map_err(|e| fail(e.to_string()))
        }
        other => Err(fail(format!("unknown node type '{}'", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule_with_ast(ast: serde_json::Value) -> serde_json::Value {
        json!({"id": 9, "name": "r9", "title": "Rule nine", "ast": ast})
    }

    #[test]
    fn parses_nested_rule() {
        let rule = parse_rule(&rule_with_ast(json!({
            "type": "and",
            "children": [
                {"type": "condition", "variable": "a", "operator": "equals", "value": true},
                {"type": "or", "children": [
                    {"type": "condition", "variable": "b", "operator": ">", "value": 3},
                    {"type": "condition", "variable": "c", "operator": "in", "value": ["x", "y"]}
                ]}
            ]
        })))
        .unwrap();
        assert_eq!(rule.id, 9);
        assert!(rule.active);
        assert_eq!(rule.variables_used(), vec!["a", "b", "c"]);
    }

    #[test]
    fn unknown_operator_names_rule_and_path() {
        let err = parse_rule(&rule_with_ast(json!({
            "type": "or",
            "children": [
                {"type": "condition", "variable": "a", "operator": "equals", "value": true},
                {"type": "condition", "variable": "b", "operator": "matches", "value": "x"}
            ]
        })))
        .unwrap_err();
        assert_eq!(err.rule_id, Some(9));
        assert_eq!(err.path, "root.1");
        assert!(err.message.contains("unknown operator 'matches'"));
    }

    #[test]
    fn incompatible_literal_is_rejected() {
        let err = parse_rule(&rule_with_ast(json!(
            {"type": "condition", "variable": "a", "operator": "greater_than", "value": "10"}
        )))
        .unwrap_err();
        assert_eq!(err.path, "root");
        assert!(err.message.contains("greater_than"));
    }

    #[test]
    fn empty_junction_is_rejected() {
        let err = parse_rule(&rule_with_ast(json!({"type": "and", "children": []}))).unwrap_err();
        assert!(err.message.contains("no children"));
    }

    #[test]
    fn unknown_node_type_is_rejected() {
        let err = parse_rule(&rule_with_ast(json!({"type": "not", "children": []}))).unwrap_err();
        assert!(err.message.contains("unknown node type 'not'"));
    }

    #[test]
    fn null_literal_is_rejected() {
        let err = parse_rule(&rule_with_ast(json!(
            {"type": "condition", "variable": "a", "operator": "equals", "value": null}
        )))
        .unwrap_err();
        assert!(err.message.contains("null"));
    }

    #[test]
    fn missing_id_has_no_rule_id() {
        let err = parse_rule(&json!({"name": "x", "title": "x", "ast": {}})).unwrap_err();
        assert_eq!(err.rule_id, None);
        assert_eq!(err.to_string(), "rule <unknown> at id: missing integer 'id'");
    }

    #[test]
    fn document_requires_rules_array() {
        assert!(matches!(
            parse_document(&json!({"regras": []})),
            Err(RegistryError::InvalidDocument(_))
        ));
    }
}
