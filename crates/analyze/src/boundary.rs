//! Per-operator boundary values.
//!
//! For each leaf the synthesizer needs a value that satisfies it and a
//! value that falsifies it without changing the variable's kind. Both
//! derivations are total: when no such value exists they return `None`
//! with a reason, and the caller records the case as unsynthesizable.

use brief_eval::{Condition, Operator, Value};
use rust_decimal::Decimal;

/// A value for which the leaf evaluates to `true`.
pub fn satisfying_value(cond: &Condition) -> Result<Value, String> {
    let expected = cond.expected();
    match (cond.operator(), expected) {
        (Operator::Equals, v) => Ok(v.clone()),
        (Operator::GreaterThan, Value::Number(n)) => n
            .checked_add(Decimal::ONE)
            .map(Value::Number)
            .ok_or_else(|| format!("no number greater than {}", n)),
        (Operator::LessOrEqual, Value::Number(n)) => Ok(Value::Number(*n)),
        (Operator::Contains, Value::Text(s)) => Ok(Value::Text(s.clone())),
        (Operator::Contains, needle) => Ok(Value::List(vec![needle.clone()])),
        (Operator::InList, Value::List(items)) => items
            .first()
            .cloned()
            .ok_or_else(|| "in_list over an empty list is never satisfied".to_string()),
        (op, v) => Err(format!("{} has no satisfying value for a {} literal", op, v.kind())),
    }
}

/// A value of the satisfying kind for which the leaf evaluates to `false`.
///
/// | operator              | negative value                                  |
/// |-----------------------|-------------------------------------------------|
/// | equals bool `b`       | `!b`                                            |
/// | equals number `n`     | `n + 1` (`n - 1` at the upper bound)            |
/// | equals string `s`     | `s` with a `~` appended                         |
/// | equals list `l`       | `l` with an extra `false` element               |
/// | greater_than `n`      | `n`                                             |
/// | less_or_equal `n`     | `n + 1`                                         |
/// | contains string `s`   | `""` (none when `s` is empty)                   |
/// | contains scalar `x`   | `[]`                                            |
/// | in_list `l`           | a value of the first element's kind outside `l` |
///
/// `in_list` over booleans that lists both `true` and `false` covers its
/// whole domain and has no negative value.
pub fn negative_value(cond: &Condition) -> Result<Value, String> {
    let expected = cond.expected();
    match (cond.operator(), expected) {
        (Operator::Equals, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (Operator::Equals, Value::Number(n)) => n
            .checked_add(Decimal::ONE)
            .or_else(|| n.checked_sub(Decimal::ONE))
            .map(Value::Number)
            .ok_or_else(|| format!("no number distinct from {}", n)),
        (Operator::Equals, Value::Text(s)) => Ok(Value::Text(format!("{}~", s))),
        (Operator::Equals, Value::List(items)) => {
            let mut longer = items.clone();
            longer.push(Value::Bool(false));
            Ok(Value::List(longer))
        }
        (Operator::GreaterThan, Value::Number(n)) => Ok(Value::Number(*n)),
        (Operator::LessOrEqual, Value::Number(n)) => n
            .checked_add(Decimal::ONE)
            .map(Value::Number)
            .ok_or_else(|| format!("no number greater than {}", n)),
        (Operator::Contains, Value::Text(s)) => {
            if s.is_empty() {
                Err("every string contains the empty string".to_string())
            } else {
                Ok(Value::Text(String::new()))
            }
        }
        (Operator::Contains, _) => Ok(Value::List(Vec::new())),
        (Operator::InList, Value::List(items)) => value_outside(items),
        (op, v) => Err(format!("{} has no negative value for a {} literal", op, v.kind())),
    }
}

/// A value of the same kind as `items[0]` that equals no element of `items`.
fn value_outside(items: &[Value]) -> Result<Value, String> {
    let first = items
        .first()
        .ok_or_else(|| "in_list over an empty list has no kind to negate".to_string())?;
    match first {
        Value::Bool(_) => [false, true]
            .into_iter()
            .map(Value::Bool)
            .find(|candidate| !items.contains(candidate))
            .ok_or_else(|| "in_list covers both booleans; no value lies outside it".to_string()),
        Value::Number(_) => {
            let max = items
                .iter()
                .filter_map(|v| match v {
                    Value::Number(n) => Some(*n),
                    _ => None,
                })
                .max()
                .unwrap_or(Decimal::ZERO);
            max.checked_add(Decimal::ONE)
                .map(Value::Number)
                .ok_or_else(|| "in_list reaches the largest number".to_string())
        }
        Value::Text(_) => {
            // Longer than every listed string, so equal to none of them.
            let longest = items
                .iter()
                .filter_map(|v| match v {
                    Value::Text(s) => Some(s.as_str()),
                    _ => None,
                })
                .max_by_key(|s| s.chars().count())
                .unwrap_or("");
            Ok(Value::Text(format!("{}~", longest)))
        }
        other => Err(format!("in_list element of kind {} cannot be negated", other.kind())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brief_eval::predicate::evaluate_node;
    use brief_eval::{Environment, RuleNode};

    fn num(n: i64) -> Value {
        Value::Number(Decimal::from(n))
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn leaf(op: Operator, expected: Value) -> RuleNode {
        RuleNode::condition("v", op, expected).unwrap()
    }

    fn cond(node: &RuleNode) -> &Condition {
        match node {
            RuleNode::Condition(c) => c,
            _ => unreachable!(),
        }
    }

    fn holds(node: &RuleNode, value: Value) -> bool {
        let mut env = Environment::new();
        env.insert("v", value);
        evaluate_node(node, &env)
    }

    #[test]
    fn satisfying_and_negative_values_bracket_each_leaf() {
        let leaves = vec![
            leaf(Operator::Equals, Value::Bool(true)),
            leaf(Operator::Equals, Value::Bool(false)),
            leaf(Operator::Equals, num(7)),
            leaf(Operator::Equals, text("SP")),
            leaf(Operator::Equals, Value::List(vec![text("a")])),
            leaf(Operator::GreaterThan, num(100)),
            leaf(Operator::LessOrEqual, num(3)),
            leaf(Operator::Contains, text("neoplasia")),
            leaf(Operator::Contains, num(4)),
            leaf(Operator::InList, Value::List(vec![text("estado"), text("uniao")])),
            leaf(Operator::InList, Value::List(vec![num(1), num(5)])),
            leaf(Operator::InList, Value::List(vec![Value::Bool(true)])),
        ];
        for node in &leaves {
            let c = cond(node);
            let pos = satisfying_value(c).unwrap();
            let neg = negative_value(c).unwrap();
            assert!(holds(node, pos.clone()), "{:?} should satisfy {:?}", pos, node);
            assert!(!holds(node, neg.clone()), "{:?} should falsify {:?}", neg, node);
            assert_eq!(pos.kind(), neg.kind(), "negative keeps the kind for {:?}", node);
        }
    }

    #[test]
    fn boolean_universe_has_no_negative() {
        let node = leaf(
            Operator::InList,
            Value::List(vec![Value::Bool(true), Value::Bool(false)]),
        );
        assert!(negative_value(cond(&node)).is_err());
    }

    #[test]
    fn empty_needle_has_no_negative() {
        let node = leaf(Operator::Contains, text(""));
        assert!(negative_value(cond(&node)).is_err());
    }

    #[test]
    fn empty_in_list_has_no_satisfying_value() {
        let node = leaf(Operator::InList, Value::List(vec![]));
        assert!(satisfying_value(cond(&node)).is_err());
        assert!(negative_value(cond(&node)).is_err());
    }

    #[test]
    fn bounds_of_decimal_range() {
        let node = leaf(Operator::GreaterThan, Value::Number(Decimal::MAX));
        assert!(satisfying_value(cond(&node)).is_err());
        let node = leaf(Operator::Equals, Value::Number(Decimal::MAX));
        assert_eq!(
            negative_value(cond(&node)).unwrap(),
            Value::Number(Decimal::MAX - Decimal::ONE)
        );
    }
}
