//! Self-consistency of synthesis over randomly generated rule trees.

use brief_analyze::{synthesize, CaseLabel};
use brief_eval::{evaluate, Operator, Rule, RuleNode, Value};
use proptest::prelude::*;
use rust_decimal::Decimal;

const VARS: [&str; 5] = ["a", "b", "c", "d", "e"];

fn text_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["", "x", "xy", "y"]).prop_map(str::to_string)
}

fn number(n: i64) -> Value {
    Value::Number(Decimal::from(n))
}

fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        (-20i64..20).prop_map(number),
        text_strategy().prop_map(Value::Text),
    ]
}

fn var_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(VARS.to_vec())
}

/// Leaves comparing against a single scalar literal.
fn scalar_leaf_strategy() -> impl Strategy<Value = RuleNode> {
    prop_oneof![
        (var_strategy(), any::<bool>())
            .prop_map(|(v, b)| RuleNode::condition(v, Operator::Equals, Value::Bool(b)).unwrap()),
        (var_strategy(), -20i64..20)
            .prop_map(|(v, n)| RuleNode::condition(v, Operator::Equals, number(n)).unwrap()),
        (var_strategy(), text_strategy())
            .prop_map(|(v, s)| RuleNode::condition(v, Operator::Equals, Value::Text(s)).unwrap()),
        (var_strategy(), -20i64..20)
            .prop_map(|(v, n)| RuleNode::condition(v, Operator::GreaterThan, number(n)).unwrap()),
        (var_strategy(), -20i64..20)
            .prop_map(|(v, n)| RuleNode::condition(v, Operator::LessOrEqual, number(n)).unwrap()),
    ]
}

fn list_leaf(v: &str, op: Operator, items: Vec<Value>) -> RuleNode {
    RuleNode::condition(v, op, Value::List(items)).unwrap()
}

/// Leaves whose literal is a list, or whose variable may be one.
fn collection_leaf_strategy() -> impl Strategy<Value = RuleNode> {
    let needle = prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        (-20i64..20).prop_map(number),
    ];
    prop_oneof![
        (var_strategy(), prop::collection::vec(scalar_strategy(), 0..3))
            .prop_map(|(v, items)| list_leaf(v, Operator::Equals, items)),
        (var_strategy(), text_strategy())
            .prop_map(|(v, s)| RuleNode::condition(v, Operator::Contains, Value::Text(s)).unwrap()),
        (var_strategy(), needle)
            .prop_map(|(v, n)| RuleNode::condition(v, Operator::Contains, n).unwrap()),
        (var_strategy(), prop::collection::vec(any::<bool>().prop_map(Value::Bool), 0..3))
            .prop_map(|(v, items)| list_leaf(v, Operator::InList, items)),
        (var_strategy(), prop::collection::vec((-20i64..20).prop_map(number), 0..4))
            .prop_map(|(v, items)| list_leaf(v, Operator::InList, items)),
        (var_strategy(), prop::collection::vec(text_strategy().prop_map(Value::Text), 0..4))
            .prop_map(|(v, items)| list_leaf(v, Operator::InList, items)),
        // Mixed kinds: the negative value follows the first element.
        (var_strategy(), prop::collection::vec(scalar_strategy(), 1..5))
            .prop_map(|(v, items)| list_leaf(v, Operator::InList, items)),
    ]
}

fn leaf_strategy() -> impl Strategy<Value = RuleNode> {
    prop_oneof![scalar_leaf_strategy(), collection_leaf_strategy()]
}

fn tree_strategy() -> impl Strategy<Value = RuleNode> {
    leaf_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(|c| RuleNode::and(c).unwrap()),
            prop::collection::vec(inner, 1..4).prop_map(|c| RuleNode::or(c).unwrap()),
        ]
    })
}

fn rule(ast: RuleNode) -> Rule {
    Rule {
        id: 7,
        name: "generated".to_string(),
        title: "Generated".to_string(),
        active: true,
        ast,
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn every_case_agrees_with_the_evaluator(tree in tree_strategy()) {
        let r = rule(tree);
        for case in synthesize(&r).cases {
            prop_assert_eq!(evaluate(&r, &case.environment), case.expected);
        }
    }

    #[test]
    fn every_leaf_is_accounted_for(tree in tree_strategy()) {
        let r = rule(tree);
        let leaves = r.ast.leaves().len();
        let s = synthesize(&r);
        if s.excluded.is_some() {
            prop_assert!(s.cases.is_empty());
        } else {
            prop_assert_eq!(s.cases.len() + s.unsynthesizable.len(), 1 + 2 * leaves);
            prop_assert_eq!(&s.cases[0].label, &CaseLabel::PositiveAll);
            prop_assert!(s.cases[0].expected);
        }
    }

    #[test]
    fn synthesis_is_deterministic(tree in tree_strategy()) {
        let r = rule(tree);
        let first = synthesize(&r);
        let second = synthesize(&r);
        prop_assert_eq!(first.cases, second.cases);
        prop_assert_eq!(first.unsynthesizable, second.unsynthesizable);
        prop_assert_eq!(first.excluded, second.excluded);
    }
}
