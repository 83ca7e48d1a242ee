//! Synthesis, snapshot and coverage over the fixture corpus.

use std::path::{Path, PathBuf};

use brief_analyze::{
    analyze, synthesize, synthesize_all, synthesize_all_parallel, CoverageStatus, RuleSynthesis,
    Snapshot,
};
use brief_eval::{evaluate, Registry, Value};
use rust_decimal::Decimal;

fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

fn corpus() -> Registry {
    Registry::from_path(&workspace_root().join("rules/corpus.json")).expect("corpus loads")
}

fn expected_of(s: &RuleSynthesis, label: &str) -> bool {
    s.cases
        .iter()
        .find(|c| c.label.to_string() == label)
        .unwrap_or_else(|| panic!("rule {} has no case {}", s.rule_id, label))
        .expected
}

#[test]
fn corpus_totals() {
    let reg = corpus();
    let (syntheses, report) = analyze(&reg);

    assert_eq!(syntheses.len(), 12);
    let c = &report.corpus;
    assert_eq!(c.rule_count, 13);
    assert_eq!(c.active_rule_count, 12);
    assert_eq!(c.unique_variables, 22);
    assert_eq!(c.total_cases, 60);
    assert_eq!(c.total_unsynthesizable, 1);
    assert_eq!(c.excluded_rules, 1);
    assert_eq!(c.fully_covered_rules, 10);
    assert!((c.fully_covered_pct - 83.33).abs() < 0.01);
}

#[test]
fn per_rule_case_counts() {
    let reg = corpus();
    let counts: Vec<(i64, usize)> = synthesize_all(&reg)
        .iter()
        .map(|s| (s.rule_id, s.cases.len()))
        .collect();
    assert_eq!(
        counts,
        vec![
            (1, 23),
            (2, 3),
            (3, 3),
            (4, 5),
            (5, 3),
            (6, 5),
            (7, 3),
            (8, 3),
            (9, 3),
            (10, 7),
            (11, 2),
            (12, 0)
        ]
    );
}

#[test]
fn mun_793_labels_and_expectations() {
    let reg = corpus();
    let s = synthesize(reg.find_by_name("mun_793").unwrap());

    assert!(expected_of(&s, "positive_all"));
    assert!(!expected_of(&s, "negative_leaf:root.0"));
    assert!(!expected_of(&s, "null_leaf:root.0"));
    for k in 0..10 {
        assert!(expected_of(&s, &format!("negative_leaf:root.1.{}", k)));
        assert!(expected_of(&s, &format!("null_leaf:root.1.{}", k)));
    }
}

#[test]
fn absence_of_a_false_literal_leaf_keeps_rule_active() {
    let reg = corpus();
    let s = synthesize(reg.find_by_name("mer_cir_sem_esp_sus").unwrap());
    assert!(expected_of(&s, "positive_all"));
    assert!(!expected_of(&s, "negative_leaf:root"));
    assert!(expected_of(&s, "null_leaf:root"));
}

#[test]
fn numeric_boundaries_sit_on_the_threshold() {
    let reg = corpus();
    let s = synthesize(reg.find_by_name("demora_regulacao").unwrap());
    let base = &s.cases[0].environment;
    assert_eq!(base.lookup("dias_aguardando_sisreg"), Value::Number(Decimal::from(101)));
    assert!(!expected_of(&s, "negative_leaf:root.1"));
    assert!(!expected_of(&s, "null_leaf:root.1"));
}

#[test]
fn unsatisfiable_and_boolean_universe_rules() {
    let reg = corpus();
    let (_, report) = analyze(&reg);

    let conflicting = reg.find_by_name("prazo_regulacao_conflitante").unwrap();
    assert_eq!(report.rule(conflicting.id).unwrap().status, CoverageStatus::Excluded);
    assert!(synthesize(conflicting).excluded.is_some());

    let laudo = reg.find_by_name("laudo_informado").unwrap();
    let s = synthesize(laudo);
    assert_eq!(s.unsynthesizable.len(), 1);
    assert_eq!(s.unsynthesizable[0].label.to_string(), "negative_leaf:root");
    assert_eq!(report.rule(laudo.id).unwrap().status, CoverageStatus::Partial);

    let inactive = reg.find_by_name("registro_anvisa_tema_106").unwrap();
    assert_eq!(report.rule(inactive.id).unwrap().status, CoverageStatus::Inactive);
}

#[test]
fn every_corpus_case_matches_the_evaluator() {
    let reg = corpus();
    for s in synthesize_all(&reg) {
        let rule = reg.find(s.rule_id).unwrap();
        for case in &s.cases {
            assert_eq!(
                evaluate(rule, &case.environment),
                case.expected,
                "rule {} case {}",
                rule.name,
                case.label
            );
        }
    }
}

#[test]
fn parallel_synthesis_matches_sequential() {
    let reg = corpus();
    let seq = synthesize_all(&reg);
    for workers in [1, 3, 16] {
        let par = synthesize_all_parallel(&reg, workers);
        assert_eq!(par.len(), seq.len());
        for (a, b) in seq.iter().zip(&par) {
            assert_eq!(a.rule_id, b.rule_id);
            assert_eq!(a.cases, b.cases);
            assert_eq!(a.unsynthesizable, b.unsynthesizable);
        }
    }
}

#[test]
fn snapshot_round_trips_through_disk_and_verifies() {
    let reg = corpus();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cases.json");

    let snap = Snapshot::build(&reg);
    assert_eq!(snap.case_count(), 60);
    snap.write(&path).unwrap();

    let loaded = Snapshot::read(&path).unwrap();
    assert_eq!(loaded, snap);
    let v = loaded.verify(&reg).unwrap();
    assert!(v.is_clean(), "{:?}", v);
    assert_eq!(v.cases_checked, 60);
}

#[test]
fn missing_snapshot_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Snapshot::read(&dir.path().join("absent.json")).unwrap_err();
    assert!(err.to_string().contains("cannot access snapshot"));
}
