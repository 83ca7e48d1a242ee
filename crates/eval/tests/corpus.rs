//! Scenarios over the fixture rule corpus in `rules/corpus.json`.

use std::path::{Path, PathBuf};

use brief_eval::{evaluate, evaluate_with_diagnostics, Environment, Registry, ValueKind};
use serde_json::json;

/// Locate the workspace root by walking up from CARGO_MANIFEST_DIR.
fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    // crates/eval -> workspace root is two levels up
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

fn corpus() -> Registry {
    Registry::from_path(&workspace_root().join("rules/corpus.json")).expect("corpus loads")
}

fn env(v: serde_json::Value) -> Environment {
    Environment::from_json(&v).unwrap()
}

const MUN_793_OR_VARS: [&str; 10] = [
    "medicamento_nao_incorporado_sus",
    "tratamento_oncologico",
    "procedimento_alta_complexidade",
    "internacao_uti",
    "cirurgia_eletiva",
    "fornecimento_insumos",
    "home_care",
    "transporte_sanitario",
    "exame_especializado",
    "consulta_especialista",
];

#[test]
fn corpus_loads_with_expected_shape() {
    let reg = corpus();
    assert_eq!(reg.len(), 13);
    assert_eq!(reg.active_rules().len(), 12);
    assert_eq!(reg.active_variables().len(), 22);
}

#[test]
fn mun_793_fails_when_first_and_child_fails() {
    let reg = corpus();
    let rule = reg.find_by_name("mun_793").unwrap();

    let mut vars = serde_json::Map::new();
    vars.insert("municipio_polo_passivo".to_string(), json!(false));
    for v in MUN_793_OR_VARS {
        vars.insert(v.to_string(), json!(true));
    }
    assert!(!evaluate(rule, &env(serde_json::Value::Object(vars.clone()))));

    vars.insert("municipio_polo_passivo".to_string(), json!(true));
    assert!(evaluate(rule, &env(serde_json::Value::Object(vars))));
}

#[test]
fn mun_793_one_or_branch_is_enough() {
    let reg = corpus();
    let rule = reg.find_by_name("mun_793").unwrap();
    assert!(evaluate(
        rule,
        &env(json!({"municipio_polo_passivo": true, "home_care": true}))
    ));
    assert!(!evaluate(rule, &env(json!({"municipio_polo_passivo": true}))));
}

#[test]
fn mer_cir_sem_esp_sus_absent_variable_activates() {
    let reg = corpus();
    let rule = reg.find_by_name("mer_cir_sem_esp_sus").unwrap();
    assert!(evaluate(rule, &Environment::new()));
    assert!(evaluate(rule, &env(json!({"pareceres_laudo_medico_sus": null}))));
    assert!(evaluate(rule, &env(json!({"pareceres_laudo_medico_sus": false}))));
    assert!(!evaluate(rule, &env(json!({"pareceres_laudo_medico_sus": true}))));
}

#[test]
fn sisreg_zero_is_a_type_mismatch_not_false() {
    let reg = corpus();
    let rule = reg.find_by_name("sisreg_inserido").unwrap();

    let zero = evaluate_with_diagnostics(rule, &env(json!({"pareceres_inserido_sisreg": 0})));
    assert!(!zero.activated);
    assert_eq!(zero.diagnostics.len(), 1);
    assert_eq!(zero.diagnostics[0].observed, ValueKind::Number);
    assert_eq!(zero.diagnostics[0].expected, vec![ValueKind::Boolean]);

    let yes = evaluate_with_diagnostics(rule, &env(json!({"pareceres_inserido_sisreg": true})));
    assert!(yes.activated);
    assert!(yes.diagnostics.is_empty());

    let no = evaluate_with_diagnostics(rule, &env(json!({"pareceres_inserido_sisreg": false})));
    assert!(!no.activated);
    assert!(no.diagnostics.is_empty());
}

#[test]
fn one_bad_fact_does_not_block_other_rules() {
    let reg = corpus();
    let case = env(json!({
        "pareceres_inserido_sisreg": 1,
        "idade_autor": 72,
        "ente_federativo_reu": "uniao"
    }));
    let results = brief_eval::evaluate_all(&reg, &case);
    assert_eq!(results.len(), 12);
    let activated: Vec<&str> = results
        .iter()
        .filter(|a| a.activated)
        .map(|a| a.name.as_str())
        .collect();
    assert!(activated.contains(&"prioridade_idoso"));
    assert!(activated.contains(&"solidariedade_entes"));
    assert!(activated.contains(&"mer_cir_sem_esp_sus"));
    assert!(!activated.contains(&"sisreg_inserido"));
}
