use super::{ready_engine, serial};
use crate::{ScriptEngine, TransformationError, validate_script};

#[serial]
#[tokio::test]
async fn valid_script_compiles() {
    let engine = ready_engine().await;
    let outcome = validate_script(&engine, r#"result = { version: "v2", plain: data.msg };"#)
        .expect("validation should run");
    assert!(outcome.is_none(), "expected no diagnostic, got {outcome:?}");
}

#[serial]
#[tokio::test]
async fn top_level_return_and_data_reference_parse() {
    let engine = ready_engine().await;
    // The synthetic function wrapper makes both of these legal.
    let outcome = validate_script(&engine, "if (!data.msg) { return; } result = data.msg;")
        .expect("validation should run");
    assert!(outcome.is_none(), "expected no diagnostic, got {outcome:?}");
}

#[serial]
#[tokio::test]
async fn syntax_error_yields_a_diagnostic() {
    let engine = ready_engine().await;
    let outcome = validate_script(&engine, "result = {{{").expect("validation should run");
    let diagnostic = outcome.expect("expected a compile diagnostic");
    assert!(!diagnostic.is_empty());
}

#[serial]
#[tokio::test]
async fn validation_is_idempotent() {
    let engine = ready_engine().await;
    for script in ["result = 1;", "result = {{{"] {
        let first = validate_script(&engine, script).expect("validation should run");
        let second = validate_script(&engine, script).expect("validation should run");
        assert_eq!(first.is_some(), second.is_some());
    }
}

#[serial]
#[tokio::test]
async fn validation_does_not_evaluate_the_script() {
    let engine = ready_engine().await;
    // An infinite loop is fine to compile; only evaluation would hang.
    let outcome =
        validate_script(&engine, "while (true) {}").expect("validation should run");
    assert!(outcome.is_none());
}

#[tokio::test]
async fn validate_requires_a_ready_engine() {
    let engine = ScriptEngine::new();
    assert!(!engine.is_ready());
    let err = validate_script(&engine, "result = 1;").unwrap_err();
    assert!(matches!(err, TransformationError::EngineNotReady));
}
