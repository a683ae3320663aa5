//! Outcome Envelope Validation
//!
//! Checks the serialized shape of [`CommandOutcome`] against the external
//! output contract: key names, return codes, the stringified update count
//! and the exception field's presence rules.

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::Value;

use common::{base_params, Script, ScriptedFactory};
use omnisql::{CommandEngine, CommandOutcome, ConnectionProvider, Vendor};

fn engine_with(factory: ScriptedFactory) -> CommandEngine {
    let mut provider = ConnectionProvider::empty();
    provider.register_factory(Arc::new(factory));
    CommandEngine::with_provider(provider)
}

fn to_json(outcome: &CommandOutcome) -> Value {
    serde_json::to_value(outcome).expect("outcome serializes")
}

#[tokio::test]
async fn test_success_envelope_shape() {
    let engine = engine_with(ScriptedFactory::new(Vendor::MySql, Script::Count(2)));

    let mut params = base_params("mysql");
    params.insert("command".to_string(), "UPDATE t SET x = 1".to_string());
    let json = to_json(&engine.run(&params).await);

    assert_eq!(json["returnCode"], "0");
    assert_eq!(json["outputText"], "2 row(s) affected");
    assert_eq!(json["updateCount"], "2");
    assert!(json.get("exception").is_none());
}

#[tokio::test]
async fn test_failure_envelope_shape() {
    let engine = engine_with(ScriptedFactory::new(
        Vendor::MySql,
        Script::Fail(1064, "42000".to_string(), "You have an error in your SQL syntax".to_string()),
    ));

    let json = to_json(&engine.run(&base_params("mysql")).await);

    assert_eq!(json["returnCode"], "-1");
    assert_eq!(json["updateCount"], "-1");
    assert_eq!(json["outputText"], "");
    assert_eq!(json["exception"], "1064;42000;You have an error in your SQL syntax");
}

#[tokio::test]
async fn test_validation_failure_envelope() {
    let engine = engine_with(ScriptedFactory::new(Vendor::MySql, Script::Nothing));

    let mut params = base_params("mysql");
    params.insert("command".to_string(), String::new());
    let json = to_json(&engine.run(&params).await);

    assert_eq!(json["returnCode"], "-1");
    let exception = json["exception"].as_str().expect("exception is a string");
    assert!(exception.contains("command input is empty"));
    // Plain message, no driver diagnostic separator structure
    assert!(!exception.contains(";;"));
}

#[tokio::test]
async fn test_envelope_round_trips() {
    let engine = engine_with(ScriptedFactory::new(
        Vendor::Postgres,
        Script::Rows(vec!["a".to_string()]),
    ));

    let outcome = engine.run(&base_params("postgres")).await;
    let json = serde_json::to_string(&outcome).unwrap();
    let parsed: CommandOutcome = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, outcome);
}

#[tokio::test]
async fn test_envelope_never_contains_password() {
    let engine = engine_with(ScriptedFactory::new(
        Vendor::Postgres,
        Script::Fail(0, "28P01".to_string(), "password authentication failed for user \"svc\"".to_string()),
    ));

    let outcome = engine.run(&base_params("postgres")).await;
    let json = serde_json::to_string(&outcome).unwrap();
    // The driver message may name the user, never the secret itself
    assert!(!json.contains("secret"));
}
