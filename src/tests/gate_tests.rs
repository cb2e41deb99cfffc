// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::gate::{AccessGate, AuthMode, AuthTables, ExactComparator, GateError};
use crate::token::Credentials;

fn tables() -> AuthTables {
    AuthTables::default()
        .with_user("alice", "secret1")
        .with_user("bob", "hunter2")
        .with_grant("alice", "alice")
}

fn creds(user: &str, secret: &str) -> Credentials {
    Credentials::from_token(&Credentials::encode_token(user, secret))
}

#[test]
fn test_authenticate_requires_exact_secret() {
    let gate = AccessGate::new(tables(), AuthMode::AllowList);
    assert!(gate.authenticate("alice", "secret1"));
    assert!(!gate.authenticate("alice", "secret"));
    assert!(!gate.authenticate("alice", "secret1 "));
    assert!(!gate.authenticate("carol", "secret1"));
}

#[test]
fn test_allow_list_denies_by_default() {
    let gate = AccessGate::new(tables(), AuthMode::AllowList);
    assert!(gate.authorize("alice", "alice"));
    // bob authenticates but has no allow-list entry.
    assert!(!gate.authorize("bob", "bob"));
    assert!(!gate.authorize("bob", "alice"));

    assert_eq!(
        gate.admit(&creds("bob", "hunter2"), "bob"),
        Err(GateError::Forbidden {
            identity: "bob".into(),
            target: "bob".into()
        })
    );
}

#[test]
fn test_authentication_only_skips_allow_list() {
    let gate = AccessGate::new(tables(), AuthMode::AuthenticationOnly);
    assert!(gate.authorize("bob", "bob"));
    assert_eq!(gate.admit(&creds("bob", "hunter2"), "bob"), Ok(()));
    assert_eq!(
        gate.admit(&creds("bob", "wrong"), "bob"),
        Err(GateError::BadCredentials)
    );
}

#[test]
fn test_admit_orders_checks() {
    let gate = AccessGate::new(tables(), AuthMode::AllowList);
    assert_eq!(
        gate.admit(&Credentials::from_token("%%%"), "alice"),
        Err(GateError::MissingIdentity)
    );
    assert_eq!(
        gate.admit(&creds("alice", "nope"), "alice"),
        Err(GateError::BadCredentials)
    );
    assert_eq!(gate.admit(&creds("alice", "secret1"), "alice"), Ok(()));
}

#[test]
fn test_comparator_is_pluggable() {
    let gate = AccessGate::new(tables(), AuthMode::AllowList).with_comparator(ExactComparator);
    assert!(gate.authenticate("bob", "hunter2"));
    assert!(!gate.authenticate("bob", "hunter3"));
}

#[test]
fn test_tables_parse_from_toml_shape() {
    let json = r#"{"authentication":{"alice":"secret1"},"authorization":{"alice":"alice"}}"#;
    let tables: AuthTables = serde_json::from_str(json).unwrap();
    let gate = AccessGate::new(tables, AuthMode::default());
    assert_eq!(gate.mode(), AuthMode::AllowList);
    assert_eq!(gate.admit(&creds("alice", "secret1"), "alice"), Ok(()));
}
