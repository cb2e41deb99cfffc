// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Access Gate
//!
//! Decides whether a presented credential may touch a source before any store
//! call is reachable.
//!
//! Two authorization variants exist:
//! - `AllowList` (default): the allow-list must map the source to the identity,
//!   a missing entry denies
//! - `AuthenticationOnly`: a valid credential is sufficient

use crate::token::Credentials;
use core::fmt;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Compares a presented secret against the stored one.
pub trait SecretComparator: Send + Sync + fmt::Debug {
    fn matches(&self, presented: &[u8], stored: &[u8]) -> bool;
}

/// Byte equality that does not short-circuit on the first difference.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConstantTimeComparator;

impl SecretComparator for ConstantTimeComparator {
    fn matches(&self, presented: &[u8], stored: &[u8]) -> bool {
        bool::from(presented.ct_eq(stored))
    }
}

/// Plain byte equality.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactComparator;

impl SecretComparator for ExactComparator {
    fn matches(&self, presented: &[u8], stored: &[u8]) -> bool {
        presented == stored
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    AllowList,
    AuthenticationOnly,
}

/// Credential table (`username -> secret`) and allow-list (`source -> username`).
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuthTables {
    #[serde(default)]
    pub authentication: FxHashMap<String, String>,
    #[serde(default)]
    pub authorization: FxHashMap<String, String>,
}

impl AuthTables {
    pub fn with_user(mut self, username: &str, secret: &str) -> Self {
        self.authentication.insert(username.to_string(), secret.to_string());
        self
    }

    pub fn with_grant(mut self, source: &str, username: &str) -> Self {
        self.authorization.insert(source.to_string(), username.to_string());
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("missing source identity")]
    MissingIdentity,
    #[error("invalid credentials")]
    BadCredentials,
    #[error("{identity} may not access source {target}")]
    Forbidden { identity: String, target: String },
}

#[derive(Debug)]
pub struct AccessGate {
    tables: AuthTables,
    mode: AuthMode,
    comparator: Box<dyn SecretComparator>,
}

impl AccessGate {
    pub fn new(tables: AuthTables, mode: AuthMode) -> Self {
        Self {
            tables,
            mode,
            comparator: Box::new(ConstantTimeComparator),
        }
    }

    pub fn with_comparator(mut self, comparator: impl SecretComparator + 'static) -> Self {
        self.comparator = Box::new(comparator);
        self
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// True iff `username` is mapped to exactly `secret`.
    pub fn authenticate(&self, username: &str, secret: &str) -> bool {
        match self.tables.authentication.get(username) {
            Some(stored) => self.comparator.matches(secret.as_bytes(), stored.as_bytes()),
            None => false,
        }
    }

    pub fn authorize(&self, identity: &str, source: &str) -> bool {
        match self.mode {
            AuthMode::AuthenticationOnly => true,
            AuthMode::AllowList => self
                .tables
                .authorization
                .get(source)
                .is_some_and(|allowed| allowed == identity),
        }
    }

    /// Authentication only, as used by the `/auth` probe.
    pub fn verify(&self, creds: &Credentials) -> Result<(), GateError> {
        if creds.is_empty() {
            return Err(GateError::MissingIdentity);
        }
        if !self.authenticate(creds.identity(), creds.secret()) {
            return Err(GateError::BadCredentials);
        }
        Ok(())
    }

    /// Full check: authenticate the credential, then authorize it for `source`.
    pub fn admit(&self, creds: &Credentials, source: &str) -> Result<(), GateError> {
        self.verify(creds)?;
        if !self.authorize(creds.identity(), source) {
            return Err(GateError::Forbidden {
                identity: creds.identity().to_string(),
                target: source.to_string(),
            });
        }
        Ok(())
    }
}
