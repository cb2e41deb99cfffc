// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Payload validation.
//!
//! Payloads are checked for well-formedness without building a value tree and are
//! then stored byte-for-byte, so key order and number formatting survive.

use crate::error::{KernelError, KernelResult};
use serde::de::IgnoredAny;

/// Accepts exactly one well-formed JSON object, surrounded by optional whitespace.
pub fn validate_object(bytes: &[u8]) -> KernelResult<()> {
    let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
    if first != Some(&b'{') {
        return Err(KernelError::MalformedPayload("expected a JSON object".into()));
    }
    serde_json::from_slice::<IgnoredAny>(bytes)
        .map(|_| ())
        .map_err(|e| KernelError::MalformedPayload(e.to_string()))
}
