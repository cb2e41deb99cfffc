// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Bearer token decoding.
//!
//! A token is `base64("username:secret")`. The username doubles as the source the
//! caller writes to and reads from, so one token authenticates exactly one source.
//! Anything that does not decode yields empty credentials; callers must reject those.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credentials {
    identity: String,
    secret: String,
}

impl Credentials {
    /// Decodes an `Authorization` header value. Both `Bearer` and `Basic` schemes are accepted.
    pub fn from_authorization(header: &str) -> Self {
        let header = header.trim();
        let token = ["Bearer", "Basic"]
            .iter()
            .find_map(|scheme| strip_scheme(header, scheme))
            .unwrap_or(header);
        Self::from_token(token)
    }

    /// Decodes a bare token.
    pub fn from_token(token: &str) -> Self {
        let Ok(raw) = STANDARD.decode(token.trim()) else {
            return Self::default();
        };
        let Ok(text) = String::from_utf8(raw) else {
            return Self::default();
        };
        match text.split_once(':') {
            Some((identity, secret)) if !identity.is_empty() => Self {
                identity: identity.to_string(),
                secret: secret.to_string(),
            },
            _ => Self::default(),
        }
    }

    /// Encodes `identity:secret` the way clients present it.
    pub fn encode_token(identity: &str, secret: &str) -> String {
        STANDARD.encode(format!("{identity}:{secret}"))
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn is_empty(&self) -> bool {
        self.identity.is_empty()
    }
}

fn strip_scheme<'a>(header: &'a str, scheme: &str) -> Option<&'a str> {
    let prefix = header.get(..scheme.len())?;
    if !prefix.eq_ignore_ascii_case(scheme) {
        return None;
    }
    let rest = &header[scheme.len()..];
    // "Bearerxyz" is not the Bearer scheme.
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }
    Some(rest.trim_start())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_yields_identity() {
        let token = Credentials::encode_token("alice", "secret1");
        let creds = Credentials::from_authorization(&format!("Bearer {token}"));
        assert_eq!(creds.identity(), "alice");
        assert_eq!(creds.secret(), "secret1");
    }

    #[test]
    fn test_identity_stops_at_first_colon() {
        let token = Credentials::encode_token("alice", "pa:ss");
        let creds = Credentials::from_token(&token);
        assert_eq!(creds.identity(), "alice");
        assert_eq!(creds.secret(), "pa:ss");
    }

    #[test]
    fn test_basic_scheme_is_accepted() {
        let token = Credentials::encode_token("bob", "pw");
        let creds = Credentials::from_authorization(&format!("basic {token}"));
        assert_eq!(creds.identity(), "bob");
    }

    #[test]
    fn test_malformed_tokens_yield_empty_identity() {
        assert!(Credentials::from_authorization("Bearer !!!not-base64!!!").is_empty());
        assert!(Credentials::from_authorization("").is_empty());
        assert!(Credentials::from_authorization("Bearer").is_empty());

        // Decodes, but there is no separator.
        let no_colon = STANDARD.encode("alice");
        assert!(Credentials::from_authorization(&format!("Bearer {no_colon}")).is_empty());

        // Decodes, but the identity part is empty.
        let empty_user = STANDARD.encode(":secret");
        assert!(Credentials::from_token(&empty_user).is_empty());

        // Not UTF-8.
        let binary = STANDARD.encode([0xff, 0xfe, b':', b'x']);
        assert!(Credentials::from_token(&binary).is_empty());
    }

    #[test]
    fn test_scheme_must_be_separated() {
        let token = Credentials::encode_token("alice", "secret1");
        assert!(Credentials::from_authorization(&format!("Bearer{token}")).is_empty());
    }
}
