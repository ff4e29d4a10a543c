//! `Vault-Auth` header decoding.
//!
//! The header is base64 of `key=value;key=value;...`. The splitting is
//! deliberately the same naive `;` / `=` split the callers already depend
//! on: a value containing either delimiter does not survive, a trailing `;`
//! produces an empty malformed pair, and `a=b=c` keeps only `b`. That
//! fragility is contained here so it stays testable in one place.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::collections::HashMap;

/// Field names the providers look up in the decoded map.
pub mod keys {
    pub const VAULT_URL: &str = "vault_url";
    pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
    pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
    pub const ROLE_ARN: &str = "ROLE_ARN";
    pub const SESSION_NAME: &str = "SESSION_NAME";
    pub const TENANT_ID: &str = "TENANT_ID";
    pub const CLIENT_ID: &str = "CLIENT_ID";
    pub const CLIENT_SECRET: &str = "CLIENT_SECRET";
    pub const API_KEY: &str = "API_KEY";
}

#[derive(Debug, thiserror::Error)]
pub enum AuthHeaderError {
    /// Not valid base64/UTF-8. Maps to the provider's internal code.
    #[error("vault auth header is not decodable: {0}")]
    Undecodable(String),
    /// Fewer `;`-separated fields than the provider requires.
    #[error("vault auth header has fewer than {required} fields")]
    TooFewFields { required: usize },
    /// A field without a `=` separator.
    #[error("vault auth header contains a malformed field")]
    MalformedPair,
}

/// Decodes and splits the header, requiring at least `min_fields` entries.
pub fn parse_vault_auth(
    encoded: &str,
    min_fields: usize,
) -> Result<HashMap<String, String>, AuthHeaderError> {
    let decoded = BASE64
        .decode(encoded)
        .map_err(|e| AuthHeaderError::Undecodable(e.to_string()))?;
    let decoded =
        String::from_utf8(decoded).map_err(|e| AuthHeaderError::Undecodable(e.to_string()))?;

    let items: Vec<&str> = decoded.split(';').collect();
    if items.len() < min_fields {
        return Err(AuthHeaderError::TooFewFields { required: min_fields });
    }

    let mut auth = HashMap::with_capacity(items.len());
    for item in items {
        let mut parts = item.splitn(3, '=');
        match (parts.next(), parts.next()) {
            (Some(key), Some(value)) => {
                auth.insert(key.to_string(), value.to_string());
            }
            _ => return Err(AuthHeaderError::MalformedPair),
        }
    }
    Ok(auth)
}

/// Convenience lookup mirroring `dict.get(key, "")`.
pub fn field<'a>(auth: &'a HashMap<String, String>, key: &str) -> &'a str {
    auth.get(key).map(String::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(raw: &str) -> String {
        BASE64.encode(raw)
    }

    #[test]
    fn splits_into_key_value_map() {
        let auth =
            parse_vault_auth(&encode("vault_url=https://v.example.com;API_KEY=abc"), 2).unwrap();
        assert_eq!(field(&auth, keys::VAULT_URL), "https://v.example.com");
        assert_eq!(field(&auth, keys::API_KEY), "abc");
        assert_eq!(field(&auth, "missing"), "");
    }

    #[test]
    fn too_few_fields_is_rejected() {
        let err = parse_vault_auth(&encode("vault_url=https://v.example.com"), 2).unwrap_err();
        assert!(matches!(err, AuthHeaderError::TooFewFields { required: 2 }));
    }

    #[test]
    fn field_without_separator_is_rejected() {
        let err = parse_vault_auth(&encode("vault_url=x;garbage"), 2).unwrap_err();
        assert!(matches!(err, AuthHeaderError::MalformedPair));
    }

    #[test]
    fn trailing_semicolon_is_a_malformed_pair() {
        // Compatibility quirk: the empty last item fails the pair check.
        let err = parse_vault_auth(&encode("a=1;b=2;"), 2).unwrap_err();
        assert!(matches!(err, AuthHeaderError::MalformedPair));
    }

    #[test]
    fn value_containing_equals_keeps_only_first_segment() {
        let auth = parse_vault_auth(&encode("a=b=c;d=e"), 2).unwrap();
        assert_eq!(field(&auth, "a"), "b");
    }

    #[test]
    fn invalid_base64_is_undecodable() {
        let err = parse_vault_auth("%%%not-base64%%%", 2).unwrap_err();
        assert!(matches!(err, AuthHeaderError::Undecodable(_)));
    }
}
