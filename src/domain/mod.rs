//! Request/response model shared by the vault bridges.
//!
//! The route layer (not part of this crate) parses raw HTTP into a
//! [`SecretRequest`]; everything downstream works with the typed model
//! defined here. The canonical output shape is produced by
//! [`normalized_document`].

pub mod secret_string;

pub use secret_string::SecretString;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Header and field names shared with the route layer.
pub mod fields {
    pub const SECRET_REFERENCE_METADATA: &str = "secret_reference_metadata";
    pub const SECRET_TYPE: &str = "secret_type";
    pub const SECRET_URN: &str = "secret_urn";
    pub const VAULT_TYPE: &str = "vault_type";
    pub const VAULT_AUTH_HEADER: &str = "Vault-Auth";
    pub const AUTHORIZATION_HEADER: &str = "Authorization";
}

/// The third-party vault a secret lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VaultKind {
    IbmCloudSecretsManager,
    AwsSecretsManager,
    AzureKeyVault,
    AwsSecretsManagerSts,
}

impl VaultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IbmCloudSecretsManager => "ibm-cloud-secrets-manager",
            Self::AwsSecretsManager => "aws-secrets-manager",
            Self::AzureKeyVault => "azure-key-vault",
            Self::AwsSecretsManagerSts => "aws-secrets-manager-sts",
        }
    }

    pub fn all() -> [VaultKind; 4] {
        [
            Self::IbmCloudSecretsManager,
            Self::AwsSecretsManager,
            Self::AzureKeyVault,
            Self::AwsSecretsManagerSts,
        ]
    }

    /// Secret types a vault kind is able to serve.
    pub fn allowed_secret_types(&self) -> &'static [SecretType] {
        use SecretType::*;
        match self {
            Self::IbmCloudSecretsManager => &[Credentials, Certificate, Generic, Key],
            Self::AwsSecretsManager | Self::AzureKeyVault | Self::AwsSecretsManagerSts => {
                &[Credentials, Certificate, Generic, Key, Token]
            }
        }
    }

    pub fn supports(&self, secret_type: SecretType) -> bool {
        self.allowed_secret_types().contains(&secret_type)
    }
}

impl FromStr for VaultKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ibm-cloud-secrets-manager" => Ok(Self::IbmCloudSecretsManager),
            "aws-secrets-manager" => Ok(Self::AwsSecretsManager),
            "azure-key-vault" => Ok(Self::AzureKeyVault),
            "aws-secrets-manager-sts" => Ok(Self::AwsSecretsManagerSts),
            _ => Err(format!("Unknown vault kind: {}", s)),
        }
    }
}

impl fmt::Display for VaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller-facing classification of the secret being fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretType {
    Credentials,
    Certificate,
    Generic,
    Key,
    Token,
}

impl SecretType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credentials => "credentials",
            Self::Certificate => "certificate",
            Self::Generic => "generic",
            Self::Key => "key",
            Self::Token => "token",
        }
    }
}

impl FromStr for SecretType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "credentials" => Ok(Self::Credentials),
            "certificate" => Ok(Self::Certificate),
            "generic" => Ok(Self::Generic),
            "key" => Ok(Self::Key),
            "token" => Ok(Self::Token),
            _ => Err(format!("Unknown secret type: {}", s)),
        }
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One secret-fetch request, as produced by the route layer.
///
/// For single-secret requests `secret_reference_metadata` is the
/// base64+JSON-encoded locator object and `secret_type` names the requested
/// type. For bulk requests `secret_reference_metadata` is a base64+JSON
/// array of per-secret reference objects and `secret_type`/`secret_urn`
/// are carried inside each array entry instead.
#[derive(Debug, Clone, Deserialize)]
pub struct SecretRequest {
    pub secret_reference_metadata: String,
    #[serde(default)]
    pub secret_type: String,
    pub vault_auth_header: String,
    pub transaction_id: String,
    pub vault_kind: String,
    #[serde(default)]
    pub secret_urn: String,
    #[serde(default)]
    pub is_bulk: bool,
}

/// Builds the canonical response document for an extracted secret.
///
/// For `key` and `token` the payload replaces the `secret` wrapper entirely:
/// the caller receives `{"key": ...}` at the top level, not
/// `{"secret": {"key": ...}}`. Every other type nests the payload under its
/// type name. Callers depend on this asymmetry; do not regularize it.
pub fn normalized_document(secret_type: SecretType, payload: Value, urn: Option<&str>) -> Value {
    let mut doc = match secret_type {
        SecretType::Key | SecretType::Token => payload,
        _ => json!({ "secret": { secret_type.as_str(): payload } }),
    };
    if let Some(urn) = urn {
        doc[fields::SECRET_URN] = Value::String(urn.to_string());
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vault_kind_roundtrip() {
        for kind in VaultKind::all() {
            let parsed: VaultKind = kind.as_str().parse().unwrap();
            assert_eq!(kind, parsed);
        }
        assert!("hashicorp-vault".parse::<VaultKind>().is_err());
    }

    #[test]
    fn ibm_does_not_serve_tokens() {
        assert!(!VaultKind::IbmCloudSecretsManager.supports(SecretType::Token));
        assert!(VaultKind::AwsSecretsManager.supports(SecretType::Token));
        assert!(VaultKind::IbmCloudSecretsManager.supports(SecretType::Key));
    }

    #[test]
    fn credentials_nest_under_type_key() {
        let doc = normalized_document(
            SecretType::Credentials,
            json!({"username": "u", "password": "p"}),
            None,
        );
        assert_eq!(doc, json!({"secret": {"credentials": {"username": "u", "password": "p"}}}));
    }

    #[test]
    fn key_payload_replaces_secret_wrapper() {
        let doc = normalized_document(SecretType::Key, json!({"key": "abc"}), None);
        assert_eq!(doc, json!({"key": "abc"}));
        assert!(doc.get("secret").is_none());
    }

    #[test]
    fn bulk_documents_carry_their_urn() {
        let doc = normalized_document(SecretType::Token, json!({"token": "t"}), Some("urn-1"));
        assert_eq!(doc, json!({"token": "t", "secret_urn": "urn-1"}));
    }
}
