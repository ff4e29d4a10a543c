//! Shared helpers for the integration tests: request builders and the
//! base64 encodings the gateway expects on the wire.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::Value;
use std::time::Duration;
use vault_bridge::{BridgeConfig, SecretRequest};

pub fn encode(raw: &str) -> String {
    BASE64.encode(raw)
}

pub fn encode_reference(reference: &Value) -> String {
    BASE64.encode(reference.to_string())
}

/// Config pointed at mock upstreams, with the retry budget collapsed so
/// failure tests finish quickly.
pub fn test_config(azure_iam_url: &str, ibm_iam_url: &str) -> BridgeConfig {
    BridgeConfig {
        request_timeout: Duration::from_secs(5),
        retry_count: 1,
        azure_iam_url: azure_iam_url.to_string(),
        ibm_iam_url: ibm_iam_url.to_string(),
        ..BridgeConfig::default()
    }
}

pub fn single_request(
    vault_kind: &str,
    secret_type: &str,
    reference: &Value,
    vault_auth: &str,
) -> SecretRequest {
    SecretRequest {
        secret_reference_metadata: encode_reference(reference),
        secret_type: secret_type.to_string(),
        vault_auth_header: encode(vault_auth),
        transaction_id: "txn-integration".to_string(),
        vault_kind: vault_kind.to_string(),
        secret_urn: "urn:test:secret".to_string(),
        is_bulk: false,
    }
}

pub fn bulk_request(vault_kind: &str, references: &Value, vault_auth: &str) -> SecretRequest {
    SecretRequest {
        secret_reference_metadata: encode_reference(references),
        secret_type: String::new(),
        vault_auth_header: encode(vault_auth),
        transaction_id: "txn-integration".to_string(),
        vault_kind: vault_kind.to_string(),
        secret_urn: String::new(),
        is_bulk: true,
    }
}
