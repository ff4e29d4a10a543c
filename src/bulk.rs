//! Bulk secret retrieval.
//!
//! References are parsed sequentially so a malformed batch fails as a whole
//! before any upstream call is made; the fetches themselves run as one task
//! per secret. A failing sibling never interrupts the others: its slot in
//! the response array carries an error document tagged with the secret urn.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures::future::join_all;
use serde_json::Value;
use tracing::debug;

use crate::bridge::{bridge_for, process_get_secret, BridgeContext, VaultBridge};
use crate::domain::{SecretType, VaultKind};
use crate::errors::{codes, BridgeError, ErrorDocument, Result};

/// Decodes the bulk `secret_reference_metadata` parameter into its array
/// of per-secret reference objects.
fn decode_reference_list(encoded: &str) -> Result<Vec<Value>> {
    let invalid = |detail: String| {
        BridgeError::new(codes::MISSING_REFERENCE_METADATA).with_detail(detail)
    };
    let decoded = BASE64
        .decode(encoded)
        .map_err(|e| invalid(format!("bulk reference metadata is not base64: {e}")))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|e| invalid(format!("bulk reference metadata is not utf-8: {e}")))?;
    match serde_json::from_str::<Value>(&decoded) {
        Ok(Value::Array(entries)) => Ok(entries),
        Ok(_) => Err(invalid("bulk reference metadata is not a JSON array".to_string())),
        Err(e) => Err(invalid(format!("bulk reference metadata is not JSON: {e}"))),
    }
}

/// Fetches every referenced secret, one task per reference.
///
/// Reference parsing is fail-fast and aborts the whole batch; everything
/// after that is per-secret, with failures isolated to their own slot.
pub async fn get_secrets_bulk(
    kind: VaultKind,
    encoded_references: &str,
    vault_auth_header: &str,
    ctx: BridgeContext,
) -> Result<Vec<Value>> {
    let entries = decode_reference_list(encoded_references)?;

    let mut bridges: Vec<Box<dyn VaultBridge>> = Vec::with_capacity(entries.len());
    for entry in &entries {
        // Type and urn are placeholders until the entry itself is parsed.
        let mut bridge = bridge_for(kind, SecretType::Generic, String::new(), ctx.clone());
        bridge.parse_reference_bulk(entry)?;
        bridges.push(bridge);
    }

    debug!(count = bridges.len(), vault_kind = %kind, "dispatching bulk secret fetches");
    let workers = bridges.into_iter().map(|bridge| {
        let auth = vault_auth_header.to_string();
        let worker_ctx = ctx.clone();
        tokio::spawn(async move { fetch_one(bridge, auth, worker_ctx).await })
    });

    let mut results = Vec::with_capacity(entries.len());
    for joined in join_all(workers).await {
        match joined {
            Ok(document) => results.push(document),
            Err(e) => {
                let err = BridgeError::new(codes::FRAMEWORK_INTERNAL).with_detail(e.to_string());
                results.push(error_slot(&err, None, &ctx));
            }
        }
    }
    Ok(results)
}

/// One worker: auth, token, fetch, normalize. Errors become the slot value.
async fn fetch_one(mut bridge: Box<dyn VaultBridge>, auth: String, ctx: BridgeContext) -> Value {
    let urn = bridge.secret_urn().to_string();
    if let Err(err) = bridge.parse_auth(&auth) {
        return error_slot(&err, Some(&urn), &ctx);
    }
    match process_get_secret(bridge.as_mut(), true).await {
        Ok(document) => document,
        Err(err) => error_slot(&err, Some(&urn), &ctx),
    }
}

fn error_slot(err: &BridgeError, urn: Option<&str>, ctx: &BridgeContext) -> Value {
    let mut document =
        ErrorDocument::from_error(err, &ctx.transaction_id, &ctx.config.error_doc_base);
    if let Some(urn) = urn {
        document = document.with_secret_urn(urn);
    }
    serde_json::to_value(&document).unwrap_or_else(|_| Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reference_list_must_be_a_base64_json_array() {
        let encoded = BASE64.encode(r#"[{"secret_urn": "u"}]"#);
        assert_eq!(decode_reference_list(&encoded).unwrap().len(), 1);

        let err = decode_reference_list("@@@").unwrap_err();
        assert_eq!(err.code(), codes::MISSING_REFERENCE_METADATA);

        let encoded = BASE64.encode(r#"{"secret_urn": "u"}"#);
        let err = decode_reference_list(&encoded).unwrap_err();
        assert_eq!(err.code(), codes::MISSING_REFERENCE_METADATA);
        let _ = json!([]);
    }
}
