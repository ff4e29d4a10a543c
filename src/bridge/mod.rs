//! Provider bridges: one type per vault kind, all speaking the same
//! five-step pipeline (parse reference, parse auth, acquire token, fetch,
//! normalize).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::cache::TokenCache;
use crate::config::BridgeConfig;
use crate::domain::{fields, SecretType, VaultKind};
use crate::errors::{BridgeError, ErrorTarget, Result};
use crate::transport::RetryingTransport;

pub mod auth_header;
pub mod aws;
pub mod aws_sts;
pub mod azure;
pub mod ibm;
pub mod payload;

pub use aws::AwsBridge;
pub use aws_sts::AwsStsBridge;
pub use azure::AzureBridge;
pub use ibm::IbmBridge;

/// Shared plumbing handed to every bridge instance.
#[derive(Clone)]
pub struct BridgeContext {
    pub config: Arc<BridgeConfig>,
    pub transport: Arc<RetryingTransport>,
    pub token_cache: Arc<TokenCache>,
    pub transaction_id: String,
}

/// One vault-provider adapter. Methods run in pipeline order; each step
/// fails fast with a registry-coded error.
#[async_trait]
pub trait VaultBridge: Send {
    fn kind(&self) -> VaultKind;

    fn secret_urn(&self) -> &str;

    /// Decodes the base64 reference metadata of a single-secret request.
    fn parse_reference(&mut self, encoded: &str) -> Result<()>;

    /// Consumes one entry of a decoded bulk reference array.
    fn parse_reference_bulk(&mut self, entry: &Value) -> Result<()>;

    /// Decodes and validates the `Vault-Auth` header.
    fn parse_auth(&mut self, encoded: &str) -> Result<()>;

    /// Obtains (or reuses) whatever upstream credential the fetch needs.
    async fn acquire_token(&mut self) -> Result<()>;

    /// Retrieves the raw secret material from the vault.
    async fn fetch_secret(&self) -> Result<String>;

    /// Shapes the raw response into the uniform response document.
    fn normalize(&self, raw: &str, is_bulk: bool) -> Result<Value>;
}

/// One entry of a decoded bulk reference array, after validation.
#[derive(Debug)]
pub(crate) struct BulkReference {
    pub secret_urn: String,
    pub locator: String,
    pub secret_type: SecretType,
}

/// Pulls urn, locator, and secret type out of one bulk array entry and
/// checks the type against the vault's allowed set. Each provider passes
/// its own locator field name and error codes.
pub(crate) fn parse_bulk_reference(
    entry: &Value,
    kind: VaultKind,
    locator_field: &str,
    missing_code: &'static str,
    mismatch_code: &'static str,
) -> Result<BulkReference> {
    let reference_target = ErrorTarget::query_param(fields::SECRET_REFERENCE_METADATA);

    // Non-object entries report the same missing-fields code as entries with
    // empty fields; callers fix both the same way.
    let entry = match entry.as_object() {
        Some(map) => map,
        None => return Err(BridgeError::new(missing_code).with_target(reference_target)),
    };
    let secret_urn = payload::string_field(entry, fields::SECRET_URN);
    let locator = payload::string_field(entry, locator_field);
    let type_name = payload::string_field(entry, fields::SECRET_TYPE);

    if secret_urn.is_empty() || locator.is_empty() || type_name.is_empty() {
        return Err(BridgeError::new(missing_code).with_target(reference_target));
    }

    let secret_type = match type_name.parse::<SecretType>() {
        Ok(parsed) if kind.supports(parsed) => parsed,
        _ => return Err(BridgeError::new(mismatch_code).with_target(reference_target)),
    };

    Ok(BulkReference { secret_urn, locator, secret_type })
}

/// Builds the bridge for a vault kind. Bulk callers pass a placeholder
/// secret type and an empty urn; `parse_reference_bulk` overwrites both.
pub fn bridge_for(
    kind: VaultKind,
    secret_type: SecretType,
    secret_urn: String,
    ctx: BridgeContext,
) -> Box<dyn VaultBridge> {
    match kind {
        VaultKind::AwsSecretsManager => Box::new(AwsBridge::new(secret_type, secret_urn, ctx)),
        VaultKind::AwsSecretsManagerSts => {
            Box::new(AwsStsBridge::new(secret_type, secret_urn, ctx))
        }
        VaultKind::AzureKeyVault => Box::new(AzureBridge::new(secret_type, secret_urn, ctx)),
        VaultKind::IbmCloudSecretsManager => Box::new(IbmBridge::new(secret_type, secret_urn, ctx)),
    }
}

/// Runs the tail of the pipeline once references and auth are in place.
pub async fn process_get_secret(bridge: &mut dyn VaultBridge, is_bulk: bool) -> Result<Value> {
    bridge.acquire_token().await?;
    let raw = bridge.fetch_secret().await?;
    bridge.normalize(&raw, is_bulk)
}
