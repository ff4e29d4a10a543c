//! Request-level orchestration.
//!
//! [`SecretGateway`] owns the long-lived pieces (HTTP transport, token
//! cache, caller-JWT verifier) and turns a [`SecretRequest`] into either a
//! normalized secret document or a wire-ready error document. The embedding
//! HTTP server maps these directly onto responses.

use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::auth::{CallerClaims, CallerVerifier};
use crate::bridge::{bridge_for, process_get_secret, BridgeContext};
use crate::bulk;
use crate::cache::TokenCache;
use crate::config::BridgeConfig;
use crate::domain::{fields, SecretRequest, SecretType, VaultKind};
use crate::errors::{codes, BridgeError, ErrorDocument, ErrorTarget, Result};
use crate::transport::RetryingTransport;

/// Long-lived gateway state shared across requests.
pub struct SecretGateway {
    config: Arc<BridgeConfig>,
    transport: Arc<RetryingTransport>,
    token_cache: Arc<TokenCache>,
    verifier: Option<CallerVerifier>,
}

impl SecretGateway {
    /// Builds the gateway, loading the caller-JWT public key when one is
    /// configured.
    pub fn new(config: BridgeConfig) -> Result<Self> {
        let transport = RetryingTransport::new(&config)
            .map_err(|e| BridgeError::new(codes::FRAMEWORK_INTERNAL).with_detail(e.to_string()))?;
        let verifier = match &config.jwt_public_key_path {
            Some(path) => Some(CallerVerifier::from_rsa_pem_file(path)?),
            None => None,
        };
        Ok(Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
            token_cache: Arc::new(TokenCache::new()),
            verifier,
        })
    }

    /// Like [`SecretGateway::new`] but with a pre-built verifier, for
    /// embedders that source the key material elsewhere.
    pub fn with_verifier(config: BridgeConfig, verifier: CallerVerifier) -> Result<Self> {
        let mut gateway = Self::new(config)?;
        gateway.verifier = Some(verifier);
        Ok(gateway)
    }

    /// Verifies the caller's bearer JWT before any vault work happens.
    pub fn authenticate(&self, authorization: &str) -> Result<CallerClaims> {
        if authorization.is_empty() {
            return Err(BridgeError::new(codes::MISSING_VAULT_AUTH)
                .with_target(ErrorTarget::header(fields::AUTHORIZATION_HEADER)));
        }
        let verifier = self.verifier.as_ref().ok_or_else(|| {
            BridgeError::new(codes::FRAMEWORK_INTERNAL)
                .with_detail("caller JWT public key is not configured")
        })?;
        verifier.verify_header(authorization)
    }

    /// Fetches one secret, translating any failure into its wire document.
    pub async fn get_secret(&self, request: &SecretRequest) -> std::result::Result<Value, ErrorDocument> {
        self.handle_single(request)
            .await
            .map_err(|err| self.error_document(&err, &request.transaction_id))
    }

    /// Fetches a batch of secrets. The outer `Err` covers batch-level
    /// failures (bad parameters, malformed references); per-secret failures
    /// are error documents inside the returned array.
    pub async fn get_secrets_bulk(
        &self,
        request: &SecretRequest,
    ) -> std::result::Result<Vec<Value>, ErrorDocument> {
        self.handle_bulk(request)
            .await
            .map_err(|err| self.error_document(&err, &request.transaction_id))
    }

    /// Renders an error the way the bulk path does, for embedding servers
    /// that need to serialize auth failures themselves.
    pub fn error_document(&self, err: &BridgeError, transaction_id: &str) -> ErrorDocument {
        ErrorDocument::from_error(err, transaction_id, &self.config.error_doc_base)
    }

    fn context(&self, transaction_id: &str) -> BridgeContext {
        BridgeContext {
            config: Arc::clone(&self.config),
            transport: Arc::clone(&self.transport),
            token_cache: Arc::clone(&self.token_cache),
            transaction_id: transaction_id.to_string(),
        }
    }

    fn parse_vault_kind(&self, request: &SecretRequest) -> Result<VaultKind> {
        VaultKind::from_str(&request.vault_kind).map_err(|_| {
            BridgeError::new(codes::UNSUPPORTED_VAULT_KIND)
                .with_target(ErrorTarget::path_param(fields::VAULT_TYPE))
        })
    }

    fn validate_common(&self, request: &SecretRequest) -> Result<()> {
        if request.secret_reference_metadata.is_empty() {
            return Err(BridgeError::new(codes::MISSING_REFERENCE_METADATA)
                .with_target(ErrorTarget::query_param(fields::SECRET_REFERENCE_METADATA)));
        }
        if !request.is_bulk && request.secret_type.is_empty() {
            return Err(BridgeError::new(codes::MISSING_SECRET_TYPE)
                .with_target(ErrorTarget::query_param(fields::SECRET_REFERENCE_METADATA)));
        }
        if request.vault_auth_header.is_empty() {
            return Err(BridgeError::new(codes::MISSING_VAULT_AUTH)
                .with_target(ErrorTarget::header(fields::VAULT_AUTH_HEADER)));
        }
        Ok(())
    }

    async fn handle_single(&self, request: &SecretRequest) -> Result<Value> {
        self.validate_common(request)?;
        let kind = self.parse_vault_kind(request)?;

        let secret_type = match SecretType::from_str(&request.secret_type) {
            Ok(parsed) if kind.supports(parsed) => parsed,
            _ => {
                return Err(BridgeError::new(codes::UNSUPPORTED_SECRET_TYPE)
                    .with_target(ErrorTarget::query_param(fields::SECRET_REFERENCE_METADATA)))
            }
        };

        debug!(
            transaction_id = %request.transaction_id,
            vault_kind = %kind,
            secret_urn = %request.secret_urn,
            "receiving secret request"
        );

        let ctx = self.context(&request.transaction_id);
        let mut bridge = bridge_for(kind, secret_type, request.secret_urn.clone(), ctx);
        bridge.parse_auth(&request.vault_auth_header)?;
        bridge.parse_reference(&request.secret_reference_metadata)?;
        let document = process_get_secret(bridge.as_mut(), false).await?;

        info!(
            transaction_id = %request.transaction_id,
            vault_kind = %kind,
            secret_urn = %request.secret_urn,
            "secret request served"
        );
        Ok(document)
    }

    async fn handle_bulk(&self, request: &SecretRequest) -> Result<Vec<Value>> {
        self.validate_common(request)?;
        let kind = self.parse_vault_kind(request)?;
        let ctx = self.context(&request.transaction_id);
        bulk::get_secrets_bulk(
            kind,
            &request.secret_reference_metadata,
            &request.vault_auth_header,
            ctx,
        )
        .await
    }
}
