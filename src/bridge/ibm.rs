//! IBM Cloud Secrets Manager bridge: IAM apikey token exchange, then the
//! Secrets Manager v2 API. The vault reports its own secret type, which is
//! matched against the caller's requested type during normalization.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::bridge::auth_header::{self, keys, AuthHeaderError};
use crate::bridge::{parse_bulk_reference, payload, BridgeContext, VaultBridge};
use crate::cache::UpstreamToken;
use crate::domain::{fields, normalized_document, SecretString, SecretType, VaultKind};
use crate::errors::{codes, BridgeError, ErrorTarget, Result};
use crate::transport::RequestBody;

const SECRET_ID_FIELD: &str = "secret_id";
const IAM_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// IBM Cloud Secrets Manager access via an IAM api key.
pub struct IbmBridge {
    ctx: BridgeContext,
    secret_type: SecretType,
    secret_urn: String,
    secret_id: String,
    vault_url: String,
    api_key: SecretString,
    cache_key: String,
    access_token: Option<String>,
}

impl IbmBridge {
    pub fn new(secret_type: SecretType, secret_urn: String, ctx: BridgeContext) -> Self {
        Self {
            ctx,
            secret_type,
            secret_urn,
            secret_id: String::new(),
            vault_url: String::new(),
            api_key: SecretString::new(String::new()),
            cache_key: String::new(),
            access_token: None,
        }
    }
}

fn auth_header_error(err: AuthHeaderError) -> BridgeError {
    match err {
        AuthHeaderError::Undecodable(detail) => {
            BridgeError::new(codes::IBM_INTERNAL).with_detail(detail)
        }
        AuthHeaderError::TooFewFields { .. } | AuthHeaderError::MalformedPair => {
            BridgeError::new(codes::IBM_AUTH_HEADER_MALFORMED)
                .with_target(ErrorTarget::header(fields::VAULT_AUTH_HEADER))
        }
    }
}

/// Matches the requested type against the vault's native `secret_type`
/// field and extracts the corresponding payload. `generic` accepts any
/// native type and falls back to the whole document.
fn extract_native_secret(
    requested: SecretType,
    secret: &Map<String, Value>,
    native_type: &str,
) -> Option<Value> {
    let generic = requested == SecretType::Generic;
    match native_type {
        "username_password" if requested == SecretType::Credentials || generic => {
            let username = payload::string_field(secret, "username");
            let password = payload::string_field(secret, "password");
            (!username.is_empty() && !password.is_empty())
                .then(|| json!({ "username": username, "password": password }))
        }
        "arbitrary" if requested == SecretType::Key || generic => {
            let key = payload::string_field(secret, "payload");
            (!key.is_empty()).then(|| json!({ "key": key }))
        }
        "imported_cert" if requested == SecretType::Certificate || generic => {
            let cert = payload::string_field(secret, "certificate");
            let key = payload::string_field(secret, "private_key");
            (!cert.is_empty() || !key.is_empty())
                .then(|| json!({ "cert": cert, "key": key }))
        }
        "kv" if generic => {
            let data = secret.get("data").and_then(Value::as_object);
            data.filter(|map| !map.is_empty()).map(|map| Value::Object(map.clone()))
        }
        _ if generic => Some(Value::Object(secret.clone())),
        _ => None,
    }
}

fn normalize_secrets_manager_value(
    secret_type: SecretType,
    raw: &str,
    secret_urn: Option<&str>,
) -> Result<Value> {
    let internal = |detail: &str| BridgeError::new(codes::IBM_INTERNAL).with_detail(detail);

    let secret = payload::parse_json_object(raw)
        .ok_or_else(|| internal("secrets manager response is not a JSON object"))?;
    let native_type = payload::string_field(&secret, fields::SECRET_TYPE);
    if native_type.is_empty() {
        return Err(internal("secrets manager response has no secret_type"));
    }

    let extracted = extract_native_secret(secret_type, &secret, &native_type)
        .ok_or_else(|| internal("requested type does not match the stored secret"))?;

    Ok(normalized_document(secret_type, extracted, secret_urn))
}

#[async_trait]
impl VaultBridge for IbmBridge {
    fn kind(&self) -> VaultKind {
        VaultKind::IbmCloudSecretsManager
    }

    fn secret_urn(&self) -> &str {
        &self.secret_urn
    }

    fn parse_reference(&mut self, encoded: &str) -> Result<()> {
        let decoded = BASE64
            .decode(encoded)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .and_then(|text| payload::parse_json_object(&text))
            .ok_or_else(|| {
                BridgeError::new(codes::IBM_INTERNAL)
                    .with_detail("reference metadata is not base64 JSON")
            })?;

        let secret_id = payload::string_field(&decoded, SECRET_ID_FIELD);
        if secret_id.is_empty() {
            return Err(BridgeError::new(codes::IBM_MISSING_SECRET_ID)
                .with_target(ErrorTarget::query_param(fields::SECRET_REFERENCE_METADATA)));
        }
        self.secret_id = secret_id;
        Ok(())
    }

    fn parse_reference_bulk(&mut self, entry: &Value) -> Result<()> {
        let reference = parse_bulk_reference(
            entry,
            self.kind(),
            SECRET_ID_FIELD,
            codes::IBM_BULK_FIELDS_MISSING,
            codes::IBM_SECRET_TYPE_MISMATCH,
        )?;
        self.secret_urn = reference.secret_urn;
        self.secret_id = reference.locator;
        self.secret_type = reference.secret_type;
        Ok(())
    }

    fn parse_auth(&mut self, encoded: &str) -> Result<()> {
        let auth = auth_header::parse_vault_auth(encoded, 2).map_err(auth_header_error)?;

        let vault_url = auth_header::field(&auth, keys::VAULT_URL);
        let api_key = auth_header::field(&auth, keys::API_KEY);
        if vault_url.is_empty() || api_key.is_empty() {
            return Err(BridgeError::new(codes::IBM_AUTH_FIELDS_EMPTY)
                .with_target(ErrorTarget::header(fields::VAULT_AUTH_HEADER)));
        }

        self.cache_key = api_key.to_string();
        self.vault_url = vault_url.to_string();
        self.api_key = SecretString::new(api_key.to_string());
        Ok(())
    }

    async fn acquire_token(&mut self) -> Result<()> {
        if let Some(token) = self.ctx.token_cache.get(self.kind(), &self.cache_key).await {
            self.access_token = Some(token);
            return Ok(());
        }

        let iam_url = self.ctx.config.ibm_iam_url.clone();
        let form = vec![
            ("grant_type".to_string(), IAM_GRANT_TYPE.to_string()),
            ("apikey".to_string(), self.api_key.expose_secret().to_string()),
        ];

        debug!("requesting ibm iam access token");
        let response = self
            .ctx
            .transport
            .post(&iam_url, &[("Accept", "application/json")], RequestBody::Form(form))
            .await
            .map_err(|e| BridgeError::new(codes::IBM_INTERNAL).with_detail(e.to_string()))?;

        if !response.is_success() {
            return Err(BridgeError::new(codes::IBM_UPSTREAM).with_detail(format!(
                "{} and status code {} returned from {}",
                response.body, response.status, iam_url
            )));
        }

        let parsed: Value = serde_json::from_str(&response.body)
            .map_err(|e| BridgeError::new(codes::IBM_INTERNAL).with_detail(e.to_string()))?;
        let access_token = parsed["access_token"].as_str();
        // IAM reports an absolute unix expiration, unlike Azure's relative one.
        let expiration = parsed["expiration"].as_i64();
        let (access_token, expiration) = match (access_token, expiration) {
            (Some(token), Some(expiration)) => (token.to_string(), expiration),
            _ => {
                return Err(BridgeError::new(codes::IBM_INTERNAL)
                    .with_detail("token response is missing access_token or expiration"))
            }
        };

        self.ctx
            .token_cache
            .put(self.kind(), &self.cache_key, UpstreamToken::new(access_token.clone(), expiration))
            .await;
        self.access_token = Some(access_token);
        Ok(())
    }

    async fn fetch_secret(&self) -> Result<String> {
        let token = self
            .access_token
            .as_deref()
            .ok_or_else(|| BridgeError::new(codes::IBM_INTERNAL).with_detail("no access token"))?;
        let url = format!("{}/api/v2/secrets/{}", self.vault_url, self.secret_id);
        let bearer = format!("Bearer {token}");

        debug!(secret_id = %self.secret_id, "sending request to get the secret");
        let response = self
            .ctx
            .transport
            .get(&url, &[("Authorization", bearer.as_str()), ("Accept", "application/json")])
            .await
            .map_err(|e| BridgeError::new(codes::IBM_INTERNAL).with_detail(e.to_string()))?;

        if !response.is_success() {
            return Err(BridgeError::new(codes::IBM_UPSTREAM).with_detail(format!(
                "{} and status code {} returned from {}",
                response.body, response.status, self.vault_url
            )));
        }
        Ok(response.body)
    }

    fn normalize(&self, raw: &str, is_bulk: bool) -> Result<Value> {
        let urn = is_bulk.then_some(self.secret_urn.as_str());
        normalize_secrets_manager_value(self.secret_type, raw, urn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_password_secret_serves_credentials() {
        let raw = json!({
            "secret_type": "username_password",
            "username": "u",
            "password": "p"
        })
        .to_string();
        let doc = normalize_secrets_manager_value(SecretType::Credentials, &raw, None).unwrap();
        assert_eq!(doc, json!({"secret": {"credentials": {"username": "u", "password": "p"}}}));
    }

    #[test]
    fn arbitrary_secret_serves_key_unwrapped() {
        let raw = json!({"secret_type": "arbitrary", "payload": "k-material"}).to_string();
        let doc = normalize_secrets_manager_value(SecretType::Key, &raw, None).unwrap();
        assert_eq!(doc, json!({"key": "k-material"}));
    }

    #[test]
    fn requested_type_must_match_native_type() {
        let raw = json!({"secret_type": "arbitrary", "payload": "k"}).to_string();
        let err = normalize_secrets_manager_value(SecretType::Credentials, &raw, None).unwrap_err();
        assert_eq!(err.code(), codes::IBM_INTERNAL);
    }

    #[test]
    fn generic_accepts_any_native_type() {
        let raw = json!({
            "secret_type": "username_password",
            "username": "u",
            "password": "p"
        })
        .to_string();
        let doc = normalize_secrets_manager_value(SecretType::Generic, &raw, None).unwrap();
        assert_eq!(doc, json!({"secret": {"generic": {"username": "u", "password": "p"}}}));
    }

    #[test]
    fn kv_data_must_be_non_empty() {
        let raw = json!({"secret_type": "kv", "data": {"a": 1}}).to_string();
        let doc = normalize_secrets_manager_value(SecretType::Generic, &raw, None).unwrap();
        assert_eq!(doc, json!({"secret": {"generic": {"a": 1}}}));

        let raw = json!({"secret_type": "kv", "data": {}}).to_string();
        let err = normalize_secrets_manager_value(SecretType::Generic, &raw, None).unwrap_err();
        assert_eq!(err.code(), codes::IBM_INTERNAL);
    }

    #[test]
    fn unknown_native_type_falls_back_to_full_document_for_generic() {
        let raw = json!({"secret_type": "service_credentials", "payload": "x"}).to_string();
        let doc = normalize_secrets_manager_value(SecretType::Generic, &raw, None).unwrap();
        assert_eq!(
            doc["secret"]["generic"],
            json!({"secret_type": "service_credentials", "payload": "x"})
        );
    }

    #[test]
    fn imported_cert_serves_certificate() {
        let raw = json!({
            "secret_type": "imported_cert",
            "certificate": "CERT",
            "private_key": "KEY"
        })
        .to_string();
        let doc = normalize_secrets_manager_value(SecretType::Certificate, &raw, Some("urn-3"))
            .unwrap();
        assert_eq!(doc["secret"]["certificate"], json!({"cert": "CERT", "key": "KEY"}));
        assert_eq!(doc["secret_urn"], "urn-3");
    }
}
