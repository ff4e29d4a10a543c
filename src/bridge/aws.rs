//! AWS Secrets Manager bridge: caller-supplied long-lived credentials,
//! SigV4-signed `GetSecretValue` calls.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;

use crate::bridge::auth_header::{self, keys, AuthHeaderError};
use crate::bridge::{parse_bulk_reference, payload, BridgeContext, VaultBridge};
use crate::domain::{fields, normalized_document, SecretString, SecretType, VaultKind};
use crate::errors::{codes, BridgeError, ErrorTarget, Result};
use crate::signing::{sign_post, SigningParams};
use crate::transport::RequestBody;

pub(crate) const SECRET_ID_FIELD: &str = "secret_id";
pub(crate) const SECRETS_MANAGER_TARGET: &str = "secretsmanager.GetSecretValue";

/// `host`, `service`, `region` parsed out of the caller's vault URL.
#[derive(Debug, Clone, Default)]
pub(crate) struct VaultEndpoint {
    pub host: String,
    pub service: String,
    pub region: String,
}

/// Splits `https://secretsmanager.us-east-1.amazonaws.com` into its
/// endpoint components. The scheme must be https and the third dot-label
/// must be an `amazonaws` domain.
pub(crate) fn parse_vault_url(url: &str) -> Result<VaultEndpoint> {
    let host = match url.strip_prefix("https://") {
        Some(rest) => rest.trim().to_lowercase(),
        None => {
            return Err(BridgeError::new(codes::AWS_INTERNAL)
                .with_detail(format!("vault url {url} is not https")))
        }
    };

    let components: Vec<&str> = host.split('.').collect();
    let service = components.first().copied().unwrap_or("");
    let region = components.get(1).copied().unwrap_or("");
    let domain_ok = components.get(2).is_some_and(|c| c.starts_with("amazonaws"));

    if host.is_empty() || service.is_empty() || region.is_empty() || !domain_ok {
        return Err(BridgeError::new(codes::AWS_AUTH_HEADER_MALFORMED)
            .with_detail(format!("vault url host {host} is missing endpoint components")));
    }

    let service = service.to_string();
    let region = region.to_string();
    Ok(VaultEndpoint { host, service, region })
}

/// Decodes single-request reference metadata down to the secret id.
pub(crate) fn parse_reference_metadata(encoded: &str) -> Result<String> {
    let reference = decode_reference_object(encoded)
        .map_err(|detail| BridgeError::new(codes::AWS_INTERNAL).with_detail(detail))?;

    let secret_id = payload::string_field(&reference, SECRET_ID_FIELD);
    if secret_id.is_empty() {
        return Err(BridgeError::new(codes::AWS_MISSING_SECRET_ID)
            .with_target(ErrorTarget::query_param(fields::SECRET_REFERENCE_METADATA)));
    }
    Ok(secret_id)
}

fn decode_reference_object(
    encoded: &str,
) -> std::result::Result<serde_json::Map<String, Value>, String> {
    let decoded = BASE64
        .decode(encoded)
        .map_err(|e| format!("reference metadata is not base64: {e}"))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|e| format!("reference metadata is not utf-8: {e}"))?;
    payload::parse_json_object(&decoded)
        .ok_or_else(|| "reference metadata is not a JSON object".to_string())
}

/// Temporary or long-lived AWS credentials used to sign the fetch.
#[derive(Debug, Clone)]
pub(crate) struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub session_token: Option<String>,
}

/// Signs and sends `GetSecretValue`, returning the raw response body.
pub(crate) async fn fetch_secret_value(
    ctx: &BridgeContext,
    vault_url: &str,
    endpoint: &VaultEndpoint,
    credentials: &AwsCredentials,
    secret_id: &str,
) -> Result<String> {
    let body = format!("{{\"SecretId\": \"{secret_id}\"}}");
    let params = SigningParams {
        access_key_id: &credentials.access_key_id,
        secret_access_key: credentials.secret_access_key.expose_secret(),
        region: &endpoint.region,
        service: &endpoint.service,
        host: &endpoint.host,
    };
    let signed = sign_post(&params, &body, Some(SECRETS_MANAGER_TARGET), Utc::now())
        .map_err(|e| BridgeError::new(codes::AWS_INTERNAL).with_detail(e.to_string()))?;

    let mut headers = vec![
        ("x-amz-date", signed.amz_date.as_str()),
        ("x-amz-content-sha256", signed.payload_hash.as_str()),
        ("Authorization", signed.authorization.as_str()),
        ("X-Amz-Target", SECRETS_MANAGER_TARGET),
        ("Content-Type", "application/x-amz-json-1.1"),
    ];
    if let Some(token) = &credentials.session_token {
        headers.push(("X-Amz-Security-Token", token.as_str()));
    }

    debug!(vault_url, "sending request to get the secret");
    let response = ctx
        .transport
        .post(vault_url, &headers, RequestBody::Raw(body))
        .await
        .map_err(|e| BridgeError::new(codes::AWS_INTERNAL).with_detail(e.to_string()))?;

    if !response.is_success() {
        return Err(BridgeError::new(codes::AWS_UPSTREAM_FETCH).with_detail(format!(
            "{} and status code {} returned from {}",
            response.body, response.status, vault_url
        )));
    }
    Ok(response.body)
}

/// Shapes a `GetSecretValue` response into the canonical document.
pub(crate) fn normalize_secret_value(
    secret_type: SecretType,
    raw: &str,
    secret_urn: Option<&str>,
) -> Result<Value> {
    let internal = |detail: String| BridgeError::new(codes::AWS_INTERNAL).with_detail(detail);

    let response = payload::parse_json_object(raw)
        .ok_or_else(|| internal("secrets manager response is not a JSON object".to_string()))?;
    let secret_string = payload::string_field(&response, "SecretString");

    let extracted = match secret_type {
        SecretType::Credentials => {
            let creds = payload::parse_json_object(&secret_string)
                .ok_or_else(|| internal("SecretString is not a JSON object".to_string()))?;
            let username = payload::string_field(&creds, "username");
            let password = payload::string_field(&creds, "password");
            if username.is_empty() || password.is_empty() {
                return Err(internal("credentials secret is missing username or password".to_string()));
            }
            json!({ "username": username, "password": password })
        }
        SecretType::Key => {
            let map = payload::parse_json_object(&secret_string)
                .ok_or_else(|| internal("SecretString is not a JSON object".to_string()))?;
            let key = payload::string_field(&map, "key");
            if key.is_empty() {
                return Err(internal("key secret has no key field".to_string()));
            }
            json!({ "key": key })
        }
        SecretType::Token => {
            let map = payload::parse_json_object(&secret_string)
                .ok_or_else(|| internal("SecretString is not a JSON object".to_string()))?;
            let token = payload::string_field(&map, "token");
            if token.is_empty() {
                return Err(internal("token secret has no token field".to_string()));
            }
            json!({ "token": token })
        }
        SecretType::Certificate => {
            let map = payload::parse_json_object(&secret_string)
                .ok_or_else(|| internal("SecretString is not a JSON object".to_string()))?;
            let cert = payload::string_field(&map, "certificate");
            let key = payload::string_field(&map, "key");
            if cert.is_empty() && key.is_empty() {
                return Err(internal("certificate secret has neither cert nor key".to_string()));
            }
            let (cert, key) = payload::format_cert_key_pem(&cert, &key);
            json!({ "cert": cert, "key": key })
        }
        SecretType::Generic => match serde_json::from_str::<Value>(&secret_string) {
            Ok(parsed) => parsed,
            Err(_) => Value::String(secret_string),
        },
    };

    Ok(normalized_document(secret_type, extracted, secret_urn))
}

fn auth_header_error(err: AuthHeaderError) -> BridgeError {
    match err {
        AuthHeaderError::Undecodable(detail) => {
            BridgeError::new(codes::AWS_INTERNAL).with_detail(detail)
        }
        AuthHeaderError::TooFewFields { .. } | AuthHeaderError::MalformedPair => {
            BridgeError::new(codes::AWS_AUTH_HEADER_MALFORMED)
                .with_target(ErrorTarget::header(fields::VAULT_AUTH_HEADER))
        }
    }
}

/// Direct AWS Secrets Manager access with caller-supplied access keys.
pub struct AwsBridge {
    ctx: BridgeContext,
    secret_type: SecretType,
    secret_urn: String,
    secret_id: String,
    vault_url: String,
    endpoint: VaultEndpoint,
    credentials: Option<AwsCredentials>,
}

impl AwsBridge {
    pub fn new(secret_type: SecretType, secret_urn: String, ctx: BridgeContext) -> Self {
        Self {
            ctx,
            secret_type,
            secret_urn,
            secret_id: String::new(),
            vault_url: String::new(),
            endpoint: VaultEndpoint::default(),
            credentials: None,
        }
    }
}

#[async_trait]
impl VaultBridge for AwsBridge {
    fn kind(&self) -> VaultKind {
        VaultKind::AwsSecretsManager
    }

    fn secret_urn(&self) -> &str {
        &self.secret_urn
    }

    fn parse_reference(&mut self, encoded: &str) -> Result<()> {
        self.secret_id = parse_reference_metadata(encoded)?;
        Ok(())
    }

    fn parse_reference_bulk(&mut self, entry: &Value) -> Result<()> {
        let reference = parse_bulk_reference(
            entry,
            self.kind(),
            SECRET_ID_FIELD,
            codes::AWS_BULK_FIELDS_MISSING,
            codes::AWS_SECRET_TYPE_MISMATCH,
        )?;
        self.secret_urn = reference.secret_urn;
        self.secret_id = reference.locator;
        self.secret_type = reference.secret_type;
        Ok(())
    }

    fn parse_auth(&mut self, encoded: &str) -> Result<()> {
        let auth = auth_header::parse_vault_auth(encoded, 3).map_err(auth_header_error)?;

        let vault_url = auth_header::field(&auth, keys::VAULT_URL);
        let access_key_id = auth_header::field(&auth, keys::AWS_ACCESS_KEY_ID);
        let secret_access_key = auth_header::field(&auth, keys::AWS_SECRET_ACCESS_KEY);
        if vault_url.is_empty() || access_key_id.is_empty() || secret_access_key.is_empty() {
            return Err(BridgeError::new(codes::AWS_AUTH_FIELDS_EMPTY)
                .with_target(ErrorTarget::header(fields::VAULT_AUTH_HEADER)));
        }

        self.endpoint = parse_vault_url(vault_url)?;
        self.vault_url = vault_url.to_string();
        self.credentials = Some(AwsCredentials {
            access_key_id: access_key_id.to_string(),
            secret_access_key: SecretString::new(secret_access_key.to_string()),
            session_token: None,
        });
        Ok(())
    }

    // Caller credentials are used directly; nothing to exchange.
    async fn acquire_token(&mut self) -> Result<()> {
        Ok(())
    }

    async fn fetch_secret(&self) -> Result<String> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| BridgeError::new(codes::AWS_INTERNAL).with_detail("auth not parsed"))?;
        fetch_secret_value(&self.ctx, &self.vault_url, &self.endpoint, credentials, &self.secret_id)
            .await
    }

    fn normalize(&self, raw: &str, is_bulk: bool) -> Result<Value> {
        let urn = is_bulk.then_some(self.secret_urn.as_str());
        normalize_secret_value(self.secret_type, raw, urn)
    }
}
