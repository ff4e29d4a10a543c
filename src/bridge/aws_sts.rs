//! AWS Secrets Manager via STS: the caller supplies a role ARN instead of
//! access keys; the bridge assumes the role with the service account's own
//! credentials and signs the fetch with the temporary set.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use crate::bridge::auth_header::{self, keys};
use crate::bridge::aws::{self, AwsCredentials, VaultEndpoint, SECRET_ID_FIELD};
use crate::bridge::{parse_bulk_reference, BridgeContext, VaultBridge};
use crate::domain::{fields, SecretString, SecretType, VaultKind};
use crate::errors::{codes, BridgeError, ErrorTarget, Result};
use crate::signing::{sign_post, SigningParams};
use crate::transport::RequestBody;

const STS_API_VERSION: &str = "2011-06-15";
const DEFAULT_SESSION_NAME: &str = "default_session";

/// Secrets Manager access through an assumed role.
pub struct AwsStsBridge {
    ctx: BridgeContext,
    secret_type: SecretType,
    secret_urn: String,
    secret_id: String,
    vault_url: String,
    endpoint: VaultEndpoint,
    role_arn: String,
    session_name: String,
    credentials: Option<AwsCredentials>,
}

impl AwsStsBridge {
    pub fn new(secret_type: SecretType, secret_urn: String, ctx: BridgeContext) -> Self {
        Self {
            ctx,
            secret_type,
            secret_urn,
            secret_id: String::new(),
            vault_url: String::new(),
            endpoint: VaultEndpoint::default(),
            role_arn: String::new(),
            session_name: DEFAULT_SESSION_NAME.to_string(),
            credentials: None,
        }
    }

    /// Service-account credentials the bridge itself runs with.
    fn caller_credentials() -> Result<AwsCredentials> {
        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID").unwrap_or_default();
        let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_default();
        if access_key_id.is_empty() || secret_access_key.is_empty() {
            return Err(BridgeError::new(codes::AWS_STS_CREDENTIALS)
                .with_detail("service account AWS credentials are not configured"));
        }
        Ok(AwsCredentials {
            access_key_id,
            secret_access_key: SecretString::new(secret_access_key),
            session_token: std::env::var("AWS_SESSION_TOKEN").ok().filter(|t| !t.is_empty()),
        })
    }

    fn sts_endpoint(&self) -> String {
        match &self.ctx.config.aws_sts_endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://sts.{}.amazonaws.com", self.endpoint.region),
        }
    }
}

/// Pulls the temporary credential set out of an `AssumeRole` JSON response.
fn extract_assumed_credentials(body: &str) -> Option<AwsCredentials> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    let credentials = &parsed["AssumeRoleResponse"]["AssumeRoleResult"]["Credentials"];
    let access_key_id = credentials["AccessKeyId"].as_str()?;
    let secret_access_key = credentials["SecretAccessKey"].as_str()?;
    let session_token = credentials["SessionToken"].as_str()?;
    Some(AwsCredentials {
        access_key_id: access_key_id.to_string(),
        secret_access_key: SecretString::new(secret_access_key.to_string()),
        session_token: Some(session_token.to_string()),
    })
}

#[async_trait]
impl VaultBridge for AwsStsBridge {
    fn kind(&self) -> VaultKind {
        VaultKind::AwsSecretsManagerSts
    }

    fn secret_urn(&self) -> &str {
        &self.secret_urn
    }

    fn parse_reference(&mut self, encoded: &str) -> Result<()> {
        self.secret_id = aws::parse_reference_metadata(encoded)?;
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
        let auth = auth_header::parse_vault_auth(encoded, 2).map_err(|err| {
            match err {
                auth_header::AuthHeaderError::Undecodable(detail) => {
                    BridgeError::new(codes::AWS_INTERNAL).with_detail(detail)
                }
                _ => BridgeError::new(codes::AWS_AUTH_HEADER_MALFORMED)
                    .with_target(ErrorTarget::header(fields::VAULT_AUTH_HEADER)),
            }
        })?;

        let role_arn = auth_header::field(&auth, keys::ROLE_ARN);
        let vault_url = auth_header::field(&auth, keys::VAULT_URL);
        if role_arn.is_empty() || vault_url.is_empty() {
            return Err(BridgeError::new(codes::AWS_AUTH_FIELDS_EMPTY)
                .with_target(ErrorTarget::header(fields::VAULT_AUTH_HEADER)));
        }

        let session_name = auth_header::field(&auth, keys::SESSION_NAME);
        if !session_name.is_empty() {
            self.session_name = session_name.to_string();
        }

        self.endpoint = aws::parse_vault_url(vault_url)?;
        self.vault_url = vault_url.to_string();
        self.role_arn = role_arn.to_string();
        Ok(())
    }

    /// Assumes the caller's role. Temporary credentials are request-scoped
    /// and never cached: they are bound to the role session.
    async fn acquire_token(&mut self) -> Result<()> {
        let caller = Self::caller_credentials()?;

        let form: String = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("Action", "AssumeRole")
            .append_pair("Version", STS_API_VERSION)
            .append_pair("RoleArn", &self.role_arn)
            .append_pair("RoleSessionName", &self.session_name)
            .finish();

        let endpoint = self.sts_endpoint();
        let host = url::Url::parse(&endpoint)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .ok_or_else(|| {
                BridgeError::new(codes::AWS_INTERNAL)
                    .with_detail(format!("invalid sts endpoint {endpoint}"))
            })?;

        let params = SigningParams {
            access_key_id: &caller.access_key_id,
            secret_access_key: caller.secret_access_key.expose_secret(),
            region: &self.endpoint.region,
            service: "sts",
            host: &host,
        };
        let signed = sign_post(&params, &form, None, Utc::now())
            .map_err(|e| BridgeError::new(codes::AWS_INTERNAL).with_detail(e.to_string()))?;

        let mut headers = vec![
            ("x-amz-date", signed.amz_date.as_str()),
            ("x-amz-content-sha256", signed.payload_hash.as_str()),
            ("Authorization", signed.authorization.as_str()),
            ("Content-Type", "application/x-www-form-urlencoded"),
            ("Accept", "application/json"),
        ];
        if let Some(token) = &caller.session_token {
            headers.push(("X-Amz-Security-Token", token.as_str()));
        }

        debug!(role_arn = %self.role_arn, "assuming role for secret fetch");
        let response = self
            .ctx
            .transport
            .post(&endpoint, &headers, RequestBody::Raw(form))
            .await
            .map_err(|e| BridgeError::new(codes::AWS_INTERNAL).with_detail(e.to_string()))?;

        if !response.is_success() {
            return Err(BridgeError::new(codes::AWS_STS_CREDENTIALS).with_detail(format!(
                "{} and status code {} returned from {}",
                response.body, response.status, endpoint
            )));
        }

        self.credentials = Some(extract_assumed_credentials(&response.body).ok_or_else(|| {
            BridgeError::new(codes::AWS_INTERNAL)
                .with_detail("AssumeRole response is missing temporary credentials")
        })?);
        Ok(())
    }

    async fn fetch_secret(&self) -> Result<String> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| BridgeError::new(codes::AWS_INTERNAL).with_detail("role not assumed"))?;
        aws::fetch_secret_value(
            &self.ctx,
            &self.vault_url,
            &self.endpoint,
            credentials,
            &self.secret_id,
        )
        .await
    }

    fn normalize(&self, raw: &str, is_bulk: bool) -> Result<Value> {
        let urn = is_bulk.then_some(self.secret_urn.as_str());
        aws::normalize_secret_value(self.secret_type, raw, urn)
    }
}
