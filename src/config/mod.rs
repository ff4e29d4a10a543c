//! Environment-driven settings consumed by the bridge core.
//!
//! The process owner decides how configuration is provisioned; this module
//! only reads the environment once at startup and hands the result around as
//! shared read-only state.

use std::time::Duration;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_RETRY_COUNT: u32 = 5;
pub const RETRY_BACKOFF_FACTOR: f64 = 0.5;

pub const DEFAULT_AZURE_IAM_URL: &str = "https://login.microsoftonline.com";
pub const DEFAULT_IBM_CLOUD_IAM_URL: &str = "https://iam.cloud.ibm.com/identity/token";

pub const DEFAULT_GIT_REPO_URL: &str = "https://github.com/IBM/zen-secrets-vaults";
pub const DEFAULT_ERROR_DOC_PATH: &str = "/blob/main/docs/apidoc/error_codes.md";

/// Runtime configuration for the bridge core.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Per-HTTP-call timeout, independent of the retry budget.
    pub request_timeout: Duration,
    /// Maximum attempts per upstream call (first try included).
    pub retry_count: u32,
    /// Base of the exponential backoff, in seconds.
    pub retry_backoff_factor: f64,
    /// Disables upstream TLS verification. Development only.
    pub skip_tls_verify: bool,
    /// Azure AD endpoint base; the tenant path is appended per request.
    pub azure_iam_url: String,
    /// IBM Cloud IAM token endpoint.
    pub ibm_iam_url: String,
    /// Optional STS endpoint override; defaults to the regional endpoint
    /// derived from the vault URL.
    pub aws_sts_endpoint: Option<String>,
    /// Base URL of the published error-code documentation (`more_info` links).
    pub error_doc_base: String,
    /// PEM file holding the public key for caller-JWT verification.
    pub jwt_public_key_path: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            retry_count: DEFAULT_RETRY_COUNT,
            retry_backoff_factor: RETRY_BACKOFF_FACTOR,
            skip_tls_verify: false,
            azure_iam_url: DEFAULT_AZURE_IAM_URL.to_string(),
            ibm_iam_url: DEFAULT_IBM_CLOUD_IAM_URL.to_string(),
            aws_sts_endpoint: None,
            error_doc_base: format!("{}{}", DEFAULT_GIT_REPO_URL, DEFAULT_ERROR_DOC_PATH),
            jwt_public_key_path: None,
        }
    }
}

impl BridgeConfig {
    /// Load configuration from environment variables.
    ///
    /// Uses:
    /// - `VAULT_REQUEST_TIMEOUT` (seconds, default 20)
    /// - `VAULT_REQUEST_RETRY_COUNT` (default 5)
    /// - `SKIP_TLS_VERIFY` (default "false")
    /// - `AZURE_IAM_URL`, `IBM_CLOUD_IAM_URL`, `AWS_STS_ENDPOINT`
    /// - `GIT_REPO_URL` + `ERROR_DOC_PATH` (error documentation link base)
    /// - `JWT_PUBLIC_KEY_PATH`
    ///
    /// Unparsable numeric values fall back to the defaults, matching the
    /// permissive behavior callers already rely on.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let request_timeout = std::env::var("VAULT_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let retry_count = std::env::var("VAULT_REQUEST_RETRY_COUNT")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults.retry_count);

        let skip_tls_verify = std::env::var("SKIP_TLS_VERIFY")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let azure_iam_url =
            std::env::var("AZURE_IAM_URL").unwrap_or_else(|_| defaults.azure_iam_url.clone());
        let ibm_iam_url =
            std::env::var("IBM_CLOUD_IAM_URL").unwrap_or_else(|_| defaults.ibm_iam_url.clone());
        let aws_sts_endpoint = std::env::var("AWS_STS_ENDPOINT").ok();

        let git_repo_url =
            std::env::var("GIT_REPO_URL").unwrap_or_else(|_| DEFAULT_GIT_REPO_URL.to_string());
        let error_doc_path =
            std::env::var("ERROR_DOC_PATH").unwrap_or_else(|_| DEFAULT_ERROR_DOC_PATH.to_string());

        let jwt_public_key_path = std::env::var("JWT_PUBLIC_KEY_PATH").ok();

        Self {
            request_timeout,
            retry_count,
            retry_backoff_factor: RETRY_BACKOFF_FACTOR,
            skip_tls_verify,
            azure_iam_url,
            ibm_iam_url,
            aws_sts_endpoint,
            error_doc_base: format!("{}{}", git_repo_url, error_doc_path),
            jwt_public_key_path,
        }
    }
}
