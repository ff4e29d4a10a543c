//! Error handling for the vault bridge core.
//!
//! Failures inside the pipeline are [`BridgeError`] values carrying a stable
//! registry code. The code is resolved against the per-component registries
//! in [`registry`] only when the error crosses the wire boundary, where it
//! becomes an [`ErrorDocument`]. Server-side detail (upstream bodies, parse
//! errors) stays in the `detail` field and is logged, never serialized.

pub mod registry;

use serde::Serialize;
use tracing::error;

/// Custom result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Named constants for every code referenced at a call site.
///
/// Grouped by owning component; the registry in [`registry`] binds each code
/// to its HTTP status and remediation text.
pub mod codes {
    // Framework (10xxx)
    pub const AUTH_INVALID_JWT: &str = "vaultbridgesdk_e_10001";
    pub const UNSUPPORTED_VAULT_KIND: &str = "vaultsdkbridge_e_10002";
    pub const UNSUPPORTED_SECRET_TYPE: &str = "vaultbridgesdk_e_10003";
    pub const MISSING_VAULT_AUTH: &str = "vaultbridgesdk_e_10501";
    pub const MISSING_SECRET_TYPE: &str = "vaultbridgesdk_e_10502";
    pub const MISSING_REFERENCE_METADATA: &str = "vaultbridgesdk_e_10503";
    pub const FRAMEWORK_INTERNAL: &str = "vaultbridgesdk_e_10900";

    // AWS Secrets Manager (20xxx), shared by the direct and STS bridges
    pub const AWS_AUTH_HEADER_MALFORMED: &str = "vaultbridgesdk_e_20001";
    pub const AWS_AUTH_FIELDS_EMPTY: &str = "vaultbridgesdk_e_20002";
    pub const AWS_STS_CREDENTIALS: &str = "vaultbridgesdk_e_20003";
    pub const AWS_MISSING_SECRET_ID: &str = "vaultbridgesdk_e_20102";
    pub const AWS_SECRET_TYPE_MISMATCH: &str = "vaultbridgesdk_e_20103";
    pub const AWS_BULK_FIELDS_MISSING: &str = "vaultbridgesdk_e_20200";
    pub const AWS_UPSTREAM_FETCH: &str = "vaultbridgesdk_e_20500";
    pub const AWS_INTERNAL: &str = "vaultbridgesdk_e_20900";

    // Azure Key Vault (21xxx)
    pub const AZURE_AUTH_HEADER_MALFORMED: &str = "vaultbridgesdk_e_21001";
    pub const AZURE_AUTH_FIELDS_EMPTY: &str = "vaultbridgesdk_e_21002";
    pub const AZURE_MISSING_SECRET_NAME: &str = "vaultbridgesdk_e_21102";
    pub const AZURE_SECRET_TYPE_MISMATCH: &str = "vaultbridgesdk_e_21103";
    pub const AZURE_BULK_FIELDS_MISSING: &str = "vaultbridgesdk_e_21200";
    pub const AZURE_UPSTREAM_AUTH: &str = "vaultbridgesdk_e_21500";
    pub const AZURE_UPSTREAM_FETCH: &str = "vaultbridgesdk_e_21501";
    pub const AZURE_INTERNAL: &str = "vaultbridgesdk_e_21900";

    // IBM Cloud Secrets Manager (22xxx)
    pub const IBM_AUTH_HEADER_MALFORMED: &str = "vaultbridgesdk_e_22001";
    pub const IBM_AUTH_FIELDS_EMPTY: &str = "vaultbridgesdk_e_22002";
    pub const IBM_MISSING_SECRET_ID: &str = "vaultbridgesdk_e_22102";
    pub const IBM_SECRET_TYPE_MISMATCH: &str = "vaultbridgesdk_e_22103";
    pub const IBM_BULK_FIELDS_MISSING: &str = "vaultbridgesdk_e_22200";
    pub const IBM_UPSTREAM: &str = "vaultbridgesdk_e_22501";
    pub const IBM_INTERNAL: &str = "vaultbridgesdk_e_22900";
}

/// Which request element a caller-input error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorTarget {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl ErrorTarget {
    pub const fn query_param(name: &'static str) -> Self {
        Self { name, kind: "query-param" }
    }

    pub const fn header(name: &'static str) -> Self {
        Self { name, kind: "header" }
    }

    pub const fn path_param(name: &'static str) -> Self {
        Self { name, kind: "parameter" }
    }
}

/// A structured pipeline failure.
#[derive(Debug, Clone, thiserror::Error)]
#[error("vault bridge error {code}")]
pub struct BridgeError {
    code: &'static str,
    target: Option<ErrorTarget>,
    detail: Option<String>,
}

impl BridgeError {
    pub fn new(code: &'static str) -> Self {
        Self { code, target: None, detail: None }
    }

    pub fn with_target(mut self, target: ErrorTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// Attaches server-side detail. Surfaced in logs only.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn target(&self) -> Option<ErrorTarget> {
        self.target
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn http_status(&self) -> u16 {
        registry::lookup(self.code).unwrap_or_else(registry::internal_fallback).http_status
    }
}

/// Wire-ready error payload.
///
/// `more_info` is a deep link into the published error documentation and
/// `trace` carries the caller's transaction id. Bulk workers additionally tag
/// their document with the originating `secret_urn`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDocument {
    pub errors: Vec<WireError>,
    pub status_code: u16,
    pub trace: String,
    #[serde(rename = "secret_urn", skip_serializing_if = "Option::is_none")]
    pub secret_urn: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WireError {
    pub code: &'static str,
    pub message: &'static str,
    pub more_info: String,
    pub target: Option<ErrorTarget>,
}

impl ErrorDocument {
    /// Converts an error into the wire payload, logging the detail that does
    /// not cross the boundary.
    pub fn from_error(err: &BridgeError, transaction_id: &str, doc_base_url: &str) -> Self {
        let entry = registry::lookup(err.code()).unwrap_or_else(|| {
            error!(code = err.code(), "error code missing from registry");
            registry::internal_fallback()
        });
        if let Some(detail) = err.detail() {
            error!(
                transaction_id,
                code = entry.code,
                detail,
                "request failed"
            );
        }
        Self {
            errors: vec![WireError {
                code: entry.code,
                message: entry.message,
                more_info: format!("{}#{}", doc_base_url, entry.code),
                target: err.target(),
            }],
            status_code: entry.http_status,
            trace: transaction_id.to_string(),
            secret_urn: None,
        }
    }

    pub fn with_secret_urn(mut self, urn: impl Into<String>) -> Self {
        self.secret_urn = Some(urn.into());
        self
    }
}
