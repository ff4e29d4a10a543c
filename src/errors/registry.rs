//! Per-component error-code registries.
//!
//! Every failure the bridges can surface is a stable string code bound to
//! exactly one HTTP status plus message/reason/action text. Call sites never
//! derive a status from context; they name a code and the registry supplies
//! the rest. Codes are globally unique; the framework owns the 10xxx family,
//! AWS Secrets Manager 20xxx, Azure Key Vault 21xxx, and IBM Cloud Secrets
//! Manager 22xxx.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// One registered failure condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorEntry {
    pub code: &'static str,
    pub http_status: u16,
    pub message: &'static str,
    pub reason: &'static str,
    pub action: &'static str,
}

/// A component's registry, grouped for the error-doc generator.
#[derive(Debug, Clone, Copy)]
pub struct ComponentRegistry {
    pub component_name: &'static str,
    pub component_type: &'static str,
    pub entries: &'static [ErrorEntry],
}

pub const FRAMEWORK_REGISTRY: ComponentRegistry = ComponentRegistry {
    component_name: "",
    component_type: "Vault Bridge SDK Framework",
    entries: &[
        ErrorEntry {
            code: "vaultbridgesdk_e_10001",
            http_status: 401,
            message: "Unable to authenticate using provided JWT, ensure valid JWT is included in the request.",
            reason: "Invalid JWT is passed in Authorization header.",
            action: "Ensure valid JWT is passed as Bearer token in Authorization header.",
        },
        // This one code uses the swapped `vaultsdkbridge` prefix; published
        // documentation and callers match on the exact string.
        ErrorEntry {
            code: "vaultsdkbridge_e_10002",
            http_status: 400,
            message: "Vault type specified in the URI path is not supported, include valid vault type in the URI path.",
            reason: "Vault type specified in the URI path is not supported",
            action: "Include supported vault type in URI path",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_10003",
            http_status: 400,
            message: "Secret type specified in the query parameter `secret_type` is not supported, specify valid secret type is included in the query parameter secret_type.",
            reason: "Secret type specified in the query parameter `secret_type` is not supported.",
            action: "Specify valid secret type is included in the query parameter secret_type.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_10501",
            http_status: 400,
            message: "Vault authentication header is missing, specify vault connection information in the vault authentication header ",
            reason: "Vault-Auth is missing from the HTTP header",
            action: "Specify vault connection information in Vault-Auth header",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_10502",
            http_status: 400,
            message: "Query parameter secret_type is missing from the request, specify valid secret type in query parameter secret_type",
            reason: "Query parameter secret_type is missing from the request",
            action: "Specify valid secret type is included in the query parameter secret_type.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_10503",
            http_status: 400,
            message: "Query parameter secret_reference_metadata is invalid or missing, specify valid secret metadata in query parameter secret_reference_metadata",
            reason: "Query parameter secret_reference_metadata is missing or empty from the request",
            action: "Specify secret metadata in the query parameter secret_reference_metadata",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_10900",
            http_status: 500,
            message: "Encountered internal exception while processing request, check vault bridge log for further details.",
            reason: "Encountered internal exception while processing request",
            action: "Check the vault bridge logs for the further error details.",
        },
    ],
};

pub const AWS_REGISTRY: ComponentRegistry = ComponentRegistry {
    component_name: "AWS Secrets Manager",
    component_type: "Vault Bridge",
    entries: &[
        ErrorEntry {
            code: "vaultbridgesdk_e_20001",
            http_status: 404,
            message: "Received insufficient vault authentication information. Ensure all required attributes are passed in the vault-auth HTTP header.",
            reason: "Expected 3 attributes included in the vault-auth HTTP header however received less than 3.",
            action: "Ensure all required attributes `VAULT_URL`, `AWS_ACCESS_KEY_ID`, and `AWS_SECRET_ACCESS_KEY` are passed in the vault-auth HTTP header.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_20002",
            http_status: 404,
            message: "Received incomplete vault authentication information. Ensure attributes are passed in the vault-auth HTTP header does not have empty value.",
            reason: "Value of the attributes passed in the vault-auth HTTP header have empty values.",
            action: "Ensure vault-auth HTTP header attributes `VAULT_URL`, `AWS_ACCESS_KEY_ID`, and `AWS_SECRET_ACCESS_KEY` do not have empty values.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_20003",
            http_status: 500,
            message: "Unable to resolve AWS credentials for role assumption. Check vault bridge log for more details.",
            reason: "The STS AssumeRole exchange failed or no AWS credentials were available to sign it.",
            action: "Ensure the bridge process has valid AWS credentials and the role ARN is assumable.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_20101",
            http_status: 404,
            message: "Malformed secret metadata passed in the query parameter secret_reference_metadata. Ensure secret metadata is valid JSON.",
            reason: "Secret metadata passed in the query parameter secret_reference_metadata is not valid JSON.",
            action: "Ensure secret metadata passed in the query parameter secret_reference_metadata is valid JSON with key secret_id.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_20102",
            http_status: 404,
            message: "Missing secret_id. Ensure secret metadata JSON includes key `secret_id`.",
            reason: "The secret_id is missing from the secret metadata JSON.",
            action: "Ensure secret metadata JSON includes secret_id key.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_20103",
            http_status: 404,
            message: "The secret type used in Cloud Pak for Data (or other) does not match with vault secret type. Ensure secret type on CloudPak aligns or matches with secret type on the vault.",
            reason: "Secret type on the Cloud Pak for Data (or other) does not align or match with the secret type on the vault.",
            action: "Ensure secret type on the Cloud Pak for Data (or other) is aligned or matched with secret type on the vault.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_20200",
            http_status: 404,
            message: "Bulk secret - The secret reference data is missing. Ensure Base64 encoded secret metadata is included in the secret_reference_metadata query parameter.",
            reason: "The query parameter secret_reference_metadata is not specified.",
            action: "Ensure base64 encoded secret metadata is included in the query parameter secret_reference_metadata.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_20201",
            http_status: 404,
            message: "Bulk secret - secret reference data is malformed and not a valid JSON array. Ensure secret metadata is valid JSON.",
            reason: "Secret metadata is not a valid JSON",
            action: "Ensure secret metadata is a valid JSON array with keys `secret_type`, `secret_id`, and `secret_urn`.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_20500",
            http_status: 500,
            message: "Received exception from the vault. Check vault bridge log for more details.",
            reason: "Received exception from the vault when processing the request.",
            action: "Check the vault bridge logs for more details.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_20900",
            http_status: 500,
            message: "Encountered internal exception while processing the request. Check the vault bridge logs for more details.",
            reason: "Encountered internal exception while processing the request.",
            action: "Check the vault bridge logs for more details.",
        },
    ],
};

pub const AZURE_REGISTRY: ComponentRegistry = ComponentRegistry {
    component_name: "Azure Key Vault",
    component_type: "Vault Bridge",
    entries: &[
        ErrorEntry {
            code: "vaultbridgesdk_e_21001",
            http_status: 404,
            message: "Received insufficient vault authentication information. Ensure all required attributes are passed in the vault-auth HTTP header.",
            reason: "Expected 4 attributes included in the vault authentication however received less than 4.",
            action: "Ensure all required attributes `VAULT_URL`, `TENANT_ID`, `CLIENT_ID`, and `CLIENT_SECRET` are passed in the vault-auth HTTP header.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_21002",
            http_status: 404,
            message: "Received incomplete vault authentication information. Ensure attributes are passed in the vault-auth HTTP header does not have empty value.",
            reason: "Value of the attributes passed in the vault-auth HTTP header has empty values.",
            action: "Ensure vault-auth HTTP header attributes `VAULT_URL`, `TENANT_ID`, `CLIENT_ID`, and `CLIENT_SECRET` do not have empty values.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_21101",
            http_status: 404,
            message: "Malformed secret metadata passed in the query parameter secret_reference_metadata. Ensure secret metadata is valid JSON.",
            reason: "Secret metadata passed in the query parameter secret_reference_metadata is not valid JSON.",
            action: "Ensure secret metadata passed in the query parameter secret_reference_metadata is valid JSON with key secret_name.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_21102",
            http_status: 404,
            message: "Missing `secret_name`. Ensure secret metadata JSON includes key `secret_name`.",
            reason: "The `secret_name` is missing from the secret metadata JSON.",
            action: "Ensure secret metadata JSON includes `secret_name` key.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_21103",
            http_status: 404,
            message: "The secret type used in Cloud Pak for Data (or other) does not match with vault secret type. Ensure secret type on CloudPak aligns or matches with secret type on the vault.",
            reason: "Secret type on the Cloud Pak for Data (or other) does not align or match with the secret type on the vault.",
            action: "Ensure secret type on the Cloud Pak for Data (or other) is aligned or matched with secret type on the vault.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_21200",
            http_status: 404,
            message: "Bulk secret - The secret reference data is missing. Ensure Base64 encoded secret metadata is included in the secret_reference_metadata query parameter.",
            reason: "The query parameter secret_reference_metadata is not specified.",
            action: "Ensure base64 encoded secret metadata is included in the query parameter secret_reference_metadata.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_21201",
            http_status: 404,
            message: "Bulk secret - secret reference data is malformed and not a valid JSON array. Ensure secret metadata is valid JSON.",
            reason: "Secret metadata is not a valid JSON",
            action: "Ensure secret metadata is a valid JSON array with keys `secret_type`, `secret_name`, and `secret_urn`.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_21500",
            http_status: 500,
            message: "Received exception from the vault. Check vault bridge log for more details.",
            reason: "Received exception from the vault when processing the request.",
            action: "Check the vault bridge logs for more details.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_21501",
            http_status: 500,
            message: "Encountered internal exception while requesting authentication token from the IAM, check the vault bridge logs for the further details.",
            reason: "Encountered internal exception while requesting vault token",
            action: "Check the vault bridge logs for more details.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_21900",
            http_status: 500,
            message: "Encountered internal exception while processing the request. Check the vault bridge logs for more details.",
            reason: "Encountered internal exception while processing the request.",
            action: "Check the vault bridge logs for more details.",
        },
    ],
};

pub const IBM_REGISTRY: ComponentRegistry = ComponentRegistry {
    component_name: "IBM Cloud Secrets Manager",
    component_type: "Vault Bridge",
    entries: &[
        ErrorEntry {
            code: "vaultbridgesdk_e_22001",
            http_status: 404,
            message: "Received insufficient vault authentication information. Ensure all required attributes are passed in the vault-auth HTTP header.",
            reason: "Expected 2 attributes included in the vault authentication however received less than 2.",
            action: "Ensure all required attributes `VAULT_URL` and `API_KEY` are passed in the vault-auth HTTP header.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_22002",
            http_status: 404,
            message: "Received incomplete vault authentication information. Ensure attributes are passed in the vault-auth HTTP header does not have empty value.",
            reason: "Value of the attributes passed in the vault-auth HTTP header has empty values.",
            action: "Ensure vault-auth HTTP header attributes `VAULT_URL` and `API_KEY` do not have empty values.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_22101",
            http_status: 404,
            message: "Malformed secret metadata passed in the query parameter secret_reference_metadata. Ensure secret metadata is valid JSON.",
            reason: "Secret metadata passed in the query parameter secret_reference_metadata is not valid JSON.",
            action: "Ensure secret metadata passed in the query parameter secret_reference_metadata is valid JSON with key secret_id.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_22102",
            http_status: 404,
            message: "Missing `secret_id`. Ensure secret metadata JSON includes key `secret_id`.",
            reason: "The `secret_id` is missing from the secret metadata JSON.",
            action: "Ensure secret metadata JSON includes `secret_id` key.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_22103",
            http_status: 404,
            message: "The Cloud Pak for Data (or other) secret type is mismatched with vault secret type. Ensure secret type on CloudPak aligns or matches with secret type on the vault.",
            reason: "Secret type on the Cloud Pak for Data (or other) does not align or match with the secret type on the vault.",
            action: "Ensure secret type on the Cloud Pak for Data (or other) is aligned or matched with secret type on the vault.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_22200",
            http_status: 404,
            message: "Bulk secret - The secret reference data is missing. Ensure Base64 encoded secret metadata is included in the secret_reference_metadata query parameter.",
            reason: "The query parameter secret_reference_metadata is not specified.",
            action: "Ensure base64 encoded secret metadata is included in the query parameter secret_reference_metadata.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_22201",
            http_status: 404,
            message: "Bulk secret - secret reference data is malformed and not a valid JSON array. Ensure secret metadata is valid JSON.",
            reason: "Secret metadata is not a valid JSON",
            action: "Ensure secret metadata is a valid JSON array with keys `secret_type`, `secret_id`, and `secret_urn`.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_22500",
            http_status: 500,
            message: "Received exception from the vault. Check vault bridge log for more details.",
            reason: "Received exception from the vault when processing the request.",
            action: "Check the vault bridge logs for more details.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_22501",
            http_status: 500,
            message: "Encountered internal exception while requesting authentication token from the IAM, check the vault bridge logs for the further details.",
            reason: "Encountered internal exception while requesting vault token",
            action: "Check the vault bridge logs for more details.",
        },
        ErrorEntry {
            code: "vaultbridgesdk_e_22900",
            http_status: 500,
            message: "Encountered internal exception while processing the request. Check the vault bridge logs for more details.",
            reason: "Encountered internal exception while processing the request.",
            action: "Check the vault bridge logs for more details.",
        },
    ],
};

pub const ALL_REGISTRIES: [&ComponentRegistry; 4] =
    [&FRAMEWORK_REGISTRY, &AWS_REGISTRY, &AZURE_REGISTRY, &IBM_REGISTRY];

static CODE_INDEX: Lazy<HashMap<&'static str, &'static ErrorEntry>> = Lazy::new(|| {
    let mut index = HashMap::new();
    for registry in ALL_REGISTRIES {
        for entry in registry.entries {
            let previous = index.insert(entry.code, entry);
            debug_assert!(previous.is_none(), "duplicate error code {}", entry.code);
        }
    }
    index
});

/// Resolves a code against the merged registries.
pub fn lookup(code: &str) -> Option<&'static ErrorEntry> {
    CODE_INDEX.get(code).copied()
}

/// The framework's catch-all internal entry, used when an unregistered code
/// slips through. Lookups at call sites always name registered codes, so
/// hitting this path is itself a bug worth logging.
pub fn internal_fallback() -> &'static ErrorEntry {
    lookup(super::codes::FRAMEWORK_INTERNAL).unwrap_or(&FRAMEWORK_REGISTRY.entries[6])
}
