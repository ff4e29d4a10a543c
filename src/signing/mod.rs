//! AWS Signature Version 4 request signing.
//!
//! Pure functions, no I/O, no shared state; safe to call from any number of
//! concurrent requests. The AWS bridges feed the output straight into the
//! retrying transport as request headers.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const TERMINATOR: &str = "aws4_request";

/// Signing failed at the HMAC layer. Fatal to the calling request.
#[derive(Debug, thiserror::Error)]
#[error("request signing failed: {0}")]
pub struct SigningError(String);

/// HMAC-SHA256 of `msg` under `key`.
pub fn hmac_sha256(key: &[u8], msg: &[u8]) -> Result<Vec<u8>, SigningError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| SigningError(e.to_string()))?;
    mac.update(msg);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Lowercase hex SHA-256 digest.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Derives the SigV4 signing key via the four-step HMAC chain, each step
/// re-keying with the previous output:
/// `HMAC(HMAC(HMAC(HMAC("AWS4"+secret, date), region), service), "aws4_request")`.
pub fn derive_signing_key(
    secret_key: &str,
    date_stamp: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, SigningError> {
    let k_date = hmac_sha256(format!("AWS4{}", secret_key).as_bytes(), date_stamp.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, TERMINATOR.as_bytes())
}

/// Identity and scope for one signed call.
#[derive(Debug)]
pub struct SigningParams<'a> {
    pub access_key_id: &'a str,
    pub secret_access_key: &'a str,
    pub region: &'a str,
    pub service: &'a str,
    pub host: &'a str,
}

/// Headers produced by [`sign_post`], ready to attach to the outbound call.
#[derive(Debug)]
pub struct SignedRequest {
    pub amz_date: String,
    pub payload_hash: String,
    pub authorization: String,
}

/// Signs a POST to `/` with the given payload.
///
/// When `amz_target` is set (Secrets Manager's `GetSecretValue`), the
/// `x-amz-target` header joins the signed set; STS query-protocol calls sign
/// without it. The canonical request, string-to-sign, and authorization
/// header follow the SigV4 layout exactly; any drift breaks upstream
/// signature validation.
pub fn sign_post(
    params: &SigningParams<'_>,
    payload: &str,
    amz_target: Option<&str>,
    now: DateTime<Utc>,
) -> Result<SignedRequest, SigningError> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();
    let payload_hash = sha256_hex(payload.as_bytes());

    let (canonical_headers, signed_headers) = match amz_target {
        Some(target) => (
            format!(
                "host:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\nx-amz-target:{}\n",
                params.host, payload_hash, amz_date, target
            ),
            "host;x-amz-content-sha256;x-amz-date;x-amz-target",
        ),
        None => (
            format!(
                "host:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n",
                params.host, payload_hash, amz_date
            ),
            "host;x-amz-content-sha256;x-amz-date",
        ),
    };

    let canonical_request = format!(
        "POST\n/\n\n{}\n{}\n{}",
        canonical_headers, signed_headers, payload_hash
    );

    let credential_scope =
        format!("{}/{}/{}/{}", date_stamp, params.region, params.service, TERMINATOR);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        credential_scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let signing_key =
        derive_signing_key(params.secret_access_key, &date_stamp, params.region, params.service)?;
    let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

    let authorization = format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM, params.access_key_id, credential_scope, signed_headers, signature
    );

    Ok(SignedRequest { amz_date, payload_hash, authorization })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // Reference vector from the AWS SigV4 documentation.
    #[test]
    fn signing_key_matches_aws_reference_vector() {
        let key = derive_signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        )
        .unwrap();
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn signing_key_is_deterministic() {
        let a = derive_signing_key("secret", "20240101", "eu-west-1", "secretsmanager").unwrap();
        let b = derive_signing_key("secret", "20240101", "eu-west-1", "secretsmanager").unwrap();
        assert_eq!(a, b);
        let c = derive_signing_key("secret", "20240102", "eu-west-1", "secretsmanager").unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn sha256_hex_known_digest() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn signed_post_carries_scope_and_signed_headers() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let params = SigningParams {
            access_key_id: "AKIDEXAMPLE",
            secret_access_key: "secret",
            region: "us-east-1",
            service: "secretsmanager",
            host: "secretsmanager.us-east-1.amazonaws.com",
        };
        let signed = sign_post(
            &params,
            r#"{"SecretId":"my-secret"}"#,
            Some("secretsmanager.GetSecretValue"),
            now,
        )
        .unwrap();

        assert_eq!(signed.amz_date, "20240501T120000Z");
        assert!(signed
            .authorization
            .starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240501/us-east-1/secretsmanager/aws4_request"));
        assert!(signed
            .authorization
            .contains("SignedHeaders=host;x-amz-content-sha256;x-amz-date;x-amz-target"));

        // Same inputs sign identically.
        let again = sign_post(
            &params,
            r#"{"SecretId":"my-secret"}"#,
            Some("secretsmanager.GetSecretValue"),
            now,
        )
        .unwrap();
        assert_eq!(signed.authorization, again.authorization);
    }

    #[test]
    fn sts_style_signing_omits_amz_target() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let params = SigningParams {
            access_key_id: "AKIDEXAMPLE",
            secret_access_key: "secret",
            region: "us-east-1",
            service: "sts",
            host: "sts.us-east-1.amazonaws.com",
        };
        let signed = sign_post(&params, "Action=AssumeRole&Version=2011-06-15", None, now).unwrap();
        assert!(signed.authorization.contains("SignedHeaders=host;x-amz-content-sha256;x-amz-date,"));
    }
}
