//! End-to-end IBM Cloud Secrets Manager flows against wiremock upstreams.

mod common;

use chrono::Utc;
use common::{single_request, test_config};
use serde_json::json;
use vault_bridge::SecretGateway;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VAULT_KIND: &str = "ibm-cloud-secrets-manager";

fn ibm_auth(vault_url: &str) -> String {
    format!("vault_url={vault_url};API_KEY=test-api-key")
}

fn iam_url(server: &MockServer) -> String {
    format!("{}/identity/token", server.uri())
}

async fn mount_iam_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .and(body_string_contains("apikey=test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ibm-token",
            "expiration": Utc::now().timestamp() + 3600
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn arbitrary_secret_serves_key_at_top_level() {
    let server = MockServer::start().await;
    mount_iam_endpoint(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/secrets/sm-id-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "secret_type": "arbitrary",
            "payload": "key-material"
        })))
        .mount(&server)
        .await;

    let gateway = SecretGateway::new(test_config(&server.uri(), &iam_url(&server))).unwrap();
    let request = single_request(
        VAULT_KIND,
        "key",
        &json!({"secret_id": "sm-id-1"}),
        &ibm_auth(&server.uri()),
    );

    let document = gateway.get_secret(&request).await.unwrap();
    assert_eq!(document, json!({"key": "key-material"}));
}

#[tokio::test]
async fn username_password_secret_serves_credentials() {
    let server = MockServer::start().await;
    mount_iam_endpoint(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/secrets/sm-id-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "secret_type": "username_password",
            "username": "svc",
            "password": "pw"
        })))
        .mount(&server)
        .await;

    let gateway = SecretGateway::new(test_config(&server.uri(), &iam_url(&server))).unwrap();
    let request = single_request(
        VAULT_KIND,
        "credentials",
        &json!({"secret_id": "sm-id-2"}),
        &ibm_auth(&server.uri()),
    );

    let document = gateway.get_secret(&request).await.unwrap();
    assert_eq!(
        document,
        json!({"secret": {"credentials": {"username": "svc", "password": "pw"}}})
    );
}

#[tokio::test]
async fn mismatched_native_type_is_an_internal_error() {
    let server = MockServer::start().await;
    mount_iam_endpoint(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/secrets/sm-id-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "secret_type": "arbitrary",
            "payload": "x"
        })))
        .mount(&server)
        .await;

    let gateway = SecretGateway::new(test_config(&server.uri(), &iam_url(&server))).unwrap();
    // The stored secret is arbitrary, the caller asked for credentials.
    let request = single_request(
        VAULT_KIND,
        "credentials",
        &json!({"secret_id": "sm-id-3"}),
        &ibm_auth(&server.uri()),
    );

    let document = gateway.get_secret(&request).await.unwrap_err();
    assert_eq!(document.errors[0].code, "vaultbridgesdk_e_22900");
    assert_eq!(document.status_code, 500);
}

#[tokio::test]
async fn reference_metadata_without_secret_id_is_rejected() {
    let server = MockServer::start().await;

    let gateway = SecretGateway::new(test_config(&server.uri(), &iam_url(&server))).unwrap();
    let request = single_request(
        VAULT_KIND,
        "generic",
        &json!({"name": "wrong-field"}),
        &ibm_auth(&server.uri()),
    );

    let document = gateway.get_secret(&request).await.unwrap_err();
    assert_eq!(document.errors[0].code, "vaultbridgesdk_e_22102");
    assert_eq!(document.status_code, 404);
    let target = document.errors[0].target.unwrap();
    assert_eq!(target.name, "secret_reference_metadata");
    assert_eq!(target.kind, "query-param");
}

#[tokio::test]
async fn iam_failure_maps_to_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errorCode": "BXNIM0415E"
        })))
        .mount(&server)
        .await;

    let gateway = SecretGateway::new(test_config(&server.uri(), &iam_url(&server))).unwrap();
    let request = single_request(
        VAULT_KIND,
        "generic",
        &json!({"secret_id": "sm-id-4"}),
        &ibm_auth(&server.uri()),
    );

    let document = gateway.get_secret(&request).await.unwrap_err();
    assert_eq!(document.errors[0].code, "vaultbridgesdk_e_22501");
}
