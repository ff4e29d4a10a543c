//! Retrying HTTP transport for upstream vault and IAM calls.
//!
//! Wraps a shared `reqwest::Client` with bounded exponential-backoff retry on
//! transient statuses. Non-transient error statuses (400/401/404/...) are
//! returned immediately for the caller to translate into a domain error; the
//! transport never maps statuses itself.

use crate::config::BridgeConfig;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Statuses worth retrying; everything else is final.
pub const RETRY_STATUS_CODES: [u16; 4] = [500, 502, 503, 504];

/// Transport-level failure. Bridges map this onto their own internal codes.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid request header {0}")]
    Header(String),
}

/// Response surface the bridges need: final status plus the body text.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Body of an outbound POST.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// URL-encoded form fields (OAuth2 / IAM token exchanges).
    Form(Vec<(String, String)>),
    /// Pre-serialized payload; the caller sets its own `Content-Type`.
    Raw(String),
}

/// HTTP client with bounded exponential-backoff retry.
pub struct RetryingTransport {
    client: reqwest::Client,
    retry_count: u32,
    backoff_factor: f64,
}

impl RetryingTransport {
    pub fn new(config: &BridgeConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.skip_tls_verify)
            .build()?;
        Ok(Self {
            client,
            retry_count: config.retry_count.max(1),
            backoff_factor: config.retry_backoff_factor,
        })
    }

    pub async fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        self.execute(Method::GET, url, headers, None).await
    }

    pub async fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: RequestBody,
    ) -> Result<HttpResponse, TransportError> {
        self.execute(Method::POST, url, headers, Some(body)).await
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        headers: &[(&str, &str)],
        body: Option<RequestBody>,
    ) -> Result<HttpResponse, TransportError> {
        let header_map = build_header_map(headers)?;

        let mut attempt: u32 = 1;
        loop {
            let mut request =
                self.client.request(method.clone(), url).headers(header_map.clone());
            request = match &body {
                Some(RequestBody::Form(fields)) => request.form(fields),
                Some(RequestBody::Raw(payload)) => request.body(payload.clone()),
                None => request,
            };

            let response = request.send().await?;
            let status = response.status().as_u16();
            debug!(url, status, attempt, "upstream call completed");

            if RETRY_STATUS_CODES.contains(&status) && attempt < self.retry_count {
                let delay = self.backoff_factor * 2_f64.powi(attempt as i32);
                debug!(url, status, attempt, delay_secs = delay, "retrying transient status");
                tokio::time::sleep(Duration::from_secs_f64(delay)).await;
                attempt += 1;
                continue;
            }

            let body_text = response.text().await?;
            return Ok(HttpResponse { status, body: body_text });
        }
    }
}

fn build_header_map(headers: &[(&str, &str)]) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_str(name)
            .map_err(|_| TransportError::Header(name.to_string()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| TransportError::Header(name.to_string()))?;
        map.insert(name, value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport_with_retries(retry_count: u32) -> RetryingTransport {
        let config = BridgeConfig {
            retry_count,
            // Keep test wall time negligible.
            retry_backoff_factor: 0.001,
            ..BridgeConfig::default()
        };
        RetryingTransport::new(&config).unwrap()
    }

    #[tokio::test]
    async fn transient_status_is_retried_until_success() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_with_retries(5);
        let response =
            transport.get(&format!("{}/flaky", server.uri()), &[]).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "ok");
    }

    #[tokio::test]
    async fn retry_budget_exhaustion_returns_last_response() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .expect(3)
            .mount(&server)
            .await;

        let transport = transport_with_retries(3);
        let response = transport.get(&format!("{}/down", server.uri()), &[]).await.unwrap();
        assert_eq!(response.status, 503);
        assert_eq!(response.body, "unavailable");
    }

    #[tokio::test]
    async fn non_transient_error_is_not_retried() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/denied"))
            .respond_with(ResponseTemplate::new(401).set_body_string("no"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_with_retries(5);
        let response =
            transport.get(&format!("{}/denied", server.uri()), &[]).await.unwrap();
        assert_eq!(response.status, 401);
    }

    #[tokio::test]
    async fn form_posts_are_url_encoded() {
        use wiremock::matchers::{body_string_contains, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_with_retries(1);
        let body = RequestBody::Form(vec![(
            "grant_type".to_string(),
            "client_credentials".to_string(),
        )]);
        let response = transport
            .post(&format!("{}/token", server.uri()), &[("Accept", "application/json")], body)
            .await
            .unwrap();
        assert_eq!(response.status, 200);
    }
}
