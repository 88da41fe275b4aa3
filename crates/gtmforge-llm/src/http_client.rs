//! Shared HTTP plumbing for the HTTP backends.
//!
//! Applies a per-request timeout and retries exactly once on 429 and 5xx
//! responses. Error classification happens here so every backend maps HTTP
//! outcomes to `ProviderError` the same way.

use gtmforge_utils::error::{ConfigError, ProviderError};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

/// Delay before the single retry of a transient failure.
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// How much of an error body to keep in the error message.
const MAX_ERROR_BODY_LEN: usize = 500;

pub(crate) struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns `ConfigError` if the underlying client cannot be constructed
    /// (TLS backend initialization).
    pub fn new() -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "http_client".to_string(),
                value: e.to_string(),
            })?;
        Ok(Self { client })
    }

    pub(crate) fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Execute a request, retrying once on 429/5xx.
    ///
    /// # Errors
    ///
    /// - `ProviderError::Transport` for network failures and timeouts
    /// - `ProviderError::Auth` for 401/403
    /// - `ProviderError::Backend` for any other non-success status
    pub async fn execute_with_retry(
        &self,
        request: reqwest::RequestBuilder,
        timeout: Duration,
        provider: &str,
    ) -> Result<reqwest::Response, ProviderError> {
        let retry = request.try_clone();

        match self.send_once(request, timeout, provider).await {
            Ok(response) => Ok(response),
            Err(e) if is_transient(&e) => {
                let Some(retry) = retry else {
                    return Err(e);
                };
                warn!(provider, error = %e, "Transient backend failure, retrying once");
                tokio::time::sleep(RETRY_DELAY).await;
                self.send_once(retry, timeout, provider).await
            }
            Err(e) => Err(e),
        }
    }

    async fn send_once(
        &self,
        request: reqwest::RequestBuilder,
        timeout: Duration,
        provider: &str,
    ) -> Result<reqwest::Response, ProviderError> {
        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("{provider}: {e}")))?;

        let status = response.status();
        if status.is_success() {
            debug!(provider, status = status.as_u16(), "Backend request succeeded");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = truncate(&body, MAX_ERROR_BODY_LEN);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ProviderError::Auth(format!(
                "{provider} returned {status}: {message}"
            ))),
            _ => Err(ProviderError::Backend {
                status: status.as_u16(),
                message,
            }),
        }
    }
}

fn is_transient(error: &ProviderError) -> bool {
    match error {
        ProviderError::Backend { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn success_passes_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let http = HttpClient::new().unwrap();
        let request = http.inner().post(format!("{}/v1/generate", server.uri()));
        let response = http
            .execute_with_retry(request, Duration::from_secs(5), "test")
            .await
            .unwrap();
        assert_eq!(response.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn retries_once_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/generate"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
            .mount(&server)
            .await;

        let http = HttpClient::new().unwrap();
        let request = http.inner().post(format!("{}/v1/generate", server.uri()));
        let response = http
            .execute_with_retry(request, Duration::from_secs(5), "test")
            .await
            .unwrap();
        assert_eq!(response.text().await.unwrap(), "recovered");
    }

    #[tokio::test]
    async fn auth_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/generate"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .expect(1)
            .mount(&server)
            .await;

        let http = HttpClient::new().unwrap();
        let request = http.inner().post(format!("{}/v1/generate", server.uri()));
        let result = http
            .execute_with_retry(request, Duration::from_secs(5), "test")
            .await;
        assert!(matches!(result, Err(ProviderError::Auth(_))));
    }

    #[tokio::test]
    async fn persistent_server_error_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/generate"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(2)
            .mount(&server)
            .await;

        let http = HttpClient::new().unwrap();
        let request = http.inner().post(format!("{}/v1/generate", server.uri()));
        let result = http
            .execute_with_retry(request, Duration::from_secs(5), "test")
            .await;
        match result {
            Err(ProviderError::Backend { status, message }) => {
                assert_eq!(status, 503);
                assert!(message.contains("overloaded"));
            }
            other => panic!("expected Backend error, got {other:?}"),
        }
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "héllo wörld";
        let out = truncate(s, 3);
        assert!(out.ends_with("..."));
    }
}
