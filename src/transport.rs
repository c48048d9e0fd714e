//! Retrying HTTP transport with bounded exponential backoff.
//!
//! One logical request is up to `retry_attempts` HTTP attempts, each
//! independently time-boxed. A timeout, a transport-level error, and a
//! non-success status are all failures eligible for retry under the same
//! schedule; after the final attempt the most recent error is returned.

use std::time::Duration;

use reqwest::{RequestBuilder, Response};

use crate::{Error, Result};

const BACKOFF_BASE_MS: u64 = 1_000;
const BACKOFF_CAP_MS: u64 = 5_000;

#[derive(Debug, Clone)]
pub(crate) struct ResilientTransport {
    retry_attempts: u32,
    attempt_timeout: Duration,
}

impl ResilientTransport {
    pub fn new(retry_attempts: u32, attempt_timeout: Duration) -> Self {
        ResilientTransport {
            // A budget of zero attempts would make every call fail without
            // ever reaching the network.
            retry_attempts: retry_attempts.max(1),
            attempt_timeout,
        }
    }

    /// Executes the request, retrying until a success response or an
    /// exhausted attempt budget. Each attempt is cancelled when it exceeds
    /// the per-attempt timeout; the backoff delay runs only between attempts.
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            if attempt > 1 {
                tokio::time::sleep(backoff_delay(attempt)).await;
            }

            let Some(request) = request.try_clone() else {
                return Err(Error::UnreplayableRequest);
            };

            match tokio::time::timeout(self.attempt_timeout, request.send()).await {
                Ok(Ok(response)) if response.status().is_success() => return Ok(response),
                Ok(Ok(response)) => {
                    let status = response.status();
                    log::warn!(target: "edflags", attempt = attempt, status = status.as_u16(); "request returned non-success status");
                    last_error = Some(Error::Status(status));
                }
                Ok(Err(err)) => {
                    log::warn!(target: "edflags", attempt = attempt; "request failed: {err}");
                    last_error = Some(Error::from(err));
                }
                Err(_elapsed) => {
                    log::warn!(target: "edflags", attempt = attempt; "request timed out after {:?}", self.attempt_timeout);
                    last_error = Some(Error::Timeout(self.attempt_timeout));
                }
            }
        }

        Err(last_error.expect("at least one attempt is always made"))
    }
}

/// Delay inserted before attempt `n` (n >= 2): `min(1000 * 2^(n-2), 5000)`
/// milliseconds.
fn backoff_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(2).min(31);
    let millis = BACKOFF_BASE_MS
        .saturating_mul(1u64 << exponent)
        .min(BACKOFF_CAP_MS);
    Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{backoff_delay, ResilientTransport};
    use crate::Error;

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(backoff_delay(2), Duration::from_millis(1_000));
        assert_eq!(backoff_delay(3), Duration::from_millis(2_000));
        assert_eq!(backoff_delay(4), Duration::from_millis(4_000));
        assert_eq!(backoff_delay(5), Duration::from_millis(5_000));
        assert_eq!(backoff_delay(6), Duration::from_millis(5_000));
    }

    #[tokio::test]
    async fn returns_first_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let transport = ResilientTransport::new(3, Duration::from_secs(5));
        let client = reqwest::Client::new();
        let response = transport
            .execute(client.get(format!("{}/ok", server.uri())))
            .await
            .unwrap();

        assert!(response.status().is_success());
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn retries_after_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let transport = ResilientTransport::new(3, Duration::from_secs(5));
        let client = reqwest::Client::new();
        let response = transport
            .execute(client.get(format!("{}/flaky", server.uri())))
            .await
            .unwrap();

        assert!(response.status().is_success());
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn exhausts_budget_and_returns_last_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let transport = ResilientTransport::new(2, Duration::from_secs(5));
        let client = reqwest::Client::new();
        let err = transport
            .execute(client.get(format!("{}/down", server.uri())))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Status(status) if status.as_u16() == 500));
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn attempt_exceeding_budget_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let transport = ResilientTransport::new(1, Duration::from_millis(50));
        let client = reqwest::Client::new();
        let err = transport
            .execute(client.get(format!("{}/slow", server.uri())))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Timeout(_)));
    }
}
