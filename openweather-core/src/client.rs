use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, instrument, warn};

use crate::{error::WeatherError, model::WeatherModel};

/// Default transport timeout for a single request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Performs one GET against a fully built URL and decodes the body.
/// Implementations never retry; that is the caller's decision.
#[async_trait]
pub trait WeatherFetcher: Send + Sync + fmt::Debug {
    async fn fetch(&self, url: &Url) -> Result<WeatherModel, WeatherError>;
}

#[derive(Debug, Clone)]
pub struct HttpWeatherClient {
    http: Client,
}

impl HttpWeatherClient {
    pub fn new() -> Result<Self, WeatherError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| network_failure("failed to build HTTP client", e))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl WeatherFetcher for HttpWeatherClient {
    #[instrument(skip_all, fields(host = url.host_str(), path = url.path()))]
    async fn fetch(&self, url: &Url) -> Result<WeatherModel, WeatherError> {
        let res = match self.http.get(url.clone()).send().await {
            Ok(res) => res,
            Err(e) => {
                warn!(error = %e, "transport error");
                return Err(network_failure("failed to send request to OpenWeather", e));
            }
        };

        let status = res.status();
        let body = match res.bytes().await {
            Ok(body) => body,
            Err(e) => return Err(network_failure("failed to read OpenWeather response", e)),
        };

        if !status.is_success() {
            warn!(%status, "non-success status");
            return Err(WeatherError::NetworkFailure(format!(
                "OpenWeather request failed with status {status}: {}",
                truncate_body(&String::from_utf8_lossy(&body)),
            )));
        }

        debug!(%status, bytes = body.len(), "response received");

        WeatherModel::from_slice(&body)
    }
}

fn network_failure(context: &str, err: impl fmt::Display) -> WeatherError {
    WeatherError::NetworkFailure(format!("{context}: {err}"))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn short_bodies_are_kept() {
        assert_eq!(truncate_body("nope"), "nope");
    }

    #[test]
    fn long_bodies_are_truncated_on_char_boundary() {
        let body = "é".repeat(150);
        let out = truncate_body(&body);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 203);
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_failure() {
        let timeout = Duration::from_millis(500);
        let client = HttpWeatherClient::with_timeout(timeout).unwrap();
        let url = Url::parse("http://127.0.0.1:1/weather?q=Nowhere").unwrap();

        let err = client.fetch(&url).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkFailure);
    }
}
