//! Shared HTTP transport: one process-wide `reqwest::Client`
//! with connection reuse and a 2s default timeout, handed to every
//! subsystem at construction.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::error::TransportError;

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct SharedHttpClient {
    client: reqwest::Client,
}

impl SharedHttpClient {
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client configuration is static and always valid");
        Self { client }
    }

    /// Exposes the underlying client for call sites that need a
    /// per-request timeout override.
    #[must_use]
    pub fn raw(&self) -> &reqwest::Client {
        &self.client
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, TransportError> {
        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T, TransportError> {
        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, TransportError> {
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

impl Default for SharedHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Retries a fallible async alert-send exactly once after `backoff`.
pub async fn send_with_one_retry<F, Fut, T>(backoff: Duration, mut attempt: F) -> Result<T, TransportError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, TransportError>>,
{
    match attempt().await {
        Ok(value) => Ok(value),
        Err(_first_error) => {
            tokio::time::sleep(backoff).await;
            attempt().await
        }
    }
}
