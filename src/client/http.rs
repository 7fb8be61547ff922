//! HTTP chat transport

use super::error::{self, ClientError};
use super::types::{AnalysisResult, ChatRequest};
use super::ChatTransport;
use crate::config::ClientConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Chat transport backed by `POST {base}/api/chat`
#[derive(Clone)]
pub struct HttpChatTransport {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpChatTransport {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_config(client: Client, config: &ClientConfig) -> Self {
        Self::new(client, config.backend_base(), config.chat_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probe `GET {base}/health`
    ///
    /// # Errors
    ///
    /// Network failures, a non-success status, or a status other than `ok`.
    pub async fn health(&self) -> Result<(), ClientError> {
        #[derive(Deserialize)]
        struct Health {
            status: String,
        }

        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| error::from_reqwest(&e, &self.base_url))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ClientError::server(status.as_u16(), &body));
        }

        let health: Health = serde_json::from_str(&body).map_err(ClientError::parse)?;
        if health.status == "ok" {
            Ok(())
        } else {
            Err(ClientError::server(status.as_u16(), &health.status))
        }
    }

    async fn post_chat(&self, request: &ChatRequest) -> Result<AnalysisResult, ClientError> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| error::from_reqwest(&e, &self.base_url))?;

        let status = response.status();
        if !status.is_success() {
            // An unreadable error body is reported like an empty one
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::server(status.as_u16(), &body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| error::from_reqwest(&e, &self.base_url))?;

        serde_json::from_str(&body).map_err(ClientError::parse)
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn send(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
    ) -> Result<AnalysisResult, ClientError> {
        tracing::debug!(
            base = %self.base_url,
            history_len = request.history.len(),
            timeout_ms = %self.timeout.as_millis(),
            "Sending chat request"
        );

        // Dropping the request future aborts the in-flight HTTP call
        tokio::select! {
            biased;

            () = cancel.cancelled() => Err(ClientError::cancelled()),

            result = tokio::time::timeout(self.timeout, self.post_chat(request)) => {
                result.unwrap_or_else(|_| Err(ClientError::timeout(&self.base_url)))
            }
        }
    }
}
