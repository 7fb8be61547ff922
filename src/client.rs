//! Backend client
//!
//! The chat transport and the admin gateway are the only places the client
//! talks to the backend.

pub mod admin;
mod error;
mod http;
mod types;

pub use admin::{AdminGateway, HttpAdminGateway};
pub use error::{ClientError, ClientErrorKind, UNKNOWN_ERROR_BODY};
pub use http::HttpChatTransport;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Issues chat requests to the backend.
///
/// One call is one request with its own deadline. Implementations do not
/// queue or dedupe; callers gate concurrent sends.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send the full history plus the new message.
    ///
    /// Resolves early with a `Cancelled` error once `cancel` fires.
    async fn send(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
    ) -> Result<AnalysisResult, ClientError>;
}

#[async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for Arc<T> {
    async fn send(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
    ) -> Result<AnalysisResult, ClientError> {
        (**self).send(request, cancel).await
    }
}

/// Logging wrapper for chat transports
pub struct LoggingTransport {
    inner: Arc<dyn ChatTransport>,
}

impl LoggingTransport {
    pub fn new(inner: Arc<dyn ChatTransport>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ChatTransport for LoggingTransport {
    async fn send(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
    ) -> Result<AnalysisResult, ClientError> {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("chat_request", %request_id);

        async move {
            let start = std::time::Instant::now();
            let result = self.inner.send(request, cancel).await;
            let duration = start.elapsed();

            match &result {
                Ok(analysis) => {
                    tracing::info!(
                        duration_ms = %duration.as_millis(),
                        history_len = request.history.len(),
                        is_admin = request.is_admin,
                        risk_score = analysis.risk_score,
                        conversation_end = analysis.conversation_end,
                        "Chat request completed"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        duration_ms = %duration.as_millis(),
                        history_len = request.history.len(),
                        kind = e.kind.as_str(),
                        status = ?e.status,
                        error = %e.message,
                        "Chat request failed"
                    );
                }
            }

            result
        }
        .instrument(span)
        .await
    }
}
