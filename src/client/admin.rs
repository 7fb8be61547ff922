//! Admin gateway: stored conversation listings and transcripts

use super::error::{self, ClientError, DETAIL_FETCH_MESSAGE, LIST_FETCH_MESSAGE};
use super::types::{AdminConversationSummary, ConversationDetail, ConversationListResponse};
use crate::config::ClientConfig;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

/// Read-only access to stored conversations.
///
/// No retries: a failed call surfaces its error and the caller decides.
#[async_trait]
pub trait AdminGateway: Send + Sync {
    /// List stored conversations, including test ones when asked.
    ///
    /// The result is returned unfiltered; callers partition on `is_test`.
    async fn list_conversations(
        &self,
        include_test: bool,
    ) -> Result<Vec<AdminConversationSummary>, ClientError>;

    /// Fetch one transcript. `is_test` is forwarded as a query flag only.
    async fn conversation_detail(
        &self,
        filename: &str,
        is_test: bool,
    ) -> Result<ConversationDetail, ClientError>;
}

#[async_trait]
impl<T: AdminGateway + ?Sized> AdminGateway for std::sync::Arc<T> {
    async fn list_conversations(
        &self,
        include_test: bool,
    ) -> Result<Vec<AdminConversationSummary>, ClientError> {
        (**self).list_conversations(include_test).await
    }

    async fn conversation_detail(
        &self,
        filename: &str,
        is_test: bool,
    ) -> Result<ConversationDetail, ClientError> {
        (**self).conversation_detail(filename, is_test).await
    }
}

/// Admin gateway backed by `GET {base}/api/admin/conversations[/{filename}]`
#[derive(Clone)]
pub struct HttpAdminGateway {
    client: Client,
    base_url: String,
}

impl HttpAdminGateway {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(client: Client, config: &ClientConfig) -> Self {
        Self::new(client, config.backend_base())
    }

    /// `{base}/api/admin/conversations` plus an optional escaped filename segment
    fn conversations_url(&self, filename: Option<&str>) -> Result<Url, ClientError> {
        let mut url = Url::parse(&format!("{}/api/admin/conversations", self.base_url))
            .map_err(|_| ClientError::network())?;
        if let Some(filename) = filename {
            url.path_segments_mut()
                .map_err(|()| ClientError::network())?
                .push(filename);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        flag: Option<(&str, &str)>,
        failure_message: &str,
    ) -> Result<T, ClientError> {
        let mut request = self.client.get(url);
        if let Some(flag) = flag {
            request = request.query(&[flag]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| error::from_reqwest(&e, &self.base_url))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Admin fetch failed");
            return Err(ClientError::fetch(failure_message, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| error::from_reqwest(&e, &self.base_url))?;
        serde_json::from_str(&body).map_err(ClientError::parse)
    }
}

#[async_trait]
impl AdminGateway for HttpAdminGateway {
    async fn list_conversations(
        &self,
        include_test: bool,
    ) -> Result<Vec<AdminConversationSummary>, ClientError> {
        let url = self.conversations_url(None)?;
        let flag = include_test.then_some(("include_test", "true"));

        let listing: ConversationListResponse =
            self.get_json(url, flag, LIST_FETCH_MESSAGE).await?;

        tracing::info!(
            count = listing.conversations.len(),
            include_test,
            "Loaded conversation list"
        );
        Ok(listing.conversations)
    }

    async fn conversation_detail(
        &self,
        filename: &str,
        is_test: bool,
    ) -> Result<ConversationDetail, ClientError> {
        let url = self.conversations_url(Some(filename))?;
        let flag = is_test.then_some(("is_test", "true"));

        let detail: ConversationDetail = self.get_json(url, flag, DETAIL_FETCH_MESSAGE).await?;

        tracing::info!(
            filename,
            is_test,
            turns = detail.history.len(),
            "Loaded conversation detail"
        );
        Ok(detail)
    }
}
