//! Mock implementations for testing
//!
//! These mocks let the session, app and view be tested without a backend.

use crate::client::{
    AdminConversationSummary, AdminGateway, AnalysisResult, ChatRequest, ChatTransport,
    ClientError, ConversationDetail, EndReport,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Sample payloads
// ============================================================================

pub fn sample_analysis(reply: &str, conversation_end: bool) -> AnalysisResult {
    AnalysisResult {
        reply: reply.to_string(),
        emotional_distress: "중간".to_string(),
        suicide_signal: "없음".to_string(),
        risk_score: 30,
        next_action: "일반대화".to_string(),
        conversation_end,
        end_report: None,
        history_analysis: None,
    }
}

pub fn sample_end_analysis() -> AnalysisResult {
    AnalysisResult {
        end_report: Some(EndReport {
            summary: "학교 스트레스로 피곤함을 이야기함".to_string(),
            risk_score: 25,
            trend: "안정화 중".to_string(),
            distress_level: "낮음".to_string(),
            suicide_signal: "없음".to_string(),
            conversation_turns: 8,
            key_topics: vec!["학교".to_string(), "수면".to_string()],
            next_guidance: "수면 습관을 다시 물어보기".to_string(),
        }),
        ..sample_analysis("오늘 이야기해줘서 고마워.", true)
    }
}

pub fn sample_summary(filename: &str, is_test: bool) -> AdminConversationSummary {
    AdminConversationSummary {
        filename: filename.to_string(),
        date: "2025-03-01".to_string(),
        time: "09:30:00".to_string(),
        summary: "대화 요약 없음".to_string(),
        risk_score: 20,
        distress_level: "낮음".to_string(),
        is_test,
    }
}

// ============================================================================
// Mock chat transport
// ============================================================================

/// Mock transport that returns queued results
pub struct MockChatTransport {
    responses: Mutex<VecDeque<Result<AnalysisResult, ClientError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_reply(&self, analysis: AnalysisResult) {
        self.responses.lock().unwrap().push_back(Ok(analysis));
    }

    pub fn queue_error(&self, error: ClientError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_response(&self) -> Result<AnalysisResult, ClientError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::network()))
    }
}

impl Default for MockChatTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatTransport for MockChatTransport {
    async fn send(
        &self,
        request: &ChatRequest,
        _cancel: CancellationToken,
    ) -> Result<AnalysisResult, ClientError> {
        self.requests.lock().unwrap().push(request.clone());
        self.next_response()
    }
}

/// Mock transport with a configurable delay (for cancellation testing)
pub struct DelayedMockTransport {
    inner: MockChatTransport,
    delay: Duration,
}

impl DelayedMockTransport {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockChatTransport::new(),
            delay,
        }
    }

    pub fn queue_reply(&self, analysis: AnalysisResult) {
        self.inner.queue_reply(analysis);
    }

    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl ChatTransport for DelayedMockTransport {
    async fn send(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
    ) -> Result<AnalysisResult, ClientError> {
        self.inner.requests.lock().unwrap().push(request.clone());

        tokio::select! {
            () = tokio::time::sleep(self.delay) => self.inner.next_response(),
            () = cancel.cancelled() => Err(ClientError::cancelled()),
        }
    }
}

// ============================================================================
// Mock admin gateway
// ============================================================================

/// In-memory admin gateway
pub struct MockAdminGateway {
    conversations: Vec<AdminConversationSummary>,
    details: HashMap<String, ConversationDetail>,
    failures: Mutex<VecDeque<ClientError>>,
    /// `(filename, is_test)` of every detail call
    pub detail_calls: Mutex<Vec<(String, bool)>>,
    /// `include_test` of every list call
    pub list_calls: Mutex<Vec<bool>>,
}

impl MockAdminGateway {
    pub fn new(conversations: Vec<AdminConversationSummary>) -> Self {
        Self {
            conversations,
            details: HashMap::new(),
            failures: Mutex::new(VecDeque::new()),
            detail_calls: Mutex::new(Vec::new()),
            list_calls: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_detail(mut self, filename: &str, detail: ConversationDetail) -> Self {
        self.details.insert(filename.to_string(), detail);
        self
    }

    /// Make the next call fail
    pub fn fail_next(&self, error: ClientError) {
        self.failures.lock().unwrap().push_back(error);
    }
}

#[async_trait]
impl AdminGateway for MockAdminGateway {
    async fn list_conversations(
        &self,
        include_test: bool,
    ) -> Result<Vec<AdminConversationSummary>, ClientError> {
        self.list_calls.lock().unwrap().push(include_test);
        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        Ok(self
            .conversations
            .iter()
            .filter(|c| include_test || !c.is_test)
            .cloned()
            .collect())
    }

    async fn conversation_detail(
        &self,
        filename: &str,
        is_test: bool,
    ) -> Result<ConversationDetail, ClientError> {
        self.detail_calls
            .lock()
            .unwrap()
            .push((filename.to_string(), is_test));
        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        self.details
            .get(filename)
            .cloned()
            .ok_or_else(|| ClientError::fetch("대화를 불러올 수 없습니다.", 404))
    }
}

// ============================================================================
// Log capture
// ============================================================================

/// In-memory sink for formatted tracing output
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Capture every level on this thread until the guard drops
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        use tracing_subscriber::layer::SubscriberExt;

        let logs = Self::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(move || writer.clone()),
        );
        (logs, tracing::subscriber::set_default(subscriber))
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// Throwaway HTTP backend
// ============================================================================

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn spawn_backend(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Base URL of a local port nothing listens on
pub async fn closed_port_base() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
