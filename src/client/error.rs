//! Client error types

use thiserror::Error;

/// Body text used when the server sends an error status with an empty body
pub const UNKNOWN_ERROR_BODY: &str = "알 수 없는 오류";

pub(crate) const NETWORK_MESSAGE: &str =
    "서버에 연결할 수 없습니다. 백엔드 서버가 실행 중인지 확인해주세요.";
pub(crate) const LIST_FETCH_MESSAGE: &str = "대화 목록을 불러올 수 없습니다.";
pub(crate) const DETAIL_FETCH_MESSAGE: &str = "대화를 불러올 수 없습니다.";
pub(crate) const CANCELLED_MESSAGE: &str = "요청이 취소되었습니다.";

/// Client error with classification.
///
/// `Display` is the user-facing message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ClientError {
    pub kind: ClientErrorKind,
    pub message: String,
    /// HTTP status for `Server` and `Fetch` errors
    pub status: Option<u16>,
}

impl ClientError {
    pub fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Deadline exceeded; `backend` names the server the user should check.
    pub fn timeout(backend: &str) -> Self {
        Self::new(
            ClientErrorKind::Timeout,
            format!(
                "요청 시간이 초과되었습니다. 백엔드 서버가 실행 중인지 확인해주세요. ({backend})"
            ),
        )
    }

    pub fn network() -> Self {
        Self::new(ClientErrorKind::Network, NETWORK_MESSAGE)
    }

    /// Non-success status on the chat endpoint
    pub fn server(status: u16, body: &str) -> Self {
        let body = if body.trim().is_empty() {
            UNKNOWN_ERROR_BODY
        } else {
            body
        };
        Self::new(
            ClientErrorKind::Server,
            format!("서버 오류 ({status}): {body}"),
        )
        .with_status(status)
    }

    pub fn parse(detail: impl std::fmt::Display) -> Self {
        Self::new(
            ClientErrorKind::Parse,
            format!("응답을 해석할 수 없습니다: {detail}"),
        )
    }

    /// Non-success status on an admin endpoint
    pub fn fetch(message: impl Into<String>, status: u16) -> Self {
        Self::new(ClientErrorKind::Fetch, message).with_status(status)
    }

    pub fn cancelled() -> Self {
        Self::new(ClientErrorKind::Cancelled, CANCELLED_MESSAGE)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    /// Deadline exceeded before the backend answered
    Timeout,
    /// Connection refused, DNS failure, reset
    Network,
    /// Chat endpoint answered with a non-2xx status
    Server,
    /// Body was not the expected JSON shape
    Parse,
    /// Admin endpoint answered with a non-2xx status
    Fetch,
    /// The caller cancelled the request
    Cancelled,
}

impl ClientErrorKind {
    /// Whether the UI should suggest checking that the backend is running
    pub fn hints_backend_unreachable(self) -> bool {
        matches!(self, Self::Timeout | Self::Network)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Server => "server",
            Self::Parse => "parse",
            Self::Fetch => "fetch",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Classify a transport-level reqwest failure
pub(crate) fn from_reqwest(err: &reqwest::Error, backend: &str) -> ClientError {
    if err.is_timeout() {
        ClientError::timeout(backend)
    } else if err.is_decode() {
        ClientError::parse(err)
    } else {
        // connect, request, body and redirect failures all mean the
        // backend could not be reached
        ClientError::network()
    }
}
