//! Conversation session state

use crate::client::{AnalysisResult, Turn};

/// Greeting every conversation starts from
pub const SEED_GREETING: &str =
    "안녕, 난 SORI야. 오늘 마음이 어땠는지 편하게 얘기해줘. 한 가지만 말해도 괜찮아.";

/// AI turn appended when a send fails
pub const FALLBACK_REPLY: &str = "죄송해요, 잠시 문제가 생겼어요. 다시 말해줄 수 있을까?";

/// Seed history: exactly one AI greeting turn
pub fn seed_history() -> Vec<Turn> {
    vec![Turn::ai(SEED_GREETING)]
}

/// Where the conversation is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Landing screen, not started
    Idle,
    /// Accepting input
    Active,
    /// A chat request is in flight; no other send is accepted
    Awaiting { request_id: u64 },
    /// Backend ended the conversation; terminal until reset
    Ended,
}

impl SessionPhase {
    pub fn name(self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Active => "active",
            SessionPhase::Awaiting { .. } => "awaiting",
            SessionPhase::Ended => "ended",
        }
    }
}

/// Everything the session owns
#[derive(Debug, Clone, PartialEq)]
pub struct SessionModel {
    pub phase: SessionPhase,
    /// Display order; never empty
    pub history: Vec<Turn>,
    /// Latest analysis only
    pub analysis: Option<AnalysisResult>,
    /// Message of the last failed send, cleared by the next send or reply
    pub error: Option<String>,
    /// Id for the next request. Keeps increasing across resets so a late
    /// reply can never match a newer request.
    pub next_request_id: u64,
}

impl Default for SessionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionModel {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            history: seed_history(),
            analysis: None,
            error: None,
            next_request_id: 1,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, SessionPhase::Awaiting { .. })
    }

    pub fn is_ended(&self) -> bool {
        self.phase == SessionPhase::Ended
    }

    /// Non-blank text and no pending request
    pub fn can_send(&self, text: &str) -> bool {
        !text.trim().is_empty() && !self.is_loading()
    }

    /// Whether the composer should accept typing at all
    pub fn accepts_input(&self) -> bool {
        matches!(self.phase, SessionPhase::Active | SessionPhase::Awaiting { .. })
    }
}
