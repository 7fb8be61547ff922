//! Wire types shared by the chat transport and the admin gateway

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Who said a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Ai,
}

/// One message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: Role::Ai,
            content: content.into(),
        }
    }
}

/// Body of `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub history: Vec<Turn>,
    pub message: String,
    pub is_admin: bool,
}

/// Backend assessment of the latest exchange.
///
/// Level fields are kept as the labels the backend sent (`낮음`, `중간`, ...);
/// the client never coerces them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub reply: String,
    pub emotional_distress: String,
    pub suicide_signal: String,
    pub risk_score: i64,
    pub next_action: String,
    pub conversation_end: bool,
    #[serde(default)]
    pub end_report: Option<EndReport>,
    #[serde(default)]
    pub history_analysis: Option<Vec<TurnAnalysis>>,
}

impl AnalysisResult {
    /// Korean-keyed evaluation report shown in the admin JSON view
    pub fn report_json(&self) -> Value {
        json!({
            "답변": self.reply,
            "정서적 고통 상태": self.emotional_distress,
            "자살 신호": self.suicide_signal,
            "위험 점수": self.risk_score,
            "다음 조치": self.next_action,
            "대화 종료": self.conversation_end,
            "종합 결과": self.end_report.as_ref().map(EndReport::report_json),
        })
    }
}

/// Summary produced when the backend decides the conversation is over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndReport {
    pub summary: String,
    pub risk_score: i64,
    pub trend: String,
    pub distress_level: String,
    pub suicide_signal: String,
    pub conversation_turns: u32,
    #[serde(default)]
    pub key_topics: Vec<String>,
    pub next_guidance: String,
}

impl EndReport {
    fn report_json(&self) -> Value {
        json!({
            "대화 요약": self.summary,
            "최종 위험 점수": self.risk_score,
            "상태 추이": self.trend,
            "다음 대화 시 가이드": self.next_guidance,
            "최종 정서적 고통 수준": self.distress_level,
            "최종 자살 신호": self.suicide_signal,
            "대화 턴 수": self.conversation_turns,
            "주요 주제": self.key_topics,
        })
    }
}

/// Per-turn analysis attached to a reply when the backend includes it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnAnalysis {
    pub turn_index: u32,
    pub user_message: String,
    #[serde(default)]
    pub ai_reply: Option<String>,
    pub emotional_distress: String,
    pub suicide_signal: String,
    pub risk_score: i64,
    pub next_action: String,
}

// ============================================================================
// Admin types
// ============================================================================

/// Row of the admin conversation listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminConversationSummary {
    pub filename: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub risk_score: i64,
    #[serde(default)]
    pub distress_level: String,
    #[serde(default)]
    pub is_test: bool,
}

/// Response of `GET /api/admin/conversations`
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ConversationListResponse {
    #[serde(default)]
    pub conversations: Vec<AdminConversationSummary>,
}

/// Stored transcript returned by `GET /api/admin/conversations/{filename}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConversationDetail {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub history: Vec<StoredTurn>,
    #[serde(default)]
    pub analysis: Option<StoredAnalysis>,
    #[serde(default)]
    pub end_report: Option<EndReport>,
}

/// A turn as persisted by the backend; user turns carry their own analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTurn {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub analysis: Option<StoredAnalysis>,
}

impl StoredTurn {
    pub fn as_turn(&self) -> Turn {
        Turn {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Analysis fields persisted alongside a transcript
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoredAnalysis {
    #[serde(default)]
    pub emotional_distress: String,
    #[serde(default)]
    pub suicide_signal: String,
    #[serde(default)]
    pub risk_score: i64,
    #[serde(default)]
    pub next_action: String,
    #[serde(default)]
    pub trend: Option<String>,
    #[serde(default)]
    pub conversation_turns: Option<u32>,
    #[serde(default)]
    pub key_topics: Vec<String>,
}
