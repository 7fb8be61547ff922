//! Events that drive the session

use crate::client::{AnalysisResult, ClientError};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    Start,
    Submit {
        text: String,
        is_admin: bool,
    },
    Reset,
    /// Back to the landing screen; resets and returns to idle
    Leave,

    // Transport events
    ReplyReceived {
        request_id: u64,
        analysis: AnalysisResult,
    },
    SendFailed {
        request_id: u64,
        error: ClientError,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::Submit { .. } => "submit",
            Event::Reset => "reset",
            Event::Leave => "leave",
            Event::ReplyReceived { .. } => "reply_received",
            Event::SendFailed { .. } => "send_failed",
        }
    }
}
