//! Pure state transition function

use super::state::{seed_history, SessionModel, SessionPhase, FALLBACK_REPLY};
use super::{Effect, Event};
use crate::client::{ChatRequest, Turn};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub model: SessionModel,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(model: SessionModel) -> Self {
        Self {
            model,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Events the session refuses. The model is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Conversation has not started")]
    NotStarted,
    #[error("A reply is still pending")]
    Busy,
    #[error("Message is empty")]
    EmptyMessage,
    #[error("Conversation has ended; reset to start over")]
    ConversationEnded,
    #[error("Reply for request {0} is no longer expected")]
    StaleReply(u64),
}

/// Pure transition function: no I/O, same input gives same output.
///
/// # Errors
///
/// Returns a [`TransitionError`] when the event is not valid in the current
/// phase; callers treat that as a no-op.
pub fn transition(model: &SessionModel, event: Event) -> Result<TransitionResult, TransitionError> {
    match (model.phase, event) {
        // ============================================================
        // Lifecycle
        // ============================================================

        (SessionPhase::Idle, Event::Start) => {
            let mut next = model.clone();
            next.phase = SessionPhase::Active;
            Ok(TransitionResult::new(next))
        }

        // Start is a no-op once started
        (_, Event::Start) => Ok(TransitionResult::new(model.clone())),

        (phase, Event::Reset) => {
            let next_phase = if phase == SessionPhase::Idle {
                SessionPhase::Idle
            } else {
                SessionPhase::Active
            };
            Ok(reset_to(model, next_phase))
        }

        (_, Event::Leave) => Ok(reset_to(model, SessionPhase::Idle)),

        // ============================================================
        // Sending
        // ============================================================

        (SessionPhase::Active, Event::Submit { text, is_admin }) => {
            if text.trim().is_empty() {
                return Err(TransitionError::EmptyMessage);
            }

            let request_id = model.next_request_id;
            let mut next = model.clone();
            next.history.push(Turn::user(text.clone()));
            next.error = None;
            next.phase = SessionPhase::Awaiting { request_id };
            next.next_request_id += 1;

            let request = ChatRequest {
                history: next.history.clone(),
                message: text,
                is_admin,
            };
            Ok(TransitionResult::new(next).with_effect(Effect::RequestReply {
                request_id,
                request,
            }))
        }

        (SessionPhase::Idle, Event::Submit { .. }) => Err(TransitionError::NotStarted),
        (SessionPhase::Awaiting { .. }, Event::Submit { .. }) => Err(TransitionError::Busy),
        (SessionPhase::Ended, Event::Submit { .. }) => Err(TransitionError::ConversationEnded),

        // ============================================================
        // Transport results
        // ============================================================

        (SessionPhase::Awaiting { request_id: pending }, Event::ReplyReceived { request_id, analysis })
            if pending == request_id =>
        {
            let ended = analysis.conversation_end;
            let mut next = model.clone();
            next.history.push(Turn::ai(analysis.reply.clone()));
            next.analysis = Some(analysis);
            next.error = None;
            next.phase = if ended {
                SessionPhase::Ended
            } else {
                SessionPhase::Active
            };

            let result = TransitionResult::new(next);
            Ok(if ended {
                result.with_effect(Effect::ShowEndNotice)
            } else {
                result
            })
        }

        // A failed send never ends the conversation
        (SessionPhase::Awaiting { request_id: pending }, Event::SendFailed { request_id, error })
            if pending == request_id =>
        {
            let mut next = model.clone();
            next.history.push(Turn::ai(FALLBACK_REPLY));
            next.error = Some(error.message);
            next.phase = SessionPhase::Active;
            Ok(TransitionResult::new(next))
        }

        (_, Event::ReplyReceived { request_id, .. } | Event::SendFailed { request_id, .. }) => {
            Err(TransitionError::StaleReply(request_id))
        }
    }
}

fn reset_to(model: &SessionModel, phase: SessionPhase) -> TransitionResult {
    let next = SessionModel {
        phase,
        history: seed_history(),
        analysis: None,
        error: None,
        next_request_id: model.next_request_id,
    };

    let result = TransitionResult::new(next);
    match model.phase {
        SessionPhase::Awaiting { request_id } => {
            result.with_effect(Effect::CancelRequest { request_id })
        }
        _ => result,
    }
}
