//! Conversation session
//!
//! Elm-style core: [`transition`] is a pure function over [`SessionModel`];
//! [`ConversationSession`] owns the model, runs the effects and is the only
//! writer of the turn history.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{seed_history, SessionModel, SessionPhase, FALLBACK_REPLY, SEED_GREETING};
pub use transition::{transition, TransitionError, TransitionResult};

use crate::client::{AnalysisResult, ChatRequest, ChatTransport, ClientError, Turn};
use tokio_util::sync::CancellationToken;

/// A send accepted by the session, to be completed with [`ConversationSession::finish`]
#[derive(Debug, Clone)]
pub struct PendingReply {
    pub request_id: u64,
    pub request: ChatRequest,
    pub cancel: CancellationToken,
}

/// What a completed send did to the session
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyOutcome {
    /// The reply ended the conversation; show the end notice
    pub ended: bool,
    /// The send failed; a fallback turn was appended
    pub error: Option<ClientError>,
}

/// Owner of one conversation
#[derive(Debug, Default)]
pub struct ConversationSession {
    model: SessionModel,
    /// Token of the request in flight, if any
    in_flight: Option<(u64, CancellationToken)>,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self) -> &SessionModel {
        &self.model
    }

    pub fn phase(&self) -> SessionPhase {
        self.model.phase
    }

    pub fn history(&self) -> &[Turn] {
        &self.model.history
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.model.analysis.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.model.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.model.is_loading()
    }

    pub fn is_ended(&self) -> bool {
        self.model.is_ended()
    }

    pub fn can_send(&self, text: &str) -> bool {
        self.model.can_send(text)
    }

    pub fn start(&mut self) {
        // Start never fails
        let _ = self.apply(Event::Start);
    }

    pub fn reset(&mut self) {
        let _ = self.apply(Event::Reset);
    }

    /// Reset and go back to the landing state
    pub fn leave(&mut self) {
        let _ = self.apply(Event::Leave);
    }

    /// Accept a message and hand back the request to send.
    ///
    /// # Errors
    ///
    /// The session is not active, a reply is pending, or the text is blank.
    /// History is unchanged in every error case.
    pub fn begin_submit(
        &mut self,
        text: &str,
        is_admin: bool,
    ) -> Result<PendingReply, TransitionError> {
        let effects = self.apply(Event::Submit {
            text: text.to_string(),
            is_admin,
        })?;

        effects
            .into_iter()
            .find_map(|effect| match effect {
                Effect::RequestReply {
                    request_id,
                    request,
                } => Some((request_id, request)),
                _ => None,
            })
            .and_then(|(request_id, request)| {
                let cancel = self
                    .in_flight
                    .as_ref()
                    .filter(|(id, _)| *id == request_id)
                    .map(|(_, token)| token.clone())?;
                Some(PendingReply {
                    request_id,
                    request,
                    cancel,
                })
            })
            .ok_or(TransitionError::Busy)
    }

    /// `start` followed by `begin_submit`, for one-tap suggested replies
    ///
    /// # Errors
    ///
    /// Same as [`ConversationSession::begin_submit`].
    pub fn begin_quick_reply(
        &mut self,
        text: &str,
        is_admin: bool,
    ) -> Result<PendingReply, TransitionError> {
        self.start();
        self.begin_submit(text, is_admin)
    }

    /// Record the transport result for a pending request.
    ///
    /// # Errors
    ///
    /// [`TransitionError::StaleReply`] when the request was reset away; the
    /// result is discarded.
    pub fn finish(
        &mut self,
        request_id: u64,
        result: Result<AnalysisResult, ClientError>,
    ) -> Result<ReplyOutcome, TransitionError> {
        let (event, error) = match result {
            Ok(analysis) => (
                Event::ReplyReceived {
                    request_id,
                    analysis,
                },
                None,
            ),
            Err(error) => (
                Event::SendFailed {
                    request_id,
                    error: error.clone(),
                },
                Some(error),
            ),
        };

        let effects = self.apply(event)?;
        Ok(ReplyOutcome {
            ended: effects.contains(&Effect::ShowEndNotice),
            error,
        })
    }

    /// Submit and wait for the transport.
    ///
    /// Loading is released on every exit path, including when this future
    /// is dropped before the transport answers.
    ///
    /// # Errors
    ///
    /// Same as [`ConversationSession::begin_submit`]. Transport failures are
    /// not errors here; they are reported in [`ReplyOutcome::error`].
    pub async fn submit<T: ChatTransport + ?Sized>(
        &mut self,
        transport: &T,
        text: &str,
        is_admin: bool,
    ) -> Result<ReplyOutcome, TransitionError> {
        let pending = self.begin_submit(text, is_admin)?;
        self.drive(transport, pending).await
    }

    /// `start` followed by `submit`
    ///
    /// # Errors
    ///
    /// Same as [`ConversationSession::submit`].
    pub async fn quick_reply<T: ChatTransport + ?Sized>(
        &mut self,
        transport: &T,
        text: &str,
        is_admin: bool,
    ) -> Result<ReplyOutcome, TransitionError> {
        let pending = self.begin_quick_reply(text, is_admin)?;
        self.drive(transport, pending).await
    }

    async fn drive<T: ChatTransport + ?Sized>(
        &mut self,
        transport: &T,
        pending: PendingReply,
    ) -> Result<ReplyOutcome, TransitionError> {
        let guard = ReleaseOnDrop {
            session: self,
            request_id: pending.request_id,
            armed: true,
        };
        let result = transport.send(&pending.request, pending.cancel).await;
        guard.complete(result)
    }

    fn apply(&mut self, event: Event) -> Result<Vec<Effect>, TransitionError> {
        let event_name = event.name();
        let result = match transition(&self.model, event) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(event = event_name, phase = self.model.phase.name(), error = %e, "Event rejected");
                return Err(e);
            }
        };

        tracing::debug!(
            event = event_name,
            from = self.model.phase.name(),
            to = result.model.phase.name(),
            history_len = result.model.history.len(),
            "Session transition"
        );
        self.model = result.model;

        let mut remaining = Vec::with_capacity(result.effects.len());
        for effect in result.effects {
            match &effect {
                Effect::RequestReply { request_id, .. } => {
                    self.in_flight = Some((*request_id, CancellationToken::new()));
                }
                Effect::CancelRequest { request_id } => {
                    if let Some((id, token)) = self.in_flight.take() {
                        if id == *request_id {
                            tracing::info!(request_id = id, "Cancelling in-flight chat request");
                            token.cancel();
                        }
                    }
                }
                Effect::ShowEndNotice => {
                    tracing::info!("Conversation ended by backend");
                }
            }
            remaining.push(effect);
        }

        if !self.model.is_loading() {
            self.in_flight = None;
        }
        Ok(remaining)
    }
}

/// Fails the pending request if the awaiting future is dropped
struct ReleaseOnDrop<'a> {
    session: &'a mut ConversationSession,
    request_id: u64,
    armed: bool,
}

impl ReleaseOnDrop<'_> {
    fn complete(
        mut self,
        result: Result<AnalysisResult, ClientError>,
    ) -> Result<ReplyOutcome, TransitionError> {
        self.armed = false;
        self.session.finish(self.request_id, result)
    }
}

impl Drop for ReleaseOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            let _ = self
                .session
                .finish(self.request_id, Err(ClientError::cancelled()));
        }
    }
}
