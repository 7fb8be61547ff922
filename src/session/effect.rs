//! Effects produced by state transitions

use crate::client::ChatRequest;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send a chat request through the transport
    RequestReply {
        request_id: u64,
        request: ChatRequest,
    },

    /// Abort the in-flight request; its late result will be discarded
    CancelRequest { request_id: u64 },

    /// The conversation just ended; the UI shows the end notice
    ShowEndNotice,
}
