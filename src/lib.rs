//! SORI - counseling-support chat client
//!
//! Talks to the SORI backend over two HTTP endpoints: `POST /api/chat`
//! for conversation turns with risk analysis, and the read-only admin
//! listing of stored transcripts.

// Accessors here are plain reads; marking each one is noise
#![allow(clippy::must_use_candidate)]

pub mod app;
pub mod client;
pub mod config;
pub mod session;
pub mod tui;
pub mod view;

#[cfg(test)]
mod testing;
