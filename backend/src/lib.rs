//! Gemini Phone Backend Library
//!
//! Core of a simulated smartphone chat app: a streaming Gemini chat-session
//! client, the transcript reconciler that turns streamed fragments into
//! messages, and the persisted phone state. The UI lives in the GUI crate.

pub mod chat;
pub mod config;
pub mod error;
pub mod gemini;
pub mod services;
pub mod session;
/// Application state management
///
/// Handles settings, contacts, the transcript, and persistence.
pub mod state;
pub mod view;
