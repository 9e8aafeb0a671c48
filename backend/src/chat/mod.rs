//! Chat module
//!
//! Composes outgoing messages and reconciles streamed replies into the
//! transcript.

pub mod outgoing;
pub mod reconciler;

pub use outgoing::{ComposedMessage, OutgoingMessage, FAILURE_TEXT};
pub use reconciler::{Reconciler, SendOutcome, TurnHandle};
