//! Session module
//!
//! Generative session client, per-contact session cache and inline image
//! helpers.

pub mod chat_session;
pub mod media;
pub mod session_manager;

pub use chat_session::{placeholder_image_url, ChatSession, SessionClient};
pub use media::DataUrl;
pub use session_manager::SessionManager;
