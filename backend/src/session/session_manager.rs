//! Session Manager
//!
//! Keeps one chat session per contact. A session is rebuilt when the
//! contact's persona or the configured model changes, and dropped when the
//! contact is deleted.

use super::chat_session::{ChatSession, SessionClient};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Manages per-contact chat sessions
pub struct SessionManager {
    client: SessionClient,
    /// Map from contact id to its session
    sessions: RwLock<HashMap<String, Arc<ChatSession>>>,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(client: SessionClient) -> Self {
        Self {
            client,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// The client sessions are created with
    pub fn client(&self) -> &SessionClient {
        &self.client
    }

    /// Get or create the session for a contact
    ///
    /// An existing session is reused only while its persona and model still
    /// match; otherwise it is replaced with a fresh one.
    pub async fn get_or_create_session(
        &self,
        contact_id: &str,
        persona: &str,
        model: &str,
    ) -> Arc<ChatSession> {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(contact_id) {
                if session.persona() == persona && session.model() == model {
                    debug!(contact_id = %contact_id, "Reusing existing chat session");
                    return session.clone();
                }
            }
        }

        let session = Arc::new(self.client.create_session(persona, model));

        let replaced = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(contact_id.to_string(), session.clone())
        };

        info!(
            contact_id = %contact_id,
            model = %model,
            replaced = replaced.is_some(),
            "Chat session created and stored"
        );

        session
    }

    /// Drop the session of a contact
    pub async fn remove_session(&self, contact_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(contact_id).is_some();
        if removed {
            debug!(contact_id = %contact_id, "Chat session removed");
        }
        removed
    }

    /// Get the number of live sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
