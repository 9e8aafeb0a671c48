//! Transcript reconciler
//!
//! Drives one send from composition to a terminal state:
//! append the user message and an empty agent placeholder, concatenate every
//! streamed fragment onto the placeholder, then complete, fail or cancel.
//!
//! Each step is a single store mutation, so readers see the placeholder grow
//! one whole fragment at a time. At most one turn runs per conversation.

use crate::chat::outgoing::{OutgoingMessage, FAILURE_TEXT};
use crate::error::AppError;
use crate::session::{SessionClient, SessionManager};
use crate::state::{AppStore, Contact, PendingTurn, StoreKey};
use futures_util::StreamExt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How a send ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing was appended (blank text, invalid transfer amount)
    Rejected,
    /// Nothing was appended; a turn of this conversation is still running
    Busy,
    /// The stream finished; the placeholder holds the full reply
    Completed,
    /// The stream failed; the placeholder holds the failure text
    Failed,
    /// The turn was cancelled; the placeholder keeps the partial reply
    Cancelled,
}

/// Handle to a turn running in the background
pub struct TurnHandle {
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<SendOutcome, AppError>>,
}

impl TurnHandle {
    /// Ask the turn to stop after the fragment in progress
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    /// Whether the turn has reached a terminal state
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the turn to end
    pub async fn outcome(self) -> Result<SendOutcome, AppError> {
        self.task
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Turn task failed: {}", e)))?
    }
}

/// Applies sends to the shared store and keeps one session per contact
#[derive(Clone)]
pub struct Reconciler {
    store: AppStore,
    sessions: Arc<SessionManager>,
}

impl Reconciler {
    /// Create a reconciler over a store and a session client
    pub fn new(store: AppStore, client: SessionClient) -> Self {
        Self {
            store,
            sessions: Arc::new(SessionManager::new(client)),
        }
    }

    /// The store this reconciler writes to
    pub fn store(&self) -> &AppStore {
        &self.store
    }

    /// The session cache
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Send a message and wait for the turn to end
    pub async fn send(
        &self,
        conversation_id: &str,
        message: OutgoingMessage,
    ) -> Result<SendOutcome, AppError> {
        self.run_turn(conversation_id, message, std::future::pending())
            .await
    }

    /// Send a message on a background task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(&self, conversation_id: &str, message: OutgoingMessage) -> TurnHandle {
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let reconciler = self.clone();
        let conversation_id = conversation_id.to_string();

        let task = tokio::spawn(async move {
            let cancelled = async move {
                // A dropped handle detaches the turn rather than cancelling it
                if cancel_rx.await.is_err() {
                    std::future::pending::<()>().await;
                }
            };
            reconciler
                .run_turn(&conversation_id, message, cancelled)
                .await
        });

        TurnHandle {
            cancel: Some(cancel_tx),
            task,
        }
    }

    /// Delete a contact with its messages and its session
    pub async fn delete_contact(&self, contact_id: &str) -> Result<Contact, AppError> {
        let (contact, removed) = self
            .store
            .mutate(
                &[StoreKey::Messages, StoreKey::Contacts, StoreKey::ActiveChats],
                |state| state.delete_contact(contact_id),
            )
            .await?;
        self.sessions.remove_session(contact_id).await;

        info!(
            contact_id = %contact_id,
            removed_messages = removed,
            "Contact deleted"
        );
        Ok(contact)
    }

    async fn run_turn(
        &self,
        conversation_id: &str,
        message: OutgoingMessage,
        cancelled: impl Future<Output = ()>,
    ) -> Result<SendOutcome, AppError> {
        let Some(composed) = message.compose() else {
            debug!(conversation_id = %conversation_id, "Ignoring empty or invalid message");
            return Ok(SendOutcome::Rejected);
        };

        let started = self
            .store
            .mutate(&[], |state| {
                let persona = state
                    .contacts
                    .get(conversation_id)
                    .map(|c| c.persona.clone())
                    .unwrap_or_default();
                let model = state.settings.model.clone();
                let turn = state.begin_turn(
                    conversation_id,
                    composed.content.clone(),
                    composed.payload.clone(),
                )?;
                Ok::<_, AppError>(turn.map(|turn| (turn, persona, model)))
            })
            .await?;

        let Some((turn, persona, model)) = started else {
            debug!(conversation_id = %conversation_id, "Turn already in flight");
            return Ok(SendOutcome::Busy);
        };

        info!(
            conversation_id = %conversation_id,
            kind = composed.payload.kind(),
            model = %model,
            "Starting turn"
        );

        let session = self
            .sessions
            .get_or_create_session(conversation_id, &persona, &model)
            .await;
        let mut fragments =
            self.sessions
                .client()
                .stream_reply(&session, &composed.prompt, composed.image.as_deref());

        tokio::pin!(cancelled);
        let outcome = loop {
            tokio::select! {
                _ = &mut cancelled => break SendOutcome::Cancelled,
                next = fragments.next() => match next {
                    Some(Ok(fragment)) => {
                        if fragment.is_empty() {
                            continue;
                        }
                        let attached = self
                            .store
                            .mutate(&[], |state| state.append_fragment(&turn, &fragment))
                            .await;
                        if !attached {
                            // The contact was deleted mid-turn
                            break SendOutcome::Cancelled;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(conversation_id = %conversation_id, error = %e, "Turn failed");
                        break SendOutcome::Failed;
                    }
                    None => break SendOutcome::Completed,
                },
            }
        };

        Ok(self.finish(&turn, outcome).await)
    }

    /// Write the terminal state of a turn and return its final outcome
    async fn finish(&self, turn: &PendingTurn, outcome: SendOutcome) -> SendOutcome {
        let attached = self
            .store
            .read(|state| state.transcript.get(&turn.agent_message_id).is_some())
            .await;
        // A missing placeholder means the contact was deleted mid-turn
        let outcome = if attached {
            outcome
        } else {
            SendOutcome::Cancelled
        };
        let keys: &[StoreKey] = if attached { &[StoreKey::Messages] } else { &[] };

        let replacement = match outcome {
            SendOutcome::Failed => Some(FAILURE_TEXT.to_string()),
            _ => None,
        };
        self.store
            .mutate(keys, |state| state.finish_turn(turn, replacement))
            .await;

        info!(
            conversation_id = %turn.conversation_id,
            outcome = ?outcome,
            "Turn finished"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::{FragmentStream, GeminiApiRequest, GeminiApiResponse, GenerationError};
    use crate::gemini::GenerativeApi;
    use crate::state::{MemoryStore, Sender};
    use async_trait::async_trait;
    use futures_util::stream;
    use tokio::sync::Notify;

    /// Replies with fixed fragments, or never finishes when `hang` is set
    struct ScriptedApi {
        fragments: Vec<&'static str>,
        hang: bool,
    }

    #[async_trait]
    impl GenerativeApi for ScriptedApi {
        async fn generate(
            &self,
            _model: &str,
            _request: &GeminiApiRequest,
        ) -> Result<GeminiApiResponse, GenerationError> {
            Err(GenerationError::Empty("candidates"))
        }

        fn stream_generate(&self, _model: &str, _request: GeminiApiRequest) -> FragmentStream {
            let items: Vec<Result<String, GenerationError>> =
                self.fragments.iter().map(|f| Ok(f.to_string())).collect();
            if self.hang {
                Box::pin(stream::iter(items).chain(stream::pending()))
            } else {
                Box::pin(stream::iter(items))
            }
        }
    }

    fn reconciler(fragments: Vec<&'static str>, hang: bool) -> Reconciler {
        let store = AppStore::open(Arc::new(MemoryStore::new()));
        let client = SessionClient::new(Arc::new(ScriptedApi { fragments, hang }), "img");
        Reconciler::new(store, client)
    }

    #[tokio::test]
    async fn test_send_completes_on_default_contact() {
        let reconciler = reconciler(vec!["Hi", " there"], false);
        let outcome = reconciler
            .send("default", OutgoingMessage::Text("hello".into()))
            .await
            .unwrap();
        assert_eq!(outcome, SendOutcome::Completed);

        let state = reconciler.store().snapshot().await;
        let messages = state.transcript.conversation("default");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].sender, Sender::Agent);
        assert_eq!(messages[1].content, "Hi there");
        assert!(!state.is_typing("default"));
    }

    #[tokio::test]
    async fn test_unknown_contact_is_an_error() {
        let reconciler = reconciler(vec!["x"], false);
        let result = reconciler
            .send("nobody", OutgoingMessage::Text("hello".into()))
            .await;
        assert!(matches!(result, Err(AppError::ContactNotFound(_))));
    }

    #[tokio::test]
    async fn test_cancel_keeps_partial_reply() {
        let reconciler = reconciler(vec!["Par", "tial"], true);
        let mut rx = reconciler.store().subscribe();
        let mut handle = reconciler.spawn("default", OutgoingMessage::Text("hello".into()));

        // Wait until both fragments landed
        loop {
            rx.changed().await.unwrap();
            let content = reconciler
                .store()
                .read(|s| s.transcript.last_message("default").map(|m| m.content.clone()))
                .await;
            if content.as_deref() == Some("Partial") {
                break;
            }
        }

        handle.cancel();
        assert_eq!(handle.outcome().await.unwrap(), SendOutcome::Cancelled);
        let state = reconciler.store().snapshot().await;
        assert_eq!(
            state.transcript.last_message("default").unwrap().content,
            "Partial"
        );
        assert!(!state.is_typing("default"));
    }

    #[tokio::test]
    async fn test_delete_contact_drops_session() {
        let reconciler = reconciler(vec!["ok"], false);
        reconciler
            .send("default", OutgoingMessage::Call)
            .await
            .unwrap();
        assert_eq!(reconciler.sessions().session_count().await, 1);

        let contact = reconciler.delete_contact("default").await.unwrap();
        assert_eq!(contact.id, "default");
        assert_eq!(reconciler.sessions().session_count().await, 0);
        assert!(reconciler.store().read(|s| s.transcript.is_empty()).await);
    }

    /// Streams nothing and ends once the gate opens
    struct GatedApi {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl GenerativeApi for GatedApi {
        async fn generate(
            &self,
            _model: &str,
            _request: &GeminiApiRequest,
        ) -> Result<GeminiApiResponse, GenerationError> {
            Err(GenerationError::Empty("candidates"))
        }

        fn stream_generate(&self, _model: &str, _request: GeminiApiRequest) -> FragmentStream {
            let gate = self.gate.clone();
            Box::pin(
                stream::once(async move { gate.notified().await })
                    .filter_map(|()| async { None::<Result<String, GenerationError>> }),
            )
        }
    }

    #[tokio::test]
    async fn test_delete_during_silent_turn_ends_cancelled() {
        let gate = Arc::new(Notify::new());
        let store = AppStore::open(Arc::new(MemoryStore::new()));
        let client = SessionClient::new(Arc::new(GatedApi { gate: gate.clone() }), "img");
        let reconciler = Reconciler::new(store, client);

        let mut rx = reconciler.store().subscribe();
        let handle = reconciler.spawn("default", OutgoingMessage::Text("hello".into()));
        while !reconciler.store().read(|s| s.is_typing("default")).await {
            rx.changed().await.unwrap();
        }

        reconciler.delete_contact("default").await.unwrap();
        gate.notify_one();

        assert_eq!(handle.outcome().await.unwrap(), SendOutcome::Cancelled);
        let state = reconciler.store().snapshot().await;
        assert!(state.transcript.is_empty());
        assert!(!state.is_typing("default"));
    }
}
