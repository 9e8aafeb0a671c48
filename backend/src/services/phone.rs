//! Phone service
//!
//! Single entry point for the UI: every user action the phone screens can
//! trigger, each applied to the shared store and persisted.

use crate::chat::{OutgoingMessage, Reconciler, SendOutcome, TurnHandle};
use crate::config::Config;
use crate::error::AppError;
use crate::gemini::{GeminiClient, GenerativeApi};
use crate::services::WorldBookService;
use crate::session::SessionClient;
use crate::state::{
    AppStore, Contact, ContactId, ContactPatch, JsonFileStore, KeyValueStore, Settings, StoreKey,
};
use std::sync::Arc;
use tracing::info;

/// Application services bound to one store
#[derive(Clone)]
pub struct PhoneService {
    store: AppStore,
    reconciler: Reconciler,
    world_book: WorldBookService,
}

impl PhoneService {
    /// Build from configuration: JSON files under the data directory and
    /// the Gemini REST client
    ///
    /// A missing API key is not an error here; sends fail with a visible
    /// failure message instead.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let api = GeminiClient::from_config(&config.gemini)?;
        let backend = JsonFileStore::new(&config.persistence.data_dir);
        info!(
            data_dir = %config.persistence.data_dir.display(),
            api_key_set = !config.gemini.api_key.is_empty(),
            "Opening phone state"
        );
        Ok(Self::new(
            Arc::new(backend),
            Arc::new(api),
            &config.gemini.image_model,
        ))
    }

    /// Build over any store and generative API
    pub fn new(
        backend: Arc<dyn KeyValueStore>,
        api: Arc<dyn GenerativeApi>,
        image_model: &str,
    ) -> Self {
        let store = AppStore::open(backend);
        let client = SessionClient::new(api, image_model);
        Self {
            reconciler: Reconciler::new(store.clone(), client.clone()),
            world_book: WorldBookService::new(store.clone(), client),
            store,
        }
    }

    /// The shared store
    pub fn store(&self) -> &AppStore {
        &self.store
    }

    /// The transcript reconciler
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// The world book
    pub fn world_book(&self) -> &WorldBookService {
        &self.world_book
    }

    /// Replace the settings
    ///
    /// A changed model id takes effect on the next send of each
    /// conversation, which then starts a fresh session.
    pub async fn update_settings(&self, settings: Settings) {
        self.store
            .mutate(&[StoreKey::Settings], |state| state.update_settings(settings))
            .await;
    }

    /// Create a contact; `None` when the name is blank
    pub async fn add_contact(&self, name: &str, avatar: &str, persona: &str) -> Option<ContactId> {
        let id = self
            .store
            .mutate(&[StoreKey::Contacts, StoreKey::ActiveChats], |state| {
                state.add_contact(name, avatar, persona)
            })
            .await?;
        info!(contact_id = %id, name = %name, "Contact added");
        Some(id)
    }

    /// Edit a contact's name, avatar or persona
    pub async fn update_contact(&self, id: &str, patch: ContactPatch) -> Result<(), AppError> {
        self.store
            .mutate(&[StoreKey::Contacts], |state| state.update_contact(id, patch))
            .await
    }

    /// Delete a contact with its messages
    pub async fn delete_contact(&self, id: &str) -> Result<Contact, AppError> {
        self.reconciler.delete_contact(id).await
    }

    /// Show a conversation in the chat list
    pub async fn open_conversation(&self, id: &str) -> Result<bool, AppError> {
        self.store
            .mutate(&[StoreKey::ActiveChats], |state| state.open_conversation(id))
            .await
    }

    /// Put a sticker on the shelf
    pub async fn add_sticker(&self, url: String) {
        self.store
            .mutate(&[StoreKey::Stickers], |state| state.add_sticker(url))
            .await;
    }

    /// Send a message and wait for the reply to finish
    pub async fn send(
        &self,
        conversation_id: &str,
        message: OutgoingMessage,
    ) -> Result<SendOutcome, AppError> {
        self.reconciler.send(conversation_id, message).await
    }

    /// Send a message in the background
    pub fn spawn_send(&self, conversation_id: &str, message: OutgoingMessage) -> TurnHandle {
        self.reconciler.spawn(conversation_id, message)
    }
}
