// Application state management
// Settings, contacts, transcript, world book and stickers, with the mutation
// operations the view layer is allowed to perform

use super::message::{MessageId, MessagePayload, Sender};
use super::models::{
    Contact, ContactId, ContactPatch, Settings, WorldEntry, DEFAULT_AVATAR, DEFAULT_CONTACT_ID,
};
use super::persistence::{self, KeyValueStore, PersistenceError, StoreKey};
use super::registry::ContactRegistry;
use super::transcript::Transcript;
use crate::error::AppError;
use serde_json::Value;
use std::collections::HashSet;

/// Messages written for one in-flight send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    /// Conversation the turn belongs to
    pub conversation_id: ContactId,
    /// The user's message
    pub user_message_id: MessageId,
    /// The placeholder agent message receiving fragments
    pub agent_message_id: MessageId,
}

/// Main application state
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// User settings
    pub settings: Settings,
    /// Directory and chat list
    pub contacts: ContactRegistry,
    /// Every message of every conversation
    pub transcript: Transcript,
    /// World-book entries, newest first
    pub world_entries: Vec<WorldEntry>,
    /// Sticker shelf, newest first
    pub stickers: Vec<String>,
    /// Conversations whose agent is currently replying
    typing: HashSet<ContactId>,
}

impl AppState {
    /// Create an empty application state
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every key from the store, using first-run defaults for missing
    /// or unreadable ones
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let settings: Settings = persistence::load_or_else(store, StoreKey::Settings, Settings::default);
        let contacts = persistence::load_or_else(store, StoreKey::Contacts, || {
            vec![Contact::default_contact(&settings.default_persona)]
        });
        let visible = persistence::load_or_else(store, StoreKey::ActiveChats, || {
            vec![DEFAULT_CONTACT_ID.to_string()]
        });
        let messages = persistence::load_or_else(store, StoreKey::Messages, Vec::new);
        let world_entries =
            persistence::load_or_else(store, StoreKey::WorldEntries, || vec![WorldEntry::seed()]);
        let stickers = persistence::load_or_else(store, StoreKey::Stickers, Vec::new);

        let mut state = Self {
            settings,
            contacts: ContactRegistry::from_parts(contacts, visible),
            transcript: Transcript::from_messages(messages),
            world_entries,
            stickers,
            typing: HashSet::new(),
        };
        state.drop_orphan_messages();
        state
    }

    /// Enveloped JSON of the part of the state stored under `key`
    pub fn encode_key(&self, key: StoreKey) -> Result<Value, PersistenceError> {
        match key {
            StoreKey::Settings => persistence::encode(&self.settings),
            StoreKey::Contacts => persistence::encode(&self.contacts.directory()),
            StoreKey::ActiveChats => persistence::encode(&self.contacts.visible_ids()),
            StoreKey::Messages => persistence::encode(&self.transcript.messages()),
            StoreKey::WorldEntries => persistence::encode(&self.world_entries),
            StoreKey::Stickers => persistence::encode(&self.stickers),
        }
    }

    /// Write one key to the store
    pub fn save_key(&self, store: &dyn KeyValueStore, key: StoreKey) -> Result<(), PersistenceError> {
        store.set(key.as_str(), self.encode_key(key)?)
    }

    /// Replace the settings
    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    /// Create a contact and make its conversation visible
    ///
    /// Returns `None` (and changes nothing) when the name is blank. A blank
    /// persona falls back to the default persona from settings.
    pub fn add_contact(&mut self, name: &str, avatar: &str, persona: &str) -> Option<ContactId> {
        if name.trim().is_empty() {
            return None;
        }
        let avatar = if avatar.trim().is_empty() {
            DEFAULT_AVATAR
        } else {
            avatar
        };
        let persona = if persona.trim().is_empty() {
            self.settings.default_persona.as_str()
        } else {
            persona
        };

        let contact = Contact::new(name.to_string(), avatar.to_string(), persona.to_string());
        let id = contact.id.clone();
        self.contacts.add(contact);
        Some(id)
    }

    /// Merge-patch a contact
    pub fn update_contact(&mut self, id: &str, patch: ContactPatch) -> Result<(), AppError> {
        if self.contacts.update(id, patch) {
            Ok(())
        } else {
            Err(AppError::ContactNotFound(id.to_string()))
        }
    }

    /// Delete a contact: its messages first, then the contact and its chat
    /// list entry. Returns the removed contact and the number of removed
    /// messages.
    pub fn delete_contact(&mut self, id: &str) -> Result<(Contact, usize), AppError> {
        if !self.contacts.contains(id) {
            return Err(AppError::ContactNotFound(id.to_string()));
        }
        let removed_messages = self.transcript.remove_conversation(id);
        let contact = self
            .contacts
            .remove(id)
            .ok_or_else(|| AppError::ContactNotFound(id.to_string()))?;
        self.typing.remove(id);
        Ok((contact, removed_messages))
    }

    /// Mark a conversation visible (idempotent)
    /// Returns true if it was not visible before
    pub fn open_conversation(&mut self, id: &str) -> Result<bool, AppError> {
        if !self.contacts.contains(id) {
            return Err(AppError::ContactNotFound(id.to_string()));
        }
        Ok(self.contacts.open(id))
    }

    /// Append the user message and the empty agent placeholder, and raise the
    /// typing flag. Returns `Ok(None)` while a turn of this conversation is
    /// still running.
    pub fn begin_turn(
        &mut self,
        conversation_id: &str,
        content: String,
        payload: MessagePayload,
    ) -> Result<Option<PendingTurn>, AppError> {
        if !self.contacts.contains(conversation_id) {
            return Err(AppError::ContactNotFound(conversation_id.to_string()));
        }
        if self.is_typing(conversation_id) {
            return Ok(None);
        }

        let user_message_id =
            self.transcript
                .push(conversation_id, Sender::User, content, payload);
        let agent_message_id = self.transcript.push(
            conversation_id,
            Sender::Agent,
            String::new(),
            MessagePayload::Text,
        );
        self.typing.insert(conversation_id.to_string());

        Ok(Some(PendingTurn {
            conversation_id: conversation_id.to_string(),
            user_message_id,
            agent_message_id,
        }))
    }

    /// Concatenate a streamed fragment onto the turn's placeholder
    /// Returns false once the placeholder is gone (contact deleted mid-turn)
    pub fn append_fragment(&mut self, turn: &PendingTurn, fragment: &str) -> bool {
        self.transcript
            .append_content(&turn.agent_message_id, fragment)
    }

    /// End a turn; `replacement` overwrites the placeholder content
    pub fn finish_turn(&mut self, turn: &PendingTurn, replacement: Option<String>) {
        if let Some(content) = replacement {
            self.transcript.set_content(&turn.agent_message_id, content);
        }
        self.typing.remove(&turn.conversation_id);
    }

    /// Whether the agent of a conversation is replying
    pub fn is_typing(&self, conversation_id: &str) -> bool {
        self.typing.contains(conversation_id)
    }

    /// Whether any agent is replying
    pub fn any_typing(&self) -> bool {
        !self.typing.is_empty()
    }

    /// Prepend a world-book entry
    pub fn add_world_entry(&mut self, entry: WorldEntry) {
        self.world_entries.insert(0, entry);
    }

    /// Delete a world-book entry
    pub fn delete_world_entry(&mut self, id: &str) -> Result<WorldEntry, AppError> {
        let index = self
            .world_entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| AppError::EntryNotFound(id.to_string()))?;
        Ok(self.world_entries.remove(index))
    }

    /// Entries whose title or category contain `query` (case-insensitive)
    pub fn search_world(&self, query: &str) -> Vec<&WorldEntry> {
        self.world_entries.iter().filter(|e| e.matches(query)).collect()
    }

    /// Prepend a sticker
    pub fn add_sticker(&mut self, url: String) {
        self.stickers.insert(0, url);
    }

    /// Messages whose contact no longer exists are unreachable; drop them
    fn drop_orphan_messages(&mut self) {
        let orphans: HashSet<String> = self
            .transcript
            .messages()
            .iter()
            .filter(|m| !self.contacts.contains(&m.conversation_id))
            .map(|m| m.conversation_id.clone())
            .collect();
        for conversation_id in orphans {
            let removed = self.transcript.remove_conversation(&conversation_id);
            tracing::warn!(
                conversation_id = %conversation_id,
                removed = removed,
                "Dropped messages of a missing contact"
            );
        }
    }
}
