//! Application data models
//!
//! Contacts, settings and world-book entries. Messages live in `message`.

use crate::config::DEFAULT_CHAT_MODEL;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a contact (also the conversation id)
pub type ContactId = String;

/// Id of the contact every fresh install starts with
pub const DEFAULT_CONTACT_ID: &str = "default";

/// Persona used when a contact is created without one
pub const DEFAULT_PERSONA: &str =
    "You are a friendly and clever AI assistant living inside this futuristic smartphone.";

/// Avatar shown for new contacts and the user until they pick one
pub const DEFAULT_AVATAR: &str = "👤";

/// Colour theme of the phone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme
    Light,
    /// Dark theme
    #[default]
    Dark,
}

/// Process-wide user settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Name shown for the user
    pub display_name: String,
    /// Emoji or data-URL image
    pub avatar: String,
    /// Persona given to contacts created without one
    pub default_persona: String,
    /// Model id used for chat turns
    pub model: String,
    /// Colour theme
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            display_name: "Me".to_string(),
            avatar: DEFAULT_AVATAR.to_string(),
            default_persona: DEFAULT_PERSONA.to_string(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            theme: Theme::Dark,
        }
    }
}

/// A chat contact; its id doubles as the conversation id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Unique identifier
    pub id: ContactId,
    /// Display name
    pub name: String,
    /// Emoji or data-URL image
    pub avatar: String,
    /// System instruction conditioning the model for this contact
    pub persona: String,
}

impl Contact {
    /// Create a contact with a fresh id
    pub fn new(name: String, avatar: String, persona: String) -> Self {
        Self {
            id: Self::generate_id(),
            name,
            avatar,
            persona,
        }
    }

    /// The contact every fresh install starts with
    pub fn default_contact(persona: &str) -> Self {
        Self {
            id: DEFAULT_CONTACT_ID.to_string(),
            name: "Gemini AI".to_string(),
            avatar: "✨".to_string(),
            persona: persona.to_string(),
        }
    }

    /// Generate a new unique ID for a contact
    /// Uses UUID v4 for uniqueness
    pub fn generate_id() -> ContactId {
        Uuid::new_v4().to_string()
    }

    /// Apply a merge-patch
    pub fn apply(&mut self, patch: ContactPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(avatar) = patch.avatar {
            self.avatar = avatar;
        }
        if let Some(persona) = patch.persona {
            self.persona = persona;
        }
    }
}

/// Partial update of a contact; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ContactPatch {
    /// New display name
    pub name: Option<String>,
    /// New avatar
    pub avatar: Option<String>,
    /// New persona
    pub persona: Option<String>,
}

/// A world-book lore entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldEntry {
    /// Unique identifier
    pub id: String,
    /// Entry title
    pub title: String,
    /// Free-form category, e.g. "Location"
    pub category: String,
    /// Body text
    pub description: String,
    /// Generated illustration (data URL or placeholder URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl WorldEntry {
    /// The entry every fresh install starts with
    pub fn seed() -> Self {
        Self {
            id: "1".to_string(),
            title: "Neo Tokyo".to_string(),
            category: "Location".to_string(),
            description: "A cyberpunk metropolis built on the ruins of old Tokyo.".to_string(),
            image_url: Some("https://picsum.photos/seed/cyber/400/300".to_string()),
        }
    }

    /// Case-insensitive match on title or category
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query) || self.category.to_lowercase().contains(&query)
    }
}
