//! Chat message model
//!
//! Messages carry a display `content` plus a payload tagged by kind.

use serde::{Deserialize, Serialize};

/// Unique identifier for a message
pub type MessageId = String;

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The phone's owner
    User,
    /// The generative contact
    Agent,
}

/// Money transfer details, kept exactly as the user typed them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferData {
    /// Amount as entered (validated numeric)
    pub amount: String,
    /// Free-form note
    pub note: String,
    /// Whether the transfer was received rather than sent
    #[serde(default)]
    pub is_received: bool,
}

/// Shared location details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    /// Human-readable address
    pub address: String,
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub lng: f64,
}

/// Gift details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftData {
    /// Gift name
    pub item: String,
    /// Emoji or image reference
    pub image: String,
}

/// Kind-specific message data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MessagePayload {
    /// Plain text; the text is the message content
    #[default]
    Text,
    /// Money transfer
    Transfer(TransferData),
    /// Sticker image
    Sticker {
        /// Sticker image reference
        url: String,
    },
    /// Photo
    Image {
        /// Data URL of the photo
        url: String,
    },
    /// Shared location
    Location(LocationData),
    /// Gift
    Gift(GiftData),
    /// Voice call
    Call,
}

impl MessagePayload {
    /// Kind name as stored
    pub fn kind(&self) -> &'static str {
        match self {
            MessagePayload::Text => "text",
            MessagePayload::Transfer(_) => "transfer",
            MessagePayload::Sticker { .. } => "sticker",
            MessagePayload::Image { .. } => "image",
            MessagePayload::Location(_) => "location",
            MessagePayload::Gift(_) => "gift",
            MessagePayload::Call => "call",
        }
    }
}

/// A single transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique, monotonically increasing identifier
    pub id: MessageId,
    /// Contact this message belongs to
    pub conversation_id: String,
    /// Author
    pub sender: Sender,
    /// Display text
    pub content: String,
    /// Kind-specific data
    #[serde(default)]
    pub payload: MessagePayload,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
}
