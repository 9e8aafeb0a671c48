// Transcript
// Ordered list of messages for every conversation, with targeted in-place updates

use super::message::{Message, MessageId, MessagePayload, Sender};
use chrono::Utc;

/// Hands out time-based message ids that never repeat or go backwards
#[derive(Debug, Clone, Default, PartialEq)]
struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    fn next(&mut self, now_millis: i64) -> i64 {
        self.last = now_millis.max(self.last + 1);
        self.last
    }
}

/// All messages of all conversations, in arrival order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
    ids: IdGenerator,
}

impl Transcript {
    /// Rebuild a transcript from persisted messages
    pub fn from_messages(messages: Vec<Message>) -> Self {
        let last = messages
            .iter()
            .filter_map(|m| m.id.parse::<i64>().ok())
            .max()
            .unwrap_or(0);
        Self {
            messages,
            ids: IdGenerator { last },
        }
    }

    /// Append a new message with a fresh id and the current time
    /// Returns the id of the new message
    pub fn push(
        &mut self,
        conversation_id: &str,
        sender: Sender,
        content: String,
        payload: MessagePayload,
    ) -> MessageId {
        let now = Utc::now().timestamp_millis();
        let id = self.ids.next(now).to_string();
        self.messages.push(Message {
            id: id.clone(),
            conversation_id: conversation_id.to_string(),
            sender,
            content,
            payload,
            timestamp: now,
        });
        id
    }

    /// Get a message by ID
    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Concatenate a fragment onto a message's content
    /// Returns true if the message was found
    pub fn append_content(&mut self, id: &str, fragment: &str) -> bool {
        match self.get_mut(id) {
            Some(message) => {
                message.content.push_str(fragment);
                true
            }
            None => false,
        }
    }

    /// Replace a message's content
    /// Returns true if the message was found
    pub fn set_content(&mut self, id: &str, content: String) -> bool {
        match self.get_mut(id) {
            Some(message) => {
                message.content = content;
                true
            }
            None => false,
        }
    }

    /// Remove every message of a conversation
    /// Returns the number of removed messages
    pub fn remove_conversation(&mut self, conversation_id: &str) -> usize {
        let before = self.messages.len();
        self.messages.retain(|m| m.conversation_id != conversation_id);
        before - self.messages.len()
    }

    /// Messages of one conversation, in order
    pub fn conversation(&self, conversation_id: &str) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .collect()
    }

    /// Most recent message of a conversation (chat list preview)
    pub fn last_message(&self, conversation_id: &str) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.conversation_id == conversation_id)
    }

    /// All messages, in order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get the number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether there are no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }
}
