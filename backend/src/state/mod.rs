// State management module
// Handles application state, contacts, transcript, and persistence

pub mod app_state;
pub mod message;
pub mod models;
pub mod persistence;
pub mod registry;
pub mod store;
pub mod transcript;

pub use app_state::{AppState, PendingTurn};
pub use message::{
    GiftData, LocationData, Message, MessageId, MessagePayload, Sender, TransferData,
};
pub use models::{Contact, ContactId, ContactPatch, Settings, Theme, WorldEntry};
pub use persistence::{JsonFileStore, KeyValueStore, MemoryStore, PersistenceError, StoreKey};
pub use registry::ContactRegistry;
pub use store::AppStore;
pub use transcript::Transcript;
