//! World book service
//!
//! Lore entries with generated illustrations.

use crate::error::AppError;
use crate::session::SessionClient;
use crate::state::{AppStore, StoreKey, WorldEntry};
use tracing::info;
use uuid::Uuid;

/// World book operations over the shared store
#[derive(Clone)]
pub struct WorldBookService {
    store: AppStore,
    client: SessionClient,
}

impl WorldBookService {
    /// Create the service
    pub fn new(store: AppStore, client: SessionClient) -> Self {
        Self { store, client }
    }

    /// Add an entry, illustrated from its title and description
    ///
    /// # Returns
    /// * `None` - If the title is blank (nothing is added)
    /// * `Some(WorldEntry)` - The entry, now first in the book
    pub async fn add_entry(
        &self,
        title: &str,
        category: &str,
        description: &str,
    ) -> Option<WorldEntry> {
        if title.trim().is_empty() {
            return None;
        }

        // Generation never fails; it degrades to a placeholder URL
        let image_url = self
            .client
            .generate_image(&format!("{} {}", title, description))
            .await;

        let entry = WorldEntry {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            category: category.to_string(),
            description: description.to_string(),
            image_url: Some(image_url),
        };

        self.store
            .mutate(&[StoreKey::WorldEntries], |state| {
                state.add_world_entry(entry.clone())
            })
            .await;
        info!(entry_id = %entry.id, title = %entry.title, "World entry added");
        Some(entry)
    }

    /// Delete an entry
    pub async fn delete_entry(&self, id: &str) -> Result<WorldEntry, AppError> {
        self.store
            .mutate(&[StoreKey::WorldEntries], |state| state.delete_world_entry(id))
            .await
    }

    /// Entries whose title or category match `query`, case-insensitively
    pub async fn search(&self, query: &str) -> Vec<WorldEntry> {
        self.store
            .read(|state| state.search_world(query).into_iter().cloned().collect())
            .await
    }
}
