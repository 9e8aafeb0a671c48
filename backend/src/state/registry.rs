// Contact registry
// Holds the full directory and the subset of conversations shown in the chat list

use super::models::{Contact, ContactId, ContactPatch};

/// Directory of contacts plus the visibility set of the chat list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactRegistry {
    /// All contacts, in creation order
    contacts: Vec<Contact>,
    /// Ids shown in the chat list, in the order they became visible
    visible: Vec<ContactId>,
}

impl ContactRegistry {
    /// Build a registry from persisted parts
    /// Visible ids that no longer resolve to a contact are dropped
    pub fn from_parts(contacts: Vec<Contact>, visible: Vec<ContactId>) -> Self {
        let mut registry = Self {
            contacts,
            visible: Vec::new(),
        };
        for id in visible {
            registry.open(&id);
        }
        registry
    }

    /// Add a contact and make it visible
    /// Returns false if the ID already exists
    pub fn add(&mut self, contact: Contact) -> bool {
        if self.contains(&contact.id) {
            return false;
        }
        let id = contact.id.clone();
        self.contacts.push(contact);
        self.open(&id);
        true
    }

    /// Get a contact by ID
    pub fn get(&self, id: &str) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    /// Whether a contact with this ID exists
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Merge-patch a contact
    /// Returns true if the contact was found and updated
    pub fn update(&mut self, id: &str, patch: ContactPatch) -> bool {
        match self.contacts.iter_mut().find(|c| c.id == id) {
            Some(contact) => {
                contact.apply(patch);
                true
            }
            None => false,
        }
    }

    /// Remove a contact from the directory and the chat list
    /// Returns the removed contact if it existed
    pub fn remove(&mut self, id: &str) -> Option<Contact> {
        let index = self.contacts.iter().position(|c| c.id == id)?;
        self.visible.retain(|v| v != id);
        Some(self.contacts.remove(index))
    }

    /// Make a conversation visible (idempotent)
    /// Returns true only if the contact exists and was not visible yet
    pub fn open(&mut self, id: &str) -> bool {
        if !self.contains(id) || self.is_visible(id) {
            return false;
        }
        self.visible.push(id.to_string());
        true
    }

    /// Whether a conversation is shown in the chat list
    pub fn is_visible(&self, id: &str) -> bool {
        self.visible.iter().any(|v| v == id)
    }

    /// Full directory, in creation order
    pub fn directory(&self) -> &[Contact] {
        &self.contacts
    }

    /// Chat list: visible contacts, in directory order
    pub fn chat_list(&self) -> Vec<&Contact> {
        self.contacts
            .iter()
            .filter(|c| self.is_visible(&c.id))
            .collect()
    }

    /// Visible ids, for persistence
    pub fn visible_ids(&self) -> &[ContactId] {
        &self.visible
    }

    /// Get the number of contacts in the directory
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Whether the directory is empty
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(id: &str, name: &str) -> Contact {
        Contact {
            id: id.to_string(),
            name: name.to_string(),
            avatar: "🙂".to_string(),
            persona: "p".to_string(),
        }
    }

    #[test]
    fn test_add_makes_visible() {
        let mut registry = ContactRegistry::default();
        assert!(registry.add(contact("1", "Aria")));
        assert!(registry.is_visible("1"));
        assert_eq!(registry.len(), 1);
        assert!(!registry.add(contact("1", "Duplicate"))); // Duplicate ID should fail
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_open_is_idempotent() {
        let mut registry = ContactRegistry::from_parts(vec![contact("1", "Aria")], vec![]);
        assert!(!registry.is_visible("1"));
        assert!(registry.open("1"));
        assert!(!registry.open("1"));
        assert_eq!(registry.visible_ids(), &["1".to_string()]);
        assert!(!registry.open("missing"));
    }

    #[test]
    fn test_remove_clears_visibility() {
        let mut registry = ContactRegistry::default();
        registry.add(contact("1", "Aria"));
        registry.add(contact("2", "Ben"));

        let removed = registry.remove("1");
        assert_eq!(removed.map(|c| c.name), Some("Aria".to_string()));
        assert!(!registry.is_visible("1"));
        assert!(registry.get("1").is_none());
        assert!(registry.remove("1").is_none());
        assert_eq!(registry.visible_ids(), &["2".to_string()]);
    }

    #[test]
    fn test_update_merges() {
        let mut registry = ContactRegistry::default();
        registry.add(contact("1", "Aria"));
        assert!(registry.update(
            "1",
            ContactPatch {
                name: Some("Aria II".into()),
                ..Default::default()
            }
        ));
        assert_eq!(registry.get("1").unwrap().name, "Aria II");
        assert_eq!(registry.get("1").unwrap().avatar, "🙂");
        assert!(!registry.update("999", ContactPatch::default()));
    }

    #[test]
    fn test_chat_list_in_directory_order() {
        let mut registry = ContactRegistry::from_parts(
            vec![contact("1", "A"), contact("2", "B"), contact("3", "C")],
            vec!["3".into(), "1".into(), "ghost".into()],
        );
        let names: Vec<&str> = registry.chat_list().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
        // Unknown ids are dropped on load
        assert_eq!(registry.visible_ids().len(), 2);
        registry.open("2");
        assert_eq!(registry.chat_list().len(), 3);
    }
}
