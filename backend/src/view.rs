// Screen/view controller
// Which screen is in front, and where the chat app is within its own views

use crate::state::ContactId;

/// Top-level screens of the phone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppScreen {
    /// Launcher with the app icons
    #[default]
    Home,
    /// Chat app
    Chat,
    /// World book
    WorldBook,
    /// Settings
    Settings,
}

/// Tabs of the chat app's main view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MainTab {
    /// Visible conversations
    #[default]
    Chats,
    /// Full directory
    Contacts,
    /// Discover page
    Discover,
    /// Own profile
    Me,
}

/// Views inside the chat app
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatView {
    /// Tabbed main view
    Main(MainTab),
    /// One open conversation
    Conversation(ContactId),
    /// New contact form
    AddContact,
}

impl Default for ChatView {
    fn default() -> Self {
        ChatView::Main(MainTab::default())
    }
}

/// Navigation state of the phone
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Navigator {
    screen: AppScreen,
    chat_view: ChatView,
}

impl Navigator {
    /// Start on the home screen
    pub fn new() -> Self {
        Self::default()
    }

    /// Screen in front
    pub fn screen(&self) -> AppScreen {
        self.screen
    }

    /// Current view of the chat app (kept while other apps are in front)
    pub fn chat_view(&self) -> &ChatView {
        &self.chat_view
    }

    /// Contact of the open conversation, if any
    pub fn active_contact(&self) -> Option<&ContactId> {
        match &self.chat_view {
            ChatView::Conversation(id) => Some(id),
            _ => None,
        }
    }

    /// Bring an app to the front
    pub fn open_app(&mut self, screen: AppScreen) {
        self.screen = screen;
    }

    /// Back to the launcher
    pub fn home(&mut self) {
        self.screen = AppScreen::Home;
    }

    /// Switch the chat app's main tab
    pub fn select_tab(&mut self, tab: MainTab) {
        self.screen = AppScreen::Chat;
        self.chat_view = ChatView::Main(tab);
    }

    /// Open a conversation; the caller also marks it visible in the store
    pub fn open_conversation(&mut self, contact_id: impl Into<ContactId>) {
        self.screen = AppScreen::Chat;
        self.chat_view = ChatView::Conversation(contact_id.into());
    }

    /// Show the new contact form
    pub fn start_add_contact(&mut self) {
        self.screen = AppScreen::Chat;
        self.chat_view = ChatView::AddContact;
    }

    /// A contact was added: back to the chat list
    pub fn contact_added(&mut self) {
        self.select_tab(MainTab::Chats);
    }

    /// A contact was deleted: leave its conversation if it was open
    pub fn contact_deleted(&mut self, contact_id: &str) {
        if self.active_contact().map(String::as_str) == Some(contact_id) {
            self.chat_view = ChatView::Main(MainTab::Chats);
        }
    }

    /// Back from a conversation or form to the main view
    pub fn back(&mut self) {
        match self.chat_view {
            ChatView::Main(_) => self.home(),
            _ => self.chat_view = ChatView::Main(MainTab::Chats),
        }
    }
}
