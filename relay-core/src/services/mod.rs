pub mod directory;
pub mod messages;

pub use directory::DirectoryService;
pub use messages::MessageService;

/// Root collection holding conversation documents.
pub const CONVERSATIONS: &str = "conversations";

/// Subcollection path for one conversation's messages.
pub fn messages_path(conversation_id: &str) -> String {
    format!("{CONVERSATIONS}/{conversation_id}/messages")
}
