pub mod conversation;
pub mod message;
pub mod roster;

pub use conversation::{Conversation, RawParticipants};
pub use message::Message;
pub use roster::{Role, Roster, ViewerRole};
