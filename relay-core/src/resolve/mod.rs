//! The participant-name resolution protocol: normalization of the
//! loosely-typed roster field, sender-role classification, and the display
//! derivations both apps build on top of them. Everything here is pure and
//! synchronous — cheap enough to run on every delivered snapshot.

pub mod classify;
pub mod directory;
pub mod display;
pub mod roster;

pub use classify::{classify, is_own_message};
pub use directory::{build_directory, name_from_slug, name_from_text, DirectoryEntry};
pub use display::{derive_display, truncate_chars, truncate_with_ellipsis, ConversationDisplay};
pub use roster::{looks_encoded, normalize_roster, participant_list};
