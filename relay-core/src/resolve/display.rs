//! Conversation-level display derivation: title and last-message prefix.

use crate::config::{DisplayConfig, ResolverConfig};
use crate::models::{Conversation, Role, ViewerRole};

use super::classify::classify;
use super::roster::{looks_encoded, normalize_roster};

/// UI-facing fields derived from a conversation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationDisplay {
    pub title: String,
    pub last_message_prefix: String,
}

/// Derive the conversation title and last-message prefix for the given
/// viewing application.
///
/// The title shows the *other* party: the employee app shows the staff
/// (primary) name, the HR dashboard shows the employee (secondary) name.
/// Fallbacks: counterpart roster slot, then the legacy `employeeName` field
/// when it is not itself an encoded artifact, then the placeholder title.
///
/// The prefix is empty unless both a last sender and a resolvable roster are
/// present; own messages get `"You: "`, counterpart messages get the name
/// truncated to `prefix_name_len`, unknown senders get no prefix.
pub fn derive_display(
    conversation: &Conversation,
    viewer: ViewerRole,
    resolver: &ResolverConfig,
    display: &DisplayConfig,
) -> ConversationDisplay {
    let roster = normalize_roster(conversation.participant_names.as_ref());

    let title = roster
        .as_ref()
        .and_then(|r| r.name_for(viewer.counterpart()))
        .filter(|name| !name.is_empty() && !looks_encoded(name))
        .map(|name| name.to_string())
        .or_else(|| {
            conversation
                .employee_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty() && !looks_encoded(name))
                .map(|name| name.to_string())
        })
        .unwrap_or_else(|| display.placeholder_title.clone());

    let last_message_prefix = match (&conversation.last_message_sender_id, &roster) {
        (Some(sender_id), Some(roster)) => {
            let role = classify(sender_id, roster, resolver);
            if role == viewer.role() {
                "You: ".to_string()
            } else if role == Role::Unknown {
                String::new()
            } else {
                match roster.name_for(role) {
                    Some(name) => {
                        format!(
                            "{}: ",
                            truncate_with_ellipsis(name, display.prefix_name_len)
                        )
                    }
                    None => String::new(),
                }
            }
        }
        _ => String::new(),
    };

    ConversationDisplay {
        title,
        last_message_prefix,
    }
}

/// Truncate to `max_chars` characters, appending an ellipsis only when
/// truncation actually occurred. Operates on chars, never mid-codepoint.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let truncated: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{truncated}…")
    } else {
        truncated
    }
}

/// Plain char-boundary cut with no ellipsis; used for the stored
/// last-message preview, where the bound is a storage rule rather than a
/// display rule.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
