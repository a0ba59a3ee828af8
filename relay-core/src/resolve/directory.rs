//! Conversation directory: the derived list both apps render, with the
//! display-name fallback chain for conversations whose roster is unusable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::config::{DisplayConfig, ResolverConfig};
use crate::models::{Conversation, Roster};

use super::display::truncate_chars;
use super::roster::{looks_encoded, normalize_roster, participant_list};

/// One row of the conversation directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub id: String,
    pub display_name: String,
    pub last_message: Option<String>,
    pub last_message_timestamp: Option<DateTime<Utc>>,
    pub last_message_sender_id: Option<String>,
    pub roster: Option<Roster>,
}

/// Build the directory from raw conversation records.
///
/// Duplicate ids are collapsed, preferring the copy with a resolved (and
/// newer) timestamp. Every surviving conversation produces an entry: a
/// placeholder name is always preferred to hiding a conversation. Entries are
/// ordered by last-message timestamp descending, with unresolved timestamps
/// sorting last.
pub fn build_directory(
    conversations: &[Conversation],
    resolver: &ResolverConfig,
    display: &DisplayConfig,
) -> Vec<DirectoryEntry> {
    let mut entries: Vec<DirectoryEntry> = Vec::with_capacity(conversations.len());
    let mut by_id: HashMap<String, usize> = HashMap::new();

    for conversation in conversations {
        let entry = DirectoryEntry {
            id: conversation.id.clone(),
            display_name: resolve_display_name(conversation, resolver, display),
            last_message: conversation.last_message.clone(),
            last_message_timestamp: conversation.last_message_timestamp,
            last_message_sender_id: conversation.last_message_sender_id.clone(),
            roster: normalize_roster(conversation.participant_names.as_ref()),
        };

        if entry.id.is_empty() {
            entries.push(entry);
            continue;
        }

        match by_id.get(&entry.id) {
            Some(&index) => {
                if prefers(&entry, &entries[index]) {
                    entries[index] = entry;
                }
            }
            None => {
                by_id.insert(entry.id.clone(), entries.len());
                entries.push(entry);
            }
        }
    }

    entries.sort_by(|a, b| b.last_message_timestamp.cmp(&a.last_message_timestamp));
    entries
}

/// Duplicate-id tie break: a resolved timestamp beats an unresolved one, a
/// newer resolved timestamp beats an older one.
fn prefers(candidate: &DirectoryEntry, existing: &DirectoryEntry) -> bool {
    match (candidate.last_message_timestamp, existing.last_message_timestamp) {
        (Some(_), None) => true,
        (Some(a), Some(b)) => a > b,
        _ => false,
    }
}

/// The counterpart (employee-side) display name, resolved through the
/// fallback chain. The chain order is a behavioral contract: reordering it
/// changes which label a user sees for the same stored data.
fn resolve_display_name(
    conversation: &Conversation,
    resolver: &ResolverConfig,
    display: &DisplayConfig,
) -> String {
    let raw = conversation.participant_names.as_ref();

    // 1. Roster secondary slot.
    if let Some(roster) = normalize_roster(raw) {
        if let Some(secondary) = roster.secondary.as_deref() {
            if !secondary.is_empty() && !looks_encoded(secondary) {
                return secondary.to_string();
            }
        }
    }

    // 2. First working-roster entry that is not recognizably staff-side.
    if let Some(name) = participant_list(raw).into_iter().find(|entry| {
        entry != &resolver.primary_sender_id
            && !(!resolver.primary_marker.is_empty() && entry.contains(&resolver.primary_marker))
            && !looks_encoded(entry)
    }) {
        debug!(id = %conversation.id, "directory name from filtered roster");
        return name;
    }

    // 3. Slug-convention id.
    if let Some(name) = name_from_slug(&conversation.id) {
        debug!(id = %conversation.id, "directory name from id slug");
        return name;
    }

    // 4. Heuristic scan of the last message text.
    if let Some(name) = conversation
        .last_message
        .as_deref()
        .and_then(|text| name_from_text(text, resolver))
    {
        debug!(id = %conversation.id, "directory name from message text");
        return name;
    }

    // 5. Literal placeholder.
    if conversation.id.is_empty() {
        display.placeholder_title.clone()
    } else {
        truncate_chars(&conversation.id, display.id_placeholder_len)
    }
}

/// Extract a name from a `prefix_token_token` slug id: drop the prefix,
/// title-case the remaining tokens, join with spaces.
pub fn name_from_slug(id: &str) -> Option<String> {
    let mut parts = id.split('_').filter(|p| !p.is_empty());
    parts.next()?; // slug prefix

    let name = parts.map(title_case).collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Best-effort, lossy by construction: scan message text for a capitalized
/// name following a greeting token, or failing that, the first capitalized
/// run anywhere that is not recognizably staff-side.
pub fn name_from_text(text: &str, resolver: &ResolverConfig) -> Option<String> {
    let words: Vec<&str> = text
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '\''))
        .filter(|w| !w.is_empty())
        .collect();

    if let Some(at) = words.iter().position(|w| is_greeting(w)) {
        if let Some(name) = capitalized_run(&words[at + 1..]) {
            return Some(name);
        }
    }

    for start in 0..words.len() {
        if is_greeting(words[start]) {
            continue;
        }
        if let Some(name) = capitalized_run(&words[start..]) {
            if name != resolver.primary_sender_id
                && !(!resolver.primary_marker.is_empty()
                    && name.contains(&resolver.primary_marker))
            {
                return Some(name);
            }
        }
    }

    None
}

fn is_greeting(word: &str) -> bool {
    matches!(
        word.to_ascii_lowercase().as_str(),
        "hello" | "hi" | "hey" | "dear"
    )
}

fn is_capitalized(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.is_uppercase() && chars.all(|c| c.is_alphabetic() || c == '-' || c == '\''),
        None => false,
    }
}

/// Up to two consecutive capitalized words starting at the front of `words`.
fn capitalized_run(words: &[&str]) -> Option<String> {
    let run: Vec<&str> = words
        .iter()
        .take_while(|w| is_capitalized(w))
        .take(2)
        .copied()
        .collect();
    if run.is_empty() {
        None
    } else {
        Some(run.join(" "))
    }
}

fn title_case(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}
