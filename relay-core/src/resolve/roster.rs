//! Roster normalization: the ingestion boundary for the loosely-typed
//! `participantNames` field.
//!
//! Production data carries the same logical pair `[primary, secondary]` in
//! three encodings: a proper array, a JSON-encoded string, and an array whose
//! first element is itself JSON-encoded (a double-write artifact). Everything
//! downstream works with the strict [`Roster`] produced here; the raw shape
//! must not leak past this module.

use tracing::{debug, warn};

use crate::models::{RawParticipants, Roster};

/// Normalize a raw `participantNames` value into an ordered pair of display
/// names, or `None` when no usable roster can be recovered.
///
/// Precedence, first match wins:
/// 1. sequence whose first element is JSON-encoded: decode it, use the decoded
///    pair when it has at least two entries, otherwise the outer sequence;
/// 2. plain sequence;
/// 3. JSON-encoded string: decode or give up;
/// 4. anything else is unresolvable.
///
/// Parse failures degrade to the next step and never surface as errors; the
/// same malformed data fails the same way deterministically, so there is
/// nothing to retry. A primary that still looks encoded after extraction is
/// re-parsed once; if it remains encoded the roster is unresolvable, so an
/// encoded artifact can never be shown or compared against sender ids.
pub fn normalize_roster(raw: Option<&RawParticipants>) -> Option<Roster> {
    let list = working_list(raw?)?;

    let primary = list.first().map(|s| s.trim().to_string())?;
    if primary.is_empty() {
        return None;
    }
    let secondary = list
        .get(1)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    if !looks_encoded(&primary) {
        return Some(Roster { primary, secondary });
    }

    // Double-encoding not fully unwound; one retry on the artifact itself.
    warn!(artifact = %primary, "roster primary still encoded, retrying parse");
    let reparsed = parse_string_array(&primary)?;
    let primary = reparsed.first().map(|s| s.trim().to_string())?;
    if primary.is_empty() || looks_encoded(&primary) {
        return None;
    }
    let secondary = reparsed
        .get(1)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or(secondary);

    Some(Roster { primary, secondary })
}

/// The full working roster as trimmed, non-empty strings. Used by the
/// directory's filter fallback, which needs every slot rather than just the
/// leading pair.
pub fn participant_list(raw: Option<&RawParticipants>) -> Vec<String> {
    raw.and_then(working_list)
        .unwrap_or_default()
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Whether a resolved name is still a JSON-encoding artifact rather than a
/// human display name.
pub fn looks_encoded(name: &str) -> bool {
    name.starts_with('[') || name.contains("\", \"")
}

/// Steps 1-3 of the normalization chain: recover the working sequence the
/// pair is read from, without any per-slot cleanup.
fn working_list(raw: &RawParticipants) -> Option<Vec<String>> {
    match raw {
        RawParticipants::List(items) => {
            let first = items.first()?;
            if first.trim_start().starts_with('[') {
                match parse_string_array(first) {
                    Some(parsed) if parsed.len() >= 2 => return Some(parsed),
                    _ => {
                        debug!("first roster element looked encoded but did not decode, using outer sequence");
                    }
                }
            }
            Some(items.clone())
        }
        RawParticipants::Text(text) => {
            if text.trim_start().starts_with('[') {
                parse_string_array(text)
            } else {
                None
            }
        }
        RawParticipants::Other(_) => None,
    }
}

/// Parse a JSON array of strings; any other shape (non-array, non-string
/// elements, invalid JSON) yields `None`.
fn parse_string_array(text: &str) -> Option<Vec<String>> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "roster JSON parse failed");
            None
        }
    }
}
