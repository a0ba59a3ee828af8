//! Message feed: turns full-snapshot deliveries from the store into a stable,
//! display-ready message sequence.
//!
//! The store pushes complete snapshots on every change, and a freshly-written
//! message can arrive with its server timestamp still unassigned. The feed
//! keeps such pending messages hidden until a snapshot resolves them,
//! deduplicates by id (preferring the resolved delivery when duplicates
//! disagree), and never reorders messages that are already on screen: a newly
//! unhidden message is placed at its timestamp-sorted position exactly once.

use std::collections::HashMap;

use tracing::debug;

use crate::models::Message;

#[derive(Debug, Default)]
pub struct MessageFeed {
    visible: Vec<Message>,
}

impl MessageFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a full snapshot. Returns the number of newly unhidden messages.
    pub fn apply_snapshot(&mut self, snapshot: Vec<Message>) -> usize {
        let mut latest: HashMap<String, Message> = HashMap::new();
        let mut pending = 0usize;
        for message in snapshot {
            match latest.get(&message.id) {
                Some(existing) if existing.timestamp.is_some() && message.is_pending() => {
                    // Duplicate delivery disagreeing on resolution; keep the
                    // resolved copy.
                }
                _ => {
                    if message.is_pending() {
                        pending += 1;
                    }
                    latest.insert(message.id.clone(), message);
                }
            }
        }
        if pending > 0 {
            debug!(pending, "snapshot contains pending messages, holding them back");
        }

        // Snapshots are authoritative: drop visible messages that vanished.
        self.visible.retain(|m| latest.contains_key(&m.id));

        // Update already-visible messages in place; display order is frozen.
        for message in &mut self.visible {
            if let Some(update) = latest.remove(&message.id) {
                if !update.is_pending() {
                    *message = update;
                }
            }
        }

        // Unhide newly resolved messages at their sorted positions.
        let mut fresh: Vec<Message> = latest
            .into_values()
            .filter(|m| !m.is_pending())
            .collect();
        fresh.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        let unhidden = fresh.len();
        for message in fresh {
            let at = self
                .visible
                .iter()
                .position(|m| m.timestamp > message.timestamp)
                .unwrap_or(self.visible.len());
            self.visible.insert(at, message);
        }
        unhidden
    }

    /// The ordered, display-ready sequence.
    pub fn messages(&self) -> &[Message] {
        &self.visible
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Drop all state, e.g. when switching conversations.
    pub fn clear(&mut self) {
        self.visible.clear();
    }
}
