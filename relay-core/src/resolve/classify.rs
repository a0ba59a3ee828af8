//! Sender-role classification against a conversation roster.

use crate::config::ResolverConfig;
use crate::models::{Role, Roster, ViewerRole};

/// Classify a message sender against the roster.
///
/// The order of checks is load-bearing: a resolvable roster is authoritative,
/// so exact-match checks run before the legacy marker/constant checks, which
/// exist only for conversations that predate the roster convention.
/// Reordering them misattributes messages in old data.
pub fn classify(sender_id: &str, roster: &Roster, config: &ResolverConfig) -> Role {
    let sender = sender_id.trim();

    if sender == roster.primary {
        return Role::Primary;
    }
    if roster.secondary.as_deref() == Some(sender) {
        return Role::Secondary;
    }
    if !config.primary_marker.is_empty() && sender.contains(&config.primary_marker) {
        return Role::Primary;
    }
    if sender == config.primary_sender_id {
        return Role::Primary;
    }

    Role::Unknown
}

/// Whether a message was sent by the local viewer. The viewer's role is fixed
/// per application context (HR dashboard = primary, employee app =
/// secondary), never inferred per message.
pub fn is_own_message(
    sender_id: &str,
    roster: &Roster,
    config: &ResolverConfig,
    viewer: ViewerRole,
) -> bool {
    classify(sender_id, roster, config) == viewer.role()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        Roster::new("Sarah Connor (HR)", Some("Alice Johnson".to_string()))
    }

    #[test]
    fn test_exact_matches() {
        let config = ResolverConfig::default();
        assert_eq!(
            classify("Sarah Connor (HR)", &roster(), &config),
            Role::Primary
        );
        assert_eq!(
            classify("Alice Johnson", &roster(), &config),
            Role::Secondary
        );
        assert_eq!(classify("unknown_user", &roster(), &config), Role::Unknown);
    }

    #[test]
    fn test_roster_beats_legacy_marker() {
        // A secondary name containing the marker must still classify as
        // secondary: the roster exact match runs first.
        let config = ResolverConfig::default();
        let tricky = Roster::new(
            "Sarah Connor (HR)",
            Some("Bob (HR) Impersonator".to_string()),
        );
        assert_eq!(
            classify("Bob (HR) Impersonator", &tricky, &config),
            Role::Secondary
        );
    }

    #[test]
    fn test_legacy_marker_fallback() {
        let config = ResolverConfig::default();
        assert_eq!(
            classify("Dana Reyes (HR)", &roster(), &config),
            Role::Primary
        );
    }

    #[test]
    fn test_legacy_constant_fallback() {
        let config = ResolverConfig::default();
        assert_eq!(classify("hr_admin", &roster(), &config), Role::Primary);

        let custom = ResolverConfig {
            primary_marker: "(Staff)".to_string(),
            primary_sender_id: "staff_console".to_string(),
        };
        assert_eq!(classify("hr_admin", &roster(), &custom), Role::Unknown);
        assert_eq!(classify("staff_console", &roster(), &custom), Role::Primary);
    }

    #[test]
    fn test_sender_whitespace_is_trimmed() {
        let config = ResolverConfig::default();
        assert_eq!(
            classify("  Alice Johnson ", &roster(), &config),
            Role::Secondary
        );
    }

    #[test]
    fn test_classify_is_pure() {
        let config = ResolverConfig::default();
        let r = roster();
        let first = classify("Alice Johnson", &r, &config);
        let second = classify("Alice Johnson", &r, &config);
        assert_eq!(first, second);
        assert_eq!(r, roster());
    }

    #[test]
    fn test_is_own_message_per_viewer() {
        let config = ResolverConfig::default();
        assert!(is_own_message(
            "Alice Johnson",
            &roster(),
            &config,
            ViewerRole::Secondary
        ));
        assert!(!is_own_message(
            "Alice Johnson",
            &roster(),
            &config,
            ViewerRole::Primary
        ));
        assert!(!is_own_message(
            "unknown_user",
            &roster(),
            &config,
            ViewerRole::Primary
        ));
    }
}
