use serde::{Deserialize, Serialize};

/// The normalized ordered pair of participant display names for a
/// conversation. `primary` is the staff-side participant, `secondary` the
/// counterpart (e.g. the employee). Both are trimmed and non-empty; a missing
/// `secondary` is the per-slot unresolved state, which each caller handles
/// according to its own fallback chain.
///
/// `Option<Roster>` is the crate-wide "Unresolved" sentinel: normalization
/// either yields a usable roster or nothing, never a raw encoded string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub primary: String,
    pub secondary: Option<String>,
}

impl Roster {
    pub fn new(primary: impl Into<String>, secondary: Option<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary,
        }
    }

    /// The name stored in the given roster slot, if that slot resolved.
    pub fn name_for(&self, role: Role) -> Option<&str> {
        match role {
            Role::Primary => Some(self.primary.as_str()),
            Role::Secondary => self.secondary.as_deref(),
            Role::Unknown => None,
        }
    }
}

/// Classification of a message sender against a conversation roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Primary,
    Secondary,
    Unknown,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Primary => write!(f, "primary"),
            Role::Secondary => write!(f, "secondary"),
            Role::Unknown => write!(f, "unknown"),
        }
    }
}

/// Which roster slot the running application considers "self". The HR
/// dashboard runs as `Primary`, the employee app as `Secondary`. This is a
/// fixed per-application choice supplied through configuration — it is never
/// inferred per message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewerRole {
    Primary,
    Secondary,
}

impl ViewerRole {
    pub fn role(&self) -> Role {
        match self {
            ViewerRole::Primary => Role::Primary,
            ViewerRole::Secondary => Role::Secondary,
        }
    }

    /// The role of the other party from this viewer's perspective.
    pub fn counterpart(&self) -> Role {
        match self {
            ViewerRole::Primary => Role::Secondary,
            ViewerRole::Secondary => Role::Primary,
        }
    }
}

impl std::str::FromStr for ViewerRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(ViewerRole::Primary),
            "secondary" => Ok(ViewerRole::Secondary),
            other => Err(format!("unknown viewer role: {other}")),
        }
    }
}
