//! Role vocabulary shared by the guards, the menu builder and the login flow.
//!
//! The backend (and older mock logins) send the role as a free-form string in
//! either French or English. [`resolve_role`] is the only place that string is
//! interpreted.

use serde::{Deserialize, Serialize};

/// Canonical role of a principal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizedRole {
    Admin,
    Trainer,
    Employee,
}

impl NormalizedRole {
    pub const ALL: [NormalizedRole; 3] = [
        NormalizedRole::Admin,
        NormalizedRole::Trainer,
        NormalizedRole::Employee,
    ];

    /// Raw role string written when this crate creates a principal itself
    /// (demo switch, local user creation).
    pub fn canonical_raw(&self) -> &'static str {
        match self {
            NormalizedRole::Admin => "admin",
            NormalizedRole::Trainer => "formateur",
            NormalizedRole::Employee => "employe",
        }
    }
}

impl core::fmt::Display for NormalizedRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NormalizedRole::Admin => f.write_str("admin"),
            NormalizedRole::Trainer => f.write_str("trainer"),
            NormalizedRole::Employee => f.write_str("employee"),
        }
    }
}

/// Raw role strings accepted from the backend.
pub const ROLE_SYNONYMS: &[(&str, NormalizedRole)] = &[
    ("admin", NormalizedRole::Admin),
    ("formateur", NormalizedRole::Trainer),
    ("trainer", NormalizedRole::Trainer),
    ("employe", NormalizedRole::Employee),
    ("employee", NormalizedRole::Employee),
];

/// Resolve a raw role string.
///
/// Exact, case-sensitive match; `None` means unknown (treated as logged out).
pub fn resolve_role(raw: Option<&str>) -> Option<NormalizedRole> {
    let raw = raw?;
    ROLE_SYNONYMS
        .iter()
        .find(|(name, _)| *name == raw)
        .map(|(_, role)| *role)
}
