//! Denormalized relation snapshots embedded in records for display.
//!
//! A snapshot is copied at the time the referencing record was last written
//! and may be stale relative to the referenced record.

use serde::{Deserialize, Serialize};

use crate::{TeamId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSnapshot {
    pub id: TeamId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speciality: Option<String>,
}

/// Display fields of a user (trainer of a formation, enrolled participant).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonSnapshot {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}
