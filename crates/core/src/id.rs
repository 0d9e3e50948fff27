//! Strongly-typed numeric identifiers.
//!
//! The backend (and the local mock store) assigns plain integer ids; the
//! newtypes keep a team id from being passed where a user id is expected.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a user account.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

/// Identifier of a team (`equipe`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(u64);

/// Identifier of a formation (training session).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormationId(u64);

/// Identifier of a formation/user enrollment record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(u64);

/// Identifier of an attendance record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttendanceId(u64);

macro_rules! impl_numeric_id {
    ($t:ty, $name:literal) => {
        impl $t {
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn get(&self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<u64> for $t {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for u64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(raw))
            }
        }
    };
}

impl_numeric_id!(UserId, "UserId");
impl_numeric_id!(TeamId, "TeamId");
impl_numeric_id!(FormationId, "FormationId");
impl_numeric_id!(ParticipantId, "ParticipantId");
impl_numeric_id!(AttendanceId, "AttendanceId");
