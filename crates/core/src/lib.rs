//! `formadmin-core`: shared vocabulary for the training-management client.
//!
//! This crate contains **pure** types (no IO): identifiers, the role synonym
//! table, entity models and the domain error.

pub mod attendance;
pub mod error;
pub mod formation;
pub mod id;
pub mod role;
pub mod snapshot;
pub mod statistics;
pub mod team;
pub mod user;

pub use attendance::{AttendanceFilter, AttendanceRecord, AttendanceStatus, MarkAttendance};
pub use error::{DomainError, DomainResult};
pub use formation::{
    Formation, FormationFilter, FormationParticipant, FormationPatch, FormationStatus, NewFormation,
    NewParticipant, RelationChange,
};
pub use id::{AttendanceId, FormationId, ParticipantId, TeamId, UserId};
pub use role::{NormalizedRole, ROLE_SYNONYMS, resolve_role};
pub use snapshot::{PersonSnapshot, TeamSnapshot};
pub use statistics::{DashboardStatistics, FormationStatusCounts};
pub use team::{NewTeam, Team, TeamPatch};
pub use user::{NewUser, User, UserFilter, UserPatch};
