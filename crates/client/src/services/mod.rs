//! Domain services used by pages.
//!
//! Plain CRUD goes through [`crate::ResilientRepository`]; these services
//! cover the endpoints that are not a flat resource.

pub mod attendance;
pub mod auth;
pub mod participants;
pub mod statistics;

pub use attendance::AttendanceService;
pub use auth::{AuthService, LoginOutcome, LoginResponse};
pub use participants::ParticipantService;
pub use statistics::StatisticsService;
