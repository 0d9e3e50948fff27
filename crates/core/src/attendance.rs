//! Attendance records (`/api/attendance/*`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{AttendanceId, FormationId, UserId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: AttendanceId,
    pub formation_id: FormationId,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl AttendanceRecord {
    /// Attendance is keyed on (formation, user, day).
    pub fn same_slot(&self, mark: &MarkAttendance) -> bool {
        self.formation_id == mark.formation_id && self.user_id == mark.user_id && self.date == mark.date
    }
}

/// Input for `POST /attendance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkAttendance {
    pub formation_id: FormationId,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceFilter {
    pub formation_id: FormationId,
    pub date: Option<NaiveDate>,
}

impl AttendanceFilter {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        self.date.iter().map(|d| ("date", d.to_string())).collect()
    }

    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        record.formation_id == self.formation_id && self.date.is_none_or(|d| d == record.date)
    }
}
