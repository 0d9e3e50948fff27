//! Attendance tracking (`/api/attendance`).

use std::sync::Arc;

use formadmin_core::{AttendanceFilter, AttendanceId, AttendanceRecord, DomainError, MarkAttendance};

use crate::error::ShimError;
use crate::offline::OfflineMode;
use crate::remote::{ApiRequest, Remote, fetch};
use crate::repository::with_fallback;
use crate::store::MockDb;

const RESOURCE: &str = "attendance";

#[derive(Clone)]
pub struct AttendanceService {
    remote: Arc<dyn Remote>,
    db: Arc<MockDb>,
    offline: Arc<OfflineMode>,
}

impl AttendanceService {
    pub fn new(remote: Arc<dyn Remote>, db: Arc<MockDb>, offline: Arc<OfflineMode>) -> Self {
        Self { remote, db, offline }
    }

    pub async fn list(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>, ShimError> {
        let request = ApiRequest::get(format!("attendance/formation/{}", filter.formation_id))
            .with_query(filter.query());
        with_fallback(
            &self.offline,
            RESOURCE,
            "list",
            fetch(self.remote.as_ref(), request),
            || {
                Ok(self
                    .db
                    .attendance
                    .snapshot()
                    .into_iter()
                    .filter(|r| filter.matches(r))
                    .collect())
            },
        )
        .await
    }

    /// Record attendance for one user on one day. Marking the same
    /// (formation, user, day) again replaces the previous status.
    pub async fn mark(&self, mark: MarkAttendance) -> Result<AttendanceRecord, ShimError> {
        let request = ApiRequest::post("attendance").with_json(&mark)?;
        with_fallback(
            &self.offline,
            RESOURCE,
            "mark",
            fetch(self.remote.as_ref(), request),
            || self.mark_locally(mark),
        )
        .await
    }

    fn mark_locally(&self, mark: MarkAttendance) -> Result<AttendanceRecord, ShimError> {
        let db = self.db.as_ref();
        if db.formations.find(mark.formation_id.get()).is_none() {
            return Err(DomainError::not_found("formation", mark.formation_id.get()).into());
        }
        if db.users.find(mark.user_id.get()).is_none() {
            return Err(DomainError::not_found("user", mark.user_id.get()).into());
        }

        let (status, comment) = (mark.status, mark.comment.clone());
        Ok(db.attendance.upsert_where(
            |r| r.same_slot(&mark),
            |r| {
                r.status = status;
                r.comment = comment;
            },
            |id| AttendanceRecord {
                id: AttendanceId::new(id),
                formation_id: mark.formation_id,
                user_id: mark.user_id,
                date: mark.date,
                status: mark.status,
                comment: mark.comment.clone(),
            },
        ))
    }
}
