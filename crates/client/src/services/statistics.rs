//! Dashboard counters.

use std::sync::Arc;

use formadmin_core::DashboardStatistics;

use crate::error::ShimError;
use crate::offline::OfflineMode;
use crate::remote::{ApiRequest, Remote, fetch};
use crate::repository::with_fallback;
use crate::store::MockDb;

#[derive(Clone)]
pub struct StatisticsService {
    remote: Arc<dyn Remote>,
    db: Arc<MockDb>,
    offline: Arc<OfflineMode>,
}

impl StatisticsService {
    pub fn new(remote: Arc<dyn Remote>, db: Arc<MockDb>, offline: Arc<OfflineMode>) -> Self {
        Self { remote, db, offline }
    }

    /// `GET /statistics/dashboard`, or the same counters computed over the
    /// local store.
    pub async fn dashboard(&self) -> Result<DashboardStatistics, ShimError> {
        with_fallback(
            &self.offline,
            "statistics",
            "dashboard",
            fetch(self.remote.as_ref(), ApiRequest::get("statistics/dashboard")),
            || {
                Ok(DashboardStatistics::compute(
                    &self.db.users.snapshot(),
                    &self.db.teams.snapshot(),
                    &self.db.formations.snapshot(),
                ))
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::test_support::ScriptedRemote;
    use serde_json::json;

    fn service(remote: ScriptedRemote) -> StatisticsService {
        StatisticsService::new(Arc::new(remote), Arc::new(MockDb::seeded()), Arc::new(OfflineMode::new()))
    }

    #[tokio::test]
    async fn computed_locally_when_backend_is_down() {
        let svc = service(ScriptedRemote::always(Err(RemoteError::from_status(503, "maintenance"))));
        let stats = svc.dashboard().await.unwrap();

        assert_eq!(stats.total_users, 6);
        assert_eq!(stats.total_admins, 1);
        assert_eq!(stats.total_trainers, 2);
        assert_eq!(stats.total_employees, 3);
        assert_eq!(stats.total_teams, 3);
        assert_eq!(stats.total_formations, 3);
        assert_eq!(stats.formations_by_status.in_progress, 1);
        assert!(svc.offline.is_offline("statistics"));
    }

    #[tokio::test]
    async fn backend_answer_wins() {
        let svc = service(ScriptedRemote::always(Ok(json!({
            "total_users": 120,
            "total_admins": 2,
            "total_trainers": 18,
            "total_employees": 100,
            "total_teams": 9,
            "total_formations": 31
        }))));
        let stats = svc.dashboard().await.unwrap();
        assert_eq!(stats.total_users, 120);
        assert_eq!(stats.formations_by_status.planned, 0);
    }
}
