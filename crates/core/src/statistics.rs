//! Dashboard counters (`/api/statistics/dashboard`).

use serde::{Deserialize, Serialize};

use crate::{Formation, FormationStatus, NormalizedRole, Team, User};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormationStatusCounts {
    pub planned: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub cancelled: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStatistics {
    pub total_users: u64,
    pub total_admins: u64,
    pub total_trainers: u64,
    pub total_employees: u64,
    pub total_teams: u64,
    pub total_formations: u64,
    #[serde(default)]
    pub formations_by_status: FormationStatusCounts,
}

impl DashboardStatistics {
    /// Compute the counters from full snapshots of each collection.
    pub fn compute(users: &[User], teams: &[Team], formations: &[Formation]) -> Self {
        let mut stats = DashboardStatistics {
            total_users: users.len() as u64,
            total_teams: teams.len() as u64,
            total_formations: formations.len() as u64,
            ..Default::default()
        };

        for user in users {
            match user.normalized_role() {
                Some(NormalizedRole::Admin) => stats.total_admins += 1,
                Some(NormalizedRole::Trainer) => stats.total_trainers += 1,
                Some(NormalizedRole::Employee) => stats.total_employees += 1,
                None => {}
            }
        }

        for formation in formations {
            let counts = &mut stats.formations_by_status;
            match formation.status {
                FormationStatus::Planned => counts.planned += 1,
                FormationStatus::InProgress => counts.in_progress += 1,
                FormationStatus::Completed => counts.completed += 1,
                FormationStatus::Cancelled => counts.cancelled += 1,
            }
        }

        stats
    }
}
