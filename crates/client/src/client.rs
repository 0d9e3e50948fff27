//! Wiring of session, transport, local store and services.

use std::sync::Arc;

use anyhow::Context;

use formadmin_auth::{Decision, MenuItem, NavigationExplanation, RouteTable, explain_navigation, menu_for};
use formadmin_core::{Formation, Team, User};

use crate::config::ClientConfig;
use crate::offline::OfflineMode;
use crate::remote::{HttpRemote, Remote};
use crate::repository::ResilientRepository;
use crate::services::{AttendanceService, AuthService, ParticipantService, StatisticsService};
use crate::session::Session;
use crate::storage::{FileStorage, SessionStorage};
use crate::store::MockDb;

/// One console session: everything a page needs, sharing a single session
/// slot, local store and connectivity state.
#[derive(Clone)]
pub struct FormadminClient {
    pub config: ClientConfig,
    pub session: Session,
    pub db: Arc<MockDb>,
    pub offline: Arc<OfflineMode>,
    pub routes: Arc<RouteTable>,
    pub users: ResilientRepository<User>,
    pub teams: ResilientRepository<Team>,
    pub formations: ResilientRepository<Formation>,
    pub participants: ParticipantService,
    pub attendance: AttendanceService,
    pub statistics: StatisticsService,
    pub auth: AuthService,
}

impl FormadminClient {
    /// Build a client talking HTTP to `config.api_base_url`, with the session
    /// persisted at `config.session_path` and a seeded local store.
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let storage: Arc<dyn SessionStorage> = Arc::new(FileStorage::new(config.session_path.clone()));
        let session = Session::restore(storage);
        let remote = HttpRemote::new(config.api_base_url.clone(), config.request_timeout, session.clone())
            .context("failed to build HTTP transport")?;

        tracing::info!(
            api = %config.api_base_url,
            session_path = %config.session_path.display(),
            demo_mode = config.demo_mode,
            "client initialised"
        );

        Ok(Self::with_parts(config, session, Arc::new(remote), Arc::new(MockDb::seeded())))
    }

    /// Assemble a client from explicit parts.
    pub fn with_parts(config: ClientConfig, session: Session, remote: Arc<dyn Remote>, db: Arc<MockDb>) -> Self {
        let offline = Arc::new(OfflineMode::new());
        Self {
            users: ResilientRepository::new(remote.clone(), db.clone(), offline.clone()),
            teams: ResilientRepository::new(remote.clone(), db.clone(), offline.clone()),
            formations: ResilientRepository::new(remote.clone(), db.clone(), offline.clone()),
            participants: ParticipantService::new(remote.clone(), db.clone(), offline.clone()),
            attendance: AttendanceService::new(remote.clone(), db.clone(), offline.clone()),
            statistics: StatisticsService::new(remote.clone(), db.clone(), offline.clone()),
            auth: AuthService::new(remote, session.clone(), db.clone(), offline.clone(), config.demo_mode),
            routes: Arc::new(RouteTable::standard()),
            config,
            session,
            db,
            offline,
        }
    }

    /// Route guard decision for the current principal.
    pub fn navigate(&self, path: &str) -> Decision {
        self.routes.navigate(self.session.principal().as_ref(), path)
    }

    pub fn explain(&self, path: &str) -> NavigationExplanation {
        explain_navigation(&self.routes, self.session.principal().as_ref(), path)
    }

    /// Sidebar entries for the current principal.
    pub fn menu(&self) -> &'static [MenuItem] {
        menu_for(self.session.principal().as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::test_support::ScriptedRemote;
    use formadmin_auth::Area;
    use formadmin_core::NormalizedRole;

    fn offline_client() -> FormadminClient {
        let config = ClientConfig {
            demo_mode: true,
            ..ClientConfig::default()
        };
        FormadminClient::with_parts(
            config,
            Session::restore(Arc::new(MemoryStorage::new())),
            Arc::new(ScriptedRemote::unreachable()),
            Arc::new(MockDb::seeded()),
        )
    }

    #[test]
    fn guest_is_sent_to_login() {
        let client = offline_client();
        assert_eq!(client.navigate("/admin/users"), Decision::DenyRedirectToLogin);
        assert!(client.menu().is_empty());
    }

    #[tokio::test]
    async fn trainer_is_confined_to_trainer_area() {
        let client = offline_client();
        client.auth.demo_switch(NormalizedRole::Trainer).unwrap();

        assert_eq!(client.navigate("/formateur/formations"), Decision::Allow);
        assert_eq!(
            client.navigate("/admin/dashboard"),
            Decision::DenyRedirectToAuthorizedArea(Area::Trainer)
        );
        assert!(!client.menu().is_empty());

        client.auth.logout().await.unwrap();
        assert_eq!(client.navigate("/formateur/formations"), Decision::DenyRedirectToLogin);
    }

    #[tokio::test]
    async fn services_share_one_local_store() {
        let client = offline_client();
        let before = client.statistics.dashboard().await.unwrap();

        client.formations.delete(formadmin_core::FormationId::new(1)).await.unwrap();

        let after = client.statistics.dashboard().await.unwrap();
        assert_eq!(after.total_formations, before.total_formations - 1);
        assert!(client.participants.list(formadmin_core::FormationId::new(1)).await.is_err());
        assert_eq!(client.offline.offline_resources(), vec!["formations", "participants", "statistics"]);
    }
}
