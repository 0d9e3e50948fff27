//! Login, logout, profile and the demo role switch.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use formadmin_auth::{Area, Principal, post_login_target};
use formadmin_core::{DomainError, NewUser, NormalizedRole, User, UserPatch};

use crate::error::{RemoteError, ShimError};
use crate::offline::OfflineMode;
use crate::record::Record;
use crate::remote::{ApiRequest, Remote, fetch};
use crate::repository::with_fallback;
use crate::session::Session;
use crate::store::MockDb;

const RESOURCE: &str = "auth";

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Body of a successful `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    #[serde(alias = "access_token", alias = "accessToken")]
    pub token: String,
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub principal: Principal,
    /// Area to navigate to right after login.
    pub target: Area,
}

#[derive(Clone)]
pub struct AuthService {
    remote: Arc<dyn Remote>,
    session: Session,
    db: Arc<MockDb>,
    offline: Arc<OfflineMode>,
    demo_mode: bool,
}

impl AuthService {
    pub fn new(
        remote: Arc<dyn Remote>,
        session: Session,
        db: Arc<MockDb>,
        offline: Arc<OfflineMode>,
        demo_mode: bool,
    ) -> Self {
        Self {
            remote,
            session,
            db,
            offline,
            demo_mode,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Authenticate against the backend and establish the session.
    ///
    /// When the backend is unreachable and demo mode is on, the email is
    /// looked up in the local users store instead.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, ShimError> {
        let request = ApiRequest::post("auth/login").with_json(&LoginRequest { email, password })?;

        match fetch::<LoginResponse>(self.remote.as_ref(), request).await {
            Ok(resp) => self.establish(Principal::from(&resp.user), resp.token, resp.refresh_token),
            Err(RemoteError::Rejected { status: 401, .. }) => Err(ShimError::InvalidCredentials),
            Err(err) if err.is_transport() && self.demo_mode => {
                tracing::warn!(error = %err, "login endpoint unreachable; using demo login");
                self.offline.set_offline(RESOURCE);
                self.demo_login(email)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn demo_login(&self, email: &str) -> Result<LoginOutcome, ShimError> {
        let wanted = email.trim();
        let user = self
            .db
            .users
            .find_where(|u| u.email.eq_ignore_ascii_case(wanted))
            .ok_or(ShimError::InvalidCredentials)?;
        let token = demo_token(&user);
        self.establish(Principal::from(&user), token, None)
    }

    fn establish(
        &self,
        principal: Principal,
        token: String,
        refresh_token: Option<String>,
    ) -> Result<LoginOutcome, ShimError> {
        if principal.normalized_role().is_none() {
            tracing::warn!(user_id = %principal.id, role = %principal.role, "refusing session for unrecognized role");
            return Err(ShimError::UnrecognizedRole(principal.role));
        }
        let target = post_login_target(&principal.role);
        self.session.establish(principal.clone(), token, refresh_token)?;
        Ok(LoginOutcome { principal, target })
    }

    /// End the session. The backend is told on a best-effort basis; the
    /// local session is always cleared.
    pub async fn logout(&self) -> Result<(), ShimError> {
        if self.session.token().is_some() {
            if let Err(err) = self.remote.send(ApiRequest::post("auth/logout")).await {
                tracing::warn!(error = %err, "logout request failed; clearing local session anyway");
            }
        }
        self.session.clear()
    }

    /// Refresh the principal from `GET /auth/me`.
    ///
    /// A 401 means the credentials are no longer valid and ends the session.
    pub async fn me(&self) -> Result<Principal, ShimError> {
        if !self.session.is_authenticated() {
            return Err(ShimError::Unauthenticated);
        }

        let remote = self.remote.as_ref();
        let result = with_fallback(
            &self.offline,
            RESOURCE,
            "me",
            async move {
                let user: User = fetch(remote, ApiRequest::get("auth/me")).await?;
                Ok(Principal::from(&user))
            },
            || self.session.principal().ok_or(ShimError::Unauthenticated),
        )
        .await;

        match result {
            Ok(principal) => {
                if self.session.principal().as_ref() != Some(&principal) {
                    self.session.update_principal(principal.clone())?;
                }
                Ok(principal)
            }
            Err(ShimError::Remote(RemoteError::Rejected { status: 401, .. })) => {
                tracing::info!("credentials rejected by /auth/me; ending session");
                self.session.clear()?;
                Err(ShimError::Unauthenticated)
            }
            Err(err) => Err(err),
        }
    }

    /// Update the signed-in user's own profile.
    ///
    /// The role cannot be changed from here.
    pub async fn update_profile(&self, patch: UserPatch) -> Result<Principal, ShimError> {
        let current = self.session.principal().ok_or(ShimError::Unauthenticated)?;
        if patch.role.is_some() {
            return Err(DomainError::validation("role cannot be changed from the profile").into());
        }

        let request = ApiRequest::put("auth/profile").with_json(&patch)?;
        let remote = self.remote.as_ref();
        let principal = with_fallback(
            &self.offline,
            RESOURCE,
            "update_profile",
            async move {
                let user: User = fetch(remote, request).await?;
                Ok(Principal::from(&user))
            },
            || self.update_profile_locally(current, &patch),
        )
        .await?;

        self.session.update_principal(principal.clone())?;
        Ok(principal)
    }

    fn update_profile_locally(&self, current: Principal, patch: &UserPatch) -> Result<Principal, ShimError> {
        patch.validate()?;
        let db = self.db.as_ref();

        if db.users.find(current.id.get()).is_some() {
            let user = db.users.update(current.id.get(), |user: &mut User| {
                user.merge(patch, db);
                Ok::<(), ShimError>(())
            })?;
            return Ok(Principal::from(&user));
        }

        let mut principal = current;
        if let Some(v) = &patch.first_name {
            principal.first_name = v.clone();
        }
        if let Some(v) = &patch.last_name {
            principal.last_name = v.clone();
        }
        if let Some(v) = &patch.email {
            principal.email = v.clone();
        }
        if let Some(v) = &patch.speciality {
            principal.speciality = Some(v.clone());
        }
        if let Some(v) = &patch.phone {
            principal.phone = Some(v.clone());
        }
        Ok(principal)
    }

    /// Demo-only: sign in as the first local user holding `role`.
    ///
    /// Refused unless demo mode is enabled in the configuration.
    pub fn demo_switch(&self, role: NormalizedRole) -> Result<LoginOutcome, ShimError> {
        if !self.demo_mode {
            return Err(ShimError::DemoModeDisabled);
        }

        let db = self.db.as_ref();
        let user = match db.users.find_where(|u| u.normalized_role() == Some(role)) {
            Some(user) => user,
            None => db.users.insert_with(|id| {
                User::materialize(
                    id,
                    NewUser {
                        first_name: "Demo".to_string(),
                        last_name: role.to_string(),
                        email: format!("demo.{role}@formation.local"),
                        role: role.canonical_raw().to_string(),
                        team_id: None,
                        speciality: None,
                        phone: None,
                        password: None,
                    },
                    db,
                )
            }),
        };

        tracing::warn!(user_id = %user.id, name = %user.full_name(), %role, "demo role switch");
        let token = demo_token(&user);
        self.establish(Principal::from(&user), token, None)
    }
}

fn demo_token(user: &User) -> String {
    format!("demo-token-{}", user.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::test_support::ScriptedRemote;
    use serde_json::json;

    fn service(remote: ScriptedRemote, demo_mode: bool) -> AuthService {
        AuthService::new(
            Arc::new(remote),
            Session::restore(Arc::new(MemoryStorage::new())),
            Arc::new(MockDb::seeded()),
            Arc::new(OfflineMode::new()),
            demo_mode,
        )
    }

    fn login_body(role: &str) -> serde_json::Value {
        json!({
            "user": {
                "id": 12,
                "first_name": "Hela",
                "last_name": "Mejri",
                "email": "hela@formation.com",
                "role": role
            },
            "token": "jwt-abc",
            "refresh_token": "refresh-abc"
        })
    }

    #[tokio::test]
    async fn login_establishes_session_and_targets_role_home() {
        let auth = service(ScriptedRemote::always(Ok(login_body("formateur"))), false);

        let outcome = auth.login("hela@formation.com", "secret").await.unwrap();
        assert_eq!(outcome.target, Area::Trainer);
        assert_eq!(auth.session().token().as_deref(), Some("jwt-abc"));
        assert_eq!(auth.session().principal().map(|p| p.id.get()), Some(12));
    }

    #[tokio::test]
    async fn login_with_unknown_role_leaves_session_empty() {
        let auth = service(ScriptedRemote::always(Ok(login_body("superviseur"))), false);

        let err = auth.login("hela@formation.com", "secret").await.unwrap_err();
        assert_eq!(err, ShimError::UnrecognizedRole("superviseur".to_string()));
        assert!(!auth.session().is_authenticated());
    }

    #[tokio::test]
    async fn bad_credentials_are_reported() {
        let auth = service(
            ScriptedRemote::always(Err(RemoteError::from_status(401, "bad credentials"))),
            true,
        );
        let err = auth.login("admin@formation.com", "wrong").await.unwrap_err();
        assert_eq!(err, ShimError::InvalidCredentials);
        assert!(!auth.session().is_authenticated());
    }

    #[tokio::test]
    async fn unreachable_backend_without_demo_mode_propagates() {
        let auth = service(ScriptedRemote::unreachable(), false);
        let err = auth.login("admin@formation.com", "x").await.unwrap_err();
        assert!(matches!(err, ShimError::Remote(RemoteError::Network(_))));
        assert!(!auth.session().is_authenticated());
    }

    #[tokio::test]
    async fn demo_login_uses_local_users() {
        let auth = service(ScriptedRemote::unreachable(), true);

        let outcome = auth.login("Karim.Mansour@formation.com", "x").await.unwrap();
        assert_eq!(outcome.target, Area::Trainer);
        assert_eq!(auth.session().token().as_deref(), Some("demo-token-2"));

        let err = auth.login("nobody@formation.com", "x").await.unwrap_err();
        assert_eq!(err, ShimError::InvalidCredentials);
    }

    #[tokio::test]
    async fn logout_clears_even_when_backend_is_down() {
        let auth = service(ScriptedRemote::unreachable(), true);
        auth.demo_switch(NormalizedRole::Admin).unwrap();
        assert!(auth.session().is_authenticated());

        auth.logout().await.unwrap();
        assert!(!auth.session().is_authenticated());
        assert!(auth.session().token().is_none());
    }

    #[test]
    fn demo_switch_requires_demo_mode() {
        let auth = service(ScriptedRemote::unreachable(), false);
        assert_eq!(
            auth.demo_switch(NormalizedRole::Admin).unwrap_err(),
            ShimError::DemoModeDisabled
        );
    }

    #[test]
    fn demo_switch_picks_a_user_with_the_role() {
        let auth = service(ScriptedRemote::unreachable(), true);
        let outcome = auth.demo_switch(NormalizedRole::Employee).unwrap();
        assert_eq!(outcome.target, Area::Employee);
        assert_eq!(outcome.principal.email, "sara.khelifi@formation.com");
    }

    #[tokio::test]
    async fn me_refreshes_principal() {
        let remote = ScriptedRemote::unreachable().then(Ok(json!({
            "id": 1,
            "first_name": "Admin",
            "last_name": "Renamed",
            "email": "admin@formation.com",
            "role": "admin"
        })));
        let auth = service(remote, true);
        auth.demo_switch(NormalizedRole::Admin).unwrap();

        let principal = auth.me().await.unwrap();
        assert_eq!(principal.last_name, "Renamed");
        assert_eq!(auth.session().principal().unwrap().last_name, "Renamed");
    }

    #[tokio::test]
    async fn me_with_expired_token_ends_session() {
        let remote = ScriptedRemote::always(Err(RemoteError::from_status(401, "token expired")));
        let auth = service(remote, true);
        auth.demo_switch(NormalizedRole::Trainer).unwrap();

        assert_eq!(auth.me().await.unwrap_err(), ShimError::Unauthenticated);
        assert!(!auth.session().is_authenticated());
    }

    #[tokio::test]
    async fn me_falls_back_to_session_principal() {
        let auth = service(ScriptedRemote::unreachable(), true);
        let outcome = auth.demo_switch(NormalizedRole::Trainer).unwrap();
        assert_eq!(auth.me().await.unwrap(), outcome.principal);
    }

    #[tokio::test]
    async fn profile_update_falls_back_to_local_user() {
        let auth = service(ScriptedRemote::unreachable(), true);
        auth.demo_switch(NormalizedRole::Employee).unwrap();

        let principal = auth
            .update_profile(UserPatch {
                phone: Some("+216 98 765 432".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(principal.phone.as_deref(), Some("+216 98 765 432"));
        assert_eq!(auth.session().principal().unwrap().phone, principal.phone);
        assert_eq!(auth.db.users.find(4).unwrap().phone, principal.phone);
    }

    #[tokio::test]
    async fn profile_cannot_change_role() {
        let auth = service(ScriptedRemote::unreachable(), true);
        auth.demo_switch(NormalizedRole::Employee).unwrap();

        let err = auth
            .update_profile(UserPatch {
                role: Some("admin".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ShimError::Domain(DomainError::Validation(_))));
        assert_eq!(auth.session().principal().unwrap().role, "employe");
    }
}
