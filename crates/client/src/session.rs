//! Session owner: the single holder of the principal and the access token.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;

use formadmin_auth::Principal;

use crate::error::ShimError;
use crate::storage::SessionStorage;

pub const CURRENT_USER_KEY: &str = "currentUser";
pub const TOKEN_KEY: &str = "token";
/// Legacy key; written when the backend returns one, never read back.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

#[derive(Debug, Clone, Default)]
struct SessionState {
    principal: Option<Principal>,
    token: Option<String>,
}

struct SessionInner {
    storage: Arc<dyn SessionStorage>,
    state: RwLock<SessionState>,
    tx: watch::Sender<Option<Principal>>,
}

/// Cheap-to-clone handle on the process-wide session slot.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.read();
        f.debug_struct("Session")
            .field("principal", &state.principal.as_ref().map(|p| p.id))
            .field("has_token", &state.token.is_some())
            .finish()
    }
}

impl Session {
    /// Restore the session persisted in `storage`.
    ///
    /// A user blob without a token (or one that fails to parse) is discarded
    /// and the stale keys are removed.
    pub fn restore(storage: Arc<dyn SessionStorage>) -> Self {
        let state = match load_state(storage.as_ref()) {
            Ok(Some(state)) => {
                if let Some(p) = &state.principal {
                    tracing::info!(user_id = %p.id, "restored session from storage");
                }
                state
            }
            Ok(None) => SessionState::default(),
            Err(err) => {
                tracing::warn!("discarding unreadable session: {err:#}");
                for key in [CURRENT_USER_KEY, TOKEN_KEY, REFRESH_TOKEN_KEY] {
                    if let Err(err) = storage.remove(key) {
                        tracing::warn!(key, "failed to remove stale session key: {err:#}");
                    }
                }
                SessionState::default()
            }
        };

        let (tx, _rx) = watch::channel(state.principal.clone());
        Self {
            inner: Arc::new(SessionInner {
                storage,
                state: RwLock::new(state),
                tx,
            }),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn principal(&self) -> Option<Principal> {
        self.read().principal.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().principal.is_some()
    }

    /// Observe principal changes (login, profile update, logout).
    pub fn subscribe(&self) -> watch::Receiver<Option<Principal>> {
        self.inner.tx.subscribe()
    }

    /// Store a freshly authenticated principal and its credentials.
    pub fn establish(
        &self,
        principal: Principal,
        token: String,
        refresh_token: Option<String>,
    ) -> Result<(), ShimError> {
        let storage = &self.inner.storage;
        let blob = serde_json::to_string(&principal)
            .map_err(|e| ShimError::Storage(format!("failed to serialize principal: {e}")))?;
        storage.set(CURRENT_USER_KEY, &blob).map_err(ShimError::storage)?;
        storage.set(TOKEN_KEY, &token).map_err(ShimError::storage)?;
        let refresh_written = match &refresh_token {
            Some(refresh) => storage.set(REFRESH_TOKEN_KEY, refresh),
            None => storage.remove(REFRESH_TOKEN_KEY),
        };
        refresh_written.map_err(ShimError::storage)?;

        tracing::info!(user_id = %principal.id, role = %principal.role, "session established");

        {
            let mut state = self.write();
            state.principal = Some(principal.clone());
            state.token = Some(token);
        }
        self.inner.tx.send_replace(Some(principal));
        Ok(())
    }

    /// Replace the principal (profile refresh) keeping the credentials.
    pub fn update_principal(&self, principal: Principal) -> Result<(), ShimError> {
        if !self.is_authenticated() {
            return Err(ShimError::Unauthenticated);
        }
        let blob = serde_json::to_string(&principal)
            .map_err(|e| ShimError::Storage(format!("failed to serialize principal: {e}")))?;
        self.inner
            .storage
            .set(CURRENT_USER_KEY, &blob)
            .map_err(ShimError::storage)?;

        self.write().principal = Some(principal.clone());
        self.inner.tx.send_replace(Some(principal));
        Ok(())
    }

    /// Forget the principal and credentials (logout).
    ///
    /// In-memory state is cleared even when storage fails.
    pub fn clear(&self) -> Result<(), ShimError> {
        let previous = {
            let mut state = self.write();
            state.token = None;
            state.principal.take()
        };
        self.inner.tx.send_replace(None);

        if let Some(p) = previous {
            tracing::info!(user_id = %p.id, "session cleared");
        }

        let mut first_err = None;
        for key in [CURRENT_USER_KEY, TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(err) = self.inner.storage.remove(key) {
                if first_err.is_none() {
                    first_err = Some(err);
                }
            }
        }
        match first_err {
            Some(err) => Err(ShimError::storage(err)),
            None => Ok(()),
        }
    }
}

fn load_state(storage: &dyn SessionStorage) -> anyhow::Result<Option<SessionState>> {
    let user = storage.get(CURRENT_USER_KEY)?;
    let token = storage.get(TOKEN_KEY)?;

    match (user, token) {
        (None, None) => Ok(None),
        (Some(blob), Some(token)) if !token.is_empty() => {
            let principal: Principal = serde_json::from_str(&blob)?;
            Ok(Some(SessionState {
                principal: Some(principal),
                token: Some(token),
            }))
        }
        _ => anyhow::bail!("incomplete session (user and token must both be present)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use formadmin_core::UserId;

    fn principal(role: &str) -> Principal {
        Principal {
            id: UserId::new(3),
            first_name: "Nour".to_string(),
            last_name: "Jaziri".to_string(),
            email: "nour@example.com".to_string(),
            role: role.to_string(),
            team: Some("Data Science".to_string()),
            speciality: None,
            phone: None,
        }
    }

    #[test]
    fn establish_persists_and_restores() {
        let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());
        let session = Session::restore(storage.clone());
        assert!(!session.is_authenticated());

        session
            .establish(principal("employe"), "tok".to_string(), Some("ref".to_string()))
            .unwrap();
        assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("ref"));

        let restored = Session::restore(storage);
        assert_eq!(restored.principal(), Some(principal("employe")));
        assert_eq!(restored.token().as_deref(), Some("tok"));
    }

    #[test]
    fn clear_removes_every_key() {
        let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());
        let session = Session::restore(storage.clone());
        session
            .establish(principal("admin"), "tok".to_string(), Some("ref".to_string()))
            .unwrap();

        session.clear().unwrap();
        assert!(session.principal().is_none());
        assert!(session.token().is_none());
        for key in [CURRENT_USER_KEY, TOKEN_KEY, REFRESH_TOKEN_KEY] {
            assert_eq!(storage.get(key).unwrap(), None);
        }
    }

    #[test]
    fn incomplete_session_is_discarded() {
        let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());
        let blob = serde_json::to_string(&principal("admin")).unwrap();
        storage.set(CURRENT_USER_KEY, &blob).unwrap();

        let session = Session::restore(storage.clone());
        assert!(!session.is_authenticated());
        assert_eq!(storage.get(CURRENT_USER_KEY).unwrap(), None);
    }

    #[test]
    fn corrupt_blob_is_discarded() {
        let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());
        storage.set(CURRENT_USER_KEY, "{not json").unwrap();
        storage.set(TOKEN_KEY, "tok").unwrap();

        let session = Session::restore(storage.clone());
        assert!(!session.is_authenticated());
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn subscribers_see_changes() {
        let session = Session::restore(Arc::new(MemoryStorage::new()));
        let rx = session.subscribe();
        assert!(rx.borrow().is_none());

        session.establish(principal("formateur"), "tok".to_string(), None).unwrap();
        assert_eq!(rx.borrow().as_ref().map(|p| p.role.as_str()), Some("formateur"));

        let mut updated = principal("formateur");
        updated.phone = Some("+216 55 123 456".to_string());
        session.update_principal(updated.clone()).unwrap();
        assert_eq!(rx.borrow().as_ref(), Some(&updated));

        session.clear().unwrap();
        assert!(rx.borrow().is_none());
    }

    #[test]
    fn update_requires_session() {
        let session = Session::restore(Arc::new(MemoryStorage::new()));
        assert_eq!(
            session.update_principal(principal("admin")),
            Err(ShimError::Unauthenticated)
        );
    }
}
