//! Enrollment of users in formations
//! (`/api/formations/{id}/participants`).

use std::sync::Arc;

use formadmin_core::{
    DomainError, FormationId, FormationParticipant, NewParticipant, ParticipantId, UserId,
};

use crate::error::ShimError;
use crate::offline::OfflineMode;
use crate::record::person_snapshot;
use crate::remote::{ApiRequest, Remote, fetch};
use crate::repository::with_fallback;
use crate::store::MockDb;

const RESOURCE: &str = "participants";

#[derive(Clone)]
pub struct ParticipantService {
    remote: Arc<dyn Remote>,
    db: Arc<MockDb>,
    offline: Arc<OfflineMode>,
}

impl ParticipantService {
    pub fn new(remote: Arc<dyn Remote>, db: Arc<MockDb>, offline: Arc<OfflineMode>) -> Self {
        Self { remote, db, offline }
    }

    fn path(formation_id: FormationId) -> String {
        format!("formations/{formation_id}/participants")
    }

    pub async fn list(&self, formation_id: FormationId) -> Result<Vec<FormationParticipant>, ShimError> {
        let request = ApiRequest::get(Self::path(formation_id));
        with_fallback(
            &self.offline,
            RESOURCE,
            "list",
            fetch(self.remote.as_ref(), request),
            || {
                self.require_formation(formation_id)?;
                Ok(self
                    .db
                    .participants
                    .snapshot()
                    .into_iter()
                    .filter(|p| p.formation_id == formation_id)
                    .collect())
            },
        )
        .await
    }

    /// Enroll `user_id`. Enrolling someone twice returns the existing entry.
    pub async fn add(
        &self,
        formation_id: FormationId,
        user_id: UserId,
    ) -> Result<FormationParticipant, ShimError> {
        let request = ApiRequest::post(Self::path(formation_id)).with_json(&NewParticipant { user_id })?;
        with_fallback(
            &self.offline,
            RESOURCE,
            "add",
            fetch(self.remote.as_ref(), request),
            || self.add_locally(formation_id, user_id),
        )
        .await
    }

    fn add_locally(
        &self,
        formation_id: FormationId,
        user_id: UserId,
    ) -> Result<FormationParticipant, ShimError> {
        let db = self.db.as_ref();
        let formation = self.require_formation(formation_id)?;
        if db.users.find(user_id.get()).is_none() {
            return Err(DomainError::not_found("user", user_id.get()).into());
        }

        let user = person_snapshot(db, Some(user_id));
        db.participants.find_or_try_insert(
            |p| p.formation_id == formation_id && p.user_id == user_id,
            |id, current| {
                if let Some(max) = formation.max_participants {
                    let count = current.iter().filter(|p| p.formation_id == formation_id).count();
                    if count >= max as usize {
                        return Err(ShimError::from(DomainError::validation(format!(
                            "formation {formation_id} is full ({max} participants)"
                        ))));
                    }
                }
                Ok(FormationParticipant {
                    id: ParticipantId::new(id),
                    formation_id,
                    user_id,
                    user,
                })
            },
        )
    }

    /// Withdraw `user_id`. Removing someone who is not enrolled succeeds.
    pub async fn remove(&self, formation_id: FormationId, user_id: UserId) -> Result<(), ShimError> {
        let request = ApiRequest::delete(format!("{}/{user_id}", Self::path(formation_id)));
        let remote = self.remote.as_ref();
        with_fallback(
            &self.offline,
            RESOURCE,
            "remove",
            async move { remote.send(request).await.map(|_| ()) },
            || {
                let removed = self
                    .db
                    .participants
                    .remove_where(|p| p.formation_id == formation_id && p.user_id == user_id);
                tracing::debug!(%formation_id, %user_id, removed, "participant removed locally");
                Ok(())
            },
        )
        .await
    }

    fn require_formation(&self, formation_id: FormationId) -> Result<formadmin_core::Formation, ShimError> {
        self.db
            .formations
            .find(formation_id.get())
            .ok_or_else(|| DomainError::not_found("formation", formation_id.get()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::record::Record;
    use crate::test_support::ScriptedRemote;
    use formadmin_core::{Formation, FormationPatch};
    use serde_json::json;
    use std::sync::Barrier;

    fn service(remote: ScriptedRemote) -> (ParticipantService, Arc<ScriptedRemote>) {
        let remote = Arc::new(remote);
        let svc = ParticipantService::new(
            remote.clone(),
            Arc::new(MockDb::seeded()),
            Arc::new(OfflineMode::new()),
        );
        (svc, remote)
    }

    #[tokio::test]
    async fn list_hits_the_nested_path() {
        let (svc, remote) = service(ScriptedRemote::always(Ok(json!([
            { "id": 40, "formation_id": 2, "user_id": 5 }
        ]))));

        let listed = svc.list(FormationId::new(2)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(remote.requests()[0].path, "formations/2/participants");
    }

    #[tokio::test]
    async fn offline_add_is_idempotent() {
        let (svc, _) = service(ScriptedRemote::unreachable());
        let formation = FormationId::new(1);

        let first = svc.add(formation, UserId::new(5)).await.unwrap();
        let again = svc.add(formation, UserId::new(5)).await.unwrap();
        assert_eq!(first, again);
        assert_eq!(first.user.as_ref().map(|u| u.first_name.as_str()), Some("Omar"));
        assert_eq!(svc.list(formation).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn offline_add_checks_references() {
        let (svc, _) = service(ScriptedRemote::unreachable());

        let err = svc.add(FormationId::new(99), UserId::new(4)).await.unwrap_err();
        assert!(err.is_not_found());
        let err = svc.add(FormationId::new(1), UserId::new(99)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn offline_add_respects_capacity() {
        let (svc, _) = service(ScriptedRemote::unreachable());
        let db = svc.db.clone();
        db.formations
            .update(1, |f: &mut Formation| {
                f.merge(
                    &FormationPatch {
                        max_participants: Some(1),
                        ..Default::default()
                    },
                    &db,
                );
                Ok::<(), ShimError>(())
            })
            .unwrap();

        let err = svc.add(FormationId::new(1), UserId::new(6)).await.unwrap_err();
        assert!(matches!(err, ShimError::Domain(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn rejected_add_leaves_local_store_alone() {
        let (svc, _) = service(ScriptedRemote::always(Err(RemoteError::from_status(
            409,
            "already enrolled",
        ))));
        let before = svc.db.participants.len();

        let err = svc.add(FormationId::new(1), UserId::new(4)).await.unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(svc.db.participants.len(), before);
    }

    #[test]
    fn concurrent_local_adds_enroll_once() {
        for _ in 0..50 {
            let (svc, _) = service(ScriptedRemote::unreachable());
            let barrier = Barrier::new(8);

            std::thread::scope(|s| {
                for _ in 0..8 {
                    s.spawn(|| {
                        barrier.wait();
                        svc.add_locally(FormationId::new(2), UserId::new(6)).unwrap();
                    });
                }
            });

            let enrolled = svc
                .db
                .participants
                .snapshot()
                .into_iter()
                .filter(|p| p.formation_id == FormationId::new(2) && p.user_id == UserId::new(6))
                .count();
            assert_eq!(enrolled, 1);
        }
    }

    #[test]
    fn concurrent_local_adds_respect_capacity() {
        for _ in 0..50 {
            let (svc, _) = service(ScriptedRemote::unreachable());
            let db = svc.db.clone();
            db.formations
                .update(2, |f: &mut Formation| {
                    f.max_participants = Some(2);
                    Ok::<(), ShimError>(())
                })
                .unwrap();
            let barrier = Barrier::new(4);

            std::thread::scope(|s| {
                for user in [1, 2, 4, 6] {
                    let (svc, barrier) = (&svc, &barrier);
                    s.spawn(move || {
                        barrier.wait();
                        let _ = svc.add_locally(FormationId::new(2), UserId::new(user));
                    });
                }
            });

            let in_formation = db
                .participants
                .snapshot()
                .into_iter()
                .filter(|p| p.formation_id == FormationId::new(2))
                .count();
            assert_eq!(in_formation, 2);
        }
    }

    #[tokio::test]
    async fn offline_remove_is_idempotent() {
        let (svc, _) = service(ScriptedRemote::unreachable());
        let formation = FormationId::new(1);

        svc.remove(formation, UserId::new(4)).await.unwrap();
        svc.remove(formation, UserId::new(4)).await.unwrap();
        assert!(svc.list(formation).await.unwrap().is_empty());
    }
}
