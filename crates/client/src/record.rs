//! How each resource maps onto the REST API and the local store.

use serde::Serialize;
use serde::de::DeserializeOwned;

use formadmin_core::{
    DomainResult, Formation, FormationFilter, FormationId, FormationPatch, NewFormation, NewTeam,
    NewUser, PersonSnapshot, Team, TeamId, TeamPatch, TeamSnapshot, User, UserFilter, UserId,
    UserPatch,
};

use crate::store::{Keyed, LocalStore, MockDb};

/// A CRUD resource served by [`crate::ResilientRepository`].
pub trait Record: Keyed + Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Id: Copy + Into<u64> + core::fmt::Display + Send + Sync;
    type Draft: Serialize + Send + Sync;
    type Patch: Serialize + Send + Sync;
    type Filter: Send + Sync;

    /// Path segment under the API base (`users`).
    const RESOURCE: &'static str;

    fn store(db: &MockDb) -> &LocalStore<Self>;

    fn query(filter: &Self::Filter) -> Vec<(&'static str, String)>;

    /// Local equivalent of the backend's list filter.
    fn matches(&self, filter: &Self::Filter) -> bool;

    fn validate_draft(draft: &Self::Draft) -> DomainResult<()>;

    /// Build a record for a newly allocated id, resolving relation snapshots
    /// from `db`.
    fn materialize(id: u64, draft: Self::Draft, db: &MockDb) -> Self;

    fn validate_patch(&self, patch: &Self::Patch) -> DomainResult<()>;

    /// Merge `patch`, re-deriving snapshots for foreign keys that changed.
    fn merge(&mut self, patch: &Self::Patch, db: &MockDb);

    /// Local cleanup after this record was removed.
    fn on_local_delete(_id: u64, _db: &MockDb) {}
}

pub(crate) fn team_snapshot(db: &MockDb, team_id: Option<TeamId>) -> Option<TeamSnapshot> {
    let team_id = team_id?;
    let snapshot = db.teams.find(team_id.get()).map(|t| t.snapshot());
    if snapshot.is_none() {
        tracing::debug!(%team_id, "referenced team not in local store; leaving snapshot empty");
    }
    snapshot
}

pub(crate) fn person_snapshot(db: &MockDb, user_id: Option<UserId>) -> Option<PersonSnapshot> {
    let user_id = user_id?;
    let snapshot = db.users.find(user_id.get()).map(|u| u.snapshot());
    if snapshot.is_none() {
        tracing::debug!(%user_id, "referenced user not in local store; leaving snapshot empty");
    }
    snapshot
}

impl Record for User {
    type Id = UserId;
    type Draft = NewUser;
    type Patch = UserPatch;
    type Filter = UserFilter;

    const RESOURCE: &'static str = "users";

    fn store(db: &MockDb) -> &LocalStore<Self> {
        &db.users
    }

    fn query(filter: &UserFilter) -> Vec<(&'static str, String)> {
        filter.query()
    }

    fn matches(&self, filter: &UserFilter) -> bool {
        filter.matches(self)
    }

    fn validate_draft(draft: &NewUser) -> DomainResult<()> {
        draft.validate()
    }

    fn materialize(id: u64, draft: NewUser, db: &MockDb) -> Self {
        User {
            id: UserId::new(id),
            team: team_snapshot(db, draft.team_id),
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: draft.email,
            role: draft.role,
            team_id: draft.team_id,
            speciality: draft.speciality,
            phone: draft.phone,
        }
    }

    fn validate_patch(&self, patch: &UserPatch) -> DomainResult<()> {
        patch.validate()
    }

    fn merge(&mut self, patch: &UserPatch, db: &MockDb) {
        if patch.apply(self) {
            self.team = team_snapshot(db, self.team_id);
        }
    }

    fn on_local_delete(id: u64, db: &MockDb) {
        let user_id = UserId::new(id);
        db.participants.remove_where(|p| p.user_id == user_id);
        db.attendance.remove_where(|a| a.user_id == user_id);
    }
}

impl Record for Team {
    type Id = TeamId;
    type Draft = NewTeam;
    type Patch = TeamPatch;
    type Filter = ();

    const RESOURCE: &'static str = "teams";

    fn store(db: &MockDb) -> &LocalStore<Self> {
        &db.teams
    }

    fn query(_filter: &()) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn matches(&self, _filter: &()) -> bool {
        true
    }

    fn validate_draft(draft: &NewTeam) -> DomainResult<()> {
        draft.validate()
    }

    fn materialize(id: u64, draft: NewTeam, _db: &MockDb) -> Self {
        Team {
            id: TeamId::new(id),
            name: draft.name,
            speciality: draft.speciality,
            description: draft.description,
        }
    }

    fn validate_patch(&self, patch: &TeamPatch) -> DomainResult<()> {
        patch.validate()
    }

    fn merge(&mut self, patch: &TeamPatch, _db: &MockDb) {
        patch.apply(self);
    }
}

impl Record for Formation {
    type Id = FormationId;
    type Draft = NewFormation;
    type Patch = FormationPatch;
    type Filter = FormationFilter;

    const RESOURCE: &'static str = "formations";

    fn store(db: &MockDb) -> &LocalStore<Self> {
        &db.formations
    }

    fn query(filter: &FormationFilter) -> Vec<(&'static str, String)> {
        filter.query()
    }

    fn matches(&self, filter: &FormationFilter) -> bool {
        filter.matches(self)
    }

    fn validate_draft(draft: &NewFormation) -> DomainResult<()> {
        draft.validate()
    }

    fn materialize(id: u64, draft: NewFormation, db: &MockDb) -> Self {
        let team = team_snapshot(db, draft.team_id);
        let formateur = person_snapshot(db, draft.formateur_id);
        let mut formation = draft.into_formation(FormationId::new(id));
        formation.team = team;
        formation.formateur = formateur;
        formation
    }

    fn validate_patch(&self, patch: &FormationPatch) -> DomainResult<()> {
        patch.validate_against(self)
    }

    fn merge(&mut self, patch: &FormationPatch, db: &MockDb) {
        let change = patch.apply(self);
        if change.team {
            self.team = team_snapshot(db, self.team_id);
        }
        if change.formateur {
            self.formateur = person_snapshot(db, self.formateur_id);
        }
    }

    fn on_local_delete(id: u64, db: &MockDb) {
        let formation_id = FormationId::new(id);
        db.participants.remove_where(|p| p.formation_id == formation_id);
        db.attendance.remove_where(|a| a.formation_id == formation_id);
    }
}
