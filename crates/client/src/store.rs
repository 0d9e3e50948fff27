//! Local mock store used while the backend is unreachable.
//!
//! Each collection is a single in-memory vector behind a lock held only for
//! the synchronous mutation, so operations from one session apply in call
//! order.

use std::sync::{PoisonError, RwLock};

use chrono::NaiveDate;

use formadmin_core::{
    AttendanceRecord, DomainError, Formation, FormationParticipant, FormationStatus, NewFormation,
    NewTeam, NewUser, ParticipantId, Team, TeamId, User, UserId,
};

use crate::record::{Record, person_snapshot};

/// Records addressable by a numeric id.
pub trait Keyed {
    fn key(&self) -> u64;
}

impl Keyed for User {
    fn key(&self) -> u64 {
        self.id.get()
    }
}

impl Keyed for Team {
    fn key(&self) -> u64 {
        self.id.get()
    }
}

impl Keyed for Formation {
    fn key(&self) -> u64 {
        self.id.get()
    }
}

impl Keyed for FormationParticipant {
    fn key(&self) -> u64 {
        self.id.get()
    }
}

impl Keyed for AttendanceRecord {
    fn key(&self) -> u64 {
        self.id.get()
    }
}

#[derive(Debug)]
struct StoreState<T> {
    records: Vec<T>,
    /// Highest id ever handed out or seen; ids are never reused.
    high_water: u64,
}

impl<T: Keyed> StoreState<T> {
    fn next_id(&self) -> u64 {
        let max_existing = self.records.iter().map(Keyed::key).max().unwrap_or(0);
        self.high_water.max(max_existing) + 1
    }

    fn commit(&mut self, id: u64, record: T) {
        self.high_water = self.high_water.max(id).max(record.key());
        self.records.push(record);
    }
}

/// One collection of the mock store.
#[derive(Debug)]
pub struct LocalStore<T> {
    entity: &'static str,
    inner: RwLock<StoreState<T>>,
}

impl<T: Keyed + Clone> LocalStore<T> {
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            inner: RwLock::new(StoreState {
                records: Vec::new(),
                high_water: 0,
            }),
        }
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, StoreState<T>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, StoreState<T>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current contents in insertion order.
    pub fn snapshot(&self) -> Vec<T> {
        self.read().records.clone()
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, id: u64) -> Option<T> {
        self.read().records.iter().find(|r| r.key() == id).cloned()
    }

    pub fn find_where<P>(&self, pred: P) -> Option<T>
    where
        P: Fn(&T) -> bool,
    {
        self.read().records.iter().find(|r| pred(r)).cloned()
    }

    /// Insert a record built from a freshly allocated id
    /// (`max(existing, previously allocated) + 1`).
    pub fn try_insert_with<E, F>(&self, build: F) -> Result<T, E>
    where
        F: FnOnce(u64) -> Result<T, E>,
    {
        self.find_or_try_insert(|_| false, |id, _| build(id))
    }

    pub fn insert_with<F>(&self, build: F) -> T
    where
        F: FnOnce(u64) -> T,
    {
        match self.try_insert_with::<core::convert::Infallible, _>(|id| Ok(build(id))) {
            Ok(record) => record,
            Err(never) => match never {},
        }
    }

    /// Return the first record matching `existing`, or insert the one `build`
    /// makes from a fresh id.
    ///
    /// Lookup, id allocation and insert happen under one write guard. `build`
    /// also sees the current records so it can enforce collection-wide limits;
    /// it must not touch this store itself.
    pub fn find_or_try_insert<P, E, F>(&self, existing: P, build: F) -> Result<T, E>
    where
        P: Fn(&T) -> bool,
        F: FnOnce(u64, &[T]) -> Result<T, E>,
    {
        let mut state = self.write();
        if let Some(found) = state.records.iter().find(|r| existing(r)) {
            return Ok(found.clone());
        }

        let id = state.next_id();
        let record = build(id, &state.records)?;
        state.commit(id, record.clone());
        Ok(record)
    }

    /// Mutate the record with `id`. The change is committed only if `f`
    /// succeeds.
    pub fn update<E, F>(&self, id: u64, f: F) -> Result<T, E>
    where
        E: From<DomainError>,
        F: FnOnce(&mut T) -> Result<(), E>,
    {
        let mut state = self.write();
        let Some(slot) = state.records.iter_mut().find(|r| r.key() == id) else {
            return Err(DomainError::not_found(self.entity, id).into());
        };

        let mut draft = slot.clone();
        f(&mut draft)?;
        *slot = draft.clone();
        Ok(draft)
    }

    /// Update the first record matching `pred`, or insert a new one, under a
    /// single write guard.
    pub fn upsert_where<P, U, B>(&self, pred: P, update: U, build: B) -> T
    where
        P: Fn(&T) -> bool,
        U: FnOnce(&mut T),
        B: FnOnce(u64) -> T,
    {
        let mut state = self.write();
        if let Some(slot) = state.records.iter_mut().find(|r| pred(r)) {
            update(slot);
            return slot.clone();
        }

        let id = state.next_id();
        let record = build(id);
        state.commit(id, record.clone());
        record
    }

    /// Remove by id. Returns whether something was removed.
    pub fn remove(&self, id: u64) -> bool {
        self.remove_where(|r| r.key() == id) > 0
    }

    pub fn remove_where<P>(&self, pred: P) -> usize
    where
        P: Fn(&T) -> bool,
    {
        let mut state = self.write();
        let before = state.records.len();
        state.records.retain(|r| !pred(r));
        before - state.records.len()
    }
}

/// All local collections of one session.
#[derive(Debug)]
pub struct MockDb {
    pub users: LocalStore<User>,
    pub teams: LocalStore<Team>,
    pub formations: LocalStore<Formation>,
    pub participants: LocalStore<FormationParticipant>,
    pub attendance: LocalStore<AttendanceRecord>,
}

impl MockDb {
    pub fn empty() -> Self {
        Self {
            users: LocalStore::new("user"),
            teams: LocalStore::new("team"),
            formations: LocalStore::new("formation"),
            participants: LocalStore::new("participant"),
            attendance: LocalStore::new("attendance"),
        }
    }

    /// Demo dataset served when the backend is unreachable from the start.
    pub fn seeded() -> Self {
        let db = Self::empty();

        for (name, speciality, description) in [
            ("Développement Web", "Web", "Front-end and back-end web development"),
            ("UI/UX Design", "Design", "Interface and experience design"),
            ("Data Science", "Data", "Analytics and machine learning"),
        ] {
            seed::<Team>(&db, NewTeam {
                name: name.to_string(),
                speciality: Some(speciality.to_string()),
                description: Some(description.to_string()),
            });
        }

        for (first, last, email, role, team, speciality) in [
            ("Admin", "Principal", "admin@formation.com", "admin", None, None),
            ("Karim", "Mansour", "karim.mansour@formation.com", "formateur", Some(1), Some("Angular")),
            ("Leila", "Ben Salah", "leila.bensalah@formation.com", "formateur", Some(2), Some("UX Research")),
            ("Sara", "Khelifi", "sara.khelifi@formation.com", "employe", Some(1), None),
            ("Omar", "Gharbi", "omar.gharbi@formation.com", "employe", Some(2), None),
            ("Ines", "Chaabane", "ines.chaabane@formation.com", "employe", Some(3), None),
        ] {
            seed::<User>(&db, NewUser {
                first_name: first.to_string(),
                last_name: last.to_string(),
                email: email.to_string(),
                role: role.to_string(),
                team_id: team.map(TeamId::new),
                speciality: speciality.map(str::to_string),
                phone: None,
                password: None,
            });
        }

        for (name, team, trainer, status, start, end) in [
            ("Angular avancé", 1, 2, FormationStatus::InProgress, (2025, 1, 13), (2025, 1, 17)),
            ("Design Thinking", 2, 3, FormationStatus::Planned, (2025, 2, 3), (2025, 2, 5)),
            ("Python pour la data", 3, 2, FormationStatus::Completed, (2024, 11, 4), (2024, 11, 8)),
        ] {
            seed::<Formation>(&db, NewFormation {
                name: name.to_string(),
                description: None,
                start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2),
                end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2),
                status: Some(status),
                team_id: Some(TeamId::new(team)),
                formateur_id: Some(UserId::new(trainer)),
                location: Some("Salle A".to_string()),
                max_participants: Some(15),
            });
        }

        for (formation, user) in [(1, 4), (2, 5), (3, 6)] {
            let user_id = UserId::new(user);
            db.participants.insert_with(|id| FormationParticipant {
                id: ParticipantId::new(id),
                formation_id: formadmin_core::FormationId::new(formation),
                user_id,
                user: person_snapshot(&db, Some(user_id)),
            });
        }

        db
    }
}

impl Default for MockDb {
    fn default() -> Self {
        Self::empty()
    }
}

fn seed<R: Record>(db: &MockDb, draft: R::Draft) {
    R::store(db).insert_with(|id| R::materialize(id, draft, db));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_max_plus_one_and_never_reused() {
        let store: LocalStore<Team> = LocalStore::new("team");
        let make = |id: u64| Team {
            id: TeamId::new(id),
            name: format!("team {id}"),
            speciality: None,
            description: None,
        };

        let ids: Vec<u64> = (0..5).map(|_| store.insert_with(make).id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);

        assert!(store.remove(5));
        assert_eq!(store.insert_with(make).id.get(), 6);
    }

    #[test]
    fn failed_update_leaves_record_untouched() {
        let db = MockDb::seeded();
        let before = db.teams.find(1).unwrap();

        let result: Result<Team, DomainError> = db.teams.update(1, |t| {
            t.name = "changed".to_string();
            Err(DomainError::validation("nope"))
        });
        assert!(result.is_err());
        assert_eq!(db.teams.find(1).unwrap(), before);
    }

    #[test]
    fn update_of_missing_record_is_not_found() {
        let db = MockDb::empty();
        let result: Result<Team, DomainError> = db.teams.update(9, |_| Ok(()));
        assert_eq!(result.unwrap_err(), DomainError::not_found("team", 9));
    }

    #[test]
    fn seeded_relations_are_materialized() {
        let db = MockDb::seeded();

        let design = db.teams.find(2).unwrap();
        assert_eq!(design.name, "UI/UX Design");
        assert_eq!(design.speciality.as_deref(), Some("Design"));

        let angular = db.formations.find(1).unwrap();
        assert_eq!(angular.team.as_ref().map(|t| t.name.as_str()), Some("Développement Web"));
        assert_eq!(angular.formateur.as_ref().map(|p| p.first_name.as_str()), Some("Karim"));

        let sara = db.users.find(4).unwrap();
        assert_eq!(sara.team.as_ref().map(|t| t.id), Some(TeamId::new(1)));

        assert_eq!(db.participants.len(), 3);
    }

    #[test]
    fn upsert_updates_or_inserts() {
        let db = MockDb::seeded();
        let p = db.participants.upsert_where(
            |p| p.user_id == UserId::new(4) && p.formation_id.get() == 1,
            |_| {},
            |_| unreachable!("already enrolled"),
        );
        assert_eq!(p.id.get(), 1);
        assert_eq!(db.participants.len(), 3);
    }
}
