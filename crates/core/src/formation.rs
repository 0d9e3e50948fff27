//! Formations (training sessions) and their enrolled participants.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    DomainError, DomainResult, FormationId, ParticipantId, PersonSnapshot, TeamId, TeamSnapshot,
    UserId,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormationStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

impl FormationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormationStatus::Planned => "planned",
            FormationStatus::InProgress => "in_progress",
            FormationStatus::Completed => "completed",
            FormationStatus::Cancelled => "cancelled",
        }
    }
}

/// A training session.
///
/// `team` and `formateur` are snapshots of the records referenced by
/// `team_id` / `formateur_id` when the formation was last written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formation {
    pub id: FormationId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: FormationStatus,
    #[serde(default, alias = "equipe_id", skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formateur_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<TeamSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formateur: Option<PersonSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<u32>,
}

/// Input for creating a formation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFormation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<FormationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formateur_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<u32>,
}

impl NewFormation {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("formation name must not be empty"));
        }
        check_dates(self.start_date, self.end_date)
    }

    /// Materialize a record without relation snapshots.
    pub fn into_formation(self, id: FormationId) -> Formation {
        Formation {
            id,
            name: self.name,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            status: self.status.unwrap_or_default(),
            team_id: self.team_id,
            formateur_id: self.formateur_id,
            team: None,
            formateur: None,
            location: self.location,
            max_participants: self.max_participants,
        }
    }
}

/// Which foreign keys a patch touched.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RelationChange {
    pub team: bool,
    pub formateur: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<FormationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formateur_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<u32>,
}

impl FormationPatch {
    /// Validate the patch against the record it will be merged into.
    pub fn validate_against(&self, current: &Formation) -> DomainResult<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("formation name must not be empty"));
            }
        }
        check_dates(
            self.start_date.or(current.start_date),
            self.end_date.or(current.end_date),
        )
    }

    pub fn apply(&self, formation: &mut Formation) -> RelationChange {
        if let Some(v) = &self.name {
            formation.name = v.clone();
        }
        if let Some(v) = &self.description {
            formation.description = Some(v.clone());
        }
        if let Some(v) = self.start_date {
            formation.start_date = Some(v);
        }
        if let Some(v) = self.end_date {
            formation.end_date = Some(v);
        }
        if let Some(v) = self.status {
            formation.status = v;
        }
        if let Some(v) = &self.location {
            formation.location = Some(v.clone());
        }
        if let Some(v) = self.max_participants {
            formation.max_participants = Some(v);
        }

        let mut change = RelationChange::default();
        if let Some(team_id) = self.team_id {
            change.team = formation.team_id != Some(team_id);
            formation.team_id = Some(team_id);
        }
        if let Some(formateur_id) = self.formateur_id {
            change.formateur = formation.formateur_id != Some(formateur_id);
            formation.formateur_id = Some(formateur_id);
        }
        change
    }
}

/// Query filter for `GET /formations`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormationFilter {
    pub status: Option<FormationStatus>,
    pub team_id: Option<TeamId>,
    pub formateur_id: Option<UserId>,
    /// Keep formations still running on or after this date.
    pub from: Option<NaiveDate>,
    /// Keep formations starting on or before this date.
    pub to: Option<NaiveDate>,
}

impl FormationFilter {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut q = Vec::new();
        if let Some(status) = self.status {
            q.push(("status", status.as_str().to_string()));
        }
        if let Some(team_id) = self.team_id {
            q.push(("team_id", team_id.to_string()));
        }
        if let Some(formateur_id) = self.formateur_id {
            q.push(("formateur_id", formateur_id.to_string()));
        }
        if let Some(from) = self.from {
            q.push(("from", from.to_string()));
        }
        if let Some(to) = self.to {
            q.push(("to", to.to_string()));
        }
        q
    }

    pub fn matches(&self, formation: &Formation) -> bool {
        if self.status.is_some_and(|s| s != formation.status) {
            return false;
        }
        if self.team_id.is_some() && self.team_id != formation.team_id {
            return false;
        }
        if self.formateur_id.is_some() && self.formateur_id != formation.formateur_id {
            return false;
        }
        if let Some(from) = self.from {
            match formation.end_date.or(formation.start_date) {
                Some(last_day) if last_day >= from => {}
                _ => return false,
            }
        }
        if let Some(to) = self.to {
            match formation.start_date {
                Some(first_day) if first_day <= to => {}
                _ => return false,
            }
        }
        true
    }
}

/// Enrollment of a user in a formation (`/formations/{id}/participants`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormationParticipant {
    pub id: ParticipantId,
    pub formation_id: FormationId,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<PersonSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewParticipant {
    pub user_id: UserId,
}

fn check_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> DomainResult<()> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(DomainError::validation(format!(
            "end date {end} is before start date {start}"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn formation() -> Formation {
        NewFormation {
            name: "Rust avancé".to_string(),
            start_date: Some(date(2026, 3, 2)),
            end_date: Some(date(2026, 3, 6)),
            team_id: Some(TeamId::new(1)),
            ..Default::default()
        }
        .into_formation(FormationId::new(1))
    }

    #[test]
    fn draft_validation() {
        let mut draft = NewFormation {
            name: "  ".to_string(),
            ..Default::default()
        };
        assert!(draft.validate().is_err());

        draft.name = "Angular".to_string();
        draft.start_date = Some(date(2026, 5, 10));
        draft.end_date = Some(date(2026, 5, 9));
        assert!(draft.validate().is_err());

        draft.end_date = Some(date(2026, 5, 10));
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn patch_detects_relation_changes() {
        let mut f = formation();
        let change = FormationPatch {
            team_id: Some(TeamId::new(1)),
            formateur_id: Some(UserId::new(5)),
            ..Default::default()
        }
        .apply(&mut f);
        assert!(!change.team);
        assert!(change.formateur);
        assert_eq!(f.formateur_id, Some(UserId::new(5)));
    }

    #[test]
    fn patch_validation_uses_current_dates() {
        let f = formation();
        let patch = FormationPatch {
            end_date: Some(date(2026, 3, 1)),
            ..Default::default()
        };
        assert!(patch.validate_against(&f).is_err());
    }

    #[test]
    fn filter_date_range_overlaps() {
        let f = formation();
        let inside = FormationFilter {
            from: Some(date(2026, 3, 5)),
            to: Some(date(2026, 3, 31)),
            ..Default::default()
        };
        assert!(inside.matches(&f));

        let after = FormationFilter {
            from: Some(date(2026, 3, 7)),
            ..Default::default()
        };
        assert!(!after.matches(&f));
    }

    #[test]
    fn filter_query_pairs() {
        let filter = FormationFilter {
            status: Some(FormationStatus::InProgress),
            team_id: Some(TeamId::new(2)),
            ..Default::default()
        };
        assert_eq!(
            filter.query(),
            vec![("status", "in_progress".to_string()), ("team_id", "2".to_string())]
        );
    }
}
