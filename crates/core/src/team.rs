//! Teams (`equipes`) as exposed by `/api/teams`.

use serde::{Deserialize, Serialize};

use crate::{DomainError, DomainResult, TeamId, TeamSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speciality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Team {
    pub fn snapshot(&self) -> TeamSnapshot {
        TeamSnapshot {
            id: self.id,
            name: self.name.clone(),
            speciality: self.speciality.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speciality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewTeam {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("team name must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speciality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TeamPatch {
    pub fn validate(&self) -> DomainResult<()> {
        match &self.name {
            Some(name) if name.trim().is_empty() => {
                Err(DomainError::validation("team name must not be empty"))
            }
            _ => Ok(()),
        }
    }

    pub fn apply(&self, team: &mut Team) {
        if let Some(v) = &self.name {
            team.name = v.clone();
        }
        if let Some(v) = &self.speciality {
            team.speciality = Some(v.clone());
        }
        if let Some(v) = &self.description {
            team.description = Some(v.clone());
        }
    }
}
