//! User accounts as exposed by `/api/users`.

use serde::{Deserialize, Serialize};

use crate::{DomainError, DomainResult, NormalizedRole, PersonSnapshot, TeamId, TeamSnapshot, UserId, resolve_role};

/// A user account.
///
/// `role` is kept raw; use [`User::normalized_role`] to interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    #[serde(default, alias = "equipe_id", skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<TeamSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speciality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl User {
    pub fn normalized_role(&self) -> Option<NormalizedRole> {
        resolve_role(Some(self.role.as_str()))
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn snapshot(&self) -> PersonSnapshot {
        PersonSnapshot {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Input for creating a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speciality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Only forwarded to the backend; never kept locally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> DomainResult<()> {
        validate_email(&self.email)?;
        if resolve_role(Some(self.role.as_str())).is_none() {
            return Err(DomainError::validation(format!("unknown role '{}'", self.role)));
        }
        Ok(())
    }
}

/// Partial update of a user; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speciality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl UserPatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(role) = &self.role {
            if resolve_role(Some(role.as_str())).is_none() {
                return Err(DomainError::validation(format!("unknown role '{role}'")));
            }
        }
        Ok(())
    }

    /// Merge into `user`. Returns `true` when the team reference changed.
    pub fn apply(&self, user: &mut User) -> bool {
        if let Some(v) = &self.first_name {
            user.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            user.last_name = v.clone();
        }
        if let Some(v) = &self.email {
            user.email = v.clone();
        }
        if let Some(v) = &self.role {
            user.role = v.clone();
        }
        if let Some(v) = &self.speciality {
            user.speciality = Some(v.clone());
        }
        if let Some(v) = &self.phone {
            user.phone = Some(v.clone());
        }
        match self.team_id {
            Some(team_id) if user.team_id != Some(team_id) => {
                user.team_id = Some(team_id);
                true
            }
            _ => false,
        }
    }
}

/// Query filter for `GET /users`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub role: Option<String>,
}

impl UserFilter {
    pub fn by_role(role: impl Into<String>) -> Self {
        Self { role: Some(role.into()) }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        self.role.iter().map(|r| ("role", r.clone())).collect()
    }

    /// Local equivalent of the backend's role filter.
    ///
    /// Synonyms match each other (`formateur` finds `trainer` accounts); a
    /// filter value outside the synonym table only matches verbatim.
    pub fn matches(&self, user: &User) -> bool {
        let Some(wanted) = &self.role else {
            return true;
        };
        match resolve_role(Some(wanted.as_str())) {
            Some(role) => user.normalized_role() == Some(role),
            None => user.role == *wanted,
        }
    }
}

fn validate_email(email: &str) -> DomainResult<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(DomainError::validation(format!("invalid email '{email}'"))),
    }
}
