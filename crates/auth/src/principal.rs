use serde::{Deserialize, Serialize};

use formadmin_core::{NormalizedRole, User, UserId, resolve_role};

use crate::Area;

/// The authenticated user held in the session slot.
///
/// `role` is the raw string the backend (or a demo switch) produced; it is
/// only ever interpreted through [`resolve_role`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speciality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Principal {
    pub fn normalized_role(&self) -> Option<NormalizedRole> {
        resolve_role(Some(self.role.as_str()))
    }

    pub fn home_area(&self) -> Area {
        crate::home_area_for(self.normalized_role())
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            team: user.team.as_ref().map(|t| t.name.clone()),
            speciality: user.speciality.clone(),
            phone: user.phone.clone(),
        }
    }
}
