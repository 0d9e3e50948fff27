//! Navigable areas and the route authorization table.

use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use formadmin_core::NormalizedRole;

use crate::{Decision, Principal, can_enter, guest_only};

/// A navigable subtree of the application.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Area {
    /// Login and other public authentication pages.
    Auth,
    Admin,
    Trainer,
    Employee,
    /// Fallback page shown to authenticated users with no usable area.
    Unauthorized,
}

impl Area {
    pub const ALL: [Area; 5] = [
        Area::Auth,
        Area::Admin,
        Area::Trainer,
        Area::Employee,
        Area::Unauthorized,
    ];

    /// Entry page of the area (redirect target).
    pub fn home_path(&self) -> &'static str {
        match self {
            Area::Auth => "/auth/login",
            Area::Admin => "/admin/dashboard",
            Area::Trainer => "/formateur/dashboard",
            Area::Employee => "/employe/dashboard",
            Area::Unauthorized => "/unauthorized",
        }
    }
}

impl core::fmt::Display for Area {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Area::Auth => "auth",
            Area::Admin => "admin",
            Area::Trainer => "trainer",
            Area::Employee => "employee",
            Area::Unauthorized => "unauthorized",
        };
        f.write_str(name)
    }
}

/// Who may enter an area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Only visitors without a session (login page).
    GuestOnly,
    /// Authenticated principals whose role is in the set; an empty set admits
    /// any authenticated principal.
    Roles(BTreeSet<NormalizedRole>),
}

impl Access {
    pub fn roles(roles: impl IntoIterator<Item = NormalizedRole>) -> Self {
        Self::Roles(roles.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAuthorization {
    pub area: Area,
    pub prefix: Cow<'static, str>,
    pub access: Access,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteTableError {
    #[error("area '{0}' has no route")]
    UnreachableArea(Area),

    #[error("area '{0}' is declared more than once")]
    DuplicateArea(Area),

    #[error("invalid prefix '{0}': must start with '/' and name a segment")]
    InvalidPrefix(String),

    #[error("prefixes '{0}' and '{1}' overlap")]
    OverlappingPrefixes(String, String),
}

/// Declarative association between path prefixes and the roles allowed in.
///
/// A valid table partitions the application: each [`Area`] owns exactly one
/// prefix and no prefix contains another.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteAuthorization>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteAuthorization>) -> Result<Self, RouteTableError> {
        let table = Self { routes };
        table.validate()?;
        Ok(table)
    }

    /// The application's route layout.
    pub fn standard() -> Self {
        Self {
            routes: vec![
                RouteAuthorization {
                    area: Area::Auth,
                    prefix: Cow::Borrowed("/auth"),
                    access: Access::GuestOnly,
                },
                RouteAuthorization {
                    area: Area::Admin,
                    prefix: Cow::Borrowed("/admin"),
                    access: Access::roles([NormalizedRole::Admin]),
                },
                RouteAuthorization {
                    area: Area::Trainer,
                    prefix: Cow::Borrowed("/formateur"),
                    access: Access::roles([NormalizedRole::Trainer]),
                },
                RouteAuthorization {
                    area: Area::Employee,
                    prefix: Cow::Borrowed("/employe"),
                    access: Access::roles([NormalizedRole::Employee]),
                },
                RouteAuthorization {
                    area: Area::Unauthorized,
                    prefix: Cow::Borrowed("/unauthorized"),
                    access: Access::Roles(BTreeSet::new()),
                },
            ],
        }
    }

    pub fn routes(&self) -> &[RouteAuthorization] {
        &self.routes
    }

    pub fn validate(&self) -> Result<(), RouteTableError> {
        for route in &self.routes {
            let p = route.prefix.as_ref();
            if !p.starts_with('/') || p.len() < 2 || p.ends_with('/') {
                return Err(RouteTableError::InvalidPrefix(p.to_string()));
            }
        }

        for area in Area::ALL {
            match self.routes.iter().filter(|r| r.area == area).count() {
                0 => return Err(RouteTableError::UnreachableArea(area)),
                1 => {}
                _ => return Err(RouteTableError::DuplicateArea(area)),
            }
        }

        for (i, a) in self.routes.iter().enumerate() {
            for b in &self.routes[i + 1..] {
                if covers(&a.prefix, &b.prefix) || covers(&b.prefix, &a.prefix) {
                    return Err(RouteTableError::OverlappingPrefixes(
                        a.prefix.to_string(),
                        b.prefix.to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Find the route owning `path`. Query strings and fragments are ignored.
    pub fn lookup(&self, path: &str) -> Option<&RouteAuthorization> {
        let path = strip_query(path);
        self.routes
            .iter()
            .filter(|r| covers(&r.prefix, path))
            .max_by_key(|r| r.prefix.len())
    }

    /// Guard decision for navigating to `path`.
    ///
    /// Unknown paths fail closed.
    pub fn navigate(&self, principal: Option<&Principal>, path: &str) -> Decision {
        let Some(route) = self.lookup(path) else {
            tracing::debug!(path, "no route authorization for path; failing closed");
            return Decision::DenyRedirectToLogin;
        };

        let decision = match &route.access {
            Access::GuestOnly => guest_only(principal),
            Access::Roles(required) => can_enter(principal, required),
        };

        if !decision.is_allowed() {
            tracing::debug!(path, area = %route.area, ?decision, "navigation denied");
        }
        decision
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// `prefix` owns `path` on a segment boundary (`/admin` owns `/admin/users`
/// but not `/administration`).
fn covers(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn strip_query(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}
