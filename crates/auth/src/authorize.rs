use std::collections::BTreeSet;

use serde::Serialize;

use formadmin_core::{NormalizedRole, resolve_role};

use crate::{Access, Area, Principal, RouteTable};

/// Outcome of a guard check. The caller performs the navigation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    DenyRedirectToLogin,
    DenyRedirectToAuthorizedArea(Area),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Path to navigate to instead, if denied.
    pub fn redirect_path(&self) -> Option<&'static str> {
        match self {
            Decision::Allow => None,
            Decision::DenyRedirectToLogin => Some(Area::Auth.home_path()),
            Decision::DenyRedirectToAuthorizedArea(area) => Some(area.home_path()),
        }
    }
}

/// Landing area of a role. Unknown roles land on the login page.
pub fn home_area_for(role: Option<NormalizedRole>) -> Area {
    match role {
        Some(NormalizedRole::Admin) => Area::Admin,
        Some(NormalizedRole::Trainer) => Area::Trainer,
        Some(NormalizedRole::Employee) => Area::Employee,
        None => Area::Auth,
    }
}

/// Where to send a user right after a successful login, before the session
/// necessarily holds a principal.
pub fn post_login_target(raw_role: &str) -> Area {
    home_area_for(resolve_role(Some(raw_role)))
}

/// Role guard.
///
/// - No IO
/// - No side effects
pub fn can_enter(principal: Option<&Principal>, required: &BTreeSet<NormalizedRole>) -> Decision {
    let Some(principal) = principal else {
        return Decision::DenyRedirectToLogin;
    };
    if required.is_empty() {
        return Decision::Allow;
    }

    let role = principal.normalized_role();
    match role {
        Some(r) if required.contains(&r) => Decision::Allow,
        _ => Decision::DenyRedirectToAuthorizedArea(home_area_for(role)),
    }
}

/// Guard for pages that only make sense without a session (login).
///
/// Principals with a known role are sent to their home area. A principal
/// whose role is unknown has the login page itself as its home area, so it
/// is let through: redirecting it would loop back onto this same page.
pub fn guest_only(principal: Option<&Principal>) -> Decision {
    match principal.map(Principal::home_area) {
        Some(home) if home != Area::Auth => Decision::DenyRedirectToAuthorizedArea(home),
        _ => Decision::Allow,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Navigation Explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Why a navigation was allowed or denied (for debugging and audit logs).
#[derive(Debug, Clone, Serialize)]
pub struct NavigationExplanation {
    pub path: String,
    pub area: Option<Area>,
    pub raw_role: Option<String>,
    pub resolved_role: Option<NormalizedRole>,
    pub decision: Decision,
    pub reason: String,
}

pub fn explain_navigation(
    table: &RouteTable,
    principal: Option<&Principal>,
    path: &str,
) -> NavigationExplanation {
    let route = table.lookup(path);
    let decision = table.navigate(principal, path);
    let raw_role = principal.map(|p| p.role.clone());
    let resolved_role = principal.and_then(|p| p.normalized_role());

    let reason = match (route, principal) {
        (None, _) => format!("no route authorization covers '{path}'"),
        (Some(route), None) => match route.access {
            Access::GuestOnly => "guest-only area and no session".to_string(),
            Access::Roles(_) => format!("area '{}' requires a session", route.area),
        },
        (Some(route), Some(p)) => match &route.access {
            Access::GuestOnly if p.home_area() == Area::Auth => {
                format!("guest-only area; role '{}' is not recognized", p.role)
            }
            Access::GuestOnly => format!(
                "guest-only area; already signed in, sending to '{}'",
                p.home_area()
            ),
            Access::Roles(required) if required.is_empty() => {
                format!("area '{}' admits any signed-in user", route.area)
            }
            Access::Roles(required) => match resolved_role {
                None => format!("role '{}' is not recognized", p.role),
                Some(r) if required.contains(&r) => {
                    format!("role '{r}' is allowed in area '{}'", route.area)
                }
                Some(r) => format!(
                    "role '{r}' is not allowed in area '{}'; sending to '{}'",
                    route.area,
                    home_area_for(Some(r))
                ),
            },
        },
    };

    NavigationExplanation {
        path: path.to_string(),
        area: route.map(|r| r.area),
        raw_role,
        resolved_role,
        decision,
        reason,
    }
}
