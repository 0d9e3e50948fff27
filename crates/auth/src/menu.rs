//! Sidebar entries per role.

use serde::Serialize;

use formadmin_core::NormalizedRole;

use crate::Principal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub label: &'static str,
    pub path: &'static str,
    pub icon: &'static str,
}

const fn item(label: &'static str, path: &'static str, icon: &'static str) -> MenuItem {
    MenuItem { label, path, icon }
}

const ADMIN_MENU: &[MenuItem] = &[
    item("Dashboard", "/admin/dashboard", "pi pi-home"),
    item("Users", "/admin/users", "pi pi-users"),
    item("Teams", "/admin/teams", "pi pi-sitemap"),
    item("Formations", "/admin/formations", "pi pi-book"),
    item("Attendance", "/admin/attendance", "pi pi-check-square"),
    item("Reports", "/admin/reports", "pi pi-chart-bar"),
];

const TRAINER_MENU: &[MenuItem] = &[
    item("Dashboard", "/formateur/dashboard", "pi pi-home"),
    item("My formations", "/formateur/formations", "pi pi-book"),
    item("Attendance", "/formateur/attendance", "pi pi-check-square"),
    item("Documents", "/formateur/documents", "pi pi-file"),
    item("Profile", "/formateur/profile", "pi pi-user"),
];

const EMPLOYEE_MENU: &[MenuItem] = &[
    item("Dashboard", "/employe/dashboard", "pi pi-home"),
    item("My formations", "/employe/formations", "pi pi-book"),
    item("Documents", "/employe/documents", "pi pi-file"),
    item("Profile", "/employe/profile", "pi pi-user"),
];

/// Menu for a resolved role. Unknown roles get no menu at all.
pub fn menu_for_role(role: Option<NormalizedRole>) -> &'static [MenuItem] {
    match role {
        Some(NormalizedRole::Admin) => ADMIN_MENU,
        Some(NormalizedRole::Trainer) => TRAINER_MENU,
        Some(NormalizedRole::Employee) => EMPLOYEE_MENU,
        None => &[],
    }
}

pub fn menu_for(principal: Option<&Principal>) -> &'static [MenuItem] {
    menu_for_role(principal.and_then(|p| p.normalized_role()))
}
