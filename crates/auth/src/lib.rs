//! `formadmin-auth`: pure navigation authorization (no IO, no storage).
//!
//! Guards, the post-login redirector and the menu builder all go through
//! [`formadmin_core::resolve_role`]; nothing in this crate interprets a raw
//! role string on its own.

pub mod area;
pub mod authorize;
pub mod menu;
pub mod principal;

pub use area::{Access, Area, RouteAuthorization, RouteTable, RouteTableError};
pub use authorize::{
    Decision, NavigationExplanation, can_enter, explain_navigation, guest_only, home_area_for,
    post_login_target,
};
pub use formadmin_core::{NormalizedRole, resolve_role};
pub use menu::{MenuItem, menu_for, menu_for_role};
pub use principal::Principal;
