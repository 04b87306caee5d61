//! Route handlers, one module per audience.

pub mod admin;
pub mod auth;
pub mod doctor;
pub mod patient;

use hms_core::Role;

/// Landing page of each role after login.
pub(crate) fn dashboard_path(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin/dashboard",
        Role::Doctor => "/doctor/dashboard",
        Role::Patient => "/patient/dashboard",
    }
}
