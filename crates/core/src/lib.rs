//! # HMS Core
//!
//! Business logic for the hospital management service.
//!
//! This crate contains the record model and every operation on it:
//! - principals, credentials and authentication ([`identity`])
//! - role and ownership checks ([`access`])
//! - departments and directory search ([`directory`])
//! - availability windows, appointments and treatments
//! - the transactional JSON-snapshot store ([`store`])
//!
//! **No API concerns**: sessions, cookies and HTTP routing belong in `api-shared` and
//! `api-rest`.

pub mod access;
pub mod appointments;
pub mod availability;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod directory;
pub mod error;
pub mod identity;
pub mod ids;
pub mod password;
pub mod store;
pub mod treatment;
pub mod validation;

pub use config::CoreConfig;
pub use error::{ConflictReason, HospitalError, HospitalResult};
pub use identity::{Principal, PrincipalRef, Role};
pub use store::{Store, Tables, UnitOfWork};

use constants::DEFAULT_ADMIN_EMAIL;
use hms_types::EmailAddress;

/// Opens the store under `cfg.data_dir()` and seeds the fixed departments and the
/// administrator account. Safe to run on every start.
///
/// # Errors
///
/// Returns `HospitalError` if the store cannot be opened or the seed transaction fails.
pub fn bootstrap(cfg: &CoreConfig) -> HospitalResult<Store> {
    let store = Store::open(cfg.data_dir())?;
    seed(&store, cfg)?;
    Ok(store)
}

/// Seeds departments and the administrator into an already opened store.
pub fn seed(store: &Store, cfg: &CoreConfig) -> HospitalResult<()> {
    let email = EmailAddress::parse(DEFAULT_ADMIN_EMAIL)?;
    store.transaction(|uow| {
        directory::seed_departments(uow)?;
        identity::ensure_admin(uow, cfg.admin_username(), cfg.admin_password(), email)?;
        Ok(())
    })
}
