//! # API Shared
//!
//! Shared utilities and definitions for the hospital HTTP API.
//!
//! Contains:
//! - Shared services like `HealthService`
//! - The server-side session store with flash messages
//! - Session cookie helpers
//!
//! Used by `api-rest`.

pub mod health;
pub mod session;

pub use health::{HealthRes, HealthService};
pub use session::{Flash, SessionStore, Severity};
