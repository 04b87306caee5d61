//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services. Request
//! handling never reads process-wide environment variables.

use crate::constants::{DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME, DEFAULT_DATA_DIR};
use crate::error::{HospitalError, HospitalResult};
use hms_types::NonEmptyText;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone)]
pub struct CoreConfig {
    data_dir: PathBuf,
    admin_username: NonEmptyText,
    admin_password: String,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `HospitalError::Validation` if the admin username or password is blank.
    pub fn new(
        data_dir: PathBuf,
        admin_username: &str,
        admin_password: String,
    ) -> HospitalResult<Self> {
        let admin_username = NonEmptyText::new(admin_username)
            .map_err(|_| HospitalError::Validation("admin username cannot be empty".into()))?;
        if admin_password.trim().is_empty() {
            return Err(HospitalError::Validation(
                "admin password cannot be empty".into(),
            ));
        }

        Ok(Self {
            data_dir,
            admin_username,
            admin_password,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn admin_username(&self) -> &NonEmptyText {
        &self.admin_username
    }

    pub fn admin_password(&self) -> &str {
        &self.admin_password
    }
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("data_dir", &self.data_dir)
            .field("admin_username", &self.admin_username)
            .field("admin_password", &"<redacted>")
            .finish()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the data directory from an optional string value, falling back to
/// [`DEFAULT_DATA_DIR`] when unset or blank.
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    PathBuf::from(non_blank(value).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()))
}

pub fn admin_username_from_env_value(value: Option<String>) -> String {
    non_blank(value).unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string())
}

pub fn admin_password_from_env_value(value: Option<String>) -> String {
    non_blank(value).unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        assert_eq!(
            data_dir_from_env_value(Some("   ".into())),
            PathBuf::from("hospital_data")
        );
        assert_eq!(admin_username_from_env_value(None), "admin");
        assert_eq!(admin_password_from_env_value(Some(String::new())), "admin123");
        assert_eq!(
            data_dir_from_env_value(Some(" /srv/hms ".into())),
            PathBuf::from("/srv/hms")
        );
    }

    #[test]
    fn test_new_rejects_blank_credentials() {
        assert!(CoreConfig::new(PathBuf::from("d"), " ", "pw".into()).is_err());
        assert!(CoreConfig::new(PathBuf::from("d"), "admin", "  ".into()).is_err());

        let cfg = CoreConfig::new(PathBuf::from("d"), "root", "pw".into()).unwrap();
        assert_eq!(cfg.admin_username().as_str(), "root");
        assert!(format!("{cfg:?}").contains("<redacted>"));
    }
}
