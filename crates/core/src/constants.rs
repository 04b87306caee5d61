//! Constants used throughout the hospital core crate.
//!
//! This module contains storage names, seed data and policy constants so that every component
//! agrees on them.

/// Default directory for the store snapshot when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "hospital_data";

/// Filename of the JSON snapshot inside the data directory.
pub const SNAPSHOT_FILENAME: &str = "hospital.json";

/// Temporary filename used while a snapshot is being written.
pub const SNAPSHOT_TMP_FILENAME: &str = "hospital.json.tmp";

/// Username of the administrator seeded at startup.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Password of the administrator seeded at startup when none is configured.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// E-mail of the seeded administrator.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@hospital.com";

/// Departments seeded at startup: `(name, description)`.
pub const DEPARTMENTS: &[(&str, &str)] = &[
    ("Cardiology", "Heart and cardiovascular system"),
    ("Neurology", "Brain and nervous system"),
    ("Orthopedics", "Bones and muscles"),
    ("Pediatrics", "Children health"),
    ("Dermatology", "Skin disorders"),
    ("ENT", "Ear, Nose, and Throat"),
    ("General Medicine", "General health issues"),
];

/// Days ahead (inclusive) shown in a doctor's upcoming schedule.
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

/// Number of appointments listed on the admin dashboard.
pub const RECENT_APPOINTMENTS_LIMIT: usize = 10;

/// Date format accepted from forms.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Time format accepted from forms.
pub const TIME_FORMAT: &str = "%H:%M";

/// Rounds of SHA-256 applied when deriving a password hash.
pub const PASSWORD_HASH_ROUNDS: u32 = 10_000;

/// Salt length in bytes for password hashes.
pub const PASSWORD_SALT_LEN: usize = 16;
