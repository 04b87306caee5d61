use std::fmt;

use crate::appointments::AppointmentStatus;

/// Why a write was refused because it collides with existing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
    UsernameTaken,
    EmailTaken,
    SlotTaken,
    DepartmentExists,
    AvailabilityOverlap,
    TreatmentExists,
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictReason::UsernameTaken => write!(f, "Username already exists"),
            ConflictReason::EmailTaken => write!(f, "Email already registered"),
            ConflictReason::SlotTaken => write!(f, "This time slot is already booked"),
            ConflictReason::DepartmentExists => write!(f, "Department already exists"),
            ConflictReason::AvailabilityOverlap => {
                write!(f, "This window overlaps an existing availability window")
            }
            ConflictReason::TreatmentExists => {
                write!(f, "A treatment is already recorded for this appointment")
            }
            ConflictReason::InvalidTransition { from, to } => {
                write!(f, "Cannot change a {from} appointment to {to}")
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HospitalError {
    #[error("unauthorized access")]
    Unauthorized,
    #[error("{entity} {id} belongs to another principal")]
    Forbidden { entity: &'static str, id: u64 },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },
    #[error("{0}")]
    Conflict(ConflictReason),
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account has been deactivated")]
    Deactivated,

    #[error("failed to create data directory: {0}")]
    DataDirCreation(std::io::Error),
    #[error("failed to read snapshot: {0}")]
    SnapshotRead(std::io::Error),
    #[error("failed to write snapshot: {0}")]
    SnapshotWrite(std::io::Error),
    #[error("failed to serialize snapshot: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize snapshot: {0}")]
    Deserialization(serde_json::Error),
    #[error("store lock poisoned by a panicked transaction")]
    StorePoisoned,
}

impl HospitalError {
    /// True for failures caused by the store itself rather than by the request.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            HospitalError::DataDirCreation(_)
                | HospitalError::SnapshotRead(_)
                | HospitalError::SnapshotWrite(_)
                | HospitalError::Serialization(_)
                | HospitalError::Deserialization(_)
                | HospitalError::StorePoisoned
        )
    }
}

impl From<ConflictReason> for HospitalError {
    fn from(reason: ConflictReason) -> Self {
        HospitalError::Conflict(reason)
    }
}

impl From<hms_types::TextError> for HospitalError {
    fn from(err: hms_types::TextError) -> Self {
        HospitalError::Validation(err.to_string())
    }
}

pub type HospitalResult<T> = std::result::Result<T, HospitalError>;
