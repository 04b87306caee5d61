//! Typed record identifiers.
//!
//! Each table allocates its own positive integer keys, so an id is only meaningful together
//! with its kind. Wrapping them keeps a `DoctorId` from being passed where a `PatientId` is
//! expected.

use crate::error::HospitalError;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $entity:literal) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const ENTITY: &'static str = $entity;

            pub fn get(self) -> u64 {
                self.0
            }

            pub fn not_found(self) -> HospitalError {
                HospitalError::NotFound {
                    entity: Self::ENTITY,
                    id: self.0,
                }
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(AdminId, "admin");
record_id!(DoctorId, "doctor");
record_id!(PatientId, "patient");
record_id!(DepartmentId, "department");
record_id!(AvailabilityId, "availability");
record_id!(AppointmentId, "appointment");
record_id!(TreatmentId, "treatment");

/// Next key after the highest allocated one; keys start at 1 and are never reused.
pub(crate) fn next_id(last: Option<u64>) -> u64 {
    last.map_or(1, |id| id + 1)
}
