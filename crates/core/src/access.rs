//! Role and ownership checks.
//!
//! Two separate layers: the role check answers "may this kind of principal call this
//! operation at all" (`Unauthorized` on mismatch), the ownership check answers "is this
//! appointment theirs" (`Forbidden` on mismatch).

use crate::appointments::Appointment;
use crate::error::{HospitalError, HospitalResult};
use crate::identity::{Admin, Doctor, Patient, Principal, Role};
use crate::ids::{AppointmentId, DoctorId, PatientId};

/// Returns the principal unchanged when its kind matches `role`.
pub fn require_role(principal: Principal, role: Role) -> HospitalResult<Principal> {
    if principal.role() == role {
        Ok(principal)
    } else {
        tracing::warn!(
            "{} {} denied access to a {role} operation",
            principal.role(),
            principal.display_name()
        );
        Err(HospitalError::Unauthorized)
    }
}

pub fn require_admin(principal: &Principal) -> HospitalResult<&Admin> {
    match principal {
        Principal::Admin(admin) => Ok(admin),
        _ => Err(HospitalError::Unauthorized),
    }
}

pub fn require_doctor(principal: &Principal) -> HospitalResult<&Doctor> {
    match principal {
        Principal::Doctor(doctor) => Ok(doctor),
        _ => Err(HospitalError::Unauthorized),
    }
}

pub fn require_patient(principal: &Principal) -> HospitalResult<&Patient> {
    match principal {
        Principal::Patient(patient) => Ok(patient),
        _ => Err(HospitalError::Unauthorized),
    }
}

pub fn ensure_doctor_owns(doctor_id: DoctorId, appointment: &Appointment) -> HospitalResult<()> {
    if appointment.doctor_id == doctor_id {
        Ok(())
    } else {
        tracing::warn!(
            "doctor {doctor_id} tried to act on appointment {} of doctor {}",
            appointment.id,
            appointment.doctor_id
        );
        Err(forbidden(appointment.id))
    }
}

pub fn ensure_patient_owns(patient_id: PatientId, appointment: &Appointment) -> HospitalResult<()> {
    if appointment.patient_id == patient_id {
        Ok(())
    } else {
        tracing::warn!(
            "patient {patient_id} tried to act on appointment {} of patient {}",
            appointment.id,
            appointment.patient_id
        );
        Err(forbidden(appointment.id))
    }
}

fn forbidden(id: AppointmentId) -> HospitalError {
    HospitalError::Forbidden {
        entity: AppointmentId::ENTITY,
        id: id.get(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointments::AppointmentStatus;
    use crate::identity::Credential;
    use crate::ids::AdminId;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use hms_types::{EmailAddress, NonEmptyText};

    fn admin() -> Principal {
        Principal::Admin(Admin {
            id: AdminId(1),
            credential: Credential::new(NonEmptyText::new("admin").unwrap(), "pw").unwrap(),
            email: EmailAddress::parse("admin@hospital.com").unwrap(),
        })
    }

    fn appointment() -> Appointment {
        Appointment {
            id: AppointmentId(5),
            patient_id: PatientId(1),
            doctor_id: DoctorId(2),
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            reason: None,
            status: AppointmentStatus::Booked,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_require_role_passes_matching_principal_through() {
        let principal = require_role(admin(), Role::Admin).expect("admin should pass");
        assert_eq!(principal.role(), Role::Admin);
    }

    #[test]
    fn test_role_mismatch_is_unauthorized() {
        assert!(matches!(
            require_role(admin(), Role::Doctor),
            Err(HospitalError::Unauthorized)
        ));
        assert!(matches!(
            require_patient(&admin()),
            Err(HospitalError::Unauthorized)
        ));
        assert!(require_admin(&admin()).is_ok());
    }

    #[test]
    fn test_ownership_mismatch_is_forbidden() {
        let appt = appointment();
        assert!(ensure_doctor_owns(DoctorId(2), &appt).is_ok());
        assert!(matches!(
            ensure_doctor_owns(DoctorId(3), &appt),
            Err(HospitalError::Forbidden {
                entity: "appointment",
                id: 5
            })
        ));
        assert!(ensure_patient_owns(PatientId(1), &appt).is_ok());
        assert!(matches!(
            ensure_patient_owns(PatientId(9), &appt),
            Err(HospitalError::Forbidden { .. })
        ));
    }
}
