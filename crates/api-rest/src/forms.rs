//! Form and query payloads.
//!
//! Every field arrives as a string (missing fields default to empty) and is converted into the
//! typed core inputs here, so handlers only ever see validated values.

use hms_core::appointments::BookingRequest;
use hms_core::identity::{DoctorUpdate, NewDoctor, NewPatient, PatientContactUpdate, ProfileUpdate};
use hms_core::ids::{DepartmentId, DoctorId};
use hms_core::treatment::TreatmentInput;
use hms_core::validation::{
    email, parse_count, parse_date, parse_optional_date, parse_time, required,
};
use hms_core::{HospitalError, HospitalResult};
use hms_types::NonEmptyText;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

fn department(value: &str) -> HospitalResult<DepartmentId> {
    value
        .trim()
        .parse::<u64>()
        .map(DepartmentId)
        .map_err(|_| HospitalError::Validation("department_id must be a department id".into()))
}

fn password(value: &str) -> Option<&str> {
    Some(value).filter(|p| !p.is_empty())
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub user_type: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub gender: String,
    pub address: String,
    pub blood_group: String,
}

impl RegisterForm {
    pub fn into_new_patient(self) -> HospitalResult<(NewPatient, String)> {
        let new = NewPatient {
            username: required("username", &self.username)?,
            name: required("name", &self.name)?,
            email: email("email", &self.email)?,
            phone: NonEmptyText::optional(&self.phone),
            date_of_birth: parse_optional_date("date_of_birth", &self.date_of_birth)?,
            gender: NonEmptyText::optional(&self.gender),
            address: NonEmptyText::optional(&self.address),
            blood_group: NonEmptyText::optional(&self.blood_group),
        };
        Ok((new, self.password))
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct DoctorForm {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department_id: String,
    pub experience_years: String,
    pub qualification: String,
}

impl DoctorForm {
    pub fn into_new_doctor(self) -> HospitalResult<(NewDoctor, String)> {
        let new = NewDoctor {
            username: required("username", &self.username)?,
            name: required("name", &self.name)?,
            email: email("email", &self.email)?,
            phone: NonEmptyText::optional(&self.phone),
            department_id: department(&self.department_id)?,
            experience_years: parse_count("experience_years", &self.experience_years)?,
            qualification: NonEmptyText::optional(&self.qualification),
        };
        Ok((new, self.password))
    }

    /// The edit form reuses the add form; `username` is ignored and a blank `password` keeps
    /// the current one.
    pub fn to_update(&self) -> HospitalResult<(DoctorUpdate, Option<&str>)> {
        let update = DoctorUpdate {
            name: required("name", &self.name)?,
            email: email("email", &self.email)?,
            phone: NonEmptyText::optional(&self.phone),
            department_id: department(&self.department_id)?,
            experience_years: parse_count("experience_years", &self.experience_years)?,
            qualification: NonEmptyText::optional(&self.qualification),
        };
        Ok((update, password(&self.password)))
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct PatientEditForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl PatientEditForm {
    pub fn into_update(self) -> HospitalResult<PatientContactUpdate> {
        Ok(PatientContactUpdate {
            name: required("name", &self.name)?,
            email: email("email", &self.email)?,
            phone: NonEmptyText::optional(&self.phone),
            address: NonEmptyText::optional(&self.address),
        })
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CompleteForm {
    pub diagnosis: String,
    pub prescription: String,
    pub notes: String,
}

impl From<CompleteForm> for TreatmentInput {
    fn from(form: CompleteForm) -> Self {
        TreatmentInput {
            diagnosis: NonEmptyText::optional(&form.diagnosis),
            prescription: NonEmptyText::optional(&form.prescription),
            notes: NonEmptyText::optional(&form.notes),
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct AvailabilityForm {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct BookingForm {
    pub appointment_date: String,
    pub appointment_time: String,
    pub reason: String,
}

impl BookingForm {
    pub fn into_request(self, doctor_id: DoctorId) -> HospitalResult<BookingRequest> {
        Ok(BookingRequest {
            doctor_id,
            date: parse_date("appointment_date", &self.appointment_date)?,
            time: parse_time("appointment_time", &self.appointment_time)?,
            reason: NonEmptyText::optional(&self.reason),
        })
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub blood_group: String,
    pub password: String,
}

impl ProfileForm {
    pub fn to_update(&self) -> HospitalResult<(ProfileUpdate, Option<&str>)> {
        let update = ProfileUpdate {
            name: required("name", &self.name)?,
            email: email("email", &self.email)?,
            phone: NonEmptyText::optional(&self.phone),
            address: NonEmptyText::optional(&self.address),
            blood_group: NonEmptyText::optional(&self.blood_group),
        };
        Ok((update, password(&self.password)))
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(default)]
pub struct SearchQuery {
    pub search: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(default)]
pub struct DoctorSearchQuery {
    pub search: String,
    /// Blank means every department.
    pub department_id: String,
}

impl DoctorSearchQuery {
    pub fn department(&self) -> HospitalResult<Option<DepartmentId>> {
        if self.department_id.trim().is_empty() {
            return Ok(None);
        }
        department(&self.department_id).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_form_keeps_blank_optionals_out() {
        let form = RegisterForm {
            username: "alice".into(),
            password: "pw".into(),
            name: "Alice".into(),
            email: "Alice@X.com".into(),
            phone: "  ".into(),
            ..RegisterForm::default()
        };
        let (new, password) = form.into_new_patient().expect("form should be valid");
        assert_eq!(new.email.as_str(), "alice@x.com");
        assert!(new.phone.is_none());
        assert!(new.date_of_birth.is_none());
        assert_eq!(password, "pw");
    }

    #[test]
    fn test_booking_form_rejects_bad_time() {
        let form = BookingForm {
            appointment_date: "2025-06-01".into(),
            appointment_time: "ten".into(),
            reason: String::new(),
        };
        let err = form.into_request(DoctorId(1)).unwrap_err();
        assert!(err.to_string().contains("appointment_time"));
    }

    #[test]
    fn test_doctor_form_requires_department() {
        let form = DoctorForm {
            username: "house".into(),
            password: "pw".into(),
            name: "House".into(),
            email: "house@hospital.com".into(),
            department_id: "cardio".into(),
            ..DoctorForm::default()
        };
        assert!(matches!(
            form.into_new_doctor(),
            Err(HospitalError::Validation(_))
        ));
    }
}
