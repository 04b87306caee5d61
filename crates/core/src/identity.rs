//! Principals and credentials.
//!
//! The three principal kinds are disjoint tables; [`Principal`] is the tagged union used once a
//! record has been loaded, and [`PrincipalRef`] is the (kind, id) pair a session keeps. The role
//! of a session is always the variant of the principal re-loaded from its own table, never a
//! separately stored tag.

use crate::error::{HospitalError, HospitalResult};
use crate::ids::{AdminId, DepartmentId, DoctorId, PatientId};
use crate::password::PasswordHash;
use crate::store::{Tables, UnitOfWork};
use chrono::NaiveDate;
use hms_types::{EmailAddress, NonEmptyText};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Patient,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Patient => "patient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = HospitalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "patient" => Ok(Role::Patient),
            other => Err(HospitalError::Validation(format!(
                "unknown user type: {other}"
            ))),
        }
    }
}

/// Username plus hashed secret, common to every principal kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Credential {
    pub username: NonEmptyText,
    pub password_hash: PasswordHash,
}

impl Credential {
    pub fn new(username: NonEmptyText, raw_password: &str) -> HospitalResult<Self> {
        Ok(Self {
            username,
            password_hash: PasswordHash::derive(raw_password)?,
        })
    }

    pub fn verify(&self, raw_password: &str) -> bool {
        self.password_hash.verify(raw_password)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Admin {
    pub id: AdminId,
    pub credential: Credential,
    pub email: EmailAddress,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Doctor {
    pub id: DoctorId,
    pub credential: Credential,
    pub name: NonEmptyText,
    pub email: EmailAddress,
    pub phone: Option<NonEmptyText>,
    pub department_id: DepartmentId,
    pub experience_years: u32,
    pub qualification: Option<NonEmptyText>,
    pub active: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub credential: Credential,
    pub name: NonEmptyText,
    pub email: EmailAddress,
    pub phone: Option<NonEmptyText>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<NonEmptyText>,
    pub address: Option<NonEmptyText>,
    pub blood_group: Option<NonEmptyText>,
    pub active: bool,
}

#[derive(Clone, Debug)]
pub enum Principal {
    Admin(Admin),
    Doctor(Doctor),
    Patient(Patient),
}

impl Principal {
    pub fn role(&self) -> Role {
        match self {
            Principal::Admin(_) => Role::Admin,
            Principal::Doctor(_) => Role::Doctor,
            Principal::Patient(_) => Role::Patient,
        }
    }

    pub fn credential(&self) -> &Credential {
        match self {
            Principal::Admin(a) => &a.credential,
            Principal::Doctor(d) => &d.credential,
            Principal::Patient(p) => &p.credential,
        }
    }

    /// Admins have no deactivation flag and are always active.
    pub fn is_active(&self) -> bool {
        match self {
            Principal::Admin(_) => true,
            Principal::Doctor(d) => d.active,
            Principal::Patient(p) => p.active,
        }
    }

    pub fn reference(&self) -> PrincipalRef {
        match self {
            Principal::Admin(a) => PrincipalRef::Admin(a.id),
            Principal::Doctor(d) => PrincipalRef::Doctor(d.id),
            Principal::Patient(p) => PrincipalRef::Patient(p.id),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Principal::Admin(a) => a.credential.username.as_str(),
            Principal::Doctor(d) => d.name.as_str(),
            Principal::Patient(p) => p.name.as_str(),
        }
    }
}

/// What a session remembers about who is logged in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum PrincipalRef {
    Admin(AdminId),
    Doctor(DoctorId),
    Patient(PatientId),
}

/// Fields of a self-registering patient.
#[derive(Clone, Debug)]
pub struct NewPatient {
    pub username: NonEmptyText,
    pub name: NonEmptyText,
    pub email: EmailAddress,
    pub phone: Option<NonEmptyText>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<NonEmptyText>,
    pub address: Option<NonEmptyText>,
    pub blood_group: Option<NonEmptyText>,
}

/// Fields of a doctor created by an administrator.
#[derive(Clone, Debug)]
pub struct NewDoctor {
    pub username: NonEmptyText,
    pub name: NonEmptyText,
    pub email: EmailAddress,
    pub phone: Option<NonEmptyText>,
    pub department_id: DepartmentId,
    pub experience_years: u32,
    pub qualification: Option<NonEmptyText>,
}

/// Editable doctor fields; the username is fixed once created.
#[derive(Clone, Debug)]
pub struct DoctorUpdate {
    pub name: NonEmptyText,
    pub email: EmailAddress,
    pub phone: Option<NonEmptyText>,
    pub department_id: DepartmentId,
    pub experience_years: u32,
    pub qualification: Option<NonEmptyText>,
}

/// Contact fields an administrator may correct on a patient record.
#[derive(Clone, Debug)]
pub struct PatientContactUpdate {
    pub name: NonEmptyText,
    pub email: EmailAddress,
    pub phone: Option<NonEmptyText>,
    pub address: Option<NonEmptyText>,
}

/// Fields a patient may change on their own profile.
#[derive(Clone, Debug)]
pub struct ProfileUpdate {
    pub name: NonEmptyText,
    pub email: EmailAddress,
    pub phone: Option<NonEmptyText>,
    pub address: Option<NonEmptyText>,
    pub blood_group: Option<NonEmptyText>,
}

/// Registers a new patient.
///
/// # Errors
///
/// Returns `HospitalError::Conflict` with `UsernameTaken` or `EmailTaken` when another patient
/// already holds the username or e-mail, and `HospitalError::Validation` for an empty password.
pub fn register_patient(
    uow: &mut UnitOfWork<'_>,
    new: NewPatient,
    raw_password: &str,
) -> HospitalResult<Patient> {
    let credential = Credential::new(new.username, raw_password)?;
    let patient = uow.insert_patient(|id| Patient {
        id,
        credential,
        name: new.name,
        email: new.email,
        phone: new.phone,
        date_of_birth: new.date_of_birth,
        gender: new.gender,
        address: new.address,
        blood_group: new.blood_group,
        active: true,
    })?;

    tracing::info!(patient_id = %patient.id, "registered patient {}", patient.credential.username);
    Ok(patient)
}

/// Verifies a username/password pair within the principal kind named by `role`.
///
/// Usernames are only unique per kind, so the hint selects which table is searched.
///
/// # Errors
///
/// - `InvalidCredentials` if no such user exists or the password does not match
/// - `Deactivated` if the password matches but the doctor/patient has been deactivated
pub fn authenticate(
    tables: &Tables,
    username: &str,
    raw_password: &str,
    role: Role,
) -> HospitalResult<Principal> {
    let username = username.trim();
    let principal = match role {
        Role::Admin => tables.admin_by_username(username).cloned().map(Principal::Admin),
        Role::Doctor => tables
            .doctor_by_username(username)
            .cloned()
            .map(Principal::Doctor),
        Role::Patient => tables
            .patient_by_username(username)
            .cloned()
            .map(Principal::Patient),
    }
    .ok_or(HospitalError::InvalidCredentials)?;

    if !principal.credential().verify(raw_password) {
        tracing::warn!("failed {role} login for {username}");
        return Err(HospitalError::InvalidCredentials);
    }
    if !principal.is_active() {
        tracing::warn!("deactivated {role} {username} attempted to log in");
        return Err(HospitalError::Deactivated);
    }
    Ok(principal)
}

/// Re-loads the principal a session refers to.
///
/// # Errors
///
/// - `Unauthorized` if the record no longer exists
/// - `Deactivated` if the doctor/patient has been deactivated since login
pub fn resolve_principal(tables: &Tables, reference: PrincipalRef) -> HospitalResult<Principal> {
    let principal = match reference {
        PrincipalRef::Admin(id) => tables.admin(id).cloned().map(Principal::Admin),
        PrincipalRef::Doctor(id) => tables.doctor(id).cloned().map(Principal::Doctor),
        PrincipalRef::Patient(id) => tables.patient(id).cloned().map(Principal::Patient),
    }
    .map_err(|_| HospitalError::Unauthorized)?;

    if !principal.is_active() {
        return Err(HospitalError::Deactivated);
    }
    Ok(principal)
}

/// Creates a doctor account.
///
/// # Errors
///
/// - `NotFound` if the department does not exist
/// - `Conflict(UsernameTaken)` if another doctor has the username
pub fn add_doctor(
    uow: &mut UnitOfWork<'_>,
    new: NewDoctor,
    raw_password: &str,
) -> HospitalResult<Doctor> {
    uow.tables().department(new.department_id)?;
    let credential = Credential::new(new.username, raw_password)?;

    let doctor = uow.insert_doctor(|id| Doctor {
        id,
        credential,
        name: new.name,
        email: new.email,
        phone: new.phone,
        department_id: new.department_id,
        experience_years: new.experience_years,
        qualification: new.qualification,
        active: true,
    })?;

    tracing::info!(doctor_id = %doctor.id, "added doctor {}", doctor.credential.username);
    Ok(doctor)
}

/// Replaces a doctor's editable fields, and the password when one is given.
pub fn edit_doctor(
    uow: &mut UnitOfWork<'_>,
    id: DoctorId,
    update: DoctorUpdate,
    new_password: Option<&str>,
) -> HospitalResult<Doctor> {
    uow.tables().department(update.department_id)?;
    let mut doctor = uow.tables().doctor(id)?.clone();

    doctor.name = update.name;
    doctor.email = update.email;
    doctor.phone = update.phone;
    doctor.department_id = update.department_id;
    doctor.experience_years = update.experience_years;
    doctor.qualification = update.qualification;
    if let Some(raw) = new_password.filter(|p| !p.is_empty()) {
        doctor.credential.password_hash = PasswordHash::derive(raw)?;
    }

    uow.update_doctor(doctor)
}

/// Soft-deletes a doctor. Appointments and history are kept; login is refused from now on.
pub fn deactivate_doctor(uow: &mut UnitOfWork<'_>, id: DoctorId) -> HospitalResult<Doctor> {
    let mut doctor = uow.tables().doctor(id)?.clone();
    doctor.active = false;
    tracing::info!(doctor_id = %id, "deactivated doctor");
    uow.update_doctor(doctor)
}

/// Soft-deletes a patient.
pub fn deactivate_patient(uow: &mut UnitOfWork<'_>, id: PatientId) -> HospitalResult<Patient> {
    let mut patient = uow.tables().patient(id)?.clone();
    patient.active = false;
    tracing::info!(patient_id = %id, "deactivated patient");
    uow.update_patient(patient)
}

/// Administrator correction of a patient's contact details.
pub fn edit_patient(
    uow: &mut UnitOfWork<'_>,
    id: PatientId,
    update: PatientContactUpdate,
) -> HospitalResult<Patient> {
    let mut patient = uow.tables().patient(id)?.clone();
    patient.name = update.name;
    patient.email = update.email;
    patient.phone = update.phone;
    patient.address = update.address;
    uow.update_patient(patient)
}

/// A patient updating their own profile.
pub fn update_profile(
    uow: &mut UnitOfWork<'_>,
    patient_id: PatientId,
    update: ProfileUpdate,
    new_password: Option<&str>,
) -> HospitalResult<Patient> {
    let mut patient = uow.tables().patient(patient_id)?.clone();
    patient.name = update.name;
    patient.email = update.email;
    patient.phone = update.phone;
    patient.address = update.address;
    patient.blood_group = update.blood_group;
    if let Some(raw) = new_password.filter(|p| !p.is_empty()) {
        patient.credential.password_hash = PasswordHash::derive(raw)?;
    }
    uow.update_patient(patient)
}

/// Seeds the administrator account if no admin with `username` exists yet.
pub fn ensure_admin(
    uow: &mut UnitOfWork<'_>,
    username: &NonEmptyText,
    raw_password: &str,
    email: EmailAddress,
) -> HospitalResult<Admin> {
    if let Some(existing) = uow.tables().admin_by_username(username.as_str()) {
        return Ok(existing.clone());
    }

    let credential = Credential::new(username.clone(), raw_password)?;
    let admin = uow.insert_admin(|id| Admin {
        id,
        credential,
        email,
    })?;
    tracing::info!("seeded administrator {}", admin.credential.username);
    Ok(admin)
}
