//! Transactional record store.
//!
//! All records live in one [`Tables`] value guarded by a mutex. Writers go through
//! [`Store::transaction`], which stages a copy of the tables, hands the closure a
//! [`UnitOfWork`] over that copy, and publishes it only if the closure returns `Ok`. Because
//! the lock is held for the whole closure, transactions are serializable: a check made inside a
//! transaction still holds when the following insert runs.
//!
//! ## Persistence
//!
//! A store opened with [`Store::open`] keeps a JSON snapshot at
//! `<data_dir>/hospital.json`. Each committing write replaces the snapshot atomically (write to
//! a temporary file, then rename) before the staged tables are published, so a failed write
//! leaves both disk and memory at the previous commit.
//!
//! ## Constraints
//!
//! The `insert_*` and `update_*` methods on [`UnitOfWork`] enforce the uniqueness rules of the
//! data model: usernames per principal kind, patient e-mail, department name, one treatment per
//! appointment, and at most one `Booked` appointment per slot.

use crate::appointments::{Appointment, AppointmentStatus, Slot};
use crate::availability::Availability;
use crate::constants::{SNAPSHOT_FILENAME, SNAPSHOT_TMP_FILENAME};
use crate::directory::Department;
use crate::error::{ConflictReason, HospitalError, HospitalResult};
use crate::identity::{Admin, Doctor, Patient};
use crate::ids::{
    next_id, AdminId, AppointmentId, AvailabilityId, DepartmentId, DoctorId, PatientId,
    TreatmentId,
};
use crate::treatment::Treatment;
use hms_types::EmailAddress;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Every persisted record, keyed by id.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Tables {
    #[serde(default)]
    admins: BTreeMap<AdminId, Admin>,
    #[serde(default)]
    doctors: BTreeMap<DoctorId, Doctor>,
    #[serde(default)]
    patients: BTreeMap<PatientId, Patient>,
    #[serde(default)]
    departments: BTreeMap<DepartmentId, Department>,
    #[serde(default)]
    availability: BTreeMap<AvailabilityId, Availability>,
    #[serde(default)]
    appointments: BTreeMap<AppointmentId, Appointment>,
    #[serde(default)]
    treatments: BTreeMap<TreatmentId, Treatment>,
}

impl Tables {
    pub fn admin(&self, id: AdminId) -> HospitalResult<&Admin> {
        self.admins.get(&id).ok_or_else(|| id.not_found())
    }

    pub fn doctor(&self, id: DoctorId) -> HospitalResult<&Doctor> {
        self.doctors.get(&id).ok_or_else(|| id.not_found())
    }

    pub fn patient(&self, id: PatientId) -> HospitalResult<&Patient> {
        self.patients.get(&id).ok_or_else(|| id.not_found())
    }

    pub fn department(&self, id: DepartmentId) -> HospitalResult<&Department> {
        self.departments.get(&id).ok_or_else(|| id.not_found())
    }

    pub fn appointment(&self, id: AppointmentId) -> HospitalResult<&Appointment> {
        self.appointments.get(&id).ok_or_else(|| id.not_found())
    }

    pub fn admins(&self) -> impl Iterator<Item = &Admin> + '_ {
        self.admins.values()
    }

    pub fn doctors(&self) -> impl Iterator<Item = &Doctor> + '_ {
        self.doctors.values()
    }

    pub fn patients(&self) -> impl Iterator<Item = &Patient> + '_ {
        self.patients.values()
    }

    pub fn departments(&self) -> impl Iterator<Item = &Department> + '_ {
        self.departments.values()
    }

    pub fn availability(&self) -> impl Iterator<Item = &Availability> + '_ {
        self.availability.values()
    }

    pub fn appointments(&self) -> impl Iterator<Item = &Appointment> + '_ {
        self.appointments.values()
    }

    pub fn treatments(&self) -> impl Iterator<Item = &Treatment> + '_ {
        self.treatments.values()
    }

    pub fn admin_by_username(&self, username: &str) -> Option<&Admin> {
        self.admins
            .values()
            .find(|a| a.credential.username.as_str() == username)
    }

    pub fn doctor_by_username(&self, username: &str) -> Option<&Doctor> {
        self.doctors
            .values()
            .find(|d| d.credential.username.as_str() == username)
    }

    pub fn patient_by_username(&self, username: &str) -> Option<&Patient> {
        self.patients
            .values()
            .find(|p| p.credential.username.as_str() == username)
    }

    pub fn patient_by_email(&self, email: &EmailAddress) -> Option<&Patient> {
        self.patients.values().find(|p| &p.email == email)
    }

    /// The `Booked` appointment currently holding `slot`, if any.
    pub fn booked_in_slot(&self, slot: &Slot) -> Option<&Appointment> {
        self.appointments
            .values()
            .find(|a| a.status == AppointmentStatus::Booked && a.slot() == *slot)
    }

    pub fn treatment_for(&self, appointment_id: AppointmentId) -> Option<&Treatment> {
        self.treatments
            .values()
            .find(|t| t.appointment_id == appointment_id)
    }
}

/// Write access to staged tables inside [`Store::transaction`].
pub struct UnitOfWork<'a> {
    tables: &'a mut Tables,
    dirty: bool,
}

impl UnitOfWork<'_> {
    /// Read view of the staged tables, including writes made earlier in this transaction.
    pub fn tables(&self) -> &Tables {
        &*self.tables
    }

    pub fn insert_admin(&mut self, build: impl FnOnce(AdminId) -> Admin) -> HospitalResult<Admin> {
        let id = AdminId(next_id(self.tables.admins.keys().next_back().map(|k| k.get())));
        let admin = build(id);
        if self
            .tables
            .admin_by_username(admin.credential.username.as_str())
            .is_some()
        {
            return Err(ConflictReason::UsernameTaken.into());
        }
        self.dirty = true;
        self.tables.admins.insert(id, admin.clone());
        Ok(admin)
    }

    pub fn insert_doctor(
        &mut self,
        build: impl FnOnce(DoctorId) -> Doctor,
    ) -> HospitalResult<Doctor> {
        let id = DoctorId(next_id(self.tables.doctors.keys().next_back().map(|k| k.get())));
        let doctor = build(id);
        self.check_doctor_unique(&doctor)?;
        self.dirty = true;
        self.tables.doctors.insert(id, doctor.clone());
        Ok(doctor)
    }

    pub fn update_doctor(&mut self, doctor: Doctor) -> HospitalResult<Doctor> {
        self.tables.doctor(doctor.id)?;
        self.check_doctor_unique(&doctor)?;
        self.dirty = true;
        self.tables.doctors.insert(doctor.id, doctor.clone());
        Ok(doctor)
    }

    pub fn insert_patient(
        &mut self,
        build: impl FnOnce(PatientId) -> Patient,
    ) -> HospitalResult<Patient> {
        let id = PatientId(next_id(self.tables.patients.keys().next_back().map(|k| k.get())));
        let patient = build(id);
        self.check_patient_unique(&patient)?;
        self.dirty = true;
        self.tables.patients.insert(id, patient.clone());
        Ok(patient)
    }

    pub fn update_patient(&mut self, patient: Patient) -> HospitalResult<Patient> {
        self.tables.patient(patient.id)?;
        self.check_patient_unique(&patient)?;
        self.dirty = true;
        self.tables.patients.insert(patient.id, patient.clone());
        Ok(patient)
    }

    pub fn insert_department(
        &mut self,
        build: impl FnOnce(DepartmentId) -> Department,
    ) -> HospitalResult<Department> {
        let id = DepartmentId(next_id(
            self.tables.departments.keys().next_back().map(|k| k.get()),
        ));
        let department = build(id);
        if self
            .tables
            .departments
            .values()
            .any(|d| d.name == department.name)
        {
            return Err(ConflictReason::DepartmentExists.into());
        }
        self.dirty = true;
        self.tables.departments.insert(id, department.clone());
        Ok(department)
    }

    pub fn insert_availability(
        &mut self,
        build: impl FnOnce(AvailabilityId) -> Availability,
    ) -> HospitalResult<Availability> {
        let id = AvailabilityId(next_id(
            self.tables.availability.keys().next_back().map(|k| k.get()),
        ));
        let window = build(id);
        self.tables.doctor(window.doctor_id)?;
        self.dirty = true;
        self.tables.availability.insert(id, window.clone());
        Ok(window)
    }

    pub fn insert_appointment(
        &mut self,
        build: impl FnOnce(AppointmentId) -> Appointment,
    ) -> HospitalResult<Appointment> {
        let id = AppointmentId(next_id(
            self.tables.appointments.keys().next_back().map(|k| k.get()),
        ));
        let appointment = build(id);
        self.check_slot_free(&appointment)?;
        self.dirty = true;
        self.tables.appointments.insert(id, appointment.clone());
        Ok(appointment)
    }

    pub fn update_appointment(&mut self, appointment: Appointment) -> HospitalResult<Appointment> {
        self.tables.appointment(appointment.id)?;
        self.check_slot_free(&appointment)?;
        self.dirty = true;
        self.tables
            .appointments
            .insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    pub fn insert_treatment(
        &mut self,
        build: impl FnOnce(TreatmentId) -> Treatment,
    ) -> HospitalResult<Treatment> {
        let id = TreatmentId(next_id(
            self.tables.treatments.keys().next_back().map(|k| k.get()),
        ));
        let treatment = build(id);
        self.tables.appointment(treatment.appointment_id)?;
        if self.tables.treatment_for(treatment.appointment_id).is_some() {
            return Err(ConflictReason::TreatmentExists.into());
        }
        self.dirty = true;
        self.tables.treatments.insert(id, treatment.clone());
        Ok(treatment)
    }

    fn check_doctor_unique(&self, doctor: &Doctor) -> HospitalResult<()> {
        match self
            .tables
            .doctor_by_username(doctor.credential.username.as_str())
        {
            Some(other) if other.id != doctor.id => Err(ConflictReason::UsernameTaken.into()),
            _ => Ok(()),
        }
    }

    fn check_patient_unique(&self, patient: &Patient) -> HospitalResult<()> {
        if let Some(other) = self
            .tables
            .patient_by_username(patient.credential.username.as_str())
        {
            if other.id != patient.id {
                return Err(ConflictReason::UsernameTaken.into());
            }
        }
        if let Some(other) = self.tables.patient_by_email(&patient.email) {
            if other.id != patient.id {
                return Err(ConflictReason::EmailTaken.into());
            }
        }
        Ok(())
    }

    fn check_slot_free(&self, appointment: &Appointment) -> HospitalResult<()> {
        if appointment.status != AppointmentStatus::Booked {
            return Ok(());
        }
        match self.tables.booked_in_slot(&appointment.slot()) {
            Some(other) if other.id != appointment.id => Err(ConflictReason::SlotTaken.into()),
            _ => Ok(()),
        }
    }
}

/// Shared handle to the tables. Cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct Store {
    snapshot_path: Option<PathBuf>,
    tables: Mutex<Tables>,
}

impl Store {
    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            snapshot_path: None,
            tables: Mutex::new(Tables::default()),
        }
    }

    /// Opens the store persisted under `data_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `HospitalError` if:
    /// - the data directory cannot be created ([`HospitalError::DataDirCreation`])
    /// - an existing snapshot cannot be read or parsed
    pub fn open(data_dir: &Path) -> HospitalResult<Self> {
        fs::create_dir_all(data_dir).map_err(HospitalError::DataDirCreation)?;
        let snapshot_path = data_dir.join(SNAPSHOT_FILENAME);

        let tables = if snapshot_path.is_file() {
            let raw = fs::read(&snapshot_path).map_err(HospitalError::SnapshotRead)?;
            serde_json::from_slice(&raw).map_err(HospitalError::Deserialization)?
        } else {
            Tables::default()
        };

        tracing::debug!("opened store at {}", snapshot_path.display());
        Ok(Self {
            snapshot_path: Some(snapshot_path),
            tables: Mutex::new(tables),
        })
    }

    /// Runs `f` as one serializable transaction.
    ///
    /// On `Ok` the staged tables are persisted (if the store has a snapshot path and anything
    /// was written) and published. On `Err` every write made by `f` is discarded.
    pub fn transaction<T, F>(&self, f: F) -> HospitalResult<T>
    where
        F: FnOnce(&mut UnitOfWork<'_>) -> HospitalResult<T>,
    {
        let mut guard = self
            .tables
            .lock()
            .map_err(|_| HospitalError::StorePoisoned)?;
        let mut staged = guard.clone();

        let mut uow = UnitOfWork {
            tables: &mut staged,
            dirty: false,
        };
        let value = match f(&mut uow) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("transaction rolled back: {e}");
                return Err(e);
            }
        };

        if uow.dirty {
            if let Some(path) = &self.snapshot_path {
                write_snapshot(path, &staged)?;
            }
            *guard = staged;
        }
        Ok(value)
    }

    /// Runs a read-only closure over the committed tables.
    pub fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> HospitalResult<T> {
        let guard = self
            .tables
            .lock()
            .map_err(|_| HospitalError::StorePoisoned)?;
        Ok(f(&guard))
    }
}

fn write_snapshot(path: &Path, tables: &Tables) -> HospitalResult<()> {
    let raw = serde_json::to_vec_pretty(tables).map_err(HospitalError::Serialization)?;
    let tmp_path = path.with_file_name(SNAPSHOT_TMP_FILENAME);
    fs::write(&tmp_path, raw).map_err(HospitalError::SnapshotWrite)?;
    fs::rename(&tmp_path, path).map_err(HospitalError::SnapshotWrite)
}
