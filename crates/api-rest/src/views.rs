//! JSON view payloads.
//!
//! Records are projected into these shapes before leaving the service so that credential
//! material never appears in a response. Dates and times use the same `YYYY-MM-DD` / `HH:MM`
//! strings the forms accept.

use api_shared::Flash;
use hms_core::appointments::Appointment;
use hms_core::availability::Availability;
use hms_core::constants::{DATE_FORMAT, TIME_FORMAT};
use hms_core::directory::Department;
use hms_core::identity::{Doctor, Patient};
use hms_core::treatment::{treatment_for, Treatment};
use hms_core::{Role, Tables};
use hms_types::NonEmptyText;
use serde::Serialize;
use utoipa::ToSchema;

fn text(value: &Option<NonEmptyText>) -> Option<String> {
    value.as_ref().map(NonEmptyText::to_string)
}

#[derive(Serialize, ToSchema)]
pub struct DepartmentView {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
}

impl From<&Department> for DepartmentView {
    fn from(d: &Department) -> Self {
        Self {
            id: d.id.get(),
            name: d.name.to_string(),
            description: text(&d.description),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct DoctorView {
    pub id: u64,
    pub username: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department_id: u64,
    pub department: Option<String>,
    pub experience_years: u32,
    pub qualification: Option<String>,
    pub active: bool,
}

impl DoctorView {
    pub fn new(tables: &Tables, d: &Doctor) -> Self {
        Self {
            id: d.id.get(),
            username: d.credential.username.to_string(),
            name: d.name.to_string(),
            email: d.email.to_string(),
            phone: text(&d.phone),
            department_id: d.department_id.get(),
            department: tables
                .department(d.department_id)
                .ok()
                .map(|dep| dep.name.to_string()),
            experience_years: d.experience_years,
            qualification: text(&d.qualification),
            active: d.active,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PatientView {
    pub id: u64,
    pub username: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub blood_group: Option<String>,
    pub active: bool,
}

impl From<&Patient> for PatientView {
    fn from(p: &Patient) -> Self {
        Self {
            id: p.id.get(),
            username: p.credential.username.to_string(),
            name: p.name.to_string(),
            email: p.email.to_string(),
            phone: text(&p.phone),
            date_of_birth: p.date_of_birth.map(|d| d.format(DATE_FORMAT).to_string()),
            gender: text(&p.gender),
            address: text(&p.address),
            blood_group: text(&p.blood_group),
            active: p.active,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct TreatmentView {
    pub id: u64,
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl From<&Treatment> for TreatmentView {
    fn from(t: &Treatment) -> Self {
        Self {
            id: t.id.get(),
            diagnosis: text(&t.diagnosis),
            prescription: text(&t.prescription),
            notes: text(&t.notes),
            created_at: t.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AppointmentView {
    pub id: u64,
    pub patient_id: u64,
    pub patient_name: Option<String>,
    pub doctor_id: u64,
    pub doctor_name: Option<String>,
    pub date: String,
    pub time: String,
    pub reason: Option<String>,
    pub status: String,
    pub treatment: Option<TreatmentView>,
}

impl AppointmentView {
    pub fn new(tables: &Tables, a: &Appointment) -> Self {
        Self {
            id: a.id.get(),
            patient_id: a.patient_id.get(),
            patient_name: tables.patient(a.patient_id).ok().map(|p| p.name.to_string()),
            doctor_id: a.doctor_id.get(),
            doctor_name: tables.doctor(a.doctor_id).ok().map(|d| d.name.to_string()),
            date: a.date.format(DATE_FORMAT).to_string(),
            time: a.time.format(TIME_FORMAT).to_string(),
            reason: text(&a.reason),
            status: a.status.to_string(),
            treatment: treatment_for(tables, a.id).as_ref().map(TreatmentView::from),
        }
    }

    pub fn list(tables: &Tables, appointments: &[Appointment]) -> Vec<Self> {
        appointments.iter().map(|a| Self::new(tables, a)).collect()
    }
}

#[derive(Serialize, ToSchema)]
pub struct AvailabilityView {
    pub id: u64,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

impl From<&Availability> for AvailabilityView {
    fn from(w: &Availability) -> Self {
        Self {
            id: w.id.get(),
            date: w.date.format(DATE_FORMAT).to_string(),
            start_time: w.start_time.format(TIME_FORMAT).to_string(),
            end_time: w.end_time.format(TIME_FORMAT).to_string(),
        }
    }
}

/// `GET /login` and `GET /register`.
#[derive(Serialize, ToSchema)]
pub struct LoginView {
    pub flashes: Vec<Flash>,
    #[schema(value_type = Vec<String>)]
    pub user_types: Vec<Role>,
}

#[derive(Serialize, ToSchema)]
pub struct AdminDashboardView {
    pub flashes: Vec<Flash>,
    pub total_doctors: usize,
    pub total_patients: usize,
    pub total_appointments: usize,
    pub booked_appointments: usize,
    pub recent_appointments: Vec<AppointmentView>,
}

#[derive(Serialize, ToSchema)]
pub struct DoctorListView {
    pub flashes: Vec<Flash>,
    pub search: String,
    pub doctors: Vec<DoctorView>,
    pub departments: Vec<DepartmentView>,
}

#[derive(Serialize, ToSchema)]
pub struct PatientListView {
    pub flashes: Vec<Flash>,
    pub search: String,
    pub patients: Vec<PatientView>,
}

#[derive(Serialize, ToSchema)]
pub struct AppointmentListView {
    pub flashes: Vec<Flash>,
    pub appointments: Vec<AppointmentView>,
}

#[derive(Serialize, ToSchema)]
pub struct DoctorDashboardView {
    pub flashes: Vec<Flash>,
    pub doctor: DoctorView,
    pub upcoming: Vec<AppointmentView>,
    pub total_patients: usize,
    pub completed_today: usize,
}

#[derive(Serialize, ToSchema)]
pub struct AvailabilityListView {
    pub flashes: Vec<Flash>,
    pub availability: Vec<AvailabilityView>,
}

#[derive(Serialize, ToSchema)]
pub struct PatientHistoryView {
    pub flashes: Vec<Flash>,
    pub patient: PatientView,
    pub appointments: Vec<AppointmentView>,
}

#[derive(Serialize, ToSchema)]
pub struct PatientDashboardView {
    pub flashes: Vec<Flash>,
    pub patient: PatientView,
    pub departments: Vec<DepartmentView>,
    pub upcoming: Vec<AppointmentView>,
}

#[derive(Serialize, ToSchema)]
pub struct DoctorSearchView {
    pub flashes: Vec<Flash>,
    pub search: String,
    pub department_id: Option<u64>,
    pub departments: Vec<DepartmentView>,
    pub doctors: Vec<DoctorView>,
    /// First bookable date shown to the patient.
    pub today: String,
    pub week_later: String,
}

#[derive(Serialize, ToSchema)]
pub struct ProfileView {
    pub flashes: Vec<Flash>,
    pub patient: PatientView,
}
