//! Per-role dashboard summaries.
//!
//! Each summary is computed against an explicit `today` so that the date window is decided by
//! the caller (the HTTP layer passes the local date, tests pass a fixed one).

use crate::appointments::{
    list_upcoming_for_doctor, list_upcoming_for_patient, patients_of_doctor, recent, Appointment,
    AppointmentStatus,
};
use crate::constants::{RECENT_APPOINTMENTS_LIMIT, UPCOMING_WINDOW_DAYS};
use crate::directory::{list_departments, Department};
use crate::ids::{DoctorId, PatientId};
use crate::store::Tables;
use chrono::{Duration, NaiveDate};

#[derive(Clone, Debug)]
pub struct AdminDashboard {
    pub active_doctors: usize,
    pub active_patients: usize,
    pub total_appointments: usize,
    pub booked_appointments: usize,
    pub recent_appointments: Vec<Appointment>,
}

#[derive(Clone, Debug)]
pub struct DoctorDashboard {
    pub upcoming: Vec<Appointment>,
    pub patient_count: usize,
    pub completed_today: usize,
}

#[derive(Clone, Debug)]
pub struct PatientDashboard {
    pub departments: Vec<Department>,
    pub upcoming: Vec<Appointment>,
}

pub fn admin_dashboard(tables: &Tables) -> AdminDashboard {
    AdminDashboard {
        active_doctors: tables.doctors().filter(|d| d.active).count(),
        active_patients: tables.patients().filter(|p| p.active).count(),
        total_appointments: tables.appointments().count(),
        booked_appointments: tables
            .appointments()
            .filter(|a| a.status == AppointmentStatus::Booked)
            .count(),
        recent_appointments: recent(tables, RECENT_APPOINTMENTS_LIMIT),
    }
}

/// Upcoming covers `today..=today + 7 days`. "Completed today" counts appointments dated today
/// whose status is `Completed`.
pub fn doctor_dashboard(tables: &Tables, doctor_id: DoctorId, today: NaiveDate) -> DoctorDashboard {
    let until = today + Duration::days(UPCOMING_WINDOW_DAYS);
    DoctorDashboard {
        upcoming: list_upcoming_for_doctor(tables, doctor_id, today, until),
        patient_count: patients_of_doctor(tables, doctor_id).len(),
        completed_today: tables
            .appointments()
            .filter(|a| {
                a.doctor_id == doctor_id
                    && a.date == today
                    && a.status == AppointmentStatus::Completed
            })
            .count(),
    }
}

pub fn patient_dashboard(
    tables: &Tables,
    patient_id: PatientId,
    today: NaiveDate,
) -> PatientDashboard {
    PatientDashboard {
        departments: list_departments(tables),
        upcoming: list_upcoming_for_patient(tables, patient_id, today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointments::{book_appointment, cancel_appointment, complete_appointment, BookingRequest};
    use crate::directory::seed_departments;
    use crate::identity::{add_doctor, deactivate_patient, register_patient, NewDoctor, NewPatient};
    use crate::ids::DepartmentId;
    use crate::store::{Store, UnitOfWork};
    use crate::treatment::TreatmentInput;
    use chrono::NaiveTime;
    use hms_types::{EmailAddress, NonEmptyText};

    fn text(value: &str) -> NonEmptyText {
        NonEmptyText::new(value).unwrap()
    }

    fn at(day: u32, hour: u32) -> (NaiveDate, NaiveTime) {
        (
            NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        )
    }

    fn populated() -> (Store, DoctorId, PatientId) {
        let store = Store::in_memory();
        let ids = store
            .transaction(|uow| {
                seed_departments(uow)?;
                let doctor = add_doctor(
                    uow,
                    NewDoctor {
                        username: text("house"),
                        name: text("Gregory House"),
                        email: EmailAddress::parse("house@hospital.com")?,
                        phone: None,
                        department_id: DepartmentId(7),
                        experience_years: 20,
                        qualification: None,
                    },
                    "pw",
                )?;
                let mut patients = Vec::new();
                for name in ["alice", "bob", "carol"] {
                    let patient = register_patient(
                        uow,
                        NewPatient {
                            username: text(name),
                            name: text(name),
                            email: EmailAddress::parse(format!("{name}@x.com"))?,
                            phone: None,
                            date_of_birth: None,
                            gender: None,
                            address: None,
                            blood_group: None,
                        },
                        "pw",
                    )?;
                    patients.push(patient.id);
                }
                deactivate_patient(uow, patients[2])?;

                let book = |uow: &mut UnitOfWork<'_>,
                            patient: PatientId,
                            (date, time): (NaiveDate, NaiveTime)| {
                    book_appointment(
                        uow,
                        patient,
                        BookingRequest {
                            doctor_id: doctor.id,
                            date,
                            time,
                            reason: None,
                        },
                    )
                };
                let done = book(uow, patients[0], at(1, 9))?;
                complete_appointment(uow, done.id, doctor.id, TreatmentInput::default())?;
                book(uow, patients[0], at(3, 9))?;
                book(uow, patients[1], at(8, 9))?;
                book(uow, patients[1], at(9, 9))?;
                let cancelled = book(uow, patients[1], at(4, 9))?;
                cancel_appointment(uow, cancelled.id, patients[1])?;
                Ok((doctor.id, patients[0]))
            })
            .unwrap();
        (store, ids.0, ids.1)
    }

    #[test]
    fn test_admin_dashboard_counts() {
        let (store, _, _) = populated();
        let dashboard = store.read(admin_dashboard).unwrap();
        assert_eq!(dashboard.active_doctors, 1);
        assert_eq!(dashboard.active_patients, 2);
        assert_eq!(dashboard.total_appointments, 5);
        assert_eq!(dashboard.booked_appointments, 3);
        assert_eq!(dashboard.recent_appointments.len(), 5);
    }

    #[test]
    fn test_doctor_dashboard_window_is_seven_days_inclusive() {
        let (store, doctor, _) = populated();
        let (today, _) = at(1, 0);
        let dashboard = store.read(|t| doctor_dashboard(t, doctor, today)).unwrap();

        let dates: Vec<u32> = dashboard
            .upcoming
            .iter()
            .map(|a| chrono::Datelike::day(&a.date))
            .collect();
        assert_eq!(dates, vec![3, 8], "day 9 is outside the window");
        assert_eq!(dashboard.patient_count, 2);
        assert_eq!(dashboard.completed_today, 1);
    }

    #[test]
    fn test_patient_dashboard_lists_departments_and_upcoming() {
        let (store, _, alice) = populated();
        let (today, _) = at(2, 0);
        let dashboard = store.read(|t| patient_dashboard(t, alice, today)).unwrap();
        assert_eq!(dashboard.departments.len(), 7);
        assert_eq!(dashboard.upcoming.len(), 1);
    }
}
