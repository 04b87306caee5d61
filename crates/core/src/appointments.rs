//! Appointment booking, status transitions and schedule queries.
//!
//! ## Lifecycle
//!
//! ```text
//! Booked ──complete (doctor)──▶ Completed
//!    └────cancel (patient)────▶ Cancelled
//! ```
//!
//! `Completed` and `Cancelled` are terminal. Completing creates exactly one [`Treatment`].
//!
//! ## Slot contention
//!
//! A slot is `(doctor, date, time)`. At most one `Booked` appointment may hold a slot; a
//! cancelled appointment frees it. [`book_appointment`] checks the slot and inserts inside the
//! same unit of work, and the store refuses a second `Booked` insert for the slot as well, so
//! two concurrent bookings cannot both succeed.

use crate::access::{ensure_doctor_owns, ensure_patient_owns};
use crate::error::{ConflictReason, HospitalResult};
use crate::identity::Patient;
use crate::ids::{AppointmentId, DoctorId, PatientId};
use crate::store::{Tables, UnitOfWork};
use crate::treatment::{Treatment, TreatmentInput};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use hms_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Booked,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Booked => "Booked",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, AppointmentStatus::Booked)
    }

    /// Only `Booked → Completed` and `Booked → Cancelled` are legal.
    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        self == AppointmentStatus::Booked && next.is_terminal()
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unit booking contention is keyed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Slot {
    pub doctor_id: DoctorId,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub reason: Option<NonEmptyText>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn slot(&self) -> Slot {
        Slot {
            doctor_id: self.doctor_id,
            date: self.date,
            time: self.time,
        }
    }

    fn transition(&mut self, next: AppointmentStatus) -> HospitalResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(ConflictReason::InvalidTransition {
                from: self.status,
                to: next,
            }
            .into());
        }
        self.status = next;
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct BookingRequest {
    pub doctor_id: DoctorId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub reason: Option<NonEmptyText>,
}

/// Books the requested slot for `patient_id`.
///
/// # Errors
///
/// - `NotFound` if the patient or doctor does not exist, or the doctor is deactivated
/// - `Conflict(SlotTaken)` if another `Booked` appointment holds the slot
pub fn book_appointment(
    uow: &mut UnitOfWork<'_>,
    patient_id: PatientId,
    request: BookingRequest,
) -> HospitalResult<Appointment> {
    uow.tables().patient(patient_id)?;
    let doctor = uow.tables().doctor(request.doctor_id)?;
    if !doctor.active {
        return Err(request.doctor_id.not_found());
    }

    let slot = Slot {
        doctor_id: request.doctor_id,
        date: request.date,
        time: request.time,
    };
    if let Some(existing) = uow.tables().booked_in_slot(&slot) {
        tracing::warn!(
            "slot {} {} of doctor {} already held by appointment {}",
            slot.date,
            slot.time,
            slot.doctor_id,
            existing.id
        );
        return Err(ConflictReason::SlotTaken.into());
    }

    let appointment = uow.insert_appointment(|id| Appointment {
        id,
        patient_id,
        doctor_id: request.doctor_id,
        date: request.date,
        time: request.time,
        reason: request.reason,
        status: AppointmentStatus::Booked,
        created_at: Utc::now(),
    })?;

    tracing::info!(
        appointment_id = %appointment.id,
        "patient {patient_id} booked doctor {} for {} {}",
        appointment.doctor_id,
        appointment.date,
        appointment.time
    );
    Ok(appointment)
}

/// Marks a booked appointment completed and records its treatment.
///
/// # Errors
///
/// - `NotFound` if the appointment does not exist
/// - `Forbidden` if it belongs to another doctor
/// - `Conflict(InvalidTransition)` if it is already completed or cancelled
pub fn complete_appointment(
    uow: &mut UnitOfWork<'_>,
    appointment_id: AppointmentId,
    acting_doctor_id: DoctorId,
    input: TreatmentInput,
) -> HospitalResult<Treatment> {
    let mut appointment = uow.tables().appointment(appointment_id)?.clone();
    ensure_doctor_owns(acting_doctor_id, &appointment)?;
    appointment.transition(AppointmentStatus::Completed)?;
    uow.update_appointment(appointment)?;

    let treatment = uow.insert_treatment(|id| Treatment {
        id,
        appointment_id,
        diagnosis: input.diagnosis,
        prescription: input.prescription,
        notes: input.notes,
        created_at: Utc::now(),
    })?;

    tracing::info!(appointment_id = %appointment_id, "doctor {acting_doctor_id} completed appointment");
    Ok(treatment)
}

/// Cancels a booked appointment. The record is kept with status `Cancelled`.
///
/// # Errors
///
/// - `NotFound` if the appointment does not exist
/// - `Forbidden` if it belongs to another patient
/// - `Conflict(InvalidTransition)` if it is already completed or cancelled
pub fn cancel_appointment(
    uow: &mut UnitOfWork<'_>,
    appointment_id: AppointmentId,
    acting_patient_id: PatientId,
) -> HospitalResult<Appointment> {
    let mut appointment = uow.tables().appointment(appointment_id)?.clone();
    ensure_patient_owns(acting_patient_id, &appointment)?;
    appointment.transition(AppointmentStatus::Cancelled)?;

    let appointment = uow.update_appointment(appointment)?;
    tracing::info!(appointment_id = %appointment_id, "patient {acting_patient_id} cancelled appointment");
    Ok(appointment)
}

fn ascending(a: &Appointment, b: &Appointment) -> std::cmp::Ordering {
    a.date.cmp(&b.date).then(a.time.cmp(&b.time))
}

fn descending(a: &Appointment, b: &Appointment) -> std::cmp::Ordering {
    ascending(b, a)
}

fn collect_sorted<'a>(
    appointments: impl Iterator<Item = &'a Appointment>,
    order: fn(&Appointment, &Appointment) -> std::cmp::Ordering,
) -> Vec<Appointment> {
    let mut list: Vec<Appointment> = appointments.cloned().collect();
    list.sort_by(order);
    list
}

/// A doctor's `Booked` appointments dated within `[from, to]`, earliest first.
pub fn list_upcoming_for_doctor(
    tables: &Tables,
    doctor_id: DoctorId,
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<Appointment> {
    collect_sorted(
        tables.appointments().filter(|a| {
            a.doctor_id == doctor_id
                && a.status == AppointmentStatus::Booked
                && a.date >= from
                && a.date <= to
        }),
        ascending,
    )
}

/// A patient's `Completed` appointments, most recent first.
pub fn list_history_for_patient(tables: &Tables, patient_id: PatientId) -> Vec<Appointment> {
    collect_sorted(
        tables
            .appointments()
            .filter(|a| a.patient_id == patient_id && a.status == AppointmentStatus::Completed),
        descending,
    )
}

/// A patient's `Booked` appointments dated `from` or later, earliest first.
pub fn list_upcoming_for_patient(
    tables: &Tables,
    patient_id: PatientId,
    from: NaiveDate,
) -> Vec<Appointment> {
    collect_sorted(
        tables.appointments().filter(|a| {
            a.patient_id == patient_id && a.status == AppointmentStatus::Booked && a.date >= from
        }),
        ascending,
    )
}

pub fn list_for_doctor(tables: &Tables, doctor_id: DoctorId) -> Vec<Appointment> {
    collect_sorted(
        tables.appointments().filter(|a| a.doctor_id == doctor_id),
        descending,
    )
}

pub fn list_for_patient(tables: &Tables, patient_id: PatientId) -> Vec<Appointment> {
    collect_sorted(
        tables.appointments().filter(|a| a.patient_id == patient_id),
        descending,
    )
}

pub fn list_all(tables: &Tables) -> Vec<Appointment> {
    collect_sorted(tables.appointments(), descending)
}

/// The `limit` most recently created appointments.
pub fn recent(tables: &Tables, limit: usize) -> Vec<Appointment> {
    let mut list: Vec<Appointment> = tables.appointments().cloned().collect();
    list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    list.truncate(limit);
    list
}

/// Distinct patients who have any appointment with the doctor, in id order.
pub fn patients_of_doctor(tables: &Tables, doctor_id: DoctorId) -> Vec<Patient> {
    let ids: BTreeSet<PatientId> = tables
        .appointments()
        .filter(|a| a.doctor_id == doctor_id)
        .map(|a| a.patient_id)
        .collect();
    ids.into_iter()
        .filter_map(|id| tables.patient(id).ok().cloned())
        .collect()
}

/// Completed visits between a doctor and one patient, most recent first.
///
/// # Errors
///
/// Returns `NotFound` if the patient does not exist.
pub fn doctor_patient_history(
    tables: &Tables,
    doctor_id: DoctorId,
    patient_id: PatientId,
) -> HospitalResult<(Patient, Vec<Appointment>)> {
    let patient = tables.patient(patient_id)?.clone();
    let visits = collect_sorted(
        tables.appointments().filter(|a| {
            a.doctor_id == doctor_id
                && a.patient_id == patient_id
                && a.status == AppointmentStatus::Completed
        }),
        descending,
    );
    Ok((patient, visits))
}

/// Looks up an appointment that must exist; convenience for view handlers.
pub fn appointment(tables: &Tables, id: AppointmentId) -> HospitalResult<Appointment> {
    tables.appointment(id).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::seed_departments;
    use crate::error::HospitalError;
    use crate::identity::{
        add_doctor, deactivate_doctor, register_patient, NewDoctor, NewPatient,
    };
    use crate::ids::DepartmentId;
    use crate::store::Store;
    use crate::treatment::treatment_for;
    use hms_types::EmailAddress;
    use std::sync::{Arc, Barrier};

    fn text(value: &str) -> NonEmptyText {
        NonEmptyText::new(value).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    struct Fixture {
        store: Store,
        house: DoctorId,
        wilson: DoctorId,
        alice: PatientId,
        bob: PatientId,
    }

    fn fixture() -> Fixture {
        let store = Store::in_memory();
        let (house, wilson, alice, bob) = store
            .transaction(|uow| {
                seed_departments(uow)?;
                let doctor = |username: &str| NewDoctor {
                    username: text(username),
                    name: text(username),
                    email: EmailAddress::parse(format!("{username}@hospital.com")).unwrap(),
                    phone: None,
                    department_id: DepartmentId(1),
                    experience_years: 10,
                    qualification: None,
                };
                let patient = |username: &str| NewPatient {
                    username: text(username),
                    name: text(username),
                    email: EmailAddress::parse(format!("{username}@x.com")).unwrap(),
                    phone: None,
                    date_of_birth: None,
                    gender: None,
                    address: None,
                    blood_group: None,
                };
                let house = add_doctor(uow, doctor("house"), "pw")?.id;
                let wilson = add_doctor(uow, doctor("wilson"), "pw")?.id;
                let alice = register_patient(uow, patient("alice"), "pw")?.id;
                let bob = register_patient(uow, patient("bob"), "pw")?.id;
                Ok((house, wilson, alice, bob))
            })
            .unwrap();
        Fixture {
            store,
            house,
            wilson,
            alice,
            bob,
        }
    }

    fn request(doctor_id: DoctorId, d: NaiveDate, t: NaiveTime) -> BookingRequest {
        BookingRequest {
            doctor_id,
            date: d,
            time: t,
            reason: Some(text("checkup")),
        }
    }

    fn book(f: &Fixture, patient: PatientId, doctor: DoctorId, d: NaiveDate, t: NaiveTime) -> Appointment {
        f.store
            .transaction(|uow| book_appointment(uow, patient, request(doctor, d, t)))
            .expect("booking should succeed")
    }

    #[test]
    fn test_second_booking_of_same_slot_conflicts() {
        let f = fixture();
        let first = book(&f, f.alice, f.house, date(2025, 6, 1), time(10, 0));

        let err = f
            .store
            .transaction(|uow| {
                book_appointment(uow, f.bob, request(f.house, date(2025, 6, 1), time(10, 0)))
            })
            .expect_err("second booking should fail");
        assert!(matches!(
            err,
            HospitalError::Conflict(ConflictReason::SlotTaken)
        ));

        let still = f.store.read(|t| appointment(t, first.id)).unwrap().unwrap();
        assert_eq!(still.status, AppointmentStatus::Booked);
        assert_eq!(still.patient_id, f.alice);
    }

    #[test]
    fn test_slot_is_per_doctor_and_time() {
        let f = fixture();
        book(&f, f.alice, f.house, date(2025, 6, 1), time(10, 0));
        book(&f, f.bob, f.wilson, date(2025, 6, 1), time(10, 0));
        book(&f, f.bob, f.house, date(2025, 6, 1), time(10, 30));
        assert_eq!(f.store.read(|t| t.appointments().count()).unwrap(), 3);
    }

    #[test]
    fn test_cancelled_slot_can_be_rebooked() {
        let f = fixture();
        let first = book(&f, f.alice, f.house, date(2025, 6, 1), time(10, 0));
        f.store
            .transaction(|uow| cancel_appointment(uow, first.id, f.alice))
            .unwrap();

        let second = book(&f, f.bob, f.house, date(2025, 6, 1), time(10, 0));
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_booking_unknown_or_inactive_doctor_is_not_found() {
        let f = fixture();
        let err = f
            .store
            .transaction(|uow| {
                book_appointment(uow, f.alice, request(DoctorId(77), date(2025, 6, 1), time(9, 0)))
            })
            .expect_err("unknown doctor should fail");
        assert!(matches!(err, HospitalError::NotFound { entity: "doctor", id: 77 }));

        f.store
            .transaction(|uow| deactivate_doctor(uow, f.wilson))
            .unwrap();
        let err = f
            .store
            .transaction(|uow| {
                book_appointment(uow, f.alice, request(f.wilson, date(2025, 6, 1), time(9, 0)))
            })
            .expect_err("inactive doctor should fail");
        assert!(matches!(err, HospitalError::NotFound { .. }));
    }

    #[test]
    fn test_cancel_keeps_record_and_updates_listings() {
        let f = fixture();
        let appt = book(&f, f.alice, f.house, date(2025, 6, 1), time(10, 0));

        let upcoming = f
            .store
            .read(|t| list_upcoming_for_patient(t, f.alice, date(2025, 5, 1)))
            .unwrap();
        assert_eq!(upcoming.len(), 1);

        let cancelled = f
            .store
            .transaction(|uow| cancel_appointment(uow, appt.id, f.alice))
            .unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

        let all = f.store.read(|t| list_for_patient(t, f.alice)).unwrap();
        assert_eq!(all.len(), 1, "cancelling must not delete");
        assert_eq!(all[0].status, AppointmentStatus::Cancelled);

        let upcoming = f
            .store
            .read(|t| list_upcoming_for_patient(t, f.alice, date(2025, 5, 1)))
            .unwrap();
        assert!(upcoming.is_empty());
    }

    #[test]
    fn test_cancel_by_other_patient_is_forbidden() {
        let f = fixture();
        let appt = book(&f, f.alice, f.house, date(2025, 6, 1), time(10, 0));
        let err = f
            .store
            .transaction(|uow| cancel_appointment(uow, appt.id, f.bob))
            .expect_err("bob may not cancel alice's appointment");
        assert!(matches!(err, HospitalError::Forbidden { .. }));
    }

    #[test]
    fn test_complete_creates_exactly_one_treatment() {
        let f = fixture();
        let appt = book(&f, f.alice, f.house, date(2025, 6, 1), time(10, 0));

        let treatment = f
            .store
            .transaction(|uow| {
                complete_appointment(
                    uow,
                    appt.id,
                    f.house,
                    TreatmentInput {
                        diagnosis: Some(text("flu")),
                        prescription: Some(text("rest")),
                        notes: None,
                    },
                )
            })
            .unwrap();
        assert_eq!(treatment.appointment_id, appt.id);

        let err = f
            .store
            .transaction(|uow| {
                complete_appointment(uow, appt.id, f.house, TreatmentInput::default())
            })
            .expect_err("second completion should fail");
        assert!(matches!(
            err,
            HospitalError::Conflict(ConflictReason::InvalidTransition {
                from: AppointmentStatus::Completed,
                to: AppointmentStatus::Completed
            })
        ));

        assert_eq!(f.store.read(|t| t.treatments().count()).unwrap(), 1);
        let stored = f.store.read(|t| treatment_for(t, appt.id)).unwrap().unwrap();
        assert_eq!(stored.diagnosis.unwrap().as_str(), "flu");
    }

    #[test]
    fn test_other_doctor_cannot_complete() {
        let f = fixture();
        let appt = book(&f, f.alice, f.house, date(2025, 6, 1), time(10, 0));
        let err = f
            .store
            .transaction(|uow| {
                complete_appointment(uow, appt.id, f.wilson, TreatmentInput::default())
            })
            .expect_err("wilson may not complete house's appointment");
        assert!(matches!(err, HospitalError::Forbidden { .. }));

        let still = f.store.read(|t| appointment(t, appt.id)).unwrap().unwrap();
        assert_eq!(still.status, AppointmentStatus::Booked);
        assert_eq!(f.store.read(|t| t.treatments().count()).unwrap(), 0);
    }

    #[test]
    fn test_terminal_states_cannot_be_left() {
        let f = fixture();
        let done = book(&f, f.alice, f.house, date(2025, 6, 1), time(10, 0));
        f.store
            .transaction(|uow| complete_appointment(uow, done.id, f.house, TreatmentInput::default()))
            .unwrap();
        let err = f
            .store
            .transaction(|uow| cancel_appointment(uow, done.id, f.alice))
            .expect_err("completed appointments cannot be cancelled");
        assert!(matches!(err, HospitalError::Conflict(_)));

        let gone = book(&f, f.alice, f.house, date(2025, 6, 2), time(10, 0));
        f.store
            .transaction(|uow| cancel_appointment(uow, gone.id, f.alice))
            .unwrap();
        let err = f
            .store
            .transaction(|uow| complete_appointment(uow, gone.id, f.house, TreatmentInput::default()))
            .expect_err("cancelled appointments cannot be completed");
        assert!(matches!(err, HospitalError::Conflict(_)));
        assert_eq!(f.store.read(|t| t.treatments().count()).unwrap(), 1);
    }

    #[test]
    fn test_missing_appointment_is_not_found() {
        let f = fixture();
        let err = f
            .store
            .transaction(|uow| cancel_appointment(uow, AppointmentId(404), f.alice))
            .expect_err("unknown appointment should fail");
        assert!(matches!(
            err,
            HospitalError::NotFound {
                entity: "appointment",
                id: 404
            }
        ));
    }

    #[test]
    fn test_upcoming_for_doctor_filters_window_and_status() {
        let f = fixture();
        let later = book(&f, f.alice, f.house, date(2025, 6, 5), time(9, 0));
        let sooner = book(&f, f.bob, f.house, date(2025, 6, 2), time(15, 0));
        let same_day_early = book(&f, f.alice, f.house, date(2025, 6, 2), time(8, 0));
        book(&f, f.alice, f.house, date(2025, 6, 20), time(9, 0));
        book(&f, f.alice, f.wilson, date(2025, 6, 3), time(9, 0));
        let cancelled = book(&f, f.bob, f.house, date(2025, 6, 4), time(9, 0));
        f.store
            .transaction(|uow| cancel_appointment(uow, cancelled.id, f.bob))
            .unwrap();

        let upcoming = f
            .store
            .read(|t| list_upcoming_for_doctor(t, f.house, date(2025, 6, 1), date(2025, 6, 8)))
            .unwrap();
        let ids: Vec<AppointmentId> = upcoming.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![same_day_early.id, sooner.id, later.id]);
    }

    #[test]
    fn test_history_is_completed_only_newest_first() {
        let f = fixture();
        let old = book(&f, f.alice, f.house, date(2025, 1, 10), time(9, 0));
        let new = book(&f, f.alice, f.wilson, date(2025, 3, 10), time(9, 0));
        book(&f, f.alice, f.house, date(2025, 4, 10), time(9, 0));
        f.store
            .transaction(|uow| {
                complete_appointment(uow, old.id, f.house, TreatmentInput::default())?;
                complete_appointment(uow, new.id, f.wilson, TreatmentInput::default())
            })
            .unwrap();

        let history = f
            .store
            .read(|t| list_history_for_patient(t, f.alice))
            .unwrap();
        let ids: Vec<AppointmentId> = history.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![new.id, old.id]);

        let (patient, with_house) = f
            .store
            .read(|t| doctor_patient_history(t, f.house, f.alice))
            .unwrap()
            .unwrap();
        assert_eq!(patient.id, f.alice);
        assert_eq!(with_house.len(), 1);
    }

    #[test]
    fn test_patients_of_doctor_are_distinct() {
        let f = fixture();
        book(&f, f.alice, f.house, date(2025, 6, 1), time(9, 0));
        book(&f, f.alice, f.house, date(2025, 6, 2), time(9, 0));
        book(&f, f.bob, f.house, date(2025, 6, 3), time(9, 0));
        book(&f, f.bob, f.wilson, date(2025, 6, 3), time(9, 0));

        let patients = f.store.read(|t| patients_of_doctor(t, f.house)).unwrap();
        let ids: Vec<PatientId> = patients.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![f.alice, f.bob]);
    }

    #[test]
    fn test_recent_is_limited_and_newest_first() {
        let f = fixture();
        for day in 1..=5 {
            book(&f, f.alice, f.house, date(2025, 6, day), time(9, 0));
        }
        let latest = f.store.read(|t| recent(t, 3)).unwrap();
        let ids: Vec<u64> = latest.iter().map(|a| a.id.get()).collect();
        assert_eq!(ids, vec![5, 4, 3]);
    }

    #[test]
    fn test_concurrent_bookings_for_one_slot_have_one_winner() {
        let f = fixture();
        let store = Arc::new(f.store);
        let contenders = 8;
        let barrier = Arc::new(Barrier::new(contenders));

        let handles: Vec<_> = (0..contenders)
            .map(|i| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                let patient = if i % 2 == 0 { f.alice } else { f.bob };
                let doctor = f.house;
                std::thread::spawn(move || {
                    barrier.wait();
                    store.transaction(|uow| {
                        book_appointment(
                            uow,
                            patient,
                            BookingRequest {
                                doctor_id: doctor,
                                date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                                time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                                reason: None,
                            },
                        )
                    })
                })
            })
            .collect();

        let results: Vec<HospitalResult<Appointment>> = handles
            .into_iter()
            .map(|h| h.join().expect("booking thread panicked"))
            .collect();

        let winners = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(HospitalError::Conflict(ConflictReason::SlotTaken))))
            .count();
        assert_eq!(winners, 1, "exactly one booking should succeed");
        assert_eq!(conflicts, contenders - 1);
        assert_eq!(store.read(|t| t.appointments().count()).unwrap(), 1);
    }

    #[test]
    fn test_status_machine() {
        use AppointmentStatus::*;
        assert!(Booked.can_transition_to(Completed));
        assert!(Booked.can_transition_to(Cancelled));
        assert!(!Booked.can_transition_to(Booked));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Completed));
    }
}
