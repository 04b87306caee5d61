//! Doctor availability windows.

use crate::error::{ConflictReason, HospitalError, HospitalResult};
use crate::ids::{AvailabilityId, DoctorId};
use crate::store::{Tables, UnitOfWork};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub id: AvailabilityId,
    pub doctor_id: DoctorId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl Availability {
    /// Half-open overlap on the same date: touching windows (09:00-10:00, 10:00-11:00) do not
    /// overlap.
    pub fn overlaps(&self, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> bool {
        self.date == date && self.start_time < end && start < self.end_time
    }
}

/// Declares a new window for `doctor_id`.
///
/// # Errors
///
/// - `Validation` if `start_time` is not before `end_time`
/// - `NotFound` if the doctor does not exist
/// - `Conflict(AvailabilityOverlap)` if the window overlaps one already declared
pub fn declare_availability(
    uow: &mut UnitOfWork<'_>,
    doctor_id: DoctorId,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> HospitalResult<Availability> {
    if start_time >= end_time {
        return Err(HospitalError::Validation(
            "start time must be before end time".into(),
        ));
    }
    uow.tables().doctor(doctor_id)?;

    if uow
        .tables()
        .availability()
        .any(|w| w.doctor_id == doctor_id && w.overlaps(date, start_time, end_time))
    {
        return Err(ConflictReason::AvailabilityOverlap.into());
    }

    let window = uow.insert_availability(|id| Availability {
        id,
        doctor_id,
        date,
        start_time,
        end_time,
    })?;
    tracing::info!(doctor_id = %doctor_id, "declared availability {date} {start_time}-{end_time}");
    Ok(window)
}

/// A doctor's windows, newest date first and earliest start first within a date.
pub fn availability_for(tables: &Tables, doctor_id: DoctorId) -> Vec<Availability> {
    let mut windows: Vec<Availability> = tables
        .availability()
        .filter(|w| w.doctor_id == doctor_id)
        .cloned()
        .collect();
    windows.sort_by(|a, b| b.date.cmp(&a.date).then(a.start_time.cmp(&b.start_time)));
    windows
}
