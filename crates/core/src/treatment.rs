//! Treatment records attached to completed appointments.

use crate::ids::{AppointmentId, TreatmentId};
use crate::store::Tables;
use chrono::{DateTime, Utc};
use hms_types::NonEmptyText;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Treatment {
    pub id: TreatmentId,
    pub appointment_id: AppointmentId,
    pub diagnosis: Option<NonEmptyText>,
    pub prescription: Option<NonEmptyText>,
    pub notes: Option<NonEmptyText>,
    pub created_at: DateTime<Utc>,
}

/// What the doctor records when completing an appointment.
#[derive(Clone, Debug, Default)]
pub struct TreatmentInput {
    pub diagnosis: Option<NonEmptyText>,
    pub prescription: Option<NonEmptyText>,
    pub notes: Option<NonEmptyText>,
}

pub fn treatment_for(tables: &Tables, appointment_id: AppointmentId) -> Option<Treatment> {
    tables.treatment_for(appointment_id).cloned()
}
