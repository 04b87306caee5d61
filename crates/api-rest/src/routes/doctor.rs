use crate::error::{see_other, ApiError, OrBack};
use crate::forms::{AvailabilityForm, CompleteForm};
use crate::views::{
    AppointmentListView, AppointmentView, AvailabilityListView, AvailabilityView,
    DoctorDashboardView, DoctorView, PatientHistoryView, PatientListView, PatientView,
};
use crate::{AppState, SessionToken};
use api_shared::Flash;
use axum::{
    extract::{Path, State},
    response::{Json, Response},
    routing::{get, post},
    Form, Router,
};
use hms_core::access::require_doctor;
use hms_core::appointments::{
    complete_appointment as complete, doctor_patient_history, list_for_doctor, patients_of_doctor,
};
use hms_core::availability::{availability_for, declare_availability};
use hms_core::dashboard::doctor_dashboard;
use hms_core::identity::Doctor;
use hms_core::ids::{AppointmentId, PatientId};
use hms_core::validation::{parse_date, parse_time};
use hms_core::{HospitalResult, Role};

const APPOINTMENTS_PAGE: &str = "/doctor/appointments";
const AVAILABILITY_PAGE: &str = "/doctor/availability";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/doctor/dashboard", get(dashboard))
        .route("/doctor/appointments", get(appointments))
        .route(
            "/doctor/appointment/complete/:id",
            post(complete_appointment),
        )
        .route("/doctor/availability", get(availability).post(add_availability))
        .route("/doctor/patients", get(patients))
        .route("/doctor/patient/history/:id", get(patient_history))
}

impl AppState {
    async fn doctor(&self, session: &SessionToken) -> HospitalResult<Doctor> {
        let principal = self.require(session, Role::Doctor).await?;
        require_doctor(&principal).cloned()
    }
}

#[utoipa::path(
    get,
    path = "/doctor/dashboard",
    responses((status = 200, description = "Upcoming week, patient count and today's completions", body = DoctorDashboardView))
)]
pub(crate) async fn dashboard(
    State(state): State<AppState>,
    session: SessionToken,
) -> Result<Json<DoctorDashboardView>, ApiError> {
    let doctor = state.doctor(&session).await?;
    let today = chrono::Local::now().date_naive();
    let (summary, upcoming, doctor_view) = state.store.read(|t| {
        let summary = doctor_dashboard(t, doctor.id, today);
        let upcoming = AppointmentView::list(t, &summary.upcoming);
        (summary, upcoming, DoctorView::new(t, &doctor))
    })?;

    Ok(Json(DoctorDashboardView {
        flashes: state.sessions.take_flashes(session.0).await,
        doctor: doctor_view,
        upcoming,
        total_patients: summary.patient_count,
        completed_today: summary.completed_today,
    }))
}

#[utoipa::path(
    get,
    path = "/doctor/appointments",
    responses((status = 200, description = "The doctor's appointments, newest date first", body = AppointmentListView))
)]
pub(crate) async fn appointments(
    State(state): State<AppState>,
    session: SessionToken,
) -> Result<Json<AppointmentListView>, ApiError> {
    let doctor = state.doctor(&session).await?;
    let appointments = state
        .store
        .read(|t| AppointmentView::list(t, &list_for_doctor(t, doctor.id)))?;

    Ok(Json(AppointmentListView {
        flashes: state.sessions.take_flashes(session.0).await,
        appointments,
    }))
}

#[utoipa::path(
    post,
    path = "/doctor/appointment/complete/{id}",
    params(("id" = u64, Path, description = "Appointment id")),
    request_body(content = CompleteForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to /doctor/appointments with a flash"),
        (status = 404, description = "No such appointment")
    )
)]
/// Marks one of the doctor's booked appointments completed and records the treatment.
pub(crate) async fn complete_appointment(
    State(state): State<AppState>,
    session: SessionToken,
    Path(id): Path<u64>,
    Form(form): Form<CompleteForm>,
) -> Result<Response, ApiError> {
    let doctor = state.doctor(&session).await?;
    state
        .store
        .transaction(|uow| complete(uow, AppointmentId(id), doctor.id, form.into()))
        .or_back(APPOINTMENTS_PAGE)?;
    Ok(see_other(
        APPOINTMENTS_PAGE,
        Flash::success("Appointment completed successfully"),
    ))
}

#[utoipa::path(
    get,
    path = "/doctor/availability",
    responses((status = 200, description = "Declared availability windows", body = AvailabilityListView))
)]
pub(crate) async fn availability(
    State(state): State<AppState>,
    session: SessionToken,
) -> Result<Json<AvailabilityListView>, ApiError> {
    let doctor = state.doctor(&session).await?;
    let availability = state.store.read(|t| {
        availability_for(t, doctor.id)
            .iter()
            .map(AvailabilityView::from)
            .collect::<Vec<_>>()
    })?;

    Ok(Json(AvailabilityListView {
        flashes: state.sessions.take_flashes(session.0).await,
        availability,
    }))
}

#[utoipa::path(
    post,
    path = "/doctor/availability",
    request_body(content = AvailabilityForm, content_type = "application/x-www-form-urlencoded"),
    responses((status = 303, description = "Redirect to /doctor/availability with a flash"))
)]
pub(crate) async fn add_availability(
    State(state): State<AppState>,
    session: SessionToken,
    Form(form): Form<AvailabilityForm>,
) -> Result<Response, ApiError> {
    let doctor = state.doctor(&session).await?;
    let date = parse_date("date", &form.date).or_back(AVAILABILITY_PAGE)?;
    let start = parse_time("start_time", &form.start_time).or_back(AVAILABILITY_PAGE)?;
    let end = parse_time("end_time", &form.end_time).or_back(AVAILABILITY_PAGE)?;

    state
        .store
        .transaction(|uow| declare_availability(uow, doctor.id, date, start, end))
        .or_back(AVAILABILITY_PAGE)?;
    Ok(see_other(
        AVAILABILITY_PAGE,
        Flash::success("Availability added successfully"),
    ))
}

#[utoipa::path(
    get,
    path = "/doctor/patients",
    responses((status = 200, description = "Distinct patients with any appointment with the doctor", body = PatientListView))
)]
pub(crate) async fn patients(
    State(state): State<AppState>,
    session: SessionToken,
) -> Result<Json<PatientListView>, ApiError> {
    let doctor = state.doctor(&session).await?;
    let patients = state.store.read(|t| {
        patients_of_doctor(t, doctor.id)
            .iter()
            .map(PatientView::from)
            .collect::<Vec<_>>()
    })?;

    Ok(Json(PatientListView {
        flashes: state.sessions.take_flashes(session.0).await,
        search: String::new(),
        patients,
    }))
}

#[utoipa::path(
    get,
    path = "/doctor/patient/history/{id}",
    params(("id" = u64, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Completed visits between the doctor and the patient", body = PatientHistoryView),
        (status = 404, description = "No such patient")
    )
)]
pub(crate) async fn patient_history(
    State(state): State<AppState>,
    session: SessionToken,
    Path(id): Path<u64>,
) -> Result<Json<PatientHistoryView>, ApiError> {
    let doctor = state.doctor(&session).await?;
    let (patient, appointments) = state.store.read(|t| {
        doctor_patient_history(t, doctor.id, PatientId(id)).map(|(patient, visits)| {
            (
                PatientView::from(&patient),
                AppointmentView::list(t, &visits),
            )
        })
    })??;

    Ok(Json(PatientHistoryView {
        flashes: state.sessions.take_flashes(session.0).await,
        patient,
        appointments,
    }))
}
