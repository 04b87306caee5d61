use crate::error::{see_other, ApiError, OrBack};
use crate::forms::{BookingForm, DoctorSearchQuery, ProfileForm};
use crate::views::{
    AppointmentListView, AppointmentView, DepartmentView, DoctorSearchView, DoctorView,
    PatientDashboardView, PatientView, ProfileView,
};
use crate::{AppState, SessionToken};
use api_shared::Flash;
use axum::{
    extract::{Path, Query, State},
    response::{Json, Response},
    routing::{get, post},
    Form, Router,
};
use chrono::Duration;
use hms_core::access::require_patient;
use hms_core::appointments::{
    book_appointment, cancel_appointment, list_for_patient, list_history_for_patient,
};
use hms_core::constants::{DATE_FORMAT, UPCOMING_WINDOW_DAYS};
use hms_core::dashboard::patient_dashboard;
use hms_core::directory::{find_doctors, list_departments};
use hms_core::identity::{update_profile as apply_profile, Patient};
use hms_core::ids::{AppointmentId, DoctorId};
use hms_core::{HospitalResult, Role};

const DOCTORS_PAGE: &str = "/patient/doctors";
const APPOINTMENTS_PAGE: &str = "/patient/appointments";
const PROFILE_PAGE: &str = "/patient/profile";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/patient/dashboard", get(dashboard))
        .route("/patient/doctors", get(doctors))
        .route("/patient/book/:doctor_id", post(book))
        .route("/patient/appointments", get(appointments))
        .route("/patient/appointment/cancel/:id", get(cancel))
        .route("/patient/history", get(history))
        .route("/patient/profile", get(profile).post(update_profile))
}

impl AppState {
    async fn patient(&self, session: &SessionToken) -> HospitalResult<Patient> {
        let principal = self.require(session, Role::Patient).await?;
        require_patient(&principal).cloned()
    }
}

#[utoipa::path(
    get,
    path = "/patient/dashboard",
    responses((status = 200, description = "Departments and upcoming appointments", body = PatientDashboardView))
)]
pub(crate) async fn dashboard(
    State(state): State<AppState>,
    session: SessionToken,
) -> Result<Json<PatientDashboardView>, ApiError> {
    let patient = state.patient(&session).await?;
    let today = chrono::Local::now().date_naive();
    let (departments, upcoming) = state.store.read(|t| {
        let summary = patient_dashboard(t, patient.id, today);
        let departments: Vec<DepartmentView> =
            summary.departments.iter().map(DepartmentView::from).collect();
        (departments, AppointmentView::list(t, &summary.upcoming))
    })?;

    Ok(Json(PatientDashboardView {
        flashes: state.sessions.take_flashes(session.0).await,
        patient: PatientView::from(&patient),
        departments,
        upcoming,
    }))
}

#[utoipa::path(
    get,
    path = "/patient/doctors",
    params(DoctorSearchQuery),
    responses((status = 200, description = "Active doctors matching the filters", body = DoctorSearchView))
)]
/// Active doctors filtered by name substring and department.
pub(crate) async fn doctors(
    State(state): State<AppState>,
    session: SessionToken,
    Query(query): Query<DoctorSearchQuery>,
) -> Result<Json<DoctorSearchView>, ApiError> {
    state.patient(&session).await?;
    let department_id = query.department().or_back(DOCTORS_PAGE)?;
    let (doctors, departments) = state.store.read(|t| {
        let doctors: Vec<DoctorView> = find_doctors(t, Some(&query.search), department_id)
            .iter()
            .map(|d| DoctorView::new(t, d))
            .collect();
        let departments: Vec<DepartmentView> =
            list_departments(t).iter().map(DepartmentView::from).collect();
        (doctors, departments)
    })?;

    let today = chrono::Local::now().date_naive();
    Ok(Json(DoctorSearchView {
        flashes: state.sessions.take_flashes(session.0).await,
        search: query.search,
        department_id: department_id.map(|id| id.get()),
        departments,
        doctors,
        today: today.format(DATE_FORMAT).to_string(),
        week_later: (today + Duration::days(UPCOMING_WINDOW_DAYS))
            .format(DATE_FORMAT)
            .to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/patient/book/{doctor_id}",
    params(("doctor_id" = u64, Path, description = "Doctor id")),
    request_body(content = BookingForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Booked; redirect to /patient/appointments, or back to /patient/doctors with a flash"),
        (status = 404, description = "No such active doctor")
    )
)]
/// Books a slot with a doctor. A slot already held by a booked appointment is refused.
pub(crate) async fn book(
    State(state): State<AppState>,
    session: SessionToken,
    Path(doctor_id): Path<u64>,
    Form(form): Form<BookingForm>,
) -> Result<Response, ApiError> {
    let patient = state.patient(&session).await?;
    let request = form.into_request(DoctorId(doctor_id)).or_back(DOCTORS_PAGE)?;
    state
        .store
        .transaction(|uow| book_appointment(uow, patient.id, request))
        .or_back(DOCTORS_PAGE)?;
    Ok(see_other(
        APPOINTMENTS_PAGE,
        Flash::success("Appointment booked successfully"),
    ))
}

#[utoipa::path(
    get,
    path = "/patient/appointments",
    responses((status = 200, description = "The patient's appointments, newest date first", body = AppointmentListView))
)]
pub(crate) async fn appointments(
    State(state): State<AppState>,
    session: SessionToken,
) -> Result<Json<AppointmentListView>, ApiError> {
    let patient = state.patient(&session).await?;
    let appointments = state
        .store
        .read(|t| AppointmentView::list(t, &list_for_patient(t, patient.id)))?;

    Ok(Json(AppointmentListView {
        flashes: state.sessions.take_flashes(session.0).await,
        appointments,
    }))
}

#[utoipa::path(
    get,
    path = "/patient/appointment/cancel/{id}",
    params(("id" = u64, Path, description = "Appointment id")),
    responses(
        (status = 303, description = "Redirect to /patient/appointments with a flash"),
        (status = 404, description = "No such appointment")
    )
)]
pub(crate) async fn cancel(
    State(state): State<AppState>,
    session: SessionToken,
    Path(id): Path<u64>,
) -> Result<Response, ApiError> {
    let patient = state.patient(&session).await?;
    state
        .store
        .transaction(|uow| cancel_appointment(uow, AppointmentId(id), patient.id))
        .or_back(APPOINTMENTS_PAGE)?;
    Ok(see_other(
        APPOINTMENTS_PAGE,
        Flash::success("Appointment cancelled successfully"),
    ))
}

#[utoipa::path(
    get,
    path = "/patient/history",
    responses((status = 200, description = "Completed appointments with their treatments", body = AppointmentListView))
)]
pub(crate) async fn history(
    State(state): State<AppState>,
    session: SessionToken,
) -> Result<Json<AppointmentListView>, ApiError> {
    let patient = state.patient(&session).await?;
    let appointments = state
        .store
        .read(|t| AppointmentView::list(t, &list_history_for_patient(t, patient.id)))?;

    Ok(Json(AppointmentListView {
        flashes: state.sessions.take_flashes(session.0).await,
        appointments,
    }))
}

#[utoipa::path(
    get,
    path = "/patient/profile",
    responses((status = 200, description = "The patient's own profile", body = ProfileView))
)]
pub(crate) async fn profile(
    State(state): State<AppState>,
    session: SessionToken,
) -> Result<Json<ProfileView>, ApiError> {
    let patient = state.patient(&session).await?;
    Ok(Json(ProfileView {
        flashes: state.sessions.take_flashes(session.0).await,
        patient: PatientView::from(&patient),
    }))
}

#[utoipa::path(
    post,
    path = "/patient/profile",
    request_body(content = ProfileForm, content_type = "application/x-www-form-urlencoded"),
    responses((status = 303, description = "Redirect to /patient/profile with a flash"))
)]
/// Updates the logged-in patient's own profile. A blank `password` keeps the current one.
pub(crate) async fn update_profile(
    State(state): State<AppState>,
    session: SessionToken,
    Form(form): Form<ProfileForm>,
) -> Result<Response, ApiError> {
    let patient = state.patient(&session).await?;
    let (update, password) = form.to_update().or_back(PROFILE_PAGE)?;
    state
        .store
        .transaction(|uow| apply_profile(uow, patient.id, update, password))
        .or_back(PROFILE_PAGE)?;
    Ok(see_other(
        PROFILE_PAGE,
        Flash::success("Profile updated successfully"),
    ))
}
