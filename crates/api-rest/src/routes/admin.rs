use crate::error::{see_other, ApiError, OrBack};
use crate::forms::{DoctorForm, PatientEditForm, SearchQuery};
use crate::views::{
    AdminDashboardView, AppointmentListView, AppointmentView, DepartmentView, DoctorListView,
    DoctorView, PatientListView, PatientView,
};
use crate::{AppState, SessionToken};
use api_shared::Flash;
use axum::{
    extract::{Path, Query, State},
    response::{Json, Response},
    routing::{get, post},
    Form, Router,
};
use hms_core::appointments::list_all;
use hms_core::dashboard::admin_dashboard;
use hms_core::directory::{list_departments, search_doctors, search_patients};
use hms_core::identity;
use hms_core::ids::{DoctorId, PatientId};
use hms_core::Role;

const DOCTORS_PAGE: &str = "/admin/doctors";
const PATIENTS_PAGE: &str = "/admin/patients";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/dashboard", get(dashboard))
        .route("/admin/doctors", get(doctors))
        .route("/admin/doctor/add", post(add_doctor))
        .route("/admin/doctor/edit/:id", post(edit_doctor))
        .route("/admin/doctor/delete/:id", get(delete_doctor))
        .route("/admin/patients", get(patients))
        .route("/admin/patient/edit/:id", post(edit_patient))
        .route("/admin/patient/delete/:id", get(delete_patient))
        .route("/admin/appointments", get(appointments))
}

#[utoipa::path(
    get,
    path = "/admin/dashboard",
    responses(
        (status = 200, description = "Admin dashboard", body = AdminDashboardView),
        (status = 303, description = "Not logged in as an administrator")
    )
)]
pub(crate) async fn dashboard(
    State(state): State<AppState>,
    session: SessionToken,
) -> Result<Json<AdminDashboardView>, ApiError> {
    state.require(&session, Role::Admin).await?;
    let (summary, recent) = state.store.read(|t| {
        let summary = admin_dashboard(t);
        let recent = AppointmentView::list(t, &summary.recent_appointments);
        (summary, recent)
    })?;

    Ok(Json(AdminDashboardView {
        flashes: state.sessions.take_flashes(session.0).await,
        total_doctors: summary.active_doctors,
        total_patients: summary.active_patients,
        total_appointments: summary.total_appointments,
        booked_appointments: summary.booked_appointments,
        recent_appointments: recent,
    }))
}

#[utoipa::path(
    get,
    path = "/admin/doctors",
    params(SearchQuery),
    responses((status = 200, description = "Doctors matching the search, with departments", body = DoctorListView))
)]
pub(crate) async fn doctors(
    State(state): State<AppState>,
    session: SessionToken,
    Query(query): Query<SearchQuery>,
) -> Result<Json<DoctorListView>, ApiError> {
    state.require(&session, Role::Admin).await?;
    let (doctors, departments) = state.store.read(|t| {
        let doctors: Vec<DoctorView> = search_doctors(t, Some(&query.search))
            .iter()
            .map(|d| DoctorView::new(t, d))
            .collect();
        let departments: Vec<DepartmentView> =
            list_departments(t).iter().map(DepartmentView::from).collect();
        (doctors, departments)
    })?;

    Ok(Json(DoctorListView {
        flashes: state.sessions.take_flashes(session.0).await,
        search: query.search,
        doctors,
        departments,
    }))
}

#[utoipa::path(
    post,
    path = "/admin/doctor/add",
    request_body(content = DoctorForm, content_type = "application/x-www-form-urlencoded"),
    responses((status = 303, description = "Redirect to /admin/doctors with a flash"))
)]
pub(crate) async fn add_doctor(
    State(state): State<AppState>,
    session: SessionToken,
    Form(form): Form<DoctorForm>,
) -> Result<Response, ApiError> {
    state.require(&session, Role::Admin).await?;
    let (new, password) = form.into_new_doctor().or_back(DOCTORS_PAGE)?;
    state
        .store
        .transaction(|uow| identity::add_doctor(uow, new, &password))
        .or_back(DOCTORS_PAGE)?;
    Ok(see_other(DOCTORS_PAGE, Flash::success("Doctor added successfully")))
}

#[utoipa::path(
    post,
    path = "/admin/doctor/edit/{id}",
    params(("id" = u64, Path, description = "Doctor id")),
    request_body(content = DoctorForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to /admin/doctors with a flash"),
        (status = 404, description = "No such doctor")
    )
)]
/// Updates a doctor. A blank `password` keeps the current one.
pub(crate) async fn edit_doctor(
    State(state): State<AppState>,
    session: SessionToken,
    Path(id): Path<u64>,
    Form(form): Form<DoctorForm>,
) -> Result<Response, ApiError> {
    state.require(&session, Role::Admin).await?;
    let (update, password) = form.to_update().or_back(DOCTORS_PAGE)?;
    state
        .store
        .transaction(|uow| identity::edit_doctor(uow, DoctorId(id), update, password))
        .or_back(DOCTORS_PAGE)?;
    Ok(see_other(DOCTORS_PAGE, Flash::success("Doctor updated successfully")))
}

#[utoipa::path(
    get,
    path = "/admin/doctor/delete/{id}",
    params(("id" = u64, Path, description = "Doctor id")),
    responses(
        (status = 303, description = "Doctor deactivated; redirect to /admin/doctors"),
        (status = 404, description = "No such doctor")
    )
)]
/// Deactivates a doctor. Records are kept; the doctor can no longer log in or be booked.
pub(crate) async fn delete_doctor(
    State(state): State<AppState>,
    session: SessionToken,
    Path(id): Path<u64>,
) -> Result<Response, ApiError> {
    state.require(&session, Role::Admin).await?;
    state
        .store
        .transaction(|uow| identity::deactivate_doctor(uow, DoctorId(id)))
        .or_back(DOCTORS_PAGE)?;
    Ok(see_other(DOCTORS_PAGE, Flash::success("Doctor deactivated successfully")))
}

#[utoipa::path(
    get,
    path = "/admin/patients",
    params(SearchQuery),
    responses((status = 200, description = "Patients matching the search", body = PatientListView))
)]
pub(crate) async fn patients(
    State(state): State<AppState>,
    session: SessionToken,
    Query(query): Query<SearchQuery>,
) -> Result<Json<PatientListView>, ApiError> {
    state.require(&session, Role::Admin).await?;
    let patients = state.store.read(|t| {
        search_patients(t, Some(&query.search))
            .iter()
            .map(PatientView::from)
            .collect::<Vec<_>>()
    })?;

    Ok(Json(PatientListView {
        flashes: state.sessions.take_flashes(session.0).await,
        search: query.search,
        patients,
    }))
}

#[utoipa::path(
    post,
    path = "/admin/patient/edit/{id}",
    params(("id" = u64, Path, description = "Patient id")),
    request_body(content = PatientEditForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to /admin/patients with a flash"),
        (status = 404, description = "No such patient")
    )
)]
pub(crate) async fn edit_patient(
    State(state): State<AppState>,
    session: SessionToken,
    Path(id): Path<u64>,
    Form(form): Form<PatientEditForm>,
) -> Result<Response, ApiError> {
    state.require(&session, Role::Admin).await?;
    let update = form.into_update().or_back(PATIENTS_PAGE)?;
    state
        .store
        .transaction(|uow| identity::edit_patient(uow, PatientId(id), update))
        .or_back(PATIENTS_PAGE)?;
    Ok(see_other(PATIENTS_PAGE, Flash::success("Patient updated successfully")))
}

#[utoipa::path(
    get,
    path = "/admin/patient/delete/{id}",
    params(("id" = u64, Path, description = "Patient id")),
    responses(
        (status = 303, description = "Patient deactivated; redirect to /admin/patients"),
        (status = 404, description = "No such patient")
    )
)]
pub(crate) async fn delete_patient(
    State(state): State<AppState>,
    session: SessionToken,
    Path(id): Path<u64>,
) -> Result<Response, ApiError> {
    state.require(&session, Role::Admin).await?;
    state
        .store
        .transaction(|uow| identity::deactivate_patient(uow, PatientId(id)))
        .or_back(PATIENTS_PAGE)?;
    Ok(see_other(PATIENTS_PAGE, Flash::success("Patient deactivated successfully")))
}

#[utoipa::path(
    get,
    path = "/admin/appointments",
    responses((status = 200, description = "Every appointment, newest date first", body = AppointmentListView))
)]
pub(crate) async fn appointments(
    State(state): State<AppState>,
    session: SessionToken,
) -> Result<Json<AppointmentListView>, ApiError> {
    state.require(&session, Role::Admin).await?;
    let appointments = state
        .store
        .read(|t| AppointmentView::list(t, &list_all(t)))?;

    Ok(Json(AppointmentListView {
        flashes: state.sessions.take_flashes(session.0).await,
        appointments,
    }))
}
