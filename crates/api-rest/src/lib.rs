//! # API REST
//!
//! HTTP surface of the hospital management service.
//!
//! Handles:
//! - routing with axum and the OpenAPI document
//! - cookie sessions and flash messages
//! - form decoding and role gating before dispatching into `hms-core`
//!
//! Mutating endpoints accept `application/x-www-form-urlencoded` and answer `303 See Other`.
//! View endpoints answer JSON including the flash messages queued for the visitor.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod forms;
mod routes;
pub mod views;


use api_shared::session::{session_cookie, token_from_cookie_header};
use api_shared::{HealthRes, SessionStore};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::{self, Next},
    response::{Json, Response},
    routing::get,
    Router,
};
use error::PendingFlash;
use hms_core::access::require_role;
use hms_core::identity::resolve_principal;
use hms_core::{HospitalError, HospitalResult, Principal, Role, Store};
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use uuid::Uuid;

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            sessions: SessionStore::new(),
        }
    }

    /// Re-loads the logged-in principal from its own table.
    pub async fn principal(&self, session: &SessionToken) -> HospitalResult<Principal> {
        let token = session.0.ok_or(HospitalError::Unauthorized)?;
        let reference = self
            .sessions
            .principal(token)
            .await
            .ok_or(HospitalError::Unauthorized)?;
        self.store.read(|t| resolve_principal(t, reference))?
    }

    /// The logged-in principal, provided its kind is `role`.
    pub async fn require(&self, session: &SessionToken, role: Role) -> HospitalResult<Principal> {
        require_role(self.principal(session).await?, role)
    }
}

/// The session token presented in the `hms_session` cookie, if any.
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionToken(pub Option<Uuid>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(token_from_cookie_header);
        Ok(Self(token))
    }
}

/// Moves a handler's [`PendingFlash`] into the visitor's session, issuing a session cookie when
/// the visitor had none.
async fn flash_layer(
    State(state): State<AppState>,
    session: SessionToken,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let Some(pending) = response.extensions_mut().remove::<PendingFlash>() else {
        return response;
    };

    if pending.end_session {
        if let Some(token) = session.0 {
            state.sessions.forget_principal(token).await;
        }
    }
    if let Some(fresh) = state.sessions.push_flash(session.0, pending.flash).await {
        if let Ok(cookie) = HeaderValue::from_str(&session_cookie(fresh)) {
            response.headers_mut().append(header::SET_COOKIE, cookie);
        }
    }
    response
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        routes::auth::index,
        routes::auth::login_page,
        routes::auth::login,
        routes::auth::logout,
        routes::auth::register_page,
        routes::auth::register,
        routes::admin::dashboard,
        routes::admin::doctors,
        routes::admin::add_doctor,
        routes::admin::edit_doctor,
        routes::admin::delete_doctor,
        routes::admin::patients,
        routes::admin::edit_patient,
        routes::admin::delete_patient,
        routes::admin::appointments,
        routes::doctor::dashboard,
        routes::doctor::appointments,
        routes::doctor::complete_appointment,
        routes::doctor::availability,
        routes::doctor::add_availability,
        routes::doctor::patients,
        routes::doctor::patient_history,
        routes::patient::dashboard,
        routes::patient::doctors,
        routes::patient::book,
        routes::patient::appointments,
        routes::patient::cancel,
        routes::patient::history,
        routes::patient::profile,
        routes::patient::update_profile,
    ),
    components(schemas(
        HealthRes,
        api_shared::Flash,
        api_shared::Severity,
        forms::LoginForm,
        forms::RegisterForm,
        forms::DoctorForm,
        forms::PatientEditForm,
        forms::CompleteForm,
        forms::AvailabilityForm,
        forms::BookingForm,
        forms::ProfileForm,
        views::DepartmentView,
        views::DoctorView,
        views::PatientView,
        views::TreatmentView,
        views::AppointmentView,
        views::AvailabilityView,
        views::LoginView,
        views::AdminDashboardView,
        views::DoctorListView,
        views::PatientListView,
        views::AppointmentListView,
        views::DoctorDashboardView,
        views::AvailabilityListView,
        views::PatientHistoryView,
        views::PatientDashboardView,
        views::DoctorSearchView,
        views::ProfileView,
    ))
)]
pub struct ApiDoc;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint, used for monitoring and load balancer checks.
async fn health() -> Json<HealthRes> {
    Json(api_shared::HealthService::check_health())
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Builds the full router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi))
        .merge(routes::auth::router())
        .merge(routes::admin::router())
        .merge(routes::doctor::router())
        .merge(routes::patient::router())
        .layer(middleware::from_fn_with_state(state.clone(), flash_layer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `addr` and serves the router until the process stops.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails while running.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("++ Serving HMS REST on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
