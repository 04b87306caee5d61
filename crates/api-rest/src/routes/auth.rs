use super::dashboard_path;
use crate::error::{redirect, see_other, ApiError, OrBack};
use crate::forms::{LoginForm, RegisterForm};
use crate::views::LoginView;
use crate::{AppState, SessionToken};
use api_shared::session::session_cookie;
use api_shared::Flash;
use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{Json, Response},
    routing::get,
    Form, Router,
};
use hms_core::identity::{authenticate, register_patient};
use hms_core::Role;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
        .route("/register", get(register_page).post(register))
}

#[utoipa::path(
    get,
    path = "/",
    responses((status = 303, description = "Redirect to the role dashboard, or to /login"))
)]
pub(crate) async fn index(State(state): State<AppState>, session: SessionToken) -> Response {
    match state.principal(&session).await {
        Ok(principal) => redirect(dashboard_path(principal.role()), None),
        Err(_) => redirect("/login", None),
    }
}

async fn form_view(state: &AppState, session: SessionToken) -> Json<LoginView> {
    Json(LoginView {
        flashes: state.sessions.take_flashes(session.0).await,
        user_types: vec![Role::Admin, Role::Doctor, Role::Patient],
    })
}

#[utoipa::path(
    get,
    path = "/login",
    responses((status = 200, description = "Login view", body = LoginView))
)]
pub(crate) async fn login_page(
    State(state): State<AppState>,
    session: SessionToken,
) -> Json<LoginView> {
    form_view(&state, session).await
}

#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to the role dashboard, or back to /login with a flash")
    )
)]
/// Authenticates against the table named by `user_type` and starts a fresh session.
pub(crate) async fn login(
    State(state): State<AppState>,
    session: SessionToken,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    let role: Role = form.user_type.parse().or_back("/login")?;
    let principal = state
        .store
        .read(|t| authenticate(t, &form.username, &form.password, role))
        .and_then(|result| result)
        .or_back("/login")?;

    let token = state
        .sessions
        .login(session.0, principal.reference())
        .await;
    state
        .sessions
        .push_flash(Some(token), Flash::success("Login successful!"))
        .await;
    tracing::info!("{role} {} logged in", principal.display_name());

    let mut response = redirect(dashboard_path(role), None);
    if let Ok(cookie) = HeaderValue::from_str(&session_cookie(token)) {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

#[utoipa::path(
    get,
    path = "/logout",
    responses((status = 303, description = "Session destroyed; redirect to /login"))
)]
pub(crate) async fn logout(State(state): State<AppState>, session: SessionToken) -> Response {
    if let Some(token) = session.0 {
        state.sessions.logout(token).await;
    }
    see_other("/login", Flash::success("Logged out successfully"))
}

#[utoipa::path(
    get,
    path = "/register",
    responses((status = 200, description = "Registration view", body = LoginView))
)]
pub(crate) async fn register_page(
    State(state): State<AppState>,
    session: SessionToken,
) -> Json<LoginView> {
    form_view(&state, session).await
}

#[utoipa::path(
    post,
    path = "/register",
    request_body(content = RegisterForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to /login, or back to /register with a flash")
    )
)]
pub(crate) async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, ApiError> {
    let (new, password) = form.into_new_patient().or_back("/register")?;
    state
        .store
        .transaction(|uow| register_patient(uow, new, &password))
        .or_back("/register")?;
    Ok(see_other(
        "/login",
        Flash::success("Registration successful! Please login"),
    ))
}
