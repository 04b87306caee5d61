//! Mapping of core errors onto HTTP responses.
//!
//! Failed actions answer `303 See Other` and carry a [`PendingFlash`] in the response
//! extensions; the flash layer in `lib.rs` moves it into the visitor's session. Only missing
//! records and internal failures produce an error status.

use api_shared::Flash;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use hms_core::{HospitalError, HospitalResult};
use serde_json::json;

/// Flash queued by a handler, consumed by the flash layer.
#[derive(Clone, Debug)]
pub struct PendingFlash {
    pub flash: Flash,
    /// Drop the login from the session before queuing the flash.
    pub end_session: bool,
}

/// `303 See Other` to `to`, queuing `flash`.
pub fn see_other(to: &str, flash: Flash) -> Response {
    redirect(to, Some(PendingFlash {
        flash,
        end_session: false,
    }))
}

pub(crate) fn redirect(to: &str, pending: Option<PendingFlash>) -> Response {
    let mut response = StatusCode::SEE_OTHER.into_response();
    if let Ok(location) = HeaderValue::from_str(to) {
        response.headers_mut().insert(header::LOCATION, location);
    }
    if let Some(pending) = pending {
        response.extensions_mut().insert(pending);
    }
    response
}

/// A failed request together with the page the action belongs to.
#[derive(Debug)]
pub struct ApiError {
    pub error: HospitalError,
    pub back: &'static str,
}

impl From<HospitalError> for ApiError {
    fn from(error: HospitalError) -> Self {
        Self { error, back: "/" }
    }
}

/// Attaches the page a failed action returns to.
pub trait OrBack<T> {
    fn or_back(self, back: &'static str) -> Result<T, ApiError>;
}

impl<T> OrBack<T> for HospitalResult<T> {
    fn or_back(self, back: &'static str) -> Result<T, ApiError> {
        self.map_err(|error| ApiError { error, back })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let login = |message: &str, end_session: bool| {
            redirect(
                "/login",
                Some(PendingFlash {
                    flash: Flash::danger(message),
                    end_session,
                }),
            )
        };

        match self.error {
            HospitalError::Unauthorized => login("Unauthorized access", false),
            HospitalError::InvalidCredentials => login("Invalid credentials", false),
            HospitalError::Deactivated => login("Your account has been deactivated", true),
            HospitalError::Forbidden { .. } => see_other(self.back, Flash::danger("Unauthorized")),
            HospitalError::Conflict(reason) => see_other(self.back, Flash::danger(reason.to_string())),
            HospitalError::Validation(message) => see_other(self.back, Flash::danger(message)),
            err @ HospitalError::NotFound { .. } => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": err.to_string() }))).into_response()
            }
            err => {
                tracing::error!("Request failed: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hms_core::ConflictReason;

    fn pending(response: &Response) -> &PendingFlash {
        response
            .extensions()
            .get::<PendingFlash>()
            .expect("response should carry a flash")
    }

    #[test]
    fn test_conflict_redirects_back_with_reason() {
        let response = Err::<(), _>(HospitalError::Conflict(ConflictReason::SlotTaken))
            .or_back("/patient/doctors")
            .unwrap_err()
            .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/patient/doctors");
        assert_eq!(pending(&response).flash.message, "This time slot is already booked");
    }

    #[test]
    fn test_deactivated_goes_to_login_and_ends_session() {
        let response = ApiError::from(HospitalError::Deactivated).into_response();
        assert_eq!(response.headers()[header::LOCATION], "/login");
        assert!(pending(&response).end_session);
    }

    #[test]
    fn test_not_found_and_internal_are_statuses() {
        let response = ApiError::from(HospitalError::NotFound {
            entity: "appointment",
            id: 9,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError::from(HospitalError::StorePoisoned).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
