//! `POST /api/auth/login`.

use crate::auth::{AuthError, Authenticator, LoginResult};
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use portal_event_system::{
    current_timestamp, Event, EventSystem, LoginFailedEvent, LoginSuccessEvent,
    AUTH_LOGIN_FAILED, AUTH_LOGIN_SUCCESS,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const MISSING_AUTH: &str = "Please provide an auth type (email/username)";
pub const MISSING_PASSWORD: &str = "Please provide a password!";
pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";
pub const SERVICE_UNAVAILABLE: &str = "Login is temporarily unavailable, please try again later";

#[derive(Clone)]
pub struct LoginState {
    pub events: Arc<EventSystem>,
    pub authenticator: Arc<dyn Authenticator>,
}

impl LoginState {
    pub fn new(events: Arc<EventSystem>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            events,
            authenticator,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub auth: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct SuccessBody {
    status: &'static str,
    #[serde(flatten)]
    result: LoginResult,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            status: "error",
            message,
        }),
    )
        .into_response()
}

pub async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED)
}

/// Validates the form, delegates to the authenticator and fires the auth
/// lifecycle events. Missing fields are rejected before the authenticator is
/// consulted, and do not fire `auth.login.failed`.
pub async fn login(
    State(state): State<LoginState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            debug!("Unreadable login form: {}", rejection);
            LoginForm::default()
        }
    };

    let Some(auth) = non_blank(form.auth) else {
        return error_response(StatusCode::UNAUTHORIZED, MISSING_AUTH);
    };
    let Some(password) = non_blank(form.password) else {
        return error_response(StatusCode::UNAUTHORIZED, MISSING_PASSWORD);
    };

    match state.authenticator.authenticate(&auth, &password).await {
        Ok(result) => {
            info!("🔑 {} logged in", result.login);
            fire(
                &state.events,
                AUTH_LOGIN_SUCCESS,
                &LoginSuccessEvent {
                    login: result.login.clone(),
                    email: result.email.clone(),
                    timestamp: current_timestamp(),
                },
            )
            .await;

            (
                StatusCode::OK,
                Json(SuccessBody {
                    status: "success",
                    result,
                }),
            )
                .into_response()
        }
        Err(e) => {
            let reason = e.to_string();
            match e {
                AuthError::Unavailable(_) => error!("Login for {} not checked: {}", auth, reason),
                _ => info!("Login rejected for {}: {}", auth, reason),
            }
            fire(
                &state.events,
                AUTH_LOGIN_FAILED,
                &LoginFailedEvent {
                    auth,
                    reason: reason.clone(),
                    timestamp: current_timestamp(),
                },
            )
            .await;

            match e {
                AuthError::Unavailable(_) => {
                    error_response(StatusCode::SERVICE_UNAVAILABLE, SERVICE_UNAVAILABLE)
                }
                AuthError::InvalidCredentials | AuthError::AccountDisabled(_) => {
                    error_response(StatusCode::UNAUTHORIZED, &reason)
                }
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn fire<T: Event>(events: &EventSystem, event_id: &str, event: &T) {
    if let Err(e) = events.emit(event_id, event).await {
        warn!("Failed to emit {}: {}", event_id, e);
    }
}
