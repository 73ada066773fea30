//! # Portal HTTP
//!
//! The portal's HTTP routes. Handlers validate input, delegate to an
//! [`Authenticator`] and fire the auth lifecycle events on the shared
//! [`EventSystem`](portal_event_system::EventSystem).

pub mod auth;
pub mod login;

pub use auth::{Account, AuthError, Authenticator, LoginResult, MemoryAuthenticator};
pub use login::{LoginForm, LoginState};

use axum::routing::post;
use axum::Router;

pub const LOGIN_PATH: &str = "/api/auth/login";

/// Builds the application router.
pub fn router(state: LoginState) -> Router {
    Router::new()
        .route(
            LOGIN_PATH,
            post(login::login).fallback(login::method_not_allowed),
        )
        .with_state(state)
}
