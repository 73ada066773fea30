//! Drives the login route through the router without binding a socket.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use portal_event_system::{
    create_portal_event_system, EventSystem, LoginFailedEvent, LoginSuccessEvent,
    AUTH_LOGIN_FAILED, AUTH_LOGIN_SUCCESS,
};
use portal_http::{
    router, Account, AuthError, Authenticator, LoginResult, LoginState, MemoryAuthenticator,
    LOGIN_PATH,
};
use portal_http::login::SERVICE_UNAVAILABLE;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

fn accounts() -> MemoryAuthenticator {
    MemoryAuthenticator::new(vec![Account {
        login: "alice".to_string(),
        email: Some("alice@example.com".to_string()),
        password: "wonderland".to_string(),
        disabled: false,
    }])
}

fn create_app(events: Arc<EventSystem>) -> Router {
    router(LoginState::new(events, Arc::new(accounts())))
}

fn form_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(LOGIN_PATH)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_to_json(body: Body) -> serde_json::Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_get_is_method_not_allowed() {
    let app = create_app(create_portal_event_system());

    let request = Request::builder()
        .method("GET")
        .uri(LOGIN_PATH)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let body = body_to_json(response.into_body()).await;
    assert_eq!(
        body,
        serde_json::json!({"status": "error", "message": "Method not allowed"})
    );
}

#[tokio::test]
async fn test_missing_auth() {
    let app = create_app(create_portal_event_system());

    let response = app.oneshot(form_request("password=x")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["status"], "error");
    assert_eq!(
        body["message"],
        "Please provide an auth type (email/username)"
    );
}

#[tokio::test]
async fn test_empty_auth_counts_as_missing() {
    let app = create_app(create_portal_event_system());

    let response = app.oneshot(form_request("auth=&password=x")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_to_json(response.into_body()).await;
    assert_eq!(
        body["message"],
        "Please provide an auth type (email/username)"
    );
}

#[tokio::test]
async fn test_missing_password() {
    let app = create_app(create_portal_event_system());

    let response = app.oneshot(form_request("auth=alice")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["message"], "Please provide a password!");
}

#[tokio::test]
async fn test_non_form_body_is_treated_as_empty() {
    let app = create_app(create_portal_event_system());

    let request = Request::builder()
        .method("POST")
        .uri(LOGIN_PATH)
        .header("content-type", "application/json")
        .body(Body::from(r#"{"auth":"alice","password":"wonderland"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_to_json(response.into_body()).await;
    assert_eq!(
        body["message"],
        "Please provide an auth type (email/username)"
    );
}

#[tokio::test]
async fn test_validation_errors_fire_no_events() {
    let events = create_portal_event_system();
    let fired = Arc::new(Mutex::new(0));

    let counter = Arc::clone(&fired);
    events
        .on(AUTH_LOGIN_FAILED, move |_: LoginFailedEvent| {
            *counter.lock().unwrap() += 1;
            Ok(())
        })
        .await
        .unwrap();

    let app = create_app(Arc::clone(&events));
    app.oneshot(form_request("auth=alice")).await.unwrap();

    assert_eq!(*fired.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_successful_login_fires_success_event() {
    let events = create_portal_event_system();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    events
        .on(AUTH_LOGIN_SUCCESS, move |event: LoginSuccessEvent| {
            sink.lock().unwrap().push(event.login);
            Ok(())
        })
        .await
        .unwrap();

    let app = create_app(Arc::clone(&events));
    let response = app
        .oneshot(form_request("auth=alice%40example.com&password=wonderland"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["login"], "alice");
    assert_eq!(body["email"], "alice@example.com");

    assert_eq!(*seen.lock().unwrap(), vec!["alice"]);
}

#[tokio::test]
async fn test_rejected_login_fires_failed_event() {
    let events = create_portal_event_system();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    events
        .on(AUTH_LOGIN_FAILED, move |event: LoginFailedEvent| {
            sink.lock().unwrap().push((event.auth, event.reason));
            Ok(())
        })
        .await
        .unwrap();

    let app = create_app(Arc::clone(&events));
    let response = app
        .oneshot(form_request("auth=alice&password=wrong"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Wrong login or password");

    assert_eq!(
        *seen.lock().unwrap(),
        vec![("alice".to_string(), "Wrong login or password".to_string())]
    );
}

struct OfflineAuthenticator;

#[portal_event_system::async_trait]
impl Authenticator for OfflineAuthenticator {
    async fn authenticate(&self, _auth: &str, _password: &str) -> Result<LoginResult, AuthError> {
        Err(AuthError::Unavailable("directory offline".to_string()))
    }
}

#[tokio::test]
async fn test_unavailable_backend() {
    let app = router(LoginState::new(
        create_portal_event_system(),
        Arc::new(OfflineAuthenticator),
    ));

    let response = app
        .oneshot(form_request("auth=alice&password=wonderland"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], SERVICE_UNAVAILABLE);
    assert!(!body.to_string().contains("directory offline"));
}
