//! # Portal Event System
//!
//! Publish/subscribe registry shared by the portal's request handlers, its
//! cron runner and its plugin modules.
//!
//! ## Model
//!
//! - An **event identifier** is a plain string such as `"auth.login.success"`.
//!   Identifiers are not validated against a closed set.
//! - A **listener** is a closure `Fn(T) -> Result<(), EventError>` registered
//!   against one identifier. Listeners are append-only.
//! - **Firing** an identifier runs its listeners sequentially, in
//!   registration order, and returns once the last one returned.
//!
//! A listener that fails or panics is logged and counted in
//! [`EventSystemStats`], and dispatch moves on to the next listener.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use portal_event_system::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let events = create_portal_event_system();
//!
//!     events.on(AUTH_LOGIN_SUCCESS, |event: LoginSuccessEvent| {
//!         println!("welcome back {}", event.login);
//!         Ok(())
//!     }).await?;
//!
//!     events.emit(AUTH_LOGIN_SUCCESS, &LoginSuccessEvent {
//!         login: "ada".to_string(),
//!         email: None,
//!         timestamp: current_timestamp(),
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod events;
pub mod plugin;
pub mod system;
pub mod types;

pub use events::{panic_message, Event, EventError, EventHandler, TypedEventHandler};
pub use plugin::{PluginError, SimplePlugin};
pub use system::{EventSystem, EventSystemStats};
pub use types::*;

pub use async_trait::async_trait;

use std::sync::Arc;

/// Returns the current Unix timestamp in seconds.
///
/// A clock set before the epoch yields `0` rather than panicking.
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Creates a new registry ready to be shared with plugins and handlers.
pub fn create_portal_event_system() -> Arc<EventSystem> {
    Arc::new(EventSystem::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::sync::Mutex;

    #[derive(Debug, Serialize, Deserialize)]
    struct TestEvent {
        message: String,
    }

    fn test_event(message: &str) -> TestEvent {
        TestEvent {
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_listeners_run_in_registration_order() {
        let events = create_portal_event_system();
        let calls = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let calls = calls.clone();
            events
                .on("test.ordered", move |event: TestEvent| {
                    calls.lock().unwrap().push(format!("{}:{}", label, event.message));
                    Ok(())
                })
                .await
                .expect("Failed to register handler");
        }

        events
            .emit("test.ordered", &test_event("ping"))
            .await
            .expect("Failed to emit event");

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["first:ping", "second:ping", "third:ping"]
        );
    }

    #[tokio::test]
    async fn test_emit_without_listeners_is_noop() {
        let events = create_portal_event_system();

        events
            .emit("nobody.listens", &test_event("hello"))
            .await
            .expect("Emitting to an unknown identifier must succeed");

        let stats = events.get_stats().await;
        assert_eq!(stats.total_handlers, 0);
        assert_eq!(stats.events_emitted, 0);
        assert_eq!(stats.handler_failures, 0);
    }

    #[tokio::test]
    async fn test_duplicate_registration_fires_twice() {
        let events = create_portal_event_system();
        let counter = Arc::new(Mutex::new(0u32));

        let handler = {
            let counter = counter.clone();
            move |_: TestEvent| {
                *counter.lock().unwrap() += 1;
                Ok(())
            }
        };

        events.on("test.dup", handler.clone()).await.unwrap();
        events.on("test.dup", handler).await.unwrap();
        events.emit("test.dup", &test_event("x")).await.unwrap();

        assert_eq!(*counter.lock().unwrap(), 2);
        assert_eq!(events.listener_count("test.dup"), 2);
    }

    #[tokio::test]
    async fn test_failing_listener_does_not_stop_dispatch() {
        let events = create_portal_event_system();
        let reached = Arc::new(Mutex::new(Vec::new()));

        {
            let reached = reached.clone();
            events
                .on("test.isolation", move |_: TestEvent| {
                    reached.lock().unwrap().push("before");
                    Ok(())
                })
                .await
                .unwrap();
        }
        events
            .on("test.isolation", |_: TestEvent| {
                Err(EventError::HandlerExecution("webhook unreachable".to_string()))
            })
            .await
            .unwrap();
        events
            .on("test.isolation", |_: TestEvent| -> Result<(), EventError> {
                panic!("listener bug")
            })
            .await
            .unwrap();
        {
            let reached = reached.clone();
            events
                .on("test.isolation", move |_: TestEvent| {
                    reached.lock().unwrap().push("after");
                    Ok(())
                })
                .await
                .unwrap();
        }

        events
            .emit("test.isolation", &test_event("go"))
            .await
            .expect("Listener failures must not fail the emit");

        assert_eq!(*reached.lock().unwrap(), vec!["before", "after"]);

        let stats = events.get_stats().await;
        assert_eq!(stats.events_emitted, 1);
        assert_eq!(stats.events_handled, 2);
        assert_eq!(stats.handler_failures, 2);
    }

    #[tokio::test]
    async fn test_empty_identifier_rejected() {
        let events = create_portal_event_system();

        let result = events.on("", |_: TestEvent| Ok(())).await;
        assert!(matches!(result, Err(EventError::InvalidEventId(_))));

        let result = events.on("   ", |_: TestEvent| Ok(())).await;
        assert!(matches!(result, Err(EventError::InvalidEventId(_))));
        assert!(events.registered_events().is_empty());
    }

    #[tokio::test]
    async fn test_mismatched_payload_counts_as_failure() {
        let events = create_portal_event_system();

        events
            .on(AUTH_LOGIN_SUCCESS, |_: LoginSuccessEvent| Ok(()))
            .await
            .unwrap();

        events
            .emit(AUTH_LOGIN_SUCCESS, &test_event("not a login"))
            .await
            .unwrap();

        let stats = events.get_stats().await;
        assert_eq!(stats.handler_failures, 1);
        assert_eq!(stats.events_handled, 0);
    }

    #[tokio::test]
    async fn test_registered_events_sorted() {
        let events = create_portal_event_system();
        events.on(AUTH_LOGIN_SUCCESS, |_: serde_json::Value| Ok(())).await.unwrap();
        events.on(APP_LOAD, |_: serde_json::Value| Ok(())).await.unwrap();
        events.on(AUTH_LOGIN_FAILED, |_: serde_json::Value| Ok(())).await.unwrap();

        assert_eq!(
            events.registered_events(),
            vec![APP_LOAD, AUTH_LOGIN_FAILED, AUTH_LOGIN_SUCCESS]
        );
        assert_eq!(events.get_stats().await.total_handlers, 3);
    }

    #[tokio::test]
    async fn test_merge_then_retract_staged_listeners() {
        let events = create_portal_event_system();
        let calls = Arc::new(Mutex::new(Vec::new()));

        {
            let calls = calls.clone();
            events
                .on(APP_LOAD, move |_: serde_json::Value| {
                    calls.lock().unwrap().push("shared");
                    Ok(())
                })
                .await
                .unwrap();
        }

        let staged = EventSystem::new();
        {
            let calls = calls.clone();
            staged
                .on(APP_LOAD, move |_: serde_json::Value| {
                    calls.lock().unwrap().push("staged");
                    Ok(())
                })
                .await
                .unwrap();
        }
        staged.on(CRON_HEARTBEAT, |_: serde_json::Value| Ok(())).await.unwrap();

        assert_eq!(events.merge(&staged).await, 2);
        assert_eq!(events.listener_count(APP_LOAD), 2);
        assert_eq!(events.get_stats().await.total_handlers, 3);

        events.emit(APP_LOAD, &serde_json::json!({})).await.unwrap();
        assert_eq!(*calls.lock().unwrap(), vec!["shared", "staged"]);

        assert_eq!(events.retract(&staged).await, 2);
        assert_eq!(events.registered_events(), vec![APP_LOAD]);
        assert_eq!(events.get_stats().await.total_handlers, 1);

        calls.lock().unwrap().clear();
        events.emit(APP_LOAD, &serde_json::json!({})).await.unwrap();
        assert_eq!(*calls.lock().unwrap(), vec!["shared"]);
    }
}
