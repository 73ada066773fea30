//! Event payload and handler abstractions.
//!
//! Payloads cross the registry as JSON bytes: the emitter serializes once and
//! every listener decodes its own copy into the type its closure asks for.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Payload carried by a fired event.
///
/// Every `Serialize + DeserializeOwned + Debug` type gets this for free through
/// the blanket implementation below, so defining a new payload is a derive:
///
/// ```rust
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct PasswordChanged {
///     login: String,
/// }
/// ```
pub trait Event: Send + Sync + Any + std::fmt::Debug {
    /// Stable type name used in handler names and logs.
    fn type_name() -> &'static str
    where
        Self: Sized;

    /// Serializes the payload for delivery.
    fn serialize(&self) -> Result<Vec<u8>, EventError>;

    /// Decodes a payload delivered by the registry.
    fn deserialize(data: &[u8]) -> Result<Self, EventError>
    where
        Self: Sized;
}

impl<T> Event for T
where
    T: Serialize + DeserializeOwned + Send + Sync + Any + std::fmt::Debug + 'static,
{
    fn type_name() -> &'static str {
        std::any::type_name::<T>()
    }

    fn serialize(&self) -> Result<Vec<u8>, EventError> {
        serde_json::to_vec(self).map_err(EventError::Serialization)
    }

    fn deserialize(data: &[u8]) -> Result<Self, EventError> {
        serde_json::from_slice(data).map_err(EventError::Deserialization)
    }
}

/// Type-erased listener stored by the registry.
///
/// Most code never implements this directly; `EventSystem::on` wraps plain
/// closures in a [`TypedEventHandler`].
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handles one delivery of serialized payload bytes.
    async fn handle(&self, data: &[u8]) -> Result<(), EventError>;

    /// Human-readable name for logs.
    fn handler_name(&self) -> &str;
}

/// Bridges a typed closure to [`EventHandler`].
///
/// Panics raised by the closure are caught and reported as
/// [`EventError::HandlerPanicked`] so the registry can keep dispatching.
pub struct TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    handler: F,
    name: String,
    _phantom: std::marker::PhantomData<T>,
}

impl<T, F> TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    pub fn new(name: String, handler: F) -> Self {
        Self {
            handler,
            name,
            _phantom: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<T, F> EventHandler for TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    async fn handle(&self, data: &[u8]) -> Result<(), EventError> {
        let event = T::deserialize(data)?;
        match catch_unwind(AssertUnwindSafe(|| (self.handler)(event))) {
            Ok(result) => result,
            Err(panic_info) => Err(EventError::HandlerPanicked(panic_message(panic_info))),
        }
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}

/// Extracts a readable message from a panic payload.
pub fn panic_message(panic_info: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Errors raised by the event registry and by listeners.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// Payload could not be serialized for delivery
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),
    /// Delivered bytes did not decode into the listener's payload type
    #[error("Deserialization error: {0}")]
    Deserialization(#[source] serde_json::Error),
    /// Event identifiers must be non-empty
    #[error("Invalid event identifier: {0:?}")]
    InvalidEventId(String),
    /// A listener reported a failure
    #[error("Handler execution error: {0}")]
    HandlerExecution(String),
    /// A listener panicked while handling an event
    #[error("Handler panicked: {0}")]
    HandlerPanicked(String),
}
