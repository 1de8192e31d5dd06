//! The seam between the bridge and whatever runs the core.

use async_trait::async_trait;

/// Failures below the envelope protocol
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Response is not a result envelope
    #[error("response is not a result envelope: {0}")]
    Unparsed(String),
    /// No response within the bridge timeout
    #[error("timed out waiting for the core")]
    TimedOut,
    /// Envelope was fine but its payload does not fit the method
    #[error("unexpected payload: {0}")]
    UnexpectedPayload(String),
    /// The channel to the core failed
    #[error("transport failure: {0}")]
    Io(String),
}

/// Carries one serialized method call to the core and its envelope back.
///
/// Implementations may be called concurrently.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` (a method call as JSON) and return the raw envelope
    async fn call(&self, request: &str) -> Result<String, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn call(&self, request: &str) -> Result<String, TransportError> {
        (**self).call(request).await
    }
}
