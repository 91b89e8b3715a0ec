use std::error::Error;

use crate::error::ErrorKind;
use crate::reply::ModelReply;
use crate::request::ModelRequest;

/// The error type for a model provider.
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a model provider, which is an entry for
/// exchanging conversation turns with a hosted model.
///
/// Once the provider is created, it should behave like a stateless
/// object: the full conversation context travels in each request, and
/// the provider should be prepared for being dropped anytime. Any
/// state a provider keeps internally (connection pools, etc.) must not
/// be observable by callers.
pub trait ModelProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// Sends a request to the model and resolves to its reply.
    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelReply, Self::Error>> + Send + 'static;
}
