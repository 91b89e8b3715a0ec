use std::pin::Pin;
use std::sync::Arc;

use tracing::Instrument;
use verdant_model::{
    ModelProvider, ModelProviderError, ModelReply, ModelRequest,
};

type SendRequestResult = Result<ModelReply, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn =
    Arc<dyn Fn(ModelRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// A wrapper around a model provider that provides a type-erased
/// interface for the other modules.
///
/// Cloning the client is cheap and all clones share one provider.
#[derive(Clone)]
pub struct ConversationClient {
    handler_fn: HandlerFn,
}

impl ConversationClient {
    /// Creates a client backed by the given provider.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ConversationClient`
        // doesn't have a generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request with {} messages", req.messages.len());
                    match fut.await {
                        Ok(reply) => {
                            trace!("finished a request");
                            Ok(reply)
                        }
                        Err(err) => {
                            error!("got an error: {err}");
                            Err(Box::new(err) as Box<dyn ModelProviderError>)
                        }
                    }
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and returns the reply.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The underlying request is dropped
    /// when this operation is cancelled.
    #[inline]
    pub async fn send_request(&self, req: ModelRequest) -> SendRequestResult {
        (self.handler_fn)(req).await
    }
}

#[cfg(test)]
mod tests {
    use verdant_model::ModelMessage;
    use verdant_test_model::{PresetReply, TestModelProvider};

    use super::*;

    #[tokio::test]
    async fn test_send_request() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_user_turn_step();
        model_provider
            .add_assistant_reply_step(PresetReply::with_text("How are you?"));

        let client = ConversationClient::new(model_provider);

        for _ in 0..3 {
            let reply = client
                .send_request(ModelRequest {
                    messages: vec![ModelMessage::user("Hi")],
                })
                .await
                .unwrap();
            assert_eq!(reply.text, "How are you?");
        }
    }

    #[tokio::test]
    async fn test_error_handling() {
        let model_provider = TestModelProvider::default();
        let client = ConversationClient::new(model_provider);
        let reply_or_err = client
            .send_request(ModelRequest {
                messages: vec![ModelMessage::user("Hi")],
            })
            .await;
        assert!(reply_or_err.is_err());
    }
}
