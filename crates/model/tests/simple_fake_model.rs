//! Verifies that the provider protocol can be implemented by a minimal
//! in-process model.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::time::Duration;

use tokio::time::sleep;
use verdant_model::{
    ErrorKind, ModelMessage, ModelProvider, ModelProviderError, ModelReply,
    ModelRequest,
};

#[derive(Debug)]
struct FakeModelProviderError(ErrorKind);

impl Display for FakeModelProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for FakeModelProviderError {}

impl ModelProviderError for FakeModelProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

struct FakeModelProvider;

impl ModelProvider for FakeModelProvider {
    type Error = FakeModelProviderError;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelReply, Self::Error>> + Send + 'static
    {
        let Some(last) = req.messages.last() else {
            return ready(Err(FakeModelProviderError(ErrorKind::Other)));
        };
        let reply = match last {
            ModelMessage::User { text, image } => {
                if image.is_some() {
                    format!("I looked at your photo. You said: {text}")
                } else {
                    format!("You said: {text}")
                }
            }
            ModelMessage::Assistant(_) => {
                return ready(Err(FakeModelProviderError(ErrorKind::Other)));
            }
        };
        ready(Ok(ModelReply::new(reply)))
    }
}

#[tokio::test]
async fn test_reply() {
    let provider = FakeModelProvider;
    let req = ModelRequest {
        messages: vec![ModelMessage::user("Good morning")],
    };
    let reply = provider.send_request(&req).await.unwrap();
    assert_eq!(reply.text, "You said: Good morning");
}

#[tokio::test]
async fn test_error() {
    let provider = FakeModelProvider;
    let req = ModelRequest { messages: vec![] };
    let err = provider.send_request(&req).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Other);
}

#[tokio::test]
async fn test_future_is_detached_from_provider() {
    // The returned future must be `'static`, so it can outlive the
    // provider that created it.
    let fut = {
        let provider = FakeModelProvider;
        let req = ModelRequest {
            messages: vec![ModelMessage::user("Hi")],
        };
        provider.send_request(&req)
    };
    sleep(Duration::from_millis(1)).await;
    assert!(fut.await.is_ok());
}
