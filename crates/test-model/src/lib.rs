//! A local fake model for testing purpose.

mod preset;

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::sleep;
use verdant_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelReply, ModelRequest,
};

pub use preset::*;

/// The error type returned by [`TestModelProvider`].
#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Clone)]
enum ConversationStep {
    UserTurn,
    AssistantReply(PresetReply),
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the conversation script,
/// which is how the model should respond to a request. The steps are
/// selected according to the history messages in your request. If there
/// are no enough steps in the script, an error will be returned.
///
/// Cloned providers share their failure bookkeeping, so a step that
/// fails `n` times does so across all clones.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    conversation_script: Vec<ConversationStep>,
    attempts: Arc<Mutex<HashMap<usize, u64>>>,
    delay: Option<Duration>,
}

impl TestModelProvider {
    /// Appends an assistant reply step to the script.
    #[inline]
    pub fn add_assistant_reply_step(&mut self, preset: PresetReply) {
        self.conversation_script
            .push(ConversationStep::AssistantReply(preset));
    }

    /// Appends a user turn step to the script.
    #[inline]
    pub fn add_user_turn_step(&mut self) {
        self.conversation_script.push(ConversationStep::UserTurn);
    }

    /// Delays every reply by the given duration.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    fn reply_for_step(&self, step_idx: usize) -> Result<ModelReply, Error> {
        let Some(step) = self.conversation_script.get(step_idx) else {
            return Err(Error {
                message: "no enough steps",
                kind: ErrorKind::RateLimitExceeded,
            });
        };
        let preset = match step {
            ConversationStep::UserTurn => {
                return Err(Error {
                    message: "not an assistant reply step",
                    kind: ErrorKind::Moderated,
                });
            }
            ConversationStep::AssistantReply(preset) => preset,
        };

        if let Some(failures) = preset.failures {
            let mut attempts = self.attempts.lock().unwrap();
            let attempt = attempts.entry(step_idx).or_insert(0);
            *attempt += 1;
            if failures == 0 || *attempt <= failures {
                return Err(Error {
                    message: "preset failure",
                    kind: ErrorKind::Other,
                });
            }
        }

        Ok(ModelReply::new(preset.text.clone()))
    }
}

impl ModelProvider for TestModelProvider {
    type Error = Error;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelReply, Self::Error>> + Send + 'static
    {
        let step_idx = req.messages.len();
        let this = self.clone();
        async move {
            sleep(this.delay.unwrap_or(Duration::from_millis(1))).await;
            this.reply_for_step(step_idx)
        }
    }
}
