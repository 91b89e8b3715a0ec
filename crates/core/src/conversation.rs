//! Conversation-related types.

use verdant_model::{
    ImagePayload, ModelMessage, ModelProviderError, ModelRequest,
};

use crate::model_client::ConversationClient;

/// The author of a chat turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChatRole {
    /// The human user.
    User,
    /// The model.
    Assistant,
}

/// One message exchange unit shown to the user.
///
/// Turns are immutable once created; their order in the transcript is
/// chronological and significant.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChatTurn {
    /// Who authored this turn.
    pub role: ChatRole,
    /// The turn's text, verbatim.
    pub text: String,
}

impl ChatTurn {
    /// Creates a user turn.
    #[inline]
    pub fn user<S: Into<String>>(text: S) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    /// Creates an assistant turn.
    #[inline]
    pub fn assistant<S: Into<String>>(text: S) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}

/// A handle to an ongoing conversation with the model.
///
/// The handle owns the message history; the provider itself is
/// stateless and receives the full history on every turn. A handle
/// only exists after the opening exchange succeeded, and it stays
/// valid after a failed follow-up turn, so the caller may retry.
pub struct Conversation {
    client: ConversationClient,
    history: Vec<ModelMessage>,
}

impl Conversation {
    /// Opens a conversation with one turn carrying both the image and
    /// the instructional prompt, and returns the handle together with
    /// the assistant's reply text.
    ///
    /// On failure there is no handle; the session must be considered
    /// never established.
    pub async fn open(
        client: ConversationClient,
        image: ImagePayload,
        prompt: &str,
    ) -> Result<(Self, String), Box<dyn ModelProviderError>> {
        let opening = ModelMessage::User {
            text: prompt.to_owned(),
            image: Some(image),
        };
        let reply = client
            .send_request(ModelRequest {
                messages: vec![opening.clone()],
            })
            .await?;

        let history =
            vec![opening, ModelMessage::Assistant(reply.text.clone())];
        Ok((Self { client, history }, reply.text))
    }

    /// Sends a single text turn and returns the assistant's reply.
    ///
    /// The exchange is committed to the history only after it
    /// succeeded, so a failed turn leaves the handle exactly as it was.
    pub async fn send(
        &mut self,
        text: &str,
    ) -> Result<String, Box<dyn ModelProviderError>> {
        let mut messages = self.history.clone();
        messages.push(ModelMessage::user(text));
        let reply = self.client.send_request(ModelRequest { messages }).await?;

        self.history.push(ModelMessage::user(text));
        self.history.push(ModelMessage::Assistant(reply.text.clone()));
        Ok(reply.text)
    }
}
