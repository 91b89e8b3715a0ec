use serde::{Deserialize, Serialize};

/// A request to be sent to the model provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelRequest {
    /// The input messages, oldest first.
    pub messages: Vec<ModelMessage>,
}

/// A complete message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelMessage {
    /// A user turn, optionally carrying an image.
    User {
        /// The user's text.
        text: String,
        /// An image attached to this turn, if any.
        image: Option<ImagePayload>,
    },
    /// An assistant text.
    Assistant(String),
}

impl ModelMessage {
    /// Creates a text-only user message.
    #[inline]
    pub fn user<S: Into<String>>(text: S) -> Self {
        Self::User {
            text: text.into(),
            image: None,
        }
    }
}

/// An image prepared for transmission to the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImagePayload {
    /// The base64-encoded image bytes, without any data-URL prefix.
    pub data: String,
    /// The MIME type of the image, e.g. `image/jpeg`.
    pub mime_type: String,
}
