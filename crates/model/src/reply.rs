/// A complete reply from the model provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelReply {
    /// The assistant's reply text, verbatim.
    pub text: String,
}

impl ModelReply {
    /// Creates a reply with the given text.
    #[inline]
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self { text: text.into() }
    }
}
