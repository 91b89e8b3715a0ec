/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The credential was rejected by the provider.
    InvalidCredential,
    /// The model provider is rate limited.
    RateLimitExceeded,
    /// The content was blocked by the provider's safety filters.
    Moderated,
    /// Any other errors.
    Other,
}
