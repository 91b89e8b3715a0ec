use serde::{Deserialize, Serialize};

/// The preset reply for an assistant step.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetReply {
    /// The reply text.
    pub text: String,
    /// If set, the request will fail in the first `failures` attempts.
    /// `Some(0)` means the request will fail infinitely.
    pub failures: Option<u64>,
}

impl PresetReply {
    /// Creates a `PresetReply` with the specified text.
    #[inline]
    pub fn with_text<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            failures: None,
        }
    }

    /// Sets failure times before a successful reply. `0` means the
    /// reply will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }
}
