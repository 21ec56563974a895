/// Error types for a single update run.
///
/// Every failure a record can run into is one of these variants. They are
/// carried as data inside an [`Outcome`](crate::record::Outcome), so the type is
/// `Clone` and comparable.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DdnsError {
    /// Public address discovery failed or returned an unusable value
    #[error("address resolution failed: {0}")]
    Resolution(String),

    /// A DNS provider call failed (auth, rate limit, malformed request, transport)
    #[error("provider error ({code}): {message}")]
    Provider { code: String, message: String },

    /// The record itself is misconfigured, e.g. an unsupported type
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The messaging sink was unreachable or rejected the message
    #[error("notification failed: {0}")]
    Notification(String),
}

impl DdnsError {
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    pub fn provider(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn notification(msg: impl Into<String>) -> Self {
        Self::Notification(msg.into())
    }
}
