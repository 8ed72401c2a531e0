use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("no API key configured (set {0})")]
    MissingApiKey(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("completion service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode completion response: {0}")]
    Decode(String),

    #[error("completion response contained no choices")]
    NoChoices,
}
