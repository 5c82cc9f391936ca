use std::time::Duration;
use thiserror::Error;

/// Failures of the external text-generation call.
///
/// These never reach the UI as errors: the dispatcher turns every variant
/// into a reply string.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("missing credential for {provider}: set {env_var}")]
    MissingCredential { provider: String, env_var: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("provider returned an empty reply")]
    EmptyResponse,

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

pub type LlmResult<T> = std::result::Result<T, LlmError>;
