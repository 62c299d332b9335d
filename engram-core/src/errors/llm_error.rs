/// Language-model subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("language model unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("API key missing for provider {provider}")]
    MissingApiKey { provider: String },

    #[error("LLM request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("malformed model response: {reason}")]
    MalformedResponse { reason: String },
}
