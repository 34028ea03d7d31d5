use crate::relay::{
    error::{RelayError, RelayResult},
    key_ring::KeyRing,
};
use crate::types::{ChatRequest, ChatResponse};
use tracing::{debug, info};

/// A chat request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub model: String,
    pub message: String,
    pub paid_key_use: bool,
}

impl TryFrom<ChatRequest> for Prompt {
    type Error = RelayError;

    fn try_from(request: ChatRequest) -> RelayResult<Self> {
        let model = required(request.model).ok_or(RelayError::MissingModel)?;
        let message = required(request.message).ok_or(RelayError::MissingMessage)?;

        Ok(Self {
            model,
            message,
            paid_key_use: request.paid_key_use.unwrap_or(false),
        })
    }
}

/// Trimmed value, or `None` when absent or blank.
fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone)]
pub struct RelayEngine {
    keys: KeyRing,
}

impl RelayEngine {
    pub fn new(keys: KeyRing) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &KeyRing {
        &self.keys
    }

    /// Validate, pick a key and forward the prompt. One upstream call, no retries.
    pub async fn relay(&self, request: ChatRequest) -> RelayResult<ChatResponse> {
        let prompt = Prompt::try_from(request)?;

        let (tier, generator) = self.keys.select(prompt.paid_key_use);
        if prompt.paid_key_use && !self.keys.has_paid() {
            debug!("Paid key requested but not configured; using the free key");
        }

        info!("Forwarding prompt to model '{}' with {} key", prompt.model, tier);

        let reply = generator.generate(&prompt.model, &prompt.message).await?;
        debug!("Upstream answered (text present: {})", reply.is_some());

        Ok(ChatResponse::new(reply.unwrap_or_default()))
    }
}
