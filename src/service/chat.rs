use tracing::warn;

use crate::{client::ChatCompletion, core::error::ServiceError};

pub const SYSTEM_PROMPT: &str = "You are PSI Vision AI, helping students clarify their bigger \
picture with supportive and inspiring dialogue.";
pub const MAX_REPLY_TOKENS: u32 = 300;

/// Forwards one message to the assistant. Blank messages never leave the
/// process.
pub async fn relay_chat(
    chat: &dyn ChatCompletion,
    message: Option<&str>,
) -> Result<String, ServiceError> {
    let message = message.map(str::trim).unwrap_or_default();
    if message.is_empty() {
        return Err(ServiceError::Validation("No message provided".to_string()));
    }
    chat.complete(SYSTEM_PROMPT, message, MAX_REPLY_TOKENS)
        .await
        .inspect_err(|err| warn!("chat relay failed: {}", err))
}
