pub mod openai;

use async_trait::async_trait;
use std::error::Error as StdError;
use std::sync::Arc;

use self::openai::OpenAIChatClient;
use super::GenerationError;

/// Text returned in place of a completion when the upstream call itself
/// fails (connect error, timeout, non-success status).
pub const OBTAIN_FAILURE_CONTENT: &str =
    "Failed to obtain predictions from vLLM - See server logs for more details";

/// Text returned in place of a completion when the upstream answer does not
/// contain `choices[0].message.content`.
pub const PARSE_FAILURE_CONTENT: &str =
    "Failed to parse predictions from vLLM - See server logs for more details";

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Produces the completion text for `prompt`. Upstream transport and
    /// response-shape failures are folded into the returned text as a
    /// diagnostic sentence, so for a known model this only fails before the
    /// network call is made.
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32
    ) -> Result<String, GenerationError>;
}

pub fn new_client(api_key: String) -> Result<Arc<dyn ChatClient>, Box<dyn StdError + Send + Sync>> {
    let client = OpenAIChatClient::new(api_key)?;
    Ok(Arc::new(client))
}
