// provider.rs - Seam between the orchestration logic and the generative-AI backend
use crate::error::ProviderError;
use crate::types::{ChatMessage, Scene};
use async_trait::async_trait;

/// The three external calls the application makes.
///
/// `GeminiClient` is the production implementation; tests plug in scripted fakes.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Split a script into ordered scenes with image prompts
    async fn extract_scenes(&self, script: &str) -> Result<Vec<Scene>, ProviderError>;

    /// Generate one image for a prompt, returned as a `data:image/jpeg;base64,...` URI
    async fn generate_image(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Produce the model's reply given the running history and a new user message
    async fn chat_reply(
        &self,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<String, ProviderError>;
}
