mod gemini;

use async_trait::async_trait;
use std::time::Duration;

pub use gemini::GeminiProvider;

/// Result type for provider operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors that can occur while talking to a generative-language provider
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Response parsing failed: {0}")]
    ParseError(String),
}

/// Request to generate quiz questions on a topic
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// User-supplied subject string
    pub topic: String,
    /// How many questions to ask for
    pub count: u32,
    /// Timeout for the request
    pub timeout: Duration,
}

/// Raw completion from a provider, before normalization
#[derive(Debug, Clone)]
pub struct GenerateResponse {
    /// The candidate completion text
    pub text: String,
    /// Provider-specific metadata (model used, latency, etc.)
    pub metadata: ResponseMetadata,
}

/// Metadata about the provider response
#[derive(Debug, Clone)]
pub struct ResponseMetadata {
    /// Name of the provider (e.g., "gemini")
    pub provider: String,
    /// Model name used
    pub model: String,
    /// Latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that all question providers must implement
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// Ask the provider for a batch of questions; returns the raw text reply
    async fn generate(&self, request: GenerateRequest) -> LlmResult<GenerateResponse>;

    /// Get the name of this provider
    fn name(&self) -> &str;
}

/// Instruction block appended to every generation prompt so the model emits
/// a machine-parseable array.
const FORMAT_INSTRUCTIONS: &str = r#"IMPORTANT:
1. Respond with a valid JSON array and nothing else
2. Do not add any text or commentary outside the JSON array
3. Every question and answer must be accurate and verifiable

Expected format:
[
  {
    "question": "a specific question with verifiable facts",
    "options": [
      "the accurate answer",
      "a plausible but wrong distractor",
      "a relevant but imprecise distractor",
      "a similar-looking but incorrect distractor"
    ],
    "correctAnswer": "the accurate answer"
  }
]

The correctAnswer value must match one of the options exactly, character for character."#;

/// Build the natural-language prompt embedding topic and desired count.
pub fn build_prompt(topic: &str, count: u32) -> String {
    format!(
        "Write {count} engaging, challenging and educational quiz questions about {topic}.\n\n{FORMAT_INSTRUCTIONS}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_topic_and_count() {
        let prompt = build_prompt("the Roman Empire", 7);
        assert!(prompt.contains("7"));
        assert!(prompt.contains("the Roman Empire"));
        assert!(prompt.contains("correctAnswer"));
    }
}
