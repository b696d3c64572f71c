//! Resilient client for the generation proxy.
//!
//! Wraps one logical request in a bounded retry loop with per-attempt
//! timeouts and failure-class-dependent backoff. The loop is an explicit
//! state machine so every transition is driven by one classification step
//! instead of nested conditionals.

use rand::seq::SliceRandom;
use serde_json::json;
use tokio::time::Duration;

use crate::normalize;
use crate::types::Question;

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Classified failures of a proxy call
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("rate limited by server (429)")]
    RateLimited { retry_after: Option<u64> },

    #[error("server error (status {status})")]
    ServerError { status: u16 },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Other(String),

    #[error("failed after {attempts} attempts, last error: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl FetchError {
    /// Whether the retry loop may try again after this failure.
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::RateLimited { .. } | FetchError::ServerError { .. } | FetchError::Timeout(_)
        )
    }
}

/// Retry/backoff knobs; the defaults are the production values
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempt budget
    pub max_retries: u32,
    /// Per-attempt deadline
    pub timeout: Duration,
    /// Backoff unit, scaled by failure class and attempt count
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout: Duration::from_secs(30),
            base_delay: Duration::from_secs(2),
        }
    }
}

/// Retry loop states
#[derive(Debug)]
enum RetryState {
    Attempting { attempt: u32 },
    BackoffWait { next_attempt: u32, delay: Duration },
    Succeeded(Vec<Question>),
    Failed(FetchError),
}

/// Client for the quizgen proxy endpoint
pub struct QuizClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

impl QuizClient {
    /// Create a client with the default retry policy.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_retry(base_url, RetryConfig::default())
    }

    pub fn with_retry(base_url: impl Into<String>, retry: RetryConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
        }
    }

    /// Perform one logical generation request with bounded retries.
    ///
    /// Attempts are strictly sequential; no attempt begins before the
    /// previous one's outcome is known. On success every question's options
    /// are independently shuffled, leaving `correct_answer` untouched.
    pub async fn generate_questions(
        &self,
        topic: &str,
        count: u32,
    ) -> FetchResult<Vec<Question>> {
        let mut state = RetryState::Attempting { attempt: 0 };

        loop {
            state = match state {
                RetryState::Attempting { attempt } => match self.attempt_once(topic, count).await
                {
                    Ok(questions) => RetryState::Succeeded(questions),
                    Err(error) => self.classify_failure(error, attempt),
                },
                RetryState::BackoffWait {
                    next_attempt,
                    delay,
                } => {
                    tracing::debug!(?delay, next_attempt, "backing off before retry");
                    tokio::time::sleep(delay).await;
                    RetryState::Attempting {
                        attempt: next_attempt,
                    }
                }
                RetryState::Succeeded(mut questions) => {
                    let mut rng = rand::rng();
                    for question in &mut questions {
                        question.options.shuffle(&mut rng);
                    }
                    return Ok(questions);
                }
                RetryState::Failed(error) => return Err(error),
            };
        }
    }

    /// Single classification step feeding the state transition.
    fn classify_failure(&self, error: FetchError, attempt: u32) -> RetryState {
        let next_attempt = attempt + 1;

        if !error.is_retryable() {
            return RetryState::Failed(error);
        }
        if next_attempt >= self.retry.max_retries {
            return RetryState::Failed(FetchError::RetriesExhausted {
                attempts: self.retry.max_retries,
                last: error.to_string(),
            });
        }

        let delay = match &error {
            // Rate limits always get the long flat delay, regardless of the
            // server's own hint.
            FetchError::RateLimited { retry_after } => {
                if let Some(seconds) = retry_after {
                    tracing::debug!(retry_after_s = seconds, "server sent retry-after hint");
                }
                self.retry.base_delay * 3
            }
            // Server errors and timeouts back off progressively.
            _ => self.retry.base_delay * (next_attempt + 1),
        };

        tracing::warn!(attempt = attempt + 1, %error, "attempt failed, will retry");
        RetryState::BackoffWait {
            next_attempt,
            delay,
        }
    }

    /// One network attempt, bounded by its own timeout.
    async fn attempt_once(&self, topic: &str, count: u32) -> FetchResult<Vec<Question>> {
        let url = format!("{}/generate-questions", self.base_url);

        let response = self
            .http
            .post(&url)
            .timeout(self.retry.timeout)
            .json(&json!({ "topic": topic, "count": count }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(self.retry.timeout)
                } else {
                    FetchError::Other(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("request failed")
                .to_string();

            return Err(if status.as_u16() == 429 {
                FetchError::RateLimited {
                    retry_after: body.get("retryAfter").and_then(|r| r.as_u64()),
                }
            } else if status.is_server_error() {
                FetchError::ServerError {
                    status: status.as_u16(),
                }
            } else {
                FetchError::Other(format!("server returned {}: {}", status, message))
            });
        }

        let questions: Vec<Question> = response
            .json()
            .await
            .map_err(|e| FetchError::Other(format!("invalid response body: {}", e)))?;

        normalize::validate_questions(&questions)
            .map_err(|e| FetchError::Other(format!("invalid question payload: {}", e)))?;

        Ok(questions)
    }
}
