//! HTTP endpoints of the generation proxy.

use axum::{
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{self, QuestionCache};
use crate::config::Config;
use crate::limit::RateLimiter;
use crate::llm::{GenerateRequest, QuestionProvider};
use crate::normalize;
use crate::types::Question;

/// Per-request deadline for the upstream generation call
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared server state, created at startup
#[derive(Clone)]
pub struct AppState {
    pub provider: Option<Arc<dyn QuestionProvider>>,
    pub cache: QuestionCache,
    pub limiter: RateLimiter,
    pub config: Config,
}

impl AppState {
    pub fn new(provider: Option<Arc<dyn QuestionProvider>>, config: Config) -> Self {
        Self {
            provider,
            cache: QuestionCache::new(),
            limiter: RateLimiter::default(),
            config,
        }
    }
}

/// Body of `POST /api/generate-questions`
#[derive(Debug, Deserialize)]
pub struct GenerateQuestionsRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    5
}

/// JSON error body: `{ error, details?, retryAfter? }`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

/// Failures a single request can end in. The process itself never dies on
/// these; every arm maps to a per-request status code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Topic is required")]
    MissingTopic,

    #[error("Too many requests. Please try again later.")]
    RateLimited { retry_after: Duration },

    #[error("Question generation is not configured")]
    ProviderUnavailable,

    #[error("Failed to generate questions")]
    Upstream(#[from] crate::llm::LlmError),

    #[error("Failed to parse questions from provider response")]
    Normalize(#[from] normalize::NormalizeError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, details, retry_after) = match &self {
            ApiError::MissingTopic => (StatusCode::BAD_REQUEST, None, None),
            ApiError::RateLimited { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                None,
                Some(retry_after.as_secs()),
            ),
            ApiError::ProviderUnavailable => (StatusCode::INTERNAL_SERVER_ERROR, None, None),
            ApiError::Upstream(e) => (StatusCode::INTERNAL_SERVER_ERROR, Some(e.to_string()), None),
            ApiError::Normalize(e) => (StatusCode::INTERNAL_SERVER_ERROR, Some(e.to_string()), None),
        };

        let body = ErrorBody {
            error: self.to_string(),
            details,
            retry_after,
        };
        (status, Json(body)).into_response()
    }
}

/// Generate quiz questions for a topic.
///
/// POST /api/generate-questions
///
/// Pipeline: topic validation, per-IP rate limit, cache lookup, provider
/// call, normalization, cache store.
pub async fn generate_questions(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<GenerateQuestionsRequest>,
) -> Result<Json<Vec<Question>>, ApiError> {
    let topic = request.topic.trim();
    if topic.is_empty() {
        return Err(ApiError::MissingTopic);
    }

    let ip = addr.ip().to_string();
    tracing::info!(%ip, topic, count = request.count, "generation request");

    state
        .limiter
        .check(&ip)
        .await
        .map_err(|rejection| ApiError::RateLimited {
            retry_after: rejection.retry_after,
        })?;

    let key = cache::cache_key(topic, request.count);
    if let Some(cached) = state.cache.get(&key).await {
        tracing::info!(%key, "serving cached questions");
        return Ok(Json(cached));
    }

    let provider = state
        .provider
        .as_ref()
        .ok_or(ApiError::ProviderUnavailable)?;

    let response = provider
        .generate(GenerateRequest {
            topic: topic.to_string(),
            count: request.count,
            timeout: UPSTREAM_TIMEOUT,
        })
        .await?;

    let questions = normalize::questions_from_text(&response.text)?;
    tracing::info!(
        count = questions.len(),
        provider = %response.metadata.provider,
        latency_ms = response.metadata.latency_ms,
        "questions generated"
    );

    state.cache.put(key, questions.clone()).await;
    Ok(Json(questions))
}

/// Health/configuration probe.
///
/// GET /api/health
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub api_key_configured: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        api_key_configured: state.config.gemini_api_key.is_some(),
    })
}
