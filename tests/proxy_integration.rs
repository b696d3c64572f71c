//! Proxy handler pipeline tests with a mock provider.
//!
//! The handler is driven directly, with a counting provider standing in for
//! Gemini, so cache and rate-limit behavior can be asserted without any real
//! upstream.

use async_trait::async_trait;
use axum::extract::{ConnectInfo, Json, State};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use quizgen::api::{self, ApiError, AppState, GenerateQuestionsRequest};
use quizgen::config::Config;
use quizgen::limit::RateLimiter;
use quizgen::llm::{
    GenerateRequest, GenerateResponse, LlmResult, QuestionProvider, ResponseMetadata,
};

const VALID_REPLY: &str = r#"[
    {
        "question": "Which planet is known as the Red Planet?",
        "options": ["Mars", "Venus", "Jupiter", "Saturn"],
        "correctAnswer": "Mars"
    }
]"#;

/// Provider double that counts calls and replies with canned text
struct MockProvider {
    calls: AtomicUsize,
    reply: String,
}

impl MockProvider {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            reply: reply.to_string(),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionProvider for MockProvider {
    async fn generate(&self, _request: GenerateRequest) -> LlmResult<GenerateResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(GenerateResponse {
            text: self.reply.clone(),
            metadata: ResponseMetadata {
                provider: "mock".to_string(),
                model: "mock-1".to_string(),
                latency_ms: 0,
            },
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn state_with(provider: Arc<MockProvider>) -> Arc<AppState> {
    Arc::new(AppState::new(Some(provider), Config::default()))
}

fn caller(last_octet: u8) -> ConnectInfo<SocketAddr> {
    ConnectInfo(SocketAddr::from(([127, 0, 0, last_octet], 40000)))
}

fn request(topic: &str, count: u32) -> Json<GenerateQuestionsRequest> {
    Json(GenerateQuestionsRequest {
        topic: topic.to_string(),
        count,
    })
}

#[tokio::test]
async fn generates_and_returns_validated_questions() {
    let provider = MockProvider::new(VALID_REPLY);
    let state = state_with(provider.clone());

    let Json(questions) =
        api::generate_questions(State(state), caller(1), request("planets", 1))
            .await
            .unwrap();

    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].correct_answer, "Mars");
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn blank_topic_is_rejected_before_any_upstream_call() {
    let provider = MockProvider::new(VALID_REPLY);
    let state = state_with(provider.clone());

    let error = api::generate_questions(State(state), caller(1), request("   ", 5))
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::MissingTopic));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn identical_requests_hit_cache_until_the_window_expires() {
    let provider = MockProvider::new(VALID_REPLY);
    let state = state_with(provider.clone());

    // Two identical requests within the freshness window: one upstream call.
    // Topic casing must not matter for the cache key.
    api::generate_questions(State(state.clone()), caller(1), request("Planets", 1))
        .await
        .unwrap();
    api::generate_questions(State(state.clone()), caller(2), request("planets", 1))
        .await
        .unwrap();
    assert_eq!(provider.call_count(), 1);

    // A different count is a different key.
    api::generate_questions(State(state.clone()), caller(1), request("planets", 2))
        .await
        .unwrap();
    assert_eq!(provider.call_count(), 2);

    // After the freshness window elapses the entry is stale.
    tokio::time::advance(Duration::from_secs(30 * 60 + 1)).await;
    api::generate_questions(State(state), caller(1), request("planets", 1))
        .await
        .unwrap();
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn over_limit_caller_gets_retry_after_hint() {
    let provider = MockProvider::new(VALID_REPLY);
    let state = Arc::new(AppState {
        provider: Some(provider.clone()),
        cache: quizgen::cache::QuestionCache::new(),
        limiter: RateLimiter::new(1, Duration::from_secs(60)),
        config: Config::default(),
    });

    api::generate_questions(State(state.clone()), caller(1), request("planets", 1))
        .await
        .unwrap();

    let error = api::generate_questions(State(state.clone()), caller(1), request("other", 1))
        .await
        .unwrap_err();

    match error {
        ApiError::RateLimited { retry_after } => {
            assert_eq!(retry_after, Duration::from_secs(60));
        }
        other => panic!("expected RateLimited, got {:?}", other),
    }

    // A different IP is unaffected.
    api::generate_questions(State(state), caller(2), request("other", 1))
        .await
        .unwrap();
}

#[tokio::test]
async fn missing_provider_is_a_server_error() {
    let state = Arc::new(AppState::new(None, Config::default()));

    let error = api::generate_questions(State(state), caller(1), request("planets", 1))
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::ProviderUnavailable));
}

#[tokio::test]
async fn unparseable_reply_fails_this_request_only() {
    let provider = MockProvider::new("I'm sorry, I can't produce JSON today.");
    let state = state_with(provider.clone());

    let error = api::generate_questions(State(state.clone()), caller(1), request("planets", 1))
        .await
        .unwrap_err();
    assert!(matches!(error, ApiError::Normalize(_)));

    // The server keeps serving; nothing was cached for the failed topic.
    let error = api::generate_questions(State(state), caller(1), request("planets", 1))
        .await
        .unwrap_err();
    assert!(matches!(error, ApiError::Normalize(_)));
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn empty_reply_is_a_failure_not_an_empty_quiz() {
    let provider = MockProvider::new("[]");
    let state = state_with(provider);

    let error = api::generate_questions(State(state), caller(1), request("planets", 1))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        ApiError::Normalize(quizgen::normalize::NormalizeError::EmptyResult)
    ));
}

#[tokio::test]
async fn health_reports_key_configuration() {
    let with_key = Arc::new(AppState::new(
        None,
        Config {
            gemini_api_key: Some("secret".to_string()),
            ..Config::default()
        },
    ));
    let Json(body) = api::health(State(with_key)).await;
    assert_eq!(body.status, "ok");
    assert!(body.api_key_configured);

    let without_key = Arc::new(AppState::new(None, Config::default()));
    let Json(body) = api::health(State(without_key)).await;
    assert!(!body.api_key_configured);
}
