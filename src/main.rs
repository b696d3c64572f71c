use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quizgen::{api, cache, config::Config, limit, llm::GeminiProvider};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quizgen=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting quizgen proxy...");

    let config = Config::from_env();

    let provider = match &config.gemini_api_key {
        Some(key) => {
            tracing::info!("Gemini provider initialized");
            Some(Arc::new(GeminiProvider::new(key.clone())) as Arc<dyn quizgen::llm::QuestionProvider>)
        }
        None => {
            tracing::warn!(
                "GEMINI_API_KEY not set. Question generation will not be available."
            );
            None
        }
    };

    let port = config.port;
    let state = Arc::new(api::AppState::new(provider, config));

    // Periodic maintenance of the two in-memory maps
    cache::spawn_cache_sweeper(state.cache.clone());
    limit::spawn_limiter_cleanup(state.limiter.clone());

    let app = Router::new()
        .route("/api/generate-questions", post(api::generate_questions))
        .route("/api/health", get(api::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
