pub const DEFAULT_PORT: u16 = 3000;

/// Process configuration, loaded from the environment.
///
/// Recognized variables: `GEMINI_API_KEY`, `PORT`, `API_BASE_URL`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Provider credential; without it the proxy answers 500 on generation
    pub gemini_api_key: Option<String>,
    /// Port the proxy listens on
    pub port: u16,
    /// Client-visible base URL of the proxy API
    pub api_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            port: DEFAULT_PORT,
            api_base_url: format!("http://localhost:{}/api", DEFAULT_PORT),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok().and_then(|key| {
            let trimmed = key.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        });

        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let api_base_url = std::env::var("API_BASE_URL")
            .ok()
            .and_then(|url| {
                let trimmed = url.trim().trim_end_matches('/');
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| format!("http://localhost:{}/api", port));

        Self {
            gemini_api_key,
            port,
            api_base_url,
        }
    }
}
