use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Bearer token for the X API. Optional so that read-only tooling
    /// (status queries) can run without platform credentials.
    pub x_bearer_token: Option<String>,
    pub x_api_base_url: String,
    pub trigger_phrase: String,
    pub trusted_list_url: String,
    pub trusted_ttl_hours: i64,
    pub event_cooldown_secs: u64,
    pub post_sample_limit: u32,
    pub follower_sample_limit: u32,
    pub mention_search_limit: u32,
    pub xapi_request_timeout_secs: u64,
    pub xapi_max_retries: u32,
    pub xapi_retry_backoff_base_ms: u64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub spam_repetition_threshold: f64,
    pub spam_promo_threshold: f64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field(
                "x_bearer_token",
                &self.x_bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .field("x_api_base_url", &self.x_api_base_url)
            .field("trigger_phrase", &self.trigger_phrase)
            .field("trusted_list_url", &self.trusted_list_url)
            .field("trusted_ttl_hours", &self.trusted_ttl_hours)
            .field("event_cooldown_secs", &self.event_cooldown_secs)
            .field("post_sample_limit", &self.post_sample_limit)
            .field("follower_sample_limit", &self.follower_sample_limit)
            .field("mention_search_limit", &self.mention_search_limit)
            .field(
                "xapi_request_timeout_secs",
                &self.xapi_request_timeout_secs,
            )
            .field("xapi_max_retries", &self.xapi_max_retries)
            .field(
                "xapi_retry_backoff_base_ms",
                &self.xapi_retry_backoff_base_ms,
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "spam_repetition_threshold",
                &self.spam_repetition_threshold,
            )
            .field("spam_promo_threshold", &self.spam_promo_threshold)
            .finish()
    }
}
