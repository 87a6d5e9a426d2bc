use std::env;

pub const DEFAULT_API_URL: &str = "https://api.cc.email/v3";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const DEFAULT_RESET_HEADER: &str = "x-ratelimit-reset";

/// Runtime configuration for the Constant Contact API client.
/// Values are sourced from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub access_token: String,
    pub api_url: String,
    pub timeout_secs: u64,
    pub rate_limit_remaining_header: String,
    pub rate_limit_reset_header: String,
    pub user_agent: String,
}

impl Config {
    /// Build a config for `access_token`, with `api_url` falling back to the
    /// public v3 endpoint.
    pub fn new(access_token: impl Into<String>, api_url: Option<&str>) -> Self {
        Self {
            access_token: access_token.into(),
            api_url: api_url.unwrap_or(DEFAULT_API_URL).to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            rate_limit_remaining_header: DEFAULT_REMAINING_HEADER.to_string(),
            rate_limit_reset_header: DEFAULT_RESET_HEADER.to_string(),
            user_agent: default_user_agent(),
        }
    }

    /// Load configuration from environment.
    ///
    /// Env vars:
    /// - CONSTANT_CONTACT_ACCESS_TOKEN [required]
    /// - CONSTANT_CONTACT_API_URL (default: https://api.cc.email/v3)
    /// - CONSTANT_CONTACT_HTTP_TIMEOUT_SECS (default: 30)
    /// - CONSTANT_CONTACT_RATELIMIT_REMAINING_HEADER (default: x-ratelimit-remaining)
    /// - CONSTANT_CONTACT_RATELIMIT_RESET_HEADER (default: x-ratelimit-reset)
    /// - CONSTANT_CONTACT_USER_AGENT (default: constant-contact-mcp/<version>)
    pub fn from_env() -> Result<Self, String> {
        let access_token = env::var("CONSTANT_CONTACT_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| "Missing CONSTANT_CONTACT_ACCESS_TOKEN".to_string())?;

        let api_url = env::var("CONSTANT_CONTACT_API_URL").ok();
        let mut cfg = Self::new(access_token, api_url.as_deref());

        if let Some(secs) = env::var("CONSTANT_CONTACT_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            cfg.timeout_secs = secs;
        }
        if let Ok(h) = env::var("CONSTANT_CONTACT_RATELIMIT_REMAINING_HEADER") {
            cfg.rate_limit_remaining_header = h.to_ascii_lowercase();
        }
        if let Ok(h) = env::var("CONSTANT_CONTACT_RATELIMIT_RESET_HEADER") {
            cfg.rate_limit_reset_header = h.to_ascii_lowercase();
        }
        if let Ok(ua) = env::var("CONSTANT_CONTACT_USER_AGENT") {
            cfg.user_agent = ua;
        }
        Ok(cfg)
    }
}

fn default_user_agent() -> String {
    format!("constant-contact-mcp/{}", env!("CARGO_PKG_VERSION"))
}
