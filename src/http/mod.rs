pub mod pagination;

use crate::config::Config;
use crate::error::ApiError;
use crate::types::{RateLimitState, RateLimitStatus};
use futures::future::BoxFuture;
use futures::FutureExt;
use log::{debug, warn};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER, USER_AGENT,
};
use reqwest::{Client, Method, StatusCode};
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub use pagination::{DEFAULT_PAGE_LIMIT, ENVELOPE_ITEM_FIELDS};

/// Below this many remaining calls the client waits for the reset before dispatching.
pub const THROTTLE_THRESHOLD: u64 = 10;
/// A 429 is absorbed at most this many times per call.
pub const MAX_RATE_LIMIT_RETRIES: u32 = 1;
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;
pub type Sleeper = Arc<dyn Fn(Duration) -> BoxFuture<'static, ()> + Send + Sync>;

/// Authenticated client for the Constant Contact v3 REST API.
///
/// Tracks the server-reported rate budget across calls, waits for the reset
/// when the budget runs low, and absorbs a single 429 per call. The throttle
/// is best-effort: concurrent callers may both pass the check.
pub struct ApiClient {
    http: Client,
    base_url: String,
    remaining_header: String,
    reset_header: String,
    rate: Mutex<RateLimitState>,
    clock: Clock,
    sleeper: Sleeper,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("rate", &self.rate_state())
            .finish_non_exhaustive()
    }
}

pub fn build_client(cfg: &Config) -> Result<Client, ApiError> {
    let mut default_headers = HeaderMap::new();
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", cfg.access_token))
        .map_err(|_| ApiError::Other("access token is not a valid header value".into()))?;
    auth.set_sensitive(true);
    default_headers.insert(AUTHORIZATION, auth);
    default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    let ua = HeaderValue::from_str(&cfg.user_agent)
        .map_err(|_| ApiError::Other("user agent is not a valid header value".into()))?;
    default_headers.insert(USER_AGENT, ua);
    Client::builder()
        .default_headers(default_headers)
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .use_rustls_tls()
        .build()
        .map_err(|e| ApiError::Other(e.to_string()))
}

fn system_now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl ApiClient {
    /// Build a client bound to `cfg.api_url`. Performs no network I/O.
    pub fn new(cfg: &Config) -> Result<Self, ApiError> {
        let http = build_client(cfg)?;
        Ok(Self {
            http,
            base_url: cfg.api_url.trim_end_matches('/').to_string(),
            remaining_header: cfg.rate_limit_remaining_header.clone(),
            reset_header: cfg.rate_limit_reset_header.clone(),
            rate: Mutex::new(RateLimitState::initial(system_now_ms())),
            clock: Arc::new(system_now_ms),
            sleeper: Arc::new(|d: Duration| tokio::time::sleep(d).boxed()),
        })
    }

    /// Replace the wall clock (epoch milliseconds) used by the throttle.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Replace the timer used for throttle and backoff waits.
    pub fn with_sleeper<F, Fut>(mut self, sleeper: F) -> Self
    where
        F: Fn(Duration) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.sleeper = Arc::new(move |d| sleeper(d).boxed());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(&self, endpoint: &str, params: Option<&Value>) -> Result<Value, ApiError> {
        self.request(Method::GET, endpoint, params, None).await
    }

    pub async fn post(&self, endpoint: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        self.request(Method::POST, endpoint, None, body).await
    }

    pub async fn put(&self, endpoint: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        self.request(Method::PUT, endpoint, None, body).await
    }

    pub async fn patch(&self, endpoint: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        self.request(Method::PATCH, endpoint, None, body).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, endpoint, None, None).await
    }

    /// Walk a cursor-paginated listing and return its items in server order.
    ///
    /// The first page is requested with `params` plus a page-size `limit`
    /// (50 unless given); later pages are requested from the envelope's next
    /// link alone. Stops once `max_results` items are collected, truncating
    /// the last page. Any page failure aborts the walk; nothing partial is
    /// returned.
    pub async fn get_paginated(
        &self,
        endpoint: &str,
        params: Option<&Value>,
        max_results: Option<usize>,
    ) -> Result<Vec<Value>, ApiError> {
        let mut first = match params {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(m)) => m.clone(),
            Some(_) => {
                return Err(ApiError::Other(
                    "query parameters must be a JSON object".into(),
                ))
            }
        };
        if first.get("limit").map_or(true, is_unset_limit) {
            first.insert("limit".into(), Value::from(DEFAULT_PAGE_LIMIT));
        }
        let first = Value::Object(first);
        let max_results = max_results.filter(|m| *m > 0);

        let mut items: Vec<Value> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page: u32 = 0;
        loop {
            let mut envelope = match cursor.take() {
                None => self.get(endpoint, Some(&first)).await?,
                Some(next) => {
                    let target = pagination::relativize_cursor(&self.base_url, &next);
                    self.get(&target, None).await?
                }
            };
            page += 1;
            cursor = pagination::next_link(&envelope);
            items.extend(pagination::take_items(&mut envelope));
            debug!(
                "paginate {} page={} total={} more={}",
                endpoint,
                page,
                items.len(),
                cursor.is_some()
            );

            if let Some(max) = max_results {
                if items.len() >= max {
                    items.truncate(max);
                    return Ok(items);
                }
            }
            if cursor.is_none() {
                return Ok(items);
            }
        }
    }

    /// Current rate-limit bookkeeping. No I/O.
    pub fn rate_limit_status(&self) -> RateLimitStatus {
        self.rate_state().into()
    }

    fn rate_state(&self) -> RateLimitState {
        *self.rate.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn url_for(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_string();
        }
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    async fn throttle(&self) {
        let now = (self.clock)();
        if let Some(wait) = throttle_delay(&self.rate_state(), now) {
            warn!("Rate limit low, waiting {}ms", wait.as_millis());
            (self.sleeper)(wait).await;
        }
    }

    fn record_rate(&self, headers: &HeaderMap) {
        let remaining = header_number::<u64>(headers, &self.remaining_header);
        let reset_secs = header_number::<i64>(headers, &self.reset_header);
        let mut state = self.rate.lock().unwrap_or_else(|e| e.into_inner());
        apply_rate_headers(&mut state, remaining, reset_secs);
    }

    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        params: Option<&Value>,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        self.throttle().await;
        let url = self.url_for(endpoint);
        let query = match params {
            Some(p) => query_pairs(p)?,
            None => Vec::new(),
        };

        let mut retries: u32 = 0;
        loop {
            let mut req = self.http.request(method.clone(), &url);
            if !query.is_empty() {
                req = req.query(&query);
            }
            if let Some(b) = body {
                req = req.json(b);
            }
            debug!("{} {}", method, url);

            let res = req.send().await.map_err(|e| {
                warn!("{} {} failed without response: {}", method, url, e);
                ApiError::from(e)
            })?;
            let status = res.status();
            self.record_rate(res.headers());

            if status == StatusCode::TOO_MANY_REQUESTS && retries < MAX_RATE_LIMIT_RETRIES {
                let backoff = retry_after(res.headers());
                warn!(
                    "{} {} rate limited (429), retrying in {:?}",
                    method, url, backoff
                );
                (self.sleeper)(backoff).await;
                retries += 1;
                continue;
            }

            let text = res
                .text()
                .await
                .map_err(|e| body_read_error(&method, &url, status, e))?;
            if status.is_success() {
                return Ok(parse_success_body(status, &text));
            }
            debug!("{} {} -> {}", method, url, status);
            return Err(ApiError::upstream(status, &text));
        }
    }
}

// The status line arrived, so this is never a missing response.
fn body_read_error(method: &Method, url: &str, status: StatusCode, e: reqwest::Error) -> ApiError {
    warn!("{} {} -> {} but body read failed: {}", method, url, status, e);
    if status.is_success() {
        ApiError::Other(format!("failed to read response body: {}", e))
    } else {
        ApiError::Upstream {
            status,
            message: None,
        }
    }
}

// Zero, false, null and "" all fall back to the default page size.
fn is_unset_limit(v: &Value) -> bool {
    match v {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.trim().is_empty() || s.trim() == "0",
        _ => false,
    }
}

/// How long to hold a request given the current budget, if at all.
pub fn throttle_delay(state: &RateLimitState, now_ms: i64) -> Option<Duration> {
    if state.remaining < THROTTLE_THRESHOLD && now_ms < state.reset_at_ms {
        Some(Duration::from_millis((state.reset_at_ms - now_ms) as u64))
    } else {
        None
    }
}

// Absent values keep whatever was observed before.
pub fn apply_rate_headers(
    state: &mut RateLimitState,
    remaining: Option<u64>,
    reset_epoch_secs: Option<i64>,
) {
    if let Some(r) = remaining {
        state.remaining = r;
    }
    if let Some(secs) = reset_epoch_secs {
        state.reset_at_ms = secs.saturating_mul(1000);
    }
}

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<T>().ok())
}

/// Server-directed backoff for a 429; 60 seconds when missing or unparseable.
pub fn retry_after(headers: &HeaderMap) -> Duration {
    let secs = header_number::<u64>(headers, RETRY_AFTER.as_str()).unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    Duration::from_secs(secs)
}

pub fn success_marker() -> Value {
    serde_json::json!({ "success": true })
}

fn parse_success_body(status: StatusCode, text: &str) -> Value {
    if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
        return success_marker();
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Flatten a JSON object into query pairs. Nulls are dropped and arrays are
/// joined with commas, the API's convention for multi-valued filters.
pub fn query_pairs(params: &Value) -> Result<Vec<(String, String)>, ApiError> {
    let obj = match params {
        Value::Null => return Ok(Vec::new()),
        Value::Object(o) => o,
        _ => {
            return Err(ApiError::Other(
                "query parameters must be a JSON object".into(),
            ))
        }
    };
    let mut pairs = Vec::with_capacity(obj.len());
    for (k, v) in obj {
        let rendered = match v {
            Value::Null => continue,
            Value::Array(items) => items
                .iter()
                .filter(|i| !i.is_null())
                .map(scalar_to_string)
                .collect::<Vec<_>>()
                .join(","),
            other => scalar_to_string(other),
        };
        pairs.push((k.clone(), rendered));
    }
    Ok(pairs)
}

fn scalar_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// Percent-encode a single path segment (e.g., a contact id).
pub fn encode_path_segment(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn throttle_only_when_low_and_before_reset() {
        let low = RateLimitState {
            remaining: 5,
            reset_at_ms: 10_000,
        };
        assert_eq!(throttle_delay(&low, 4_000), Some(Duration::from_millis(6_000)));
        assert_eq!(throttle_delay(&low, 10_000), None);
        let plenty = RateLimitState {
            remaining: 10,
            reset_at_ms: 10_000,
        };
        assert_eq!(throttle_delay(&plenty, 0), None);
    }

    #[test]
    fn rate_headers_update_only_present_fields() {
        let mut s = RateLimitState {
            remaining: 100,
            reset_at_ms: 5,
        };
        apply_rate_headers(&mut s, Some(42), None);
        assert_eq!(s.remaining, 42);
        assert_eq!(s.reset_at_ms, 5);
        apply_rate_headers(&mut s, None, Some(1_700_000_000));
        assert_eq!(s.remaining, 42);
        assert_eq!(s.reset_at_ms, 1_700_000_000_000);
    }

    #[test]
    fn retry_after_defaults_to_sixty() {
        let mut h = HeaderMap::new();
        assert_eq!(retry_after(&h), Duration::from_secs(60));
        h.insert(RETRY_AFTER, "soon".parse().unwrap());
        assert_eq!(retry_after(&h), Duration::from_secs(60));
        h.insert(RETRY_AFTER, "2".parse().unwrap());
        assert_eq!(retry_after(&h), Duration::from_secs(2));
    }

    #[test]
    fn success_bodies() {
        assert_eq!(parse_success_body(StatusCode::NO_CONTENT, ""), success_marker());
        assert_eq!(parse_success_body(StatusCode::OK, "  "), success_marker());
        assert_eq!(parse_success_body(StatusCode::OK, r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_success_body(StatusCode::OK, "plain"), json!("plain"));
    }

    #[test]
    fn query_pair_rendering() {
        let pairs = query_pairs(&json!({
            "limit": 50,
            "status": "all",
            "include_count": true,
            "list_ids": ["a", "b"],
            "email": null
        }))
        .unwrap();
        assert!(pairs.contains(&("limit".into(), "50".into())));
        assert!(pairs.contains(&("status".into(), "all".into())));
        assert!(pairs.contains(&("include_count".into(), "true".into())));
        assert!(pairs.contains(&("list_ids".into(), "a,b".into())));
        assert!(!pairs.iter().any(|(k, _)| k == "email"));
        assert!(query_pairs(&json!("nope")).is_err());
    }

    #[test]
    fn zero_and_empty_limits_are_unset() {
        for v in [json!(null), json!(0), json!(false), json!(""), json!("0")] {
            assert!(is_unset_limit(&v), "{}", v);
        }
        assert!(!is_unset_limit(&json!(25)));
        assert!(!is_unset_limit(&json!("25")));
    }

    #[test]
    fn path_segments_are_encoded() {
        assert_eq!(encode_path_segment("a b/c%"), "a%20b%2Fc%25");
        assert_eq!(encode_path_segment("abc-._~123"), "abc-._~123");
    }

    #[test]
    fn construction_is_offline() {
        let cfg = Config::new("token", Some("http://127.0.0.1:1/"));
        let client = ApiClient::new(&cfg).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:1");
        assert_eq!(client.url_for("/contacts"), "http://127.0.0.1:1/contacts");
        assert_eq!(client.url_for("tags"), "http://127.0.0.1:1/tags");
        assert_eq!(client.url_for("https://x.example/y"), "https://x.example/y");
        assert_eq!(client.rate_limit_status().remaining, RateLimitState::INITIAL_REMAINING);
    }
}
