use crate::config::UpstreamConfig;
use crate::errors::{ServeError, UpstreamError};
use crate::metrics_defs::{UPSTREAM_REQUEST_DURATION, UPSTREAM_REQUESTS};
use crate::types::NumericId;
use async_trait::async_trait;
use http::{HeaderName, StatusCode};
use serde_json::Value;
use shared::{counter, histogram};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use url::Url;

/// Page size requested from the created-gamepasses listing.
pub const PAGE_SIZE: u32 = 100;

/// What upstream answered, whatever the status.
#[derive(Clone, Debug, PartialEq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: String,
}

impl UpstreamResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        UpstreamResponse {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The body parsed as JSON, or the raw text as a JSON string when it is
    /// not JSON.
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or_else(|_| Value::String(self.body.clone()))
    }
}

/// A single GET against the upstream platform.
///
/// Non-success statuses are returned as responses so callers can forward the
/// upstream error detail. Only failures to get any response are errors.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn get(
        &self,
        url: &Url,
        api_key: Option<&str>,
    ) -> Result<UpstreamResponse, UpstreamError>;
}

pub struct HttpUpstream {
    client: reqwest::Client,
    api_key_header: HeaderName,
    timeout: Duration,
}

impl HttpUpstream {
    pub fn new(config: &UpstreamConfig) -> Result<Self, ServeError> {
        Self::with_timeout(
            &config.api_key_header,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn with_timeout(api_key_header: &str, timeout: Duration) -> Result<Self, ServeError> {
        let api_key_header = HeaderName::from_bytes(api_key_header.as_bytes())
            .map_err(|_| ServeError::InvalidHeader(api_key_header.to_string()))?;
        let client = reqwest::Client::builder().build()?;

        Ok(HttpUpstream {
            client,
            api_key_header,
            timeout,
        })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn get(
        &self,
        url: &Url,
        api_key: Option<&str>,
    ) -> Result<UpstreamResponse, UpstreamError> {
        // Use host as identifier for error messages
        let upstream_identifier = url.host_str().unwrap_or(url.as_str()).to_string();

        let mut request = self.client.get(url.clone());
        if let Some(key) = api_key {
            request = request.header(self.api_key_header.clone(), key);
        }

        let started = Instant::now();

        // The timeout covers connecting, headers and collecting the full body
        let result = timeout(self.timeout, async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(UpstreamResponse { status, body })
        })
        .await;

        histogram!(UPSTREAM_REQUEST_DURATION).record(started.elapsed().as_secs_f64());

        let result = match result {
            Err(_) => Err(UpstreamError::Timeout(upstream_identifier)),
            Ok(Err(e)) if e.is_timeout() => Err(UpstreamError::Timeout(upstream_identifier)),
            Ok(Err(e)) => Err(UpstreamError::RequestFailed(
                upstream_identifier,
                e.to_string(),
            )),
            Ok(Ok(response)) => Ok(response),
        };

        let outcome = match &result {
            Ok(response) if response.is_success() => "success",
            Ok(_) => "error_status",
            Err(UpstreamError::Timeout(_)) => "timeout",
            Err(UpstreamError::RequestFailed(..)) => "failed",
        };
        counter!(UPSTREAM_REQUESTS, "outcome" => outcome).increment(1);

        match &result {
            Ok(response) => tracing::debug!(
                url = %url,
                status = %response.status,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Upstream responded"
            ),
            Err(e) => tracing::warn!(url = %url, error = %e, "Upstream request failed"),
        }

        result
    }
}

/// Builds upstream URLs from the configured base URLs.
#[derive(Clone, Debug)]
pub struct Endpoints {
    games_url: Url,
    inventory_url: Url,
}

impl Endpoints {
    pub fn new(config: &UpstreamConfig) -> Self {
        Endpoints {
            games_url: config.games_url.clone(),
            inventory_url: config.inventory_url.clone(),
        }
    }

    /// `{games}/users/{userId}/game-passes?count=100[&exclusiveStartId={cursor}]`
    pub fn created_gamepasses(&self, user_id: &NumericId, cursor: Option<&str>) -> Url {
        let mut url = with_segments(
            &self.games_url,
            &["users", user_id.as_str(), "game-passes"],
        );
        {
            let mut query = url.query_pairs_mut();
            query.clear().append_pair("count", &PAGE_SIZE.to_string());
            if let Some(cursor) = cursor {
                query.append_pair("exclusiveStartId", cursor);
            }
        }
        url
    }

    /// `{games}/universes/{universeId}/game-passes`
    pub fn universe_gamepasses(&self, universe_id: &NumericId) -> Url {
        with_segments(
            &self.games_url,
            &["universes", universe_id.as_str(), "game-passes"],
        )
    }

    /// `{inventory}/users/{userId}/items/GamePass/{gamePassId}`
    pub fn inventory_item(&self, user_id: &NumericId, game_pass_id: &NumericId) -> Url {
        with_segments(
            &self.inventory_url,
            &[
                "users",
                user_id.as_str(),
                "items",
                "GamePass",
                game_pass_id.as_str(),
            ],
        )
    }

    /// `{inventory}/users/{userId}/items/GamePass/{gamePassId}/is-owned`
    pub fn is_owned(&self, user_id: &NumericId, game_pass_id: &NumericId) -> Url {
        let mut url = self.inventory_item(user_id, game_pass_id);
        if let Ok(mut path) = url.path_segments_mut() {
            path.push("is-owned");
        }
        url
    }
}

fn with_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    url.set_query(None);
    // Config validation guarantees an http(s) base, which always has segments
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}
