use crate::errors::GamepassError;
use crate::types::NumericId;
use crate::upstream::{Endpoints, Upstream, UpstreamResponse};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// Query accepted by the universe gamepass listing. Everything except
/// `universeId` is optional and forwarded untouched.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniverseListingQuery {
    pub universe_id: Option<String>,
    pub pass_view: Option<String>,
    pub page_size: Option<String>,
    pub page_token: Option<String>,
}

impl UniverseListingQuery {
    fn forwarded_params(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("passView", self.pass_view.as_deref()),
            ("pageSize", self.page_size.as_deref()),
            ("pageToken", self.page_token.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.filter(|v| !v.is_empty()).map(|v| (name, v)))
    }
}

/// Lists a universe's gamepasses through the key-authenticated upstream
/// endpoint and returns the upstream body as-is.
///
/// Fails without calling upstream when no API key is configured.
pub async fn list_universe_gamepasses(
    upstream: &dyn Upstream,
    endpoints: &Endpoints,
    api_key: Option<&str>,
    query: &UniverseListingQuery,
) -> Result<Value, GamepassError> {
    let universe_id = query
        .universe_id
        .as_deref()
        .ok_or_else(|| GamepassError::invalid_input("universeId is required"))?;
    let universe_id = NumericId::parse("universeId", universe_id)?;
    let api_key = api_key.ok_or(GamepassError::MissingApiKey)?;

    let mut url = endpoints.universe_gamepasses(&universe_id);
    {
        let mut params = url.query_pairs_mut();
        for (name, value) in query.forwarded_params() {
            params.append_pair(name, value);
        }
    }
    // Avoid a dangling '?' when nothing was forwarded
    if url.query() == Some("") {
        url.set_query(None);
    }

    let response = upstream.get(&url, Some(api_key)).await?;
    success_body(response)
}

/// Validates a caller-supplied URL for the generic forwarding mode.
///
/// Only absolute http(s) URLs whose host is in `allowed_hosts` are accepted.
pub fn forwardable_url(raw: Option<&str>, allowed_hosts: &[String]) -> Result<Url, GamepassError> {
    let raw = raw
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| GamepassError::invalid_input("url is required"))?;

    let url = Url::parse(raw.trim())
        .map_err(|e| GamepassError::invalid_input(format!("url is invalid: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(GamepassError::invalid_input("url must use http or https"));
    }

    let host = url
        .host_str()
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| GamepassError::invalid_input("url must have a host"))?;

    if !allowed_hosts.iter().any(|allowed| *allowed == host) {
        return Err(GamepassError::invalid_input(format!(
            "host {host} is not allowed"
        )));
    }

    Ok(url)
}

/// Generic forwarding mode: GETs an allow-listed upstream URL and returns the
/// upstream response when it succeeded.
pub async fn forward(
    upstream: &dyn Upstream,
    allowed_hosts: &[String],
    api_key: Option<&str>,
    raw_url: Option<&str>,
) -> Result<UpstreamResponse, GamepassError> {
    let url = forwardable_url(raw_url, allowed_hosts)?;
    let response = upstream.get(&url, api_key).await?;

    if !response.is_success() {
        return Err(GamepassError::Upstream {
            status: response.status,
            body: response.json(),
        });
    }

    Ok(response)
}

fn success_body(response: UpstreamResponse) -> Result<Value, GamepassError> {
    let body = response.json();
    if response.is_success() {
        Ok(body)
    } else {
        Err(GamepassError::Upstream {
            status: response.status,
            body,
        })
    }
}
