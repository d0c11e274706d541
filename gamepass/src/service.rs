use crate::config::{Config, OwnershipStyle};
use crate::errors::{GamepassError, ServeError};
use crate::forward::{self, UniverseListingQuery};
use crate::ownership::{self, OwnershipVerdict};
use crate::pagination;
use crate::upstream::{Endpoints, HttpUpstream, Upstream, UpstreamResponse};
use serde_json::Value;
use std::sync::Arc;

struct ServiceInner {
    upstream: Arc<dyn Upstream>,
    endpoints: Endpoints,
    api_key: Option<String>,
    ownership_style: OwnershipStyle,
    forwardable_hosts: Vec<String>,
}

/// Entry point for every gamepass operation. Cheap to clone; holds no
/// per-request state.
#[derive(Clone)]
pub struct GamepassService {
    inner: Arc<ServiceInner>,
}

impl GamepassService {
    pub fn new(config: &Config, upstream: Arc<dyn Upstream>) -> Self {
        GamepassService {
            inner: Arc::new(ServiceInner {
                upstream,
                endpoints: Endpoints::new(&config.upstream),
                api_key: config.api_key().map(String::from),
                ownership_style: config.ownership.style,
                forwardable_hosts: config.upstream.forwardable_hosts(),
            }),
        }
    }

    /// Builds the service against the real upstream over HTTP.
    pub fn from_config(config: &Config) -> Result<Self, ServeError> {
        let upstream = HttpUpstream::new(&config.upstream)?;
        Ok(Self::new(config, Arc::new(upstream)))
    }

    pub fn has_api_key(&self) -> bool {
        self.inner.api_key.is_some()
    }

    pub fn ownership_style(&self) -> OwnershipStyle {
        self.inner.ownership_style
    }

    pub async fn created_gamepasses(&self, user_id: &str) -> Result<Vec<Value>, GamepassError> {
        pagination::list_created_gamepasses(
            self.inner.upstream.as_ref(),
            &self.inner.endpoints,
            user_id,
        )
        .await
    }

    pub async fn check_ownership(
        &self,
        user_id: &str,
        game_pass_id: &str,
    ) -> Result<OwnershipVerdict, GamepassError> {
        ownership::check_ownership(
            self.inner.upstream.as_ref(),
            &self.inner.endpoints,
            self.inner.ownership_style,
            self.inner.api_key.as_deref(),
            user_id,
            game_pass_id,
        )
        .await
    }

    pub async fn universe_gamepasses(
        &self,
        query: &UniverseListingQuery,
    ) -> Result<Value, GamepassError> {
        forward::list_universe_gamepasses(
            self.inner.upstream.as_ref(),
            &self.inner.endpoints,
            self.inner.api_key.as_deref(),
            query,
        )
        .await
    }

    pub async fn forward(&self, url: Option<&str>) -> Result<UpstreamResponse, GamepassError> {
        forward::forward(
            self.inner.upstream.as_ref(),
            &self.inner.forwardable_hosts,
            self.inner.api_key.as_deref(),
            url,
        )
        .await
    }
}
