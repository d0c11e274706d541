pub mod api;
pub mod config;
pub mod errors;
pub mod forward;
pub mod metrics_defs;
pub mod normalize;
pub mod ownership;
pub mod pagination;
pub mod service;
pub mod types;
pub mod upstream;

#[cfg(test)]
mod testutils;

use config::Config;
use errors::ServeError;
use service::GamepassService;

/// Starts the HTTP API on a dedicated multi-threaded runtime and blocks until
/// it shuts down.
pub fn run(config: Config) -> Result<(), ServeError> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(run_async(config))
}

pub async fn run_async(config: Config) -> Result<(), ServeError> {
    let service = GamepassService::from_config(&config)?;

    tracing::info!(
        games_url = %config.upstream.games_url,
        inventory_url = %config.upstream.inventory_url,
        ownership_style = ?service.ownership_style(),
        "Starting gamepass API"
    );

    api::serve(config.listener, service).await
}
