use clap::{Args, Parser};
use config::{CommonConfig, Config, ConfigError, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

#[derive(Parser)]
#[command(name = "passgate", about = "Gamepass query proxy")]
enum CliCommand {
    /// Run the HTTP API
    Serve(ConfigArgs),
    /// Load and validate the configuration, then exit
    ValidateConfig(ConfigArgs),
    /// List the metrics this service emits
    Metrics,
}

#[derive(Args)]
struct ConfigArgs {
    /// Path to a YAML config file. Defaults apply when omitted.
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[derive(thiserror::Error, Debug)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not build statsd recorder: {0}")]
    Statsd(#[from] metrics_exporter_statsd::StatsdError),
    #[error("could not install metrics recorder: {0}")]
    MetricsRecorder(String),
    #[error("server error: {0}")]
    Serve(#[from] gamepass::errors::ServeError),
}

fn main() {
    let cli = CliCommand::parse();

    let result = match cli {
        CliCommand::Serve(args) => serve(args),
        CliCommand::ValidateConfig(args) => load_config(&args).map(|_| println!("Config OK")),
        CliCommand::Metrics => {
            for def in gamepass::metrics_defs::ALL_METRICS {
                println!("{def}");
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("passgate: {e}");
        process::exit(1);
    }
}

fn load_config(args: &ConfigArgs) -> Result<Config, StartupError> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_env(|name| std::env::var(name).ok())?;
    config.validate()?;
    Ok(config)
}

fn serve(args: ConfigArgs) -> Result<(), StartupError> {
    let config = load_config(&args)?;

    // Must outlive the runtime so buffered events are flushed on exit
    let _sentry = init_logging(&config.common);

    if let Some(metrics) = &config.common.metrics {
        init_metrics(metrics)?;
    }

    tracing::info!(
        config = ?args.config,
        port = config.gamepass.listener.port,
        "Starting passgate"
    );

    gamepass::run(config.gamepass)?;
    Ok(())
}

fn init_logging(common: &CommonConfig) -> Option<sentry::ClientInitGuard> {
    let sentry_guard = common
        .logging
        .as_ref()
        .and_then(|logging| logging.sentry_dsn.as_deref())
        .map(|dsn| {
            sentry::init((
                dsn,
                sentry::ClientOptions {
                    release: sentry::release_name!(),
                    ..Default::default()
                },
            ))
        });

    let sentry_layer = sentry_guard
        .as_ref()
        .map(|_| sentry::integrations::tracing::layer());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "passgate=info,gamepass=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_layer)
        .init();

    sentry_guard
}

fn init_metrics(metrics: &MetricsConfig) -> Result<(), StartupError> {
    let recorder = StatsdBuilder::from(metrics.statsd_host.clone(), metrics.statsd_port)
        .build(Some("passgate"))?;

    metrics::set_global_recorder(recorder)
        .map_err(|_| StartupError::MetricsRecorder("a global recorder is already installed".into()))?;

    tracing::info!(
        host = %metrics.statsd_host,
        port = metrics.statsd_port,
        "Sending metrics to statsd"
    );
    Ok(())
}
