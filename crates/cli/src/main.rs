mod check_commands;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
    updraft_config::{MetricsConfig, UpdraftConfig},
    updraft_metrics::MetricsRecorderConfig,
    updraft_polling::{HandlerFactory, start_polling},
    updraft_telegram::{EchoHandler, TelegramAccountConfig, TelegramSource, TelegramUpdate},
};

#[derive(Parser)]
#[command(name = "updraft", about = "Updraft: long-polling update pipeline for Telegram bots")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to load instead of searching the standard locations.
    #[arg(long, global = true, env = "UPDRAFT_CONFIG")]
    config: Option<PathBuf>,

    /// Bot token (overrides the config value).
    #[arg(long, global = true, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Maximum updates requested per fetch, 1..=100 (overrides config value).
    #[arg(long, global = true)]
    limit: Option<u8>,

    /// Long-poll timeout in seconds (overrides config value).
    #[arg(long, global = true)]
    timeout: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll for updates and reply with the echo handler (default when no
    /// subcommand is provided).
    Run,
    /// Validate the configuration and verify the bot token.
    Check,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Load the config named on the command line, or discover one.
fn load_config(cli: &Cli) -> anyhow::Result<UpdraftConfig> {
    match &cli.config {
        Some(path) => updraft_config::load_config(path),
        None => Ok(updraft_config::discover_and_load()),
    }
}

/// CLI args override config values.
fn apply_overrides(cli: &Cli, config: &mut UpdraftConfig) {
    if let Some(token) = cli.token.as_deref().filter(|t| !t.trim().is_empty()) {
        config.set_telegram_token(token);
    }
    if let Some(limit) = cli.limit {
        config.polling.limit = limit;
    }
    if let Some(timeout) = cli.timeout {
        config.polling.timeout_secs = timeout;
    }
}

/// Decode the `[telegram]` section. A missing section yields the defaults.
pub(crate) fn telegram_account(config: &UpdraftConfig) -> anyhow::Result<TelegramAccountConfig> {
    if config.telegram.is_null() {
        return Ok(TelegramAccountConfig::default());
    }
    serde_json::from_value(config.telegram.clone()).context("invalid [telegram] section")
}

fn metrics_recorder_config(metrics: &MetricsConfig) -> MetricsRecorderConfig {
    let mut global_labels: Vec<_> = metrics
        .labels
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    global_labels.sort();
    MetricsRecorderConfig {
        enabled: metrics.enabled,
        listen: metrics.listen,
        global_labels,
    }
}

async fn run(config: UpdraftConfig) -> anyhow::Result<()> {
    updraft_metrics::init_metrics(metrics_recorder_config(&config.metrics))?;

    let account = telegram_account(&config)?;
    let source = Arc::new(TelegramSource::new(&account, config.polling.timeout_secs)?);
    let factory: Arc<dyn HandlerFactory<TelegramUpdate>> =
        Arc::new(EchoHandler::factory(source.bot().clone()));

    let handle = start_polling(source, factory, &config.polling).await?;
    info!("polling started, press Ctrl+C to stop");

    let signal = shutdown_signal().await;
    if let Err(e) = &signal {
        warn!(error = %e, "failed to listen for shutdown signal, stopping");
    }
    handle.stop().await;
    info!("updraft stopped");
    signal
}

async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            res = tokio::signal::ctrl_c() => {
                res?;
                info!("received Ctrl+C");
            },
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("received Ctrl+C");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "updraft starting");

    let mut config = load_config(&cli)?;
    apply_overrides(&cli, &mut config);

    match cli.command {
        None | Some(Commands::Run) => run(config).await,
        Some(Commands::Check) => check_commands::handle_check(&config).await,
    }
}
