use anyhow::{Context, Result, bail};
use clap::Parser;
use humantime_serde::re::humantime;
use ledger_network_status::{
    HttpNetworkApi, RepresentativeFeed, StatsPoller, StatusConfig, StatusView,
    feed::FeedSource,
    logging::{self, LogTarget},
    tui,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "network-status")]
#[command(about = "Live health monitor for a ledger's representative and peer network")]
#[command(version)]
struct Cli {
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Explorer API base URL (overrides the config file)
    #[arg(long)]
    api_url: Option<String>,

    /// Delay between poll cycles, e.g. "10s" (overrides the config file)
    #[arg(long, value_parser = humantime::parse_duration)]
    poll_interval: Option<Duration>,

    /// Run headless and log a JSON report on every change
    #[arg(long)]
    quiet: bool,

    /// Print one JSON report as soon as data is available, then exit
    #[arg(long, conflicts_with = "quiet")]
    once: bool,

    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write logs to this file while the TUI is running
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn load_config(&self) -> Result<StatusConfig> {
        let mut config = match &self.config {
            Some(path) => StatusConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => StatusConfig::default(),
        };

        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        if let Some(interval) = self.poll_interval {
            config.poll_interval = interval;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    fn log_target(&self) -> LogTarget {
        if self.quiet || self.once {
            LogTarget::Stderr
        } else if let Some(path) = &self.log_file {
            LogTarget::File(path.clone())
        } else {
            LogTarget::Disabled
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = logging::init(&cli.log_level, cli.log_target())
        .context("Failed to initialize logging")?;

    let config = cli.load_config()?;
    info!("Monitoring {}", config.api_url);

    let api = Arc::new(HttpNetworkApi::new(&config).context("Failed to build HTTP client")?);

    let poller = StatsPoller::new(api.clone(), &config).start();

    let feed = RepresentativeFeed::new();
    let feed_rx = feed.subscribe();
    let feed_source: Arc<dyn FeedSource> = api;
    let feed_task = feed.spawn_polling(
        feed_source,
        config.feed_interval,
        poller.cancellation_token().child_token(),
    );

    let mut view = StatusView::new(&config, feed_rx, poller.subscribe());

    let result = if cli.once {
        print_once(&mut view).await
    } else if cli.quiet {
        log_changes(&mut view).await
    } else {
        tui::run_tui(view, &poller, &config.api_url).await
    };

    poller.join().await;
    if let Err(e) = feed_task.await {
        warn!("Representative feed task ended abnormally: {}", e);
    }

    result
}

async fn print_once(view: &mut StatusView) -> Result<()> {
    tokio::select! {
        ready = view.wait_for_data() => {
            if !ready {
                bail!("Status sources closed before any data arrived");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            bail!("Interrupted before any data arrived");
        }
    }

    let report = view.render();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn log_changes(view: &mut StatusView) -> Result<()> {
    loop {
        tokio::select! {
            open = view.changed() => {
                if !open {
                    warn!("Status sources closed");
                    return Ok(());
                }
                let report = view.render();
                info!(report = %serde_json::to_string(&report)?, "Network status");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
        }
    }
}
