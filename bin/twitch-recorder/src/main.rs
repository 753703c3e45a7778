mod config;

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use trec::{download::YtDlp, Dispatcher, Reconciler, TrecResult};
use trec_twitch::{HelixClient, TwitchFeed};

use crate::config::{Config, LogConfig};

#[derive(Parser, Debug)]
#[clap(name = "twitch-recorder", version, author)]
/// Records Twitch streams as soon as they go live
struct Args {
    /// Path to the configuration file. Searched in the platform config
    /// directories when omitted.
    #[clap(short, long, env = "TWITCH_RECORDER_CONFIG")]
    config: Option<PathBuf>,
}

fn init_logging(log: &LogConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log.directives().into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Reports a fatal feed error once, through the log.
fn exit_code(result: TrecResult<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let (config, config_path) = Config::load(args.config.as_deref())?;
    init_logging(&config.log);
    tracing::info!("Using config {}", config_path.display());

    let downloader = YtDlp::locate(&config.downloader.yt_dlp)?;
    let dispatcher = Dispatcher::new(downloader, config.download_settings());

    let helix = HelixClient::new(&config.twitch.client_id, &config.twitch.token)?;
    let reconciler = Reconciler::new(TwitchFeed::new(helix), config.targets());

    let result = tokio::select! {
        result = reconciler.run(&dispatcher) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, no new downloads will be started");
            Ok(())
        }
    };
    let exit = exit_code(result);

    dispatcher.drain().await;
    Ok(exit)
}
