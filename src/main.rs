//! NextMonth - workspace server
//!
//! CLI entry point for the NextMonth server and terminal client.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use nextmonth::cli;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str =
    "nextmonth=info,nextmonth_core=info,nextmonth_store=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Daily rolling log file when NEXTMONTH_LOG_DIR is set
    let (file_layer, _guard) = match std::env::var("NEXTMONTH_LOG_DIR") {
        Ok(dir) if !dir.is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, "nextmonth.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    let cli = cli::Cli::parse();

    if cli.command.is_some() {
        info!("NextMonth v{}", env!("CARGO_PKG_VERSION"));
    }

    cli::run(cli).await
}
