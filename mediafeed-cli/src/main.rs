//! mediafeed entry point.

use mediafeed_cli::api_client::RestGateway;
use mediafeed_cli::app::execute;
use mediafeed_cli::commands::parse_command;
use mediafeed_cli::config::FeedConfig;
use mediafeed_cli::error::CliResult;
use mediafeed_cli::render::render_summary;
use mediafeed_cli::telemetry::init_tracing;
use mediafeed_sync::{FeedSession, FetchOutcome};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::main]
async fn main() -> CliResult<()> {
    let config = FeedConfig::load()?;
    init_tracing(&config.log)?;

    let gateway = RestGateway::new(&config)?;
    tracing::info!(
        base_url = gateway.base_url(),
        page_size = config.page_size,
        refresh_interval_ms = config.refresh_interval_ms,
        "Starting mediafeed"
    );
    let session = FeedSession::new(gateway, config.to_sync_config());

    let mut stdout = tokio::io::stdout();
    if let FetchOutcome::Failed(err) = session.bootstrap().await {
        tracing::warn!(error = %err, "Initial load failed");
    }
    write_line(&mut stdout, &render_summary(&session.snapshot().await)).await?;
    session.start().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let command = match parse_command(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(err) => {
                        write_line(&mut stdout, &err.to_string()).await?;
                        continue;
                    }
                };
                let reply = execute(&session, command).await;
                write_line(&mut stdout, &reply.output).await?;
                if reply.quit {
                    break;
                }
            }
        }
    }

    if let Some(metrics) = session.stop().await {
        tracing::info!(
            ticks = metrics.ticks,
            refreshes = metrics.refreshes,
            skipped = metrics.skipped,
            "Session closed"
        );
    }
    Ok(())
}

async fn write_line(stdout: &mut tokio::io::Stdout, text: &str) -> std::io::Result<()> {
    stdout.write_all(text.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await
}
