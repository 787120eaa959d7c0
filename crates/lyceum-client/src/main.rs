use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lyceum_client::cli::{self, Command};
use lyceum_client::{ClientConfig, MessagingModule, UiEvents};
use lyceum_net::HttpApi;
use lyceum_shared::constants::APP_NAME;

const PRINTER_DRAIN: Duration = Duration::from_millis(200);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr, stdout belongs to the UI.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("lyceum=info,lyceum_client=debug,lyceum_net=info,warn")
        }))
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    info!("Starting {} v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::from_env();
    info!(?config, "Loaded configuration");

    let api = HttpApi::new(&config.base_url, config.session_cookie.as_deref())
        .context("Failed to build HTTP client")?;

    let (events, rx) = UiEvents::channel(config.toast_dismiss);
    let printer = tokio::spawn(cli::print_events(rx, std::io::stdout()));

    let module = MessagingModule::new(Arc::new(api), &config, events);
    if let Err(e) = module.start().await {
        // Let the halt notice reach the terminal before exiting.
        drop(module);
        drain(printer).await;
        return Err(e).context("Messaging is unavailable for this session");
    }
    println!("{}", cli::HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        };
        let Some(line) = line else { break };

        match cli::parse(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => match cli::dispatch(&module, command).await {
                Ok(Some(output)) => println!("{output}"),
                Ok(None) => {}
                Err(e) => println!("Error: {e}"),
            },
            Err(e) => println!("{e}"),
        }
    }

    module.stop();
    drop(module);
    drain(printer).await;
    Ok(())
}

/// Give queued events a moment to reach the terminal. Pending toast timers
/// keep the channel open, so the printer may not finish on its own.
async fn drain(printer: JoinHandle<()>) {
    if tokio::time::timeout(PRINTER_DRAIN, printer).await.is_err() {
        info!("Exiting with toasts still pending");
    }
}
