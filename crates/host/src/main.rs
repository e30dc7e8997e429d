use tracing::info;

use dryrun_host::{server, HostArgs, HostConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = HostArgs::parse_normalized(std::env::args());

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = HostConfig::load(&args.config)?;
    if args.systray {
        info!("System tray icon requested; not supported, continuing without it");
    }

    server::serve(config, server::shutdown_signal()).await
}
