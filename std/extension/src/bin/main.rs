//! Binary entry point for the wmcp-extension MCP server.

use clap::{ArgAction, Parser};
use rmcp::ServiceExt;
use std::convert::Infallible;
use tracing_subscriber::EnvFilter;
use wmcp_extension::{AllowedRoots, ExtensionServer, SERVER_NAME};

/// Walrus MCP Extension Server — greeting, file analysis and system info tools.
#[derive(Parser)]
#[command(name = "wmcp-extension", version, about)]
struct Cli {
    /// Comma-separated directories the file analyzer may read.
    /// Defaults to the current directory.
    #[arg(long, env = "ALLOWED_PATHS", default_value = "")]
    allowed_paths: String,

    /// Log informational diagnostics to stderr.
    #[arg(long, env = "ENABLE_LOGGING", action = ArgAction::SetTrue, value_parser = parse_switch)]
    enable_logging: bool,
}

/// Case-insensitive truthy spellings turn the switch on; any other value
/// leaves it off instead of aborting startup.
fn parse_switch(value: &str) -> Result<bool, Infallible> {
    Ok(matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "t" | "yes" | "y" | "on" | "1"
    ))
}

fn init_logging(enable: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if enable { "info" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let roots = AllowedRoots::from_list(&cli.allowed_paths)?;
    tracing::info!("starting {SERVER_NAME}");
    tracing::info!("allowed paths: {:?}", roots.display_list());

    let server = ExtensionServer::new(roots);
    let transport = rmcp::transport::stdio();
    let service = server
        .serve(transport)
        .await
        .map_err(|e| anyhow::anyhow!("failed to start server: {e}"))?;
    let reason = service.waiting().await?;
    tracing::info!("server stopped: {reason:?}");
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.enable_logging);
    if let Err(e) = run(cli).await {
        tracing::error!("server error: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
