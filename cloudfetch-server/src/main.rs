//! cloudfetch - Headless Daemon
//!
//! A CORS-enabled download proxy for browser code that needs files from
//! GitHub, Google Drive or Dropbox:
//! - `GET /?url=<target>` streams the file back with CORS headers
//! - private GitHub release assets are resolved through the REST API when an
//!   `Authorization` header is supplied
//! - `/health`, `/healthz`, `/version` for supervisors
//!
//! Access via: http://localhost:8787/?url=...

use anyhow::Result;
use clap::Parser;
use cloudfetch_core::{AppState, DomainWhitelist};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod cli;
mod router;
mod server_utils;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Domains { json }) => print_domains(*json),
        Some(Commands::Serve) | None => serve(&cli).await,
    }
}

fn init_tracing(directive: &str) -> Result<()> {
    let filter = EnvFilter::try_new(directive)
        .map_err(|e| anyhow::anyhow!("Invalid log filter '{}': {}", directive, e))?;
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).with_target(false).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn serve(cli: &Cli) -> Result<()> {
    init_tracing(&cli.log_level)?;

    let config = cli.to_config();
    let state = AppState::from_config(config.clone())?;

    info!(
        version = option_env!("GIT_VERSION").unwrap_or(env!("CARGO_PKG_VERSION")),
        request_timeout = config.request_timeout,
        idle_timeout = config.idle_timeout,
        max_transfer = config.max_transfer_secs,
        github_api = %config.github_api_base,
        share_links = config.normalize_share_links,
        "cloudfetch starting"
    );
    for group in state.whitelist().groups() {
        info!(service = %group.service, domains = group.domains.len(), "Whitelisted provider");
    }

    let active_downloads = state.active_downloads().clone();
    let app = router::build_router(state);
    let listener = server_utils::create_listener(&config).await?;
    let addr = listener.local_addr()?;

    info!("Listening on http://{}", addr);
    info!("Usage: http://{}/?url=<percent-encoded URL>", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(server_utils::shutdown_signal(active_downloads))
        .await?;

    info!("Server stopped");
    Ok(())
}

fn print_domains(json: bool) -> Result<()> {
    let whitelist = DomainWhitelist::builtin();

    if json {
        let providers: Vec<serde_json::Value> = whitelist
            .groups()
            .iter()
            .map(|group| {
                serde_json::json!({
                    "service": group.service.label(),
                    "domains": group.domains,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&providers)?);
        return Ok(());
    }

    for group in whitelist.groups() {
        println!("{}:", group.service);
        for domain in &group.domains {
            println!("  {domain} (and subdomains)");
        }
    }
    Ok(())
}
