use anyhow::Result;
use cloudfetch_core::proxy::ActiveDownloads;
use cloudfetch_types::ProxyConfig;
use listenfd::ListenFd;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::info;

const DRAIN_REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Take a systemd-activated socket if one was handed over, else bind
/// `host:port` with `SO_REUSEPORT`.
pub async fn create_listener(config: &ProxyConfig) -> Result<tokio::net::TcpListener> {
    let mut listenfd = ListenFd::from_env();

    if let Some(listener) = listenfd.take_tcp_listener(0)? {
        info!("Using systemd socket activation (fd=3)");
        listener.set_nonblocking(true)?;
        return Ok(tokio::net::TcpListener::from_std(listener)?);
    }

    let addr = bind_addr(config)?;
    let listener = bind_reuseport(addr)?;
    info!(addr = %listener.local_addr()?, "Bound with SO_REUSEPORT");
    Ok(listener)
}

/// `host` must be an IP literal; hostnames are not resolved at bind time.
fn bind_addr(config: &ProxyConfig) -> Result<SocketAddr> {
    let ip: std::net::IpAddr = config
        .host
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", config.host, e))?;
    Ok(SocketAddr::new(ip, config.port))
}

fn bind_reuseport(addr: SocketAddr) -> Result<tokio::net::TcpListener> {
    let domain = if addr.is_ipv4() { Domain::IPV4 } else { Domain::IPV6 };
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1024)?;

    Ok(tokio::net::TcpListener::from_std(socket.into())?)
}

/// Resolves on Ctrl+C or SIGTERM. Downloads still streaming at that point are
/// reported, then logged periodically until they drain.
pub async fn shutdown_signal(active: ActiveDownloads) {
    wait_for_signal().await;

    match active.count() {
        0 => info!("Graceful shutdown: no downloads in flight"),
        in_flight => {
            info!(in_flight, "Graceful shutdown: waiting for downloads to finish");
            tokio::spawn(report_drain(active, DRAIN_REPORT_INTERVAL));
        },
    }
}

async fn report_drain(active: ActiveDownloads, every: Duration) {
    loop {
        tokio::time::sleep(every).await;
        match active.count() {
            0 => {
                info!("All downloads drained");
                return;
            },
            in_flight => info!(in_flight, "Still draining downloads"),
        }
    }
}

#[allow(
    clippy::expect_used,
    reason = "Signal handlers are critical infrastructure, panic is appropriate on failure"
)]
async fn wait_for_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C"),
        () = terminate => info!("Received SIGTERM"),
    }
}
