use clap::{Parser, Subcommand};
use cloudfetch_types::{
    ProxyConfig, UpstreamProxyConfig, DEFAULT_GITHUB_API_BASE, DEFAULT_USER_AGENT,
};

#[derive(Parser, Debug)]
#[command(
    name = "cloudfetch",
    about = "cloudfetch - CORS download proxy for GitHub, Google Drive and Dropbox",
    version = env!("CARGO_PKG_VERSION"),
    author,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(long, env = "CLOUDFETCH_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(short, long, env = "CLOUDFETCH_PORT", default_value = "8787")]
    pub port: u16,

    #[arg(
        long,
        env = "CLOUDFETCH_REQUEST_TIMEOUT",
        default_value = "60",
        help = "Seconds allowed for outbound calls up to response headers"
    )]
    pub request_timeout: u64,

    #[arg(
        long,
        env = "CLOUDFETCH_IDLE_TIMEOUT",
        default_value = "60",
        help = "Seconds without a body chunk before a download is aborted"
    )]
    pub idle_timeout: u64,

    #[arg(
        long,
        env = "CLOUDFETCH_MAX_TRANSFER",
        default_value = "1800",
        help = "Seconds allowed for a whole download, first byte to last"
    )]
    pub max_transfer: u64,

    #[arg(long, env = "CLOUDFETCH_CONNECT_TIMEOUT", default_value = "15")]
    pub connect_timeout: u64,

    #[arg(long, env = "CLOUDFETCH_GITHUB_API_BASE", default_value = DEFAULT_GITHUB_API_BASE)]
    pub github_api_base: String,

    #[arg(long, env = "CLOUDFETCH_USER_AGENT", default_value = DEFAULT_USER_AGENT, hide_default_value = true)]
    pub user_agent: String,

    #[arg(long, env = "CLOUDFETCH_UPSTREAM_PROXY", help = "Egress proxy (http://, https:// or socks5://)")]
    pub upstream_proxy: Option<String>,

    #[arg(
        long,
        env = "CLOUDFETCH_NORMALIZE_SHARE_LINKS",
        help = "Rewrite Drive/Dropbox share links into direct-download links"
    )]
    pub normalize_share_links: bool,

    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    #[command(about = "Start the proxy server (default if no command specified)")]
    Serve,

    #[command(about = "Print the provider domain whitelist")]
    Domains {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },
}

impl Cli {
    pub fn to_config(&self) -> ProxyConfig {
        let upstream_proxy = match self.upstream_proxy.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => {
                UpstreamProxyConfig { enabled: true, url: url.to_string() }
            },
            _ => UpstreamProxyConfig::default(),
        };

        ProxyConfig {
            host: self.host.clone(),
            port: self.port,
            request_timeout: self.request_timeout,
            idle_timeout: self.idle_timeout,
            max_transfer_secs: self.max_transfer,
            connect_timeout: self.connect_timeout,
            github_api_base: self.github_api_base.clone(),
            user_agent: self.user_agent.clone(),
            normalize_share_links: self.normalize_share_links,
            upstream_proxy,
        }
    }
}
